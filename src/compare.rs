//! Key comparators.
//!
//! Trees never rely on `Ord` for their keys. Every comparison goes through a
//! [`Comparator`], a shared function returning [`Ordering::Less`],
//! [`Ordering::Equal`] or [`Ordering::Greater`]. The comparator must describe a
//! total order; a comparator that is inconsistent (for example one that is not
//! transitive) leaves the trees well-formed but makes lookups unreliable.

use std::cmp::Ordering;
use std::sync::Arc;

/// A shared, thread-safe total order over keys of type `K`.
pub type Comparator<K> = Arc<dyn Fn(&K, &K) -> Ordering + Send + Sync>;

/// Wraps a closure into a [`Comparator`].
///
/// ```
/// use ordtree::compare;
///
/// // Order strings by length, then lexicographically.
/// let by_len = compare::from_fn(|a: &String, b: &String| {
/// 	a.len().cmp(&b.len()).then_with(|| a.cmp(b))
/// });
/// assert!(by_len(&"zz".to_string(), &"aaa".to_string()).is_lt());
/// ```
pub fn from_fn<K, F>(f: F) -> Comparator<K>
where
	F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
{
	Arc::new(f)
}

/// The natural order of any `Ord` key.
pub fn natural<K: Ord + 'static>() -> Comparator<K> {
	Arc::new(|a: &K, b: &K| a.cmp(b))
}

/// Lexicographic (byte-wise) order over owned strings.
pub fn strings() -> Comparator<String> {
	Arc::new(|a: &String, b: &String| a.as_str().cmp(b.as_str()))
}

/// Numeric order over 64-bit signed integers.
pub fn integers() -> Comparator<i64> {
	Arc::new(|a: &i64, b: &i64| a.cmp(b))
}

/// IEEE 754 total order over 64-bit floats.
///
/// `-0.0` sorts before `+0.0` and NaNs sort at the ends, so every float,
/// NaN included, can be used as a key.
pub fn floats() -> Comparator<f64> {
	Arc::new(|a: &f64, b: &f64| a.total_cmp(b))
}

/// Reverses another comparator.
pub fn reverse<K: 'static>(inner: Comparator<K>) -> Comparator<K> {
	Arc::new(move |a: &K, b: &K| inner(b, a))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn natural_matches_ord() {
		let cmp = natural::<u8>();
		assert_eq!(cmp(&1, &2), Ordering::Less);
		assert_eq!(cmp(&2, &2), Ordering::Equal);
		assert_eq!(cmp(&3, &2), Ordering::Greater);
	}

	#[test]
	fn strings_are_lexicographic() {
		let cmp = strings();
		assert_eq!(cmp(&"apple".into(), &"banana".into()), Ordering::Less);
		assert_eq!(cmp(&"b".into(), &"abc".into()), Ordering::Greater);
	}

	#[test]
	fn integers_handle_negatives() {
		let cmp = integers();
		assert_eq!(cmp(&-5, &3), Ordering::Less);
		assert_eq!(cmp(&i64::MAX, &i64::MIN), Ordering::Greater);
	}

	#[test]
	fn floats_order_nan_and_signed_zero() {
		let cmp = floats();
		assert_eq!(cmp(&-0.0, &0.0), Ordering::Less);
		assert_eq!(cmp(&1.5, &1.5), Ordering::Equal);
		assert_eq!(cmp(&f64::NAN, &f64::INFINITY), Ordering::Greater);
	}

	#[test]
	fn reverse_flips_order() {
		let cmp = reverse(integers());
		assert_eq!(cmp(&1, &2), Ordering::Greater);
		assert_eq!(cmp(&2, &2), Ordering::Equal);
	}
}
