//! The ordered-map contract shared by both tree kinds.
//!
//! Code that only needs an ordered map can be written once against
//! [`OrderedMap`] and run on either an [`AvlTree`] or a [`MultiTree`]:
//!
//! ```
//! use ordtree::{compare, AvlTree, MultiTree, OrderedMap};
//!
//! fn histogram<M: OrderedMap<String, u32>>(map: &M, words: &str) -> Vec<(String, u32)> {
//! 	for word in words.split_whitespace() {
//! 		if map.compute_if_present(&word.to_string(), &mut |n| (n + 1, true)).is_err() {
//! 			map.put(word.to_string(), 1);
//! 		}
//! 	}
//! 	map.key_values()
//! }
//!
//! let text = "b a b c b a";
//! let avl = AvlTree::new(compare::strings());
//! let multi = MultiTree::new(2, compare::strings()).unwrap();
//! assert_eq!(histogram(&avl, text), histogram(&multi, text));
//! ```

use crate::avl::AvlTree;
use crate::btree::MultiTree;
use crate::error::Result;

/// A thread-safe map ordered by a caller-supplied comparator.
///
/// Reads hand out clones, so no reference into the map outlives the lock that
/// protects it.
pub trait OrderedMap<K: Clone, V: Clone>: Send + Sync {
	/// Inserts or updates `key`, returning the previous value.
	fn put(&self, key: K, value: V) -> Option<V>;

	/// Returns the value under `key`, or [`Error::KeyNotFound`](crate::Error::KeyNotFound).
	fn get(&self, key: &K) -> Result<V>;

	/// Returns `true` if `key` is stored.
	fn contains(&self, key: &K) -> bool;

	/// Removes `key`, returning its value, or [`Error::KeyNotFound`](crate::Error::KeyNotFound).
	fn remove(&self, key: &K) -> Result<V>;

	/// Number of entries.
	fn len(&self) -> usize;

	/// Returns `true` if the map holds no entries.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Removes every entry.
	fn clear(&self);

	/// Visits every entry in ascending key order under the read lock.
	fn for_each(&self, visit: &mut dyn FnMut(&K, &V));

	/// All keys in ascending order.
	fn keys(&self) -> Vec<K> {
		let mut out = Vec::new();
		self.for_each(&mut |k, _| out.push(k.clone()));
		out
	}

	/// All values, ordered by their keys.
	fn values(&self) -> Vec<V> {
		let mut out = Vec::new();
		self.for_each(&mut |_, v| out.push(v.clone()));
		out
	}

	/// All entries in ascending key order.
	fn key_values(&self) -> Vec<(K, V)> {
		let mut out = Vec::new();
		self.for_each(&mut |k, v| out.push((k.clone(), v.clone())));
		out
	}

	/// Entries with `from <= key < to`; fails with
	/// [`Error::InvalidRange`](crate::Error::InvalidRange) unless `from < to`.
	fn find_range(&self, from: &K, to: &K) -> Result<Vec<(K, V)>>;

	/// The smallest entry, or [`Error::EmptyTree`](crate::Error::EmptyTree).
	fn min(&self) -> Result<(K, V)>;

	/// The largest entry, or [`Error::EmptyTree`](crate::Error::EmptyTree).
	fn max(&self) -> Result<(K, V)>;

	/// The value under `key`, or `default` if it is absent.
	fn get_or_default(&self, key: &K, default: V) -> V {
		self.get(key).unwrap_or(default)
	}

	/// Inserts only if `key` is absent; returns the existing value otherwise.
	fn put_if_absent(&self, key: K, value: V) -> Option<V>;

	/// Recomputes the value under `key` atomically. See
	/// [`AvlTree::compute_if_present`].
	fn compute_if_present(&self, key: &K, f: &mut dyn FnMut(&V) -> (V, bool)) -> Result<Option<V>>;

	/// Inserts all entries under one write lock, returning how many keys were new.
	fn batch_insert(&self, entries: Vec<(K, V)>) -> usize;
}

macro_rules! forward_ordered_map {
	($tree:ident) => {
		impl<K, V> OrderedMap<K, V> for $tree<K, V>
		where
			K: Clone + Send + Sync,
			V: Clone + Send + Sync,
		{
			fn put(&self, key: K, value: V) -> Option<V> {
				$tree::put(self, key, value)
			}

			fn get(&self, key: &K) -> Result<V> {
				$tree::get(self, key)
			}

			fn contains(&self, key: &K) -> bool {
				$tree::contains(self, key)
			}

			fn remove(&self, key: &K) -> Result<V> {
				$tree::remove(self, key)
			}

			fn len(&self) -> usize {
				$tree::len(self)
			}

			fn clear(&self) {
				$tree::clear(self)
			}

			fn for_each(&self, visit: &mut dyn FnMut(&K, &V)) {
				$tree::for_each(self, visit)
			}

			fn find_range(&self, from: &K, to: &K) -> Result<Vec<(K, V)>> {
				$tree::find_range(self, from, to)
			}

			fn min(&self) -> Result<(K, V)> {
				$tree::min(self)
			}

			fn max(&self) -> Result<(K, V)> {
				$tree::max(self)
			}

			fn put_if_absent(&self, key: K, value: V) -> Option<V> {
				$tree::put_if_absent(self, key, value)
			}

			fn compute_if_present(&self, key: &K, f: &mut dyn FnMut(&V) -> (V, bool)) -> Result<Option<V>> {
				$tree::compute_if_present(self, key, f)
			}

			fn batch_insert(&self, entries: Vec<(K, V)>) -> usize {
				$tree::batch_insert(self, entries)
			}
		}
	};
}

forward_ordered_map!(AvlTree);
forward_ordered_map!(MultiTree);

#[cfg(test)]
mod tests {
	use super::*;
	use crate::compare;
	use crate::error::Error;

	fn both() -> Vec<Box<dyn OrderedMap<i64, String>>> {
		vec![
			Box::new(AvlTree::<i64, String>::new(compare::integers())),
			Box::new(MultiTree::<i64, String>::new(2, compare::integers()).unwrap()),
		]
	}

	#[test]
	fn contract_behaves_identically() {
		for map in both() {
			assert!(map.is_empty());
			assert_eq!(map.min(), Err(Error::EmptyTree));

			assert_eq!(map.batch_insert((0..10).map(|i| (i, i.to_string())).collect()), 10);
			assert_eq!(map.put(3, "three".into()), Some("3".into()));
			assert_eq!(map.put_if_absent(3, "x".into()), Some("three".into()));
			assert_eq!(map.put_if_absent(10, "10".into()), None);
			assert_eq!(map.len(), 11);

			assert_eq!(map.get_or_default(&42, "none".into()), "none");
			assert_eq!(map.compute_if_present(&4, &mut |v| (format!("{v}!"), true)), Ok(Some("4!".into())));
			assert_eq!(map.compute_if_present(&5, &mut |v| (v.clone(), false)), Ok(None));
			assert!(!map.contains(&5));
			assert_eq!(map.compute_if_present(&5, &mut |v| (v.clone(), true)), Err(Error::KeyNotFound));

			assert_eq!(map.keys(), vec![0, 1, 2, 3, 4, 6, 7, 8, 9, 10]);
			assert_eq!(map.find_range(&2, &5).unwrap().len(), 3);
			assert_eq!(map.max(), Ok((10, "10".into())));

			map.clear();
			assert!(map.values().is_empty());
		}
	}
}
