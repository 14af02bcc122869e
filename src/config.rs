//! Tree configuration.
//!
//! [`TreeConfig`] gathers everything a tree needs at construction time: the
//! comparator ordering its keys and, for [`MultiTree`](crate::MultiTree), the
//! degree bounding node occupancy. The binary tree ignores the degree.
//!
//! ```
//! use ordtree::{compare, AvlTree, MultiTree, TreeConfig};
//!
//! let config = TreeConfig::new().with_comparator(compare::integers()).with_degree(4);
//!
//! let avl: AvlTree<i64, &str> = AvlTree::with_config(config.clone()).unwrap();
//! let btree: MultiTree<i64, &str> = MultiTree::with_config(config).unwrap();
//! assert_eq!(btree.degree(), 4);
//! # let _ = avl;
//! ```

use std::fmt;

use tracing::debug;

use crate::compare::Comparator;
use crate::error::{Error, Result};

/// Default degree of a multi-way tree: nodes hold between 31 and 63 keys.
pub const DEFAULT_DEGREE: usize = 32;

/// Smallest degree a multi-way tree accepts.
pub const MIN_DEGREE: usize = 2;

/// Largest degree a multi-way tree accepts, so that `2 * degree` key slots
/// never overflow `usize`.
pub const MAX_DEGREE: usize = usize::MAX / 2;

/// Construction parameters shared by both tree kinds.
pub struct TreeConfig<K> {
	comparator: Option<Comparator<K>>,
	degree: usize,
}

impl<K> TreeConfig<K> {
	/// A configuration with no comparator and [`DEFAULT_DEGREE`].
	pub fn new() -> Self {
		TreeConfig {
			comparator: None,
			degree: DEFAULT_DEGREE,
		}
	}

	/// Sets the comparator used to order keys.
	pub fn with_comparator(mut self, comparator: Comparator<K>) -> Self {
		self.comparator = Some(comparator);
		self
	}

	/// Sets the multi-way tree degree.
	pub fn with_degree(mut self, degree: usize) -> Self {
		self.degree = degree;
		self
	}

	/// The configured degree.
	pub fn degree(&self) -> usize {
		self.degree
	}

	/// Returns the comparator, or [`Error::InvalidComparator`] if none was set.
	pub fn validate_comparator(&self) -> Result<Comparator<K>> {
		match &self.comparator {
			Some(cmp) => Ok(cmp.clone()),
			None => {
				debug!("rejecting tree configuration without a comparator");
				Err(Error::InvalidComparator)
			}
		}
	}

	/// Returns the degree, or [`Error::InvalidDegree`] if it lies outside
	/// [`MIN_DEGREE`]`..=`[`MAX_DEGREE`].
	pub fn validate_degree(&self) -> Result<usize> {
		if !(MIN_DEGREE..=MAX_DEGREE).contains(&self.degree) {
			debug!(degree = self.degree, "rejecting tree configuration with invalid degree");
			return Err(Error::InvalidDegree(self.degree));
		}
		Ok(self.degree)
	}
}

impl<K> Default for TreeConfig<K> {
	fn default() -> Self {
		Self::new()
	}
}

impl<K> Clone for TreeConfig<K> {
	fn clone(&self) -> Self {
		TreeConfig {
			comparator: self.comparator.clone(),
			degree: self.degree,
		}
	}
}

impl<K> fmt::Debug for TreeConfig<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TreeConfig")
			.field("comparator", &self.comparator.as_ref().map(|_| "<fn>"))
			.field("degree", &self.degree)
			.finish()
	}
}
