//! # Error Types for the Ordered Maps
//!
//! Every fallible operation on [`AvlTree`](crate::AvlTree) and
//! [`MultiTree`](crate::MultiTree) reports failure through [`Error`]. None of
//! them panic on caller input.
//!
//! ## Error Flow
//!
//! ```text
//! Operation starts
//!      │
//!      ▼
//! Acquire latch (shared or exclusive)
//!      │
//!      ├──► precondition fails ──► Err(..), tree untouched
//!      │
//!      ▼
//! Mutate and rebalance
//!      │
//!      ▼
//! Release latch, return Ok(..)
//! ```
//!
//! A call that returns an error leaves the contents of the tree exactly as
//! they were before the call. The only error a caller is expected to retry on
//! is [`Error::ConcurrentModification`], by creating a fresh iterator.

use thiserror::Error;

/// Errors returned by tree construction and tree operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// The tree was configured without a comparator.
	#[error("a comparator is required to order keys")]
	InvalidComparator,

	/// The multi-way tree was configured with a degree below 2 or above
	/// `usize::MAX / 2`.
	#[error("invalid degree {0}: a multi-way tree needs a degree between 2 and usize::MAX / 2")]
	InvalidDegree(usize),

	/// The requested key is not stored in the tree.
	#[error("key not found")]
	KeyNotFound,

	/// A range scan was requested with a lower bound that is not strictly
	/// below the upper bound.
	#[error("invalid range: the lower bound must be strictly less than the upper bound")]
	InvalidRange,

	/// `min` or `max` was called on a tree without entries.
	#[error("the tree is empty")]
	EmptyTree,

	/// The tree was mutated after the iterator was created.
	///
	/// # Response
	///
	/// Discard the iterator. A new iterator captures the current version and
	/// starts again from the smallest key.
	#[error("the tree was modified while it was being iterated")]
	ConcurrentModification,
}

/// A Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_name_the_problem() {
		assert_eq!(
			Error::InvalidDegree(1).to_string(),
			"invalid degree 1: a multi-way tree needs a degree between 2 and usize::MAX / 2"
		);
		assert_eq!(Error::KeyNotFound.to_string(), "key not found");
		assert_eq!(Error::EmptyTree.to_string(), "the tree is empty");
	}
}
