//! Iterators for the [`AvlTree`](crate::AvlTree) data structure.
//!
//! An [`Iter`] keeps a cursor on the next node to yield and an optimistic
//! snapshot of the tree's version. It holds no lock while idle: every step
//! takes the read lock, checks that no writer ran since the snapshot, copies
//! one entry out, moves the cursor to the in-order successor through the
//! parent links, and releases the lock.
//!
//! ```text
//! next() ──► to_shared() ──► version changed? ──► Err(ConcurrentModification)
//!                 │                                 (iterator is exhausted)
//!                 ▼
//!            clone entry at cursor
//!                 │
//!                 ▼
//!            cursor = successor(cursor) ──► release lock ──► Ok(entry)
//! ```

use std::iter::FusedIterator;

use crate::arena::NodeId;
use crate::avl::AvlCore;
use crate::error;
use crate::latch::{OptimisticGuard, VersionLatch};

/// Ascending iterator over clones of an [`AvlTree`](crate::AvlTree)'s entries.
///
/// Each item is `Ok((key, value))`, or `Err(ConcurrentModification)` if the
/// tree was mutated after the iterator was created. After an error the
/// iterator yields `None`.
///
/// ```
/// use ordtree::{AvlTree, Error};
///
/// let tree: AvlTree<u32, &str> = AvlTree::default();
/// tree.put(2, "two");
/// tree.put(1, "one");
///
/// let mut iter = tree.iter();
/// assert_eq!(iter.next(), Some(Ok((1, "one"))));
///
/// tree.put(3, "three");
/// assert_eq!(iter.next(), Some(Err(Error::ConcurrentModification)));
/// assert_eq!(iter.next(), None);
/// ```
pub struct Iter<'t, K, V> {
	snapshot: OptimisticGuard<'t, AvlCore<K, V>>,
	cursor: Option<NodeId>,
	done: bool,
}

impl<'t, K, V> Iter<'t, K, V> {
	pub(crate) fn new(latch: &'t VersionLatch<AvlCore<K, V>>) -> Iter<'t, K, V> {
		// The snapshot and the starting cursor must come from the same version.
		loop {
			let snapshot = latch.optimistic();
			let Ok(core) = snapshot.to_shared() else {
				continue;
			};
			let cursor = core.first();
			drop(core);
			return Iter {
				snapshot,
				cursor,
				done: false,
			};
		}
	}

	/// Returns `true` if a call to `next` would reach an entry, provided the
	/// tree is not modified in between.
	pub fn has_next(&self) -> bool {
		!self.done && self.cursor.is_some()
	}

	/// The tree version this iterator was created at.
	pub fn version(&self) -> usize {
		self.snapshot.version()
	}
}

impl<'t, K: Clone, V: Clone> Iterator for Iter<'t, K, V> {
	type Item = error::Result<(K, V)>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		let core = match self.snapshot.to_shared() {
			Ok(core) => core,
			Err(err) => {
				self.done = true;
				self.cursor = None;
				return Some(Err(err));
			}
		};

		let Some(id) = self.cursor else {
			self.done = true;
			return None;
		};

		let node = core.node(id);
		let entry = (node.key.clone(), node.value.clone());
		self.cursor = core.successor(id);
		Some(Ok(entry))
	}
}

impl<'t, K: Clone, V: Clone> FusedIterator for Iter<'t, K, V> {}
