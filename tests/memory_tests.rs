//! # Memory Tests for Ordtree
//!
//! Checks that both trees release what they own: values are dropped exactly
//! once when they are replaced, removed, cleared, or when the tree itself is
//! dropped. `Arc` strong counts serve as the drop detector, and a counting
//! `Drop` type catches double drops through splits, merges and rotations.

use ordtree::{compare, AvlTree, MultiTree, OrderedMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ===========================================================================
// Drop Tracking
// ===========================================================================

/// Increments a shared counter when dropped.
#[derive(Debug)]
struct DropCounter(Arc<AtomicUsize>);

impl Clone for DropCounter {
	fn clone(&self) -> Self {
		DropCounter(Arc::clone(&self.0))
	}
}

impl Drop for DropCounter {
	fn drop(&mut self) {
		self.0.fetch_add(1, Ordering::SeqCst);
	}
}

fn trees<V: Clone + Send + Sync + 'static>() -> Vec<Box<dyn OrderedMap<i64, V>>> {
	vec![
		Box::new(AvlTree::<i64, V>::new(compare::integers())),
		Box::new(MultiTree::<i64, V>::new(2, compare::integers()).unwrap()),
		Box::new(MultiTree::<i64, V>::new(5, compare::integers()).unwrap()),
	]
}

// ===========================================================================
// Arc Reference Count Tests
// ===========================================================================

#[test]
fn removed_values_are_released() {
	for tree in trees::<Arc<String>>() {
		let value = Arc::new("payload".to_string());
		for k in 0..100 {
			tree.put(k, Arc::clone(&value));
		}
		assert_eq!(Arc::strong_count(&value), 101);

		for k in 0..60 {
			drop(tree.remove(&k).unwrap());
		}
		assert_eq!(Arc::strong_count(&value), 41);

		tree.clear();
		assert_eq!(Arc::strong_count(&value), 1);
	}
}

#[test]
fn replaced_values_are_released() {
	for tree in trees::<Arc<i64>>() {
		let first = Arc::new(1);
		let second = Arc::new(2);
		tree.put(7, Arc::clone(&first));

		let old = tree.put(7, Arc::clone(&second));
		assert!(old.is_some());
		drop(old);
		assert_eq!(Arc::strong_count(&first), 1);
		assert_eq!(Arc::strong_count(&second), 2);

		// compute_if_present swaps in the new value and drops the old one.
		tree.compute_if_present(&7, &mut |_| (Arc::clone(&first), true)).unwrap();
		assert_eq!(Arc::strong_count(&first), 2);
		assert_eq!(Arc::strong_count(&second), 1);
	}
}

#[test]
fn dropping_the_tree_releases_everything() {
	let value = Arc::new(0u8);
	{
		let avl = AvlTree::new(compare::integers());
		let multi = MultiTree::new(3, compare::integers()).unwrap();
		for k in 0..1000 {
			avl.put(k, Arc::clone(&value));
			multi.put(k, Arc::clone(&value));
		}
		assert_eq!(Arc::strong_count(&value), 2001);
	}
	assert_eq!(Arc::strong_count(&value), 1);
}

#[test]
fn reads_hand_out_clones_not_references() {
	for tree in trees::<Arc<i64>>() {
		let value = Arc::new(5);
		tree.put(1, Arc::clone(&value));

		let copies = vec![tree.get(&1).unwrap(), tree.min().unwrap().1, tree.values().remove(0)];
		assert_eq!(Arc::strong_count(&value), 5);
		drop(copies);
		assert_eq!(Arc::strong_count(&value), 2);
	}
}

// ===========================================================================
// Drop Count Tests
// ===========================================================================

#[test]
fn restructuring_never_double_drops() {
	for tree in trees::<DropCounter>() {
		let drops = Arc::new(AtomicUsize::new(0));
		let n = 2000;

		for k in 0..n {
			tree.put(k, DropCounter(Arc::clone(&drops)));
		}
		assert_eq!(drops.load(Ordering::SeqCst), 0, "inserts must not drop anything");

		// Interleaved removal drives rotations, borrows and merges.
		let mut removed = 0;
		for k in (0..n).step_by(3).chain((1..n).step_by(3)) {
			drop(tree.remove(&k).unwrap());
			removed += 1;
			assert_eq!(drops.load(Ordering::SeqCst), removed);
		}

		let remaining = tree.len();
		tree.clear();
		assert_eq!(drops.load(Ordering::SeqCst), removed + remaining);
		assert_eq!(drops.load(Ordering::SeqCst), n as usize);
	}
}

#[test]
fn failed_operations_drop_only_their_arguments() {
	for tree in trees::<DropCounter>() {
		let drops = Arc::new(AtomicUsize::new(0));
		tree.put(1, DropCounter(Arc::clone(&drops)));

		// The rejected value is dropped; the stored one is cloned out.
		let existing = tree.put_if_absent(1, DropCounter(Arc::clone(&drops)));
		assert_eq!(drops.load(Ordering::SeqCst), 1);
		drop(existing);
		assert_eq!(drops.load(Ordering::SeqCst), 2);

		assert!(tree.remove(&99).is_err());
		assert_eq!(drops.load(Ordering::SeqCst), 2);
		assert_eq!(tree.len(), 1);
	}
}
