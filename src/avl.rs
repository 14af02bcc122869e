//! # Height-Balanced Binary Tree
//!
//! [`AvlTree`] is an ordered map kept balanced by rotations: for every node the
//! heights of its two subtrees differ by at most one, so every lookup, insert
//! and delete walks `O(log n)` nodes.
//!
//! ## Layout
//!
//! ```text
//!                  ┌───────────────────────────────┐
//!                  │ VersionLatch<AvlCore>         │  <- one RwLock + modification counter
//!                  │   root ─┐   len   arena       │
//!                  └─────────┼─────────────────────┘
//!                            ▼
//!                        ┌───────┐
//!                        │ #0  5 │  parent: None
//!                        └┬─────┬┘
//!                 left    │     │   right
//!                    ┌────▼┐   ┌▼────┐
//!                    │#1  3│   │#2  8│  parent: Some(#0)
//!                    └─────┘   └─────┘
//! ```
//!
//! Nodes live in an arena and reference each other by `NodeId`. A node
//! owns its children through the arena; the `parent` id is a back-reference
//! used only by iteration to find the in-order successor without descending
//! from the root again.
//!
//! ## Rebalancing
//!
//! After an insert or a delete, every node on the path back to the root has its
//! height recomputed from its (already final) children and is rotated if its
//! balance factor `height(left) - height(right)` left `[-1, 1]`:
//!
//! | Shape       | Fix                                           |
//! |-------------|-----------------------------------------------|
//! | left-left   | rotate right                                  |
//! | left-right  | rotate the left child left, then rotate right |
//! | right-right | rotate left                                   |
//! | right-left  | rotate the right child right, then rotate left|

use std::cmp::Ordering;
use std::fmt;
use std::mem;

use tracing::{debug, trace};

use crate::arena::{Arena, NodeId};
use crate::compare::{self, Comparator};
use crate::config::TreeConfig;
use crate::error::{Error, Result};
use crate::iter::Iter;
use crate::latch::VersionLatch;

/// A concurrent, comparator-ordered map backed by a height-balanced binary tree.
///
/// All methods take `&self`: mutations serialize on an internal write lock while
/// reads share a read lock. Share a tree between threads with `Arc<AvlTree<K, V>>`.
///
/// # Example
///
/// ```
/// use ordtree::{compare, AvlTree};
///
/// let tree = AvlTree::new(compare::integers());
/// for k in [5, 3, 8, 1, 4] {
/// 	tree.put(k, k * 10);
/// }
///
/// assert_eq!(tree.keys(), vec![1, 3, 4, 5, 8]);
/// assert_eq!(tree.get(&4), Ok(40));
/// assert_eq!(tree.find_range(&3, &8).unwrap(), vec![(3, 30), (4, 40), (5, 50)]);
/// ```
pub struct AvlTree<K, V> {
	comparator: Comparator<K>,
	latch: VersionLatch<AvlCore<K, V>>,
}

impl<K: Ord + 'static, V> Default for AvlTree<K, V> {
	/// An empty tree ordered by `K`'s natural order.
	fn default() -> Self {
		Self::new(compare::natural())
	}
}

impl<K, V> AvlTree<K, V> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates an empty tree ordered by `comparator`.
	pub fn new(comparator: Comparator<K>) -> Self {
		debug!("created empty binary tree");
		AvlTree {
			comparator,
			latch: VersionLatch::new(AvlCore::new()),
		}
	}

	/// Creates an empty tree from a [`TreeConfig`].
	///
	/// Fails with [`Error::InvalidComparator`] if the configuration has no
	/// comparator. The configured degree is ignored.
	pub fn with_config(config: TreeConfig<K>) -> Result<Self> {
		Ok(Self::new(config.validate_comparator()?))
	}

	// -----------------------------------------------------------------------
	// Metadata
	// -----------------------------------------------------------------------

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.latch.shared().len
	}

	/// Returns `true` if the tree holds no entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Height of the root node: `-1` for an empty tree, `0` for a single entry.
	pub fn height(&self) -> isize {
		let core = self.latch.shared();
		core.height_of(core.root) as isize
	}

	/// The modification counter. It advances once per mutating call.
	pub fn version(&self) -> usize {
		self.latch.version()
	}

	// -----------------------------------------------------------------------
	// Read Operations
	// -----------------------------------------------------------------------

	/// Returns a clone of the value stored under `key`.
	///
	/// Fails with [`Error::KeyNotFound`] if the key is absent.
	pub fn get(&self, key: &K) -> Result<V>
	where
		V: Clone,
	{
		let core = self.latch.shared();
		core.find(&self.comparator, key).map(|id| core.arena[id].value.clone()).ok_or(Error::KeyNotFound)
	}

	/// Returns a clone of the value under `key`, or `default` if the key is absent.
	pub fn get_or_default(&self, key: &K, default: V) -> V
	where
		V: Clone,
	{
		self.get(key).unwrap_or(default)
	}

	/// Returns `true` if the tree contains `key`.
	pub fn contains(&self, key: &K) -> bool {
		self.latch.shared().find(&self.comparator, key).is_some()
	}

	/// Visits every entry in ascending key order while holding the read lock.
	///
	/// The visitor must not call back into this tree's mutating methods: the
	/// write lock cannot be taken while the read lock is held.
	pub fn for_each<F>(&self, mut visit: F)
	where
		F: FnMut(&K, &V),
	{
		let core = self.latch.shared();
		let mut cursor = core.first();
		while let Some(id) = cursor {
			let node = &core.arena[id];
			visit(&node.key, &node.value);
			cursor = core.successor(id);
		}
	}

	/// Returns clones of all keys in ascending order.
	pub fn keys(&self) -> Vec<K>
	where
		K: Clone,
	{
		let mut out = Vec::with_capacity(self.len());
		self.for_each(|k, _| out.push(k.clone()));
		out
	}

	/// Returns clones of all values, ordered by their keys.
	pub fn values(&self) -> Vec<V>
	where
		V: Clone,
	{
		let mut out = Vec::with_capacity(self.len());
		self.for_each(|_, v| out.push(v.clone()));
		out
	}

	/// Returns clones of all entries in ascending key order.
	pub fn key_values(&self) -> Vec<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		let mut out = Vec::with_capacity(self.len());
		self.for_each(|k, v| out.push((k.clone(), v.clone())));
		out
	}

	/// Returns clones of all entries with `from <= key < to`, in ascending order.
	///
	/// Fails with [`Error::InvalidRange`] unless `from < to`.
	pub fn find_range(&self, from: &K, to: &K) -> Result<Vec<(K, V)>>
	where
		K: Clone,
		V: Clone,
	{
		if (self.comparator)(from, to) != Ordering::Less {
			return Err(Error::InvalidRange);
		}
		let core = self.latch.shared();
		let mut out = Vec::new();
		core.collect_range(&self.comparator, core.root, from, to, &mut out);
		Ok(out)
	}

	/// Returns the entry with the smallest key, or [`Error::EmptyTree`].
	pub fn min(&self) -> Result<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		let core = self.latch.shared();
		core.first().map(|id| core.entry(id)).ok_or(Error::EmptyTree)
	}

	/// Returns the entry with the largest key, or [`Error::EmptyTree`].
	pub fn max(&self) -> Result<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		let core = self.latch.shared();
		core.root.map(|root| core.entry(core.rightmost(root))).ok_or(Error::EmptyTree)
	}

	/// Returns an iterator over clones of the entries in ascending key order.
	///
	/// The iterator holds no lock between steps. Each step fails with
	/// [`Error::ConcurrentModification`] if the tree was mutated after the
	/// iterator was created.
	pub fn iter(&self) -> Iter<'_, K, V> {
		Iter::new(&self.latch)
	}

	// -----------------------------------------------------------------------
	// Write Operations
	// -----------------------------------------------------------------------

	/// Inserts `value` under `key`, returning the previous value if the key was
	/// already present. An existing entry is updated in place.
	pub fn put(&self, key: K, value: V) -> Option<V> {
		let mut core = self.latch.exclusive();
		let stamp = core.version();
		core.put(&self.comparator, key, value, stamp)
	}

	/// Inserts `value` only if `key` is absent.
	///
	/// Returns `None` if the entry was inserted, or a clone of the existing
	/// value, which is left untouched.
	pub fn put_if_absent(&self, key: K, value: V) -> Option<V>
	where
		V: Clone,
	{
		let mut core = self.latch.exclusive();
		if let Some(id) = core.find(&self.comparator, &key) {
			return Some(core.arena[id].value.clone());
		}
		let stamp = core.version();
		core.put(&self.comparator, key, value, stamp);
		None
	}

	/// Inserts every entry under a single write-lock acquisition.
	///
	/// Later entries overwrite earlier ones with the same key. Returns how many
	/// keys were newly added.
	pub fn batch_insert<I>(&self, entries: I) -> usize
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut core = self.latch.exclusive();
		let stamp = core.version();
		let before = core.len;
		for (key, value) in entries {
			core.put(&self.comparator, key, value, stamp);
		}
		core.len - before
	}

	/// Removes `key`, returning its value.
	///
	/// Fails with [`Error::KeyNotFound`] if the key is absent; the tree is left
	/// unchanged.
	pub fn remove(&self, key: &K) -> Result<V> {
		let mut core = self.latch.exclusive();
		let stamp = core.version();
		core.remove(&self.comparator, key, stamp).ok_or(Error::KeyNotFound)
	}

	/// Atomically recomputes the value under `key`.
	///
	/// `f` receives the current value and returns `(new_value, keep)`. When
	/// `keep` is true the entry is updated and `Some(new_value)` is returned;
	/// otherwise the entry is removed and `None` is returned. Fails with
	/// [`Error::KeyNotFound`] if the key is absent, without calling `f`.
	///
	/// ```
	/// use ordtree::AvlTree;
	///
	/// let stock: AvlTree<&str, u32> = AvlTree::default();
	/// stock.put("apple", 2);
	///
	/// let take_one = |n: &u32| (n - 1, *n > 1);
	/// assert_eq!(stock.compute_if_present(&"apple", take_one), Ok(Some(1)));
	/// assert_eq!(stock.compute_if_present(&"apple", take_one), Ok(None));
	/// assert!(!stock.contains(&"apple"));
	/// ```
	pub fn compute_if_present<F>(&self, key: &K, f: F) -> Result<Option<V>>
	where
		V: Clone,
		F: FnOnce(&V) -> (V, bool),
	{
		let mut core = self.latch.exclusive();
		let stamp = core.version();
		let id = core.find(&self.comparator, key).ok_or(Error::KeyNotFound)?;
		let (value, keep) = f(&core.arena[id].value);
		if keep {
			let node = &mut core.arena[id];
			node.value = value.clone();
			node.stamp = stamp;
			Ok(Some(value))
		} else {
			core.remove(&self.comparator, key, stamp);
			Ok(None)
		}
	}

	/// Removes every entry.
	pub fn clear(&self) {
		let mut core = self.latch.exclusive();
		debug!(entries = core.len, "clearing binary tree");
		core.arena.clear();
		core.root = None;
		core.len = 0;
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut map = f.debug_map();
		self.for_each(|k, v| {
			map.entry(k, v);
		});
		map.finish()
	}
}

// ===========================================================================
// Node and Core
// ===========================================================================

pub(crate) struct Node<K, V> {
	pub(crate) key: K,
	pub(crate) value: V,
	height: i32,
	left: Option<NodeId>,
	right: Option<NodeId>,
	/// Back-reference for iteration only; ownership flows root to leaves.
	parent: Option<NodeId>,
	/// Version of the write that last touched this entry.
	stamp: usize,
}

/// The lock-protected state of an [`AvlTree`].
pub(crate) struct AvlCore<K, V> {
	arena: Arena<Node<K, V>>,
	root: Option<NodeId>,
	len: usize,
}

impl<K, V> AvlCore<K, V> {
	fn new() -> Self {
		AvlCore {
			arena: Arena::new(),
			root: None,
			len: 0,
		}
	}

	pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
		&self.arena[id]
	}

	fn entry(&self, id: NodeId) -> (K, V)
	where
		K: Clone,
		V: Clone,
	{
		let node = &self.arena[id];
		(node.key.clone(), node.value.clone())
	}

	// -----------------------------------------------------------------------
	// Navigation
	// -----------------------------------------------------------------------

	fn find(&self, cmp: &Comparator<K>, key: &K) -> Option<NodeId> {
		let mut cursor = self.root;
		while let Some(id) = cursor {
			let node = &self.arena[id];
			cursor = match cmp(key, &node.key) {
				Ordering::Less => node.left,
				Ordering::Greater => node.right,
				Ordering::Equal => return Some(id),
			};
		}
		None
	}

	/// The node holding the smallest key.
	pub(crate) fn first(&self) -> Option<NodeId> {
		self.root.map(|root| self.leftmost(root))
	}

	fn leftmost(&self, mut id: NodeId) -> NodeId {
		while let Some(left) = self.arena[id].left {
			id = left;
		}
		id
	}

	fn rightmost(&self, mut id: NodeId) -> NodeId {
		while let Some(right) = self.arena[id].right {
			id = right;
		}
		id
	}

	/// The in-order successor of `id`: the minimum of its right subtree if it has
	/// one, otherwise the nearest ancestor whose left subtree contains `id`.
	pub(crate) fn successor(&self, id: NodeId) -> Option<NodeId> {
		if let Some(right) = self.arena[id].right {
			return Some(self.leftmost(right));
		}
		let mut child = id;
		let mut parent = self.arena[id].parent;
		while let Some(p) = parent {
			if self.arena[p].left == Some(child) {
				return Some(p);
			}
			child = p;
			parent = self.arena[p].parent;
		}
		None
	}

	/// Appends `[from, to)` from the subtree at `slot` to `out` in order, pruning
	/// subtrees that lie entirely outside the range.
	fn collect_range(
		&self,
		cmp: &Comparator<K>,
		slot: Option<NodeId>,
		from: &K,
		to: &K,
		out: &mut Vec<(K, V)>,
	) where
		K: Clone,
		V: Clone,
	{
		let Some(id) = slot else {
			return;
		};
		let node = &self.arena[id];
		let vs_from = cmp(&node.key, from);
		let below_to = cmp(&node.key, to) == Ordering::Less;
		// Keys equal to `from` have nothing in range to their left.
		if vs_from == Ordering::Greater {
			self.collect_range(cmp, node.left, from, to, out);
		}
		if vs_from != Ordering::Less && below_to {
			out.push((node.key.clone(), node.value.clone()));
		}
		if below_to {
			self.collect_range(cmp, node.right, from, to, out);
		}
	}

	// -----------------------------------------------------------------------
	// Heights and Links
	// -----------------------------------------------------------------------

	fn height_of(&self, slot: Option<NodeId>) -> i32 {
		slot.map_or(-1, |id| self.arena[id].height)
	}

	fn update_height(&mut self, id: NodeId) {
		let node = &self.arena[id];
		let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
		self.arena[id].height = height;
	}

	fn balance_factor(&self, id: NodeId) -> i32 {
		let node = &self.arena[id];
		self.height_of(node.left) - self.height_of(node.right)
	}

	fn set_left(&mut self, id: NodeId, child: Option<NodeId>) {
		self.arena[id].left = child;
		if let Some(child) = child {
			self.arena[child].parent = Some(id);
		}
	}

	fn set_right(&mut self, id: NodeId, child: Option<NodeId>) {
		self.arena[id].right = child;
		if let Some(child) = child {
			self.arena[child].parent = Some(id);
		}
	}

	fn adopt_root(&mut self, root: Option<NodeId>) {
		self.root = root;
		if let Some(root) = root {
			self.arena[root].parent = None;
		}
	}

	// -----------------------------------------------------------------------
	// Rotations
	// -----------------------------------------------------------------------

	/// Rotates the subtree at `id` to the right and returns its new root, which
	/// inherits `id`'s parent link.
	fn rotate_right(&mut self, id: NodeId) -> NodeId {
		let pivot = self.arena[id].left.expect("right rotation requires a left child");
		trace!(node = ?id, pivot = ?pivot, "rotate right");
		let parent = self.arena[id].parent;
		let inner = self.arena[pivot].right;
		self.set_left(id, inner);
		self.set_right(pivot, Some(id));
		self.arena[pivot].parent = parent;
		self.update_height(id);
		self.update_height(pivot);
		pivot
	}

	/// Mirror image of [`rotate_right`](Self::rotate_right).
	fn rotate_left(&mut self, id: NodeId) -> NodeId {
		let pivot = self.arena[id].right.expect("left rotation requires a right child");
		trace!(node = ?id, pivot = ?pivot, "rotate left");
		let parent = self.arena[id].parent;
		let inner = self.arena[pivot].left;
		self.set_right(id, inner);
		self.set_left(pivot, Some(id));
		self.arena[pivot].parent = parent;
		self.update_height(id);
		self.update_height(pivot);
		pivot
	}

	/// Restores the balance invariant at `id`, assuming both subtrees are already
	/// balanced, and returns the subtree's new root.
	fn rebalance(&mut self, id: NodeId) -> NodeId {
		self.update_height(id);
		let balance = self.balance_factor(id);

		if balance > 1 {
			let left = self.arena[id].left.expect("left-heavy node has a left child");
			if self.balance_factor(left) < 0 {
				let left = self.rotate_left(left);
				self.set_left(id, Some(left));
			}
			return self.rotate_right(id);
		}

		if balance < -1 {
			let right = self.arena[id].right.expect("right-heavy node has a right child");
			if self.balance_factor(right) > 0 {
				let right = self.rotate_right(right);
				self.set_right(id, Some(right));
			}
			return self.rotate_left(id);
		}

		id
	}

	// -----------------------------------------------------------------------
	// Insertion
	// -----------------------------------------------------------------------

	fn put(&mut self, cmp: &Comparator<K>, key: K, value: V, stamp: usize) -> Option<V> {
		let root = self.root;
		let (root, old) = self.insert(cmp, root, None, key, value, stamp);
		self.adopt_root(Some(root));
		old
	}

	/// Inserts into the subtree at `slot` and returns the subtree's new root
	/// together with the replaced value, if any.
	fn insert(
		&mut self,
		cmp: &Comparator<K>,
		slot: Option<NodeId>,
		parent: Option<NodeId>,
		key: K,
		value: V,
		stamp: usize,
	) -> (NodeId, Option<V>) {
		let Some(id) = slot else {
			let id = self.arena.alloc(Node {
				key,
				value,
				height: 0,
				left: None,
				right: None,
				parent,
				stamp,
			});
			self.len += 1;
			return (id, None);
		};

		match cmp(&key, &self.arena[id].key) {
			Ordering::Less => {
				let left = self.arena[id].left;
				let (left, old) = self.insert(cmp, left, Some(id), key, value, stamp);
				self.set_left(id, Some(left));
				if old.is_some() {
					return (id, old);
				}
				(self.rebalance(id), None)
			}
			Ordering::Greater => {
				let right = self.arena[id].right;
				let (right, old) = self.insert(cmp, right, Some(id), key, value, stamp);
				self.set_right(id, Some(right));
				if old.is_some() {
					return (id, old);
				}
				(self.rebalance(id), None)
			}
			Ordering::Equal => {
				let node = &mut self.arena[id];
				node.stamp = stamp;
				(id, Some(mem::replace(&mut node.value, value)))
			}
		}
	}

	// -----------------------------------------------------------------------
	// Deletion
	// -----------------------------------------------------------------------

	fn remove(&mut self, cmp: &Comparator<K>, key: &K, stamp: usize) -> Option<V> {
		let root = self.root;
		let (root, removed) = self.delete(cmp, root, key, stamp);
		if removed.is_some() {
			self.adopt_root(root);
		}
		removed
	}

	/// Deletes `key` from the subtree at `slot` and returns the subtree's new root
	/// together with the removed value. The returned root's parent link is fixed
	/// up by the caller.
	fn delete(
		&mut self,
		cmp: &Comparator<K>,
		slot: Option<NodeId>,
		key: &K,
		stamp: usize,
	) -> (Option<NodeId>, Option<V>) {
		let Some(id) = slot else {
			return (None, None);
		};

		match cmp(key, &self.arena[id].key) {
			Ordering::Less => {
				let left = self.arena[id].left;
				let (left, removed) = self.delete(cmp, left, key, stamp);
				if removed.is_none() {
					return (Some(id), None);
				}
				self.set_left(id, left);
				(Some(self.rebalance(id)), removed)
			}
			Ordering::Greater => {
				let right = self.arena[id].right;
				let (right, removed) = self.delete(cmp, right, key, stamp);
				if removed.is_none() {
					return (Some(id), None);
				}
				self.set_right(id, right);
				(Some(self.rebalance(id)), removed)
			}
			Ordering::Equal => match (self.arena[id].left, self.arena[id].right) {
				(Some(_), Some(right)) => {
					// Two children: the in-order successor's entry moves into this node.
					let (right, successor) = self.detach_min(right);
					self.set_right(id, right);
					let node = &mut self.arena[id];
					node.key = successor.key;
					node.stamp = stamp;
					let old = mem::replace(&mut node.value, successor.value);
					(Some(self.rebalance(id)), Some(old))
				}
				(child, None) | (None, child) => {
					let node = self.arena.take(id);
					self.len -= 1;
					(child, Some(node.value))
				}
			},
		}
	}

	/// Unlinks the minimum node of the subtree at `id`, returning the subtree's
	/// new root and the detached node.
	fn detach_min(&mut self, id: NodeId) -> (Option<NodeId>, Node<K, V>) {
		match self.arena[id].left {
			Some(left) => {
				let (left, min) = self.detach_min(left);
				self.set_left(id, left);
				(Some(self.rebalance(id)), min)
			}
			None => {
				let right = self.arena[id].right;
				let node = self.arena.take(id);
				self.len -= 1;
				(right, node)
			}
		}
	}
}

// ===========================================================================
// Invariant Validation
// ===========================================================================

impl<K: fmt::Debug, V> AvlTree<K, V> {
	/// Validates every structural invariant, panicking with diagnostics on the
	/// first violation. Intended for tests.
	///
	/// # Invariants Checked
	///
	/// 1. Balance: `|height(left) - height(right)| <= 1` at every node
	/// 2. Heights: stored heights match the children's
	/// 3. Ordering: keys strictly ascend in-order under the comparator
	/// 4. Parent links: every child points back at its parent, the root at nothing
	/// 5. Length: `len()` matches the number of reachable nodes and live slots
	/// 6. Stamps: no node was written at a version later than the current one
	#[doc(hidden)]
	pub fn assert_invariants(&self) {
		let core = self.latch.shared();
		let version = core.version();

		if let Some(root) = core.root {
			assert_eq!(core.arena[root].parent, None, "root {:?} has a parent", root);
		}

		let mut keys: Vec<&K> = Vec::with_capacity(core.len);
		core.validate_node(core.root, version, &mut keys);

		assert_eq!(keys.len(), core.len, "reachable nodes {} != len {}", keys.len(), core.len);
		assert_eq!(core.arena.len(), core.len, "live arena slots {} != len {}", core.arena.len(), core.len);

		for pair in keys.windows(2) {
			assert_eq!(
				(self.comparator)(pair[0], pair[1]),
				Ordering::Less,
				"keys out of order: {:?} then {:?}",
				pair[0],
				pair[1]
			);
		}

		// Walking with parent links must visit the same nodes as the recursive walk.
		let mut walked = 0;
		let mut cursor = core.first();
		while let Some(id) = cursor {
			walked += 1;
			cursor = core.successor(id);
		}
		assert_eq!(walked, core.len, "successor walk visited {} of {} nodes", walked, core.len);
	}
}

impl<K: fmt::Debug, V> AvlCore<K, V> {
	/// Recursively validates the subtree at `slot`, pushing its keys in order and
	/// returning its height.
	fn validate_node<'a>(&'a self, slot: Option<NodeId>, version: usize, keys: &mut Vec<&'a K>) -> i32 {
		let Some(id) = slot else {
			return -1;
		};
		let node = &self.arena[id];

		for child in [node.left, node.right].into_iter().flatten() {
			assert_eq!(
				self.arena[child].parent,
				Some(id),
				"child {:?} of {:?} (key {:?}) has parent {:?}",
				child,
				id,
				node.key,
				self.arena[child].parent
			);
		}

		let left = self.validate_node(node.left, version, keys);
		keys.push(&node.key);
		let right = self.validate_node(node.right, version, keys);

		assert!(
			(left - right).abs() <= 1,
			"node {:?} (key {:?}) unbalanced: left height {}, right height {}",
			id,
			node.key,
			left,
			right
		);
		assert_eq!(node.height, 1 + left.max(right), "node {:?} (key {:?}) has stale height", id, node.key);
		assert!(node.stamp <= version, "node {:?} stamped {} after version {}", id, node.stamp, version);

		node.height
	}
}
