//! # Multi-Way Balanced Tree
//!
//! [`MultiTree`] is an ordered map built on a classic B-tree of degree `t`:
//! every node other than the root holds between `t - 1` and `2t - 1` keys, an
//! internal node with `k` keys has exactly `k + 1` children, and all leaves sit
//! at the same depth. Values are stored next to their keys in every node, not
//! only in the leaves.
//!
//! ## Node Layout
//!
//! ```text
//!                      ┌──────────────────────────┐
//!                      │ keys:   [ 10 | 20 ]      │
//!                      │ values: [ a  | b  ]      │
//!                      │ children: c0  c1  c2     │
//!                      └──┬─────────┬─────────┬───┘
//!                         ▼         ▼         ▼
//!                    keys < 10  10 < keys < 20  keys > 20
//! ```
//!
//! ## Insertion: preemptive split
//!
//! A full node (`2t - 1` keys) is split before the descent enters it. The root
//! is split first if needed, growing the tree by one level; after that the
//! descent only ever steps into nodes with room to spare, so a split never has
//! to propagate back up.
//!
//! ## Deletion: fill before descending
//!
//! Before the descent enters a child holding only `t - 1` keys, the child is
//! topped up: it borrows a key from its left sibling (rotating through the
//! parent), else from its right sibling, else it is merged with a sibling
//! around the separating parent key. Every node reached therefore has at least
//! `t` keys and can lose one without underflowing. A key found in an internal
//! node is replaced by its predecessor or successor when the neighbouring
//! child can spare one, otherwise the two children around it are merged and
//! the delete continues in the merged node.

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::ControlFlow;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::compare::{self, Comparator};
use crate::config::{TreeConfig, DEFAULT_DEGREE};
use crate::error::{Error, Result};
use crate::latch::VersionLatch;

/// A concurrent, comparator-ordered map backed by a B-tree of configurable degree.
///
/// All methods take `&self`: mutations serialize on an internal write lock while
/// reads share a read lock. Share a tree between threads with `Arc<MultiTree<K, V>>`.
///
/// # Example
///
/// ```
/// use ordtree::{compare, MultiTree};
///
/// let tree = MultiTree::new(2, compare::strings()).unwrap();
/// for word in ["pear", "apple", "fig", "kiwi"] {
/// 	tree.put(word.to_string(), word.len());
/// }
///
/// assert_eq!(tree.min().unwrap(), ("apple".to_string(), 5));
/// assert_eq!(tree.keys(), vec!["apple", "fig", "kiwi", "pear"]);
/// ```
pub struct MultiTree<K, V> {
	comparator: Comparator<K>,
	degree: usize,
	latch: VersionLatch<BTreeCore<K, V>>,
}

impl<K: Ord + 'static, V> Default for MultiTree<K, V> {
	/// An empty tree of [`DEFAULT_DEGREE`] ordered by `K`'s natural order.
	fn default() -> Self {
		Self::from_parts(compare::natural(), DEFAULT_DEGREE)
	}
}

impl<K, V> MultiTree<K, V> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates an empty tree of the given degree.
	///
	/// Fails with [`Error::InvalidDegree`] if `degree < 2` or
	/// `degree > usize::MAX / 2`.
	pub fn new(degree: usize, comparator: Comparator<K>) -> Result<Self> {
		Self::with_config(TreeConfig::new().with_comparator(comparator).with_degree(degree))
	}

	/// Creates an empty tree from a [`TreeConfig`].
	///
	/// Fails with [`Error::InvalidComparator`] if no comparator is configured and
	/// with [`Error::InvalidDegree`] if the degree is outside
	/// [`MIN_DEGREE`](crate::MIN_DEGREE)`..=`[`MAX_DEGREE`](crate::MAX_DEGREE).
	pub fn with_config(config: TreeConfig<K>) -> Result<Self> {
		let comparator = config.validate_comparator()?;
		let degree = config.validate_degree()?;
		Ok(Self::from_parts(comparator, degree))
	}

	fn from_parts(comparator: Comparator<K>, degree: usize) -> Self {
		debug!(degree, "created empty multi-way tree");
		MultiTree {
			comparator,
			degree,
			latch: VersionLatch::new(BTreeCore {
				root: Box::new(Node::new()),
				len: 0,
			}),
		}
	}

	// -----------------------------------------------------------------------
	// Metadata
	// -----------------------------------------------------------------------

	/// The degree `t`: non-root nodes hold between `t - 1` and `2t - 1` keys.
	pub fn degree(&self) -> usize {
		self.degree
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.latch.shared().len
	}

	/// Returns `true` if the tree holds no entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of levels: 1 while the root is a leaf.
	pub fn height(&self) -> usize {
		let core = self.latch.shared();
		let mut node = &*core.root;
		let mut height = 1;
		while let Some(first) = node.children.first() {
			node = first;
			height += 1;
		}
		height
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
		core.root.get(&self.comparator, key).cloned().ok_or(Error::KeyNotFound)
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
		self.latch.shared().root.get(&self.comparator, key).is_some()
	}

	/// Visits every entry in ascending key order while holding the read lock.
	///
	/// The visitor must not call back into this tree's mutating methods.
	pub fn for_each<F>(&self, mut visit: F)
	where
		F: FnMut(&K, &V),
	{
		self.latch.shared().root.for_each(&mut visit);
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
		if let ControlFlow::Break(()) = core.root.collect_range(&self.comparator, from, to, &mut out) {
			trace!("range scan stopped at upper bound");
		}
		Ok(out)
	}

	/// Returns the entry with the smallest key, or [`Error::EmptyTree`].
	pub fn min(&self) -> Result<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		let core = self.latch.shared();
		let mut node = &*core.root;
		while let Some(first) = node.children.first() {
			node = first;
		}
		node.entry(0).ok_or(Error::EmptyTree)
	}

	/// Returns the entry with the largest key, or [`Error::EmptyTree`].
	pub fn max(&self) -> Result<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		let core = self.latch.shared();
		let mut node = &*core.root;
		while let Some(last) = node.children.last() {
			node = last;
		}
		node.keys.len().checked_sub(1).and_then(|i| node.entry(i)).ok_or(Error::EmptyTree)
	}

	// -----------------------------------------------------------------------
	// Write Operations
	// -----------------------------------------------------------------------

	/// Inserts `value` under `key`, returning the previous value if the key was
	/// already present. An existing entry is updated in place.
	pub fn put(&self, key: K, value: V) -> Option<V> {
		self.latch.exclusive().put(&self.comparator, self.degree, key, value)
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
		if let Some(existing) = core.root.get(&self.comparator, &key) {
			return Some(existing.clone());
		}
		core.put(&self.comparator, self.degree, key, value);
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
		let before = core.len;
		for (key, value) in entries {
			core.put(&self.comparator, self.degree, key, value);
		}
		core.len - before
	}

	/// Removes `key`, returning its value.
	///
	/// Fails with [`Error::KeyNotFound`] if the key is absent; the tree is left
	/// unchanged.
	pub fn remove(&self, key: &K) -> Result<V> {
		self.latch.exclusive().remove(&self.comparator, self.degree, key).ok_or(Error::KeyNotFound)
	}

	/// Atomically recomputes the value under `key`.
	///
	/// `f` receives the current value and returns `(new_value, keep)`. When
	/// `keep` is true the entry is updated in place and `Some(new_value)` is
	/// returned; otherwise the entry is removed and `None` is returned. Fails
	/// with [`Error::KeyNotFound`] if the key is absent, without calling `f`.
	pub fn compute_if_present<F>(&self, key: &K, f: F) -> Result<Option<V>>
	where
		V: Clone,
		F: FnOnce(&V) -> (V, bool),
	{
		let mut core = self.latch.exclusive();
		let slot = core.root.get_mut(&self.comparator, key).ok_or(Error::KeyNotFound)?;
		let (value, keep) = f(slot);
		if keep {
			*slot = value.clone();
			return Ok(Some(value));
		}
		core.remove(&self.comparator, self.degree, key);
		Ok(None)
	}

	/// Removes every entry, shrinking the tree back to a single empty leaf.
	pub fn clear(&self) {
		let mut core = self.latch.exclusive();
		debug!(entries = core.len, "clearing multi-way tree");
		core.root = Box::new(Node::new());
		core.len = 0;
	}
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MultiTree<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut map = f.debug_map();
		self.for_each(|k, v| {
			map.entry(k, v);
		});
		map.finish()
	}
}

// ===========================================================================
// Core
// ===========================================================================

/// The lock-protected state of a [`MultiTree`].
struct BTreeCore<K, V> {
	root: Box<Node<K, V>>,
	len: usize,
}

impl<K, V> BTreeCore<K, V> {
	fn put(&mut self, cmp: &Comparator<K>, t: usize, key: K, value: V) -> Option<V> {
		if self.root.is_full(t) {
			trace!(degree = t, "splitting full root");
			let old_root = mem::replace(&mut self.root, Box::new(Node::new()));
			self.root.children.push(old_root);
			self.root.split_child(0, t);
		}
		let old = self.root.insert_non_full(cmp, t, key, value);
		if old.is_none() {
			self.len += 1;
		}
		old
	}

	fn remove(&mut self, cmp: &Comparator<K>, t: usize, key: &K) -> Option<V> {
		// Borrowing and merging on the way down would reshape the tree even for a
		// missing key, so check first.
		self.root.get(cmp, key)?;

		let removed = self.root.remove(cmp, t, key);
		if self.root.keys.is_empty() && !self.root.is_leaf() {
			trace!("collapsing empty root");
			self.root = self.root.children.remove(0);
		}
		if removed.is_some() {
			self.len -= 1;
		}
		removed
	}
}

// ===========================================================================
// Node
// ===========================================================================

/// Inline capacity before a node's arrays spill to the heap.
const INLINE_KEYS: usize = 8;

/// A B-tree node. Leaves have no children; an internal node has one more child
/// than it has keys.
pub(crate) struct Node<K, V> {
	keys: SmallVec<[K; INLINE_KEYS]>,
	values: SmallVec<[V; INLINE_KEYS]>,
	children: SmallVec<[Box<Node<K, V>>; INLINE_KEYS + 1]>,
}

impl<K, V> Node<K, V> {
	fn new() -> Self {
		Node {
			keys: SmallVec::new(),
			values: SmallVec::new(),
			children: SmallVec::new(),
		}
	}

	#[inline]
	pub(crate) fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	#[inline]
	fn is_full(&self, t: usize) -> bool {
		self.keys.len() == 2 * t - 1
	}

	/// Locates `key` in this node: `(pos, true)` if `keys[pos]` equals it,
	/// otherwise `(pos, false)` where `pos` is the child to descend into.
	fn lower_bound(&self, cmp: &Comparator<K>, key: &K) -> (usize, bool) {
		match self.keys.binary_search_by(|probe| cmp(probe, key)) {
			Ok(pos) => (pos, true),
			Err(pos) => (pos, false),
		}
	}

	fn entry(&self, pos: usize) -> Option<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		Some((self.keys.get(pos)?.clone(), self.values.get(pos)?.clone()))
	}

	// -----------------------------------------------------------------------
	// Lookup and Traversal
	// -----------------------------------------------------------------------

	fn get(&self, cmp: &Comparator<K>, key: &K) -> Option<&V> {
		let (pos, found) = self.lower_bound(cmp, key);
		if found {
			Some(&self.values[pos])
		} else if self.is_leaf() {
			None
		} else {
			self.children[pos].get(cmp, key)
		}
	}

	fn get_mut(&mut self, cmp: &Comparator<K>, key: &K) -> Option<&mut V> {
		let (pos, found) = self.lower_bound(cmp, key);
		if found {
			Some(&mut self.values[pos])
		} else if self.is_leaf() {
			None
		} else {
			self.children[pos].get_mut(cmp, key)
		}
	}

	fn for_each<F>(&self, visit: &mut F)
	where
		F: FnMut(&K, &V),
	{
		for (pos, (key, value)) in self.keys.iter().zip(&self.values).enumerate() {
			if let Some(child) = self.children.get(pos) {
				child.for_each(visit);
			}
			visit(key, value);
		}
		if let Some(last) = self.children.get(self.keys.len()) {
			last.for_each(visit);
		}
	}

	/// Appends the entries of `[from, to)` in order, breaking out as soon as a
	/// key at or past `to` is reached.
	fn collect_range(
		&self,
		cmp: &Comparator<K>,
		from: &K,
		to: &K,
		out: &mut Vec<(K, V)>,
	) -> ControlFlow<()>
	where
		K: Clone,
		V: Clone,
	{
		// Children left of the lower bound hold only keys below `from`.
		let (start, _) = self.lower_bound(cmp, from);
		for pos in start..self.keys.len() {
			if let Some(child) = self.children.get(pos) {
				child.collect_range(cmp, from, to, out)?;
			}
			if cmp(&self.keys[pos], to) != Ordering::Less {
				return ControlFlow::Break(());
			}
			out.push((self.keys[pos].clone(), self.values[pos].clone()));
		}
		if let Some(last) = self.children.get(self.keys.len()) {
			last.collect_range(cmp, from, to, out)?;
		}
		ControlFlow::Continue(())
	}

	// -----------------------------------------------------------------------
	// Insertion
	// -----------------------------------------------------------------------

	/// Splits the full child at `pos` around its median key, which moves up into
	/// this node at `pos`. The upper half becomes the new child at `pos + 1`.
	fn split_child(&mut self, pos: usize, t: usize) {
		trace!(pos, degree = t, "splitting child");
		let child = &mut self.children[pos];
		let right = Node {
			keys: child.keys.drain(t..).collect(),
			values: child.values.drain(t..).collect(),
			children: if child.is_leaf() {
				SmallVec::new()
			} else {
				child.children.drain(t..).collect()
			},
		};
		let median_key = child.keys.pop().expect("a full node has a median key");
		let median_value = child.values.pop().expect("a full node has a median value");

		self.keys.insert(pos, median_key);
		self.values.insert(pos, median_value);
		self.children.insert(pos + 1, Box::new(right));
	}

	/// Inserts into the subtree rooted at this node, which must not be full.
	fn insert_non_full(&mut self, cmp: &Comparator<K>, t: usize, key: K, value: V) -> Option<V> {
		let (mut pos, found) = self.lower_bound(cmp, &key);
		if found {
			return Some(mem::replace(&mut self.values[pos], value));
		}
		if self.is_leaf() {
			self.keys.insert(pos, key);
			self.values.insert(pos, value);
			return None;
		}

		if self.children[pos].is_full(t) {
			self.split_child(pos, t);
			// The promoted median may be the key itself, or send it right.
			match cmp(&key, &self.keys[pos]) {
				Ordering::Equal => return Some(mem::replace(&mut self.values[pos], value)),
				Ordering::Greater => pos += 1,
				Ordering::Less => {}
			}
		}
		self.children[pos].insert_non_full(cmp, t, key, value)
	}

	// -----------------------------------------------------------------------
	// Deletion
	// -----------------------------------------------------------------------

	/// Deletes `key` from the subtree rooted at this node. Unless this node is
	/// the root it holds at least `t` keys on entry.
	fn remove(&mut self, cmp: &Comparator<K>, t: usize, key: &K) -> Option<V> {
		let (pos, found) = self.lower_bound(cmp, key);

		if found {
			if self.is_leaf() {
				self.keys.remove(pos);
				return Some(self.values.remove(pos));
			}
			return self.remove_from_internal(cmp, t, pos, key);
		}

		if self.is_leaf() {
			return None;
		}
		let pos = if self.children[pos].keys.len() < t {
			self.fill_child(pos, t)
		} else {
			pos
		};
		self.children[pos].remove(cmp, t, key)
	}

	/// Deletes `keys[pos]` of this internal node.
	fn remove_from_internal(&mut self, cmp: &Comparator<K>, t: usize, pos: usize, key: &K) -> Option<V> {
		if self.children[pos].keys.len() >= t {
			let (k, v) = self.children[pos].pop_max(t);
			self.keys[pos] = k;
			return Some(mem::replace(&mut self.values[pos], v));
		}
		if self.children[pos + 1].keys.len() >= t {
			let (k, v) = self.children[pos + 1].pop_min(t);
			self.keys[pos] = k;
			return Some(mem::replace(&mut self.values[pos], v));
		}
		// Both neighbours are minimal: fold the key down into their merge.
		self.merge_children(pos);
		self.children[pos].remove(cmp, t, key)
	}

	/// Removes and returns the largest entry of this subtree (the in-order
	/// predecessor of the parent key to its right).
	fn pop_max(&mut self, t: usize) -> (K, V) {
		if self.is_leaf() {
			let key = self.keys.pop().expect("predecessor leaf is not empty");
			let value = self.values.pop().expect("predecessor leaf is not empty");
			return (key, value);
		}
		let mut pos = self.keys.len();
		if self.children[pos].keys.len() < t {
			pos = self.fill_child(pos, t);
		}
		self.children[pos].pop_max(t)
	}

	/// Removes and returns the smallest entry of this subtree.
	fn pop_min(&mut self, t: usize) -> (K, V) {
		if self.is_leaf() {
			return (self.keys.remove(0), self.values.remove(0));
		}
		let pos = if self.children[0].keys.len() < t {
			self.fill_child(0, t)
		} else {
			0
		};
		self.children[pos].pop_min(t)
	}

	/// Ensures the child at `pos` has at least `t` keys. Returns the position of
	/// the child that now covers its key range, which moves left by one when it
	/// is merged into its left sibling.
	fn fill_child(&mut self, pos: usize, t: usize) -> usize {
		let last = self.keys.len();
		if pos > 0 && self.children[pos - 1].keys.len() >= t {
			self.borrow_from_left(pos);
			pos
		} else if pos < last && self.children[pos + 1].keys.len() >= t {
			self.borrow_from_right(pos);
			pos
		} else if pos < last {
			self.merge_children(pos);
			pos
		} else {
			self.merge_children(pos - 1);
			pos - 1
		}
	}

	/// Moves the separator `keys[pos - 1]` down to the front of child `pos` and
	/// the left sibling's last key up to replace it.
	fn borrow_from_left(&mut self, pos: usize) {
		trace!(pos, "borrowing from left sibling");
		let (head, tail) = self.children.split_at_mut(pos);
		let left = &mut head[pos - 1];
		let child = &mut tail[0];

		let key = left.keys.pop().expect("left sibling has a spare key");
		let value = left.values.pop().expect("left sibling has a spare value");
		child.keys.insert(0, mem::replace(&mut self.keys[pos - 1], key));
		child.values.insert(0, mem::replace(&mut self.values[pos - 1], value));
		if let Some(grandchild) = left.children.pop() {
			child.children.insert(0, grandchild);
		}
	}

	/// Moves the separator `keys[pos]` down to the end of child `pos` and the
	/// right sibling's first key up to replace it.
	fn borrow_from_right(&mut self, pos: usize) {
		trace!(pos, "borrowing from right sibling");
		let (head, tail) = self.children.split_at_mut(pos + 1);
		let child = &mut head[pos];
		let right = &mut tail[0];

		let key = right.keys.remove(0);
		let value = right.values.remove(0);
		child.keys.push(mem::replace(&mut self.keys[pos], key));
		child.values.push(mem::replace(&mut self.values[pos], value));
		if !right.is_leaf() {
			child.children.push(right.children.remove(0));
		}
	}

	/// Merges child `pos + 1` and the separator `keys[pos]` into child `pos`.
	fn merge_children(&mut self, pos: usize) {
		trace!(pos, "merging children");
		let right = self.children.remove(pos + 1);
		let key = self.keys.remove(pos);
		let value = self.values.remove(pos);

		let Node {
			keys,
			values,
			children,
		} = *right;
		let left = &mut self.children[pos];
		left.keys.push(key);
		left.values.push(value);
		left.keys.extend(keys);
		left.values.extend(values);
		left.children.extend(children);
	}
}

// ===========================================================================
// Invariant Validation
// ===========================================================================

impl<K: fmt::Debug, V> MultiTree<K, V> {
	/// Validates every structural invariant, panicking with diagnostics on the
	/// first violation. Intended for tests.
	///
	/// # Invariants Checked
	///
	/// 1. Occupancy: non-root nodes hold `[t-1, 2t-1]` keys, the root at most `2t-1`
	/// 2. Fan-out: internal nodes have one more child than keys
	/// 3. Depth: all leaves are at the same depth
	/// 4. Ordering: keys ascend within nodes and respect the parent separators
	/// 5. Length: `len()` matches the number of stored keys
	#[doc(hidden)]
	pub fn assert_invariants(&self) {
		let core = self.latch.shared();
		let mut leaf_depth = None;
		let count = self.validate_node(&core.root, true, 0, &mut leaf_depth, None, None);
		assert_eq!(count, core.len, "stored keys {} != len {}", count, core.len);
	}

	fn validate_node(
		&self,
		node: &Node<K, V>,
		is_root: bool,
		depth: usize,
		leaf_depth: &mut Option<usize>,
		lower: Option<&K>,
		upper: Option<&K>,
	) -> usize {
		let t = self.degree;
		let cmp = &self.comparator;
		let len = node.keys.len();

		// Invariant 1: Occupancy
		assert!(len <= 2 * t - 1, "node {:?} at depth {} overfull (t={})", node.keys, depth, t);
		if !is_root {
			assert!(len >= t - 1, "node {:?} at depth {} underfull (t={})", node.keys, depth, t);
		}
		assert_eq!(len, node.values.len(), "node {:?} keys/values length mismatch", node.keys);

		// Invariant 4: Ordering
		for pair in node.keys.windows(2) {
			assert_eq!(cmp(&pair[0], &pair[1]), Ordering::Less, "keys not sorted: {:?}", node.keys);
		}
		if let (Some(lower), Some(first)) = (lower, node.keys.first()) {
			assert_eq!(cmp(lower, first), Ordering::Less, "key {:?} not above separator {:?}", first, lower);
		}
		if let (Some(upper), Some(last)) = (upper, node.keys.last()) {
			assert_eq!(cmp(last, upper), Ordering::Less, "key {:?} not below separator {:?}", last, upper);
		}

		if node.is_leaf() {
			// Invariant 3: Depth
			match *leaf_depth {
				None => *leaf_depth = Some(depth),
				Some(expected) => {
					assert_eq!(depth, expected, "leaf {:?} at depth {}, expected {}", node.keys, depth, expected)
				}
			}
			return len;
		}

		// Invariant 2: Fan-out
		assert_eq!(node.children.len(), len + 1, "internal node {:?} has {} children", node.keys, node.children.len());
		if is_root {
			assert!(len >= 1, "internal root has no keys");
		}

		let mut count = len;
		for (pos, child) in node.children.iter().enumerate() {
			let child_lower = if pos == 0 {
				lower
			} else {
				Some(&node.keys[pos - 1])
			};
			let child_upper = node.keys.get(pos).or(upper);
			count += self.validate_node(child, false, depth + 1, leaf_depth, child_lower, child_upper);
		}
		count
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn int_tree(t: usize) -> MultiTree<i64, i64> {
		MultiTree::new(t, compare::integers()).unwrap()
	}

	/// Keys of the root followed by each of its children's keys.
	fn shape(tree: &MultiTree<i64, i64>) -> (Vec<i64>, Vec<Vec<i64>>) {
		let core = tree.latch.shared();
		let root = core.root.keys.to_vec();
		let children = core.root.children.iter().map(|c| c.keys.to_vec()).collect();
		(root, children)
	}

	// -----------------------------------------------------------------------
	// Construction Tests
	// -----------------------------------------------------------------------

	#[test]
	fn degree_below_two_is_rejected() {
		assert!(matches!(MultiTree::<i64, ()>::new(1, compare::integers()), Err(Error::InvalidDegree(1))));
		assert!(matches!(MultiTree::<i64, ()>::new(0, compare::integers()), Err(Error::InvalidDegree(0))));
	}

	#[test]
	fn oversized_degree_is_rejected() {
		assert!(matches!(
			MultiTree::<i64, ()>::new(usize::MAX, compare::integers()),
			Err(Error::InvalidDegree(usize::MAX))
		));
		let half = usize::MAX / 2 + 1;
		assert!(matches!(MultiTree::<i64, ()>::new(half, compare::integers()), Err(Error::InvalidDegree(d)) if d == half));
	}

	#[test]
	fn largest_degree_accepts_entries() {
		let tree = int_tree(crate::MAX_DEGREE);
		for k in 0..100 {
			tree.put(k, k * 10);
		}
		assert_eq!(tree.len(), 100);
		assert_eq!(tree.height(), 1);
		assert_eq!(tree.get(&42), Ok(420));
		assert_eq!(tree.remove(&0), Ok(0));
		tree.assert_invariants();
	}

	#[test]
	fn missing_comparator_is_rejected() {
		let config: TreeConfig<i64> = TreeConfig::new().with_degree(3);
		assert!(matches!(MultiTree::<i64, ()>::with_config(config), Err(Error::InvalidComparator)));
	}

	// -----------------------------------------------------------------------
	// Split Tests
	// -----------------------------------------------------------------------

	#[test]
	fn full_root_splits_before_descent() {
		let tree = int_tree(2);
		for k in [1, 2, 3] {
			tree.put(k, k);
		}
		assert_eq!(tree.height(), 1);
		assert_eq!(shape(&tree), (vec![1, 2, 3], vec![]));

		tree.put(4, 4);
		tree.assert_invariants();
		assert_eq!(tree.height(), 2);
		assert_eq!(shape(&tree), (vec![2], vec![vec![1], vec![3, 4]]));
	}

	#[test]
	fn updating_a_promoted_median_keeps_len() {
		let tree = int_tree(2);
		for k in [10, 20, 30, 5, 15] {
			tree.put(k, k);
		}
		// Re-putting 10 splits the full leaf [5, 10, 15] and meets 10 as the
		// promoted median.
		for k in [10, 20, 30, 5, 15] {
			assert_eq!(tree.put(k, -k), Some(k));
			tree.assert_invariants();
		}
		assert_eq!(tree.len(), 5);
		assert_eq!(tree.values(), vec![-5, -10, -15, -20, -30]);
	}

	#[test]
	fn sequential_inserts_keep_leaves_level() {
		for t in 2..6 {
			let tree = int_tree(t);
			for k in 0..500 {
				tree.put(k, k);
				tree.assert_invariants();
			}
			assert_eq!(tree.len(), 500);
		}
	}

	// -----------------------------------------------------------------------
	// Deletion Tests
	// -----------------------------------------------------------------------

	#[test]
	fn delete_from_leaf() {
		let tree = int_tree(2);
		for k in [1, 2, 3] {
			tree.put(k, k);
		}
		assert_eq!(tree.remove(&2), Ok(2));
		tree.assert_invariants();
		assert_eq!(shape(&tree), (vec![1, 3], vec![]));
	}

	#[test]
	fn delete_internal_key_uses_predecessor() {
		let tree = int_tree(2);
		for k in [1, 2, 3, 4, 0] {
			tree.put(k, k);
		}
		// Root [2], children [0, 1] and [3, 4]: the left child can spare a key.
		assert_eq!(shape(&tree), (vec![2], vec![vec![0, 1], vec![3, 4]]));
		assert_eq!(tree.remove(&2), Ok(2));
		tree.assert_invariants();
		assert_eq!(shape(&tree), (vec![1], vec![vec![0], vec![3, 4]]));
	}

	#[test]
	fn delete_internal_key_uses_successor() {
		let tree = int_tree(2);
		for k in [1, 2, 3, 4] {
			tree.put(k, k);
		}
		// Root [2], children [1] and [3, 4]: only the right child can spare a key.
		assert_eq!(tree.remove(&2), Ok(2));
		tree.assert_invariants();
		assert_eq!(shape(&tree), (vec![3], vec![vec![1], vec![4]]));
	}

	#[test]
	fn delete_internal_key_merges_minimal_children() {
		let tree = int_tree(2);
		for k in [1, 2, 3, 4] {
			tree.put(k, k);
		}
		tree.remove(&4).unwrap();
		// Root [2], children [1] and [3]: both minimal, so they merge and the root collapses.
		assert_eq!(shape(&tree), (vec![2], vec![vec![1], vec![3]]));
		assert_eq!(tree.remove(&2), Ok(2));
		tree.assert_invariants();
		assert_eq!(shape(&tree), (vec![1, 3], vec![]));
		assert_eq!(tree.height(), 1);
	}

	#[test]
	fn descent_borrows_from_left_sibling() {
		let tree = int_tree(2);
		for k in [1, 2, 3, 4, 0] {
			tree.put(k, k);
		}
		tree.remove(&4).unwrap();
		// Root [2], children [0, 1] and [3]: deleting 3 borrows through the root.
		assert_eq!(shape(&tree), (vec![2], vec![vec![0, 1], vec![3]]));
		assert_eq!(tree.remove(&3), Ok(3));
		tree.assert_invariants();
		assert_eq!(shape(&tree), (vec![1], vec![vec![0], vec![2]]));
	}

	#[test]
	fn descent_borrows_from_right_sibling() {
		let tree = int_tree(2);
		for k in [1, 2, 3, 4] {
			tree.put(k, k);
		}
		// Root [2], children [1] and [3, 4]: deleting 1 borrows 2 down and 3 up.
		assert_eq!(tree.remove(&1), Ok(1));
		tree.assert_invariants();
		assert_eq!(shape(&tree), (vec![3], vec![vec![2], vec![4]]));
	}

	#[test]
	fn delete_missing_key_does_not_reshape() {
		let tree = int_tree(2);
		for k in [1, 2, 3, 4] {
			tree.put(k, k);
		}
		tree.remove(&4).unwrap();
		let before = shape(&tree);
		assert_eq!(tree.remove(&10), Err(Error::KeyNotFound));
		assert_eq!(shape(&tree), before);
		assert_eq!(tree.len(), 3);
	}

	#[test]
	fn delete_everything_in_every_order() {
		for t in 2..5 {
			let tree = int_tree(t);
			let keys: Vec<i64> = (0..300).map(|i| (i * 37) % 300).collect();
			for &k in &keys {
				tree.put(k, k);
			}
			for &k in keys.iter().rev() {
				assert_eq!(tree.remove(&k), Ok(k));
				tree.assert_invariants();
			}
			assert!(tree.is_empty());
			assert_eq!(tree.height(), 1);
		}
	}

	// -----------------------------------------------------------------------
	// Range Tests
	// -----------------------------------------------------------------------

	#[test]
	fn range_spans_internal_and_leaf_keys() {
		let tree = int_tree(2);
		for k in 0..50 {
			tree.put(k * 2, k);
		}
		let keys: Vec<i64> = tree.find_range(&13, &31).unwrap().into_iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec![14, 16, 18, 20, 22, 24, 26, 28, 30]);
		assert!(tree.find_range(&200, &300).unwrap().is_empty());
		assert_eq!(tree.find_range(&5, &5), Err(Error::InvalidRange));
	}
}
