//! Index-addressed node storage.
//!
//! The binary tree keeps its nodes in an [`Arena`] and links them through
//! [`NodeId`]s instead of pointers. A node's children are the ids it stores in
//! its `left`/`right` fields; its parent id is a plain back-reference that
//! carries no ownership, so there is no reference cycle to manage.
//!
//! Freed slots go on a free list and are reused by later allocations.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Handle to a slot of an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
	#[inline]
	fn from_index(index: usize) -> Self {
		let raw = u32::try_from(index).expect("arena exceeded u32::MAX slots");
		NodeId(raw)
	}

	#[inline]
	fn index(self) -> usize {
		self.0 as usize
	}
}

impl fmt::Debug for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

pub(crate) struct Arena<T> {
	slots: Vec<Option<T>>,
	free: Vec<NodeId>,
}

impl<T> Arena<T> {
	pub(crate) const fn new() -> Self {
		Arena {
			slots: Vec::new(),
			free: Vec::new(),
		}
	}

	/// Number of live elements.
	pub(crate) fn len(&self) -> usize {
		self.slots.len() - self.free.len()
	}

	pub(crate) fn alloc(&mut self, element: T) -> NodeId {
		if let Some(id) = self.free.pop() {
			self.slots[id.index()] = Some(element);
			id
		} else {
			self.slots.push(Some(element));
			NodeId::from_index(self.slots.len() - 1)
		}
	}

	/// Removes the element at `id`, returning it and recycling the slot.
	pub(crate) fn take(&mut self, id: NodeId) -> T {
		let element = self.slots[id.index()].take().expect("arena slot already freed");
		self.free.push(id);
		element
	}

	pub(crate) fn clear(&mut self) {
		self.slots.clear();
		self.free.clear();
	}
}

impl<T> Index<NodeId> for Arena<T> {
	type Output = T;

	#[inline]
	fn index(&self, id: NodeId) -> &T {
		self.slots[id.index()].as_ref().expect("dangling node id")
	}
}

impl<T> IndexMut<NodeId> for Arena<T> {
	#[inline]
	fn index_mut(&mut self, id: NodeId) -> &mut T {
		self.slots[id.index()].as_mut().expect("dangling node id")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn freed_slots_are_reused() {
		let mut arena = Arena::new();
		let a = arena.alloc("a");
		let b = arena.alloc("b");
		assert_eq!(arena.len(), 2);

		assert_eq!(arena.take(a), "a");
		assert_eq!(arena.len(), 1);

		let c = arena.alloc("c");
		assert_eq!(c, a);
		assert_eq!(arena[c], "c");
		assert_eq!(arena[b], "b");
	}

	#[test]
	#[should_panic(expected = "dangling node id")]
	fn indexing_a_freed_slot_panics() {
		let mut arena = Arena::new();
		let a = arena.alloc(1u8);
		arena.take(a);
		let _ = arena[a];
	}

	#[derive(Clone, Debug)]
	enum Op {
		Alloc(u32),
		Set(usize, u32),
		Take(usize),
		Clear,
	}

	fn op() -> impl Strategy<Value = Op> {
		prop_oneof![
			10 => any::<u32>().prop_map(Op::Alloc),
			4 => (any::<usize>(), any::<u32>()).prop_map(|(i, v)| Op::Set(i, v)),
			5 => any::<usize>().prop_map(Op::Take),
			1 => Just(Op::Clear),
		]
	}

	proptest! {
		#[test]
		fn arena_behaves_like_a_list_of_live_values(ops in prop::collection::vec(op(), 0..200)) {
			let mut arena = Arena::new();
			let mut model: Vec<(NodeId, u32)> = Vec::new();

			for op in ops {
				match op {
					Op::Alloc(v) => model.push((arena.alloc(v), v)),
					Op::Set(which, v) if !model.is_empty() => {
						let i = which % model.len();
						arena[model[i].0] = v;
						model[i].1 = v;
					}
					Op::Take(which) if !model.is_empty() => {
						let i = which % model.len();
						let (id, v) = model.swap_remove(i);
						prop_assert_eq!(arena.take(id), v);
					}
					Op::Clear => {
						arena.clear();
						model.clear();
					}
					_ => {}
				}

				prop_assert_eq!(arena.len(), model.len());
				for &(id, v) in &model {
					prop_assert_eq!(arena[id], v);
				}
			}
		}
	}
}
