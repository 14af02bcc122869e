//! # Ordtree: Comparator-Ordered Concurrent Maps
//!
//! This crate provides two in-memory ordered maps whose key order is defined by
//! a caller-supplied [`Comparator`] rather than by an `Ord` impl:
//!
//! - [`AvlTree`]: a height-balanced binary search tree. Nodes live in an arena
//!   and link to their parent, which lets [`AvlTree::iter`] walk the tree without
//!   a stack and without holding a lock between steps.
//! - [`MultiTree`]: a B-tree of configurable degree `t`. Nodes hold up to
//!   `2t - 1` keys, so the tree stays shallow and cache-friendly.
//!
//! Both implement the [`OrderedMap`] contract: point reads and writes, ordered
//! traversal, half-open range queries, min/max, and the atomic compound
//! operations [`put_if_absent`](OrderedMap::put_if_absent),
//! [`compute_if_present`](OrderedMap::compute_if_present) and
//! [`batch_insert`](OrderedMap::batch_insert).
//!
//! ## Concurrency
//!
//! Each tree sits behind a single [`latch::VersionLatch`]: a reader-writer lock
//! paired with a modification counter.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!   get / range ───► │  shared (read lock)          │
//!                    │                              │
//!   put / remove ──► │  exclusive (write lock)      │──► version += 1
//!                    │                              │
//!   iterator ──────► │  optimistic (version only)   │──► revalidated per step
//!                    └──────────────┬───────────────┘
//!                                   ▼
//!                          AVL core  /  B-tree core
//! ```
//!
//! Readers run in parallel; writers are serialized. Every mutating call
//! advances the version, so an [`Iter`] created before any write reports
//! [`Error::ConcurrentModification`] on its next step.
//!
//! ## Basic Usage
//!
//! ```
//! use ordtree::{compare, AvlTree, Error};
//!
//! let tree = AvlTree::new(compare::integers());
//! tree.put(20, "twenty");
//! tree.put(10, "ten");
//! tree.put(30, "thirty");
//!
//! assert_eq!(tree.get(&10), Ok("ten"));
//! assert_eq!(tree.find_range(&10, &30).unwrap(), vec![(10, "ten"), (20, "twenty")]);
//! assert_eq!(tree.remove(&99), Err(Error::KeyNotFound));
//! ```
//!
//! ## Thread Safety
//!
//! Every method takes `&self`. Share a tree across threads with
//! `Arc<AvlTree<K, V>>` or `Arc<MultiTree<K, V>>`. Reads return clones, so no
//! borrowed data escapes the lock.

pub mod compare;
pub mod config;
pub mod error;
pub mod iter;
pub mod latch;

mod arena;
mod avl;
mod btree;
mod map;
mod sync;

pub use avl::AvlTree;
pub use btree::MultiTree;
pub use compare::Comparator;
pub use config::{TreeConfig, DEFAULT_DEGREE, MAX_DEGREE, MIN_DEGREE};
pub use error::{Error, Result};
pub use iter::Iter;
pub use map::OrderedMap;
