//! A reader-writer latch that counts modifications.
//!
//! Each tree keeps its whole structure behind one [`VersionLatch`]. The latch
//! offers three access modes:
//!
//! - **Exclusive**: blocking write access. Acquiring it increments the version,
//!   so every mutating call advances the version exactly once.
//! - **Shared**: blocking read access. Any number of shared guards may coexist.
//! - **Optimistic**: no lock at all, only a captured version. An optimistic
//!   guard cannot read the data; it must first be upgraded with
//!   [`OptimisticGuard::to_shared`], which fails with
//!   [`error::Error::ConcurrentModification`] if any exclusive access happened
//!   since the version was captured.
//!
//! The optimistic mode is what tree iterators hold between calls: they keep no
//! lock while idle, and detect (rather than prevent) writers that ran in
//! between.

use crate::error;
use crate::sync::{AtomicUsize, Ordering, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A reader-writer lock whose version advances on every exclusive acquisition.
pub struct VersionLatch<T> {
	version: AtomicUsize,
	lock: RwLock<T>,
}

impl<T> VersionLatch<T> {
	/// Creates a new, unlocked latch at version 0.
	#[inline]
	pub fn new(data: T) -> VersionLatch<T> {
		VersionLatch {
			version: AtomicUsize::new(0),
			lock: RwLock::new(data),
		}
	}

	/// Locks this latch with exclusive write access, blocking the thread until it can be
	/// acquired. The version is incremented before the guard is returned.
	///
	/// Returns an RAII guard which will release the exclusive access when dropped
	#[inline]
	pub fn exclusive(&self) -> ExclusiveGuard<'_, T> {
		let guard = self.lock.write();
		// Writers are serialized by the lock, so a plain load/store pair is enough.
		let version = self.version.load(Ordering::Relaxed) + 1;
		self.version.store(version, Ordering::Release);
		ExclusiveGuard {
			guard,
			version,
		}
	}

	/// Locks this latch with shared read access, blocking the thread until it can be
	/// acquired.
	///
	/// Returns an RAII guard which will release the shared access when dropped
	#[inline]
	pub fn shared(&self) -> SharedGuard<'_, T> {
		let guard = self.lock.read();
		let version = self.version.load(Ordering::Acquire);
		SharedGuard {
			guard,
			version,
		}
	}

	/// Captures the current version without locking.
	///
	/// The returned guard grants no access to the data until it is upgraded with
	/// [`OptimisticGuard::to_shared`].
	#[inline]
	pub fn optimistic(&self) -> OptimisticGuard<'_, T> {
		OptimisticGuard {
			latch: self,
			version: self.version.load(Ordering::Acquire),
		}
	}

	/// Returns the current version.
	///
	/// The value may be stale by the time it is used if writers are active.
	#[inline]
	pub fn version(&self) -> usize {
		self.version.load(Ordering::Acquire)
	}
}

/// A captured version of a [`VersionLatch`], holding no lock.
pub struct OptimisticGuard<'a, T> {
	latch: &'a VersionLatch<T>,
	version: usize,
}

impl<'a, T> OptimisticGuard<'a, T> {
	/// Validates that no exclusive access happened since this guard was created.
	///
	/// If validation fails it returns [`error::Error::ConcurrentModification`].
	#[inline]
	pub fn recheck(&self) -> error::Result<()> {
		if self.version != self.latch.version.load(Ordering::Acquire) {
			return Err(error::Error::ConcurrentModification);
		}
		Ok(())
	}

	/// Acquires shared access and validates the captured version under it.
	///
	/// The guard is not consumed, so it can be upgraded again later. If a writer ran
	/// since the version was captured it returns
	/// [`error::Error::ConcurrentModification`] and no lock is held.
	#[inline]
	pub fn to_shared(&self) -> error::Result<SharedGuard<'a, T>> {
		let guard = self.latch.shared();
		if guard.version != self.version {
			return Err(error::Error::ConcurrentModification);
		}
		Ok(guard)
	}

	/// The version captured by this guard.
	#[inline]
	pub fn version(&self) -> usize {
		self.version
	}
}

/// RAII structure used to release the exclusive write access of a latch when dropped.
pub struct ExclusiveGuard<'a, T> {
	guard: RwLockWriteGuard<'a, T>,
	version: usize,
}

impl<'a, T> ExclusiveGuard<'a, T> {
	/// The version this write is published under.
	#[inline]
	pub fn version(&self) -> usize {
		self.version
	}
}

impl<'a, T> std::ops::Deref for ExclusiveGuard<'a, T> {
	type Target = T;

	#[inline]
	fn deref(&self) -> &T {
		&self.guard
	}
}

impl<'a, T> std::ops::DerefMut for ExclusiveGuard<'a, T> {
	#[inline]
	fn deref_mut(&mut self) -> &mut T {
		&mut self.guard
	}
}

/// RAII structure used to release the shared read access of a latch when dropped.
pub struct SharedGuard<'a, T> {
	guard: RwLockReadGuard<'a, T>,
	version: usize,
}

impl<'a, T> SharedGuard<'a, T> {
	/// The version observed while holding the shared lock.
	#[inline]
	pub fn version(&self) -> usize {
		self.version
	}
}

impl<'a, T> std::ops::Deref for SharedGuard<'a, T> {
	type Target = T;

	#[inline]
	fn deref(&self) -> &T {
		&self.guard
	}
}
