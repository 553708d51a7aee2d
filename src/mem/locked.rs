//! A [`BuddyAllocator`] behind a spinlock, for hosts that share one
//! allocator between multiple threads.

use super::{buddy::BuddyAllocator, dump::Dump, AllocStats, Config, Result};
use core::ptr::NonNull;
use spin::{Mutex, MutexGuard};

/// Buddy allocator that can be shared, every operation takes the lock
/// for its whole duration.
pub struct LockedAllocator(Mutex<BuddyAllocator>);

impl LockedAllocator {
    /// Create a new locked allocator with the given layout.
    pub fn new(config: Config) -> Self {
        Self(Mutex::new(BuddyAllocator::new(config)))
    }

    /// Reset the allocator, see [`BuddyAllocator::init`].
    pub fn init(&self) {
        self.0.lock().init()
    }

    /// Allocate a block of at least `size` bytes.
    pub fn alloc(&self, size: usize) -> Result<NonNull<u8>> {
        self.0.lock().alloc(size)
    }

    /// Free a block that was returned by [`Self::alloc`].
    pub fn free(&self, addr: NonNull<u8>) {
        self.0.lock().free(addr)
    }

    /// Return the free block count per order.
    pub fn dump(&self) -> Dump {
        self.0.lock().dump()
    }

    /// Return the statistics for this allocator.
    pub fn stats(&self) -> AllocStats {
        self.0.lock().stats()
    }

    /// Lock the allocator, to run multiple operations without
    /// releasing the lock in between.
    pub fn lock(&self) -> MutexGuard<'_, BuddyAllocator> {
        self.0.lock()
    }
}

impl Default for LockedAllocator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
