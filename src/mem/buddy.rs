//! Implementation of a Buddy Allocator that manages a single, fixed arena.
//!
//! The arena is carved into blocks whose size is a power of two. A request
//! is served by splitting the smallest free block that is large enough, and
//! a freed block is merged with its buddy for as long as the buddy is free too.

use super::{
    dump::Dump,
    order_for_size,
    page::{self, Page, PageFlags},
    size_for_order, AllocStats, Config, Error, LinkedList, Result,
};
use alloc::{boxed::Box, vec, vec::Vec};
use core::{cmp, ptr, ptr::NonNull};
use log::{debug, error, trace, warn};

/// The central structure that is responsible for allocating
/// memory using the buddy allocation algorithm.
pub struct BuddyAllocator {
    config: Config,
    /// Start of the arena, which is owned by this allocator
    /// and is `config.arena_size()` bytes long.
    arena: NonNull<u8>,
    /// One record for every page of the arena.
    pages: Vec<Page>,
    /// The free lists, where index `0` belongs to `config.min_order()`.
    orders: Vec<LinkedList>,
    stats: AllocStats,
}

// SAFETY
// The arena is owned by the allocator and never shared with another
// allocator, so it can be moved to another thread together with it.
unsafe impl Send for BuddyAllocator {}

impl BuddyAllocator {
    /// Create a new allocator that owns a freshly allocated arena,
    /// laid out according to `config`.
    ///
    /// The whole arena is available as a single free block afterwards.
    pub fn new(config: Config) -> Self {
        let arena = vec![0u8; config.arena_size()].into_boxed_slice();
        let arena = Box::into_raw(arena) as *mut u8;

        let mut this = Self {
            config,
            // SAFETY
            // `Box::into_raw` never returns a null pointer.
            arena: unsafe { NonNull::new_unchecked(arena) },
            pages: (0..config.page_count()).map(Page::new).collect(),
            orders: vec![LinkedList::EMPTY; config.order_count()],
            stats: AllocStats::with_name("Buddy Allocator"),
        };
        this.init();
        this
    }

    /// Reset this allocator, so the whole arena becomes one free block again.
    ///
    /// Every allocation that was handed out before is forgotten.
    pub fn init(&mut self) {
        self.pages.iter_mut().for_each(Page::reset);
        self.orders.iter_mut().for_each(|list| *list = LinkedList::EMPTY);

        let total = self.config.arena_size();
        self.stats = AllocStats {
            free: total,
            total,
            ..AllocStats::with_name("Buddy Allocator")
        };

        self.push_free(0, self.config.max_order());

        debug!(
            "Initialized arena of {} with {} pages",
            crate::unit::bytes(total),
            self.config.page_count()
        );
    }

    /// Returns the layout of the arena managed by this allocator.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Allocates a block that is large enough to hold `size` bytes.
    ///
    /// The returned block is `2^order` bytes long and aligned to its own size
    /// relative to the start of the arena, where `order` is the smallest
    /// order whose size is at least `size`.
    pub fn alloc(&mut self, size: usize) -> Result<NonNull<u8>> {
        let order = match order_for_size(size, &self.config) {
            Some(order) => order,
            None => {
                warn!("Requested {} bytes, which exceeds the arena", size);
                return Err(Error::OutOfRange);
            }
        };

        let offset = self.allocate_order(order)?;
        self.stats.requested += size;
        Ok(self.offset_to_addr(offset))
    }

    /// Allocates a block of exactly the given order and returns its
    /// offset from the start of the arena.
    ///
    /// Orders below the minimum order are rounded up to it.
    pub fn allocate(&mut self, order: u8) -> Result<usize> {
        if order > self.config.max_order() {
            return Err(Error::OutOfRange);
        }

        let order = cmp::max(order, self.config.min_order());
        let offset = self.allocate_order(order)?;
        self.stats.requested += size_for_order(order);
        Ok(offset)
    }

    fn allocate_order(&mut self, order: u8) -> Result<usize> {
        // find the first order that has a free block,
        // starting at the order we need
        let found = match (order..=self.config.max_order()).find(|&o| !self.free_list(o).is_empty())
        {
            Some(found) => found,
            None => {
                warn!("No free block available for order {}", order);
                return Err(Error::OutOfMemory);
            }
        };

        let slot = self.slot(found);
        let idx = self.orders[slot]
            .pop(&mut self.pages)
            .ok_or(Error::OutOfMemory)?;
        let offset = page::page_to_offset(idx, &self.config);

        // walk down the orders and split the block until it has the
        // requested order. the lower half is always kept, the upper half
        // is the buddy that goes back to the free list.
        //
        // +-- `offset` stays here
        // v
        // +---------------------------------+
        // |    buddy 1     |    buddy 2     |
        // +---------------------------------+
        //                  ^
        //                  +--- `buddy_of(offset, target)`
        for current in (order + 1..=found).rev() {
            let target = current - 1;
            let buddy = page::offset_to_page(page::buddy_of(offset, target), &self.config);

            self.pages[idx].make_head(target, false);
            self.push_free(buddy, target);
            self.stats.splits += 1;

            trace!("Split order {} block at {:#x}, buddy page {}", current, offset, buddy);
        }

        self.pages[idx].make_head(order, false);

        let size = size_for_order(order);
        self.stats.allocated += size;
        self.stats.free -= size;

        debug!("Allocated order {} block at {:#x}", order, offset);
        Ok(offset)
    }

    /// Frees the block that starts at `addr`.
    ///
    /// `addr` must be a pointer that was returned by [`Self::alloc`] and
    /// not freed since. The order of the block is recovered from the page
    /// table.
    ///
    /// # Panics
    ///
    /// Panics if the page at `addr` does not record a valid order or is
    /// already free, because the allocator can not continue without
    /// corrupting its free lists.
    pub fn free(&mut self, addr: NonNull<u8>) {
        let offset = self.offset_of(addr);
        self.deallocate(offset);
    }

    /// Frees the block that starts `offset` bytes into the arena.
    ///
    /// See [`Self::free`] for the requirements and panics.
    pub fn deallocate(&mut self, offset: usize) {
        let mut idx = page::offset_to_page(offset, &self.config);
        let page = &self.pages[idx];

        let mut order = match page.order() {
            Some(order) if self.config.contains_order(order) => order,
            order => {
                error!("Page {} records invalid order {:?}", idx, order);
                panic!(
                    "corrupted page table: page {} records order {:?}, expected {}..={}",
                    idx,
                    order,
                    self.config.min_order(),
                    self.config.max_order()
                );
            }
        };

        if page.flags().contains(PageFlags::FREE) {
            error!("Page {} is freed twice", idx);
            panic!("double free of order {} block at page {}", order, idx);
        }

        let size = size_for_order(order);
        self.stats.allocated -= size;
        self.stats.free += size;

        // try to merge the block with its buddy for as long as
        // the buddy is free and has the same order
        let mut offset = offset;
        while order < self.config.max_order() {
            let buddy_offset = page::buddy_of(offset, order);
            let buddy = page::offset_to_page(buddy_offset, &self.config);

            if !self.pages[buddy].is_free_head(order) {
                break;
            }

            let slot = self.slot(order);
            debug_assert!(
                self.orders[slot].contains(&self.pages, buddy),
                "free page {} is missing from its free list",
                buddy
            );
            self.orders[slot].remove(&mut self.pages, buddy);

            // the merged block is headed by the lower buddy, the
            // upper one is just an ordinary page now.
            let (lower, upper) = (cmp::min(idx, buddy), cmp::max(idx, buddy));
            self.pages[upper].reset();

            trace!("Merged order {} buddies at pages {} and {}", order, lower, upper);

            idx = lower;
            offset = cmp::min(offset, buddy_offset);
            order += 1;
            self.stats.merges += 1;
        }

        self.push_free(idx, order);
        debug!("Freed block, now order {} at {:#x}", order, offset);
    }

    /// Returns a snapshot of how many free blocks exist for every order.
    pub fn dump(&self) -> Dump {
        let counts = self.orders.iter().map(LinkedList::len).collect();
        Dump::new(self.config.min_order(), counts)
    }

    /// Returns an iterator over the head pages of all free blocks
    /// with the given order.
    ///
    /// # Panics
    ///
    /// Panics if `order` is not a valid order for this allocator.
    pub fn free_blocks(&self, order: u8) -> impl Iterator<Item = usize> + '_ {
        assert!(self.config.contains_order(order), "invalid order {}", order);
        self.free_list(order).iter(&self.pages)
    }

    /// Returns the page table of this allocator.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Return a copy of the statistics for this allocator.
    pub fn stats(&self) -> AllocStats {
        self.stats.clone()
    }

    /// Returns the pointer to the first byte of the arena.
    pub fn base(&self) -> NonNull<u8> {
        self.arena
    }

    /// Converts a page index into the address of that page.
    pub fn page_to_addr(&self, page: usize) -> NonNull<u8> {
        self.offset_to_addr(page::page_to_offset(page, &self.config))
    }

    /// Converts an address inside the arena into the index of its page.
    pub fn addr_to_page(&self, addr: NonNull<u8>) -> usize {
        page::offset_to_page(self.offset_of(addr), &self.config)
    }

    /// Returns the offset of `addr` from the start of the arena.
    pub fn offset_of(&self, addr: NonNull<u8>) -> usize {
        (addr.as_ptr() as usize).wrapping_sub(self.arena.as_ptr() as usize)
    }

    fn offset_to_addr(&self, offset: usize) -> NonNull<u8> {
        assert!(offset < self.config.arena_size(), "offset {:#x} is outside the arena", offset);

        // SAFETY
        // The offset is inside the arena, which is never empty and
        // starts at a non-null address.
        unsafe { NonNull::new_unchecked(self.arena.as_ptr().add(offset)) }
    }

    fn push_free(&mut self, idx: usize, order: u8) {
        self.pages[idx].make_head(order, true);
        let slot = self.slot(order);
        self.orders[slot].push(&mut self.pages, idx);
    }

    fn free_list(&self, order: u8) -> &LinkedList {
        &self.orders[self.slot(order)]
    }

    fn slot(&self, order: u8) -> usize {
        (order - self.config.min_order()) as usize
    }
}

impl Default for BuddyAllocator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Drop for BuddyAllocator {
    fn drop(&mut self) {
        let arena = ptr::slice_from_raw_parts_mut(self.arena.as_ptr(), self.config.arena_size());

        // SAFETY
        // The pointer was created by `Box::into_raw` in `new`
        // with exactly this length.
        drop(unsafe { Box::from_raw(arena) });
    }
}
