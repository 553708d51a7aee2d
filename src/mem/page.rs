//! Per-page metadata and the math to move between pages and arena offsets.

use super::{linked_list::Link, Config};

bitflags::bitflags! {
    /// State bits of a single page record.
    pub struct PageFlags: u8 {
        /// The page is the first page of a block, free or allocated.
        const HEAD = 1 << 0;
        /// The block headed by this page sits inside a free list.
        const FREE = 1 << 1;
    }
}

/// Metadata for a single page of the arena.
///
/// Only the head page of a block carries a meaningful `order`, every
/// other page inside the block is left untouched until the block
/// is split or merged.
#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    pub(crate) order: Option<u8>,
    pub(crate) flags: PageFlags,
    pub(crate) link: Link,
}

impl Page {
    /// Create a fresh record for the page at `index`, without any order.
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            order: None,
            flags: PageFlags::empty(),
            link: Link::UNLINKED,
        }
    }

    /// The index of this page inside the page table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The order of the block this page is the head of.
    ///
    /// Returns `None` if this page is not a block head.
    pub fn order(&self) -> Option<u8> {
        self.order
    }

    /// The state bits of this page.
    pub fn flags(&self) -> PageFlags {
        self.flags
    }

    /// Returns whether this page heads a free block of exactly `order`.
    pub fn is_free_head(&self, order: u8) -> bool {
        self.flags.contains(PageFlags::HEAD | PageFlags::FREE) && self.order == Some(order)
    }

    /// Mark this page as the head of a block with the given order.
    pub(crate) fn make_head(&mut self, order: u8, free: bool) {
        self.order = Some(order);
        self.flags = PageFlags::HEAD;
        self.flags.set(PageFlags::FREE, free);
    }

    /// Forget everything this page knew about the block it was part of.
    pub(crate) fn reset(&mut self) {
        self.order = None;
        self.flags = PageFlags::empty();
        self.link = Link::UNLINKED;
    }
}

/// Converts a page index into the byte offset from the start of the arena.
pub fn page_to_offset(page: usize, config: &Config) -> usize {
    page << config.min_order()
}

/// Converts a byte offset from the start of the arena into a page index.
///
/// The offset must be page aligned and inside the arena.
pub fn offset_to_page(offset: usize, config: &Config) -> usize {
    debug_assert_eq!(offset & (config.page_size() - 1), 0, "offset is not page aligned");
    offset >> config.min_order()
}

/// Calculates the offset of the buddy for the block at `offset`
/// with the given `order`.
///
/// The addresses of two buddies only differ in the bit that
/// represents the size of the order.
pub fn buddy_of(offset: usize, order: u8) -> usize {
    offset ^ super::size_for_order(order)
}
