//! Memory Allocation APIs.

pub mod buddy;
pub mod dump;
pub mod linked_list;
pub mod locked;
pub mod page;

pub use linked_list::LinkedList;

use crate::unit;
use core::fmt;
use displaydoc_lite::displaydoc;

/// The default minimum order, which makes a single page 4KiB.
pub const MIN_ORDER: u8 = 12;

/// The default maximum order (inclusive), which makes the arena 1MiB.
pub const MAX_ORDER: u8 = 20;

/// Result for every memory allocation operation.
pub type Result<T, E = Error> = core::result::Result<T, E>;

displaydoc! {
    /// Any error that can happen while creating an allocator or allocating memory.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Error {
        /// tried to allocate more bytes than the whole arena can hold.
        OutOfRange,
        /// tried to allocate, but there was no free block large enough.
        OutOfMemory,
        /// the minimum order must be smaller than the maximum order, and the arena must fit into memory.
        InvalidConfig,
    }
}

/// The orders that describe the layout of an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    min_order: u8,
    max_order: u8,
}

impl Config {
    /// Create a new configuration.
    ///
    /// `min_order` is the log2 of the page size and `max_order`
    /// the log2 of the arena size.
    pub const fn new(min_order: u8, max_order: u8) -> Result<Self> {
        if min_order >= max_order || max_order as u32 >= usize::BITS {
            return Err(Error::InvalidConfig);
        }

        Ok(Self {
            min_order,
            max_order,
        })
    }

    /// The smallest order a block can have.
    pub const fn min_order(&self) -> u8 {
        self.min_order
    }

    /// The largest order a block can have, which spans the whole arena.
    pub const fn max_order(&self) -> u8 {
        self.max_order
    }

    /// The size of a single page in bytes.
    pub const fn page_size(&self) -> usize {
        1 << self.min_order
    }

    /// The size of the whole arena in bytes.
    pub const fn arena_size(&self) -> usize {
        1 << self.max_order
    }

    /// The number of pages inside the arena.
    pub const fn page_count(&self) -> usize {
        1 << (self.max_order - self.min_order)
    }

    /// The number of distinct orders, and thus free lists.
    pub const fn order_count(&self) -> usize {
        (self.max_order - self.min_order) as usize + 1
    }

    /// Returns whether `order` is a valid block order for this layout.
    pub const fn contains_order(&self, order: u8) -> bool {
        order >= self.min_order && order <= self.max_order
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_order: MIN_ORDER,
            max_order: MAX_ORDER,
        }
    }
}

/// Calculates the size in bytes for the given order.
pub const fn size_for_order(order: u8) -> usize {
    1 << order
}

/// Calculates the first order where a block of `size` bytes would fit in.
///
/// A size that is exactly a power of two selects that order, it is never
/// rounded up to the next one. Returns `None` if `size` is larger than
/// the whole arena.
pub fn order_for_size(size: usize, config: &Config) -> Option<u8> {
    if size > config.arena_size() {
        return None;
    }

    let order = size.next_power_of_two().trailing_zeros() as u8;
    Some(order.max(config.min_order()))
}

/// Statistics for a memory allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocStats {
    /// The name of the allocator that collected these stats.
    pub name: &'static str,
    /// The number of bytes that were requested by callers.
    pub requested: usize,
    /// The number of bytes that are currently handed out, including the
    /// rounding to the next order.
    pub allocated: usize,
    /// The number of bytes that are left for allocation.
    pub free: usize,
    /// The total number of bytes that this allocator manages.
    pub total: usize,
    /// How often a block was split into two buddies.
    pub splits: usize,
    /// How often two buddies were merged back together.
    pub merges: usize,
}

impl AllocStats {
    /// Create a new [`AllocStats`] instance for the given allocator name.
    pub const fn with_name(name: &'static str) -> Self {
        Self {
            name,
            requested: 0,
            allocated: 0,
            free: 0,
            total: 0,
            splits: 0,
            merges: 0,
        }
    }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f, "\nRequested: {}", unit::bytes(self.requested))?;
        writeln!(f, "Allocated: {}", unit::bytes(self.allocated))?;
        writeln!(f, "Free:      {}", unit::bytes(self.free))?;
        writeln!(f, "Total:     {}", unit::bytes(self.total))?;
        writeln!(f, "Splits: {}, Merges: {}", self.splits, self.merges)?;
        self.name.chars().try_for_each(|_| write!(f, "~"))?;
        writeln!(f)?;
        Ok(())
    }
}
