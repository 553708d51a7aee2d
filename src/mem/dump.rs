//! Reports about the fragmentation of an allocator.

use super::size_for_order;
use crate::unit::KIB;
use alloc::vec::Vec;
use core::fmt;

/// Snapshot of the number of free blocks per order.
///
/// The [`Display`](core::fmt::Display) implementation prints one
/// `count:size` entry per order, smallest order first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    min_order: u8,
    counts: Vec<usize>,
}

impl Dump {
    pub(crate) fn new(min_order: u8, counts: Vec<usize>) -> Self {
        Self { min_order, counts }
    }

    /// Returns the number of free blocks with the given order.
    ///
    /// Orders outside of the allocator's range have no free blocks.
    pub fn count(&self, order: u8) -> usize {
        order
            .checked_sub(self.min_order)
            .and_then(|slot| self.counts.get(slot as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Iterate over `(order, count, block size)` for every order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize, usize)> + '_ {
        (self.min_order..)
            .zip(self.counts.iter())
            .map(|(order, &count)| (order, count, size_for_order(order)))
    }

    /// The number of free blocks over all orders.
    pub fn total_blocks(&self) -> usize {
        self.counts.iter().sum()
    }

    /// The number of free bytes over all orders.
    pub fn free_bytes(&self) -> usize {
        self.iter().map(|(_, count, size)| count * size).sum()
    }
}

impl fmt::Display for Dump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, count, size)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }

            if size >= KIB {
                write!(f, "{}:{}K", count, size / KIB)?;
            } else {
                write!(f, "{}:{}B", count, size)?;
            }
        }

        Ok(())
    }
}
