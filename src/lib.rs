//! A buddy allocator that manages one fixed, contiguous arena.
//!
//! The arena is split into power-of-two sized blocks. Allocations split
//! larger free blocks, and freed blocks are merged with their buddy
//! whenever both halves are free again.
#![deny(rust_2018_idioms, rustdoc::broken_intra_doc_links)]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod mem;
pub mod unit;

pub use mem::{
    buddy::BuddyAllocator, dump::Dump, locked::LockedAllocator, AllocStats, Config, Error, Result,
};
