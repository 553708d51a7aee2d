#![deny(rust_2018_idioms)]

mod print;

use windy_buddy::{unit::KIB, BuddyAllocator, Config, Error};

fn main() -> Result<(), Error> {
    if let Err(err) = print::init_logging() {
        eprintln!("failed to init logging: {}", err);
    }

    let mut alloc = BuddyAllocator::new(Config::default());
    println!("init:       {}", alloc.dump());

    // two single pages that are buddies of each other
    let first = alloc.alloc(4 * KIB)?;
    let second = alloc.alloc(4 * KIB)?;
    log::info!(
        "Allocated pages at offsets {:#x} and {:#x}",
        alloc.offset_of(first),
        alloc.offset_of(second)
    );
    println!("alloc 2x4K: {}", alloc.dump());

    let large = alloc.alloc(100 * KIB)?;
    println!("alloc 100K: {}", alloc.dump());

    match alloc.alloc(alloc.config().arena_size() + 1) {
        Err(err) => log::info!("Oversized request failed: {}", err),
        Ok(_) => log::warn!("Oversized request unexpectedly succeeded"),
    }

    alloc.free(first);
    println!("free 4K:    {}", alloc.dump());
    alloc.free(second);
    println!("free 4K:    {}", alloc.dump());
    alloc.free(large);
    println!("free 100K:  {}", alloc.dump());

    println!("{}", alloc.stats());
    Ok(())
}
