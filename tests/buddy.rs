use std::ptr::NonNull;
use windy_buddy::{mem::order_for_size, BuddyAllocator, Config, Error};

fn counts(alloc: &BuddyAllocator) -> Vec<usize> {
    alloc.dump().iter().map(|(_, count, _)| count).collect()
}

fn range(alloc: &BuddyAllocator, ptr: NonNull<u8>, size: usize) -> (usize, usize) {
    let start = alloc.offset_of(ptr);
    let order = order_for_size(size, alloc.config()).unwrap();
    (start, start + (1 << order))
}

#[test]
fn init_reports_one_max_block() {
    let alloc = BuddyAllocator::default();
    let dump = alloc.dump();

    assert_eq!(dump.count(20), 1);
    assert_eq!(dump.total_blocks(), 1);
    assert_eq!(dump.free_bytes(), 1 << 20);
    assert_eq!(
        dump.to_string(),
        "0:4K 0:8K 0:16K 0:32K 0:64K 0:128K 0:256K 0:512K 1:1024K"
    );
}

#[test]
fn addresses_are_aligned_to_their_order() {
    let mut alloc = BuddyAllocator::default();

    for &size in &[1, 100, 4096, 4097, 10_000, 65_536, 100_000] {
        let ptr = alloc.alloc(size).unwrap();
        let order = order_for_size(size, alloc.config()).unwrap();
        assert_eq!(alloc.offset_of(ptr) % (1 << order), 0, "size {}", size);
    }
}

#[test]
fn whole_arena_is_handed_out_once() {
    let mut alloc = BuddyAllocator::default();

    let ptr = alloc.alloc(1 << 20).unwrap();
    assert_eq!(ptr, alloc.base());
    assert_eq!(alloc.alloc(1 << 20), Err(Error::OutOfMemory));
    assert_eq!(alloc.alloc(1), Err(Error::OutOfMemory));

    alloc.free(ptr);
    assert!(alloc.alloc(1 << 20).is_ok());
}

#[test]
fn oversized_request_is_out_of_range() {
    let mut alloc = BuddyAllocator::default();
    assert_eq!(alloc.alloc((1 << 20) + 1), Err(Error::OutOfRange));
    assert_eq!(alloc.allocate(21), Err(Error::OutOfRange));

    // the failed request must not touch the free lists
    assert_eq!(alloc.dump().count(20), 1);
}

#[test]
fn live_allocations_never_overlap() {
    let mut alloc = BuddyAllocator::default();

    let mut ranges = Vec::new();
    for &size in &[4096, 4096, 8192, 3000, 20_000, 4096, 70_000, 5000] {
        let ptr = alloc.alloc(size).unwrap();
        ranges.push(range(&alloc, ptr, size));
    }

    for (i, a) in ranges.iter().enumerate() {
        for b in &ranges[i + 1..] {
            assert!(a.1 <= b.0 || b.1 <= a.0, "{:?} overlaps {:?}", a, b);
        }
    }
}

#[test]
fn exhaust_with_pages() {
    let mut alloc = BuddyAllocator::default();

    let pages = (0..256)
        .map(|_| alloc.alloc(4096).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(alloc.alloc(1), Err(Error::OutOfMemory));
    assert_eq!(alloc.dump().total_blocks(), 0);

    let mut offsets = pages
        .iter()
        .map(|&ptr| alloc.offset_of(ptr))
        .collect::<Vec<_>>();
    offsets.sort_unstable();
    assert!(offsets.iter().enumerate().all(|(i, &off)| off == i * 4096));

    pages.into_iter().for_each(|ptr| alloc.free(ptr));
    assert_eq!(alloc.dump().count(20), 1);
    assert_eq!(alloc.dump().total_blocks(), 1);
}

#[test]
fn alloc_then_free_restores_free_lists() {
    let mut alloc = BuddyAllocator::default();
    let _keep = alloc.alloc(8192).unwrap();
    let _other = alloc.alloc(50_000).unwrap();

    for &size in &[1, 4096, 4097, 30_000, 200_000] {
        let before = counts(&alloc);
        let ptr = alloc.alloc(size).unwrap();
        alloc.free(ptr);
        assert_eq!(counts(&alloc), before, "size {}", size);
    }
}

#[test]
fn buddies_coalesce_back_to_the_arena() {
    let mut alloc = BuddyAllocator::default();

    let a = alloc.alloc(4096).unwrap();
    let b = alloc.alloc(4096).unwrap();
    assert_eq!(alloc.offset_of(a) ^ alloc.offset_of(b), 4096);
    assert_eq!(alloc.dump().count(12), 0);

    alloc.free(a);
    assert_eq!(alloc.dump().count(12), 1);

    alloc.free(b);
    let dump = alloc.dump();
    assert_eq!(dump.count(12), 0);
    assert_eq!(dump.count(20), 1);
    assert_eq!(dump.total_blocks(), 1);
}

#[test]
fn partial_coalescing_stops_at_allocated_buddy() {
    let mut alloc = BuddyAllocator::default();

    let a = alloc.alloc(4096).unwrap();
    let b = alloc.alloc(4096).unwrap();
    let c = alloc.alloc(8192).unwrap();
    assert_eq!(alloc.offset_of(c), 8192);

    alloc.free(a);
    alloc.free(b);

    // a and b merge into one order 13 block, but `c` blocks the next merge
    let dump = alloc.dump();
    assert_eq!(dump.count(12), 0);
    assert_eq!(dump.count(13), 1);
    assert_eq!(alloc.free_blocks(13).collect::<Vec<_>>(), [0]);

    alloc.free(c);
    assert_eq!(alloc.dump().count(20), 1);
}

#[test]
fn exact_page_request_uses_one_page() {
    let mut alloc = BuddyAllocator::default();

    let a = alloc.alloc(4096).unwrap();
    let b = alloc.alloc(4096).unwrap();
    assert_eq!(alloc.offset_of(b) - alloc.offset_of(a), 4096);
    assert_eq!(alloc.stats().allocated, 2 * 4096);

    let page = alloc.addr_to_page(a);
    assert_eq!(alloc.pages()[page].order(), Some(12));
}

#[test]
fn smallest_order_is_preferred() {
    let mut alloc = BuddyAllocator::default();

    let _a = alloc.alloc(4096).unwrap();
    // a free order 12 block exists now, so it must be used
    // instead of splitting a larger one
    let before = counts(&alloc);
    let b = alloc.alloc(100).unwrap();
    assert_eq!(alloc.offset_of(b), 4096);
    assert_eq!(before[1..], counts(&alloc)[1..]);
}

#[test]
fn custom_layout() {
    let config = Config::new(6, 10).unwrap();
    let mut alloc = BuddyAllocator::new(config);

    assert_eq!(alloc.pages().len(), 16);
    let ptr = alloc.alloc(65).unwrap();
    assert_eq!(alloc.offset_of(ptr), 0);
    assert_eq!(counts(&alloc), [0, 1, 1, 1, 0]);
    assert_eq!(alloc.alloc(1024), Err(Error::OutOfMemory));
    assert_eq!(alloc.alloc(1025), Err(Error::OutOfRange));
}

#[test]
fn allocators_are_independent() {
    let mut first = BuddyAllocator::default();
    let second = BuddyAllocator::default();

    first.alloc(1 << 19).unwrap();
    assert_eq!(first.dump().count(20), 0);
    assert_eq!(second.dump().count(20), 1);
}
