//! Implementation of an intrusive linked list over the page table.
//!
//! The nodes of the list live inside the [`Page`] records, so a list itself
//! only stores the index of its first page. Every operation borrows the page
//! table that holds the nodes.

use super::page::Page;

/// The links of a single page to its neighbours inside a [`LinkedList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    prev: Option<usize>,
    next: Option<usize>,
}

impl Link {
    /// A link that is not part of any list.
    pub const UNLINKED: Link = Link {
        prev: None,
        next: None,
    };
}

/// Intrusive, doubly linked list of page indices.
#[derive(Debug, Clone, Copy)]
pub struct LinkedList {
    head: Option<usize>,
    len: usize,
}

impl LinkedList {
    /// An empty list, usable to initialize arrays of lists.
    pub const EMPTY: LinkedList = LinkedList::new();

    /// Create a new, empty linked list.
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Check if this list is empty.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The number of pages inside this list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Push the page at `idx` to the front of this list.
    ///
    /// The page must not be part of any list already.
    pub fn push(&mut self, pages: &mut [Page], idx: usize) {
        debug_assert_eq!(pages[idx].link, Link::UNLINKED, "page {} is already linked", idx);

        if let Some(head) = self.head {
            pages[head].link.prev = Some(idx);
        }

        pages[idx].link = Link {
            prev: None,
            next: self.head,
        };
        self.head = Some(idx);
        self.len += 1;
    }

    /// Remove the first page from this list and return its index.
    pub fn pop(&mut self, pages: &mut [Page]) -> Option<usize> {
        let head = self.head?;
        self.remove(pages, head);
        Some(head)
    }

    /// Unlink the page at `idx` from this list.
    ///
    /// The page must be part of this list, the neighbours are found
    /// through the page's own link so this never walks the list.
    pub fn remove(&mut self, pages: &mut [Page], idx: usize) {
        let Link { prev, next } = pages[idx].link;

        match prev {
            Some(prev) => pages[prev].link.next = next,
            None => {
                debug_assert_eq!(self.head, Some(idx), "page {} is not in this list", idx);
                self.head = next;
            }
        }

        if let Some(next) = next {
            pages[next].link.prev = prev;
        }

        pages[idx].link = Link::UNLINKED;
        self.len -= 1;
    }

    /// Check if the page at `idx` is part of this list by walking it.
    pub fn contains(&self, pages: &[Page], idx: usize) -> bool {
        self.iter(pages).any(|page| page == idx)
    }

    /// Return an iterator over the page indices of this list.
    pub fn iter<'list>(&self, pages: &'list [Page]) -> Iter<'list> {
        Iter {
            head: self.head,
            pages,
        }
    }
}

impl Default for LinkedList {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the page indices of a single [`LinkedList`].
pub struct Iter<'list> {
    head: Option<usize>,
    pages: &'list [Page],
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.head?;
        self.head = self.pages[head].link.next;
        Some(head)
    }
}
