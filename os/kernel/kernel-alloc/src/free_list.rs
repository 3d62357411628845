use core::sync::atomic::{AtomicU32, Ordering};

/// Terminates a chain in the link table.
const NIL: u32 = u32::MAX;

/// Link-table entry: index of the next free page in the same shard.
///
/// The table has one entry per managed page and is supplied by the owner of
/// the allocator, typically as a `static`:
///
/// ```rust
/// use kernel_alloc::PageLink;
/// use kernel_info::memory::MAX_PAGES;
///
/// static LINKS: [PageLink; MAX_PAGES] = [const { PageLink::new() }; MAX_PAGES];
/// ```
///
/// An entry is only read or written while holding the lock of the shard whose
/// list currently contains the page, so relaxed atomics suffice; the shard
/// locks order the accesses.
#[repr(transparent)]
pub struct PageLink(AtomicU32);

impl PageLink {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU32::new(NIL))
    }
}

impl Default for PageLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed view of the link table.
#[derive(Copy, Clone)]
pub(crate) struct Links<'m>(&'m [PageLink]);

impl<'m> Links<'m> {
    pub(crate) const fn new(table: &'m [PageLink]) -> Self {
        Self(table)
    }

    #[inline]
    fn next(self, index: u32) -> Option<u32> {
        match self.0[index as usize].0.load(Ordering::Relaxed) {
            NIL => None,
            next => Some(next),
        }
    }

    #[inline]
    fn set_next(self, index: u32, next: Option<u32>) {
        self.0[index as usize]
            .0
            .store(next.unwrap_or(NIL), Ordering::Relaxed);
    }
}

/// A detached run of free pages, `head ..= tail`, linked through the table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Chain {
    pub head: u32,
    pub tail: u32,
    pub len: usize,
}

/// One shard's singly-linked free list.
///
/// # Invariants
/// - `len` is the number of nodes reachable from `head`.
/// - Every node reachable from `head` is in no other list.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
    head: Option<u32>,
    len: usize,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn push(&mut self, links: Links<'_>, index: u32) {
        links.set_next(index, self.head);
        self.head = Some(index);
        self.len += 1;
    }

    pub(crate) fn pop(&mut self, links: Links<'_>) -> Option<u32> {
        let head = self.head?;
        self.head = links.next(head);
        links.set_next(head, None);
        self.len -= 1;
        Some(head)
    }

    /// Detach the trailing half (`len / 2` nodes) of a list holding at least two pages.
    ///
    /// Walks with a slow and a fast cursor: when the fast one reaches the
    /// last node the slow one sits just before the midpoint, which is where
    /// the list is cut. The fast cursor ends on the last node, which becomes
    /// the chain's tail.
    pub(crate) fn split_off_back_half(&mut self, links: Links<'_>) -> Option<Chain> {
        let head = self.head?;
        let mut slow = head;
        let mut fast = links.next(head)?;

        while let Some(next) = links.next(fast) {
            let Some(step) = links.next(slow) else {
                break;
            };
            slow = step;
            match links.next(next) {
                Some(after) => fast = after,
                None => {
                    fast = next;
                    break;
                }
            }
        }

        let stolen_head = links.next(slow)?;
        links.set_next(slow, None);

        let stolen = self.len / 2;
        self.len -= stolen;
        Some(Chain {
            head: stolen_head,
            tail: fast,
            len: stolen,
        })
    }

    /// Put a detached chain in front of this list.
    pub(crate) fn prepend(&mut self, links: Links<'_>, chain: Chain) {
        links.set_next(chain.tail, self.head);
        self.head = Some(chain.head);
        self.len += chain.len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> Vec<PageLink> {
        (0..n).map(|_| PageLink::new()).collect()
    }

    fn build(links: Links<'_>, pages: &[u32]) -> FreeList {
        let mut list = FreeList::new();
        for &p in pages.iter().rev() {
            list.push(links, p);
        }
        list
    }

    fn drain(links: Links<'_>, list: &mut FreeList) -> Vec<u32> {
        core::iter::from_fn(|| list.pop(links)).collect()
    }

    #[test]
    fn push_pop_is_lifo() {
        let t = table(4);
        let links = Links::new(&t);
        let mut list = FreeList::new();
        list.push(links, 2);
        list.push(links, 0);
        list.push(links, 3);
        assert_eq!(list.len(), 3);
        assert_eq!(drain(links, &mut list), vec![3, 0, 2]);
        assert_eq!(list.len(), 0);
        assert_eq!(list.pop(links), None);
    }

    #[test]
    fn split_needs_two_pages() {
        let t = table(2);
        let links = Links::new(&t);
        let mut empty = FreeList::new();
        assert_eq!(empty.split_off_back_half(links), None);

        let mut single = build(links, &[1]);
        assert_eq!(single.split_off_back_half(links), None);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn split_moves_half_rounded_down() {
        for n in 2..=9u32 {
            let t = table(n as usize);
            let links = Links::new(&t);
            let pages: Vec<u32> = (0..n).collect();
            let mut list = build(links, &pages);

            let chain = list.split_off_back_half(links).expect("at least two pages");
            let stolen = (n / 2) as usize;
            assert_eq!(chain.len, stolen, "n = {n}");
            assert_eq!(chain.tail, n - 1, "n = {n}");
            assert_eq!(list.len(), n as usize - stolen);

            let kept = drain(links, &mut list);
            assert_eq!(kept, (0..n - stolen as u32).collect::<Vec<_>>());

            let mut other = FreeList::new();
            other.prepend(links, chain);
            let moved = drain(links, &mut other);
            assert_eq!(moved, (n - stolen as u32..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn prepend_keeps_existing_pages() {
        let t = table(6);
        let links = Links::new(&t);
        let mut donor = build(links, &[0, 1, 2, 3]);
        let chain = donor.split_off_back_half(links).unwrap();

        let mut own = build(links, &[5]);
        own.prepend(links, chain);
        assert_eq!(own.len(), 3);
        assert_eq!(drain(links, &mut own), vec![2, 3, 5]);
    }
}
