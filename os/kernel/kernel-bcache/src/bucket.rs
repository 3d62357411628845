//! Per-bucket membership list.
//!
//! Each bucket keeps a circular doubly-linked list over slot indices. The
//! links live in the bucket itself, one `(prev, next)` pair per slot of the
//! pool, so they are only ever touched under that bucket's lock. A slot is
//! a member of at most one bucket at a time; its entries in every other
//! bucket stay unlinked.

const UNLINKED: u16 = u16::MAX;

pub(crate) struct Membership<const N: usize> {
    head: u16,
    len: usize,
    next: [u16; N],
    prev: [u16; N],
}

impl<const N: usize> Membership<N> {
    pub(crate) const fn new() -> Self {
        const { assert!(N < UNLINKED as usize) };
        Self {
            head: UNLINKED,
            len: 0,
            next: [UNLINKED; N],
            prev: [UNLINKED; N],
        }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn contains(&self, slot: usize) -> bool {
        self.next[slot] != UNLINKED
    }

    /// Links `slot` as the most recently added member.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn push_front(&mut self, slot: usize) {
        debug_assert!(!self.contains(slot), "slot {slot} linked twice");
        let s = slot as u16;
        if self.head == UNLINKED {
            self.next[slot] = s;
            self.prev[slot] = s;
        } else {
            let head = self.head as usize;
            let tail = self.prev[head];
            self.next[slot] = self.head;
            self.prev[slot] = tail;
            self.next[tail as usize] = s;
            self.prev[head] = s;
        }
        self.head = s;
        self.len += 1;
    }

    pub(crate) fn remove(&mut self, slot: usize) {
        debug_assert!(self.contains(slot), "slot {slot} is not a member");
        let next = self.next[slot];
        let prev = self.prev[slot];
        if next as usize == slot {
            self.head = UNLINKED;
        } else {
            self.next[prev as usize] = next;
            self.prev[next as usize] = prev;
            if self.head as usize == slot {
                self.head = next;
            }
        }
        self.next[slot] = UNLINKED;
        self.prev[slot] = UNLINKED;
        self.len -= 1;
    }

    /// Members from most to least recently linked.
    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = self.head;
        let mut remaining = self.len;
        core::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let slot = cursor as usize;
            cursor = self.next[slot];
            remaining -= 1;
            Some(slot)
        })
    }

    /// Whether the links form one cycle of exactly `len` members.
    pub(crate) fn is_well_formed(&self) -> bool {
        if self.head == UNLINKED {
            return self.len == 0 && self.next.iter().all(|&n| n == UNLINKED);
        }

        let mut cursor = self.head as usize;
        for _ in 0..self.len {
            let next = self.next[cursor];
            if next == UNLINKED || self.prev[next as usize] as usize != cursor {
                return false;
            }
            cursor = next as usize;
        }
        let linked = self.next.iter().filter(|&&n| n != UNLINKED).count();
        cursor == self.head as usize && linked == self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members<const N: usize>(m: &Membership<N>) -> Vec<usize> {
        m.iter().collect()
    }

    #[test]
    fn push_front_orders_newest_first() {
        let mut m = Membership::<6>::new();
        assert!(m.is_well_formed());
        m.push_front(4);
        m.push_front(1);
        m.push_front(5);
        assert_eq!(members(&m), vec![5, 1, 4]);
        assert_eq!(m.len(), 3);
        assert!(m.contains(1));
        assert!(!m.contains(0));
        assert!(m.is_well_formed());
    }

    #[test]
    fn remove_head_middle_tail_and_last() {
        let mut m = Membership::<6>::new();
        for s in [0, 1, 2, 3] {
            m.push_front(s);
        }
        m.remove(3);
        assert_eq!(members(&m), vec![2, 1, 0]);
        m.remove(1);
        assert_eq!(members(&m), vec![2, 0]);
        m.remove(0);
        assert_eq!(members(&m), vec![2]);
        assert!(m.is_well_formed());
        m.remove(2);
        assert!(members(&m).is_empty());
        assert!(m.is_well_formed());

        m.push_front(3);
        assert_eq!(members(&m), vec![3]);
        assert!(m.is_well_formed());
    }

    #[test]
    fn detects_broken_links() {
        let mut m = Membership::<4>::new();
        m.push_front(0);
        m.push_front(1);
        m.prev[0] = 3;
        assert!(!m.is_well_formed());
    }
}
