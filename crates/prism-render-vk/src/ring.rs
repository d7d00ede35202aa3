// SPDX-License-Identifier: CEPL-1.0

/// Fixed-capacity ring of per-frame slots with an explicit cursor.
#[derive(Debug)]
pub struct FrameRing<T> {
    slots: Vec<T>,
    index: usize,
}

impl<T> FrameRing<T> {
    /// # Panics
    /// If `slots` is empty.
    pub fn new(slots: Vec<T>) -> Self {
        assert!(!slots.is_empty(), "a frame ring needs at least one slot");
        Self { slots, index: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &T {
        &self.slots[self.index]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.index]
    }

    /// Moves to the next slot, wrapping at capacity. Returns the new index.
    pub fn advance(&mut self) -> usize {
        self.index = (self.index + 1) % self.slots.len();
        self.index
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_wraps_at_capacity() {
        let mut ring = FrameRing::new(vec!['a', 'b']);
        assert_eq!(ring.capacity(), 2);
        assert_eq!(*ring.current(), 'a');
        assert_eq!(ring.advance(), 1);
        assert_eq!(*ring.current(), 'b');
        assert_eq!(ring.advance(), 0);
        assert_eq!(*ring.current(), 'a');
    }

    #[test]
    fn current_mut_edits_only_the_cursor_slot() {
        let mut ring = FrameRing::new(vec![1, 2, 3]);
        ring.advance();
        *ring.current_mut() = 20;
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![1, 20, 3]);
    }

    #[test]
    fn single_slot_ring_stays_put() {
        let mut ring = FrameRing::new(vec![7]);
        for _ in 0..5 {
            assert_eq!(ring.advance(), 0);
        }
        assert_eq!(ring.iter().count(), 1);
    }

    #[test]
    #[should_panic(expected = "at least one slot")]
    fn empty_ring_is_rejected() {
        let _ = FrameRing::<u8>::new(Vec::new());
    }
}
