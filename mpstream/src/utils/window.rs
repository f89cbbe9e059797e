/// Fixed-capacity byte window that is compacted from the front.
///
/// Holds `len` valid bytes at the start of a buffer allocated once. Bytes past `len` are
/// stale and never exposed. Appending never grows the allocation: a chunk that does not
/// fit is rejected and the caller decides what to drop.
#[derive(Debug)]
pub struct SlidingBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl SlidingBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.data.len()
    }

    /// Valid bytes, oldest first.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Appends `chunk` if it fits entirely. Returns `false` and leaves the window untouched
    /// otherwise.
    pub fn try_extend(&mut self, chunk: &[u8]) -> bool {
        let end = self.len + chunk.len();
        if end > self.data.len() {
            return false;
        }

        self.data[self.len..end].copy_from_slice(chunk);
        self.len = end;
        true
    }

    /// Removes `cnt` bytes from the front, shifting the remaining tail to offset 0.
    pub fn consume_front(&mut self, cnt: usize) {
        let cnt = cnt.min(self.len);
        self.data.copy_within(cnt..self.len, 0);
        self.len -= cnt;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

#[test]
fn consume_front_keeps_suffix() {
    let mut window = SlidingBuffer::with_capacity(8);
    assert!(window.try_extend(&[1, 2, 3, 4, 5]));
    assert!(window.try_extend(&[6, 7]));

    window.consume_front(3);
    assert_eq!(window.as_slice(), &[4, 5, 6, 7]);
    assert_eq!(window.len(), 4);

    // Freed space is reusable without touching the kept bytes.
    assert!(window.try_extend(&[8, 9, 10, 11]));
    assert!(window.is_full());
    assert_eq!(window.as_slice(), &[4, 5, 6, 7, 8, 9, 10, 11]);
}

#[test]
fn rejected_chunk_leaves_window_untouched() {
    let mut window = SlidingBuffer::with_capacity(4);
    assert!(window.try_extend(&[1, 2, 3]));
    assert!(!window.try_extend(&[4, 5]));
    assert_eq!(window.as_slice(), &[1, 2, 3]);

    window.consume_front(10);
    assert!(window.is_empty());
    assert_eq!(window.capacity(), 4);
}
