//! Packed per-field dirty markers

const WORD_BITS: usize = 64;

/// One bit per field position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirtyBits {
    words: Vec<u64>,
    len: usize,
}

impl DirtyBits {
    /// All-clean bit set for `len` positions
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    /// Number of positions tracked
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark a position dirty. Out-of-range positions are ignored.
    pub fn set(&mut self, position: usize) {
        if position < self.len {
            self.words[position / WORD_BITS] |= 1 << (position % WORD_BITS);
        }
    }

    /// Whether a position is dirty
    pub fn get(&self, position: usize) -> bool {
        position < self.len && self.words[position / WORD_BITS] & (1 << (position % WORD_BITS)) != 0
    }

    /// Whether any position is dirty
    pub fn any(&self) -> bool {
        self.words.iter().any(|w| *w != 0)
    }

    /// Number of dirty positions
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Clear every position
    pub fn clear_all(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Dirty positions in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&p| self.get(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_clean() {
        let bits = DirtyBits::new(10);
        assert!(!bits.any());
        assert_eq!(bits.count(), 0);
        assert_eq!(bits.len(), 10);
    }

    #[test]
    fn test_set_and_clear_across_words() {
        let mut bits = DirtyBits::new(130);
        bits.set(0);
        bits.set(64);
        bits.set(129);

        assert!(bits.get(0));
        assert!(bits.get(64));
        assert!(bits.get(129));
        assert!(!bits.get(1));
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 64, 129]);

        bits.clear_all();
        assert!(!bits.any());
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut bits = DirtyBits::new(3);
        bits.set(3);
        assert!(!bits.any());
        assert!(!bits.get(100));
    }
}
