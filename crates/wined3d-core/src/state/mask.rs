use super::ids::{State, STATE_COUNT};

/// Fixed-size bit set backed by `u64` words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn contains(&self, bit: usize) -> bool {
        bit < self.len && self.words[bit / 64] & (1 << (bit % 64)) != 0
    }

    /// Returns `true` if the bit was previously clear. Bits past the end are ignored.
    pub fn insert(&mut self, bit: usize) -> bool {
        if bit >= self.len {
            return false;
        }
        let word = &mut self.words[bit / 64];
        let mask = 1 << (bit % 64);
        let was_clear = *word & mask == 0;
        *word |= mask;
        was_clear
    }

    /// Returns `true` if the bit was previously set.
    pub fn remove(&mut self, bit: usize) -> bool {
        if bit >= self.len {
            return false;
        }
        let word = &mut self.words[bit / 64];
        let mask = 1 << (bit % 64);
        let was_set = *word & mask != 0;
        *word &= !mask;
        was_set
    }

    pub fn insert_range(&mut self, range: std::ops::Range<usize>) {
        for bit in range.start..range.end.min(self.len) {
            self.insert(bit);
        }
    }

    pub fn fill(&mut self) {
        self.words.fill(u64::MAX);
        let tail = self.len % 64;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last = (1 << tail) - 1;
            }
        }
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut word = word;
            std::iter::from_fn(move || {
                if word == 0 {
                    return None;
                }
                let bit = word.trailing_zeros() as usize;
                word &= word - 1;
                Some(i * 64 + bit)
            })
        })
    }

    /// Clears the set and returns the bits that were set.
    pub fn take(&mut self) -> Vec<usize> {
        let bits = self.iter().collect();
        self.clear();
        bits
    }
}

/// A [`BitSet`] addressed by [`State`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateMask(BitSet);

impl Default for StateMask {
    fn default() -> Self {
        Self(BitSet::new(STATE_COUNT))
    }
}

impl StateMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, state: State) -> bool {
        state.index().is_some_and(|i| self.0.contains(i))
    }

    /// Returns `false` if the state was already set or has no index.
    pub fn insert(&mut self, state: State) -> bool {
        state.index().is_some_and(|i| self.0.insert(i))
    }

    pub fn remove(&mut self, state: State) -> bool {
        state.index().is_some_and(|i| self.0.remove(i))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count(&self) -> usize {
        self.0.count()
    }

    pub fn iter(&self) -> impl Iterator<Item = State> + '_ {
        self.0.iter().filter_map(State::from_index)
    }
}
