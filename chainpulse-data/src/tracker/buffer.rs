use chrono::{DateTime, Utc};

/// One ingested reading for a contract: the instant it was observed plus the
/// cumulative session volume and open interest reported by the feed.
///
/// Readings are stored verbatim - no monotonicity is enforced because open
/// interest legitimately falls intra-day as positions unwind.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub volume: u64,
    pub open_interest: u64,
}

/// Fixed-capacity ring of [`Sample`]s.
///
/// Appends are O(1): the backing `Vec` grows once up to capacity and never
/// reallocates after that - a full ring overwrites its oldest slot and
/// advances the head index. Eviction is therefore explicit and strictly
/// oldest-first. Iteration and logical indexing are oldest-first.
#[derive(Clone, Debug)]
pub struct SampleRing {
    buf: Vec<Sample>,
    capacity: usize,
    head: usize,
}

impl SampleRing {
    /// Ring retaining at most `capacity` samples.
    ///
    /// # Panics
    /// If `capacity < 2` - a change query needs two samples, so a smaller
    /// ring is programmer error.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "SampleRing capacity must be at least 2");
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Append a sample, evicting the oldest once the ring is full.
    ///
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        if self.buf.len() < self.capacity {
            self.buf.push(sample);
            None
        } else {
            let evicted = std::mem::replace(&mut self.buf[self.head], sample);
            self.head = (self.head + 1) % self.capacity;
            Some(evicted)
        }
    }

    /// Sample at logical position `index`, where position 0 is the oldest
    /// retained sample.
    pub fn get(&self, index: usize) -> Option<&Sample> {
        if index >= self.buf.len() {
            return None;
        }
        // head only advances once the ring is full; before that physical and
        // logical positions coincide.
        self.buf.get((self.head + index) % self.capacity)
    }

    /// Oldest retained sample.
    pub fn oldest(&self) -> Option<&Sample> {
        self.get(0)
    }

    /// Most recently appended sample.
    pub fn newest(&self) -> Option<&Sample> {
        match self.buf.len() {
            0 => None,
            len => self.get(len - 1),
        }
    }

    /// Iterate retained samples oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        let (newer, older) = if self.is_full() {
            self.buf.split_at(self.head)
        } else {
            (&self.buf[..0], &self.buf[..])
        };
        // Physical layout wraps at head: [head..] holds the older half.
        older.iter().chain(newer.iter())
    }
}
