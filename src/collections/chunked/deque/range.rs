/// The number of elements held by each bucket of a [`Deque`](super::Deque).
pub const BUCKET_LEN: usize = 7;

/// The factor the bucket index grows by once it runs out of space at either end.
pub(crate) const GROWTH_FACTOR: usize = 3;
/// The growth factor used for a bucket index of capacity 1, which would otherwise need to grow
/// again almost immediately.
pub(crate) const SINGLE_BUCKET_GROWTH_FACTOR: usize = 6;

/// The occupied range of a non-empty Deque, in terms of virtual indices. Virtual index `v` refers
/// to slot `v % BUCKET_LEN` of bucket `v / BUCKET_LEN` within the bucket index.
///
/// Both `first` and `last` are inclusive, so a range with `first == last` holds one element. An
/// empty Deque has no Range at all. The chunk fields cache the bucket of `first` and `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Range {
    pub first: usize,
    pub last: usize,
    pub first_chunk: usize,
    pub last_chunk: usize,
}

impl Range {
    /// Creates a Range containing only the element at virtual index `virt`.
    pub const fn single(virt: usize) -> Range {
        Range {
            first: virt,
            last: virt,
            first_chunk: chunk_of(virt),
            last_chunk: chunk_of(virt),
        }
    }

    pub const fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// The number of buckets spanned by the Range, all of which are allocated.
    pub const fn chunks(&self) -> usize {
        self.last_chunk - self.first_chunk + 1
    }

    /// Maps a logical index (relative to the front) to a virtual index, without checking it.
    pub const fn virt(&self, index: usize) -> usize {
        self.first + index
    }

    pub const fn contains(&self, virt: usize) -> bool {
        self.first <= virt && virt <= self.last
    }

    /// Returns true if the slot after `last` would fall outside of a bucket index with `cap`
    /// buckets.
    pub const fn is_at_back_of(&self, cap: usize) -> bool {
        self.last == cap * BUCKET_LEN - 1
    }

    /// Returns true if the slot before `first` would fall outside of the bucket index.
    pub const fn is_at_front(&self) -> bool {
        self.first == 0
    }

    /// Extends the Range by one slot at the back.
    pub const fn push_back(&mut self) {
        self.last += 1;
        self.last_chunk = chunk_of(self.last);
    }

    /// Extends the Range by one slot at the front.
    pub const fn push_front(&mut self) {
        self.first -= 1;
        self.first_chunk = chunk_of(self.first);
    }

    /// Removes the last slot from a Range holding more than one element.
    pub const fn pop_back(&mut self) {
        debug_assert!(self.first < self.last);
        self.last -= 1;
        self.last_chunk = chunk_of(self.last);
    }

    /// Removes the first slot from a Range holding more than one element.
    pub const fn pop_front(&mut self) {
        debug_assert!(self.first < self.last);
        self.first += 1;
        self.first_chunk = chunk_of(self.first);
    }

    /// Moves the Range so that it starts in bucket `first_chunk`, keeping every element's offset
    /// within its bucket.
    pub const fn rebase(&mut self, first_chunk: usize) {
        let len = self.len();
        self.first = first_chunk * BUCKET_LEN + offset_of(self.first);
        self.last = self.first + len - 1;
        self.first_chunk = first_chunk;
        self.last_chunk = chunk_of(self.last);
    }
}

pub(crate) const fn chunk_of(virt: usize) -> usize {
    virt / BUCKET_LEN
}

pub(crate) const fn offset_of(virt: usize) -> usize {
    virt % BUCKET_LEN
}

/// Returns the capacity (in buckets) of a bucket index that has run out of space.
pub(crate) const fn grown_cap(cap: usize) -> Option<usize> {
    if cap == 1 {
        cap.checked_mul(SINGLE_BUCKET_GROWTH_FACTOR)
    } else {
        cap.checked_mul(GROWTH_FACTOR)
    }
}
