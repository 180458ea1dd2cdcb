use std::mem::MaybeUninit;
use std::ptr::NonNull;

use tracing::{debug, trace};

use super::{BUCKET_LEN, Range, chunk_of, grown_cap, offset_of};
use crate::alloc::{Allocator, CapacityOverflow, TryReserveError};

/// A handle to a fixed-size block of [`BUCKET_LEN`] possibly uninitialized elements.
///
/// Buckets don't know which of their slots are initialized and don't free themselves, that is up
/// to the Deque which owns the [`BucketIndex`] referencing them.
#[derive(Debug)]
pub(crate) struct Bucket<T>(NonNull<MaybeUninit<T>>);

impl<T> Bucket<T> {
    /// Allocates a new bucket with all slots uninitialized.
    pub fn allocate<A: Allocator>(alloc: &A) -> Result<Bucket<T>, TryReserveError> {
        alloc
            .allocate_slots::<T>(BUCKET_LEN)
            .map(Bucket)
            .inspect_err(|error| debug!(%error, "failed to allocate bucket"))
    }

    /// Returns a pointer to the slot at `offset`.
    ///
    /// # Safety
    /// `offset` must be less than [`BUCKET_LEN`].
    pub const unsafe fn slot(self, offset: usize) -> NonNull<MaybeUninit<T>> {
        debug_assert!(offset < BUCKET_LEN);
        // SAFETY: The caller guarantees that offset is within the allocation.
        unsafe { self.0.add(offset) }
    }

    /// Deallocates the bucket without dropping any of its slots.
    ///
    /// # Safety
    /// The bucket must have been allocated by `alloc` (or an equal allocator), and all of its
    /// slots must already be uninitialized or forgotten.
    pub unsafe fn release<A: Allocator>(self, alloc: &A) {
        // SAFETY: The bucket was allocated with the same allocator and count.
        unsafe { alloc.deallocate_slots(self.0, BUCKET_LEN) }
    }
}

impl<T> Clone for Bucket<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Bucket<T> {}

/// The growable array of bucket handles which defines the virtual index space of a Deque.
///
/// Only the slots covered by the Deque's [`Range`] are guaranteed to hold a bucket. Like
/// [`Bucket`], the index never frees itself, because freeing requires the Deque's allocator.
#[derive(Debug)]
pub(crate) struct BucketIndex<T> {
    pub(crate) ptr: NonNull<Option<Bucket<T>>>,
    pub(crate) cap: usize,
}

impl<T> BucketIndex<T> {
    /// Returns an index with no capacity that owns no memory. Used by iterators over an empty
    /// Deque, which never read from it.
    pub const fn dangling() -> BucketIndex<T> {
        BucketIndex {
            ptr: NonNull::dangling(),
            cap: 0,
        }
    }

    /// Allocates an index with room for `cap` buckets, none of which are present.
    pub fn allocate<A: Allocator>(alloc: &A, cap: usize) -> Result<BucketIndex<T>, TryReserveError> {
        // The virtual index space needs to be addressable as well.
        cap.checked_mul(BUCKET_LEN).ok_or(CapacityOverflow)?;

        let ptr = alloc.allocate_slots::<Option<Bucket<T>>>(cap)?;

        for i in 0..cap {
            // SAFETY: i < cap, so the slot is within the allocation.
            unsafe { ptr.add(i).write(MaybeUninit::new(None)) }
        }

        Ok(BucketIndex {
            ptr: ptr.cast(),
            cap,
        })
    }

    pub const fn cap(&self) -> usize {
        self.cap
    }

    /// Returns the handle stored for `chunk`, if any.
    ///
    /// # Safety
    /// `chunk` must be less than the capacity of the index.
    pub const unsafe fn get(&self, chunk: usize) -> Option<Bucket<T>> {
        debug_assert!(chunk < self.cap);
        // SAFETY: The caller guarantees that chunk is in bounds, all slots are initialized.
        unsafe { self.ptr.add(chunk).read() }
    }

    /// Stores a handle for `chunk`, returning the previous one. No bucket is freed.
    ///
    /// # Safety
    /// `chunk` must be less than the capacity of the index.
    pub unsafe fn set(&mut self, chunk: usize, bucket: Option<Bucket<T>>) -> Option<Bucket<T>> {
        debug_assert!(chunk < self.cap);
        // SAFETY: The caller guarantees that chunk is in bounds, all slots are initialized and
        // Option<Bucket<T>> is Copy, so nothing needs dropping.
        unsafe { self.ptr.add(chunk).replace(bucket) }
    }

    /// Returns a pointer to the slot for virtual index `virt`.
    ///
    /// # Safety
    /// The bucket containing `virt` must be present in the index.
    pub unsafe fn slot(&self, virt: usize) -> NonNull<MaybeUninit<T>> {
        // SAFETY: The caller guarantees that virt belongs to a present bucket, which implies that
        // its chunk is in bounds.
        let bucket = unsafe { self.get(chunk_of(virt)) };
        debug_assert!(bucket.is_some(), "virtual index {virt} refers to a missing bucket");
        // SAFETY: As above, the bucket is present. The offset is always less than BUCKET_LEN.
        unsafe { bucket.unwrap_unchecked().slot(offset_of(virt)) }
    }

    /// Creates a copy of the index referencing the same memory.
    ///
    /// # Safety
    /// The copy must never be released and can't be used after the original is released or
    /// regrown.
    pub const unsafe fn clone_shallow(&self) -> BucketIndex<T> {
        BucketIndex {
            ptr: self.ptr,
            cap: self.cap,
        }
    }

    /// Grows the index by [`GROWTH_FACTOR`](super::GROWTH_FACTOR) (or
    /// [`SINGLE_BUCKET_GROWTH_FACTOR`](super::SINGLE_BUCKET_GROWTH_FACTOR) from a capacity of 1),
    /// moving the handles for the occupied `range` into the middle third of the new index and
    /// rebasing `range` to match.
    ///
    /// Buckets themselves aren't moved or reallocated, only their handles are copied. If the new
    /// index can't be allocated, neither self nor `range` are modified.
    pub fn grow<A: Allocator>(&mut self, alloc: &A, range: &mut Range) -> Result<(), TryReserveError> {
        let old_cap = self.cap;
        let new_cap = grown_cap(old_cap).ok_or(CapacityOverflow)?;
        let mut grown = BucketIndex::allocate(alloc, new_cap)?;

        let chunks = range.chunks();
        let third = new_cap / 3;
        let first_chunk = third + (third - chunks) / 2;

        for i in 0..chunks {
            // SAFETY: Chunks within range are in bounds of self, and first_chunk + chunks fits in
            // the middle third of grown.
            unsafe { grown.set(first_chunk + i, self.get(range.first_chunk + i)) };
        }

        range.rebase(first_chunk);

        // SAFETY: All bucket handles are now owned by grown, so only the handle array is freed.
        unsafe { std::mem::replace(self, grown).release(alloc) };

        trace!(
            old_cap,
            new_cap,
            first_chunk = range.first_chunk,
            last_chunk = range.last_chunk,
            "recentred bucket index"
        );
        Ok(())
    }

    /// Deallocates the array of handles. Buckets are not freed.
    ///
    /// # Safety
    /// The index must have been allocated by `alloc` (or an equal allocator), and must not be a
    /// shallow clone.
    pub unsafe fn release<A: Allocator>(self, alloc: &A) {
        // SAFETY: The index was allocated with the same allocator and capacity.
        unsafe { alloc.deallocate_slots(self.ptr.cast::<MaybeUninit<Option<Bucket<T>>>>(), self.cap) }
    }
}
