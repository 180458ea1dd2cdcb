use std::alloc::Layout;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

use super::{AllocError, CapacityOverflow, TryReserveError};

/// A source of memory for collections, along with the policy describing how it moves between
/// collections.
///
/// Only [`allocate`](Allocator::allocate) and [`deallocate`](Allocator::deallocate) need to be
/// implemented. The typed helpers are built on top of them and are what collections actually
/// call.
///
/// # Propagation
/// When a collection is assigned from another (see
/// [`Deque::clone_from`](crate::collections::chunked::Deque::clone_from) and
/// [`Deque::move_from`](crate::collections::chunked::Deque::move_from)), the assigned-to
/// collection either adopts the source's allocator or keeps its own. This is controlled by
/// [`PROPAGATE_ON_COPY_ASSIGNMENT`](Allocator::PROPAGATE_ON_COPY_ASSIGNMENT) and
/// [`PROPAGATE_ON_MOVE_ASSIGNMENT`](Allocator::PROPAGATE_ON_MOVE_ASSIGNMENT). Cloning a collection
/// outright uses the allocator produced by [`select_on_copy`](Allocator::select_on_copy).
///
/// Two allocators compare equal (via [`PartialEq`]) if memory allocated by one can be deallocated
/// by the other.
///
/// # Safety
/// A successful call to `allocate` must return a pointer to a block of memory that is valid for
/// reads and writes of `layout.size()` bytes, aligned to `layout.align()` and not aliased by any
/// other live allocation, until it is passed to `deallocate` of this or an equal allocator.
/// Clones must compare equal to the allocator they were cloned from.
pub unsafe trait Allocator: Clone + PartialEq {
    /// Whether a collection adopts the source's allocator during copy assignment.
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = false;

    /// Whether a collection adopts the source's allocator during move assignment.
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = false;

    /// Attempts to allocate a block of memory fitting `layout`.
    ///
    /// # Errors
    /// Returns an [`AllocError`] if the memory can't be provided.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Deallocates the block of memory referenced by `ptr`.
    ///
    /// # Safety
    /// `ptr` must have been returned by a call to [`allocate`](Allocator::allocate) on this (or an
    /// equal) allocator with the same `layout`, and must not have been deallocated already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Returns the allocator that a copy of a collection using self should use.
    fn select_on_copy(&self) -> Self {
        self.clone()
    }

    /// Allocates uninitialized space for `count` values of `T`. Zero-sized requests aren't passed
    /// on to the allocator and produce a dangling pointer instead.
    ///
    /// # Errors
    /// Returns [`TryReserveError::CapacityOverflow`] if the layout would exceed [`isize::MAX`]
    /// bytes, or [`TryReserveError::AllocError`] if allocation fails.
    fn allocate_slots<T>(&self, count: usize) -> Result<NonNull<MaybeUninit<T>>, TryReserveError> {
        let layout = Layout::array::<T>(count).map_err(|_| CapacityOverflow)?;

        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        Ok(self.allocate(layout)?.cast())
    }

    /// Deallocates space for `count` values of `T`, previously provided by
    /// [`allocate_slots`](Allocator::allocate_slots). No values are dropped.
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate_slots::<T>(count)` on this (or an equal)
    /// allocator and not deallocated already.
    unsafe fn deallocate_slots<T>(&self, ptr: NonNull<MaybeUninit<T>>, count: usize) {
        // SAFETY: The same layout was successfully created during allocation.
        let layout = unsafe { Layout::array::<T>(count).unwrap_unchecked() };

        if layout.size() != 0 {
            // SAFETY: The caller guarantees ptr was allocated by this allocator with layout.
            unsafe { self.deallocate(ptr.cast(), layout) }
        }
    }

    /// Constructs `value` in the uninitialized `slot`.
    ///
    /// # Safety
    /// `slot` must be valid for writes and properly aligned. Any value already in the slot is
    /// overwritten without being dropped.
    unsafe fn construct<T>(&self, slot: NonNull<MaybeUninit<T>>, value: T) {
        // SAFETY: The caller guarantees that slot is valid for writes.
        unsafe { slot.write(MaybeUninit::new(value)) }
    }

    /// Drops the value in `slot` in place, leaving it uninitialized.
    ///
    /// # Safety
    /// `slot` must contain an initialized value that isn't used again.
    unsafe fn destroy<T>(&self, slot: NonNull<MaybeUninit<T>>) {
        // SAFETY: The caller guarantees that slot is initialized and ready to drop.
        unsafe { ptr::drop_in_place(slot.cast::<T>().as_ptr()) }
    }
}
