//! Test-only element types and allocators used to observe drops, failed clones and allocations.
#![cfg(test)]

use std::alloc::Layout;
use std::cell::Cell;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};
use std::rc::Rc;

use crate::alloc::{AllocError, Allocator, Global};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZeroSizedType;

/// An element that increments a shared counter when dropped.
#[derive(Debug, Clone)]
pub struct CountedDrop {
    pub value: usize,
    drops: Rc<Cell<usize>>,
}

impl CountedDrop {
    pub fn new(value: usize, drops: &Rc<Cell<usize>>) -> CountedDrop {
        CountedDrop {
            value,
            drops: Rc::clone(drops),
        }
    }
}

impl Drop for CountedDrop {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

/// An element whose clone panics once a shared budget of clones has been used up.
#[derive(Debug)]
pub struct FallibleClone {
    pub value: usize,
    budget: Rc<Cell<usize>>,
}

impl FallibleClone {
    pub fn new(value: usize, budget: &Rc<Cell<usize>>) -> FallibleClone {
        FallibleClone {
            value,
            budget: Rc::clone(budget),
        }
    }
}

impl Clone for FallibleClone {
    fn clone(&self) -> Self {
        match self.budget.get() {
            0 => panic!("clone budget exhausted"),
            left => self.budget.set(left - 1),
        }
        FallibleClone {
            value: self.value,
            budget: Rc::clone(&self.budget),
        }
    }
}

impl PartialEq for FallibleClone {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[derive(Debug, Default)]
pub struct AllocStats {
    pub live: Cell<usize>,
    pub total: Cell<usize>,
    pub budget: Cell<Option<usize>>,
    pub constructed: Cell<usize>,
    pub destroyed: Cell<usize>,
}

/// An allocator backed by [`Global`] that counts live allocations along with the elements it
/// constructs and destroys, and can be told to fail after a number of further allocations. Clones
/// share their statistics and compare equal, while separately created instances never do.
/// `PROPAGATE` sets both propagation policies. With `FRESH_COPY`, copying a collection gives the
/// copy a new, unequal instance.
#[derive(Debug, Clone)]
pub struct TrackingAlloc<const PROPAGATE: bool = false, const FRESH_COPY: bool = false> {
    pub stats: Rc<AllocStats>,
}

impl<const PROPAGATE: bool, const FRESH_COPY: bool> TrackingAlloc<PROPAGATE, FRESH_COPY> {
    pub fn new() -> TrackingAlloc<PROPAGATE, FRESH_COPY> {
        TrackingAlloc {
            stats: Rc::default(),
        }
    }

    pub fn live(&self) -> usize {
        self.stats.live.get()
    }

    pub fn total(&self) -> usize {
        self.stats.total.get()
    }

    pub fn constructed(&self) -> usize {
        self.stats.constructed.get()
    }

    pub fn destroyed(&self) -> usize {
        self.stats.destroyed.get()
    }

    /// Allows `allocations` more allocations to succeed, after which all allocations fail.
    pub fn fail_after(&self, allocations: usize) {
        self.stats.budget.set(Some(allocations));
    }

    pub fn unlimited(&self) {
        self.stats.budget.set(None);
    }
}

impl<const PROPAGATE: bool, const FRESH_COPY: bool> PartialEq
    for TrackingAlloc<PROPAGATE, FRESH_COPY>
{
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.stats, &other.stats)
    }
}

// SAFETY: All memory comes from Global. Clones share stats and therefore compare equal.
unsafe impl<const PROPAGATE: bool, const FRESH_COPY: bool> Allocator
    for TrackingAlloc<PROPAGATE, FRESH_COPY>
{
    const PROPAGATE_ON_COPY_ASSIGNMENT: bool = PROPAGATE;
    const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = PROPAGATE;

    fn select_on_copy(&self) -> Self {
        if FRESH_COPY { TrackingAlloc::new() } else { self.clone() }
    }

    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        match self.stats.budget.get() {
            Some(0) => return Err(AllocError { layout }),
            Some(left) => self.stats.budget.set(Some(left - 1)),
            None => {},
        }

        let ptr = Global.allocate(layout)?;
        self.stats.live.set(self.stats.live.get() + 1);
        self.stats.total.set(self.stats.total.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.stats.live.set(self.stats.live.get() - 1);
        // SAFETY: ptr was allocated by Global with the same layout.
        unsafe { Global.deallocate(ptr, layout) }
    }

    unsafe fn construct<T>(&self, slot: NonNull<MaybeUninit<T>>, value: T) {
        self.stats.constructed.set(self.stats.constructed.get() + 1);
        // SAFETY: The caller guarantees that slot is valid for writes.
        unsafe { slot.write(MaybeUninit::new(value)) }
    }

    unsafe fn destroy<T>(&self, slot: NonNull<MaybeUninit<T>>) {
        self.stats.destroyed.set(self.stats.destroyed.get() + 1);
        // SAFETY: The caller guarantees that slot is initialized and ready to drop.
        unsafe { ptr::drop_in_place(slot.cast::<T>().as_ptr()) }
    }
}
