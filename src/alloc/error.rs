use std::alloc::Layout;

use derive_more::{Display, Error, From, IsVariant};

#[doc(inline)]
pub use crate::util::error::CapacityOverflow;

/// The error produced when an [`Allocator`](super::Allocator) is unable to provide memory for the
/// requested layout.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("memory allocation of {} bytes failed", layout.size())]
pub struct AllocError {
    /// The layout that couldn't be allocated.
    pub layout: Layout,
}

/// The error produced when a collection is unable to reserve space for more elements.
#[derive(Debug, Display, Error, From, IsVariant, Clone, Copy, PartialEq, Eq)]
pub enum TryReserveError {
    /// The required capacity can't be represented by the memory layout of the collection.
    CapacityOverflow(CapacityOverflow),
    /// The allocator failed to provide the requested memory.
    AllocError(AllocError),
}
