use derive_more::{Display, Error};

/// The error produced when an index is outside of the bounds of a collection.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("Index {index} out of bounds for collection with {len} elements!")]
pub struct IndexOutOfBounds {
    /// The index that was accessed.
    pub index: usize,
    /// The length of the collection at the time of access.
    pub len: usize,
}

/// The error produced when the memory layout of a collection would exceed [`isize::MAX`] bytes.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("Capacity overflow!")]
pub struct CapacityOverflow;
