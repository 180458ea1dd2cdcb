//! Chunked collection types, which store their elements in fixed-size buckets rather than one
//! contiguous allocation. Currently this is only [`Deque`].
#![warn(missing_docs)]

pub mod deque;

#[doc(inline)]
pub use deque::Deque;
