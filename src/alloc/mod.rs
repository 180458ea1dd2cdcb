//! The allocator capability consumed by [`Deque`](crate::collections::chunked::Deque).
//!
//! [`std::alloc::Allocator`] is still unstable and has no notion of how an allocator propagates
//! between containers, so this module defines its own [`Allocator`] trait, along with [`Global`],
//! a thin wrapper around the global allocator.
#![warn(missing_docs)]

mod allocator;
mod error;
mod global;

pub use allocator::*;
pub use error::*;
pub use global::*;
