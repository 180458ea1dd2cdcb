//! This crate is my attempt at writing a double-ended queue as an index of fixed-size buckets,
//! rather than the ring buffer used by [`VecDeque`](std::collections::VecDeque).
//!
//! # Purpose
//! As with the rest of my collections, this is a learning exercise, with no expectation for it to
//! be used in production. A bucketed deque is interesting because it has to juggle two levels of
//! allocation at once, keep growth amortized at both ends and still hand out random access that
//! crosses bucket boundaries.
//!
//! # Method
//! [`Deque`](collections::chunked::Deque) stores its elements in buckets of
//! [`BUCKET_LEN`](collections::chunked::deque::BUCKET_LEN) slots. The buckets are referenced from
//! a growable bucket index, which is recentred and tripled whenever the occupied range runs into
//! either of its ends. Only the buckets that currently hold elements are ever allocated.
//!
//! Unlike most of my other collections, the Deque is generic over an
//! [`Allocator`](alloc::Allocator), which supplies both the bucket and bucket index allocations
//! and decides how the allocator itself propagates during copy and move assignment.
//!
//! # Error Handling
//! The same rules apply here as everywhere else: methods which would be painful to handle every
//! time panic (or abort on allocation failure, as [`Vec`] does), while a `try_` counterpart
//! returns a strongly typed [`Result`] instead. Element construction can fail as well, see
//! [`Deque::try_emplace_back`](collections::chunked::Deque::try_emplace_back). Any failure leaves
//! the Deque exactly as it was before the call.
//!
//! # Dependencies
//! The library uses `derive_more` for error boilerplate and `tracing` to report structural events,
//! such as growth of the bucket index. The demo binary additionally uses `tracing-subscriber`.
#![feature(trusted_len)]
#![feature(extend_one)]
#![feature(debug_closure_helpers)]

// #![warn(missing_docs)]
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

pub mod alloc;
pub mod collections;

pub(crate) mod util;
