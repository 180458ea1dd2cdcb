//! Collection types.
//!
//! # Purpose
//! I wrote these types to learn about the data structures themselves, but also concepts such as
//! pointers, allocators, iterators and exception safety (or rather, its Rust equivalent).

pub mod chunked;
