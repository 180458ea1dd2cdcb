//! A module containing [`Deque`] and associated types.
//!
//! Other than the Deque itself, this includes [`Cursor`] and [`CursorMut`] for random-access
//! traversal, the [`Iter`], [`IterMut`] and [`IntoIter`] iterators, and [`EmplaceError`] for
//! failed element construction.
//!
//! [`Deque`] is also re-exported under the parent module.

mod bucket;
mod cursor;
mod deque;
mod error;
mod iter;
mod range;
mod tests;

pub(crate) use bucket::*;
pub use cursor::*;
pub use deque::*;
pub use error::*;
pub use iter::*;
pub use range::BUCKET_LEN;
pub(crate) use range::*;
