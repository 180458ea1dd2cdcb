use std::convert::Infallible;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::hint;
use std::iter;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ops::{Index, IndexMut};
use std::ptr::{self, NonNull};

use derive_more::IsVariant;

use super::{
    BUCKET_LEN, Bucket, BucketIndex, Cursor, CursorMut, EmplaceError, Range, chunk_of, offset_of,
};
use crate::alloc::{Allocator, Global, TryReserveError};
#[doc(inline)]
pub use crate::util::error::IndexOutOfBounds;
use crate::util::result::{ReserveExtension, ResultExtension};

/// A double-ended queue, storing its elements in fixed-size buckets of [`BUCKET_LEN`] elements
/// which are referenced from a growable bucket index.
///
/// Unlike [`VecDeque`](std::collections::VecDeque), growing a Deque never moves its elements,
/// only the bucket handles in the index are copied. Buckets are allocated lazily as the occupied
/// range enters them and freed as soon as it leaves them, so an empty Deque owns no memory at all.
///
/// All allocations are made through the Deque's [`Allocator`], which defaults to [`Global`].
///
/// # Time Complexity
/// For this analysis of time complexity, variables are defined as follows:
/// - `n`: The number of items in the Deque.
/// - `i`: The index of the item in question.
///
/// | Method | Complexity |
/// |-|-|
/// | `len` | `O(1)` |
/// | `get` / `at` | `O(1)` |
/// | `push_front/back` | `O(1)`* |
/// | `pop_front/back` | `O(1)` |
/// | `insert` | `O(n-i)` |
/// | `remove` | `O(n-i)` |
/// | `contains` | `O(n)` |
///
/// \* When the bucket index runs out of space at either end, it is tripled and recentred, which
/// takes time proportional to the number of buckets rather than the number of elements.
///
/// # Memory
/// Element storage is proportional to `n`: at most `n / BUCKET_LEN + 2` buckets are allocated at
/// any time. The bucket index is never shrunk though, and it grows whenever the occupied range
/// reaches either of its ends, no matter how much room is left at the other end. A Deque used as
/// a queue (pushing at one end while popping at the other) drifts through the index and keeps
/// tripling it, so its index grows logarithmically with the total number of pushes rather than
/// with `n`. Every growth is still amortized `O(1)` per push.
///
/// # Iterator Invalidation
/// Rust's borrowing rules mean that no [`Iter`](super::Iter) or [`Cursor`] can observe a
/// structural change to the Deque, so element addresses moving on growth is never observable.
/// [`CursorMut`] tracks its logical position rather than a virtual index for the same reason.
pub struct Deque<T, A: Allocator = Global> {
    pub(crate) state: DequeState<T>,
    pub(crate) alloc: A,
    pub(crate) _phantom: PhantomData<T>,
}

#[derive(Default, IsVariant)]
pub(crate) enum DequeState<T> {
    #[default]
    Empty,
    Full(DequeContents<T>),
}

use DequeState::*;

/// The storage of a Deque holding at least one element. Every bucket from `range.first_chunk` to
/// `range.last_chunk` is present in `index`, every other slot of the index is empty.
pub(crate) struct DequeContents<T> {
    pub index: BucketIndex<T>,
    pub range: Range,
}

impl<T> Deque<T> {
    /// Creates a new Deque with no elements. No memory is allocated until the first push.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// let deque: Deque<u8> = Deque::new();
    /// assert_eq!(deque.len(), 0);
    /// ```
    pub const fn new() -> Deque<T> {
        Deque::new_in(Global)
    }

    /// Creates a new Deque containing `count` clones of `item`.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// let deque = Deque::repeat_item("a", 3);
    /// assert_eq!(deque, ["a", "a", "a"]);
    /// ```
    pub fn repeat_item(item: T, count: usize) -> Deque<T>
    where
        T: Clone,
    {
        Deque::repeat_item_in(item, count, Global)
    }

    /// Creates a new Deque containing `count` default values of `T`.
    pub fn repeat_default(count: usize) -> Deque<T>
    where
        T: Default,
    {
        Deque::repeat_default_in(count, Global)
    }
}

impl<T, A: Allocator> Deque<T, A> {
    /// Creates a new, empty Deque which will allocate through `alloc`.
    pub const fn new_in(alloc: A) -> Deque<T, A> {
        Deque {
            state: Empty,
            alloc,
            _phantom: PhantomData,
        }
    }

    /// Creates a new Deque containing `count` clones of `item`, allocated through `alloc`.
    ///
    /// # Panics
    /// Panics if the required capacity overflows. Allocation failures abort, see
    /// [`handle_alloc_error`](std::alloc::handle_alloc_error).
    pub fn repeat_item_in(item: T, count: usize, alloc: A) -> Deque<T, A>
    where
        T: Clone,
    {
        Deque::try_repeat_item_in(item, count, alloc).or_abort()
    }

    /// Creates a new Deque containing `count` clones of `item`, returning an [`Err`] if the
    /// required memory can't be allocated. Anything constructed so far is dropped and deallocated
    /// before returning.
    pub fn try_repeat_item_in(item: T, count: usize, alloc: A) -> Result<Deque<T, A>, TryReserveError>
    where
        T: Clone,
    {
        Deque::try_from_iter_sized_in(iter::repeat_n(item, count), alloc)
    }

    /// Creates a new Deque containing `count` default values of `T`, allocated through `alloc`.
    ///
    /// # Panics
    /// Panics if the required capacity overflows.
    pub fn repeat_default_in(count: usize, alloc: A) -> Deque<T, A>
    where
        T: Default,
    {
        Deque::try_from_iter_sized_in((0..count).map(|_| T::default()), alloc).or_abort()
    }

    /// Creates a new Deque from an iterator, allocated through `alloc`.
    ///
    /// # Panics
    /// Panics if the required capacity overflows.
    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Deque<T, A> {
        let mut deque = Deque::new_in(alloc);
        deque.extend(iter);
        deque
    }

    /// Creates a new Deque from an [`ExactSizeIterator`], sizing the bucket index up front so that
    /// it never needs to grow during construction. The first element is placed a quarter of the
    /// way into the index, leaving room at both ends.
    ///
    /// If an allocation fails (or the iterator panics), every element constructed so far is
    /// dropped and every allocation released before the failure is passed on.
    pub fn try_from_iter_sized_in<I>(iter: I, alloc: A) -> Result<Deque<T, A>, TryReserveError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let mut iter = iter.into_iter();
        let mut deque = Deque::new_in(alloc);

        let cap = (iter.len().div_ceil(BUCKET_LEN) * 2).max(1);
        let Some(first) = iter.next() else {
            return Ok(deque);
        };

        deque.try_emplace_first(cap, (cap / 4) * BUCKET_LEN, || Ok::<T, Infallible>(first))?;
        for item in iter {
            deque.try_push_back(item)?;
        }

        Ok(deque)
    }

    /// Returns the number of elements in the Deque.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// let deque = Deque::from([1, 2, 3]);
    /// assert_eq!(deque.len(), 3);
    /// ```
    pub const fn len(&self) -> usize {
        match &self.state {
            Empty => 0,
            Full(contents) => contents.range.len(),
        }
    }

    /// Returns true if the Deque contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Returns a reference to the Deque's allocator.
    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns a reference to the element at `index`, or [`None`] if it is out of bounds.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.checked_slot(index)
            .ok()
            // SAFETY: Slots within the occupied range are initialized.
            .map(|slot| unsafe { slot.as_ref().assume_init_ref() })
    }

    /// Returns a mutable reference to the element at `index`, or [`None`] if it is out of bounds.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.checked_slot(index)
            .ok()
            // SAFETY: Slots within the occupied range are initialized, and self is borrowed
            // mutably for the lifetime of the reference.
            .map(|mut slot| unsafe { slot.as_mut().assume_init_mut() })
    }

    /// Returns a reference to the element at `index`, without checking that it is in bounds.
    ///
    /// # Safety
    /// `index` must be less than [`len`](Deque::len).
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        match &self.state {
            // SAFETY: The caller guarantees that index is within the occupied range.
            Full(contents) => unsafe { contents.slot(index).as_ref().assume_init_ref() },
            // SAFETY: An empty Deque has no valid indices.
            Empty => unsafe { hint::unreachable_unchecked() },
        }
    }

    /// Returns a mutable reference to the element at `index`, without checking that it is in
    /// bounds.
    ///
    /// # Safety
    /// `index` must be less than [`len`](Deque::len).
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        match &mut self.state {
            // SAFETY: The caller guarantees that index is within the occupied range.
            Full(contents) => unsafe { contents.slot(index).as_mut().assume_init_mut() },
            // SAFETY: An empty Deque has no valid indices.
            Empty => unsafe { hint::unreachable_unchecked() },
        }
    }

    /// Returns a reference to the element at `index`, panicking if it is out of bounds.
    ///
    /// The same functionality can be achieved using the [`Index`] operator.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds of the Deque.
    pub fn at(&self, index: usize) -> &T {
        self.try_at(index).throw()
    }

    /// Returns a mutable reference to the element at `index`, panicking if it is out of bounds.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds of the Deque.
    pub fn at_mut(&mut self, index: usize) -> &mut T {
        self.try_at_mut(index).throw()
    }

    /// Returns a reference to the element at `index`, returning an [`Err`] if it is out of bounds
    /// rather than panicking.
    pub fn try_at(&self, index: usize) -> Result<&T, IndexOutOfBounds> {
        // SAFETY: Slots within the occupied range are initialized.
        self.checked_slot(index).map(|slot| unsafe { slot.as_ref().assume_init_ref() })
    }

    /// Returns a mutable reference to the element at `index`, returning an [`Err`] if it is out of
    /// bounds rather than panicking.
    pub fn try_at_mut(&mut self, index: usize) -> Result<&mut T, IndexOutOfBounds> {
        // SAFETY: Slots within the occupied range are initialized, and self is borrowed mutably.
        self.checked_slot(index).map(|mut slot| unsafe { slot.as_mut().assume_init_mut() })
    }

    /// Returns a reference to the first element, if there is one.
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a mutable reference to the first element, if there is one.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    /// Returns a reference to the last element, if there is one.
    pub fn back(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    /// Returns a mutable reference to the last element, if there is one.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.len().checked_sub(1).and_then(|index| self.get_mut(index))
    }

    /// Adds `value` to the back of the Deque.
    ///
    /// # Panics
    /// Panics if the bucket index would overflow. Allocation failures abort.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// let mut deque = Deque::new();
    /// for i in 0..10 {
    ///     deque.push_back(i);
    /// }
    /// assert_eq!(deque, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    /// ```
    pub fn push_back(&mut self, value: T) {
        self.try_push_back(value).or_abort()
    }

    /// Adds `value` to the front of the Deque.
    ///
    /// # Panics
    /// Panics if the bucket index would overflow. Allocation failures abort.
    pub fn push_front(&mut self, value: T) {
        self.try_push_front(value).or_abort()
    }

    /// Adds `value` to the back of the Deque, returning an [`Err`] if space can't be reserved for
    /// it. The Deque is left unchanged on failure and `value` is dropped.
    pub fn try_push_back(&mut self, value: T) -> Result<(), TryReserveError> {
        Ok(self.try_emplace_back(|| Ok::<T, Infallible>(value))?)
    }

    /// Adds `value` to the front of the Deque, returning an [`Err`] if space can't be reserved for
    /// it. The Deque is left unchanged on failure and `value` is dropped.
    pub fn try_push_front(&mut self, value: T) -> Result<(), TryReserveError> {
        Ok(self.try_emplace_front(|| Ok::<T, Infallible>(value))?)
    }

    /// Constructs a new element at the back of the Deque using `make`, which is only invoked once
    /// space for the element has been reserved.
    ///
    /// If `make` panics, any bucket reserved for the element is released and the Deque is left
    /// unchanged.
    ///
    /// # Panics
    /// Panics if `make` panics, or if the bucket index would overflow.
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, make: F) {
        let result: Result<(), TryReserveError> = self
            .try_emplace_back(|| Ok::<T, Infallible>(make()))
            .map_err(Into::into);
        result.or_abort()
    }

    /// Constructs a new element at the front of the Deque using `make`. See
    /// [`emplace_back`](Deque::emplace_back).
    ///
    /// # Panics
    /// Panics if `make` panics, or if the bucket index would overflow.
    pub fn emplace_front<F: FnOnce() -> T>(&mut self, make: F) {
        let result: Result<(), TryReserveError> = self
            .try_emplace_front(|| Ok::<T, Infallible>(make()))
            .map_err(Into::into);
        result.or_abort()
    }

    /// Constructs a new element at the back of the Deque using the fallible constructor `make`.
    ///
    /// Space is reserved first, which may grow the bucket index or allocate a bucket, and `make` is
    /// only invoked afterwards. If either step fails, the bucket allocated for the element (if
    /// any) is released, the Deque keeps exactly the same elements as before the call and the
    /// failure is returned.
    ///
    /// # Errors
    /// Returns [`EmplaceError::Reserve`] if space couldn't be reserved and
    /// [`EmplaceError::Construct`] if `make` failed.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// # use chunked_deque::collections::chunked::deque::EmplaceError;
    /// let mut deque = Deque::from([1, 2]);
    /// let result = deque.try_emplace_back(|| "x".parse::<i32>());
    /// assert!(matches!(result, Err(EmplaceError::Construct(_))));
    /// assert_eq!(deque, [1, 2]);
    /// ```
    pub fn try_emplace_back<E, F>(&mut self, make: F) -> Result<(), EmplaceError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match &mut self.state {
            Empty => self.try_emplace_first(1, 0, make),
            Full(contents) => contents.try_emplace_back(&self.alloc, make),
        }
    }

    /// Constructs a new element at the front of the Deque using the fallible constructor `make`.
    /// See [`try_emplace_back`](Deque::try_emplace_back).
    ///
    /// # Errors
    /// Returns [`EmplaceError::Reserve`] if space couldn't be reserved and
    /// [`EmplaceError::Construct`] if `make` failed.
    pub fn try_emplace_front<E, F>(&mut self, make: F) -> Result<(), EmplaceError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match &mut self.state {
            // Start at the end of the bucket, so that further pushes to the front fill it.
            Empty => self.try_emplace_first(1, BUCKET_LEN - 1, make),
            Full(contents) => contents.try_emplace_front(&self.alloc, make),
        }
    }

    /// Removes the last element from the Deque and returns it, if the Deque isn't empty. A bucket
    /// left empty by the removal is freed immediately.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// let mut deque = Deque::from([1, 2]);
    /// assert_eq!(deque.pop_back(), Some(2));
    /// assert_eq!(deque.pop_back(), Some(1));
    /// assert_eq!(deque.pop_back(), None);
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        let Full(contents) = &mut self.state else {
            return None;
        };

        if contents.range.len() > 1 {
            // SAFETY: contents was allocated by self.alloc and holds more than one element.
            return Some(unsafe { contents.pop_back(&self.alloc) });
        }

        self.take_single()
    }

    /// Removes the first element from the Deque and returns it, if the Deque isn't empty. A bucket
    /// left empty by the removal is freed immediately.
    pub fn pop_front(&mut self) -> Option<T> {
        let Full(contents) = &mut self.state else {
            return None;
        };

        if contents.range.len() > 1 {
            // SAFETY: contents was allocated by self.alloc and holds more than one element.
            return Some(unsafe { contents.pop_front(&self.alloc) });
        }

        self.take_single()
    }

    /// Inserts `value` at `index`, shifting all following elements one place towards the back.
    ///
    /// # Panics
    /// Panics if `index` is greater than the length of the Deque.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// let mut deque = Deque::from([0, 1, 2]);
    /// deque.insert(1, 100);
    /// deque.insert(4, 200);
    /// assert_eq!(deque, [0, 100, 1, 2, 200]);
    /// ```
    pub fn insert(&mut self, index: usize, value: T) {
        self.try_insert(index, value).throw()
    }

    /// Inserts `value` at `index`, returning an [`Err`] rather than panicking if `index` is out of
    /// bounds.
    ///
    /// The value is pushed onto the back and then swapped with its predecessor until it reaches
    /// `index`.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<(), IndexOutOfBounds> {
        let len = self.len();
        if index > len {
            return Err(IndexOutOfBounds { index, len });
        }

        self.push_back(value);
        for i in (index..len).rev() {
            self.swap(i, i + 1);
        }
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting all following elements one place
    /// towards the front.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> T {
        self.try_remove(index).throw()
    }

    /// Removes and returns the element at `index`, returning an [`Err`] rather than panicking if
    /// `index` is out of bounds.
    ///
    /// The element is swapped with its successor until it reaches the back, where it is popped.
    /// Elements are always shifted from the back, regardless of which end is closer.
    pub fn try_remove(&mut self, index: usize) -> Result<T, IndexOutOfBounds> {
        let len = self.len();
        if index >= len {
            return Err(IndexOutOfBounds { index, len });
        }

        for i in index..len - 1 {
            self.swap(i, i + 1);
        }
        // SAFETY: index < len, so the Deque isn't empty.
        Ok(unsafe { self.pop_back().unwrap_unchecked() })
    }

    /// Swaps the elements at indices `a` and `b`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        let a = self.checked_slot(a).throw();
        let b = self.checked_slot(b).throw();
        // SAFETY: Both slots are initialized and valid for reads and writes. ptr::swap allows
        // them to be the same slot.
        unsafe { ptr::swap(a.as_ptr(), b.as_ptr()) }
    }

    /// Removes elements from the back until the Deque has at most `len` elements.
    ///
    /// Elements are dropped in place through [`Allocator::destroy`].
    pub fn truncate(&mut self, len: usize) {
        while self.len() > len {
            self.destroy_back();
        }
    }

    /// Drops all elements from front to back through [`Allocator::destroy`], freeing every bucket
    /// along with the bucket index.
    pub fn clear(&mut self) {
        while self.destroy_front() {}
    }

    /// Moves all elements out of self into a new Deque which shares self's allocator, leaving
    /// self empty (and without storage) but still usable.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// let mut deque = Deque::from([1, 2, 3]);
    /// let taken = deque.take();
    /// assert!(deque.is_empty());
    /// assert_eq!(taken, [1, 2, 3]);
    /// deque.push_back(4);
    /// assert_eq!(deque, [4]);
    /// ```
    pub fn take(&mut self) -> Deque<T, A> {
        Deque {
            state: mem::take(&mut self.state),
            alloc: self.alloc.clone(),
            _phantom: PhantomData,
        }
    }

    /// Replaces the contents of self with the contents of `source`, leaving `source` empty.
    ///
    /// - If the allocator propagates on move assignment, self drops its elements, adopts
    ///   `source`'s allocator and takes its storage.
    /// - Otherwise, if both allocators are equal, self drops its elements and takes `source`'s
    ///   storage.
    /// - Otherwise, storage can't be shared, so the elements are moved one by one into self,
    ///   reusing self's existing elements and allocating through self's allocator.
    pub fn move_from(&mut self, source: &mut Deque<T, A>) {
        if A::PROPAGATE_ON_MOVE_ASSIGNMENT {
            self.clear();
            self.alloc = source.alloc.clone();
            self.state = mem::take(&mut source.state);
        } else if self.alloc == source.alloc {
            self.clear();
            self.state = mem::take(&mut source.state);
        } else {
            self.truncate(source.len());
            for element in self.iter_mut() {
                if let Some(value) = source.pop_front() {
                    *element = value;
                }
            }
            while let Some(value) = source.pop_front() {
                self.push_back(value);
            }
        }
    }

    /// Returns a [`Cursor`] pointing at the first element, or at the tail if the Deque is empty.
    pub fn cursor_front(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, 0)
    }

    /// Returns a [`Cursor`] pointing at the last element, or at the head if the Deque is empty.
    pub fn cursor_back(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.len() as isize - 1)
    }

    /// Returns a [`Cursor`] pointing at the head, the position before the first element.
    pub fn cursor_head(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, -1)
    }

    /// Returns a [`Cursor`] pointing at the tail, the position after the last element.
    pub fn cursor_tail(&self) -> Cursor<'_, T, A> {
        Cursor::new(self, self.len() as isize)
    }

    /// Returns a [`CursorMut`] pointing at the first element, or at the tail if the Deque is
    /// empty.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, A> {
        CursorMut::new(self, 0)
    }

    /// Returns a [`CursorMut`] pointing at the last element, or at the head if the Deque is empty.
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T, A> {
        let offset = self.len() as isize - 1;
        CursorMut::new(self, offset)
    }

    /// Returns a [`CursorMut`] pointing at the tail, the position after the last element.
    pub fn cursor_tail_mut(&mut self) -> CursorMut<'_, T, A> {
        let offset = self.len() as isize;
        CursorMut::new(self, offset)
    }
}

impl<T: PartialEq, A: Allocator> Deque<T, A> {
    /// Returns true if the Deque contains an element equal to `item`.
    pub fn contains(&self, item: &T) -> bool {
        self.iter().any(|element| element == item)
    }
}

impl<T: Clone, A: Allocator> Deque<T, A> {
    /// Clones the Deque, returning an [`Err`] if the copy can't be allocated. The copy uses the
    /// allocator selected by [`Allocator::select_on_copy`].
    ///
    /// If a clone panics part of the way through, the partial copy is dropped and deallocated
    /// before the panic continues, and self is never modified.
    pub fn try_clone(&self) -> Result<Deque<T, A>, TryReserveError> {
        Deque::try_from_iter_sized_in(self.iter().cloned(), self.alloc.select_on_copy())
    }
}

impl<T, A: Allocator> Deque<T, A> {
    /// Places the first element of an empty Deque at virtual index `virt` of a new bucket index
    /// with capacity `cap`.
    pub(crate) fn try_emplace_first<E, F>(
        &mut self,
        cap: usize,
        virt: usize,
        make: F,
    ) -> Result<(), EmplaceError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        debug_assert!(self.state.is_empty() && virt < cap * BUCKET_LEN);

        let reservation = Reservation::storage(&self.alloc, cap)?;
        let value = make().map_err(EmplaceError::Construct)?;

        if let (Some(bucket), Some(mut index)) = reservation.commit() {
            // SAFETY: virt is within the new index, and the bucket's slots are uninitialized.
            unsafe {
                index.set(chunk_of(virt), Some(bucket));
                self.alloc.construct(bucket.slot(offset_of(virt)), value);
            }
            self.state = Full(DequeContents {
                index,
                range: Range::single(virt),
            });
        }
        Ok(())
    }

    /// Removes the only element of a Deque, releasing its storage.
    pub(crate) fn take_single(&mut self) -> Option<T> {
        match mem::take(&mut self.state) {
            Empty => None,
            // SAFETY: contents was allocated by self.alloc.
            Full(contents) => Some(unsafe { contents.into_single(&self.alloc) }),
        }
    }

    /// Drops the last element in place, returning false if there wasn't one.
    fn destroy_back(&mut self) -> bool {
        let Full(contents) = &mut self.state else {
            return false;
        };

        if contents.range.len() > 1 {
            // SAFETY: contents was allocated by self.alloc and holds more than one element.
            unsafe { contents.destroy_back(&self.alloc) };
            return true;
        }

        self.destroy_single()
    }

    /// Drops the first element in place, returning false if there wasn't one.
    fn destroy_front(&mut self) -> bool {
        let Full(contents) = &mut self.state else {
            return false;
        };

        if contents.range.len() > 1 {
            // SAFETY: contents was allocated by self.alloc and holds more than one element.
            unsafe { contents.destroy_front(&self.alloc) };
            return true;
        }

        self.destroy_single()
    }

    /// Drops the only element of a Deque in place, releasing its storage. The state is emptied
    /// first, so a panicking drop leaves an empty Deque behind.
    fn destroy_single(&mut self) -> bool {
        match mem::take(&mut self.state) {
            Empty => false,
            Full(contents) => {
                // SAFETY: contents was allocated by self.alloc.
                unsafe { contents.destroy_single(&self.alloc) };
                true
            },
        }
    }

    /// Returns a pointer to the slot for `index`, if it is in bounds.
    pub(crate) fn checked_slot(
        &self,
        index: usize,
    ) -> Result<NonNull<MaybeUninit<T>>, IndexOutOfBounds> {
        match &self.state {
            // SAFETY: index is within the occupied range.
            Full(contents) if index < contents.range.len() => Ok(unsafe { contents.slot(index) }),
            _ => Err(IndexOutOfBounds {
                index,
                len: self.len(),
            }),
        }
    }

    /// The number of buckets currently allocated.
    pub(crate) const fn bucket_count(&self) -> usize {
        match &self.state {
            Empty => 0,
            Full(contents) => contents.range.chunks(),
        }
    }

    /// The capacity of the bucket index, or zero if there isn't one.
    #[cfg(test)]
    pub(crate) const fn index_cap(&self) -> usize {
        match &self.state {
            Empty => 0,
            Full(contents) => contents.index.cap(),
        }
    }

    /// Checks that exactly the buckets covered by the occupied range are present.
    #[cfg(test)]
    pub(crate) fn verify_buckets(&self) {
        if let Full(DequeContents { index, range }) = &self.state {
            assert!(range.first <= range.last);
            assert!(range.last < index.cap() * BUCKET_LEN);
            assert_eq!(range.first_chunk, chunk_of(range.first));
            assert_eq!(range.last_chunk, chunk_of(range.last));
            for chunk in 0..index.cap() {
                // SAFETY: chunk < cap.
                let present = unsafe { index.get(chunk) }.is_some();
                let occupied = range.first_chunk <= chunk && chunk <= range.last_chunk;
                assert_eq!(present, occupied, "bucket {chunk} present: {present}");
            }
        }
    }
}

impl<T> DequeContents<T> {
    /// Returns a pointer to the slot for the logical `index`.
    ///
    /// # Safety
    /// `index` must be less than the length of the range.
    pub(crate) unsafe fn slot(&self, index: usize) -> NonNull<MaybeUninit<T>> {
        // SAFETY: The caller guarantees index is occupied, so its bucket is present.
        unsafe { self.index.slot(self.range.virt(index)) }
    }

    fn try_emplace_back<A, E, F>(&mut self, alloc: &A, make: F) -> Result<(), EmplaceError<E>>
    where
        A: Allocator,
        F: FnOnce() -> Result<T, E>,
    {
        if self.range.is_at_back_of(self.index.cap()) {
            self.index.grow(alloc, &mut self.range)?;
        }

        let virt = self.range.last + 1;
        let reservation = Reservation::bucket(alloc, offset_of(virt) == 0)?;
        let value = make().map_err(EmplaceError::Construct)?;

        if let (Some(bucket), _) = reservation.commit() {
            // SAFETY: The index has room past last_chunk, it was grown above if it didn't.
            unsafe { self.index.set(chunk_of(virt), Some(bucket)) };
        }
        // SAFETY: The bucket for virt is present and the slot is past the occupied range, so it
        // is uninitialized.
        unsafe { alloc.construct(self.index.slot(virt), value) };
        self.range.push_back();
        Ok(())
    }

    fn try_emplace_front<A, E, F>(&mut self, alloc: &A, make: F) -> Result<(), EmplaceError<E>>
    where
        A: Allocator,
        F: FnOnce() -> Result<T, E>,
    {
        if self.range.is_at_front() {
            self.index.grow(alloc, &mut self.range)?;
        }

        let virt = self.range.first - 1;
        let reservation = Reservation::bucket(alloc, offset_of(virt) == BUCKET_LEN - 1)?;
        let value = make().map_err(EmplaceError::Construct)?;

        if let (Some(bucket), _) = reservation.commit() {
            // SAFETY: first > 0, so its predecessor's chunk is in bounds.
            unsafe { self.index.set(chunk_of(virt), Some(bucket)) };
        }
        // SAFETY: The bucket for virt is present and the slot is before the occupied range, so it
        // is uninitialized.
        unsafe { alloc.construct(self.index.slot(virt), value) };
        self.range.push_front();
        Ok(())
    }

    /// Removes the last slot from a range holding more than one element, returning the slot and
    /// the bucket it leaves empty (if any). The slot's value is still initialized, and the bucket
    /// has already been taken out of the index.
    fn detach_back(&mut self) -> (NonNull<MaybeUninit<T>>, Option<Bucket<T>>) {
        let virt = self.range.last;
        // SAFETY: last is occupied, so its bucket is present.
        let slot = unsafe { self.index.slot(virt) };

        let mut emptied = None;
        if offset_of(virt) == 0 {
            // The bucket only held this element, because first is in an earlier one.
            // SAFETY: last_chunk is in bounds.
            emptied = unsafe { self.index.set(self.range.last_chunk, None) };
        }

        self.range.pop_back();
        (slot, emptied)
    }

    /// Removes the first slot from a range holding more than one element. See
    /// [`detach_back`](DequeContents::detach_back).
    fn detach_front(&mut self) -> (NonNull<MaybeUninit<T>>, Option<Bucket<T>>) {
        let virt = self.range.first;
        // SAFETY: first is occupied, so its bucket is present.
        let slot = unsafe { self.index.slot(virt) };

        let mut emptied = None;
        if offset_of(virt) == BUCKET_LEN - 1 {
            // SAFETY: first_chunk is in bounds.
            emptied = unsafe { self.index.set(self.range.first_chunk, None) };
        }

        self.range.pop_front();
        (slot, emptied)
    }

    /// # Safety
    /// The range must hold more than one element and the storage must belong to `alloc`.
    unsafe fn pop_back<A: Allocator>(&mut self, alloc: &A) -> T {
        let (slot, emptied) = self.detach_back();
        // SAFETY: The slot was occupied and is no longer part of the range.
        unsafe { take_and_release(alloc, slot, emptied, None) }
    }

    /// # Safety
    /// The range must hold more than one element and the storage must belong to `alloc`.
    unsafe fn pop_front<A: Allocator>(&mut self, alloc: &A) -> T {
        let (slot, emptied) = self.detach_front();
        // SAFETY: The slot was occupied and is no longer part of the range.
        unsafe { take_and_release(alloc, slot, emptied, None) }
    }

    /// Drops the last element in place through [`Allocator::destroy`].
    ///
    /// # Safety
    /// The range must hold more than one element and the storage must belong to `alloc`.
    unsafe fn destroy_back<A: Allocator>(&mut self, alloc: &A) {
        let (slot, emptied) = self.detach_back();
        // SAFETY: The slot was occupied and is no longer part of the range.
        unsafe { destroy_and_release(alloc, slot, emptied, None) }
    }

    /// Drops the first element in place through [`Allocator::destroy`].
    ///
    /// # Safety
    /// The range must hold more than one element and the storage must belong to `alloc`.
    unsafe fn destroy_front<A: Allocator>(&mut self, alloc: &A) {
        let (slot, emptied) = self.detach_front();
        // SAFETY: The slot was occupied and is no longer part of the range.
        unsafe { destroy_and_release(alloc, slot, emptied, None) }
    }

    /// Splits contents holding exactly one element into its slot, bucket and index.
    fn detach_single(self) -> (NonNull<MaybeUninit<T>>, Option<Bucket<T>>, BucketIndex<T>) {
        debug_assert_eq!(self.range.len(), 1);
        // SAFETY: The only element is occupied, so its bucket is present and in bounds.
        unsafe {
            (
                self.index.slot(self.range.first),
                self.index.get(self.range.first_chunk),
                self.index,
            )
        }
    }

    /// Moves out the only element, then frees its bucket and the index.
    ///
    /// # Safety
    /// The range must hold exactly one element and the storage must belong to `alloc`.
    unsafe fn into_single<A: Allocator>(self, alloc: &A) -> T {
        let (slot, bucket, index) = self.detach_single();
        // SAFETY: The slot is initialized and nothing references the storage any more.
        unsafe { take_and_release(alloc, slot, bucket, Some(index)) }
    }

    /// Drops the only element in place, then frees its bucket and the index.
    ///
    /// # Safety
    /// The range must hold exactly one element and the storage must belong to `alloc`.
    unsafe fn destroy_single<A: Allocator>(self, alloc: &A) {
        let (slot, bucket, index) = self.detach_single();
        // SAFETY: The slot is initialized and nothing references the storage any more.
        unsafe { destroy_and_release(alloc, slot, bucket, Some(index)) }
    }
}

/// Moves the value out of `slot`, then releases the detached storage.
///
/// # Safety
/// `slot` must be initialized and the storage must belong to `alloc` and be unreachable from any
/// Deque.
unsafe fn take_and_release<T, A: Allocator>(
    alloc: &A,
    slot: NonNull<MaybeUninit<T>>,
    bucket: Option<Bucket<T>>,
    index: Option<BucketIndex<T>>,
) -> T {
    let _release = Reservation { alloc, bucket, index };
    // SAFETY: The caller guarantees the slot is initialized, the bucket is released afterwards.
    unsafe { slot.read().assume_init() }
}

/// Drops the value in `slot` through the allocator, then releases the detached storage. The
/// storage is released even if the value panics while being dropped.
///
/// # Safety
/// As for [`take_and_release`].
unsafe fn destroy_and_release<T, A: Allocator>(
    alloc: &A,
    slot: NonNull<MaybeUninit<T>>,
    bucket: Option<Bucket<T>>,
    index: Option<BucketIndex<T>>,
) {
    let _release = Reservation { alloc, bucket, index };
    // SAFETY: The caller guarantees the slot is initialized, it is never read again.
    unsafe { alloc.destroy(slot) }
}

/// Storage that is released when dropped unless it is committed. Holds the storage reserved for
/// an element that hasn't been constructed yet, so that a failing (or panicking) constructor gives
/// it back, and the storage detached along with an element that is being removed.
struct Reservation<'a, T, A: Allocator> {
    alloc: &'a A,
    bucket: Option<Bucket<T>>,
    index: Option<BucketIndex<T>>,
}

impl<'a, T, A: Allocator> Reservation<'a, T, A> {
    /// Reserves a new bucket if `needed`, otherwise nothing.
    fn bucket(alloc: &'a A, needed: bool) -> Result<Self, TryReserveError> {
        Ok(Reservation {
            alloc,
            bucket: if needed { Some(Bucket::allocate(alloc)?) } else { None },
            index: None,
        })
    }

    /// Reserves a new bucket index with `cap` slots and one bucket to go in it.
    fn storage(alloc: &'a A, cap: usize) -> Result<Self, TryReserveError> {
        let mut reservation = Reservation {
            alloc,
            bucket: None,
            index: Some(BucketIndex::allocate(alloc, cap)?),
        };
        // If this fails, the reservation releases the index on drop.
        reservation.bucket = Some(Bucket::allocate(alloc)?);
        Ok(reservation)
    }

    /// Hands over the reserved storage, which is no longer released on drop.
    fn commit(mut self) -> (Option<Bucket<T>>, Option<BucketIndex<T>>) {
        (self.bucket.take(), self.index.take())
    }
}

impl<T, A: Allocator> Drop for Reservation<'_, T, A> {
    fn drop(&mut self) {
        // SAFETY: Both were allocated by alloc, and neither is referenced from a Deque.
        unsafe {
            if let Some(bucket) = self.bucket.take() {
                bucket.release(self.alloc);
            }
            if let Some(index) = self.index.take() {
                index.release(self.alloc);
            }
        }
    }
}

impl<T, A: Allocator> Index<usize> for Deque<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.at(index)
    }
}

impl<T, A: Allocator> IndexMut<usize> for Deque<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.at_mut(index)
    }
}

impl<T, A: Allocator> Extend<T> for Deque<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }

    fn extend_one(&mut self, item: T) {
        self.push_back(item);
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for Deque<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(*item);
        }
    }

    fn extend_one(&mut self, item: &'a T) {
        self.push_back(*item);
    }
}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Deque::from_iter_in(iter, Global)
    }
}

impl<T, const N: usize> From<[T; N]> for Deque<T> {
    fn from(value: [T; N]) -> Self {
        Deque::try_from_iter_sized_in(value, Global).or_abort()
    }
}

impl<T, A: Allocator + Default> Default for Deque<T, A> {
    fn default() -> Self {
        Deque::new_in(A::default())
    }
}

impl<T, A: Allocator> Drop for Deque<T, A> {
    fn drop(&mut self) {
        // Each bucket is freed as it empties and the index with the last element.
        self.clear();
    }
}

impl<T: Clone, A: Allocator> Clone for Deque<T, A> {
    fn clone(&self) -> Self {
        self.try_clone().or_abort()
    }

    /// Copy assignment. If the allocator propagates on copy assignment, a complete copy using
    /// `source`'s allocator is built first and then swapped in, so a panicking clone leaves self
    /// untouched. Otherwise, self's existing elements and buckets are reused: extra elements are
    /// popped, shared positions are assigned with [`Clone::clone_from`] and the rest are pushed.
    fn clone_from(&mut self, source: &Self) {
        if A::PROPAGATE_ON_COPY_ASSIGNMENT {
            let mut copy =
                Deque::try_from_iter_sized_in(source.iter().cloned(), source.alloc.clone())
                    .or_abort();
            mem::swap(self, &mut copy);
        } else {
            self.truncate(source.len());
            for (element, item) in self.iter_mut().zip(source.iter()) {
                element.clone_from(item);
            }
            for item in source.iter().skip(self.len()) {
                self.push_back(item.clone());
            }
        }
    }
}

impl<T: PartialEq<U>, U, A: Allocator, B: Allocator> PartialEq<Deque<U, B>> for Deque<T, A> {
    fn eq(&self, other: &Deque<U, B>) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: PartialEq<U>, U, A: Allocator> PartialEq<[U]> for Deque<T, A> {
    fn eq(&self, other: &[U]) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: PartialEq<U>, U, A: Allocator, const N: usize> PartialEq<[U; N]> for Deque<T, A> {
    fn eq(&self, other: &[U; N]) -> bool {
        *self == other[..]
    }
}

impl<T: Eq, A: Allocator> Eq for Deque<T, A> {}

impl<T: Hash, A: Allocator> Hash for Deque<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self.iter() {
            element.hash(state);
        }
    }
}

// SAFETY: The Deque uniquely owns its buckets, so it can be sent when both its elements and its
// allocator can be.
unsafe impl<T: Send, A: Allocator + Send> Send for Deque<T, A> {}
// SAFETY: Deque's safe API obeys all rules of the borrow checker, so no interior mutability occurs.
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Deque<T, A> {}

impl<T: Debug, A: Allocator> Debug for Deque<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deque")
            .field_with("contents", |f| f.debug_list().entries(self.iter()).finish())
            .field("len", &self.len())
            .field("buckets", &self.bucket_count())
            .finish()
    }
}

impl<T: Debug, A: Allocator> Display for Deque<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
