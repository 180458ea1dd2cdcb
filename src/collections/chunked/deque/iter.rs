use std::fmt::{self, Debug, Formatter};
use std::iter::{FusedIterator, TrustedLen};
use std::marker::PhantomData;

use super::{BucketIndex, Deque, DequeContents, DequeState};
use crate::alloc::{Allocator, Global};

use DequeState::*;

impl<T, A: Allocator> Deque<T, A> {
    /// Returns an iterator over references to the elements of the Deque, from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        self.into_iter()
    }

    /// Returns an iterator over mutable references to the elements of the Deque, from front to
    /// back.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.into_iter()
    }

    /// Returns the shallow bucket index and the virtual range `[front, back)` that iterators
    /// traverse.
    ///
    /// # Safety
    /// The returned index can't outlive the borrow of self.
    unsafe fn raw_parts(&self) -> (BucketIndex<T>, usize, usize) {
        match &self.state {
            Empty => (BucketIndex::dangling(), 0, 0),
            Full(DequeContents { index, range }) => (
                // SAFETY: The caller guarantees that the copy isn't used after self is modified.
                unsafe { index.clone_shallow() },
                range.first,
                range.last + 1,
            ),
        }
    }
}

impl<T, A: Allocator> IntoIterator for Deque<T, A> {
    type Item = T;

    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { deque: self }
    }
}

/// An owning iterator over the elements of a [`Deque`], which pops from either end.
pub struct IntoIter<T, A: Allocator = Global> {
    pub(crate) deque: Deque<T, A>,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.deque.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.deque.len(), Some(self.deque.len()))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.deque.pop_back()
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

// SAFETY: size_hint is always exactly the length of the Deque.
unsafe impl<T, A: Allocator> TrustedLen for IntoIter<T, A> {}

impl<T: Debug, A: Allocator> Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.deque).finish()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Deque<T, A> {
    type Item = &'a T;

    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        // SAFETY: Iter borrows the Deque for 'a, so it can't be modified while the index is used.
        let (index, front, back) = unsafe { self.raw_parts() };
        Iter {
            index,
            front,
            back,
            _phantom: PhantomData,
        }
    }
}

/// An iterator over references to the elements of a [`Deque`].
///
/// Both ends are tracked as virtual indices, so [`nth`](Iterator::nth) and
/// [`nth_back`](DoubleEndedIterator::nth_back) skip in constant time.
pub struct Iter<'a, T> {
    pub(crate) index: BucketIndex<T>,
    /// The virtual index of the next element from the front.
    pub(crate) front: usize,
    /// One past the virtual index of the next element from the back.
    pub(crate) back: usize,
    pub(crate) _phantom: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: front is within the occupied range, which is borrowed for 'a.
        let value = unsafe { self.index.slot(self.front).as_ref().assume_init_ref() };
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.front = self.back;
            return None;
        }
        self.front += n;
        self.next()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: back is now within the occupied range.
        Some(unsafe { self.index.slot(self.back).as_ref().assume_init_ref() })
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.back = self.front;
            return None;
        }
        self.back -= n;
        self.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

// SAFETY: size_hint is always exactly back - front.
unsafe impl<T> TrustedLen for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            // SAFETY: The clone borrows the same Deque for the same lifetime.
            index: unsafe { self.index.clone_shallow() },
            front: self.front,
            back: self.back,
            _phantom: PhantomData,
        }
    }
}

impl<T: Debug> Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field_with(|f| f.debug_list().entries(self.clone()).finish()).finish()
    }
}

// SAFETY: Iter only hands out shared references.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
// SAFETY: As above.
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Deque<T, A> {
    type Item = &'a mut T;

    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        // SAFETY: IterMut borrows the Deque mutably for 'a, so nothing else can modify it.
        let (index, front, back) = unsafe { self.raw_parts() };
        IterMut {
            index,
            front,
            back,
            _phantom: PhantomData,
        }
    }
}

/// An iterator over mutable references to the elements of a [`Deque`].
pub struct IterMut<'a, T> {
    pub(crate) index: BucketIndex<T>,
    pub(crate) front: usize,
    pub(crate) back: usize,
    pub(crate) _phantom: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        // SAFETY: front is within the occupied range and each slot is only yielded once.
        let value = unsafe { self.index.slot(self.front).as_mut().assume_init_mut() };
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.front = self.back;
            return None;
        }
        self.front += n;
        self.next()
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: back is now within the occupied range and each slot is only yielded once.
        Some(unsafe { self.index.slot(self.back).as_mut().assume_init_mut() })
    }

    fn nth_back(&mut self, n: usize) -> Option<Self::Item> {
        if n >= self.back - self.front {
            self.back = self.front;
            return None;
        }
        self.back -= n;
        self.next_back()
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

// SAFETY: size_hint is always exactly back - front.
unsafe impl<T> TrustedLen for IterMut<'_, T> {}

// SAFETY: IterMut hands out unique references, which can be sent if T can.
unsafe impl<T: Send> Send for IterMut<'_, T> {}
// SAFETY: IterMut can't be used through a shared reference.
unsafe impl<T: Sync> Sync for IterMut<'_, T> {}
