use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use std::ops::{Add, AddAssign, Sub, SubAssign};

use derive_more::IsVariant;

use super::{Deque, DequeState};
use crate::alloc::{Allocator, Global};

/// The position of a cursor relative to the elements of a [`Deque`].
///
/// A cursor can point at any element, or at one of two sentinel positions: the head, which comes
/// before the first element, and the tail, which comes after the last. Cursors that are moved
/// further than that (using arithmetic) report the nearest sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IsVariant)]
pub enum CursorPosition {
    /// Before the first element.
    Head,
    /// At the element with the contained index.
    Element(usize),
    /// After the last element.
    Tail,
}

impl CursorPosition {
    const fn from_offset(offset: isize, len: usize) -> CursorPosition {
        if offset < 0 {
            CursorPosition::Head
        } else if offset as usize >= len {
            CursorPosition::Tail
        } else {
            CursorPosition::Element(offset as usize)
        }
    }
}

/// A read-only random-access cursor over a [`Deque`]. See [`Deque::cursor_front`],
/// [`Deque::cursor_back`], [`Deque::cursor_head`] and [`Deque::cursor_tail`] to create one.
///
/// A Cursor stores the virtual index it points at, so moving it is plain arithmetic and two
/// Cursors over the same Deque can be compared or subtracted. The referenced slot is only computed
/// when the Cursor is read, which makes the head and tail sentinels safe to hold: reading them
/// produces [`None`].
///
/// # Examples
/// ```
/// # use chunked_deque::collections::chunked::Deque;
/// let deque = Deque::from([1, 2, 3, 4]);
/// let front = deque.cursor_front();
/// let tail = deque.cursor_tail();
///
/// assert_eq!(tail - front, 4);
/// assert_eq!((front + 2).read(), Some(&3));
/// assert_eq!(tail.read(), None);
/// assert_eq!((tail - 1).read(), Some(&4));
/// ```
pub struct Cursor<'a, T, A: Allocator = Global> {
    pub(crate) deque: &'a Deque<T, A>,
    /// The virtual index of the position, which may be outside of the occupied range.
    pub(crate) pos: isize,
    /// The virtual index of the first element, or zero for an empty Deque.
    pub(crate) front: isize,
}

impl<'a, T, A: Allocator> Cursor<'a, T, A> {
    /// Creates a Cursor at the logical `offset`, where -1 is the head and `len` is the tail.
    pub(crate) fn new(deque: &'a Deque<T, A>, offset: isize) -> Cursor<'a, T, A> {
        let front = match &deque.state {
            DequeState::Empty => 0,
            DequeState::Full(contents) => contents.range.first as isize,
        };

        Cursor {
            deque,
            pos: front + offset,
            front,
        }
    }

    /// Returns the offset of the Cursor from the first element. The head has an offset of -1 and
    /// the tail an offset equal to the length of the Deque.
    pub const fn offset(&self) -> isize {
        self.pos - self.front
    }

    /// Returns the [`CursorPosition`] of the Cursor.
    pub const fn position(&self) -> CursorPosition {
        CursorPosition::from_offset(self.offset(), self.deque.len())
    }

    /// Returns the index of the element the Cursor points at, or [`None`] for a sentinel.
    pub const fn index(&self) -> Option<usize> {
        match self.position() {
            CursorPosition::Element(index) => Some(index),
            _ => None,
        }
    }

    /// Returns a reference to the element at the Cursor's position, or [`None`] if it doesn't
    /// point at an element.
    pub fn read(&self) -> Option<&'a T> {
        self.index().and_then(|index| self.deque.get(index))
    }

    /// Returns a reference to the element after the Cursor's position, if there is one.
    pub fn read_next(&self) -> Option<&'a T> {
        (*self + 1).read()
    }

    /// Returns a reference to the element before the Cursor's position, if there is one.
    pub fn read_prev(&self) -> Option<&'a T> {
        (*self - 1).read()
    }

    /// Moves the Cursor to the next position, stopping at the tail.
    pub fn move_next(&mut self) -> &mut Self {
        if !self.position().is_tail() {
            self.pos += 1;
        }
        self
    }

    /// Moves the Cursor to the previous position, stopping at the head.
    pub fn move_prev(&mut self) -> &mut Self {
        if !self.position().is_head() {
            self.pos -= 1;
        }
        self
    }

    /// Returns the Deque the Cursor traverses.
    pub const fn deque(&self) -> &'a Deque<T, A> {
        self.deque
    }
}

impl<T, A: Allocator> Clone for Cursor<'_, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: Allocator> Copy for Cursor<'_, T, A> {}

impl<T, A: Allocator> Add<isize> for Cursor<'_, T, A> {
    type Output = Self;

    fn add(mut self, rhs: isize) -> Self::Output {
        self.pos += rhs;
        self
    }
}

impl<T, A: Allocator> Sub<isize> for Cursor<'_, T, A> {
    type Output = Self;

    fn sub(mut self, rhs: isize) -> Self::Output {
        self.pos -= rhs;
        self
    }
}

impl<T, A: Allocator> AddAssign<isize> for Cursor<'_, T, A> {
    fn add_assign(&mut self, rhs: isize) {
        self.pos += rhs;
    }
}

impl<T, A: Allocator> SubAssign<isize> for Cursor<'_, T, A> {
    fn sub_assign(&mut self, rhs: isize) {
        self.pos -= rhs;
    }
}

/// The signed distance between two Cursors over the same Deque.
impl<T, A: Allocator> Sub for Cursor<'_, T, A> {
    type Output = isize;

    fn sub(self, rhs: Self) -> Self::Output {
        self.pos - rhs.pos
    }
}

impl<T, A: Allocator> PartialEq for Cursor<'_, T, A> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl<T, A: Allocator> Eq for Cursor<'_, T, A> {}

impl<T, A: Allocator> PartialOrd for Cursor<'_, T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T, A: Allocator> Ord for Cursor<'_, T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pos.cmp(&other.pos)
    }
}

impl<T: Debug, A: Allocator> Debug for Cursor<'_, T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("position", &self.position())
            .field("value", &self.read())
            .finish()
    }
}

/// A cursor over a [`Deque`] which can also modify it. See [`Deque::cursor_front_mut`],
/// [`Deque::cursor_back_mut`] and [`Deque::cursor_tail_mut`] to create one.
///
/// Inserting can grow and recentre the bucket index, so unlike [`Cursor`], a CursorMut tracks its
/// logical offset rather than a virtual index.
pub struct CursorMut<'a, T, A: Allocator = Global> {
    pub(crate) deque: &'a mut Deque<T, A>,
    pub(crate) offset: isize,
}

impl<'a, T, A: Allocator> CursorMut<'a, T, A> {
    pub(crate) fn new(deque: &'a mut Deque<T, A>, offset: isize) -> CursorMut<'a, T, A> {
        CursorMut { deque, offset }
    }

    /// Returns the offset of the CursorMut from the first element. The head has an offset of -1
    /// and the tail an offset equal to the length of the Deque.
    pub const fn offset(&self) -> isize {
        self.offset
    }

    /// Returns the [`CursorPosition`] of the CursorMut.
    pub const fn position(&self) -> CursorPosition {
        CursorPosition::from_offset(self.offset, self.deque.len())
    }

    /// Returns the index of the element the CursorMut points at, or [`None`] for a sentinel.
    pub const fn index(&self) -> Option<usize> {
        match self.position() {
            CursorPosition::Element(index) => Some(index),
            _ => None,
        }
    }

    /// Returns a reference to the current element, if there is one.
    pub fn read(&self) -> Option<&T> {
        self.index().and_then(|index| self.deque.get(index))
    }

    /// Returns a mutable reference to the current element, if there is one.
    ///
    /// # Examples
    /// ```
    /// # use chunked_deque::collections::chunked::Deque;
    /// let mut deque = Deque::from([1, 2, 3]);
    /// let mut cursor = deque.cursor_front_mut();
    /// cursor.move_next();
    /// if let Some(value) = cursor.read_mut() {
    ///     *value *= 10;
    /// }
    /// assert_eq!(cursor.index(), Some(1));
    ///
    /// assert_eq!(deque, Deque::from([1, 20, 3]));
    /// ```
    pub fn read_mut(&mut self) -> Option<&mut T> {
        self.index().and_then(|index| self.deque.get_mut(index))
    }

    /// Moves the CursorMut to the next position, stopping at the tail.
    pub fn move_next(&mut self) -> &mut Self {
        if !self.position().is_tail() {
            self.offset += 1;
        }
        self
    }

    /// Moves the CursorMut to the previous position, stopping at the head.
    pub fn move_prev(&mut self) -> &mut Self {
        if !self.position().is_head() {
            self.offset -= 1;
        }
        self
    }

    /// Moves the CursorMut by `by` positions, which may take it past either sentinel.
    pub fn seek(&mut self, by: isize) -> &mut Self {
        self.offset += by;
        self
    }

    /// Inserts `value` before the current position and points the CursorMut at it. From the head,
    /// this is the same as [`Deque::push_front`], from the tail [`Deque::push_back`].
    ///
    /// # Panics
    /// Panics if the bucket index would overflow.
    pub fn insert(&mut self, value: T) {
        let index = match self.position() {
            CursorPosition::Head => 0,
            CursorPosition::Element(index) => index,
            CursorPosition::Tail => self.deque.len(),
        };

        if index == 0 {
            self.deque.push_front(value);
        } else {
            self.deque.insert(index, value);
        }
        self.offset = index as isize;
    }

    /// Removes the element at the current position and returns it, leaving the CursorMut pointing
    /// at the following element (or the tail). Returns [`None`] at a sentinel.
    pub fn remove(&mut self) -> Option<T> {
        let index = self.index()?;
        Some(self.deque.remove(index))
    }

    /// Returns a read-only [`Cursor`] at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, T, A> {
        Cursor::new(&*self.deque, self.offset)
    }
}

impl<T: Debug, A: Allocator> Debug for CursorMut<'_, T, A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("position", &self.position())
            .field("value", &self.read())
            .finish()
    }
}
