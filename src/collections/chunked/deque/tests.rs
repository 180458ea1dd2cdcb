#![cfg(test)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::hash::{BuildHasher, RandomState};
use std::rc::Rc;

use proptest::prelude::*;
use test_case::test_case;

use super::*;
use crate::alloc::TryReserveError;
use crate::util::alloc::{CountedDrop, FallibleClone, TrackingAlloc, ZeroSizedType};
use crate::util::panic::assert_panics;

#[test]
fn test_push_pop_scenario() {
    let mut deque = Deque::new();
    for i in 1..20 {
        deque.push_back(i);
    }
    deque.push_front(0);
    for _ in 0..4 {
        deque.pop_back();
    }

    assert_eq!(deque.len(), 16);
    for i in 0..16 {
        assert_eq!(deque[i], i, "Indexing should find every element in order.");
    }
    assert!(
        deque.iter().copied().eq(0..16),
        "Forward iteration should visit every element in order."
    );
    deque.verify_buckets();
}

#[test]
fn test_failed_emplace_keeps_contents() {
    let mut deque = Deque::new();
    for i in 0..10 {
        let result = deque.try_emplace_back(|| match i {
            4 => Err("construction failed"),
            _ => Ok(i),
        });

        if i == 4 {
            assert_eq!(result, Err(EmplaceError::Construct("construction failed")));
            break;
        }
        assert_eq!(result, Ok(()));
    }

    assert_eq!(deque.len(), 4);
    assert_eq!(deque, [0, 1, 2, 3], "Elements should be unchanged by the failure.");
    deque.verify_buckets();
}

#[test]
fn test_panicking_emplace_releases_bucket() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let mut deque = Deque::from_iter_in(0..BUCKET_LEN, alloc.clone());
    let live = alloc.live();

    // The next element needs a new bucket, which has to be given back.
    assert_panics!({ deque.emplace_back(|| panic!("constructor failed")) });
    assert_panics!({ deque.emplace_front(|| panic!("constructor failed")) });

    assert_eq!(alloc.live(), live, "No bucket should leak from a failed construction.");
    assert!(deque.iter().copied().eq(0..BUCKET_LEN));
    deque.verify_buckets();

    deque.emplace_back(|| BUCKET_LEN);
    assert_eq!(deque.back(), Some(&BUCKET_LEN));
}

#[test]
fn test_failed_construction_into_empty_deque() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let mut deque: Deque<usize, _> = Deque::new_in(alloc.clone());

    assert_eq!(deque.try_emplace_front(|| Err(())), Err(EmplaceError::Construct(())));
    assert_panics!({ deque.emplace_back(|| panic!("constructor failed")) });

    assert!(deque.is_empty());
    assert_eq!(alloc.live(), 0, "The index and bucket should both be released.");
}

#[test]
fn test_allocation_failure() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let mut deque = Deque::from_iter_in(0..BUCKET_LEN, alloc.clone());
    let live = alloc.live();

    alloc.fail_after(0);
    let error = deque.try_push_back(BUCKET_LEN);
    assert!(matches!(error, Err(TryReserveError::AllocError(_))), "Growing the index should fail.");

    alloc.fail_after(1);
    let error = deque.try_push_back(BUCKET_LEN);
    assert!(matches!(error, Err(TryReserveError::AllocError(_))), "The new bucket should fail.");

    assert_eq!(alloc.live(), live);
    assert!(deque.iter().copied().eq(0..BUCKET_LEN));
    deque.verify_buckets();

    alloc.unlimited();
    deque.push_back(BUCKET_LEN);
    assert!(deque.iter().copied().eq(0..=BUCKET_LEN));

    let empty_alloc: TrackingAlloc = TrackingAlloc::new();
    empty_alloc.fail_after(1);
    let mut empty: Deque<u8, _> = Deque::new_in(empty_alloc.clone());
    assert!(empty.try_push_front(0).is_err(), "Only the index can be allocated.");
    assert_eq!(empty_alloc.live(), 0);

    empty_alloc.fail_after(2);
    let result = Deque::try_repeat_item_in(0_u8, 3 * BUCKET_LEN, empty_alloc.clone());
    assert!(result.is_err(), "Only the index and one bucket can be allocated.");
    assert_eq!(empty_alloc.live(), 0, "Bulk construction should release everything.");
}

#[test]
fn test_growth() {
    let mut deque = Deque::new();
    for i in 0..BUCKET_LEN {
        deque.push_back(i);
    }
    assert_eq!(deque.index_cap(), 1);
    assert_eq!(deque.bucket_count(), 1);

    deque.push_back(BUCKET_LEN);
    assert_eq!(deque.index_cap(), 6, "A single bucket index should grow sixfold.");
    assert_eq!(deque.bucket_count(), 2);

    for i in BUCKET_LEN + 1..3 * BUCKET_LEN + 1 {
        deque.push_back(i);
    }
    assert!(
        deque.iter().copied().eq(0..3 * BUCKET_LEN + 1),
        "Growth should preserve every element at its logical position."
    );

    for i in 1..=40 {
        deque.push_front(100 + i);
    }
    assert_eq!(deque.index_cap(), 18, "Later growth should triple the index.");
    assert_eq!(deque.len(), 3 * BUCKET_LEN + 41);
    assert_eq!(deque[40], 0);
    deque.verify_buckets();
}

#[test]
fn test_queue_drifts_through_index() {
    let mut deque = Deque::from_iter(0..10);
    let initial_cap = deque.index_cap();

    for i in 10..5000 {
        deque.push_back(i);
        assert_eq!(deque.pop_front(), Some(i - 10), "The deque should behave as a queue.");
        assert!(deque.bucket_count() <= 3, "Only buckets holding elements should be kept.");
    }

    assert!(deque.iter().copied().eq(4990..5000));
    assert!(
        deque.index_cap() > initial_cap,
        "Drifting towards the back should keep growing the index."
    );
    deque.verify_buckets();
}

#[test]
fn test_storage_released_when_empty() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let mut deque = Deque::new_in(alloc.clone());
    assert_eq!(alloc.total(), 0, "An empty deque shouldn't allocate.");

    for i in 0..20 {
        deque.push_front(i);
    }
    assert_eq!(alloc.live(), 1 + deque.bucket_count());

    while deque.len() > 1 {
        deque.pop_back();
        assert_eq!(alloc.live(), 1 + deque.bucket_count(), "Empty buckets should be freed.");
        deque.verify_buckets();
    }
    assert_eq!(deque.pop_front(), Some(19));
    assert_eq!(alloc.live(), 0, "Popping the last element should release the index.");
    assert_eq!(deque.pop_front(), None);
    assert_eq!(deque.pop_back(), None);
}

#[test]
fn test_bulk_construction_layout() {
    let deque = Deque::repeat_item(1, 20);
    assert_eq!(deque.len(), 20);
    assert_eq!(deque.index_cap(), 6);
    assert_eq!(deque.bucket_count(), 3);
    assert!(deque.iter().all(|x| *x == 1));
    deque.verify_buckets();

    let deque = Deque::<u16>::repeat_default(0);
    assert!(deque.is_empty());
    assert_eq!(deque.index_cap(), 0);
}

#[test]
fn test_front_and_back() {
    let mut deque = Deque::new();
    assert_eq!(deque.front(), None);
    assert_eq!(deque.back_mut(), None);

    deque.push_front(2);
    deque.push_front(1);
    deque.push_back(3);
    assert_eq!(deque.front(), Some(&1));
    assert_eq!(deque.back(), Some(&3));

    *deque.front_mut().unwrap() = 10;
    *deque.back_mut().unwrap() = 30;
    assert_eq!(deque, [10, 2, 30]);
}

#[test]
fn test_checked_access() {
    let mut deque = Deque::from([1, 2, 3]);

    assert_eq!(deque.at(2), &3);
    assert_eq!(deque.try_at(3), Err(IndexOutOfBounds { index: 3, len: 3 }));
    assert_eq!(deque.get(5), None);
    assert_eq!(deque.get_mut(0), Some(&mut 1));
    // SAFETY: 1 is in bounds.
    assert_eq!(unsafe { *deque.get_unchecked(1) }, 2);

    *deque.at_mut(0) = 4;
    deque[1] = 5;
    assert_eq!(deque, [4, 5, 3]);

    assert_panics!({ deque.at(3); });
    assert_panics!({ deque[10] = 0; });
    assert_panics!({ Deque::<u8>::new().at(0); });
}

#[test_case(0; "at the front")]
#[test_case(5; "in the middle")]
#[test_case(7; "at a bucket boundary")]
#[test_case(20; "at the back")]
fn test_insert(index: usize) {
    let mut deque = Deque::from_iter(0..20);
    let mut model = VecDeque::from_iter(0..20);

    deque.insert(index, 100);
    model.insert(index, 100);

    assert!(deque.iter().eq(model.iter()));
    deque.verify_buckets();
}

#[test_case(0; "at the front")]
#[test_case(7; "at a bucket boundary")]
#[test_case(19; "at the back")]
fn test_remove(index: usize) {
    let mut deque = Deque::from_iter(0..20);
    let mut model = VecDeque::from_iter(0..20);

    assert_eq!(deque.remove(index), model.remove(index).unwrap());
    assert!(deque.iter().eq(model.iter()));
    deque.verify_buckets();
}

#[test]
fn test_insert_remove_bounds() {
    let mut deque = Deque::from([1, 2]);
    assert_eq!(deque.try_insert(3, 0), Err(IndexOutOfBounds { index: 3, len: 2 }));
    assert_eq!(deque.try_remove(2), Err(IndexOutOfBounds { index: 2, len: 2 }));
    assert_panics!({ deque.insert(3, 0) });
    assert_panics!({ deque.remove(2); });
    assert_eq!(deque, [1, 2]);

    deque.swap(0, 1);
    assert_eq!(deque, [2, 1]);
    assert_eq!(deque.remove(1), 1);
    assert_eq!(deque.remove(0), 2);
    assert!(deque.is_empty());
}

#[test]
fn test_cursor_sentinels() {
    let empty = Deque::<u8>::new();
    assert!(empty.cursor_front() == empty.cursor_tail());
    assert!(empty.cursor_head() == empty.cursor_back());
    assert_eq!(empty.cursor_tail() - empty.cursor_front(), 0);
    assert_eq!(empty.cursor_front().read(), None);

    let deque = Deque::from([1, 2, 3]);
    let (head, front) = (deque.cursor_head(), deque.cursor_front());
    let (back, tail) = (deque.cursor_back(), deque.cursor_tail());

    assert_eq!(head.position(), CursorPosition::Head);
    assert_eq!(tail.position(), CursorPosition::Tail);
    assert_eq!(head.read(), None, "The head sentinel should never be read.");
    assert_eq!(tail.read(), None, "The tail sentinel should never be read.");
    assert_eq!(front.read(), Some(&1));
    assert_eq!(back.read(), Some(&3));

    assert!(head + 1 == front);
    assert!(tail - 1 == back);
    assert!(head < front && back < tail);
    assert_eq!(tail - front, 3);
    assert_eq!(head - tail, -4);
    assert_eq!((tail + 5).read(), None);
}

#[test]
fn test_cursor_traversal() {
    let mut deque = Deque::new();
    for i in 0..30 {
        deque.push_back(i);
    }
    for i in 1..10 {
        deque.push_front(-i);
    }

    let front = deque.cursor_front();
    for i in 0..deque.len() {
        let cursor = front + i as isize;
        assert_eq!(cursor.read(), deque.get(i), "Cursors should cross bucket boundaries.");
        assert_eq!(cursor.index(), Some(i));
    }

    let mut cursor = deque.cursor_tail();
    let mut reversed = Vec::new();
    while let Some(value) = cursor.move_prev().read() {
        reversed.push(*value);
    }
    assert!(reversed.into_iter().eq(deque.iter().rev().copied()));
    assert!(cursor == deque.cursor_head());
    cursor.move_prev();
    assert!(cursor == deque.cursor_head(), "Moving should stop at the head.");

    let mut cursor = deque.cursor_front();
    cursor += 10;
    assert_eq!(cursor.read(), Some(&1));
    assert_eq!(cursor.read_prev(), Some(&0));
    assert_eq!(cursor.read_next(), Some(&2));
    cursor -= 10;
    assert_eq!(cursor.read(), Some(&-9));
}

#[test]
fn test_cursor_mut() {
    let mut deque = Deque::from_iter(0..10);

    let mut cursor = deque.cursor_front_mut();
    cursor.seek(3);
    *cursor.read_mut().unwrap() = 30;
    cursor.insert(100);
    assert_eq!(cursor.read(), Some(&100));
    assert_eq!(cursor.remove(), Some(100));
    assert_eq!(cursor.read(), Some(&30));
    assert_eq!(cursor.as_cursor().index(), Some(3));

    let mut cursor = deque.cursor_tail_mut();
    assert_eq!(cursor.remove(), None);
    cursor.insert(10);
    cursor.move_next();
    assert_eq!(cursor.position(), CursorPosition::Tail);

    let mut cursor = deque.cursor_back_mut();
    cursor.seek(-20);
    cursor.insert(-1);
    assert_eq!(cursor.index(), Some(0));

    assert_eq!(deque, [-1, 0, 1, 2, 30, 4, 5, 6, 7, 8, 9, 10]);
    deque.verify_buckets();
}

#[test]
fn test_iterators() {
    let mut deque = Deque::from_iter(0..25);

    let mut iter = deque.iter();
    assert_eq!(iter.len(), 25);
    assert_eq!(iter.nth(9), Some(&9));
    assert_eq!(iter.nth_back(4), Some(&20));
    assert_eq!(iter.len(), 10);
    assert_eq!(iter.nth(20), None);
    assert_eq!(iter.next(), None);

    for value in deque.iter_mut() {
        *value *= 2;
    }
    assert!(deque.iter().copied().eq((0..25).map(|x| x * 2)));

    let mut into_iter = deque.into_iter();
    assert_eq!(into_iter.next_back(), Some(48));
    assert_eq!(into_iter.next(), Some(0));
    assert_eq!(into_iter.len(), 23);
}

#[test]
fn test_clone_independence() {
    let deque = Deque::from_iter(0..20);
    let mut copy = deque.clone();
    assert_eq!(deque, copy);

    copy[0] = 100;
    copy.push_back(20);
    assert_eq!(deque[0], 0, "Changing a copy shouldn't change the original.");
    assert_eq!(deque.len(), 20);
}

#[test]
fn test_clone_from_keeps_allocator() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let other: TrackingAlloc = TrackingAlloc::new();

    let source = Deque::from_iter_in(0..20, alloc.clone());
    let mut deque = Deque::from_iter_in(100..105, other.clone());

    deque.clone_from(&source);
    assert_eq!(deque, source);
    assert!(*deque.allocator() == other, "The allocator shouldn't propagate.");

    let mut deque = Deque::from_iter_in(100..150, other.clone());
    deque.clone_from(&source);
    assert_eq!(deque, source, "Extra elements should be dropped.");
}

#[test]
fn test_clone_from_propagates_allocator() {
    let alloc: TrackingAlloc<true> = TrackingAlloc::new();
    let other: TrackingAlloc<true> = TrackingAlloc::new();

    let source = Deque::from_iter_in(0..20, alloc.clone());
    let mut deque = Deque::from_iter_in(100..105, other.clone());

    deque.clone_from(&source);
    assert_eq!(deque, source);
    assert!(*deque.allocator() == alloc, "The allocator should propagate.");
    assert_eq!(other.live(), 0, "Old storage should be freed with the old allocator.");

    let mut source = source;
    deque[0] = 100;
    deque.push_front(-1);
    source.pop_back();
    source.push_back(50);
    assert!(source.iter().copied().eq((0..19).chain([50])), "The copy shouldn't share elements.");
    assert!(deque.iter().copied().eq([-1, 100].into_iter().chain(1..20)));

    drop(source);
    assert!(alloc.live() > 0, "The copy should still own its storage.");
    assert!(deque.iter().copied().eq([-1, 100].into_iter().chain(1..20)));
    drop(deque);
    assert_eq!(alloc.live(), 0);
}

#[test]
fn test_clone_selects_allocator() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let deque = Deque::from_iter_in(0..20, alloc.clone());
    let copy = deque.clone();
    assert!(*copy.allocator() == alloc, "By default, the copy should share the allocator.");
    drop(copy);

    let alloc: TrackingAlloc<false, true> = TrackingAlloc::new();
    let deque = Deque::from_iter_in(0..20, alloc.clone());
    let mut copy = deque.clone();
    let copy_alloc = copy.allocator().clone();
    assert!(copy_alloc != alloc, "The copy should use the allocator chosen for copies.");
    assert!(copy_alloc.live() > 0, "The copy's storage should come from its own allocator.");
    assert_eq!(copy, deque);

    copy[0] = 100;
    copy.push_front(-1);
    copy.pop_back();
    assert!(deque.iter().copied().eq(0..20), "Changing the copy shouldn't change the original.");

    drop(deque);
    assert_eq!(alloc.live(), 0, "The original should free only its own storage.");
    assert!(copy.iter().copied().eq([-1, 100].into_iter().chain(1..19)));
    drop(copy);
    assert_eq!(copy_alloc.live(), 0);
}

#[test]
fn test_panicking_clone() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let budget = Rc::new(Cell::new(usize::MAX));
    let deque =
        Deque::from_iter_in((0..20).map(|i| FallibleClone::new(i, &budget)), alloc.clone());
    let live = alloc.live();

    budget.set(10);
    assert_panics!({
        let _copy = deque.clone();
    });

    assert_eq!(alloc.live(), live, "The partial copy should be released.");
    assert_eq!(deque.len(), 20);
    assert!(deque.iter().map(|x| x.value).eq(0..20));
}

#[test]
fn test_take() {
    let mut deque = Deque::from_iter(0..10);
    let taken = deque.take();

    assert!(deque.is_empty());
    assert_eq!(deque.bucket_count(), 0);
    assert!(taken.iter().copied().eq(0..10));

    deque.push_back(1);
    assert_eq!(deque, [1], "The source should remain usable.");
}

#[test]
fn test_move_from_equal_allocators() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let mut source = Deque::from_iter_in(0..20, alloc.clone());
    let mut deque = Deque::from_iter_in(0..3, alloc.clone());
    let total = alloc.total();

    deque.move_from(&mut source);
    assert!(deque.iter().copied().eq(0..20));
    assert!(source.is_empty());
    assert_eq!(alloc.total(), total, "Storage should be stolen, not reallocated.");

    source.push_front(5);
    assert_eq!(source, [5]);
}

#[test]
fn test_move_from_unequal_allocators() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let other: TrackingAlloc = TrackingAlloc::new();
    let mut source = Deque::from_iter_in(0..20, alloc.clone());
    let mut deque = Deque::from_iter_in(100..103, other.clone());

    deque.move_from(&mut source);
    assert!(deque.iter().copied().eq(0..20));
    assert!(*deque.allocator() == other);
    assert!(source.is_empty());
    assert_eq!(alloc.live(), 0, "The source should own nothing afterwards.");
    deque.verify_buckets();
}

#[test]
fn test_move_from_propagates_allocator() {
    let alloc: TrackingAlloc<true> = TrackingAlloc::new();
    let other: TrackingAlloc<true> = TrackingAlloc::new();
    let mut source = Deque::from_iter_in(0..20, alloc.clone());
    let mut deque = Deque::from_iter_in(100..103, other.clone());

    deque.move_from(&mut source);
    assert!(deque.iter().copied().eq(0..20));
    assert!(*deque.allocator() == alloc);
    assert_eq!(other.live(), 0);
    assert!(source.is_empty());
}

#[test]
fn test_drop() {
    let drops = Rc::new(Cell::new(0));
    let mut deque = Deque::new();
    for i in 0..30 {
        deque.push_back(CountedDrop::new(i, &drops));
    }

    drop(deque.pop_front());
    drop(deque.remove(10));
    assert_eq!(drops.get(), 2);

    deque.truncate(20);
    assert_eq!(drops.get(), 10);

    drop(deque);
    assert_eq!(drops.get(), 30, "Every element should be dropped exactly once.");
}

#[test]
fn test_discarded_elements_are_destroyed() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let drops = Rc::new(Cell::new(0));
    let mut deque =
        Deque::from_iter_in((0..10).map(|i| CountedDrop::new(i, &drops)), alloc.clone());
    assert_eq!(alloc.constructed(), 10);

    drop(deque.pop_back());
    drop(deque.remove(0));
    assert_eq!(alloc.destroyed(), 0, "Removed elements are moved out, not destroyed.");
    assert_eq!(drops.get(), 2);

    deque.truncate(5);
    assert_eq!(alloc.destroyed(), 3, "Truncating should destroy through the allocator.");
    deque.clear();
    assert_eq!(alloc.destroyed(), 8, "Clearing should destroy through the allocator.");
    assert_eq!(drops.get(), 10);
    assert_eq!(alloc.live(), 0);

    deque.extend((0..10).map(|i| CountedDrop::new(i, &drops)));
    assert_eq!(alloc.constructed(), 20);
    drop(deque);
    assert_eq!(alloc.destroyed(), 18, "Dropping should destroy through the allocator.");
    assert_eq!(drops.get(), 20);
    assert_eq!(alloc.live(), 0);
}

#[test]
fn test_zst_support() {
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let mut deque = Deque::repeat_default_in(30, alloc.clone());
    assert_eq!(deque.len(), 30);
    assert_eq!(deque[29], ZeroSizedType);
    assert_eq!(alloc.live(), 1, "Only the bucket index should be allocated for a ZST.");

    deque.push_front(ZeroSizedType);
    assert_eq!(deque.pop_back(), Some(ZeroSizedType));
    assert_eq!(deque.iter().count(), 30);

    deque.clear();
    assert_eq!(alloc.live(), 0);
}

#[test]
fn test_equality_hash_and_format() {
    let deque = Deque::from([1, 2, 3]);
    let alloc: TrackingAlloc = TrackingAlloc::new();
    let other = Deque::from_iter_in([1, 2, 3], alloc);

    assert_eq!(deque, other, "Equality shouldn't depend on the allocator.");
    assert_eq!(deque, [1, 2, 3][..]);
    assert_ne!(deque, Deque::from([1, 2]));
    assert!(deque.contains(&2) && !deque.contains(&4));

    let state = RandomState::new();
    assert_eq!(state.hash_one(&deque), state.hash_one(Deque::from_iter(1..4)));

    assert_eq!(format!("{deque}"), "[1, 2, 3]");
    assert_eq!(format!("{deque:?}"), "Deque { contents: [1, 2, 3], len: 3, buckets: 1 }");
}

#[test]
fn test_extend() {
    let mut deque = Deque::from([1]);
    deque.extend([2, 3]);
    deque.extend(&[4, 5]);
    assert_eq!(deque, [1, 2, 3, 4, 5]);
}

#[derive(Debug, Clone)]
enum Op {
    PushBack(i32),
    PushFront(i32),
    PopBack,
    PopFront,
    Insert(usize, i32),
    Remove(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(Op::PushBack),
        4 => any::<i32>().prop_map(Op::PushFront),
        2 => Just(Op::PopBack),
        2 => Just(Op::PopFront),
        1 => (any::<usize>(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
        1 => any::<usize>().prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn prop_matches_vec_deque(ops in prop::collection::vec(op(), 0..300)) {
        let mut deque = Deque::new();
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Op::PushBack(value) => {
                    deque.push_back(value);
                    model.push_back(value);
                },
                Op::PushFront(value) => {
                    deque.push_front(value);
                    model.push_front(value);
                },
                Op::PopBack => {
                    prop_assert_eq!(deque.pop_back(), model.pop_back());
                },
                Op::PopFront => {
                    prop_assert_eq!(deque.pop_front(), model.pop_front());
                },
                Op::Insert(index, value) => {
                    let index = index % (model.len() + 1);
                    deque.insert(index, value);
                    model.insert(index, value);
                },
                Op::Remove(index) => {
                    if !model.is_empty() {
                        let index = index % model.len();
                        prop_assert_eq!(Some(deque.remove(index)), model.remove(index));
                    }
                },
            }
            prop_assert_eq!(deque.len(), model.len());
            prop_assert_eq!(deque.is_empty(), model.is_empty());
            deque.verify_buckets();
        }

        for (index, value) in model.iter().enumerate() {
            prop_assert_eq!(&deque[index], value);
        }

        for (index, value) in model.iter_mut().enumerate() {
            *value = value.wrapping_mul(3).wrapping_add(1);
            *deque.at_mut(index) = *value;
        }
        for (index, value) in model.iter().enumerate() {
            prop_assert_eq!(deque.at(index), value);
        }
        prop_assert!(deque.iter().eq(model.iter()));
        prop_assert!(deque.iter().rev().eq(model.iter().rev()));
        prop_assert_eq!(deque.cursor_tail() - deque.cursor_front(), model.len() as isize);
    }

    #[test]
    fn prop_cursor_offsets(len in 0_usize..100, offset in -2_isize..102) {
        let deque = Deque::from_iter(0..len);
        let cursor = deque.cursor_front() + offset;

        prop_assert_eq!(cursor - deque.cursor_front(), offset);
        let expected = usize::try_from(offset).ok().filter(|index| *index < len);
        prop_assert_eq!(cursor.read().copied(), expected);
    }
}
