use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use super::{AllocError, Allocator};

/// The global memory allocator, as registered with `#[global_allocator]` (or the system allocator
/// by default).
///
/// Global is a zero-sized type, so all instances compare equal and it never propagates on
/// assignment. It is the default allocator for [`Deque`](crate::collections::chunked::Deque).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Global;

// SAFETY: Memory is provided by the global allocator, which upholds the same guarantees. Zero-sized
// layouts are handed a dangling, well-aligned pointer rather than an allocation.
unsafe impl Allocator for Global {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            // A non-zero alignment is a non-null address.
            return NonNull::new(ptr::without_provenance_mut(layout.align())).ok_or(AllocError {
                layout,
            });
        }

        // SAFETY: Zero-sized layouts have been guarded against.
        NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(AllocError { layout })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            // SAFETY: The caller guarantees that ptr was returned by allocate with this layout,
            // which is only ever backed by alloc::alloc for non-zero sizes.
            unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
        }
    }
}
