//! # Temporary Allocations
//!
//! Untyped scratch allocations for driver-internal buffers, freed by
//! pointer alone. The block size lives in a small header in front of the
//! returned pointer.

use alloc::alloc::{alloc, dealloc, Layout};
use core::ptr::NonNull;

/// Header in front of every block; also the alignment of returned pointers
const HEADER: usize = 16;

fn layout_for(size: usize) -> Option<Layout> {
    let total = size.checked_add(HEADER)?;
    Layout::from_size_align(total, HEADER).ok()
}

/// Allocate `size` bytes, 16-byte aligned. `None` when the heap is
/// exhausted or the size overflows.
pub fn allocate(size: usize) -> Option<NonNull<u8>> {
    let layout = layout_for(size)?;
    // SAFETY: layout has non-zero size (at least HEADER)
    let base = unsafe { alloc(layout) };
    if base.is_null() {
        return None;
    }
    // SAFETY: the block is at least HEADER bytes and HEADER-aligned
    unsafe {
        base.cast::<usize>().write(layout.size());
        NonNull::new(base.add(HEADER))
    }
}

/// Release a block returned by [`allocate`].
///
/// # Safety
///
/// `ptr` must come from [`allocate`] and must not have been freed already.
pub unsafe fn free(ptr: NonNull<u8>) {
    // SAFETY: caller guarantees ptr is HEADER bytes past an allocate() base
    unsafe {
        let base = ptr.as_ptr().sub(HEADER);
        let total = base.cast::<usize>().read();
        let layout = Layout::from_size_align_unchecked(total, HEADER);
        dealloc(base, layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_free() {
        let block = allocate(100).unwrap();
        assert_eq!(block.as_ptr() as usize % HEADER, 0);
        unsafe {
            core::ptr::write_bytes(block.as_ptr(), 0xAB, 100);
            assert_eq!(*block.as_ptr().add(99), 0xAB);
            free(block);
        }
    }

    #[test]
    fn test_zero_size() {
        let block = allocate(0).unwrap();
        unsafe { free(block) };
    }

    #[test]
    fn test_overflowing_size() {
        assert!(allocate(usize::MAX).is_none());
    }
}
