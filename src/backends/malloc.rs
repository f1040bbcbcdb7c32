//! A thin, free-only, non-tracking back-end over `std::alloc::System`.

use core::alloc::{GlobalAlloc, Layout};
use core::mem;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::alloc::System;

use crate::backend::Backend;
use crate::error::Status;
use crate::node::NodeHandle;

const HEADER: usize = mem::size_of::<usize>();
const ALIGN: usize = mem::align_of::<usize>();

fn layout_for(total: usize) -> Layout {
    Layout::from_size_align(total, ALIGN).expect("allocation too large")
}

/// Every block carries a `usize` size header immediately before the bytes handed to the caller,
/// so `free`/`reallocate` can reconstruct the `Layout` the block was allocated with. `System`
/// requires the exact layout back on `dealloc`, unlike a real `malloc`/`free` pair.
pub struct Malloc {
    allocations: AtomicUsize,
    frees: AtomicUsize,
}

impl Malloc {
    pub fn new() -> Self {
        Self {
            allocations: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
        }
    }

    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::Relaxed)
    }

    unsafe fn header_of(ptr: NonNull<u8>) -> *mut usize {
        ptr.as_ptr().sub(HEADER).cast::<usize>()
    }
}

impl Default for Malloc {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for Malloc {
    fn allocate(&self, _node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
        let total = size.checked_add(HEADER)?;
        let raw = unsafe { System.alloc(layout_for(total)) };
        let raw = NonNull::new(raw)?;
        unsafe {
            raw.as_ptr().cast::<usize>().write(size);
        }
        self.allocations.fetch_add(1, Ordering::Relaxed);
        NonNull::new(unsafe { raw.as_ptr().add(HEADER) })
    }

    fn has_reallocate(&self) -> bool {
        true
    }

    fn reallocate(&self, _node: NodeHandle, ptr: NonNull<u8>, new_size: usize) -> Option<NonNull<u8>> {
        unsafe {
            let header = Self::header_of(ptr);
            let old_size = header.read();
            let old_total = old_size + HEADER;
            let new_total = new_size.checked_add(HEADER)?;
            let raw = System.realloc(header.cast::<u8>(), layout_for(old_total), new_total);
            let raw = NonNull::new(raw)?;
            raw.as_ptr().cast::<usize>().write(new_size);
            NonNull::new(raw.as_ptr().add(HEADER))
        }
    }

    fn has_free(&self) -> bool {
        true
    }

    fn free(&self, _node: NodeHandle, ptr: NonNull<u8>) -> Result<(), Status> {
        unsafe {
            let header = Self::header_of(ptr);
            let size = header.read();
            System.dealloc(header.cast::<u8>(), layout_for(size + HEADER));
        }
        self.frees.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{self as memsys};

    #[test]
    fn allocate_and_free_round_trip() {
        let root = memsys::NodeHandle::create(Malloc::new(), None);
        let p = memsys::allocate(root, 16).expect("allocation failed");
        unsafe { p.as_ptr().write_bytes(0xAB, 16) };
        memsys::free(root, Some(p)).expect("free failed");
    }

    #[test]
    fn destroy_frees_backing_record_and_user_allocation() {
        let root = memsys::NodeHandle::create(Malloc::new(), None);
        let p = memsys::allocate(root, 8).unwrap();
        memsys::free(root, Some(p)).unwrap();
        memsys::destroy(root);
    }
}
