//! The Allocation Facade (C5): public allocate/zero_allocate/reallocate/free entry points with
//! uniform edge-case handling applied before vtable dispatch.

use core::ptr;
use core::ptr::NonNull;

use crate::error::Status;
use crate::node::NodeHandle;

/// Allocates `size` bytes from `node`. Returns `None` for `size == 0` without dispatching to the
/// back-end at all.
pub fn allocate(node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
        return None;
    }
    let inner = unsafe { &*node.as_ptr() };
    inner.backend.allocate(node, size)
}

/// Allocates `size` zeroed bytes from `node`. Returns `None` for `size == 0`. Dispatches to the
/// back-end's `zero_allocate` when available, otherwise emulates it with `allocate` plus an
/// explicit zero-fill.
pub fn zero_allocate(node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
        return None;
    }
    let inner = unsafe { &*node.as_ptr() };
    if inner.backend.has_zero_allocate() {
        inner.backend.zero_allocate(node, size)
    } else {
        let ptr = inner.backend.allocate(node, size)?;
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };
        Some(ptr)
    }
}

/// Resizes `ptr` (previously returned by this facade for `node`) to `new_size` bytes.
///
/// `reallocate(node, None, n)` behaves as `allocate(node, n)`; `reallocate(node, Some(p), 0)`
/// frees `p` and returns `None`. Otherwise dispatches to the back-end's `reallocate`, which is
/// only ever called with a non-null pointer and a non-zero size.
pub fn reallocate(node: NodeHandle, ptr: Option<NonNull<u8>>, new_size: usize) -> Option<NonNull<u8>> {
    match ptr {
        None => allocate(node, new_size),
        Some(p) if new_size == 0 => {
            let _ = free(node, Some(p));
            None
        }
        Some(p) => {
            let inner = unsafe { &*node.as_ptr() };
            if inner.backend.has_reallocate() {
                inner.backend.reallocate(node, p, new_size)
            } else {
                None
            }
        }
    }
}

/// Releases `ptr`, previously returned by this facade for `node`.
///
/// Fails with `InvalidArgument` for a `None` pointer. When the back-end has no `free`, this is a
/// no-op that succeeds: the memory will be reclaimed in bulk by a tracking ancestor instead.
pub fn free(node: NodeHandle, ptr: Option<NonNull<u8>>) -> Result<(), Status> {
    let ptr = ptr.ok_or(Status::InvalidArgument)?;
    let inner = unsafe { &*node.as_ptr() };
    if inner.backend.has_free() {
        inner.backend.free(node, ptr)
    } else {
        Ok(())
    }
}
