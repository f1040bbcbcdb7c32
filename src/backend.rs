//! The allocator vtable (C1), realized as a Rust trait.
//!
//! A back-end implements [`Backend`] and supplies only the operations it actually has; presence
//! is communicated through a paired `has_*` capability query rather than a null function pointer,
//! following the same shape as `std::alloc::GlobalAlloc::alloc_zeroed` (default fallback to
//! `alloc` plus zero-fill) and `std::io::Read::is_read_vectored` (a capability flag paired with
//! an operation that is only meaningful when the flag is set). The engine (`lifecycle`, `facade`)
//! always consults the capability query before calling the corresponding operation, so a method's
//! default body is never reached unless a back-end advertises the capability without actually
//! overriding the operation. That is a programmer error, not a runtime one.

use crate::NodeHandle;
use crate::error::Status;
use core::ptr::NonNull;

/// A concrete allocation strategy pluggable into the hierarchical memory system.
///
/// Every back-end must provide `allocate`; all other operations are optional and default to
/// "not supported".
pub trait Backend: 'static {
    /// Allocates `size` bytes, or returns `None` on exhaustion. Never called with `size == 0`;
    /// the [`crate::facade`] filters that case out before dispatch.
    fn allocate(&self, node: NodeHandle, size: usize) -> Option<NonNull<u8>>;

    /// Whether this back-end supplies a dedicated `zero_allocate`. When `false`, the facade
    /// emulates zeroing via `allocate` plus an explicit zero-fill.
    fn has_zero_allocate(&self) -> bool {
        false
    }

    /// Allocates `size` zeroed bytes. Only ever called when `has_zero_allocate` is `true`.
    fn zero_allocate(&self, node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
        let _ = (node, size);
        None
    }

    /// Whether this back-end supplies `reallocate`.
    fn has_reallocate(&self) -> bool {
        false
    }

    /// Resizes a previously allocated block in place or by moving it. Only ever called when
    /// `has_reallocate` is `true`, with `ptr` non-null and `new_size` non-zero (the facade
    /// pre-handles both edge cases).
    fn reallocate(&self, node: NodeHandle, ptr: NonNull<u8>, new_size: usize) -> Option<NonNull<u8>> {
        let _ = (node, ptr, new_size);
        None
    }

    /// Whether this back-end supplies per-pointer `free`. Absent means "reclaimed only on
    /// reset/destroy of a tracking ancestor".
    fn has_free(&self) -> bool {
        false
    }

    /// Releases a single block previously returned by `allocate`/`zero_allocate`/`reallocate`.
    /// Only ever called when `has_free` is `true`.
    fn free(&self, node: NodeHandle, ptr: NonNull<u8>) -> Result<(), Status> {
        let _ = (node, ptr);
        Ok(())
    }

    /// Whether this back-end is *tracking*: able to reclaim an entire subtree's storage in bulk.
    /// A tracking back-end must also report `has_destroy() == true` (invariant 3, §3).
    fn has_reset(&self) -> bool {
        false
    }

    /// Destroys all of this node's children, discards its cleanup records, and reclaims every
    /// allocation drawn from it, but preserves the node itself. Only ever called when
    /// `has_reset` is `true`.
    fn reset(&self, node: NodeHandle) -> Result<(), Status> {
        let _ = node;
        Ok(())
    }

    /// Whether this back-end wants a `pre_destroy` notification.
    fn has_pre_destroy(&self) -> bool {
        false
    }

    /// Fired after a node's cleanups have run and its children have been fully torn down, but
    /// before storage reclamation. Only ever called when `has_pre_destroy` is `true`.
    fn pre_destroy(&self, node: NodeHandle) {
        let _ = node;
    }

    /// Whether this back-end supplies `destroy`. A back-end that does must also report
    /// `has_reset() == true` (invariant 3, §3); conversely a tracking back-end must supply this.
    fn has_destroy(&self) -> bool {
        false
    }

    /// Reclaims this node's own bulk storage (e.g. drops an arena). The node's own bookkeeping
    /// record is reclaimed by the framework separately and unconditionally. Only ever called when
    /// `has_destroy` is `true`.
    fn destroy(&self, node: NodeHandle) {
        let _ = node;
    }

    /// Acquires a critical section around `node`. A no-op unless overridden.
    fn lock(&self, node: NodeHandle) {
        let _ = node;
    }

    /// Releases a critical section around `node`. A no-op unless overridden.
    fn unlock(&self, node: NodeHandle) {
        let _ = node;
    }
}
