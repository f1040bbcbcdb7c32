//! A tracking, arena-backed pool. No per-pointer `free`; reclaims in bulk on `reset`/`destroy`.

use core::alloc::Layout;
use core::mem;
use core::ptr::NonNull;
use std::cell::RefCell;

use bumpalo::Bump;

use crate::backend::Backend;
use crate::error::Status;
use crate::node::NodeHandle;

/// Wraps a [`bumpalo::Bump`] behind a `RefCell`: `Backend::reset` needs to mutate the arena
/// through a shared `&self`, the same way every other `Backend` method does.
pub struct BumpPool {
    arena: RefCell<Bump>,
}

impl BumpPool {
    pub fn new() -> Self {
        Self {
            arena: RefCell::new(Bump::new()),
        }
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            arena: RefCell::new(Bump::with_capacity(bytes)),
        }
    }
}

impl Default for BumpPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for BumpPool {
    fn allocate(&self, _node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
        let layout = Layout::from_size_align(size, mem::align_of::<usize>()).ok()?;
        self.arena.borrow().try_alloc_layout(layout).ok()
    }

    fn has_reset(&self) -> bool {
        true
    }

    /// `Bump::reset` keeps the arena's largest chunk around for reuse instead of releasing it back
    /// to the allocator and growing from scratch on the next allocation.
    fn reset(&self, _node: NodeHandle) -> Result<(), Status> {
        self.arena.borrow_mut().reset();
        Ok(())
    }

    fn has_destroy(&self) -> bool {
        true
    }

    // The arena's chunks are released when `self.arena` drops along with this `Backend`; no
    // explicit action is needed here beyond satisfying the reset/destroy capability pairing
    // (invariant 3, §3).
    fn destroy(&self, _node: NodeHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{self as memsys};
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn reset_reclaims_subtree_and_runs_cleanups_in_order() {
        static ORDER: AtomicUsize = AtomicUsize::new(0);
        static FIRST: AtomicUsize = AtomicUsize::new(0);
        static SECOND: AtomicUsize = AtomicUsize::new(0);

        fn mark_first(_: *mut ()) -> Result<(), Status> {
            FIRST.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            Ok(())
        }
        fn mark_second(_: *mut ()) -> Result<(), Status> {
            SECOND.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
            Ok(())
        }

        let root = memsys::NodeHandle::create(BumpPool::new(), None);
        memsys::cleanup_register(root, core::ptr::null_mut(), mark_first).unwrap();
        memsys::cleanup_register(root, core::ptr::null_mut(), mark_second).unwrap();

        memsys::reset(root).unwrap();

        // LIFO: the most recently registered cleanup fires first.
        assert!(SECOND.load(Ordering::SeqCst) < FIRST.load(Ordering::SeqCst));
    }

    #[test]
    fn allocate_carves_from_growing_arena() {
        let root = memsys::NodeHandle::create(BumpPool::new(), None);
        let a = memsys::allocate(root, 64).unwrap();
        let b = memsys::allocate(root, 64).unwrap();
        assert_ne!(a, b);
    }
}
