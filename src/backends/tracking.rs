//! An accounting wrapper: counts and logs allocations through a delegate back-end, and gives the
//! `lock`/`unlock` facade hooks (§4.6, §5.1) a real critical section to exercise.

use core::mem;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::backend::Backend;
use crate::error::Status;
use crate::node::NodeHandle;

/// Wraps another [`Backend`], delegating every operation while counting allocations/frees and
/// emitting `log::trace!` records.
///
/// `lock`/`unlock` acquire and release a *separate* critical section from the one guarding
/// delegate access: they exist purely so a client bracketing several facade calls with
/// `lock(node)` … `unlock(node)` has a genuine mutual-exclusion region to observe. They use
/// `parking_lot::Mutex::force_unlock` because the framework's `lock`/`unlock` are independent
/// calls with no RAII guard to hand back to the caller, the same manual-unlock shape FFI-facing
/// lock wrappers reach for when a held guard cannot be threaded through a callback boundary.
pub struct Tracking<B: Backend> {
    inner: Mutex<B>,
    critical_section: Mutex<()>,
    allocations: AtomicUsize,
    frees: AtomicUsize,
}

impl<B: Backend> Tracking<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner: Mutex::new(inner),
            critical_section: Mutex::new(()),
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
}

impl<B: Backend> Backend for Tracking<B> {
    fn allocate(&self, node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
        let result = self.inner.lock().allocate(node, size);
        if result.is_some() {
            self.allocations.fetch_add(1, Ordering::Relaxed);
        }
        log::trace!("tracking: allocate({size}) -> {:?}", result);
        result
    }

    fn has_zero_allocate(&self) -> bool {
        self.inner.lock().has_zero_allocate()
    }

    fn zero_allocate(&self, node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
        let result = self.inner.lock().zero_allocate(node, size);
        if result.is_some() {
            self.allocations.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn has_reallocate(&self) -> bool {
        self.inner.lock().has_reallocate()
    }

    fn reallocate(&self, node: NodeHandle, ptr: NonNull<u8>, new_size: usize) -> Option<NonNull<u8>> {
        self.inner.lock().reallocate(node, ptr, new_size)
    }

    fn has_free(&self) -> bool {
        self.inner.lock().has_free()
    }

    fn free(&self, node: NodeHandle, ptr: NonNull<u8>) -> Result<(), Status> {
        let result = self.inner.lock().free(node, ptr);
        if result.is_ok() {
            self.frees.fetch_add(1, Ordering::Relaxed);
        }
        log::trace!("tracking: free -> {:?}", result);
        result
    }

    fn has_reset(&self) -> bool {
        self.inner.lock().has_reset()
    }

    fn reset(&self, node: NodeHandle) -> Result<(), Status> {
        self.inner.lock().reset(node)
    }

    fn has_pre_destroy(&self) -> bool {
        self.inner.lock().has_pre_destroy()
    }

    fn pre_destroy(&self, node: NodeHandle) {
        self.inner.lock().pre_destroy(node)
    }

    fn has_destroy(&self) -> bool {
        self.inner.lock().has_destroy()
    }

    fn destroy(&self, node: NodeHandle) {
        self.inner.lock().destroy(node)
    }

    fn lock(&self, node: NodeHandle) {
        mem::forget(self.critical_section.lock());
        log::trace!("tracking: locked {:?}", node);
    }

    fn unlock(&self, node: NodeHandle) {
        unsafe {
            self.critical_section.force_unlock();
        }
        log::trace!("tracking: unlocked {:?}", node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::malloc::Malloc;
    use crate::{self as memsys};

    #[test]
    fn counts_allocations_and_frees_through_the_delegate() {
        let backend = Tracking::new(Malloc::new());
        let root = memsys::NodeHandle::create(backend, None);
        let p = memsys::allocate(root, 32).unwrap();
        memsys::free(root, Some(p)).unwrap();
    }

    #[test]
    fn lock_unlock_round_trip() {
        let backend = Tracking::new(Malloc::new());
        let root = memsys::NodeHandle::create(backend, None);
        memsys::lock(root);
        memsys::unlock(root);
        memsys::lock(root);
        memsys::unlock(root);
    }
}
