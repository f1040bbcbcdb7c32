//! Cross-module lifecycle scenarios: chains, forks, accounting indirection, and mixed
//! tracking/non-tracking subtrees, hand-built rather than generated.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use memsys::backends::{BumpPool, Malloc};
use memsys::{Backend, CleanupData, NodeHandle, Status};

/// Wraps any back-end, adding a `pre_destroy` hook that appends `name` to a shared log. Lets a
/// single test observe cross-node ordering without instrumenting every demonstration back-end.
struct Probe<B: Backend> {
    name: &'static str,
    inner: B,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl<B: Backend> Backend for Probe<B> {
    fn allocate(&self, node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
        self.inner.allocate(node, size)
    }
    fn has_zero_allocate(&self) -> bool {
        self.inner.has_zero_allocate()
    }
    fn zero_allocate(&self, node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
        self.inner.zero_allocate(node, size)
    }
    fn has_reallocate(&self) -> bool {
        self.inner.has_reallocate()
    }
    fn reallocate(&self, node: NodeHandle, ptr: NonNull<u8>, new_size: usize) -> Option<NonNull<u8>> {
        self.inner.reallocate(node, ptr, new_size)
    }
    fn has_free(&self) -> bool {
        self.inner.has_free()
    }
    fn free(&self, node: NodeHandle, ptr: NonNull<u8>) -> Result<(), Status> {
        self.inner.free(node, ptr)
    }
    fn has_reset(&self) -> bool {
        self.inner.has_reset()
    }
    fn reset(&self, node: NodeHandle) -> Result<(), Status> {
        self.inner.reset(node)
    }
    fn has_pre_destroy(&self) -> bool {
        true
    }
    fn pre_destroy(&self, _node: NodeHandle) {
        self.log.lock().unwrap().push(self.name);
    }
    fn has_destroy(&self) -> bool {
        self.inner.has_destroy()
    }
    fn destroy(&self, node: NodeHandle) {
        self.inner.destroy(node)
    }
}

fn probe<B: Backend>(name: &'static str, inner: B, log: &Arc<Mutex<Vec<&'static str>>>) -> Probe<B> {
    Probe {
        name,
        inner,
        log: Arc::clone(log),
    }
}

/// Scenario 1: bootstrap free. Allocate through a free-only root, free it, then destroy.
///
/// The `NodeInner` record itself is a plain `Box` the framework owns outright, so there is no
/// second `Backend::free` call for it, only the explicit user free is observable.
#[test]
fn bootstrap_free() {
    let root = NodeHandle::create(Malloc::new(), None);
    let p = memsys::allocate(root, 16).expect("allocation should succeed");
    memsys::free(root, Some(p)).expect("free should succeed");
    memsys::destroy(root);
}

/// Scenario 2: tracking reset. Cleanups on a single node fire LIFO, then the back-end's own
/// `reset` runs.
#[test]
fn tracking_reset_runs_cleanups_lifo() {
    static ORDER: AtomicUsize = AtomicUsize::new(0);
    static FIRST_AT: AtomicUsize = AtomicUsize::new(usize::MAX);
    static SECOND_AT: AtomicUsize = AtomicUsize::new(usize::MAX);

    fn cb_a(_: CleanupData) -> Result<(), Status> {
        FIRST_AT.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
        Ok(())
    }
    fn cb_b(_: CleanupData) -> Result<(), Status> {
        SECOND_AT.store(ORDER.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
        Ok(())
    }

    let root = NodeHandle::create(BumpPool::new(), None);
    let mut d1 = 1u8;
    let mut d2 = 2u8;
    memsys::cleanup_register(root, (&mut d1 as *mut u8).cast(), cb_a).unwrap();
    memsys::cleanup_register(root, (&mut d2 as *mut u8).cast(), cb_b).unwrap();

    memsys::reset(root).unwrap();

    assert!(SECOND_AT.load(Ordering::SeqCst) < FIRST_AT.load(Ordering::SeqCst));
    memsys::destroy(root);
}

/// Scenario 3: nested destroy order. A descendant's cleanups and `pre_destroy` complete before
/// its ancestor's, all the way up a tracking root, non-tracking child, non-tracking grandchild
/// chain.
#[test]
fn nested_destroy_runs_post_order() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let root = NodeHandle::create(probe("root", BumpPool::new(), &log), None);
    let a = NodeHandle::create(probe("a", Malloc::new(), &log), Some(root));
    let g = NodeHandle::create(probe("g", Malloc::new(), &log), Some(a));

    fn mark_ga(data: CleanupData) -> Result<(), Status> {
        let log = unsafe { &*data.cast::<Mutex<Vec<&'static str>>>() };
        log.lock().unwrap().push("ga");
        Ok(())
    }
    fn mark_aa(data: CleanupData) -> Result<(), Status> {
        let log = unsafe { &*data.cast::<Mutex<Vec<&'static str>>>() };
        log.lock().unwrap().push("aa");
        Ok(())
    }
    fn mark_ra(data: CleanupData) -> Result<(), Status> {
        let log = unsafe { &*data.cast::<Mutex<Vec<&'static str>>>() };
        log.lock().unwrap().push("ra");
        Ok(())
    }

    let log_ptr = (Arc::as_ptr(&log) as *mut Mutex<Vec<&'static str>>).cast::<()>();
    memsys::cleanup_register(g, log_ptr, mark_ga).unwrap();
    memsys::cleanup_register(a, log_ptr, mark_aa).unwrap();
    memsys::cleanup_register(root, log_ptr, mark_ra).unwrap();

    memsys::destroy(root);

    let observed = log.lock().unwrap().clone();
    assert_eq!(
        observed,
        vec!["ga", "g", "aa", "a", "ra", "root"],
        "descendants must fully unwind before an ancestor's own cleanup and pre_destroy fire"
    );
}

/// Scenario 4: accounting indirection. Cleanup records registered on a non-tracking root are
/// allocated through its tracking accounting child, and destroying the root destroys that child
/// last, reclaiming every record in bulk.
#[test]
fn accounting_child_absorbs_cleanup_allocations() {
    struct CountingBump {
        inner: BumpPool,
        allocations: Arc<AtomicUsize>,
    }
    impl Backend for CountingBump {
        fn allocate(&self, node: NodeHandle, size: usize) -> Option<NonNull<u8>> {
            let r = self.inner.allocate(node, size);
            if r.is_some() {
                self.allocations.fetch_add(1, Ordering::Relaxed);
            }
            r
        }
        fn has_reset(&self) -> bool {
            true
        }
        fn reset(&self, node: NodeHandle) -> Result<(), Status> {
            self.inner.reset(node)
        }
        fn has_destroy(&self) -> bool {
            true
        }
        fn destroy(&self, node: NodeHandle) {
            self.inner.destroy(node)
        }
    }

    static RUN_COUNT: AtomicUsize = AtomicUsize::new(0);
    fn noop_cleanup(_: CleanupData) -> Result<(), Status> {
        RUN_COUNT.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    let root = NodeHandle::create(Malloc::new(), None);
    let allocations = Arc::new(AtomicUsize::new(0));
    let accounting = NodeHandle::create(
        CountingBump {
            inner: BumpPool::new(),
            allocations: Arc::clone(&allocations),
        },
        Some(root),
    );
    root.set_accounting(accounting);

    for _ in 0..100 {
        memsys::cleanup_register(root, core::ptr::null_mut(), noop_cleanup).unwrap();
    }
    assert_eq!(allocations.load(Ordering::Relaxed), 100);

    memsys::destroy(root);
    assert_eq!(RUN_COUNT.load(Ordering::Relaxed), 100);
}

/// Scenario 5: unregister then destroy. An unregistered cleanup never fires, and unregistering
/// it twice fails the second time.
#[test]
fn unregister_then_destroy_skips_the_callback() {
    static CALLED: AtomicUsize = AtomicUsize::new(0);
    fn cb(_: CleanupData) -> Result<(), Status> {
        CALLED.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    let root = NodeHandle::create(Malloc::new(), None);
    let mut token = 0u8;
    let data = (&mut token as *mut u8).cast::<()>();

    memsys::cleanup_register(root, data, cb).unwrap();
    memsys::cleanup_unregister(root, data, cb).unwrap();
    memsys::destroy(root);

    assert_eq!(CALLED.load(Ordering::SeqCst), 0);
}

#[test]
fn double_unregister_fails_the_second_time() {
    fn cb(_: CleanupData) -> Result<(), Status> {
        Ok(())
    }

    let root = NodeHandle::create(Malloc::new(), None);
    let mut token = 0u8;
    let data = (&mut token as *mut u8).cast::<()>();

    memsys::cleanup_register(root, data, cb).unwrap();
    memsys::cleanup_unregister(root, data, cb).unwrap();
    assert_eq!(
        memsys::cleanup_unregister(root, data, cb),
        Err(Status::NoSuchCleanup)
    );
    memsys::destroy(root);
}

/// Scenario 6: ancestor queries over a four-node chain, including the `None`-matches-any-root
/// case.
#[test]
fn ancestor_queries_over_a_chain() {
    let r = NodeHandle::create(Malloc::new(), None);
    let a = NodeHandle::create(Malloc::new(), Some(r));
    let b = NodeHandle::create(Malloc::new(), Some(a));
    let c = NodeHandle::create(Malloc::new(), Some(b));

    assert!(memsys::is_ancestor(Some(r), c));
    assert!(!memsys::is_ancestor(Some(b), a));
    assert!(memsys::is_ancestor(None, c));

    memsys::destroy(r);
}
