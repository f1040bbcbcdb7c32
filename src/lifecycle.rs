//! The Lifecycle Engine (C6): `reset` and `destroy`, and the post-order cleanup walk they share.

use core::ptr::NonNull;

use crate::error::Status;
use crate::facade;
use crate::introspect;
use crate::node::{NodeHandle, NodeInner};
use crate::topology;

/// Runs every cleanup currently registered directly on `node`, in list (LIFO) order. Does not
/// touch the list itself; callers clear `cleanups` afterward once they know the backing memory
/// is about to be reclaimed.
fn run_own_cleanups(node: NodeHandle) {
    unsafe {
        let mut cursor = (*node.as_ptr()).cleanups;
        while let Some(record_ptr) = cursor {
            let record = record_ptr.as_ptr();
            let _ = ((*record).callback)((*record).data);
            cursor = (*record).next;
        }
    }
}

/// For each direct child of `node` (sibling order), recurse first, then run that child's own
/// cleanups, then fire its `pre_destroy` if present. Produces the post-order traversal P6
/// requires: a descendant's cleanups and `pre_destroy` complete before its ancestor's cleanups
/// begin.
fn descend_cleanups(node: NodeHandle) {
    unsafe {
        let mut cursor = (*node.as_ptr()).first_child.as_deref().map(|c| NonNull::from(&*c));
        while let Some(child_ptr) = cursor {
            let child = NodeHandle(child_ptr);
            descend_cleanups(child);
            run_own_cleanups(child);
            let backend = &(*child_ptr.as_ptr()).backend;
            if backend.has_pre_destroy() {
                backend.pre_destroy(child);
            }
            cursor = (*child_ptr.as_ptr()).next_sibling.as_deref().map(|c| NonNull::from(&*c));
        }
    }
}

/// Resets `node`: unwinds its entire subtree's cleanups and `pre_destroy` hooks, runs its own
/// cleanups, discards all children and cleanup records, resets its accounting node to itself, and
/// dispatches to the back-end's bulk `reset`.
///
/// Panics (debug builds) if `node` is not tracking. Calling `reset` on a node with no `reset`
/// operation is a programmer error.
pub fn reset(node: NodeHandle) -> Result<(), Status> {
    unsafe {
        let inner = node.as_ptr();
        debug_assert!(
            (*inner).backend.has_reset(),
            "reset() called on a non-tracking node"
        );

        descend_cleanups(node);
        run_own_cleanups(node);
        (*inner).cleanups = None;

        // Dropping the owned child chain here recurses through every descendant's `Drop` impl,
        // and transitively whatever resources each descendant's own `Backend` owns. A single
        // field assignment leaves no child memory systems behind.
        (*inner).first_child = None;

        (*inner).accounting = node.0;

        (*inner).backend.reset(node)
    }
}

/// Destroys `node`: for a tracking node, tears down cleanups and children exactly like `reset`
/// then reclaims itself; for a non-tracking node, explicitly destroys each child (detaching the
/// accounting child first so its memory remains available for bookkeeping during teardown, and
/// destroying it last), then reclaims itself.
pub fn destroy(node: NodeHandle) {
    unsafe {
        if cfg!(debug_assertions) {
            introspect::warn_if_unreclaimable(node);
        }
        let owned = topology::detach(node);
        destroy_owned(owned, node);
    }
}

fn destroy_owned(mut owned: Box<NodeInner>, handle: NodeHandle) {
    unsafe {
        if owned.backend.has_reset() {
            descend_cleanups(handle);
            run_own_cleanups(handle);
            owned.cleanups = None;
            owned.first_child = None;
        } else {
            let accounting = owned.accounting;
            let self_accounted = accounting == handle.0;
            let detached_accounting = if self_accounted {
                None
            } else {
                Some(topology::detach(NodeHandle(accounting)))
            };

            // Capture each child's next sibling before recursing, since destroying a child
            // detaches it from this chain.
            let mut current = owned.first_child.take();
            while let Some(mut child_box) = current {
                current = child_box.next_sibling.take();
                child_box.parent = None;
                child_box.back_link = None;
                let child_handle = NodeHandle(NonNull::from(child_box.as_ref()));
                destroy_owned(child_box, child_handle);
            }

            // Whichever node holds the cleanup records (this node itself, or a direct
            // accounting child), run them now, freeing each record individually only when
            // that holder has no bulk `reset` to reclaim them with instead.
            let records_holder = detached_accounting
                .as_ref()
                .map(|b| NodeHandle(NonNull::from(b.as_ref())))
                .unwrap_or(handle);
            let holder_has_reset = detached_accounting
                .as_ref()
                .map(|b| b.backend.has_reset())
                .unwrap_or(false);

            if holder_has_reset {
                // The cleanup records live in the accounting child's memory. Run the
                // callbacks now and let that child's own teardown reclaim the records in
                // bulk a moment later.
                run_own_cleanups(handle);
                owned.cleanups = None;
            } else {
                let mut cursor = owned.cleanups.take();
                while let Some(record_ptr) = cursor {
                    let record = record_ptr.as_ptr();
                    let _ = ((*record).callback)((*record).data);
                    cursor = (*record).next;
                    let _ = facade::free(
                        records_holder,
                        NonNull::new(record_ptr.as_ptr().cast::<u8>()),
                    );
                }
            }

            if let Some(accounting_box) = detached_accounting {
                let accounting_handle = NodeHandle(NonNull::from(accounting_box.as_ref()));
                destroy_owned(accounting_box, accounting_handle);
                owned.accounting = handle.0;
            }
        }

        self_reclaim(owned, handle);
    }
}

/// Fires `pre_destroy` (if present) and `destroy` (if present, letting the back-end reclaim its
/// own bulk storage), then unconditionally reclaims the `NodeInner` record itself.
///
/// The `NodeInner` struct itself is always a plain `Box` the framework owns, so reclaiming it is
/// an unconditional `drop`. What matters is whether the back-end gets a `destroy` notification to
/// release its own resources first, such as an arena's pages.
unsafe fn self_reclaim(mut owned: Box<NodeInner>, handle: NodeHandle) {
    if owned.backend.has_pre_destroy() {
        owned.backend.pre_destroy(handle);
    }
    if owned.backend.has_destroy() {
        owned.backend.destroy(handle);
    }
    owned.cleanups = None;
    drop(owned);
}
