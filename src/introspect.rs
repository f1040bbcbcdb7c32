//! Introspection & Safety (C7): ancestor queries, tracking detection, and structural assertions.

use crate::node::NodeHandle;
use crate::topology;

/// Whether `node` is *tracking*: its back-end supplies `reset`, and can therefore reclaim an
/// entire subtree's storage in bulk.
pub fn is_tracking(node: NodeHandle) -> bool {
    unsafe { (*node.as_ptr()).backend.has_reset() }
}

/// Acquires `node`'s critical section, if its back-end has one. A silent no-op otherwise, so
/// callers may always bracket a region with `lock`/`unlock` without first querying for support.
pub fn lock(node: NodeHandle) {
    unsafe { (*node.as_ptr()).backend.lock(node) }
}

/// Releases `node`'s critical section, if its back-end has one.
pub fn unlock(node: NodeHandle) {
    unsafe { (*node.as_ptr()).backend.unlock(node) }
}

/// Whether `a` is an ancestor of `b`, or `a` and `b` are the same node, or `a` is `None` (which
/// matches the root of any chain). See `topology::is_ancestor` for the walk itself.
pub fn is_ancestor(a: Option<NodeHandle>, b: NodeHandle) -> bool {
    topology::is_ancestor(a, b)
}

/// Verifies `node`'s structural invariants (§3), panicking in debug builds on violation.
///
/// Local, O(1) checks (capability parity, the accounting-node invariant) always run. The O(depth)
/// walk confirming some ancestor is tracking only runs when `cfg!(debug_assertions)` is true; in
/// release builds it is skipped and a `log::trace!` marks the check as abbreviated, rather than
/// silently claiming a full pass.
pub fn debug_assert(node: NodeHandle) {
    unsafe {
        let inner = node.as_ptr();
        let backend = &(*inner).backend;

        // `allocate` is a required Backend method, so its presence needs no runtime check here;
        // the trait bound already guarantees it.

        debug_assert!(
            backend.has_free() || (backend.has_destroy() && backend.has_reset()),
            "node must provide free, or both destroy and reset"
        );
        debug_assert!(
            backend.has_destroy() == backend.has_reset(),
            "destroy and reset must be offered together"
        );

        let accounting = (*inner).accounting;
        let self_accounted = accounting == node.0;
        let accounting_is_child = NodeHandle(accounting).parent() == Some(node);
        debug_assert!(
            self_accounted || accounting_is_child,
            "accounting node must be self or a direct child"
        );

        if cfg!(debug_assertions) {
            warn_if_unreclaimable(node);
        } else {
            log::trace!("debug_assert({:?}): abbreviated, ancestor walk skipped", node);
        }
    }
}

/// If `node` cannot reclaim its own storage (no `destroy`, no `free`, and no parent whose facade
/// could free it on its behalf), confirms some ancestor is tracking and logs a warning if not.
///
/// Rust's `Box`-owned topology reclaims the `NodeInner` record regardless (see
/// `lifecycle::self_reclaim`), so the only real risk left is an orphaned back-end leaking its own
/// storage forever, which is worth a log line, not a process abort.
pub(crate) fn warn_if_unreclaimable(node: NodeHandle) {
    unsafe {
        let backend = &(*node.as_ptr()).backend;
        if backend.has_destroy() || backend.has_free() {
            return;
        }
        let mut cursor = node.parent();
        while let Some(ancestor) = cursor {
            if (*ancestor.as_ptr()).backend.has_reset() {
                return;
            }
            cursor = ancestor.parent();
        }
        log::warn!(
            "{:?} has no destroy/free and no tracking ancestor; its storage will never be reclaimed",
            node
        );
    }
}
