//! The Cleanup Registry (C4): a per-node LIFO list of `(data, callback)` pairs.

use core::mem;
use core::ptr::NonNull;

use crate::error::Status;
use crate::facade;
use crate::node::{CleanupData, CleanupFn, CleanupRecord, NodeHandle};

/// Registers `callback` to run (with `data` passed back verbatim) at this node's next `reset` or
/// `destroy`, prepended to the node's cleanup list, so cleanups run LIFO, most recently
/// registered first.
///
/// The record is allocated through `node`'s accounting node, not through `node` directly, so it
/// dies no later than whichever node actually owns the bytes backing it.
///
/// A null callback would be an `InvalidArgument` failure, but a Rust `fn` pointer can never be
/// null, so that failure mode is unreachable here by construction rather than by a runtime check
/// (see `node::CleanupFn`).
pub fn cleanup_register(node: NodeHandle, data: CleanupData, callback: CleanupFn) -> Result<(), Status> {
    let accounting = unsafe { (*node.as_ptr()).accounting };
    let accounting_handle = NodeHandle(accounting);

    let raw = facade::allocate(accounting_handle, mem::size_of::<CleanupRecord>())
        .ok_or(Status::OutOfMemory)?;
    let record_ptr = raw.as_ptr().cast::<CleanupRecord>();

    unsafe {
        let inner = node.as_ptr();
        record_ptr.write(CleanupRecord {
            next: (*inner).cleanups,
            data,
            callback,
        });
        (*inner).cleanups = Some(NonNull::new_unchecked(record_ptr));
    }

    log::trace!("registered cleanup on {:?}", node);
    Ok(())
}

/// Searches `node`'s cleanup list for an exact `(data, callback)` match, unlinks the first one
/// found, and releases its storage through the accounting node's `free` (a no-op, i.e. a leak
/// until the accounting node itself is reclaimed, when that back-end has none).
///
/// Fails with `NoSuchCleanup` when no match exists.
pub fn cleanup_unregister(node: NodeHandle, data: CleanupData, callback: CleanupFn) -> Result<(), Status> {
    unsafe {
        let inner = node.as_ptr();
        let mut slot: *mut Option<NonNull<CleanupRecord>> = &mut (*inner).cleanups;

        while let Some(record_ptr) = *slot {
            let record = record_ptr.as_ptr();
            if (*record).data == data && (*record).callback == callback {
                *slot = (*record).next;
                let accounting = (*inner).accounting;
                let _ = facade::free(NodeHandle(accounting), NonNull::new(record_ptr.as_ptr().cast::<u8>()));
                log::trace!("unregistered cleanup on {:?}", node);
                return Ok(());
            }
            slot = &mut (*record).next;
        }
    }

    Err(Status::NoSuchCleanup)
}

/// Unregisters `(data, callback)`, ignoring whether it was actually found, and then invokes it,
/// returning its status.
pub fn cleanup_run(node: NodeHandle, data: CleanupData, callback: CleanupFn) -> Result<(), Status> {
    let _ = cleanup_unregister(node, data, callback);
    callback(data)
}
