//! The Node (C2): a MemSys instance, and the handle clients hold to it.

use core::ptr::NonNull;

use crate::backend::Backend;
use crate::topology;

/// A `(next, data, callback)` cleanup record.
///
/// Owned by the node whose `cleanups` list contains it; its storage comes from that node's
/// accounting node, never from the ordinary Rust allocator. See `cleanup.rs`.
pub(crate) struct CleanupRecord {
    pub(crate) next: Option<NonNull<CleanupRecord>>,
    pub(crate) data: CleanupData,
    pub(crate) callback: CleanupFn,
}

/// An opaque, user-supplied context pointer handed back to a cleanup callback verbatim.
///
/// Identity for `unregister`/`run` matching is by pointer value, not by pointee equality. Two
/// registrations with different `data` pointers are always distinct cleanups even if the bytes
/// they reference happen to compare equal.
pub type CleanupData = *mut ();

/// A cleanup callback. `fn` pointers are non-nullable in Rust, so "register fails with
/// `InvalidArgument` if the callback is null" has no reachable code path here: the type system
/// rules it out rather than a runtime check ruling it out.
pub type CleanupFn = fn(CleanupData) -> Result<(), crate::error::Status>;

/// The heap record backing a [`NodeHandle`].
///
/// `first_child` and `next_sibling` *own* their referent (a singly-linked list of owned boxes);
/// `parent` and `back_link` are non-owning back-references. A `Box<NodeInner>`'s heap address
/// never changes across a move of the `Box` value itself, so `back_link` (a raw pointer into
/// whichever `Option<Box<NodeInner>>` slot currently owns this node) stays valid for as long as
/// this record lives.
pub(crate) struct NodeInner {
    pub(crate) backend: Box<dyn Backend>,
    pub(crate) parent: Option<NonNull<NodeInner>>,
    pub(crate) first_child: Option<Box<NodeInner>>,
    pub(crate) next_sibling: Option<Box<NodeInner>>,
    pub(crate) back_link: Option<NonNull<Option<Box<NodeInner>>>>,
    pub(crate) accounting: NonNull<NodeInner>,
    pub(crate) cleanups: Option<NonNull<CleanupRecord>>,
}

/// A handle to a MemSys node.
///
/// `NodeHandle` is a small, `Copy`-able, non-owning reference. Ownership of the underlying record
/// lives in the tree itself (a parent's `first_child`/`next_sibling` chain) or, for a root with no
/// parent, is implicitly held until [`crate::destroy`] reclaims it. Dereferencing a `NodeHandle`
/// after its node has been destroyed or reclaimed by an ancestor's `reset`/`destroy` is undefined
/// behavior, exactly as using a dangling pointer would be.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(pub(crate) NonNull<NodeInner>);

impl NodeHandle {
    /// Creates a new node wrapping `backend`, linked as the newest child of `parent` (or as a
    /// root, if `parent` is `None`).
    ///
    /// This is the constructor back-end factories call (§6, "Storage of the Node record
    /// itself"): it performs the zero-initialize-and-link sequence from §3 "Lifecycle" in full,
    /// so ordinary back-end code never needs `unsafe`.
    pub fn create<B: Backend>(backend: B, parent: Option<NodeHandle>) -> NodeHandle {
        let boxed = Box::new(NodeInner {
            backend: Box::new(backend),
            parent: None,
            first_child: None,
            next_sibling: None,
            back_link: None,
            accounting: NonNull::dangling(),
            cleanups: None,
        });
        let raw = Box::into_raw(boxed);
        let ptr = unsafe { NonNull::new_unchecked(raw) };
        unsafe {
            (*raw).accounting = ptr;
        }
        let handle = NodeHandle(ptr);
        if let Some(parent) = parent {
            unsafe { topology::link(raw, parent) };
        }
        handle
    }

    /// The raw pointer to the backing record. Every access through it is `unsafe`: callers must
    /// never form a Rust reference (`&`/`&mut NodeInner`) that could alias the `Box<NodeInner>`
    /// chain that owns this node. Read and write individual fields through the raw pointer
    /// instead, as `topology`, `cleanup`, `facade` and `lifecycle` do.
    pub(crate) fn as_ptr(self) -> *mut NodeInner {
        self.0.as_ptr()
    }

    /// The parent of this node, if any.
    pub fn parent(self) -> Option<NodeHandle> {
        unsafe { (*self.as_ptr()).parent.map(NodeHandle) }
    }

    /// Designates `accounting` as the node through which this node's own bookkeeping (cleanup
    /// records) will be allocated from now on.
    ///
    /// `accounting` must be `self` or a direct child of `self` (invariant 1, §3); this is checked
    /// with `debug_assert!` rather than returning a `Status`, since violating it is a programmer
    /// error in a back-end factory, not a runtime condition a caller should branch on. Back-end
    /// factories that want a dedicated accounting sub-allocator call this once, right after
    /// creating both nodes.
    pub fn set_accounting(self, accounting: NodeHandle) {
        debug_assert!(
            accounting == self || accounting.parent() == Some(self),
            "accounting node must be self or a direct child"
        );
        unsafe {
            (*self.as_ptr()).accounting = accounting.0;
        }
    }
}

impl core::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeHandle({:p})", self.0.as_ptr())
    }
}
