//! The Topology Manager (C3): parent/child/sibling linking with O(1) unlink via back-links.
//!
//! Ownership flows down the tree (`first_child`/`next_sibling` are `Option<Box<NodeInner>>`);
//! `back_link` is a raw pointer *into* whichever `Option<Box<NodeInner>>` slot currently owns a
//! node: the address of the pointer that currently refers to it. Because every `NodeInner` lives
//! at a stable heap address once boxed (a `Box` moving only moves its own handle, never the
//! pointee), a `back_link` taken once stays valid for the node's entire life in the tree.

use core::ptr::NonNull;

use crate::node::{NodeHandle, NodeInner};

/// Links a freshly created (not yet owned by anyone) node as the newest child of `parent`.
///
/// `child` must be a raw pointer obtained from `Box::into_raw` that nothing else has taken
/// ownership of yet; this function reconstitutes that ownership and installs it under `parent`.
pub(crate) unsafe fn link(child: *mut NodeInner, parent: NodeHandle) {
    let mut child_box = unsafe { Box::from_raw(child) };
    let parent_ptr = parent.as_ptr();

    child_box.parent = Some(parent.0);

    let old_first = unsafe { (*parent_ptr).first_child.take() };
    if let Some(mut sibling) = old_first {
        sibling.back_link = Some(NonNull::from(&mut child_box.next_sibling));
        child_box.next_sibling = Some(sibling);
    }
    child_box.back_link = Some(NonNull::from(unsafe { &mut (*parent_ptr).first_child }));

    unsafe {
        (*parent_ptr).first_child = Some(child_box);
    }
}

/// Detaches `node` from wherever it currently lives in the tree and returns ownership of it.
///
/// For a node with a parent (or a preceding sibling), this rewrites the back-link-addressed slot
/// in O(1). For a root (no `back_link`, because it was never installed under a parent), this
/// simply reclaims the `Box::into_raw` allocation the framework leaked when the root was created.
/// A root is the one case where nothing in the tree owns the record, so `destroy` is the only
/// thing that can ever reclaim it.
pub(crate) unsafe fn detach(node: NodeHandle) -> Box<NodeInner> {
    let ptr = node.as_ptr();
    match unsafe { (*ptr).back_link } {
        Some(back_link) => {
            let slot = back_link.as_ptr();
            let mut owned = unsafe { (*slot).take() }.expect("back_link slot was empty");
            debug_assert_eq!(NonNull::from(owned.as_ref()), node.0);

            let next_sibling = owned.next_sibling.take();
            if let Some(mut sibling) = next_sibling {
                sibling.back_link = Some(back_link);
                unsafe {
                    *slot = Some(sibling);
                }
            } else {
                unsafe {
                    *slot = None;
                }
            }

            owned.parent = None;
            owned.back_link = None;
            owned
        }
        None => unsafe { Box::from_raw(ptr) },
    }
}

/// Walks `b`'s parent chain looking for `a`. A `None` ancestor matches the root of any chain
/// (an orphan, or the absolute root), and a node is its own ancestor.
pub(crate) fn is_ancestor(a: Option<NodeHandle>, b: NodeHandle) -> bool {
    let mut cursor = Some(b);
    while let Some(node) = cursor {
        if Some(node) == a {
            return true;
        }
        cursor = node.parent();
    }
    cursor == a
}
