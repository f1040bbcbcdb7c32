//! A hierarchical, composable memory system.
//!
//! A [`NodeHandle`] is one allocator in a tree of allocators: it can hand out memory itself
//! (`allocate`, `zero_allocate`, `reallocate`, `free`), own child allocators that share its
//! lifetime, and run user-registered cleanup callbacks at well-defined points in that lifetime
//! (`cleanup_register`, `reset`, `destroy`). What a node actually *does* when asked to allocate or
//! reclaim memory is supplied by a [`Backend`] implementation. This crate ships three
//! demonstration ones in [`backends`], but the framework itself is agnostic to the strategy.
//!
//! ```
//! use memsys::{backends::Malloc, NodeHandle};
//!
//! let root = NodeHandle::create(Malloc::new(), None);
//! let child = NodeHandle::create(Malloc::new(), Some(root));
//! let buf = memsys::allocate(child, 64).expect("allocation failed");
//! memsys::free(child, Some(buf)).unwrap();
//! memsys::destroy(root); // tears down `child` too
//! ```
//!
//! # Tree shape
//!
//! Every node but the root has exactly one parent. Children of a node form a singly-linked
//! sibling list (`first_child`/`next_sibling`); a back-link lets any node unlink itself from that
//! list in O(1), without walking its siblings. See `topology` for the details: it is the one
//! module in this crate where raw-pointer manipulation is load-bearing rather than incidental.
//!
//! # Reset vs. destroy
//!
//! `reset(node)` discards `node`'s entire subtree and its own cleanup records but keeps `node`
//! itself alive, ready for reuse; it requires `node`'s back-end to support bulk reclamation
//! (`Backend::has_reset`). `destroy(node)` tears `node` and its subtree down permanently. Both
//! run every affected cleanup and `pre_destroy` hook in the order documented on [`reset`] and
//! [`destroy`] before reclaiming any storage.

mod backend;
mod cleanup;
mod error;
mod facade;
mod introspect;
mod lifecycle;
mod node;
mod topology;

pub mod backends;

pub use backend::Backend;
pub use cleanup::{cleanup_register, cleanup_run, cleanup_unregister};
pub use error::Status;
pub use facade::{allocate, free, reallocate, zero_allocate};
pub use introspect::{debug_assert, is_ancestor, is_tracking, lock, unlock};
pub use lifecycle::{destroy, reset};
pub use node::{CleanupData, CleanupFn, NodeHandle};
