//! Demonstration back-ends (C8).
//!
//! None of these are part of the framework contract; they exist so the Lifecycle Engine and
//! Allocation Facade have something concrete to dispatch through in tests and examples.

pub mod bump;
pub mod malloc;
pub mod tracking;

pub use bump::BumpPool;
pub use malloc::Malloc;
pub use tracking::Tracking;
