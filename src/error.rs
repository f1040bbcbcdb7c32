//! Status codes returned by the public surface of the memory system.

use thiserror::Error;

/// The fixed, small taxonomy of failures a [`crate::NodeHandle`] operation can report.
///
/// Success has no variant here: it is `Ok(())` (or a plain `bool` for boolean-flavored queries
/// like `is_ancestor`) rather than a zero-valued status threaded through every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Status {
    /// An argument violated a documented precondition (a null `free` pointer, a null cleanup
    /// callback in back-ends that can express one).
    #[error("invalid argument")]
    InvalidArgument,
    /// A cleanup record could not be allocated.
    #[error("out of memory")]
    OutOfMemory,
    /// `cleanup_unregister` found no matching `(data, callback)` pair.
    #[error("no matching cleanup registered")]
    NoSuchCleanup,
}
