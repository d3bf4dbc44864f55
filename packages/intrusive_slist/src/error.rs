use thiserror::Error;

/// Errors reported by list operations.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The operation needs at least one node but the list is empty.
    #[error("{operation}() called on an empty list")]
    Empty {
        /// Name of the operation that was attempted.
        operation: &'static str,
    },
}

/// A specialized `Result` type for list operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
