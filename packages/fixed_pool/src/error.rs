use thiserror::Error;

/// Errors reported by pool operations.
///
/// Apart from [`Error::Full`], every variant describes a usage error by the caller. None of them
/// leaves the pool in a modified state.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
#[expect(
    variant_size_differences,
    reason = "layout details are only carried on the error path"
)]
pub enum Error {
    /// Every slot of the pool is allocated.
    #[error("pool is full: all {capacity} slots are allocated")]
    Full {
        /// The fixed capacity of the pool.
        capacity: usize,
    },

    /// The requested element does not fit into a slot of the pool.
    #[error(
        "element with size {size} and alignment {align} does not fit a slot with size {slot_size} and alignment {slot_align}"
    )]
    ElementTooLarge {
        /// Size of the requested element in bytes.
        size: usize,

        /// Alignment of the requested element in bytes.
        align: usize,

        /// Size of one pool slot in bytes.
        slot_size: usize,

        /// Alignment of one pool slot in bytes.
        slot_align: usize,
    },

    /// The slot index or address does not identify a slot of this pool.
    #[error("slot index or address does not belong to this pool")]
    NotInPool,

    /// The slot belongs to the pool but is not currently allocated. Typically this means the
    /// slot was released twice.
    #[error("slot {index} is not allocated")]
    NotAllocated {
        /// Index of the vacant slot.
        index: usize,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
