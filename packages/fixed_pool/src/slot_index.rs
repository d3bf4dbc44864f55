use std::fmt;

/// Identifies one slot of a pool.
///
/// Returned by the allocating methods of [`RawPool`][crate::RawPool] and [`Pool`][crate::Pool]
/// and accepted by every method that accesses or releases a slot. The index carries no borrow of
/// the pool, so it stays valid when the pool is moved.
///
/// Any `usize` can be converted into a `SlotIndex`. The pool validates the index on every use and
/// rejects indices that do not refer to one of its allocated slots.
///
/// # Examples
///
/// ```
/// use fixed_pool::{Pool, SlotIndex};
///
/// let mut pool = Pool::<u32, 2>::new();
/// let index = pool.insert(5).unwrap();
///
/// // Indices round-trip through `usize`, e.g. for storage in link fields.
/// let raw: usize = index.into();
/// assert_eq!(SlotIndex::from(raw), index);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SlotIndex(usize);

impl SlotIndex {
    #[must_use]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position of the slot inside the pool.
    #[must_use]
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl From<usize> for SlotIndex {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<SlotIndex> for usize {
    #[inline]
    fn from(value: SlotIndex) -> Self {
        value.0
    }
}

impl fmt::Display for SlotIndex {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}
