/// Determines what happens to allocated slots when the pool is dropped.
///
/// By default, the pool may be dropped while slots are still allocated.
///
/// # Examples
///
/// ```
/// use fixed_pool::{DropPolicy, Pool};
///
/// // The drop policy is set at pool creation time.
/// let pool = Pool::<u32, 8>::builder()
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool may be dropped with slots still allocated. This is the default.
    ///
    /// A typed [`Pool`][crate::Pool] drops the values in those slots. A
    /// [`RawPool`][crate::RawPool] does not know what type its slots hold and forgets them.
    #[default]
    MayDropItems,

    /// The pool will panic if it still has allocated slots when it is dropped.
    ///
    /// This may be valuable if the owner of the pool is expected to return every slot before
    /// tearing the pool down, e.g. because the slot contents must be destroyed in a specific
    /// order or because leaking them would hide a bookkeeping bug.
    MustNotDropItems,
}
