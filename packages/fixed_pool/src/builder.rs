use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::{DropPolicy, Pool, RawPool};

/// Builder for creating an instance of [`RawPool`] or [`Pool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`Pool::new()`][1] and [`RawPool::new()`][2] is sufficient
/// for most use cases. Capacity and slot shape are part of the pool type and are not set here.
///
/// # Examples
///
/// ```
/// use fixed_pool::{DropPolicy, Pool};
///
/// let pool = Pool::<u32, 16>::builder()
///     .drop_policy(DropPolicy::MayDropItems)
///     .build();
/// ```
///
/// [1]: Pool::new
/// [2]: RawPool::new
#[must_use]
pub struct PoolBuilder<P> {
    drop_policy: DropPolicy,

    _pool: PhantomData<fn() -> P>,
}

impl<P> fmt::Debug for PoolBuilder<P> {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("pool_type", &format_args!("{}", type_name::<P>()))
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<P> PoolBuilder<P> {
    pub(crate) fn new() -> Self {
        Self {
            drop_policy: DropPolicy::default(),
            _pool: PhantomData,
        }
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how
    /// to treat allocated slots when the pool is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::{DropPolicy, RawPool};
    ///
    /// let pool = RawPool::<u64, 4>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    /// ```
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }
}

impl<S, const N: usize> PoolBuilder<RawPool<S, N>> {
    /// Builds the raw pool with the specified configuration.
    #[must_use]
    pub fn build(self) -> RawPool<S, N> {
        RawPool::with_drop_policy(self.drop_policy)
    }
}

impl<T, const N: usize> PoolBuilder<Pool<T, N>> {
    /// Builds the typed pool with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::Pool;
    ///
    /// let pool = Pool::<String, 4>::builder().build();
    ///
    /// assert!(pool.is_empty());
    /// ```
    #[must_use]
    pub fn build(self) -> Pool<T, N> {
        Pool::with_drop_policy(self.drop_policy)
    }
}
