use std::any::type_name;
use std::fmt;
use std::thread;

use tracing::debug;

use crate::{DropPolicy, Error, PoolBuilder, RawPool, Result, SlotIndex};

/// A fixed-capacity pool of up to `N` values of type `T`.
///
/// This is the typed face of [`RawPool`]: every allocated slot holds an initialized `T`, so
/// access is safe and the pool drops the values it still holds when it is cleared or dropped.
/// Like the raw pool, it never allocates heap memory and hands out and takes back slots in
/// constant time, reusing the most recently freed slot first.
///
/// # Examples
///
/// ```
/// use fixed_pool::{Error, Pool};
///
/// let mut pool = Pool::<&str, 2>::new();
///
/// let a = pool.insert("a").unwrap();
/// let b = pool.insert("b").unwrap();
/// assert!(matches!(pool.insert("c"), Err(Error::Full { capacity: 2 })));
///
/// *pool.get_mut(a).unwrap() = "A";
///
/// let values: Vec<_> = pool.iter().map(|(_, value)| *value).collect();
/// assert_eq!(values, ["A", "b"]);
///
/// assert_eq!(pool.remove(b), Ok("b"));
/// assert_eq!(pool.len(), 1);
/// ```
pub struct Pool<T, const N: usize> {
    inner: RawPool<T, N>,
}

impl<T, const N: usize> Pool<T, N> {
    /// Creates an empty pool with the default drop policy.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_drop_policy(DropPolicy::MayDropItems)
    }

    #[must_use]
    pub(crate) const fn with_drop_policy(drop_policy: DropPolicy) -> Self {
        Self {
            inner: RawPool::with_drop_policy(drop_policy),
        }
    }

    /// Starts configuring a pool with non-default options.
    #[must_use]
    pub fn builder() -> PoolBuilder<Self> {
        PoolBuilder::new()
    }

    /// The number of slots in the pool. This never changes.
    #[must_use]
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// The number of values in the pool.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.inner.len()
    }

    /// The number of values that can still be inserted.
    #[must_use]
    #[inline]
    pub const fn available(&self) -> usize {
        self.inner.available()
    }

    /// Whether the pool holds no values.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether every slot holds a value.
    #[must_use]
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Moves a value into a free slot and returns the index of the slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Full`] if every slot already holds a value. The value is dropped in that
    /// case; use [`insert_with()`][Self::insert_with] to avoid creating it in the first place.
    pub fn insert(&mut self, value: T) -> Result<SlotIndex> {
        self.inner.place(value)
    }

    /// Creates a value with `f` and moves it into a free slot.
    ///
    /// `f` is only called if the pool has room for the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Full`] if every slot already holds a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::Pool;
    ///
    /// let mut pool = Pool::<Vec<u8>, 1>::new();
    ///
    /// pool.insert_with(|| vec![1, 2, 3]).unwrap();
    ///
    /// // The pool is full, so the closure is not called.
    /// assert!(pool.insert_with(|| unreachable!()).is_err());
    /// ```
    pub fn insert_with(&mut self, f: impl FnOnce() -> T) -> Result<SlotIndex> {
        if self.is_full() {
            return Err(Error::Full { capacity: N });
        }

        self.inner.place(f())
    }

    /// Returns a reference to the value in a slot, or `None` if the slot holds no value.
    #[must_use]
    pub fn get(&self, index: SlotIndex) -> Option<&T> {
        // SAFETY: Every allocated slot of a typed pool holds an initialized T.
        unsafe { self.inner.get::<T>(index) }
    }

    /// Returns an exclusive reference to the value in a slot, or `None` if the slot holds no
    /// value.
    #[must_use]
    pub fn get_mut(&mut self, index: SlotIndex) -> Option<&mut T> {
        // SAFETY: Every allocated slot of a typed pool holds an initialized T.
        unsafe { self.inner.get_mut::<T>(index) }
    }

    /// Moves the value out of a slot and frees the slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInPool`] if the index is out of range and [`Error::NotAllocated`] if
    /// the slot holds no value. The pool is not modified in either case.
    pub fn remove(&mut self, index: SlotIndex) -> Result<T> {
        // SAFETY: Every allocated slot of a typed pool holds an initialized T.
        unsafe { self.inner.remove::<T>(index) }
    }

    /// Whether the slot holds a value.
    #[must_use]
    pub fn contains(&self, index: SlotIndex) -> bool {
        self.inner.contains(index)
    }

    /// Finds the slot that holds the value at `ptr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInPool`] unless the pointer is exactly the address of a slot of this
    /// pool and [`Error::NotAllocated`] if that slot holds no value.
    pub fn index_of(&self, ptr: *const T) -> Result<SlotIndex> {
        self.inner.index_of(ptr.cast())
    }

    /// Whether `ptr` is exactly the address of a slot of this pool, whether or not the slot
    /// currently holds a value.
    #[must_use]
    pub fn is_in_pool(&self, ptr: *const T) -> bool {
        self.inner.is_in_pool(ptr.cast())
    }

    /// Drops every value in the pool and frees all slots.
    pub fn clear(&mut self) {
        debug!(dropped = self.len(), item_type = type_name::<T>(), "clearing pool");

        for index in 0..N {
            // The slot is freed before the value is dropped.
            // SAFETY: Every allocated slot of a typed pool holds an initialized T.
            if let Ok(value) = unsafe { self.inner.remove::<T>(SlotIndex::new(index)) } {
                drop(value);
            }
        }

        self.inner.release_all();
    }

    /// Iterates over the values in the pool together with their slot indexes, in ascending slot
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &T)> {
        self.inner.occupied_values().map(|(index, value)| {
            // SAFETY: Every allocated slot of a typed pool holds an initialized T.
            (index, unsafe { value.assume_init_ref() })
        })
    }

    /// Iterates over exclusive references to the values in the pool together with their slot
    /// indexes, in ascending slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SlotIndex, &mut T)> {
        self.inner.occupied_values_mut().map(|(index, value)| {
            // SAFETY: Every allocated slot of a typed pool holds an initialized T.
            (index, unsafe { value.assume_init_mut() })
        })
    }

    pub(crate) fn drop_policy(&self) -> DropPolicy {
        self.inner.drop_policy()
    }
}

impl<T, const N: usize> Default for Pool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for Pool<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("inner", &self.inner)
            .finish()
    }
}

impl<T, const N: usize> Drop for Pool<T, N> {
    fn drop(&mut self) {
        let was_empty = self.is_empty();

        self.clear();

        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if thread::panicking() {
            return;
        }

        if self.drop_policy() == DropPolicy::MustNotDropItems {
            assert!(
                was_empty,
                "dropped a non-empty pool with a policy that says it must be empty when dropped"
            );
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::sync::Arc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(Pool<String, 4>: Send, Sync, fmt::Debug, Default);
    assert_impl_all!(Pool<Cell<u8>, 4>: Send);
    assert_not_impl_any!(Pool<Cell<u8>, 4>: Sync);
    assert_not_impl_any!(Pool<Rc<u8>, 4>: Send, Sync);

    #[test]
    fn insert_get_remove() {
        let mut pool = Pool::<String, 3>::new();

        let a = pool.insert("alpha".to_string()).unwrap();
        let b = pool.insert("beta".to_string()).unwrap();

        assert_eq!(pool.get(a).map(String::as_str), Some("alpha"));
        assert_eq!(pool.get(b).map(String::as_str), Some("beta"));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.available(), 1);

        pool.get_mut(a).unwrap().push('!');
        assert_eq!(pool.remove(a), Ok("alpha!".to_string()));
        assert_eq!(pool.get(a), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn insert_when_full_fails() {
        let mut pool = Pool::<u8, 2>::new();

        pool.insert(1).unwrap();
        pool.insert(2).unwrap();

        assert_eq!(pool.insert(3), Err(Error::Full { capacity: 2 }));
        assert!(pool.is_full());
    }

    #[test]
    fn insert_when_full_drops_value() {
        let mut pool = Pool::<Arc<()>, 1>::new();
        let value = Arc::new(());

        pool.insert(Arc::clone(&value)).unwrap();
        pool.insert(Arc::clone(&value)).unwrap_err();

        assert_eq!(Arc::strong_count(&value), 2);
    }

    #[test]
    fn insert_with_skips_closure_when_full() {
        let mut pool = Pool::<u8, 1>::new();
        let called = Cell::new(false);

        pool.insert_with(|| 1).unwrap();
        let result = pool.insert_with(|| {
            called.set(true);
            2
        });

        assert_eq!(result, Err(Error::Full { capacity: 1 }));
        assert!(!called.get());
    }

    #[test]
    fn removed_slot_is_reused_first() {
        let mut pool = Pool::<u32, 4>::new();

        pool.insert(1).unwrap();
        let b = pool.insert(2).unwrap();
        pool.insert(3).unwrap();

        pool.remove(b).unwrap();

        assert_eq!(pool.insert(4).unwrap(), b);
        assert_eq!(pool.get(b), Some(&4));
    }

    #[test]
    fn double_remove_fails() {
        let mut pool = Pool::<u32, 2>::new();

        let a = pool.insert(1).unwrap();
        pool.remove(a).unwrap();

        assert_eq!(pool.remove(a), Err(Error::NotAllocated { index: a.get() }));
        assert_eq!(pool.remove(SlotIndex::from(5)), Err(Error::NotInPool));
    }

    #[test]
    fn clear_drops_values() {
        let mut pool = Pool::<Arc<()>, 4>::new();
        let value = Arc::new(());

        for _ in 0..3 {
            pool.insert(Arc::clone(&value)).unwrap();
        }
        assert_eq!(Arc::strong_count(&value), 4);

        pool.clear();

        assert_eq!(Arc::strong_count(&value), 1);
        assert!(pool.is_empty());
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn drop_drops_values() {
        let value = Arc::new(());

        {
            let mut pool = Pool::<Arc<()>, 4>::new();
            pool.insert(Arc::clone(&value)).unwrap();
            pool.insert(Arc::clone(&value)).unwrap();
        }

        assert_eq!(Arc::strong_count(&value), 1);
    }

    #[test]
    #[should_panic]
    fn drop_with_items_panics_if_forbidden() {
        let mut pool = Pool::<u32, 2>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();
        pool.insert(1).unwrap();

        drop(pool);
    }

    #[test]
    fn drop_with_items_forbidden_still_drops_values() {
        let value = Arc::new(());
        let pool_value = Arc::clone(&value);

        let result = std::panic::catch_unwind(move || {
            let mut pool = Pool::<Arc<()>, 2>::builder()
                .drop_policy(DropPolicy::MustNotDropItems)
                .build();
            pool.insert(pool_value).unwrap();
        });

        assert!(result.is_err());
        assert_eq!(Arc::strong_count(&value), 1);
    }

    #[test]
    fn iter_visits_values_in_slot_order() {
        let mut pool = Pool::<char, 4>::new();

        pool.insert('a').unwrap();
        let b = pool.insert('b').unwrap();
        pool.insert('c').unwrap();
        pool.remove(b).unwrap();

        let values: Vec<_> = pool.iter().map(|(_, value)| *value).collect();
        assert_eq!(values, ['a', 'c']);
    }

    #[test]
    fn iter_mut_modifies_values() {
        let mut pool = Pool::<u32, 4>::new();

        pool.insert(1).unwrap();
        pool.insert(2).unwrap();

        for (_, value) in pool.iter_mut() {
            *value *= 10;
        }

        let values: Vec<_> = pool.iter().map(|(_, value)| *value).collect();
        assert_eq!(values, [10, 20]);
    }

    #[test]
    fn index_of_resolves_value_address() {
        let mut pool = Pool::<u64, 4>::new();

        pool.insert(1).unwrap();
        let b = pool.insert(2).unwrap();

        let ptr: *const u64 = pool.get(b).unwrap();

        assert_eq!(pool.index_of(ptr), Ok(b));
        assert!(pool.is_in_pool(ptr));

        let outside = 2_u64;
        assert!(!pool.is_in_pool(&outside));

        pool.remove(b).unwrap();
        assert!(pool.is_in_pool(ptr));
        assert_eq!(pool.index_of(ptr), Err(Error::NotAllocated { index: b.get() }));
    }

    #[test]
    fn values_observe_drop_order_of_clear() {
        struct Recorder<'a> {
            id: u8,
            log: &'a RefCell<Vec<u8>>,
        }

        impl Drop for Recorder<'_> {
            fn drop(&mut self) {
                self.log.borrow_mut().push(self.id);
            }
        }

        let log = RefCell::new(Vec::new());
        let mut pool = Pool::<Recorder<'_>, 3>::new();

        pool.insert(Recorder { id: 1, log: &log }).unwrap();
        pool.insert(Recorder { id: 2, log: &log }).unwrap();

        pool.clear();

        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn pool_is_usable_after_clear() {
        let mut pool = Pool::<u16, 2>::new();

        pool.insert(1).unwrap();
        pool.insert(2).unwrap();
        pool.clear();

        assert_eq!(pool.insert(3).unwrap().get(), 0);
        assert_eq!(pool.insert(4).unwrap().get(), 1);
    }
}
