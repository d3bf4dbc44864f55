use std::alloc::Layout;
use std::any::type_name;
use std::fmt;
use std::mem::{self, MaybeUninit, align_of, size_of};
use std::ptr::NonNull;
use std::thread;

use tracing::{debug, trace};

use crate::{AlignedBytes, DropPolicy, Error, PoolBuilder, Result, SlotIndex};

/// A [`RawPool`] whose slots are described by size and alignment instead of by type.
///
/// One pool can hold values of different types, as long as each of them is at most `SIZE` bytes
/// large and needs an alignment of at most `A::ALIGN` bytes.
///
/// # Examples
///
/// ```
/// use fixed_pool::{Align4, GenericPool};
///
/// let mut pool = GenericPool::<4, Align4, 2>::new();
///
/// let number = pool.insert(42_u32).unwrap();
/// let bytes = pool.insert([1_u8, 2]).unwrap();
///
/// // SAFETY: Both slots hold the types we inserted into them.
/// unsafe {
///     assert_eq!(pool.get::<u32>(number), Some(&42));
///     assert_eq!(pool.get::<[u8; 2]>(bytes), Some(&[1, 2]));
/// }
/// # // SAFETY: Same as above.
/// # unsafe { pool.destroy::<u32>(number).unwrap(); }
/// ```
pub type GenericPool<const SIZE: usize, A, const N: usize> = RawPool<AlignedBytes<SIZE, A>, N>;

/// The state of one slot. Slots at or above the `initialised` mark hold no entry at all.
///
/// The primitive representation fixes the layout: a `u8` tag followed by the variant fields, so
/// the value of every slot starts `align_of::<S>()` bytes into its entry, whether the slot is
/// occupied or not.
#[repr(u8)]
enum Entry<S> {
    /// The slot is handed out. Whatever the caller wrote into `value` is the caller's business.
    Occupied { value: MaybeUninit<S> },

    /// The slot is part of the free list.
    Vacant {
        /// Index of the next slot in the free list. Equal to the `initialised` mark of the pool
        /// (or the capacity) for the last vacant slot in the chain.
        next_free_index: usize,
    },
}

/// A fixed-capacity pool of `N` uninitialized slots shaped like `S`.
///
/// The pool hands out slots with [`allocate()`][Self::allocate] and takes them back with
/// [`release()`][Self::release], both in constant time. It never allocates heap memory: all slots
/// live inline in the pool value, which can therefore be placed in a `static`, on the stack or
/// inside another container.
///
/// Slots are identified by [`SlotIndex`]. The pool does not remember what, if anything, the caller
/// stored in a slot; for a pool that tracks a single item type and drops values properly, use
/// [`Pool`][crate::Pool]. To store values of mixed types in one pool, use [`GenericPool`].
///
/// # Free list
///
/// Vacant slots form a singly-linked chain threaded through the slots themselves. The chain is
/// built lazily: a slot is first written when it is about to be handed out, so creating a pool of
/// any capacity is free. Released slots are pushed to the front of the chain, so the most recently
/// released slot is the next one allocated.
///
/// # Out of band access
///
/// [`slot_ptr()`][Self::slot_ptr] returns a pointer into a slot. The pointer remains valid until
/// the slot is released, the pool is moved or the pool is next accessed through an exclusive
/// reference. Prefer addressing slots by index wherever the pool may move.
///
/// # Examples
///
/// ```
/// use fixed_pool::{Error, RawPool};
///
/// let mut pool = RawPool::<u64, 2>::new();
///
/// let first = pool.allocate().unwrap();
/// let second = pool.allocate().unwrap();
/// assert!(matches!(pool.allocate(), Err(Error::Full { capacity: 2 })));
///
/// pool.release(first).unwrap();
/// assert!(matches!(pool.release(first), Err(Error::NotAllocated { .. })));
///
/// // The released slot is the next one to be handed out.
/// assert_eq!(pool.allocate().unwrap(), first);
/// # pool.release_all();
/// # _ = second;
/// ```
pub struct RawPool<S, const N: usize> {
    /// Slots below `initialised` hold an initialized `Entry`, the rest hold garbage.
    entries: [MaybeUninit<Entry<S>>; N],

    /// Head of the free list. `N` when the pool is full.
    next_free_index: usize,

    allocated: usize,

    /// Number of slots that have ever been written since construction or the last reset.
    initialised: usize,

    drop_policy: DropPolicy,
}

impl<S, const N: usize> RawPool<S, N> {
    /// Creates an empty pool with the default drop policy.
    ///
    /// This is a `const fn`, so the pool can initialize a `static`. No slot is touched until it
    /// is first allocated.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_drop_policy(DropPolicy::MayDropItems)
    }

    #[must_use]
    pub(crate) const fn with_drop_policy(drop_policy: DropPolicy) -> Self {
        Self {
            entries: [const { MaybeUninit::uninit() }; N],
            next_free_index: 0,
            allocated: 0,
            initialised: 0,
            drop_policy,
        }
    }

    /// Starts configuring a pool with non-default options.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::{DropPolicy, RawPool};
    ///
    /// let pool = RawPool::<u32, 4>::builder()
    ///     .drop_policy(DropPolicy::MustNotDropItems)
    ///     .build();
    ///
    /// assert_eq!(pool.capacity(), 4);
    /// ```
    #[must_use]
    pub fn builder() -> PoolBuilder<Self> {
        PoolBuilder::new()
    }

    /// The number of slots in the pool. This never changes.
    #[must_use]
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// The number of slots currently allocated.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.allocated
    }

    /// The number of slots that can still be allocated.
    #[must_use]
    #[inline]
    pub const fn available(&self) -> usize {
        // Cannot underflow because allocated never exceeds N.
        N.wrapping_sub(self.allocated)
    }

    /// Whether no slot is allocated.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.allocated == 0
    }

    /// Whether every slot is allocated.
    #[must_use]
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.allocated == N
    }

    /// The largest value size, in bytes, that fits into a slot.
    #[must_use]
    pub const fn max_item_size(&self) -> usize {
        size_of::<S>()
    }

    /// The strictest value alignment, in bytes, that a slot satisfies.
    #[must_use]
    pub const fn max_item_align(&self) -> usize {
        align_of::<S>()
    }

    /// Whether values of type `T` fit into a slot of this pool.
    ///
    /// Methods that store or access a `T` evaluate this at compile time and refuse to build
    /// if it is `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::{Align4, GenericPool};
    ///
    /// type Pool = GenericPool<4, Align4, 8>;
    ///
    /// assert!(Pool::fits::<u32>());
    /// assert!(Pool::fits::<[u8; 3]>());
    /// assert!(!Pool::fits::<u64>());
    /// ```
    #[must_use]
    pub const fn fits<T>() -> bool {
        size_of::<T>() <= size_of::<S>() && align_of::<T>() <= align_of::<S>()
    }

    /// Allocates a slot and returns its index.
    ///
    /// The slot contents are uninitialized. Write to the slot through
    /// [`slot_ptr()`][Self::slot_ptr] or use [`insert()`][Self::insert] to allocate and write in
    /// one step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Full`] if every slot is already allocated.
    pub fn allocate(&mut self) -> Result<SlotIndex> {
        if self.is_full() {
            debug!(capacity = N, "pool exhausted");
            return Err(Error::Full { capacity: N });
        }

        // Extend the free list by one slot if we have not yet touched every slot.
        if self.initialised < N {
            let index = self.initialised;

            // Cannot overflow because index < N.
            let next_free_index = index.wrapping_add(1);

            self.entries
                .get_mut(index)
                .expect("initialised mark is below capacity, so the slot exists")
                .write(Entry::Vacant { next_free_index });

            self.initialised = next_free_index;
        }

        let index = self.next_free_index;

        let entry = self
            .entry_mut(index)
            .expect("free list head of a non-full pool always refers to an initialized slot");

        let previous_entry = mem::replace(
            entry,
            Entry::Occupied {
                value: MaybeUninit::uninit(),
            },
        );

        let next_free_index = match previous_entry {
            Entry::Vacant { next_free_index } => next_free_index,
            Entry::Occupied { .. } => {
                panic!(
                    "allocate() found occupied slot {index} on the free list of a pool of capacity {N}"
                );
            }
        };

        // Cannot overflow because the pool was not full.
        self.allocated = self.allocated.wrapping_add(1);

        self.next_free_index = if self.allocated < N {
            next_free_index
        } else {
            N
        };

        #[cfg(debug_assertions)]
        self.integrity_check();

        trace!(index, allocated = self.allocated, "slot allocated");

        Ok(SlotIndex::new(index))
    }

    /// Allocates a slot for a value with the given layout.
    ///
    /// This is the run-time counterpart to the compile-time check performed by
    /// [`insert()`][Self::insert], for callers that only know the layout of their values at run
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElementTooLarge`] if the layout does not fit into a slot and
    /// [`Error::Full`] if every slot is already allocated.
    pub fn allocate_for(&mut self, layout: Layout) -> Result<SlotIndex> {
        if layout.size() > size_of::<S>() || layout.align() > align_of::<S>() {
            return Err(Error::ElementTooLarge {
                size: layout.size(),
                align: layout.align(),
                slot_size: size_of::<S>(),
                slot_align: align_of::<S>(),
            });
        }

        self.allocate()
    }

    /// Allocates a slot and moves `value` into it.
    ///
    /// The pool does not remember the type of the value. Retrieve it with [`get()`][Self::get],
    /// [`remove()`][Self::remove] or [`destroy()`][Self::destroy].
    ///
    /// Fails to compile if `T` does not fit into a slot (see [`fits()`][Self::fits]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Full`] if every slot is already allocated. The value is dropped in that
    /// case.
    pub fn insert<T: Send>(&mut self, value: T) -> Result<SlotIndex> {
        self.place(value)
    }

    /// Same as `insert()` but without the `Send` bound, for wrappers whose own auto traits
    /// already follow `T`.
    pub(crate) fn place<T>(&mut self, value: T) -> Result<SlotIndex> {
        const {
            assert!(
                Self::fits::<T>(),
                "the value type is larger or more strictly aligned than a pool slot"
            );
        };

        let index = self.allocate()?;

        let slot = self
            .occupied_value_mut(index)
            .expect("slot was allocated right above, so it is occupied");

        // SAFETY: The slot is at least as large and as aligned as T (checked at compile time)
        // and we have exclusive access to it through &mut self.
        unsafe {
            slot.as_mut_ptr().cast::<T>().write(value);
        }

        Ok(index)
    }

    /// Returns a pointer to the storage of an allocated slot.
    ///
    /// The pointer is aligned to [`max_item_align()`][Self::max_item_align] and valid for reads
    /// and writes of [`max_item_size()`][Self::max_item_size] bytes until the slot is released,
    /// the pool is moved or the pool is next accessed through an exclusive reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInPool`] if the index is out of range and [`Error::NotAllocated`] if
    /// the slot is not allocated.
    pub fn slot_ptr(&mut self, index: SlotIndex) -> Result<NonNull<u8>> {
        let slot = self.occupied_value_mut(index)?;

        Ok(NonNull::from(slot).cast())
    }

    /// Returns a reference to the value of type `T` stored in an allocated slot, or `None` if
    /// the slot is not allocated.
    ///
    /// Fails to compile if `T` does not fit into a slot.
    ///
    /// # Safety
    ///
    /// If the slot is allocated, the caller must guarantee that it holds an initialized value
    /// of type `T`. If the pool is shared between threads, `T` must be `Sync`.
    #[must_use]
    pub unsafe fn get<T>(&self, index: SlotIndex) -> Option<&T> {
        const {
            assert!(
                Self::fits::<T>(),
                "the value type is larger or more strictly aligned than a pool slot"
            );
        };

        let slot = self.occupied_value(index).ok()?;

        // SAFETY: Size and alignment were checked at compile time, the caller guarantees
        // that the slot holds an initialized T.
        Some(unsafe { &*slot.as_ptr().cast::<T>() })
    }

    /// Returns an exclusive reference to the value of type `T` stored in an allocated slot, or
    /// `None` if the slot is not allocated.
    ///
    /// Fails to compile if `T` does not fit into a slot.
    ///
    /// # Safety
    ///
    /// If the slot is allocated, the caller must guarantee that it holds an initialized value
    /// of type `T`.
    #[must_use]
    pub unsafe fn get_mut<T>(&mut self, index: SlotIndex) -> Option<&mut T> {
        const {
            assert!(
                Self::fits::<T>(),
                "the value type is larger or more strictly aligned than a pool slot"
            );
        };

        let slot = self.occupied_value_mut(index).ok()?;

        // SAFETY: Size and alignment were checked at compile time, the caller guarantees
        // that the slot holds an initialized T and we hold &mut self.
        Some(unsafe { &mut *slot.as_mut_ptr().cast::<T>() })
    }

    /// Moves the value of type `T` out of an allocated slot and releases the slot.
    ///
    /// Fails to compile if `T` does not fit into a slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInPool`] if the index is out of range and [`Error::NotAllocated`] if
    /// the slot is not allocated. The pool is not modified in either case.
    ///
    /// # Safety
    ///
    /// If the slot is allocated, the caller must guarantee that it holds an initialized value
    /// of type `T`.
    pub unsafe fn remove<T>(&mut self, index: SlotIndex) -> Result<T> {
        const {
            assert!(
                Self::fits::<T>(),
                "the value type is larger or more strictly aligned than a pool slot"
            );
        };

        let slot = self.occupied_value_mut(index)?;

        // SAFETY: Size and alignment were checked at compile time, the caller guarantees
        // that the slot holds an initialized T. The slot is released right below, so the
        // value is never read again.
        let value = unsafe { slot.as_ptr().cast::<T>().read() };

        self.release(index)?;

        Ok(value)
    }

    /// Drops the value of type `T` stored in an allocated slot and releases the slot.
    ///
    /// Fails to compile if `T` does not fit into a slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInPool`] if the index is out of range and [`Error::NotAllocated`] if
    /// the slot is not allocated. The pool is not modified in either case.
    ///
    /// # Safety
    ///
    /// If the slot is allocated, the caller must guarantee that it holds an initialized value
    /// of type `T`.
    pub unsafe fn destroy<T>(&mut self, index: SlotIndex) -> Result<()> {
        // SAFETY: Forwarding safety requirements to the caller.
        let value = unsafe { self.remove::<T>(index)? };

        drop(value);

        Ok(())
    }

    /// Returns an allocated slot to the free list.
    ///
    /// The pool does not drop whatever the slot holds. The released slot is the next one to be
    /// handed out by [`allocate()`][Self::allocate].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInPool`] if the index is out of range and [`Error::NotAllocated`] if
    /// the slot is not allocated, e.g. because it was already released. The pool is not
    /// modified in either case.
    pub fn release(&mut self, index: SlotIndex) -> Result<()> {
        let index = index.get();

        if index >= N {
            debug!(index, capacity = N, "rejected release of slot outside the pool");
            return Err(Error::NotInPool);
        }

        let next_free_index = self.next_free_index;

        let Some(entry) = self.entry_mut(index) else {
            debug!(index, "rejected release of slot that was never allocated");
            return Err(Error::NotAllocated { index });
        };

        if matches!(entry, Entry::Vacant { .. }) {
            debug!(index, "rejected release of vacant slot");
            return Err(Error::NotAllocated { index });
        }

        *entry = Entry::Vacant { next_free_index };

        // Push the released slot to the front of the free list.
        self.next_free_index = index;

        // Cannot underflow because the slot was occupied.
        self.allocated = self.allocated.wrapping_sub(1);

        #[cfg(debug_assertions)]
        self.integrity_check();

        trace!(index, allocated = self.allocated, "slot released");

        Ok(())
    }

    /// Returns the slot whose storage starts at `ptr` to the free list.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`index_of()`][Self::index_of]. The pool is not
    /// modified in that case.
    pub fn release_ptr(&mut self, ptr: *const u8) -> Result<()> {
        let index = self.index_of(ptr)?;

        self.release(index)
    }

    /// Releases every slot at once, in constant time.
    ///
    /// The pool does not drop whatever the slots hold. Afterwards the pool behaves as if it had
    /// just been created.
    pub fn release_all(&mut self) {
        debug!(released = self.allocated, "pool reset");

        self.allocated = 0;
        self.initialised = 0;
        self.next_free_index = 0;
    }

    /// Finds the allocated slot whose storage starts at `ptr`.
    ///
    /// This is an exact check: the pointer must be precisely the start of the storage of a slot
    /// of this pool. Pointers into the middle of a slot or into pool bookkeeping are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInPool`] if the pointer does not point at the start of a slot of this
    /// pool and [`Error::NotAllocated`] if it points at a slot that is not allocated.
    pub fn index_of(&self, ptr: *const u8) -> Result<SlotIndex> {
        let index = self.slot_at(ptr).ok_or(Error::NotInPool)?;

        self.occupied_value(index)?;

        Ok(index)
    }

    /// Whether `ptr` is exactly the start of the storage of a slot of this pool.
    ///
    /// This is a bounds check only: it is `true` for the slot boundaries of vacant slots too.
    /// Use [`index_of()`][Self::index_of] or [`contains()`][Self::contains] to also learn whether
    /// the slot is allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use fixed_pool::RawPool;
    ///
    /// let mut pool = RawPool::<u64, 2>::new();
    ///
    /// let index = pool.allocate().unwrap();
    /// let ptr = pool.slot_ptr(index).unwrap().as_ptr().cast_const();
    /// pool.release(index).unwrap();
    ///
    /// assert!(pool.is_in_pool(ptr));
    /// assert!(!pool.is_in_pool(ptr.wrapping_add(1)));
    /// assert!(pool.index_of(ptr).is_err());
    /// ```
    #[must_use]
    pub fn is_in_pool(&self, ptr: *const u8) -> bool {
        self.slot_at(ptr).is_some()
    }

    /// Maps a pointer to the index of the slot whose storage starts exactly there, without
    /// looking at the state of the slot.
    fn slot_at(&self, ptr: *const u8) -> Option<SlotIndex> {
        let base = self.entries.as_ptr().addr();
        let stride = size_of::<MaybeUninit<Entry<S>>>();

        let offset = ptr.addr().checked_sub(base)?;

        #[expect(
            clippy::integer_division,
            reason = "the remainder is checked against the value offset below"
        )]
        let index = offset / stride;

        if index >= N {
            return None;
        }

        // Cannot overflow because index < N and the whole entry array fits in memory.
        let value_start = index.wrapping_mul(stride).wrapping_add(align_of::<S>());

        (offset == value_start).then_some(SlotIndex::new(index))
    }

    /// Whether the index refers to an allocated slot.
    #[must_use]
    pub fn contains(&self, index: SlotIndex) -> bool {
        self.occupied_value(index).is_ok()
    }

    /// Iterates over the indexes of all allocated slots, in ascending order.
    pub fn occupied_indices(&self) -> impl Iterator<Item = SlotIndex> {
        self.occupied_values().map(|(index, _)| index)
    }

    pub(crate) fn occupied_values(&self) -> impl Iterator<Item = (SlotIndex, &MaybeUninit<S>)> {
        self.entries
            .iter()
            .take(self.initialised)
            .enumerate()
            .filter_map(|(index, slot)| {
                // SAFETY: Slots below the initialised mark hold an initialized entry.
                match unsafe { slot.assume_init_ref() } {
                    Entry::Occupied { value } => Some((SlotIndex::new(index), value)),
                    Entry::Vacant { .. } => None,
                }
            })
    }

    pub(crate) fn occupied_values_mut(
        &mut self,
    ) -> impl Iterator<Item = (SlotIndex, &mut MaybeUninit<S>)> {
        self.entries
            .iter_mut()
            .take(self.initialised)
            .enumerate()
            .filter_map(|(index, slot)| {
                // SAFETY: Slots below the initialised mark hold an initialized entry.
                match unsafe { slot.assume_init_mut() } {
                    Entry::Occupied { value } => Some((SlotIndex::new(index), value)),
                    Entry::Vacant { .. } => None,
                }
            })
    }

    pub(crate) fn occupied_value(&self, index: SlotIndex) -> Result<&MaybeUninit<S>> {
        let index = index.get();

        if index >= N {
            return Err(Error::NotInPool);
        }

        match self.entry(index) {
            Some(Entry::Occupied { value }) => Ok(value),
            Some(Entry::Vacant { .. }) | None => Err(Error::NotAllocated { index }),
        }
    }

    pub(crate) fn occupied_value_mut(&mut self, index: SlotIndex) -> Result<&mut MaybeUninit<S>> {
        let index = index.get();

        if index >= N {
            return Err(Error::NotInPool);
        }

        match self.entry_mut(index) {
            Some(Entry::Occupied { value }) => Ok(value),
            Some(Entry::Vacant { .. }) | None => Err(Error::NotAllocated { index }),
        }
    }

    pub(crate) fn drop_policy(&self) -> DropPolicy {
        self.drop_policy
    }

    fn entry(&self, index: usize) -> Option<&Entry<S>> {
        if index >= self.initialised {
            return None;
        }

        let slot = self.entries.get(index)?;

        // SAFETY: Slots below the initialised mark hold an initialized entry.
        Some(unsafe { slot.assume_init_ref() })
    }

    fn entry_mut(&mut self, index: usize) -> Option<&mut Entry<S>> {
        if index >= self.initialised {
            return None;
        }

        let slot = self.entries.get_mut(index)?;

        // SAFETY: Slots below the initialised mark hold an initialized entry.
        Some(unsafe { slot.assume_init_mut() })
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        assert!(
            self.allocated <= self.initialised && self.initialised <= N,
            "pool counters out of order: allocated {} initialised {} capacity {N}",
            self.allocated,
            self.initialised
        );

        let occupied = (0..self.initialised)
            .filter(|&index| matches!(self.entry(index), Some(Entry::Occupied { .. })))
            .count();

        assert_eq!(
            occupied, self.allocated,
            "pool has {occupied} occupied slots but counts {} as allocated",
            self.allocated
        );

        // Walk the free list. It must visit exactly the vacant initialized slots and end at the
        // initialised mark, which is where the lazily built part of the chain continues.
        let mut chain_len: usize = 0;
        let mut index = self.next_free_index;

        while index != self.initialised {
            assert!(
                chain_len < N,
                "free list of pool with capacity {N} does not terminate"
            );

            assert!(
                matches!(self.entry(index), Some(Entry::Vacant { .. })),
                "free list passes through slot {index} which is not a vacant initialized slot"
            );

            if let Some(Entry::Vacant { next_free_index }) = self.entry(index) {
                index = *next_free_index;
            }

            // Cannot overflow because it is bounded by N above.
            chain_len = chain_len.wrapping_add(1);
        }

        // Cannot underflow because allocated <= initialised was asserted above.
        let expected_chain_len = self.initialised.wrapping_sub(self.allocated);

        assert_eq!(
            chain_len, expected_chain_len,
            "free list has {chain_len} slots but {expected_chain_len} initialized slots are vacant"
        );
    }
}

impl<S, const N: usize> Default for RawPool<S, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, const N: usize> fmt::Debug for RawPool<S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawPool")
            .field("slot_type", &type_name::<S>())
            .field("capacity", &N)
            .field("allocated", &self.allocated)
            .field("initialised", &self.initialised)
            .field("next_free_index", &self.next_free_index)
            .field("drop_policy", &self.drop_policy)
            .finish_non_exhaustive()
    }
}

impl<S, const N: usize> Drop for RawPool<S, N> {
    fn drop(&mut self) {
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if thread::panicking() {
            return;
        }

        if self.drop_policy == DropPolicy::MustNotDropItems {
            assert!(
                self.is_empty(),
                "dropped a non-empty pool with a policy that says it must be empty when dropped"
            );
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;
    use std::panic::{RefUnwindSafe, UnwindSafe};

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::{Align1, Align4, Align8, Align16};

    assert_impl_all!(RawPool<u64, 4>: Send, Sync, Debug, Default, UnwindSafe, RefUnwindSafe);
    assert_impl_all!(GenericPool<16, Align8, 4>: Send, Sync, Debug);
    assert_not_impl_any!(RawPool<std::rc::Rc<u8>, 4>: Send, Sync);

    type BytePool<const N: usize> = GenericPool<8, Align8, N>;

    #[test]
    fn new_pool_is_empty() {
        let pool = BytePool::<3>::new();

        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.available(), 3);
        assert!(pool.is_empty());
        assert!(!pool.is_full());
    }

    #[test]
    fn new_pool_touches_no_slot() {
        let pool = BytePool::<1000>::new();

        assert_eq!(pool.initialised, 0);
    }

    #[test]
    fn allocate_hands_out_ascending_slots() {
        let mut pool = BytePool::<3>::new();

        assert_eq!(pool.allocate().unwrap().get(), 0);
        assert_eq!(pool.allocate().unwrap().get(), 1);
        assert_eq!(pool.allocate().unwrap().get(), 2);

        pool.release_all();
    }

    #[test]
    fn allocate_initialises_one_slot_at_a_time() {
        let mut pool = BytePool::<4>::new();

        pool.allocate().unwrap();
        assert_eq!(pool.initialised, 1);

        pool.allocate().unwrap();
        assert_eq!(pool.initialised, 2);

        pool.release_all();
    }

    #[test]
    fn allocate_when_full_fails() {
        let mut pool = BytePool::<2>::new();

        pool.allocate().unwrap();
        pool.allocate().unwrap();

        assert!(pool.is_full());
        assert_eq!(pool.allocate(), Err(Error::Full { capacity: 2 }));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn zero_capacity_pool_is_always_full() {
        let mut pool = BytePool::<0>::new();

        assert!(pool.is_empty());
        assert!(pool.is_full());
        assert_eq!(pool.allocate(), Err(Error::Full { capacity: 0 }));
        assert_eq!(pool.release(SlotIndex::new(0)), Err(Error::NotInPool));
    }

    #[test]
    fn release_reuses_most_recent_slot_first() {
        let mut pool = BytePool::<4>::new();

        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        let c = pool.allocate().unwrap();

        pool.release(a).unwrap();
        pool.release(c).unwrap();

        assert_eq!(pool.allocate().unwrap(), c);
        assert_eq!(pool.allocate().unwrap(), a);

        // The untouched slot is next.
        assert_eq!(pool.allocate().unwrap().get(), 3);
        assert!(pool.is_full());

        pool.release(b).unwrap();
        assert_eq!(pool.allocate().unwrap(), b);
    }

    #[test]
    fn release_when_full_and_reallocate() {
        let mut pool = BytePool::<2>::new();

        let a = pool.allocate().unwrap();
        pool.allocate().unwrap();

        pool.release(a).unwrap();
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.allocate().unwrap(), a);
        assert!(pool.is_full());
    }

    #[test]
    fn double_release_is_rejected() {
        let mut pool = BytePool::<3>::new();

        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        pool.release(a).unwrap();

        assert_eq!(pool.release(a), Err(Error::NotAllocated { index: 0 }));

        // The free list is intact: a comes back first, then the untouched slot.
        assert_eq!(pool.allocate().unwrap(), a);
        assert_eq!(pool.allocate().unwrap().get(), 2);
        assert_eq!(pool.len(), 3);
        _ = b;
    }

    #[test]
    fn release_of_untouched_slot_is_rejected() {
        let mut pool = BytePool::<3>::new();

        assert_eq!(
            pool.release(SlotIndex::new(2)),
            Err(Error::NotAllocated { index: 2 })
        );
        assert!(pool.is_empty());
    }

    #[test]
    fn release_out_of_range_is_rejected() {
        let mut pool = BytePool::<3>::new();
        pool.allocate().unwrap();

        assert_eq!(pool.release(SlotIndex::new(3)), Err(Error::NotInPool));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn release_all_resets_pool() {
        let mut pool = BytePool::<3>::new();

        pool.allocate().unwrap();
        pool.allocate().unwrap();
        pool.release_all();

        assert!(pool.is_empty());
        assert_eq!(pool.available(), 3);
        assert_eq!(pool.allocate().unwrap().get(), 0);
        assert_eq!(pool.allocate().unwrap().get(), 1);
        assert_eq!(pool.allocate().unwrap().get(), 2);

        pool.release_all();
    }

    #[test]
    fn insert_and_remove_values_of_mixed_types() {
        let mut pool = GenericPool::<16, Align16, 3>::new();

        let a = pool.insert(1_u8).unwrap();
        let b = pool.insert(0x0102_0304_0506_0708_u64).unwrap();
        let c = pool.insert([9_u32; 4]).unwrap();

        // SAFETY: Every slot is read as the type it was inserted as.
        unsafe {
            assert_eq!(pool.get::<u8>(a), Some(&1));
            assert_eq!(pool.get::<u64>(b), Some(&0x0102_0304_0506_0708));

            *pool.get_mut::<[u32; 4]>(c).unwrap() = [7; 4];

            assert_eq!(pool.remove::<[u32; 4]>(c), Ok([7; 4]));
            assert_eq!(pool.remove::<u64>(b), Ok(0x0102_0304_0506_0708));
            assert_eq!(pool.remove::<u8>(a), Ok(1));
        }

        assert!(pool.is_empty());
    }

    #[test]
    fn insert_when_full_fails() {
        let mut pool = RawPool::<u32, 1>::new();

        pool.insert(1_u32).unwrap();

        assert_eq!(pool.insert(2_u32), Err(Error::Full { capacity: 1 }));

        pool.release_all();
    }

    #[test]
    fn get_of_vacant_slot_is_none() {
        let mut pool = RawPool::<u32, 2>::new();

        let a = pool.insert(5_u32).unwrap();
        pool.release(a).unwrap();

        // SAFETY: No allocated slot is accessed.
        unsafe {
            assert_eq!(pool.get::<u32>(a), None);
            assert_eq!(pool.get_mut::<u32>(a), None);
            assert_eq!(pool.get::<u32>(SlotIndex::new(99)), None);
        }
    }

    #[test]
    fn remove_of_vacant_slot_fails() {
        let mut pool = RawPool::<u32, 2>::new();

        // SAFETY: No allocated slot is accessed.
        let result = unsafe { pool.remove::<u32>(SlotIndex::new(1)) };

        assert_eq!(result, Err(Error::NotAllocated { index: 1 }));
    }

    #[test]
    fn destroy_runs_drop() {
        let mut pool = GenericPool::<24, Align8, 2>::new();

        let value = std::sync::Arc::new(5);
        let index = pool.insert(std::sync::Arc::clone(&value)).unwrap();
        assert_eq!(std::sync::Arc::strong_count(&value), 2);

        // SAFETY: The slot holds the Arc we inserted.
        unsafe {
            pool.destroy::<std::sync::Arc<i32>>(index).unwrap();
        }

        assert_eq!(std::sync::Arc::strong_count(&value), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn fits_checks_size_and_alignment() {
        assert!(GenericPool::<8, Align8, 1>::fits::<u64>());
        assert!(GenericPool::<8, Align8, 1>::fits::<u8>());
        assert!(!GenericPool::<8, Align8, 1>::fits::<u128>());
        assert!(!GenericPool::<8, Align1, 1>::fits::<u64>());
        assert!(GenericPool::<8, Align1, 1>::fits::<[u8; 8]>());
    }

    #[test]
    fn max_item_layout_reflects_slot_shape() {
        let pool = GenericPool::<12, Align4, 1>::new();

        assert_eq!(pool.max_item_size(), 12);
        assert_eq!(pool.max_item_align(), 4);
    }

    #[test]
    fn allocate_for_checks_layout() {
        let mut pool = GenericPool::<8, Align8, 2>::new();

        assert_eq!(
            pool.allocate_for(Layout::new::<[u64; 2]>()),
            Err(Error::ElementTooLarge {
                size: 16,
                align: 8,
                slot_size: 8,
                slot_align: 8,
            })
        );
        assert_eq!(
            pool.allocate_for(Layout::from_size_align(4, 16).unwrap()),
            Err(Error::ElementTooLarge {
                size: 4,
                align: 16,
                slot_size: 8,
                slot_align: 8,
            })
        );
        assert!(pool.is_empty());

        assert_eq!(pool.allocate_for(Layout::new::<u32>()).unwrap().get(), 0);

        pool.release_all();
    }

    #[test]
    fn slot_ptr_is_aligned_and_distinct() {
        let mut pool = GenericPool::<8, Align8, 3>::new();

        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();

        let a_ptr = pool.slot_ptr(a).unwrap();
        let b_ptr = pool.slot_ptr(b).unwrap();

        assert_ne!(a_ptr, b_ptr);
        assert_eq!(a_ptr.as_ptr().addr() % 8, 0);
        assert_eq!(b_ptr.as_ptr().addr() % 8, 0);
        assert!(a_ptr.as_ptr().addr().abs_diff(b_ptr.as_ptr().addr()) >= 8);

        pool.release_all();
    }

    #[test]
    fn slot_ptr_writes_are_visible_through_get() {
        let mut pool = RawPool::<u64, 2>::new();

        let index = pool.allocate().unwrap();
        let ptr = pool.slot_ptr(index).unwrap();

        // SAFETY: The slot is allocated, sized and aligned for u64 and nothing else accesses it.
        unsafe {
            ptr.cast::<u64>().write(77);
        }

        // SAFETY: We just initialized the slot as u64.
        assert_eq!(unsafe { pool.get::<u64>(index) }, Some(&77));

        pool.release(index).unwrap();
    }

    #[test]
    fn slot_ptr_of_vacant_slot_fails() {
        let mut pool = RawPool::<u64, 2>::new();

        assert_eq!(
            pool.slot_ptr(SlotIndex::new(0)),
            Err(Error::NotAllocated { index: 0 })
        );
        assert_eq!(pool.slot_ptr(SlotIndex::new(2)), Err(Error::NotInPool));
    }

    #[test]
    fn index_of_finds_exact_slot_address() {
        let mut pool = GenericPool::<8, Align8, 3>::new();

        pool.allocate().unwrap();
        let b = pool.allocate().unwrap();

        let ptr = pool.slot_ptr(b).unwrap().as_ptr().cast_const();

        assert_eq!(pool.index_of(ptr), Ok(b));
        assert!(pool.is_in_pool(ptr));

        pool.release_all();
    }

    #[test]
    fn index_of_rejects_foreign_and_interior_pointers() {
        let mut pool = GenericPool::<8, Align8, 3>::new();
        let index = pool.allocate().unwrap();
        let ptr = pool.slot_ptr(index).unwrap().as_ptr().cast_const();

        let outside = 5_u64;
        assert_eq!(
            pool.index_of(std::ptr::from_ref(&outside).cast()),
            Err(Error::NotInPool)
        );
        assert_eq!(pool.index_of(std::ptr::null()), Err(Error::NotInPool));
        assert_eq!(pool.index_of(ptr.wrapping_add(1)), Err(Error::NotInPool));
        assert!(!pool.is_in_pool(ptr.wrapping_add(3)));

        pool.release_all();
    }

    #[test]
    fn release_ptr_releases_slot() {
        let mut pool = GenericPool::<8, Align8, 3>::new();

        let a = pool.allocate().unwrap();
        let ptr = pool.slot_ptr(a).unwrap().as_ptr().cast_const();

        pool.release_ptr(ptr).unwrap();

        assert!(pool.is_empty());
        assert!(pool.is_in_pool(ptr));
        assert_eq!(pool.index_of(ptr), Err(Error::NotAllocated { index: 0 }));
        assert_eq!(pool.release_ptr(ptr), Err(Error::NotAllocated { index: 0 }));
    }

    #[test]
    fn is_in_pool_accepts_vacant_slot_boundaries() {
        let mut pool = GenericPool::<8, Align8, 3>::new();

        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        let c = pool.allocate().unwrap();

        let a_ptr = pool.slot_ptr(a).unwrap().as_ptr().cast_const();
        let b_ptr = pool.slot_ptr(b).unwrap().as_ptr().cast_const();
        let c_ptr = pool.slot_ptr(c).unwrap().as_ptr().cast_const();

        // A released slot is still part of the pool.
        pool.release(b).unwrap();
        assert!(pool.is_in_pool(b_ptr));
        assert_eq!(pool.index_of(b_ptr), Err(Error::NotAllocated { index: 1 }));

        // So are slots that the reset made untouched again.
        pool.release_all();

        for ptr in [a_ptr, b_ptr, c_ptr] {
            assert!(pool.is_in_pool(ptr));
            assert!(!pool.is_in_pool(ptr.wrapping_add(1)));
            assert!(matches!(pool.index_of(ptr), Err(Error::NotAllocated { .. })));
        }

        // One stride past the last slot is outside the pool.
        let stride = b_ptr.addr().wrapping_sub(a_ptr.addr());
        assert!(!pool.is_in_pool(c_ptr.wrapping_add(stride)));
        assert_eq!(pool.index_of(c_ptr.wrapping_add(stride)), Err(Error::NotInPool));
    }

    #[test]
    fn release_ptr_of_interior_pointer_leaves_pool_intact() {
        let mut pool = GenericPool::<8, Align8, 2>::new();

        let a = pool.allocate().unwrap();
        let ptr = pool.slot_ptr(a).unwrap().as_ptr().cast_const();

        assert_eq!(pool.release_ptr(ptr.wrapping_add(2)), Err(Error::NotInPool));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(a));

        pool.release(a).unwrap();
    }

    #[test]
    fn occupied_indices_lists_allocated_slots() {
        let mut pool = BytePool::<5>::new();

        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        let c = pool.allocate().unwrap();
        pool.release(b).unwrap();

        let occupied: Vec<_> = pool.occupied_indices().collect();
        assert_eq!(occupied, vec![a, c]);

        pool.release_all();
        assert_eq!(pool.occupied_indices().count(), 0);
    }

    #[test]
    fn contains_reflects_allocation_state() {
        let mut pool = BytePool::<2>::new();

        let a = pool.allocate().unwrap();
        assert!(pool.contains(a));
        assert!(!pool.contains(SlotIndex::new(1)));
        assert!(!pool.contains(SlotIndex::new(2)));

        pool.release(a).unwrap();
        assert!(!pool.contains(a));
    }

    #[test]
    fn pool_can_be_moved_between_operations() {
        let mut pool = BytePool::<2>::new();
        let a = pool.insert(11_u64).unwrap();

        let mut moved = pool;

        // SAFETY: The slot holds the u64 inserted above.
        assert_eq!(unsafe { moved.remove::<u64>(a) }, Ok(11));
    }

    #[test]
    fn static_pool_is_const_constructible() {
        static POOL: RawPool<u32, 8> = RawPool::new();

        assert_eq!(POOL.capacity(), 8);
        assert!(POOL.is_empty());
    }

    #[test]
    fn drop_with_items_is_allowed_by_default() {
        let mut pool = BytePool::<2>::new();
        pool.allocate().unwrap();

        drop(pool);
    }

    #[test]
    #[should_panic]
    fn drop_with_items_panics_if_forbidden() {
        let mut pool = BytePool::<2>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();
        pool.allocate().unwrap();

        drop(pool);
    }

    #[test]
    fn drop_when_empty_is_fine_if_items_forbidden() {
        let mut pool = BytePool::<2>::builder()
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();
        let a = pool.allocate().unwrap();
        pool.release(a).unwrap();

        drop(pool);
    }

    #[test]
    fn debug_output_names_counters() {
        let mut pool = BytePool::<2>::new();
        pool.allocate().unwrap();

        let output = format!("{pool:?}");

        assert!(output.contains("RawPool"));
        assert!(output.contains("allocated: 1"));

        pool.release_all();
    }
}
