use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use tracing::trace;

use crate::{Error, Indices, Iter, Link, Linked, NodeStore, Position, Result, sorting};

/// A singly-linked list that threads externally owned nodes together through a [`Link`]
/// embedded in each node.
///
/// The list owns no nodes and never allocates. It stores only a sentinel link and its length;
/// the nodes live in a [`NodeStore`] that the caller passes to every operation that touches
/// them, and are identified by their index in that store. Unlinking a node does not destroy it:
/// the operations that unlink nodes hand their indexes back (one by one or as a detached list)
/// so the caller can dispose of them, typically by returning them to the pool they came from.
///
/// Because links only point forward, insertion and removal take the [`Position`] *before* the
/// affected node. [`before_begin()`][Self::before_begin] names the position before the first node.
///
/// Every operation must be given the same store. A node must be on at most one list at a time
/// and must not be inserted while it is already linked.
///
/// # Examples
///
/// ```
/// use intrusive_slist::{IntrusiveList, Link, Linked, Position};
///
/// #[derive(Debug)]
/// struct Job {
///     id: u32,
///     link: Link,
/// }
///
/// impl Linked for Job {
///     fn link(&self) -> &Link {
///         &self.link
///     }
///
///     fn link_mut(&mut self) -> &mut Link {
///         &mut self.link
///     }
/// }
///
/// let mut jobs: Vec<Job> = (0..4).map(|id| Job { id, link: Link::new() }).collect();
/// let mut queue = IntrusiveList::new();
///
/// let last = queue.insert_range_after(&mut jobs, Position::BeforeBegin, [2, 0, 3]);
/// queue.insert_after(&mut jobs, last, 1);
///
/// let ids: Vec<_> = queue.iter(&jobs).map(|job| job.id).collect();
/// assert_eq!(ids, [2, 0, 3, 1]);
///
/// queue.sort_by_key(&mut jobs, |job| job.id);
/// assert_eq!(queue.pop_front(&mut jobs), Ok(0));
/// assert_eq!(queue.len(), 3);
/// ```
pub struct IntrusiveList<T> {
    sentinel: Link,
    len: usize,

    _nodes: PhantomData<fn(&T)>,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sentinel: Link::new(),
            len: 0,
            _nodes: PhantomData,
        }
    }

    /// The number of nodes on the list.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no nodes.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The position before the first node, at which nodes can be inserted at the front.
    #[must_use]
    #[inline]
    pub const fn before_begin(&self) -> Position {
        Position::BeforeBegin
    }

    /// The index of the first node, or `None` if the list is empty.
    #[must_use]
    #[inline]
    pub const fn front_index(&self) -> Option<usize> {
        self.sentinel.next()
    }
}

impl<T: Linked> IntrusiveList<T> {
    /// The index of the node that follows the node at `index`, or `None` if it is the last node.
    #[must_use]
    pub fn next_index<S>(&self, store: &S, index: usize) -> Option<usize>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        store.node(index).link().next()
    }

    /// Returns the first node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the list is empty.
    pub fn front<'a, S>(&self, store: &'a S) -> Result<&'a T>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let index = self.front_index().ok_or(Error::Empty { operation: "front" })?;

        Ok(store.node(index))
    }

    /// Returns the first node for modification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the list is empty.
    pub fn front_mut<'a, S>(&self, store: &'a mut S) -> Result<&'a mut T>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let index = self.front_index().ok_or(Error::Empty {
            operation: "front_mut",
        })?;

        Ok(store.node_mut(index))
    }

    /// Links the node at `index` in as the new first node.
    pub fn push_front<S>(&mut self, store: &mut S, index: usize)
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        self.insert_after(store, Position::BeforeBegin, index);
    }

    /// Links the node at `index` in after `position` and returns the position of the new node,
    /// so that consecutive inserts keep their order.
    ///
    /// The node must not currently be linked into any list.
    pub fn insert_after<S>(&mut self, store: &mut S, position: Position, index: usize) -> Position
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let next = self.next_of(store, position);

        store.node_mut(index).link_mut().set_next(next);
        self.set_next_of(store, position, Some(index));

        // Cannot overflow because every node on the list is a distinct value in memory.
        self.len = self.len.wrapping_add(1);

        Position::At(index)
    }

    /// Links the nodes at `indices` in after `position`, preserving their order, and returns the
    /// position of the last inserted node (or `position` itself if `indices` is empty).
    ///
    /// None of the nodes may currently be linked into any list.
    pub fn insert_range_after<S, I>(
        &mut self,
        store: &mut S,
        position: Position,
        indices: I,
    ) -> Position
    where
        S: NodeStore<Node = T> + ?Sized,
        I: IntoIterator<Item = usize>,
    {
        indices
            .into_iter()
            .fold(position, |position, index| self.insert_after(store, position, index))
    }

    /// Unlinks the first node and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the list is empty. The list is not modified in that case.
    pub fn pop_front<S>(&mut self, store: &mut S) -> Result<usize>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        self.erase_after(store, Position::BeforeBegin)
            .ok_or(Error::Empty {
                operation: "pop_front",
            })
    }

    /// Unlinks the node that follows `position` and returns its index, or returns `None` if
    /// `position` is the last position of the list.
    ///
    /// The unlinked node is not destroyed; its link is reset.
    pub fn erase_after<S>(&mut self, store: &mut S, position: Position) -> Option<usize>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let index = self.next_of(store, position)?;
        let after = store.node(index).link().next();

        self.set_next_of(store, position, after);
        store.node_mut(index).link_mut().set_next(None);

        // Cannot underflow because the node was on the list.
        self.len = self.len.wrapping_sub(1);

        Some(index)
    }

    /// Unlinks every node strictly between `first` and the node at `last` (or the end of the
    /// list if `last` is `None`) and returns them, in order, as a new list.
    ///
    /// Returns an empty list if `last` directly follows `first`.
    ///
    /// # Panics
    ///
    /// Panics if `last` is `Some` but does not come after `first` on this list. The list is not
    /// modified in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_slist::{IntrusiveList, Link, Linked, Position};
    ///
    /// #[derive(Debug, Default)]
    /// struct Node {
    ///     link: Link,
    /// }
    ///
    /// impl Linked for Node {
    ///     fn link(&self) -> &Link {
    ///         &self.link
    ///     }
    ///
    ///     fn link_mut(&mut self) -> &mut Link {
    ///         &mut self.link
    ///     }
    /// }
    ///
    /// let mut nodes: [Node; 5] = Default::default();
    /// let mut list = IntrusiveList::new();
    /// list.insert_range_after(&mut nodes, Position::BeforeBegin, 0..5);
    ///
    /// // Erase the nodes between 1 and 4.
    /// let erased = list.erase_range_after(&mut nodes, Position::At(1), Some(4));
    ///
    /// assert!(list.indices(&nodes).eq([0, 1, 4]));
    /// assert!(erased.indices(&nodes).eq([2, 3]));
    /// ```
    pub fn erase_range_after<S>(
        &mut self,
        store: &mut S,
        first: Position,
        last: Option<usize>,
    ) -> Self
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let head = self.next_of(store, first);

        // Measure the range before touching anything.
        let mut count: usize = 0;
        let mut range_tail = None;
        let mut cursor = head;

        while cursor != last {
            let Some(index) = cursor else {
                panic!(
                    "erase_range_after() end node {last:?} does not follow {first:?} on the list"
                );
            };

            range_tail = Some(index);
            cursor = store.node(index).link().next();

            // Cannot overflow because the count is bounded by the number of nodes on the list.
            count = count.wrapping_add(1);
        }

        let mut erased = Self::new();

        let Some(range_tail) = range_tail else {
            return erased;
        };

        self.set_next_of(store, first, last);
        store.node_mut(range_tail).link_mut().set_next(None);

        // Cannot underflow because the range was counted on this list.
        self.len = self.len.wrapping_sub(count);

        erased.sentinel.set_next(head);
        erased.len = count;

        #[cfg(debug_assertions)]
        {
            self.integrity_check(store);
            erased.integrity_check(store);
        }

        erased
    }

    /// Unlinks every node equal to `value` and returns them, in order, as a new list. The order
    /// of the remaining nodes is preserved.
    pub fn remove<S>(&mut self, store: &mut S, value: &T) -> Self
    where
        T: PartialEq,
        S: NodeStore<Node = T> + ?Sized,
    {
        self.remove_if(store, |node| node == value)
    }

    /// Unlinks every node for which `predicate` returns `true` and returns them, in order, as a
    /// new list. The order of the remaining nodes is preserved.
    pub fn remove_if<S, F>(&mut self, store: &mut S, mut predicate: F) -> Self
    where
        S: NodeStore<Node = T> + ?Sized,
        F: FnMut(&T) -> bool,
    {
        let mut removed = Self::new();
        let mut removed_tail = Position::BeforeBegin;

        let mut previous = Position::BeforeBegin;

        while let Some(index) = self.next_of(store, previous) {
            if predicate(store.node(index)) {
                self.erase_after(store, previous);
                removed_tail = removed.insert_after(store, removed_tail, index);
            } else {
                previous = Position::At(index);
            }
        }

        #[cfg(debug_assertions)]
        self.integrity_check(store);

        removed
    }

    /// Collapses every run of consecutive equal nodes to the first node of the run and returns
    /// the unlinked nodes, in order, as a new list.
    pub fn unique<S>(&mut self, store: &mut S) -> Self
    where
        T: PartialEq,
        S: NodeStore<Node = T> + ?Sized,
    {
        self.unique_by(store, |current, kept| current == kept)
    }

    /// Collapses every run of consecutive nodes that `same` considers equal to the first node of
    /// the run and returns the unlinked nodes, in order, as a new list.
    ///
    /// `same` receives a node and the most recent node that was kept, in that order, and the node
    /// is unlinked if `same` returns `true`.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_slist::{IntrusiveList, Link, Linked, Position};
    ///
    /// #[derive(Debug)]
    /// struct Reading {
    ///     celsius: i32,
    ///     link: Link,
    /// }
    ///
    /// impl Linked for Reading {
    ///     fn link(&self) -> &Link {
    ///         &self.link
    ///     }
    ///
    ///     fn link_mut(&mut self) -> &mut Link {
    ///         &mut self.link
    ///     }
    /// }
    ///
    /// let mut readings: Vec<_> = [20, 21, 22, 30, 29]
    ///     .into_iter()
    ///     .map(|celsius| Reading { celsius, link: Link::new() })
    ///     .collect();
    ///
    /// let mut list = IntrusiveList::new();
    /// list.insert_range_after(&mut readings, Position::BeforeBegin, 0..5);
    ///
    /// // Drop readings that stay within 2 degrees of the last kept reading.
    /// let dropped = list.unique_by(&mut readings, |current, kept| {
    ///     (current.celsius - kept.celsius).abs() <= 2
    /// });
    ///
    /// let kept: Vec<_> = list.iter(&readings).map(|r| r.celsius).collect();
    /// assert_eq!(kept, [20, 30]);
    /// assert_eq!(dropped.len(), 3);
    /// ```
    pub fn unique_by<S, F>(&mut self, store: &mut S, mut same: F) -> Self
    where
        S: NodeStore<Node = T> + ?Sized,
        F: FnMut(&T, &T) -> bool,
    {
        let mut removed = Self::new();
        let mut removed_tail = Position::BeforeBegin;

        let Some(mut kept) = self.front_index() else {
            return removed;
        };

        while let Some(index) = store.node(kept).link().next() {
            if same(store.node(index), store.node(kept)) {
                self.erase_after(store, Position::At(kept));
                removed_tail = removed.insert_after(store, removed_tail, index);
            } else {
                kept = index;
            }
        }

        #[cfg(debug_assertions)]
        self.integrity_check(store);

        removed
    }

    /// Reverses the order of the nodes in place.
    pub fn reverse<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let mut reversed: Option<usize> = None;
        let mut cursor = self.sentinel.next();

        while let Some(index) = cursor {
            let link = store.node_mut(index).link_mut();

            cursor = link.next();
            link.set_next(reversed);
            reversed = Some(index);
        }

        self.sentinel.set_next(reversed);

        #[cfg(debug_assertions)]
        self.integrity_check(store);
    }

    /// Unlinks every node, resetting their links, and leaves the list empty.
    pub fn clear<S>(&mut self, store: &mut S)
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let mut cursor = self.sentinel.next();

        while let Some(index) = cursor {
            let link = store.node_mut(index).link_mut();

            cursor = link.next();
            link.set_next(None);
        }

        self.sentinel.set_next(None);
        self.len = 0;
    }

    /// Replaces the contents of the list with the nodes at `indices`, in order.
    ///
    /// The nodes previously on the list are unlinked, not destroyed.
    pub fn assign<S, I>(&mut self, store: &mut S, indices: I)
    where
        S: NodeStore<Node = T> + ?Sized,
        I: IntoIterator<Item = usize>,
    {
        self.clear(store);
        self.insert_range_after(store, Position::BeforeBegin, indices);
    }

    /// Moves every node of `other` into this list after `position`, preserving their order.
    /// `other` is left empty.
    ///
    /// Both lists must thread nodes of the same store.
    pub fn splice_after<S>(&mut self, store: &mut S, position: Position, other: &mut Self)
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let Some(other_front) = other.sentinel.next() else {
            return;
        };

        let mut other_tail = other_front;
        while let Some(next) = store.node(other_tail).link().next() {
            other_tail = next;
        }

        let after = self.next_of(store, position);

        store.node_mut(other_tail).link_mut().set_next(after);
        self.set_next_of(store, position, Some(other_front));

        // Cannot overflow because every node on either list is a distinct value in memory.
        self.len = self.len.wrapping_add(other.len);

        other.sentinel.set_next(None);
        other.len = 0;

        #[cfg(debug_assertions)]
        self.integrity_check(store);
    }

    /// Moves the node that follows `source` on `other` into this list after `position` and
    /// returns its index, or returns `None` if `source` is the last position of `other`.
    ///
    /// Both lists must thread nodes of the same store. To move a node within one list, use
    /// [`move_after()`][Self::move_after].
    pub fn splice_one_after<S>(
        &mut self,
        store: &mut S,
        position: Position,
        other: &mut Self,
        source: Position,
    ) -> Option<usize>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let index = other.erase_after(store, source)?;

        self.insert_after(store, position, index);

        #[cfg(debug_assertions)]
        {
            self.integrity_check(store);
            other.integrity_check(store);
        }

        Some(index)
    }

    /// Moves the nodes of `other` strictly between `first` and the node at `last` (or the end of
    /// `other` if `last` is `None`) into this list after `position`, preserving their order.
    ///
    /// Both lists must thread nodes of the same store. To move a range within one list, use
    /// [`move_range_after()`][Self::move_range_after].
    ///
    /// # Panics
    ///
    /// Panics if `last` is `Some` but does not come after `first` on `other`. Neither list is
    /// modified in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_slist::{IntrusiveList, Link, Linked, Position};
    ///
    /// #[derive(Debug, Default)]
    /// struct Node {
    ///     link: Link,
    /// }
    ///
    /// impl Linked for Node {
    ///     fn link(&self) -> &Link {
    ///         &self.link
    ///     }
    ///
    ///     fn link_mut(&mut self) -> &mut Link {
    ///         &mut self.link
    ///     }
    /// }
    ///
    /// let mut nodes: [Node; 6] = Default::default();
    /// let mut list = IntrusiveList::new();
    /// let mut other = IntrusiveList::new();
    /// list.insert_range_after(&mut nodes, Position::BeforeBegin, [0, 1]);
    /// other.insert_range_after(&mut nodes, Position::BeforeBegin, [2, 3, 4, 5]);
    ///
    /// // Move the nodes between 2 and 5 to the end of the first list.
    /// list.splice_range_after(&mut nodes, Position::At(1), &mut other, Position::At(2), Some(5));
    ///
    /// assert!(list.indices(&nodes).eq([0, 1, 3, 4]));
    /// assert!(other.indices(&nodes).eq([2, 5]));
    /// ```
    pub fn splice_range_after<S>(
        &mut self,
        store: &mut S,
        position: Position,
        other: &mut Self,
        first: Position,
        last: Option<usize>,
    ) where
        S: NodeStore<Node = T> + ?Sized,
    {
        let mut moved = other.erase_range_after(store, first, last);

        self.splice_after(store, position, &mut moved);
    }

    /// Moves the node that follows `source` so that it follows `position` instead, on this same
    /// list, and returns its index. Returns `None` if `source` is the last position of the list.
    ///
    /// Moving a node after itself leaves the list unchanged.
    pub fn move_after<S>(
        &mut self,
        store: &mut S,
        position: Position,
        source: Position,
    ) -> Option<usize>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let index = self.next_of(store, source)?;

        if position == Position::At(index) || position == source {
            return Some(index);
        }

        self.erase_after(store, source);
        self.insert_after(store, position, index);

        Some(index)
    }

    /// Moves the nodes strictly between `first` and the node at `last` (or the end of the list
    /// if `last` is `None`) so that they follow `position` instead, on this same list,
    /// preserving their order.
    ///
    /// # Panics
    ///
    /// Panics if `last` is `Some` but does not come after `first`, or if `position` is one of the
    /// nodes being moved. The list is not modified in either case.
    pub fn move_range_after<S>(
        &mut self,
        store: &mut S,
        position: Position,
        first: Position,
        last: Option<usize>,
    ) where
        S: NodeStore<Node = T> + ?Sized,
    {
        if let Position::At(target) = position {
            let mut cursor = self.next_of(store, first);

            while cursor != last {
                let Some(index) = cursor else {
                    break;
                };

                assert!(
                    index != target,
                    "move_range_after() target node {target} lies inside the moved range"
                );

                cursor = store.node(index).link().next();
            }
        }

        let mut moved = self.erase_range_after(store, first, last);

        self.splice_after(store, position, &mut moved);
    }

    /// Merges the sorted list `other` into this sorted list, leaving `other` empty.
    ///
    /// The merge is stable: of two equal nodes, one from each list, the node of this list comes
    /// first.
    pub fn merge<S>(&mut self, store: &mut S, other: &mut Self)
    where
        T: Ord,
        S: NodeStore<Node = T> + ?Sized,
    {
        self.merge_by(store, other, T::cmp);
    }

    /// Merges `other` into this list, where both lists are sorted according to `compare`, leaving
    /// `other` empty.
    ///
    /// The merge is stable: of two equal nodes, one from each list, the node of this list comes
    /// first.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if either list is not sorted according to `compare`.
    pub fn merge_by<S, F>(&mut self, store: &mut S, other: &mut Self, mut compare: F)
    where
        S: NodeStore<Node = T> + ?Sized,
        F: FnMut(&T, &T) -> Ordering,
    {
        #[cfg(debug_assertions)]
        {
            self.sorted_check(store, &mut compare);
            other.sorted_check(store, &mut compare);
        }

        let merged = sorting::merge_chains(
            store,
            self.sentinel.next(),
            other.sentinel.next(),
            &mut compare,
        );

        self.sentinel.set_next(merged.map(|(head, _)| head));

        // Cannot overflow because every node on either list is a distinct value in memory.
        self.len = self.len.wrapping_add(other.len);

        other.sentinel.set_next(None);
        other.len = 0;

        trace!(len = self.len, "lists merged");

        #[cfg(debug_assertions)]
        self.integrity_check(store);
    }

    /// Iterates over the nodes, front to back.
    pub fn iter<'a, S>(&self, store: &'a S) -> Iter<'a, S>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        Iter::new(store, self.sentinel.next(), self.len)
    }

    /// Iterates over the node indexes, front to back.
    pub fn indices<'a, S>(&self, store: &'a S) -> Indices<'a, S>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        Indices::new(store, self.sentinel.next(), self.len)
    }

    /// Whether the node at `index` is on this list. This walks the list.
    #[must_use]
    pub fn contains_index<S>(&self, store: &S, index: usize) -> bool
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        self.indices(store).any(|candidate| candidate == index)
    }

    /// The link that `position` stands for, read through `store`.
    pub(crate) fn next_of<S>(&self, store: &S, position: Position) -> Option<usize>
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        match position {
            Position::BeforeBegin => self.sentinel.next(),
            Position::At(index) => store.node(index).link().next(),
        }
    }

    pub(crate) fn set_next_of<S>(&mut self, store: &mut S, position: Position, next: Option<usize>)
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        match position {
            Position::BeforeBegin => self.sentinel.set_next(next),
            Position::At(index) => store.node_mut(index).link_mut().set_next(next),
        }
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    fn sorted_check<S, F>(&self, store: &S, compare: &mut F)
    where
        S: NodeStore<Node = T> + ?Sized,
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut previous = self.sentinel.next();

        while let Some(before) = previous {
            let Some(after) = store.node(before).link().next() else {
                break;
            };

            assert!(
                compare(store.node(after), store.node(before)) != Ordering::Less,
                "merge_by() requires sorted lists but node {after} sorts before node {before}"
            );

            previous = Some(after);
        }
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check<S>(&self, store: &S)
    where
        S: NodeStore<Node = T> + ?Sized,
    {
        let mut reachable: usize = 0;
        let mut cursor = self.sentinel.next();

        while let Some(index) = cursor {
            assert!(
                reachable < self.len,
                "list of length {} has more reachable nodes than its length, or a cycle",
                self.len
            );

            cursor = store.node(index).link().next();

            // Cannot overflow because it is bounded by len above.
            reachable = reachable.wrapping_add(1);
        }

        assert_eq!(
            reachable, self.len,
            "list of length {} has only {reachable} reachable nodes",
            self.len
        );
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IntrusiveList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntrusiveList")
            .field("front", &self.sentinel.next())
            .field("len", &self.len)
            .finish()
    }
}
