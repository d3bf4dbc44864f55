//! Stable in-place merge sort for [`IntrusiveList`].
//!
//! The list can only be walked forward and no scratch memory is available, so the sort works
//! bottom-up: every pass walks the list once, finds adjacent pairs of runs (maximal stretches of
//! nodes that are already in order), merges each pair and splices the result back where the pair
//! was. A pass that finds at most one run means the list is sorted. Each pass at least halves the
//! number of runs, which bounds the work at O(n log n) with O(1) extra space.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::{IntrusiveList, Linked, NodeStore, Position};

impl<T: Linked> IntrusiveList<T> {
    /// Sorts the nodes in ascending order.
    ///
    /// The sort is stable: equal nodes keep their relative order. Only links are rewritten; the
    /// nodes stay where they are in the store.
    ///
    /// # Examples
    ///
    /// ```
    /// use intrusive_slist::{IntrusiveList, Link, Linked, Position};
    ///
    /// #[derive(Debug, Eq, Ord, PartialEq, PartialOrd)]
    /// struct Node {
    ///     key: u8,
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
    /// let mut nodes: Vec<_> = [3, 1, 2]
    ///     .into_iter()
    ///     .map(|key| Node { key, link: Link::new() })
    ///     .collect();
    ///
    /// let mut list = IntrusiveList::new();
    /// list.insert_range_after(&mut nodes, Position::BeforeBegin, 0..3);
    /// list.sort(&mut nodes);
    ///
    /// assert!(list.indices(&nodes).eq([1, 2, 0]));
    /// ```
    pub fn sort<S>(&mut self, store: &mut S)
    where
        T: Ord,
        S: NodeStore<Node = T> + ?Sized,
    {
        self.sort_by(store, T::cmp);
    }

    /// Sorts the nodes with a key extraction function.
    ///
    /// The sort is stable: nodes with equal keys keep their relative order. The key function is
    /// called O(n log n) times.
    pub fn sort_by_key<S, K, F>(&mut self, store: &mut S, mut key: F)
    where
        S: NodeStore<Node = T> + ?Sized,
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.sort_by(store, |a, b| key(a).cmp(&key(b)));
    }

    /// Sorts the nodes with a comparator function.
    ///
    /// The sort is stable: nodes that `compare` considers equal keep their relative order.
    ///
    /// If `compare` does not implement a total order, the resulting order is unspecified but
    /// the sort still terminates and every node stays on the list.
    pub fn sort_by<S, F>(&mut self, store: &mut S, mut compare: F)
    where
        S: NodeStore<Node = T> + ?Sized,
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut passes: usize = 0;
        let mut previous_merges = usize::MAX;

        loop {
            let merges = self.merge_pass(store, &mut compare);

            // Cannot overflow because the number of runs at least halves every pass.
            passes = passes.wrapping_add(1);

            trace!(passes, merges, "sort pass finished");

            if merges <= 1 {
                break;
            }

            if merges >= previous_merges {
                debug!(
                    merges,
                    passes, "sort made no progress, comparator is not a total order"
                );
                break;
            }

            previous_merges = merges;
        }

        trace!(len = self.len(), passes, "list sorted");

        #[cfg(debug_assertions)]
        self.integrity_check(store);
    }

    /// Walks the list once, merging each adjacent pair of runs in place.
    ///
    /// Returns the number of merge steps, counting a trailing run without a partner as one step.
    /// A return value of at most 1 means the list is sorted.
    pub(crate) fn merge_pass<S, F>(&mut self, store: &mut S, compare: &mut F) -> usize
    where
        S: NodeStore<Node = T> + ?Sized,
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut merges: usize = 0;

        // The last node of the part of the list that this pass has finished with.
        let mut done = Position::BeforeBegin;
        let mut cursor = self.front_index();

        while let Some(left) = cursor {
            // Cannot overflow because there are no more runs than nodes.
            merges = merges.wrapping_add(1);

            let left_last = run_last(store, left, compare);

            let Some(right) = store.node(left_last).link().next() else {
                // A trailing run without a partner is already linked in place.
                break;
            };

            let right_last = run_last(store, right, compare);
            let rest = store.node(right_last).link().next();

            // Terminate both runs so that they can be merged as independent chains.
            store.node_mut(left_last).link_mut().set_next(None);
            store.node_mut(right_last).link_mut().set_next(None);

            let (head, tail) = merge_chains(store, Some(left), Some(right), compare)
                .expect("merging two non-empty runs yields a non-empty chain");

            self.set_next_of(store, done, Some(head));
            store.node_mut(tail).link_mut().set_next(rest);

            done = Position::At(tail);
            cursor = rest;
        }

        merges
    }
}

/// Returns the index of the last node of the run that starts at `start`: the longest stretch of
/// nodes in which no node is less than its predecessor.
fn run_last<S, F>(store: &S, start: usize, compare: &mut F) -> usize
where
    S: NodeStore + ?Sized,
    F: FnMut(&S::Node, &S::Node) -> Ordering,
{
    let mut last = start;

    while let Some(next) = store.node(last).link().next() {
        if compare(store.node(next), store.node(last)) == Ordering::Less {
            break;
        }

        last = next;
    }

    last
}

/// Merges two `None`-terminated sorted chains into one and returns its first and last node, or
/// `None` if both chains are empty.
///
/// Of two equal nodes, the one from `left` is taken first, which keeps the merge stable.
/// The last node of the result is `None`-terminated.
pub(crate) fn merge_chains<S, F>(
    store: &mut S,
    mut left: Option<usize>,
    mut right: Option<usize>,
    compare: &mut F,
) -> Option<(usize, usize)>
where
    S: NodeStore + ?Sized,
    F: FnMut(&S::Node, &S::Node) -> Ordering,
{
    let mut head: Option<usize> = None;
    let mut tail: Option<usize> = None;

    loop {
        let taken = match (left, right) {
            (None, None) => break,
            (Some(l), Some(r)) if compare(store.node(r), store.node(l)) != Ordering::Less => {
                left = store.node(l).link().next();
                l
            }
            (Some(l), None) => {
                left = store.node(l).link().next();
                l
            }
            (_, Some(r)) => {
                right = store.node(r).link().next();
                r
            }
        };

        match tail {
            None => head = Some(taken),
            Some(tail) => store.node_mut(tail).link_mut().set_next(Some(taken)),
        }

        tail = Some(taken);
    }

    if let Some(tail) = tail {
        store.node_mut(tail).link_mut().set_next(None);
    }

    head.zip(tail)
}
