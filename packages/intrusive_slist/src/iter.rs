use std::fmt;
use std::iter::FusedIterator;

use crate::{Linked, NodeStore};

/// Iterator over the nodes of an [`IntrusiveList`][crate::IntrusiveList], front to back.
///
/// Created by [`IntrusiveList::iter()`][crate::IntrusiveList::iter].
pub struct Iter<'a, S: NodeStore + ?Sized> {
    store: &'a S,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, S: NodeStore + ?Sized> Iter<'a, S> {
    pub(crate) fn new(store: &'a S, front: Option<usize>, len: usize) -> Self {
        Self {
            store,
            next: front,
            remaining: len,
        }
    }
}

impl<'a, S: NodeStore + ?Sized> Iterator for Iter<'a, S> {
    type Item = &'a S::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let node = self.store.node(index);

        self.next = node.link().next();
        self.remaining = self.remaining.saturating_sub(1);

        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<S: NodeStore + ?Sized> ExactSizeIterator for Iter<'_, S> {}

impl<S: NodeStore + ?Sized> FusedIterator for Iter<'_, S> {}

impl<S: NodeStore + ?Sized> Clone for Iter<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<S: NodeStore + ?Sized> fmt::Debug for Iter<'_, S> {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("next", &self.next)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Iterator over the node indexes of an [`IntrusiveList`][crate::IntrusiveList], front to back.
///
/// Created by [`IntrusiveList::indices()`][crate::IntrusiveList::indices].
pub struct Indices<'a, S: NodeStore + ?Sized> {
    store: &'a S,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, S: NodeStore + ?Sized> Indices<'a, S> {
    pub(crate) fn new(store: &'a S, front: Option<usize>, len: usize) -> Self {
        Self {
            store,
            next: front,
            remaining: len,
        }
    }
}

impl<S: NodeStore + ?Sized> Iterator for Indices<'_, S> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let index = self.next?;

        self.next = self.store.node(index).link().next();
        self.remaining = self.remaining.saturating_sub(1);

        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<S: NodeStore + ?Sized> ExactSizeIterator for Indices<'_, S> {}

impl<S: NodeStore + ?Sized> FusedIterator for Indices<'_, S> {}

impl<S: NodeStore + ?Sized> Clone for Indices<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<S: NodeStore + ?Sized> fmt::Debug for Indices<'_, S> {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indices")
            .field("next", &self.next)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}
