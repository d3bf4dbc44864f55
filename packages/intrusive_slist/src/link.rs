use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The link field that a node embeds to take part in an [`IntrusiveList`][crate::IntrusiveList].
///
/// A link refers to the next node by its index in the [`NodeStore`][crate::NodeStore]. Only the
/// list reads or writes it; to the rest of the program it is an opaque marker.
///
/// A link is not part of the value of a node. Cloning a link yields an unlinked link, and all
/// links compare equal and hash identically, so that derived trait implementations on node types
/// only consider the payload.
///
/// # Examples
///
/// ```
/// use intrusive_slist::{Link, Linked};
///
/// #[derive(Clone, Debug, Eq, PartialEq)]
/// struct Node {
///     value: u32,
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
/// let node = Node { value: 1, link: Link::new() };
/// assert_eq!(node.clone(), node);
/// ```
pub struct Link {
    next: Option<usize>,
}

impl Link {
    /// Creates an unlinked link.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: None }
    }

    #[must_use]
    #[inline]
    pub(crate) const fn next(&self) -> Option<usize> {
        self.next
    }

    #[inline]
    pub(crate) fn set_next(&mut self, next: Option<usize>) {
        self.next = next;
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Link {
    /// A clone is a different node, so it starts out unlinked.
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl fmt::Debug for Link {
    #[cfg_attr(test, mutants::skip)] // No API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("next", &self.next).finish()
    }
}

impl PartialEq for Link {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for Link {}

impl PartialOrd for Link {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Link {
    fn cmp(&self, _other: &Self) -> Ordering {
        Ordering::Equal
    }
}

impl Hash for Link {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

/// A node type that embeds a [`Link`] and can therefore be threaded onto an
/// [`IntrusiveList`][crate::IntrusiveList].
pub trait Linked {
    /// Returns the embedded link.
    fn link(&self) -> &Link;

    /// Returns the embedded link for modification by the list.
    fn link_mut(&mut self) -> &mut Link;
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Link: Send, Sync, fmt::Debug, Clone, Default);

    fn hash_of(value: &impl Hash) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn new_link_is_unlinked() {
        assert_eq!(Link::new().next(), None);
        assert_eq!(Link::default().next(), None);
    }

    #[test]
    fn clone_is_unlinked() {
        let mut link = Link::new();
        link.set_next(Some(4));

        assert_eq!(link.next(), Some(4));
        assert_eq!(link.clone().next(), None);
    }

    #[test]
    fn links_are_invisible_to_comparisons() {
        let mut a = Link::new();
        let b = Link::new();
        a.set_next(Some(1));

        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(hash_of(&a), hash_of(&b));
    }
}
