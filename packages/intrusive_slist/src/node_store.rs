use crate::Linked;

/// The owner of the nodes that an [`IntrusiveList`][crate::IntrusiveList] threads together.
///
/// Nodes are addressed by index. The list never creates, moves or destroys nodes; it only
/// rewrites their links. Any indexable collection can serve as a store, including a fixed-capacity
/// pool wrapped in a small adapter.
///
/// Implemented for slices, arrays and vectors of [`Linked`] values.
///
/// # Examples
///
/// A store that keeps its nodes in a map:
///
/// ```
/// use std::collections::BTreeMap;
///
/// use intrusive_slist::{IntrusiveList, Link, Linked, NodeStore};
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
/// struct Sparse(BTreeMap<usize, Node>);
///
/// impl NodeStore for Sparse {
///     type Node = Node;
///
///     fn node(&self, index: usize) -> &Node {
///         &self.0[&index]
///     }
///
///     fn node_mut(&mut self, index: usize) -> &mut Node {
///         self.0.get_mut(&index).unwrap()
///     }
/// }
///
/// let mut store = Sparse([(10, Node::default()), (20, Node::default())].into());
/// let mut list = IntrusiveList::new();
///
/// list.push_front(&mut store, 10);
/// list.push_front(&mut store, 20);
///
/// assert!(list.indices(&store).eq([20, 10]));
/// ```
pub trait NodeStore {
    /// The node type, which embeds the link.
    type Node: Linked;

    /// Returns the node at `index`.
    ///
    /// # Panics
    ///
    /// Implementations panic if there is no node at `index`.
    fn node(&self, index: usize) -> &Self::Node;

    /// Returns the node at `index` for modification.
    ///
    /// # Panics
    ///
    /// Implementations panic if there is no node at `index`.
    fn node_mut(&mut self, index: usize) -> &mut Self::Node;
}

impl<T: Linked> NodeStore for [T] {
    type Node = T;

    fn node(&self, index: usize) -> &T {
        let len = self.len();

        self.get(index).unwrap_or_else(|| {
            panic!("node index {index} out of bounds for node store of length {len}")
        })
    }

    fn node_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();

        self.get_mut(index).unwrap_or_else(|| {
            panic!("node index {index} out of bounds for node store of length {len}")
        })
    }
}

impl<T: Linked, const N: usize> NodeStore for [T; N] {
    type Node = T;

    fn node(&self, index: usize) -> &T {
        self.as_slice().node(index)
    }

    fn node_mut(&mut self, index: usize) -> &mut T {
        self.as_mut_slice().node_mut(index)
    }
}

impl<T: Linked> NodeStore for Vec<T> {
    type Node = T;

    fn node(&self, index: usize) -> &T {
        self.as_slice().node(index)
    }

    fn node_mut(&mut self, index: usize) -> &mut T {
        self.as_mut_slice().node_mut(index)
    }
}
