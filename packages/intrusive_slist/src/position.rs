/// A place in an [`IntrusiveList`][crate::IntrusiveList] after which nodes can be inserted or
/// erased.
///
/// A singly-linked list can only modify the link that leads to a node, so every operation that
/// inserts or erases names the position *before* the affected node. [`Position::BeforeBegin`]
/// stands for the list's own sentinel link, which leads to the first node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a position is either the sentinel or a node, there is nothing else to add"
)]
pub enum Position {
    /// The position before the first node.
    BeforeBegin,

    /// The position of the node with this index.
    At(usize),
}

impl From<usize> for Position {
    #[inline]
    fn from(index: usize) -> Self {
        Self::At(index)
    }
}
