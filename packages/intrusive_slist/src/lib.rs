//! An intrusive singly-linked list that threads externally owned nodes together without
//! allocating.
//!
//! Each node embeds a [`Link`] and implements [`Linked`]. The nodes themselves live in a
//! [`NodeStore`] owned by the caller (a slice, an array, a vector or an adapter over an object
//! pool) and are addressed by index. [`IntrusiveList`] holds nothing but a sentinel link and a
//! length, so it can be created in a `const` context and never touches the heap.
//!
//! # Key Features
//!
//! - **No ownership**: unlinking a node hands its index back to the caller, who decides what to
//!   do with the node
//! - **Forward-only operations**: insertion and removal relative to a [`Position`], range erase,
//!   predicate removal, de-duplication, reversal, splicing and merging
//! - **Stable in-place sort**: a bottom-up merge sort over natural runs, O(n log n) time and
//!   O(1) extra space
//!
//! # Examples
//!
//! ```rust
//! use intrusive_slist::{IntrusiveList, Link, Linked};
//!
//! #[derive(Debug, PartialEq)]
//! struct Entry {
//!     key: u32,
//!     link: Link,
//! }
//!
//! impl Linked for Entry {
//!     fn link(&self) -> &Link {
//!         &self.link
//!     }
//!
//!     fn link_mut(&mut self) -> &mut Link {
//!         &mut self.link
//!     }
//! }
//!
//! let mut entries: Vec<Entry> = [5, 3, 5, 1, 3]
//!     .into_iter()
//!     .map(|key| Entry { key, link: Link::new() })
//!     .collect();
//!
//! let mut list = IntrusiveList::new();
//! for index in (0..entries.len()).rev() {
//!     list.push_front(&mut entries, index);
//! }
//!
//! list.sort_by_key(&mut entries, |entry| entry.key);
//! let duplicates = list.unique(&mut entries);
//!
//! let keys: Vec<_> = list.iter(&entries).map(|entry| entry.key).collect();
//! assert_eq!(keys, [1, 3, 5]);
//!
//! // The duplicates are unlinked, not destroyed: the second 3 and the second 5.
//! assert!(duplicates.indices(&entries).eq([4, 2]));
//! ```

mod error;
mod iter;
mod link;
mod list;
mod node_store;
mod position;
mod sorting;

pub use error::Error;
pub(crate) use error::Result;
pub use iter::{Indices, Iter};
pub use link::{Link, Linked};
pub use list::IntrusiveList;
pub use node_store::NodeStore;
pub use position::Position;
