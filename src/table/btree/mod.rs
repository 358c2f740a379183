//! On-disk B-tree node layout.
//!
//! A node occupies exactly one page. Every field is read straight from its
//! offset in the page buffer, so what is cached is byte-for-byte what gets
//! flushed.

pub mod node;

pub use node::{Node, NodeKey, NodePointer, NodeType};
