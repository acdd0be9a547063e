//! B+tree implementation for the table.
//!
//! # Structure
//!
//! The tree consists of:
//! - Leaf nodes: store `(key, row)` cells in key order, singly linked for scans
//! - Internal nodes: store `(child, key)` cells plus a right child, where each
//!   key is the largest key in the child to its left
//!
//! Nodes are read and written in place through the accessors in `node`;
//! `tree` holds the search and split algorithms and `cursor` the scan.

mod cursor;
mod node;
mod tree;

pub use cursor::Cursor;
pub use node::{
    COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_HEADER_SIZE, INTERNAL_NODE_MAX_KEYS, INVALID_PAGE_NUM,
    LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS,
    LEAF_NODE_RIGHT_SPLIT_COUNT, LEAF_NODE_SPACE_FOR_CELLS, NodeError, NodeType,
};
pub use tree::{BTree, BTreeError, InsertOutcome, Position};
