//! B+tree node layout and in-place accessors.
//!
//! Every node occupies exactly one page. The accessors here read and write
//! header fields and cells directly in the page buffer; they hold no state
//! and know nothing about the tree around them.
//!
//! Common header (6 bytes):
//! - `node_type`: 1 byte (0 = internal, 1 = leaf)
//! - `is_root`: 1 byte
//! - `parent_page`: 4 bytes
//!
//! Leaf header (14 bytes): common header, `num_cells` (4), `next_leaf` (4, 0 if none).
//! Leaf cell (300 bytes): `key` (4), `value` (`ROW_SIZE`).
//!
//! Internal header (14 bytes): common header, `num_keys` (4), `right_child` (4).
//! Internal cell (8 bytes): `child` (4), `key` (4).

#![allow(clippy::cast_possible_truncation)]

use crate::storage::page::{PAGE_SIZE, Page, PageNum};
use crate::types::ROW_SIZE;

const NODE_TYPE_OFFSET: usize = 0;
const IS_ROOT_OFFSET: usize = 1;
const PARENT_POINTER_OFFSET: usize = 2;

/// Size of the header shared by both node types.
pub const COMMON_NODE_HEADER_SIZE: usize = 6;

const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + 4;

/// Size of a leaf node header.
pub const LEAF_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + 4 + 4;

const LEAF_NODE_KEY_SIZE: usize = 4;

/// Size of one leaf cell (key + row).
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + ROW_SIZE;

/// Bytes available for cells in a leaf node.
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;

/// Maximum number of cells in a leaf node.
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Cells moved to the new right leaf when a full leaf takes one more cell.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;

/// Cells kept in the original leaf on a split.
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) - LEAF_NODE_RIGHT_SPLIT_COUNT;

const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize = INTERNAL_NODE_NUM_KEYS_OFFSET + 4;

/// Size of an internal node header.
pub const INTERNAL_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + 4 + 4;

const INTERNAL_NODE_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_KEY_SIZE: usize = 4;
const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

/// Maximum number of keys in an internal node.
///
/// Kept small so that internal splits happen with little data.
pub const INTERNAL_NODE_MAX_KEYS: usize = 3;

/// Marks an internal node whose right child has not been assigned yet.
pub const INVALID_PAGE_NUM: PageNum = PageNum::MAX;

/// Node type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl TryFrom<u8> for NodeType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Internal),
            1 => Ok(Self::Leaf),
            _ => Err(value),
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Leaf => write!(f, "leaf"),
        }
    }
}

// ---------------------------------------------------------------------------
// Common header
// ---------------------------------------------------------------------------

/// Read the node type. Returns the raw byte if it is not a known type.
pub fn node_type(page: &Page) -> Result<NodeType, u8> {
    NodeType::try_from(page.read_u8(NODE_TYPE_OFFSET))
}

pub fn set_node_type(page: &mut Page, node_type: NodeType) {
    page.write_u8(NODE_TYPE_OFFSET, node_type as u8);
}

#[must_use]
pub fn is_root(page: &Page) -> bool {
    page.read_u8(IS_ROOT_OFFSET) == 1
}

pub fn set_root(page: &mut Page, is_root: bool) {
    page.write_u8(IS_ROOT_OFFSET, u8::from(is_root));
}

#[must_use]
pub fn parent(page: &Page) -> PageNum {
    page.read_u32(PARENT_POINTER_OFFSET)
}

pub fn set_parent(page: &mut Page, parent: PageNum) {
    page.write_u32(PARENT_POINTER_OFFSET, parent);
}

// ---------------------------------------------------------------------------
// Leaf nodes
// ---------------------------------------------------------------------------

/// Initialize a page as an empty, non-root leaf.
pub fn init_leaf(page: &mut Page) {
    set_node_type(page, NodeType::Leaf);
    set_root(page, false);
    set_num_cells(page, 0);
    set_next_leaf(page, 0);
}

#[must_use]
pub fn num_cells(page: &Page) -> u32 {
    page.read_u32(LEAF_NODE_NUM_CELLS_OFFSET)
}

pub fn set_num_cells(page: &mut Page, num_cells: u32) {
    page.write_u32(LEAF_NODE_NUM_CELLS_OFFSET, num_cells);
}

/// Page number of the next leaf in key order, 0 if this is the last leaf.
#[must_use]
pub fn next_leaf(page: &Page) -> PageNum {
    page.read_u32(LEAF_NODE_NEXT_LEAF_OFFSET)
}

pub fn set_next_leaf(page: &mut Page, next: PageNum) {
    page.write_u32(LEAF_NODE_NEXT_LEAF_OFFSET, next);
}

fn leaf_cell_offset(cell_num: u32) -> usize {
    let cell_num = cell_num as usize;
    assert!(
        cell_num < LEAF_NODE_MAX_CELLS,
        "leaf cell {cell_num} out of range (max {LEAF_NODE_MAX_CELLS})"
    );
    LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
}

/// The raw bytes (key + value) of a leaf cell.
#[must_use]
pub fn leaf_cell(page: &Page, cell_num: u32) -> &[u8] {
    page.read_bytes(leaf_cell_offset(cell_num), LEAF_NODE_CELL_SIZE)
}

/// Overwrite a leaf cell with raw bytes (key + value).
pub fn set_leaf_cell(page: &mut Page, cell_num: u32, cell: &[u8]) {
    debug_assert_eq!(cell.len(), LEAF_NODE_CELL_SIZE);
    page.write_bytes(leaf_cell_offset(cell_num), cell);
}

#[must_use]
pub fn leaf_key(page: &Page, cell_num: u32) -> u32 {
    page.read_u32(leaf_cell_offset(cell_num))
}

pub fn set_leaf_key(page: &mut Page, cell_num: u32, key: u32) {
    page.write_u32(leaf_cell_offset(cell_num), key);
}

#[must_use]
pub fn leaf_value(page: &Page, cell_num: u32) -> &[u8] {
    page.read_bytes(leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE, ROW_SIZE)
}

pub fn set_leaf_value(page: &mut Page, cell_num: u32, value: &[u8; ROW_SIZE]) {
    page.write_bytes(leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE, value);
}

/// Index of the first cell whose key is `>= key`, or `num_cells` if none.
#[must_use]
pub fn leaf_find(page: &Page, key: u32) -> u32 {
    let mut lo = 0;
    let mut hi = num_cells(page);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if leaf_key(page, mid) >= key {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Insert a cell at `cell_num`, shifting later cells one slot right.
///
/// # Panics
/// Panics if the leaf is already full; splitting is the tree's job.
pub fn leaf_insert(page: &mut Page, cell_num: u32, key: u32, value: &[u8; ROW_SIZE]) {
    let count = num_cells(page);
    assert!(
        (count as usize) < LEAF_NODE_MAX_CELLS,
        "leaf insert into a full node"
    );
    assert!(cell_num <= count, "leaf insert past the end of the node");

    if cell_num < count {
        let src = leaf_cell_offset(cell_num);
        let len = (count - cell_num) as usize * LEAF_NODE_CELL_SIZE;
        page.copy_within(src, src + LEAF_NODE_CELL_SIZE, len);
    }

    set_num_cells(page, count + 1);
    set_leaf_key(page, cell_num, key);
    set_leaf_value(page, cell_num, value);
}

// ---------------------------------------------------------------------------
// Internal nodes
// ---------------------------------------------------------------------------

/// Initialize a page as an empty, non-root internal node.
///
/// The right child starts out as `INVALID_PAGE_NUM`.
pub fn init_internal(page: &mut Page) {
    set_node_type(page, NodeType::Internal);
    set_root(page, false);
    set_num_keys(page, 0);
    set_right_child(page, INVALID_PAGE_NUM);
}

#[must_use]
pub fn num_keys(page: &Page) -> u32 {
    page.read_u32(INTERNAL_NODE_NUM_KEYS_OFFSET)
}

pub fn set_num_keys(page: &mut Page, num_keys: u32) {
    page.write_u32(INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys);
}

#[must_use]
pub fn right_child(page: &Page) -> PageNum {
    page.read_u32(INTERNAL_NODE_RIGHT_CHILD_OFFSET)
}

pub fn set_right_child(page: &mut Page, child: PageNum) {
    page.write_u32(INTERNAL_NODE_RIGHT_CHILD_OFFSET, child);
}

fn internal_cell_offset(cell_num: u32) -> usize {
    let cell_num = cell_num as usize;
    assert!(
        cell_num < INTERNAL_NODE_MAX_KEYS,
        "internal cell {cell_num} out of range (max {INTERNAL_NODE_MAX_KEYS})"
    );
    INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE
}

/// The child pointer stored in cell `cell_num` (never the right child).
#[must_use]
pub fn cell_child(page: &Page, cell_num: u32) -> PageNum {
    page.read_u32(internal_cell_offset(cell_num))
}

pub fn set_cell_child(page: &mut Page, cell_num: u32, child: PageNum) {
    page.write_u32(internal_cell_offset(cell_num), child);
}

#[must_use]
pub fn internal_key(page: &Page, key_num: u32) -> u32 {
    page.read_u32(internal_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE)
}

pub fn set_internal_key(page: &mut Page, key_num: u32, key: u32) {
    page.write_u32(internal_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE, key);
}

/// Child `child_num` of an internal node: a cell child for `child_num < num_keys`,
/// the right child for `child_num == num_keys`.
///
/// # Panics
/// Panics if `child_num > num_keys`.
#[must_use]
pub fn child(page: &Page, child_num: u32) -> PageNum {
    let count = num_keys(page);
    assert!(
        child_num <= count,
        "tried to access child_num {child_num} > num_keys {count}"
    );
    if child_num == count {
        right_child(page)
    } else {
        cell_child(page, child_num)
    }
}

/// Smallest child index whose key is `>= key`. The right child counts as
/// having an infinite key, so the result is in `0..=num_keys`.
#[must_use]
pub fn internal_find_child(page: &Page, key: u32) -> u32 {
    let mut lo = 0;
    let mut hi = num_keys(page);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if internal_key(page, mid) >= key {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Replace the separator key that routed `old_key` with `new_key`.
///
/// Nothing is stored for the right child, so a lookup that lands there is a no-op.
pub fn update_internal_key(page: &mut Page, old_key: u32, new_key: u32) {
    let idx = internal_find_child(page, old_key);
    if idx < num_keys(page) {
        set_internal_key(page, idx, new_key);
    }
}

/// Move cell `from` to cell `to` within the same internal node.
pub fn move_internal_cell(page: &mut Page, from: u32, to: u32) {
    let src = internal_cell_offset(from);
    let dst = internal_cell_offset(to);
    page.copy_within(src, dst, INTERNAL_NODE_CELL_SIZE);
}

/// Errors raised when a page does not hold the node the tree expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The node type byte is not a known type.
    InvalidNodeType { page_num: PageNum, byte: u8 },
    /// The node exists but is of the wrong type for the operation.
    WrongNodeType { page_num: PageNum, expected: NodeType },
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNodeType { page_num, byte } => {
                write!(f, "page {page_num} has invalid node type 0x{byte:02x}")
            }
            Self::WrongNodeType { page_num, expected } => {
                write!(f, "page {page_num} is not a {expected} node")
            }
        }
    }
}

impl std::error::Error for NodeError {}

/// Read the node type of `page_num`, mapping unknown bytes to an error.
pub fn checked_node_type(page: &Page, page_num: PageNum) -> Result<NodeType, NodeError> {
    node_type(page).map_err(|byte| NodeError::InvalidNodeType { page_num, byte })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_bytes(tag: u8) -> [u8; ROW_SIZE] {
        [tag; ROW_SIZE]
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(LEAF_NODE_HEADER_SIZE, 14);
        assert_eq!(LEAF_NODE_CELL_SIZE, 300);
        assert_eq!(LEAF_NODE_MAX_CELLS, 13);
        assert_eq!(LEAF_NODE_LEFT_SPLIT_COUNT, 7);
        assert_eq!(LEAF_NODE_RIGHT_SPLIT_COUNT, 7);
        assert_eq!(INTERNAL_NODE_HEADER_SIZE, 14);
    }

    #[test]
    fn test_common_header() {
        let mut page = Page::new();
        init_leaf(&mut page);
        set_root(&mut page, true);
        set_parent(&mut page, 42);

        assert_eq!(node_type(&page), Ok(NodeType::Leaf));
        assert!(is_root(&page));
        assert_eq!(parent(&page), 42);

        page.write_u8(0, 9);
        assert_eq!(node_type(&page), Err(9));
    }

    #[test]
    fn test_leaf_insert_keeps_order() {
        let mut page = Page::new();
        init_leaf(&mut page);

        for key in [30, 10, 20] {
            let pos = leaf_find(&page, key);
            leaf_insert(&mut page, pos, key, &row_bytes(key as u8));
        }

        assert_eq!(num_cells(&page), 3);
        assert_eq!(leaf_key(&page, 0), 10);
        assert_eq!(leaf_key(&page, 1), 20);
        assert_eq!(leaf_key(&page, 2), 30);
        assert_eq!(leaf_value(&page, 0), &row_bytes(10)[..]);
        assert_eq!(leaf_value(&page, 2), &row_bytes(30)[..]);
    }

    #[test]
    fn test_leaf_find() {
        let mut page = Page::new();
        init_leaf(&mut page);
        for (i, key) in [2u32, 4, 6].into_iter().enumerate() {
            leaf_insert(&mut page, i as u32, key, &row_bytes(0));
        }

        assert_eq!(leaf_find(&page, 1), 0);
        assert_eq!(leaf_find(&page, 2), 0);
        assert_eq!(leaf_find(&page, 3), 1);
        assert_eq!(leaf_find(&page, 6), 2);
        assert_eq!(leaf_find(&page, 7), 3);
    }

    #[test]
    #[should_panic(expected = "leaf insert into a full node")]
    fn test_leaf_insert_full_panics() {
        let mut page = Page::new();
        init_leaf(&mut page);
        for i in 0..=LEAF_NODE_MAX_CELLS as u32 {
            leaf_insert(&mut page, i, i, &row_bytes(0));
        }
    }

    #[test]
    fn test_internal_children_and_keys() {
        let mut page = Page::new();
        init_internal(&mut page);
        assert_eq!(right_child(&page), INVALID_PAGE_NUM);

        set_num_keys(&mut page, 2);
        set_cell_child(&mut page, 0, 5);
        set_internal_key(&mut page, 0, 10);
        set_cell_child(&mut page, 1, 6);
        set_internal_key(&mut page, 1, 20);
        set_right_child(&mut page, 7);

        assert_eq!(child(&page, 0), 5);
        assert_eq!(child(&page, 1), 6);
        assert_eq!(child(&page, 2), 7);
        assert_eq!(internal_key(&page, 1), 20);
    }

    #[test]
    #[should_panic(expected = "tried to access child_num 2 > num_keys 1")]
    fn test_child_out_of_range_panics() {
        let mut page = Page::new();
        init_internal(&mut page);
        set_num_keys(&mut page, 1);
        let _ = child(&page, 2);
    }

    #[test]
    fn test_internal_find_child() {
        let mut page = Page::new();
        init_internal(&mut page);
        set_num_keys(&mut page, 3);
        for (i, key) in [10u32, 20, 30].into_iter().enumerate() {
            set_internal_key(&mut page, i as u32, key);
        }

        assert_eq!(internal_find_child(&page, 5), 0);
        assert_eq!(internal_find_child(&page, 10), 0);
        assert_eq!(internal_find_child(&page, 11), 1);
        assert_eq!(internal_find_child(&page, 30), 2);
        // Greater than every stored key routes to the right child.
        assert_eq!(internal_find_child(&page, 31), 3);
    }

    #[test]
    fn test_update_internal_key() {
        let mut page = Page::new();
        init_internal(&mut page);
        set_num_keys(&mut page, 2);
        set_internal_key(&mut page, 0, 10);
        set_internal_key(&mut page, 1, 20);

        update_internal_key(&mut page, 20, 17);
        assert_eq!(internal_key(&page, 1), 17);

        // Keys beyond every separator belong to the right child; nothing changes.
        update_internal_key(&mut page, 99, 50);
        assert_eq!(internal_key(&page, 0), 10);
        assert_eq!(internal_key(&page, 1), 17);
    }

    #[test]
    fn test_move_internal_cell() {
        let mut page = Page::new();
        init_internal(&mut page);
        set_num_keys(&mut page, 1);
        set_cell_child(&mut page, 0, 3);
        set_internal_key(&mut page, 0, 9);

        move_internal_cell(&mut page, 0, 1);
        assert_eq!(cell_child(&page, 1), 3);
        assert_eq!(internal_key(&page, 1), 9);
    }
}
