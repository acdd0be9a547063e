//! B+tree over the pager.
//!
//! The tree stores one fixed-width row per key. Keys are `u32` row ids and
//! live only in leaves; internal nodes hold separator keys equal to the
//! maximum key of the subtree on their left.
//!
//! The root always lives at page 0. When the root splits, its contents move
//! to a freshly allocated page and page 0 is rewritten as the new internal
//! root, so callers never need to track a changing root page.

#![allow(clippy::cast_possible_truncation)]

use std::fmt::Write as _;

use crate::storage::btree::cursor::Cursor;
use crate::storage::btree::node::{
    INTERNAL_NODE_MAX_KEYS, INVALID_PAGE_NUM, LEAF_NODE_CELL_SIZE, LEAF_NODE_LEFT_SPLIT_COUNT,
    LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT, NodeError, NodeType, cell_child,
    checked_node_type, child, init_internal, init_leaf, internal_find_child, internal_key,
    is_root, leaf_cell, leaf_find, leaf_insert, leaf_key, leaf_value, move_internal_cell, next_leaf,
    num_cells, num_keys, parent, right_child, set_cell_child, set_internal_key, set_leaf_cell,
    set_next_leaf, set_num_cells, set_num_keys, set_parent, set_right_child, set_root,
    update_internal_key,
};
use crate::storage::page::PageNum;
use crate::storage::pager::{Pager, PagerError};
use crate::types::ROW_SIZE;

/// A position in a leaf: the page and the cell index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub page_num: PageNum,
    pub cell_num: u32,
}

/// Result of an insert that did not fail with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was stored.
    Inserted,
    /// A row with the same key already exists. Nothing changed.
    DuplicateKey,
    /// The split needed to store the row would exceed the page capacity.
    /// Nothing changed.
    TableFull,
}

/// A B+tree backed by a pager.
pub struct BTree<'a> {
    pager: &'a mut Pager,
    root_page: PageNum,
}

impl<'a> BTree<'a> {
    /// Open the tree rooted at `root_page`.
    ///
    /// If the pager holds no pages yet, an empty root leaf is allocated.
    pub fn new(pager: &'a mut Pager, root_page: PageNum) -> Result<Self, BTreeError> {
        if pager.num_pages() == 0 {
            let page_num = pager.allocate_page()?;
            let page = pager.page_mut(page_num)?;
            init_leaf(page);
            set_root(page, true);
            tracing::info!("initialized empty tree at page {page_num}");
            return Ok(Self {
                pager,
                root_page: page_num,
            });
        }
        Ok(Self { pager, root_page })
    }

    /// Get the root page number.
    #[must_use]
    pub const fn root_page(&self) -> PageNum {
        self.root_page
    }

    /// Descend from the root to the leaf position where `key` is, or would be inserted.
    pub fn find(&mut self, key: u32) -> Result<Position, BTreeError> {
        let mut page_num = self.root_page;
        loop {
            let page = self.pager.page(page_num)?;
            match checked_node_type(page, page_num)? {
                NodeType::Leaf => {
                    return Ok(Position {
                        page_num,
                        cell_num: leaf_find(page, key),
                    });
                }
                NodeType::Internal => {
                    let child_num = internal_find_child(page, key);
                    page_num = child(page, child_num);
                }
            }
        }
    }

    /// Create a cursor at the first row in key order.
    pub fn cursor(&mut self) -> Result<Cursor<'_>, BTreeError> {
        let position = self.find(0)?;
        Cursor::at(self.pager, position)
    }

    /// Look up the serialized row stored under `key`.
    pub fn get(&mut self, key: u32) -> Result<Option<[u8; ROW_SIZE]>, BTreeError> {
        let Position { page_num, cell_num } = self.find(key)?;
        let page = self.pager.page(page_num)?;
        if cell_num < num_cells(page) && leaf_key(page, cell_num) == key {
            let mut value = [0u8; ROW_SIZE];
            value.copy_from_slice(leaf_value(page, cell_num));
            return Ok(Some(value));
        }
        Ok(None)
    }

    /// Insert a serialized row under `key`.
    ///
    /// Duplicate keys and a full page cache are reported as outcomes, not
    /// errors; in both cases the tree is left untouched.
    pub fn insert(
        &mut self,
        key: u32,
        value: &[u8; ROW_SIZE],
    ) -> Result<InsertOutcome, BTreeError> {
        let position = self.find(key)?;
        let page = self.pager.page(position.page_num)?;
        let count = num_cells(page);

        if position.cell_num < count && leaf_key(page, position.cell_num) == key {
            return Ok(InsertOutcome::DuplicateKey);
        }

        if (count as usize) < LEAF_NODE_MAX_CELLS {
            leaf_insert(
                self.pager.page_mut(position.page_num)?,
                position.cell_num,
                key,
                value,
            );
            return Ok(InsertOutcome::Inserted);
        }

        let needed = self.pages_needed_for_split(position.page_num)?;
        if needed > self.pager.free_pages() {
            tracing::warn!(
                "table full: inserting key {key} needs {needed} pages, {} free",
                self.pager.free_pages()
            );
            return Ok(InsertOutcome::TableFull);
        }

        self.leaf_split_and_insert(position, key, value)?;
        Ok(InsertOutcome::Inserted)
    }

    /// Count the rows by walking the leaf chain.
    pub fn count(&mut self) -> Result<usize, BTreeError> {
        let Position { mut page_num, .. } = self.find(0)?;
        let mut count = 0;
        loop {
            let page = self.pager.page(page_num)?;
            count += num_cells(page) as usize;
            let next = next_leaf(page);
            if next == 0 {
                return Ok(count);
            }
            page_num = next;
        }
    }

    /// Render the tree as an indented pre-order listing.
    pub fn dump(&mut self) -> Result<String, BTreeError> {
        let mut out = String::new();
        self.dump_node(self.root_page, 0, &mut out)?;
        Ok(out)
    }

    fn dump_node(
        &mut self,
        page_num: PageNum,
        depth: usize,
        out: &mut String,
    ) -> Result<(), BTreeError> {
        let indent = "  ".repeat(depth);
        let page = self.pager.page(page_num)?;
        match checked_node_type(page, page_num)? {
            NodeType::Leaf => {
                let count = num_cells(page);
                let _ = writeln!(out, "{indent}- leaf (size {count})");
                for i in 0..count {
                    let _ = writeln!(out, "{indent}  - {}", leaf_key(page, i));
                }
            }
            NodeType::Internal => {
                let count = num_keys(page);
                let _ = writeln!(out, "{indent}- internal (size {count})");
                if count == 0 {
                    return Ok(());
                }
                let right = right_child(page);
                let cells: Vec<(PageNum, u32)> = (0..count)
                    .map(|i| (cell_child(page, i), internal_key(page, i)))
                    .collect();
                for (child_page, key) in cells {
                    self.dump_node(child_page, depth + 1, out)?;
                    let _ = writeln!(out, "{indent}  - key {key}");
                }
                self.dump_node(right, depth + 1, out)?;
            }
        }
        Ok(())
    }

    /// The largest key in the subtree rooted at `page_num`.
    ///
    /// Follows right children down to the rightmost leaf. An empty leaf
    /// (only possible for an empty root) reports 0.
    pub fn max_key(&mut self, page_num: PageNum) -> Result<u32, BTreeError> {
        let mut page_num = page_num;
        loop {
            let page = self.pager.page(page_num)?;
            match checked_node_type(page, page_num)? {
                NodeType::Leaf => {
                    return Ok(num_cells(page)
                        .checked_sub(1)
                        .map_or(0, |last| leaf_key(page, last)));
                }
                NodeType::Internal => page_num = right_child(page),
            }
        }
    }

    /// Pages a split starting at `leaf_page` will allocate: one per full node
    /// on the way up, plus one more if the cascade reaches the root.
    fn pages_needed_for_split(&mut self, leaf_page: PageNum) -> Result<PageNum, BTreeError> {
        let mut needed = 0;
        let mut page_num = leaf_page;
        loop {
            needed += 1;
            let page = self.pager.page(page_num)?;
            if is_root(page) {
                return Ok(needed + 1);
            }
            let parent_num = parent(page);
            let parent_page = self.pager.page(parent_num)?;
            if (num_keys(parent_page) as usize) < INTERNAL_NODE_MAX_KEYS {
                return Ok(needed);
            }
            page_num = parent_num;
        }
    }

    /// Split a full leaf into two and insert the new cell in sorted position.
    fn leaf_split_and_insert(
        &mut self,
        position: Position,
        key: u32,
        value: &[u8; ROW_SIZE],
    ) -> Result<(), BTreeError> {
        let old_page_num = position.page_num;
        let old_max = self.max_key(old_page_num)?;
        let new_page_num = self.pager.allocate_page()?;
        let old = self.pager.page(old_page_num)?.clone();

        {
            let new_page = self.pager.page_mut(new_page_num)?;
            init_leaf(new_page);
            set_parent(new_page, parent(&old));
            set_next_leaf(new_page, next_leaf(&old));
        }

        let mut new_cell = [0u8; LEAF_NODE_CELL_SIZE];
        new_cell[..4].copy_from_slice(&key.to_le_bytes());
        new_cell[4..].copy_from_slice(value);

        // Lay the MAX + 1 cells out across both nodes in key order.
        for i in 0..=LEAF_NODE_MAX_CELLS as u32 {
            let cell = match i.cmp(&position.cell_num) {
                std::cmp::Ordering::Less => leaf_cell(&old, i),
                std::cmp::Ordering::Equal => &new_cell[..],
                std::cmp::Ordering::Greater => leaf_cell(&old, i - 1),
            };
            let (dest, index) = if (i as usize) < LEAF_NODE_LEFT_SPLIT_COUNT {
                (old_page_num, i)
            } else {
                (new_page_num, i - LEAF_NODE_LEFT_SPLIT_COUNT as u32)
            };
            set_leaf_cell(self.pager.page_mut(dest)?, index, cell);
        }

        {
            let old_page = self.pager.page_mut(old_page_num)?;
            set_num_cells(old_page, LEAF_NODE_LEFT_SPLIT_COUNT as u32);
            set_next_leaf(old_page, new_page_num);
        }
        set_num_cells(
            self.pager.page_mut(new_page_num)?,
            LEAF_NODE_RIGHT_SPLIT_COUNT as u32,
        );

        tracing::debug!("split leaf {old_page_num} into {old_page_num} and {new_page_num}");

        if is_root(&old) {
            return self.create_new_root(new_page_num);
        }

        let parent_num = parent(&old);
        let new_max = self.max_key(old_page_num)?;
        update_internal_key(self.pager.page_mut(parent_num)?, old_max, new_max);
        self.internal_node_insert(parent_num, new_page_num)
    }

    /// Move the root's contents to a new left child and rewrite the root as
    /// an internal node over that child and `right_child_page`.
    fn create_new_root(&mut self, right_child_page: PageNum) -> Result<(), BTreeError> {
        let root_num = self.root_page;
        let left_num = self.pager.allocate_page()?;
        let root = self.pager.page(root_num)?.clone();
        let root_is_internal = checked_node_type(&root, root_num)? == NodeType::Internal;

        if root_is_internal {
            init_internal(self.pager.page_mut(right_child_page)?);
        }

        {
            let left = self.pager.page_mut(left_num)?;
            left.copy_from(&root);
            set_root(left, false);
            set_parent(left, root_num);
        }

        if root_is_internal {
            for i in 0..num_keys(&root) {
                set_parent(self.pager.page_mut(cell_child(&root, i))?, left_num);
            }
            let right = right_child(&root);
            if right != INVALID_PAGE_NUM {
                set_parent(self.pager.page_mut(right)?, left_num);
            }
        }

        let left_max = self.max_key(left_num)?;
        {
            let root_page = self.pager.page_mut(root_num)?;
            init_internal(root_page);
            set_root(root_page, true);
            set_num_keys(root_page, 1);
            set_cell_child(root_page, 0, left_num);
            set_internal_key(root_page, 0, left_max);
            set_right_child(root_page, right_child_page);
        }
        set_parent(self.pager.page_mut(right_child_page)?, root_num);

        tracing::debug!(
            "new root: left child {left_num} (max {left_max}), right child {right_child_page}"
        );
        Ok(())
    }

    /// Register `child_num` in the internal node `parent_num`, ordered by the
    /// child's max key. The caller sets the child's parent pointer.
    fn internal_node_insert(
        &mut self,
        parent_num: PageNum,
        child_num: PageNum,
    ) -> Result<(), BTreeError> {
        let child_max = self.max_key(child_num)?;
        let page = self.pager.page(parent_num)?;
        let original_num_keys = num_keys(page);

        if original_num_keys as usize >= INTERNAL_NODE_MAX_KEYS {
            return self.internal_node_split_and_insert(parent_num, child_num);
        }

        let right = right_child(page);
        if right == INVALID_PAGE_NUM {
            set_right_child(self.pager.page_mut(parent_num)?, child_num);
            return Ok(());
        }

        let index = internal_find_child(page, child_max);
        let right_max = self.max_key(right)?;

        let page = self.pager.page_mut(parent_num)?;
        set_num_keys(page, original_num_keys + 1);

        if child_max > right_max {
            set_cell_child(page, original_num_keys, right);
            set_internal_key(page, original_num_keys, right_max);
            set_right_child(page, child_num);
        } else {
            for i in (index + 1..=original_num_keys).rev() {
                move_internal_cell(page, i - 1, i);
            }
            set_cell_child(page, index, child_num);
            set_internal_key(page, index, child_max);
        }
        Ok(())
    }

    /// Split the full internal node `parent_num` and insert `child_num`
    /// into whichever half its max key belongs to.
    fn internal_node_split_and_insert(
        &mut self,
        parent_num: PageNum,
        child_num: PageNum,
    ) -> Result<(), BTreeError> {
        let mut old_num = parent_num;
        let old_max = self.max_key(old_num)?;
        let child_max = self.max_key(child_num)?;
        let new_num = self.pager.allocate_page()?;
        let splitting_root = is_root(self.pager.page(old_num)?);

        let grandparent = if splitting_root {
            self.create_new_root(new_num)?;
            // The old node's contents now live in the root's left child.
            old_num = cell_child(self.pager.page(self.root_page)?, 0);
            self.root_page
        } else {
            init_internal(self.pager.page_mut(new_num)?);
            parent(self.pager.page(old_num)?)
        };

        let moved = right_child(self.pager.page(old_num)?);
        self.internal_node_insert(new_num, moved)?;
        set_parent(self.pager.page_mut(moved)?, new_num);
        set_right_child(self.pager.page_mut(old_num)?, INVALID_PAGE_NUM);

        for i in (INTERNAL_NODE_MAX_KEYS / 2 + 1..INTERNAL_NODE_MAX_KEYS).rev() {
            let moved = cell_child(self.pager.page(old_num)?, i as u32);
            self.internal_node_insert(new_num, moved)?;
            set_parent(self.pager.page_mut(moved)?, new_num);

            let old = self.pager.page_mut(old_num)?;
            let remaining = num_keys(old);
            set_num_keys(old, remaining - 1);
        }

        // The highest remaining cell child becomes the old node's right child.
        {
            let old = self.pager.page_mut(old_num)?;
            let remaining = num_keys(old) - 1;
            set_right_child(old, cell_child(old, remaining));
            set_num_keys(old, remaining);
        }

        let max_after_split = self.max_key(old_num)?;
        let destination = if child_max < max_after_split {
            old_num
        } else {
            new_num
        };
        self.internal_node_insert(destination, child_num)?;
        set_parent(self.pager.page_mut(child_num)?, destination);

        let new_old_max = self.max_key(old_num)?;
        update_internal_key(self.pager.page_mut(grandparent)?, old_max, new_old_max);

        if !splitting_root {
            // Set before inserting so a cascading split re-parents it correctly.
            set_parent(self.pager.page_mut(new_num)?, grandparent);
            self.internal_node_insert(grandparent, new_num)?;
        }

        tracing::debug!("split internal node {old_num} into {old_num} and {new_num}");
        Ok(())
    }
}

/// Errors that can occur during B-tree operations.
#[derive(Debug)]
pub enum BTreeError {
    /// Pager error.
    Pager(PagerError),
    /// Node error.
    Node(NodeError),
}

impl std::fmt::Display for BTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pager(e) => write!(f, "pager error: {e}"),
            Self::Node(e) => write!(f, "node error: {e}"),
        }
    }
}

impl std::error::Error for BTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pager(e) => Some(e),
            Self::Node(e) => Some(e),
        }
    }
}

impl From<PagerError> for BTreeError {
    fn from(e: PagerError) -> Self {
        Self::Pager(e)
    }
}

impl From<NodeError> for BTreeError {
    fn from(e: NodeError) -> Self {
        Self::Node(e)
    }
}
