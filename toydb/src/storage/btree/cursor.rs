//! Sequential scan over the leaf chain.

use crate::storage::btree::node::{NodeError, NodeType, checked_node_type, leaf_value, next_leaf, num_cells};
use crate::storage::btree::tree::{BTreeError, Position};
use crate::storage::page::PageNum;
use crate::storage::pager::Pager;
use crate::types::Row;

/// A cursor over rows in key order.
///
/// The cursor never revisits internal nodes: once positioned it follows
/// `next_leaf` pointers from one leaf to the next.
pub struct Cursor<'a> {
    pager: &'a mut Pager,
    page_num: PageNum,
    cell_num: u32,
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    /// Position a cursor at `position`, which must name a leaf.
    ///
    /// The cursor starts at end of table if `position` is past the last
    /// cell of a leaf with no successor.
    pub fn at(pager: &'a mut Pager, position: Position) -> Result<Self, BTreeError> {
        let Position { page_num, cell_num } = position;
        let page = pager.page(page_num)?;
        if checked_node_type(page, page_num)? != NodeType::Leaf {
            return Err(NodeError::WrongNodeType {
                page_num,
                expected: NodeType::Leaf,
            }
            .into());
        }
        let end_of_table = cell_num >= num_cells(page) && next_leaf(page) == 0;

        let mut cursor = Self {
            pager,
            page_num,
            cell_num,
            end_of_table,
        };
        if !cursor.end_of_table && cell_num >= num_cells(cursor.pager.page(page_num)?) {
            cursor.next_leaf()?;
        }
        Ok(cursor)
    }

    /// Whether the cursor has moved past the last row.
    #[must_use]
    pub const fn end_of_table(&self) -> bool {
        self.end_of_table
    }

    /// The leaf position the cursor points at.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position {
            page_num: self.page_num,
            cell_num: self.cell_num,
        }
    }

    /// Read the row under the cursor.
    ///
    /// # Panics
    /// Panics if the cursor is at end of table.
    pub fn current_row(&mut self) -> Result<Row, BTreeError> {
        assert!(!self.end_of_table, "read past end of table");
        let page = self.pager.page(self.page_num)?;
        Ok(Row::deserialize(leaf_value(page, self.cell_num)))
    }

    /// Step to the next row, crossing into the next leaf when this one is exhausted.
    pub fn advance(&mut self) -> Result<(), BTreeError> {
        let page = self.pager.page(self.page_num)?;
        self.cell_num += 1;
        if self.cell_num >= num_cells(page) {
            self.next_leaf()?;
        }
        Ok(())
    }

    fn next_leaf(&mut self) -> Result<(), BTreeError> {
        let next = next_leaf(self.pager.page(self.page_num)?);
        if next == 0 {
            self.end_of_table = true;
        } else {
            self.page_num = next;
            self.cell_num = 0;
        }
        Ok(())
    }
}

impl Iterator for Cursor<'_> {
    type Item = Result<Row, BTreeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end_of_table {
            return None;
        }
        let row = match self.current_row() {
            Ok(row) => row,
            Err(e) => {
                self.end_of_table = true;
                return Some(Err(e));
            }
        };
        if let Err(e) = self.advance() {
            self.end_of_table = true;
            return Some(Err(e));
        }
        Some(Ok(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::btree::tree::BTree;
    use tempfile::tempdir;

    fn insert_rows(pager: &mut Pager, ids: impl IntoIterator<Item = u32>) {
        let mut tree = BTree::new(pager, 0).expect("tree");
        for id in ids {
            let row = Row::new(i64::from(id), &format!("user{id}"), "x@example.com").expect("row");
            tree.insert(id, &row.serialize()).expect("insert");
        }
    }

    #[test]
    fn test_empty_table_starts_at_end() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db"), 10).expect("open");
        let mut tree = BTree::new(&mut pager, 0).expect("tree");

        let mut cursor = tree.cursor().expect("cursor");
        assert!(cursor.end_of_table());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_manual_advance_across_leaves() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db"), 10).expect("open");
        insert_rows(&mut pager, 1..=20);

        let mut tree = BTree::new(&mut pager, 0).expect("tree");
        let mut cursor = tree.cursor().expect("cursor");
        let first_leaf = cursor.position().page_num;

        let mut ids = Vec::new();
        while !cursor.end_of_table() {
            ids.push(cursor.current_row().expect("row").id);
            cursor.advance().expect("advance");
        }
        assert_eq!(ids, (1..=20).collect::<Vec<i64>>());
        assert_ne!(cursor.position().page_num, first_leaf);
    }

    #[test]
    fn test_cursor_from_middle() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db"), 10).expect("open");
        insert_rows(&mut pager, (2..=40).step_by(2));

        let mut tree = BTree::new(&mut pager, 0).expect("tree");
        let position = tree.find(15).expect("find");
        drop(tree);

        let ids: Vec<i64> = Cursor::at(&mut pager, position)
            .expect("cursor")
            .map(|row| row.expect("row").id)
            .collect();
        assert_eq!(ids, (16..=40).step_by(2).collect::<Vec<i64>>());
    }

    #[test]
    fn test_cursor_on_internal_node_is_rejected() {
        let dir = tempdir().expect("create temp dir");
        let mut pager = Pager::open(&dir.path().join("test.db"), 10).expect("open");
        insert_rows(&mut pager, 1..=14);

        let result = Cursor::at(
            &mut pager,
            Position {
                page_num: 0,
                cell_num: 0,
            },
        );
        assert!(matches!(
            result,
            Err(BTreeError::Node(NodeError::WrongNodeType {
                page_num: 0,
                expected: NodeType::Leaf
            }))
        ));
    }
}
