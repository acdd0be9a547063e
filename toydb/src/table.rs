//! High-level table interface.
//!
//! A table is one B+tree of rows keyed by row id, stored in a single file.

use std::path::Path;

use crate::config::TableConfig;
use crate::storage::{BTree, BTreeError, Cursor, InsertOutcome, PageNum, Pager, PagerError};
use crate::types::Row;

/// The root node always lives on the first page.
const ROOT_PAGE: PageNum = 0;

/// A table instance.
///
/// Owns the pager for its whole lifetime. Changes are held in the page
/// cache and reach the file on `close`.
pub struct Table {
    pager: Pager,
}

impl Table {
    /// Open the table at `path` with the default page capacity, creating the
    /// file if it does not exist.
    pub fn open(path: &Path) -> Result<Self, TableError> {
        Self::open_with_config(path, &TableConfig::default())
    }

    /// Open the table at `path` with a custom page capacity.
    pub fn open_with_config(path: &Path, config: &TableConfig) -> Result<Self, TableError> {
        let mut pager = Pager::open(path, config.max_pages)?;
        BTree::new(&mut pager, ROOT_PAGE)?;
        tracing::info!(
            "opened table {} ({} pages)",
            path.display(),
            pager.num_pages()
        );
        Ok(Self { pager })
    }

    /// Flush every cached page and close the file.
    pub fn close(self) -> Result<(), TableError> {
        self.pager.close()?;
        Ok(())
    }

    /// Insert a row keyed by its id.
    ///
    /// # Errors
    ///
    /// Returns `KeyOutOfRange` if the id does not fit a `u32` key.
    pub fn insert_row(&mut self, row: &Row) -> Result<InsertOutcome, TableError> {
        let key = u32::try_from(row.id).map_err(|_| TableError::KeyOutOfRange(row.id))?;
        let outcome = self.tree()?.insert(key, &row.serialize())?;
        tracing::trace!("insert {key}: {outcome:?}");
        Ok(outcome)
    }

    /// Look up a row by id.
    pub fn get_row(&mut self, id: i64) -> Result<Option<Row>, TableError> {
        let Ok(key) = u32::try_from(id) else {
            return Ok(None);
        };
        let value = self.tree()?.get(key)?;
        Ok(value.map(|bytes| Row::deserialize(&bytes)))
    }

    /// A cursor over all rows in id order.
    pub fn scan(&mut self) -> Result<Cursor<'_>, TableError> {
        let position = self.tree()?.find(0)?;
        Ok(Cursor::at(&mut self.pager, position)?)
    }

    /// Number of rows in the table.
    pub fn row_count(&mut self) -> Result<usize, TableError> {
        Ok(self.tree()?.count()?)
    }

    /// Textual dump of the tree: one line per node and key, indented by depth.
    pub fn print_tree(&mut self) -> Result<String, TableError> {
        Ok(self.tree()?.dump()?)
    }

    /// Number of pages in use.
    #[must_use]
    pub const fn num_pages(&self) -> PageNum {
        self.pager.num_pages()
    }

    fn tree(&mut self) -> Result<BTree<'_>, TableError> {
        Ok(BTree::new(&mut self.pager, ROOT_PAGE)?)
    }
}

/// Errors that can occur during table operations.
#[derive(Debug)]
pub enum TableError {
    /// Pager error.
    Pager(PagerError),
    /// B-tree error.
    BTree(BTreeError),
    /// Row id cannot be used as a key.
    KeyOutOfRange(i64),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pager(e) => write!(f, "pager error: {e}"),
            Self::BTree(e) => write!(f, "btree error: {e}"),
            Self::KeyOutOfRange(id) => write!(f, "row id {id} is out of key range"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pager(e) => Some(e),
            Self::BTree(e) => Some(e),
            Self::KeyOutOfRange(_) => None,
        }
    }
}

impl From<PagerError> for TableError {
    fn from(e: PagerError) -> Self {
        Self::Pager(e)
    }
}

impl From<BTreeError> for TableError {
    fn from(e: BTreeError) -> Self {
        Self::BTree(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PAGE_SIZE;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_db() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        (dir, path)
    }

    fn user(id: i64) -> Row {
        Row::new(id, &format!("user{id}"), &format!("person{id}@example.com")).expect("row")
    }

    fn scan_ids(table: &mut Table) -> Vec<i64> {
        table
            .scan()
            .expect("scan")
            .map(|row| row.expect("row").id)
            .collect()
    }

    #[test]
    fn test_open_new_table() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open(&path).expect("open");

        assert_eq!(table.num_pages(), 1);
        assert_eq!(table.row_count().expect("count"), 0);
        assert!(scan_ids(&mut table).is_empty());
        table.close().expect("close");

        assert_eq!(fs::metadata(&path).expect("metadata").len(), PAGE_SIZE as u64);
    }

    #[test]
    fn test_insert_and_select() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open(&path).expect("open");

        let row = user(1);
        assert_eq!(
            table.insert_row(&row).expect("insert"),
            InsertOutcome::Inserted
        );

        let rows: Vec<Row> = table
            .scan()
            .expect("scan")
            .collect::<Result<_, _>>()
            .expect("rows");
        assert_eq!(rows, vec![row.clone()]);
        assert_eq!(table.get_row(1).expect("get"), Some(row));
        assert_eq!(table.get_row(2).expect("get"), None);
        assert_eq!(table.get_row(-2).expect("get"), None);
    }

    #[test]
    fn test_duplicate_key() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open(&path).expect("open");

        table.insert_row(&user(1)).expect("insert");
        let again = Row::new(1, "other", "other@example.com").expect("row");
        assert_eq!(
            table.insert_row(&again).expect("insert"),
            InsertOutcome::DuplicateKey
        );
        assert_eq!(table.row_count().expect("count"), 1);
        assert_eq!(table.get_row(1).expect("get"), Some(user(1)));
    }

    #[test]
    fn test_key_out_of_range() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open(&path).expect("open");

        for id in [-1, i64::from(u32::MAX) + 1] {
            let result = table.insert_row(&user(id));
            assert!(matches!(result, Err(TableError::KeyOutOfRange(bad)) if bad == id));
        }
        assert_eq!(table.row_count().expect("count"), 0);
    }

    #[test]
    fn test_print_tree_single_leaf() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open(&path).expect("open");

        for id in [3, 1, 2] {
            table.insert_row(&user(id)).expect("insert");
        }
        assert_eq!(
            table.print_tree().expect("print"),
            "- leaf (size 3)\n  - 1\n  - 2\n  - 3\n"
        );
    }

    #[test]
    fn test_persistence() {
        let (_dir, path) = create_test_db();
        let mut ids: Vec<i64> = (1..=300).collect();
        ids.shuffle(&mut StdRng::seed_from_u64(99));

        let tree_before = {
            let mut table = Table::open(&path).expect("open");
            for &id in &ids {
                assert_eq!(
                    table.insert_row(&user(id)).expect("insert"),
                    InsertOutcome::Inserted
                );
            }
            let dump = table.print_tree().expect("print");
            table.close().expect("close");
            dump
        };

        let size = fs::metadata(&path).expect("metadata").len();
        assert_eq!(size % PAGE_SIZE as u64, 0);

        let mut table = Table::open(&path).expect("reopen");
        assert_eq!(table.print_tree().expect("print"), tree_before);
        assert_eq!(scan_ids(&mut table), (1..=300).collect::<Vec<_>>());
        assert_eq!(table.get_row(150).expect("get"), Some(user(150)));
    }

    #[test]
    fn test_reopen_does_not_change_file() {
        let (_dir, path) = create_test_db();
        {
            let mut table = Table::open(&path).expect("open");
            for id in 1..=40 {
                table.insert_row(&user(id)).expect("insert");
            }
            table.close().expect("close");
        }
        let before = fs::read(&path).expect("read");

        {
            let mut table = Table::open(&path).expect("reopen");
            assert_eq!(table.num_pages() as usize, before.len() / PAGE_SIZE);
            assert_eq!(table.row_count().expect("count"), 40);
            table.close().expect("close");
        }
        assert_eq!(fs::read(&path).expect("read"), before);
    }

    #[test]
    fn test_table_full_keeps_prior_rows() {
        let (_dir, path) = create_test_db();
        let mut table = Table::open(&path).expect("open");

        let mut inserted = Vec::new();
        for id in 1.. {
            match table.insert_row(&user(id)).expect("insert") {
                InsertOutcome::Inserted => inserted.push(id),
                InsertOutcome::TableFull => break,
                InsertOutcome::DuplicateKey => panic!("unexpected duplicate {id}"),
            }
        }

        // Sequential ids leave split leaves half full.
        assert!(inserted.len() > 200, "only {} rows fit", inserted.len());
        assert!(table.num_pages() > 90);
        assert_eq!(scan_ids(&mut table), inserted);

        // Still full after retrying, and existing ids are still reported as duplicates.
        let next = i64::try_from(inserted.len()).expect("len") + 1;
        assert_eq!(
            table.insert_row(&user(next)).expect("insert"),
            InsertOutcome::TableFull
        );
        assert_eq!(
            table.insert_row(&user(1)).expect("insert"),
            InsertOutcome::DuplicateKey
        );
        table.close().expect("close");

        let mut table = Table::open(&path).expect("reopen");
        assert_eq!(scan_ids(&mut table), inserted);
    }

    #[test]
    fn test_custom_page_capacity() {
        let (_dir, path) = create_test_db();
        let config = TableConfig { max_pages: 3 };
        let mut table = Table::open_with_config(&path, &config).expect("open");

        for id in 1..=20 {
            assert_eq!(
                table.insert_row(&user(id)).expect("insert"),
                InsertOutcome::Inserted
            );
        }
        assert_eq!(
            table.insert_row(&user(21)).expect("insert"),
            InsertOutcome::TableFull
        );
        assert_eq!(scan_ids(&mut table), (1..=20).collect::<Vec<_>>());
        table.close().expect("close");

        // A file with more pages than the configured capacity is refused.
        let small = TableConfig { max_pages: 2 };
        assert!(matches!(
            Table::open_with_config(&path, &small),
            Err(TableError::Pager(PagerError::TooManyPages { pages: 3, .. }))
        ));
    }

    #[test]
    fn test_corrupt_file() {
        let (_dir, path) = create_test_db();
        fs::write(&path, b"not a database").expect("write");
        assert!(matches!(
            Table::open(&path),
            Err(TableError::Pager(PagerError::CorruptFile { file_size: 14 }))
        ));
    }
}
