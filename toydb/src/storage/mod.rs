//! Single-file paged storage engine.
//!
//! # File Format
//!
//! The database is a flat file of 4KB pages with no superblock:
//!
//! - Page 0: root node of the B+tree
//! - Pages 1-N: other B+tree nodes, reachable only through node pointers
//!
//! The file size is always a whole number of pages.
//!
//! # Usage
//!
//! ```ignore
//! use toydb::storage::{BTree, Pager};
//!
//! let mut pager = Pager::open(path, 100)?;
//! let mut tree = BTree::new(&mut pager, 0)?;
//! tree.insert(1, &row.serialize())?;
//! drop(tree);
//! pager.close()?;
//! ```

pub mod btree;
mod page;
mod pager;

pub use btree::{BTree, BTreeError, Cursor, InsertOutcome, NodeError};
pub use page::{PAGE_SIZE, Page, PageNum};
pub use pager::{Pager, PagerError};
