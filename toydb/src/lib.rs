// Forbid unwrap() in production code to prevent panics from corrupt data.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! A single-table database stored as a paged B+tree.
//!
//! Life of a statement:
//! 1. The shell reads a line and prepares it into a `Statement`
//! 2. The table turns the row id into a key and calls into the B+tree
//! 3. The B+tree finds the leaf, splitting nodes as needed
//! 4. The pager serves pages from its cache and writes them back on close

pub mod config;
mod e2e_tests;
pub mod shell;
pub mod storage;
pub mod table;
pub mod types;

pub use table::{Table, TableError};
