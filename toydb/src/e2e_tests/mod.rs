//! End-to-end tests at the shell level.
//!
//! Each test file covers a specific scenario, feeding a scripted session to
//! the shell and checking the transcript line by line.

#![cfg(test)]

mod helpers;

mod test_btree_print;
mod test_duplicate_key;
mod test_insert_and_select;
mod test_meta_commands;
mod test_persistence;
mod test_statement_errors;
mod test_string_limits;
mod test_table_full;
