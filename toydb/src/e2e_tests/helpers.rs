//! Common helpers for end-to-end tests.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::TableConfig;
use crate::shell::Shell;
use crate::table::Table;

/// A database file in its own temporary directory, removed on drop.
pub struct TestDb {
    _dir: tempfile::TempDir,
    path: PathBuf,
    config: TableConfig,
}

impl TestDb {
    /// Create a fresh database path with the default page capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TableConfig::default())
    }

    #[must_use]
    pub fn with_config(config: TableConfig) -> Self {
        #[allow(clippy::expect_used)]
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        Self {
            _dir: dir,
            path,
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run one shell session over `commands` and return the transcript lines.
    ///
    /// The session ends at end of input if the script has no `.exit`.
    pub fn run_script<S: AsRef<str>>(&self, commands: &[S]) -> Vec<String> {
        let mut input = String::new();
        for command in commands {
            input.push_str(command.as_ref());
            input.push('\n');
        }

        #[allow(clippy::expect_used)]
        let table = Table::open_with_config(&self.path, &self.config).expect("open table");
        let mut output = Vec::new();
        #[allow(clippy::expect_used)]
        Shell::new(table)
            .run(Cursor::new(input), &mut output)
            .expect("run shell");

        String::from_utf8_lossy(&output)
            .lines()
            .map(ToString::to_string)
            .collect()
    }
}

/// `insert <id> user<id> person<id>@example.com`.
pub fn insert_command(id: i64) -> String {
    format!("insert {id} user{id} person{id}@example.com")
}

/// The row line `select` prints for `insert_command(id)`.
pub fn row_line(id: i64) -> String {
    format!("({id}, user{id}, person{id}@example.com)")
}
