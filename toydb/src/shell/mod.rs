//! Interactive shell over a single table.
//!
//! Reads one command per line, writes results to the output, and closes
//! the table on `.exit` or end of input.

mod statement;

use std::fmt::Write as _;
use std::io::{BufRead, Write};

pub use statement::{PrepareError, Statement, prepare_statement};

use crate::storage::InsertOutcome;
use crate::storage::btree::{
    COMMON_NODE_HEADER_SIZE, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS,
    LEAF_NODE_SPACE_FOR_CELLS,
};
use crate::table::{Table, TableError};
use crate::types::ROW_SIZE;

const PROMPT: &str = "db > ";

/// Meta commands start with a dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Btree,
    Constants,
}

impl MetaCommand {
    /// Parse a meta command line, `None` if it is not recognized.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            ".exit" => Some(Self::Exit),
            ".btree" => Some(Self::Btree),
            ".constants" => Some(Self::Constants),
            _ => None,
        }
    }
}

/// Layout constants as printed by `.constants`.
#[must_use]
pub fn constants() -> String {
    let mut out = String::new();
    for (name, value) in [
        ("ROW_SIZE", ROW_SIZE),
        ("COMMON_NODE_HEADER_SIZE", COMMON_NODE_HEADER_SIZE),
        ("LEAF_NODE_HEADER_SIZE", LEAF_NODE_HEADER_SIZE),
        ("LEAF_NODE_CELL_SIZE", LEAF_NODE_CELL_SIZE),
        ("LEAF_NODE_SPACE_FOR_CELLS", LEAF_NODE_SPACE_FOR_CELLS),
        ("LEAF_NODE_MAX_CELLS", LEAF_NODE_MAX_CELLS),
    ] {
        let _ = writeln!(out, "{name}: {value}");
    }
    out
}

/// Errors that end a shell session.
#[derive(Debug)]
pub enum ShellError {
    /// Reading input or writing output failed.
    Io(std::io::Error),
    /// The table failed.
    Table(TableError),
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Table(e) => write!(f, "table error: {e}"),
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Table(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ShellError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<TableError> for ShellError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}

/// A shell session bound to one open table.
pub struct Shell {
    table: Table,
}

impl Shell {
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self { table }
    }

    /// Run the read-execute loop until `.exit` or end of input, then close the table.
    pub fn run(mut self, input: impl BufRead, mut output: impl Write) -> Result<(), ShellError> {
        let mut lines = input.lines();
        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            let Some(line) = lines.next().transpose()? else {
                break;
            };
            let line = line.trim_end_matches('\r');

            if line.starts_with('.') {
                match MetaCommand::parse(line) {
                    Some(MetaCommand::Exit) => break,
                    Some(MetaCommand::Btree) => {
                        writeln!(output, "Tree:")?;
                        write!(output, "{}", self.table.print_tree()?)?;
                    }
                    Some(MetaCommand::Constants) => {
                        writeln!(output, "Constants:")?;
                        write!(output, "{}", constants())?;
                    }
                    None => writeln!(output, "Unrecognized command '{line}'.")?,
                }
                continue;
            }

            match prepare_statement(line) {
                Ok(statement) => self.execute(&statement, &mut output)?,
                Err(e) => writeln!(output, "{e}")?,
            }
        }

        output.flush()?;
        self.table.close()?;
        tracing::debug!("shell session closed");
        Ok(())
    }

    fn execute(&mut self, statement: &Statement, output: &mut impl Write) -> Result<(), ShellError> {
        match statement {
            Statement::Insert(row) => match self.table.insert_row(row) {
                Ok(InsertOutcome::Inserted) => writeln!(output, "Executed.")?,
                Ok(InsertOutcome::DuplicateKey) => writeln!(output, "Error: Duplicate key.")?,
                Ok(InsertOutcome::TableFull) => writeln!(output, "Error: Table is full.")?,
                Err(TableError::KeyOutOfRange(_)) => writeln!(output, "ID is too large.")?,
                Err(e) => return Err(e.into()),
            },
            Statement::Select => {
                for row in self.table.scan()? {
                    let row = row.map_err(TableError::from)?;
                    writeln!(output, "{row}")?;
                }
                writeln!(output, "Executed.")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_command_parse() {
        assert_eq!(MetaCommand::parse(".exit"), Some(MetaCommand::Exit));
        assert_eq!(MetaCommand::parse(".btree"), Some(MetaCommand::Btree));
        assert_eq!(MetaCommand::parse(".constants"), Some(MetaCommand::Constants));
        assert_eq!(MetaCommand::parse(".foo"), None);
        assert_eq!(MetaCommand::parse(".exit now"), None);
    }

    #[test]
    fn test_constants() {
        assert_eq!(
            constants(),
            "ROW_SIZE: 296\n\
             COMMON_NODE_HEADER_SIZE: 6\n\
             LEAF_NODE_HEADER_SIZE: 14\n\
             LEAF_NODE_CELL_SIZE: 300\n\
             LEAF_NODE_SPACE_FOR_CELLS: 4082\n\
             LEAF_NODE_MAX_CELLS: 13\n"
        );
    }
}
