//! Statement parsing.

use crate::types::Row;

/// A parsed statement, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

/// Reasons a line could not be turned into a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareError {
    /// Missing or malformed arguments.
    SyntaxError,
    /// Username or email longer than its column.
    StringTooLong,
    /// The id is negative.
    NegativeId,
    /// The id does not fit a row key.
    IdTooLarge,
    /// The line does not start with a known keyword.
    UnrecognizedStatement(String),
}

impl std::fmt::Display for PrepareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SyntaxError => write!(f, "Syntax error. Could not parse statement."),
            Self::StringTooLong => write!(f, "String is too long."),
            Self::NegativeId => write!(f, "ID must be positive."),
            Self::IdTooLarge => write!(f, "ID is too large."),
            Self::UnrecognizedStatement(line) => {
                write!(f, "Unrecognized keyword at start of '{line}'.")
            }
        }
    }
}

impl std::error::Error for PrepareError {}

/// Parse one input line.
pub fn prepare_statement(line: &str) -> Result<Statement, PrepareError> {
    if line.starts_with("insert") {
        return prepare_insert(line);
    }
    if line.starts_with("select") {
        return Ok(Statement::Select);
    }
    Err(PrepareError::UnrecognizedStatement(line.to_string()))
}

/// `insert <id> <username> <email>`. Tokens after the email are ignored.
fn prepare_insert(line: &str) -> Result<Statement, PrepareError> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("insert") {
        return Err(PrepareError::SyntaxError);
    }
    let (Some(id), Some(username), Some(email)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(PrepareError::SyntaxError);
    };

    let id: i64 = id.parse().map_err(|_| PrepareError::SyntaxError)?;
    if id < 0 {
        return Err(PrepareError::NegativeId);
    }
    if id > i64::from(u32::MAX) {
        return Err(PrepareError::IdTooLarge);
    }
    let row = Row::new(id, username, email).map_err(|_| PrepareError::StringTooLong)?;
    Ok(Statement::Insert(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EMAIL_SIZE, USERNAME_SIZE};

    #[test]
    fn test_prepare_insert() {
        let statement = prepare_statement("insert 1 user1 person1@example.com").expect("prepare");
        let Statement::Insert(row) = statement else {
            panic!("expected an insert statement");
        };
        assert_eq!(row.id, 1);
        assert_eq!(row.username(), "user1");
        assert_eq!(row.email(), "person1@example.com");
    }

    #[test]
    fn test_prepare_select() {
        assert_eq!(prepare_statement("select"), Ok(Statement::Select));
    }

    #[test]
    fn test_syntax_errors() {
        for line in [
            "insert",
            "insert 1",
            "insert 1 user1",
            "insert one user1 person1@example.com",
            "inserted 1 a b",
        ] {
            assert_eq!(
                prepare_statement(line),
                Err(PrepareError::SyntaxError),
                "{line}"
            );
        }
    }

    #[test]
    fn test_id_range() {
        assert_eq!(
            prepare_statement("insert -1 cstack foo@bar.com"),
            Err(PrepareError::NegativeId)
        );
        assert_eq!(
            prepare_statement("insert 4294967296 a b"),
            Err(PrepareError::IdTooLarge)
        );
        assert!(prepare_statement("insert 4294967295 a b").is_ok());
        assert!(prepare_statement("insert 0 a b").is_ok());
    }

    #[test]
    fn test_string_too_long() {
        let username = "a".repeat(USERNAME_SIZE + 1);
        let line = format!("insert 1 {username} a@b.c");
        assert_eq!(prepare_statement(&line), Err(PrepareError::StringTooLong));

        let email = "a".repeat(EMAIL_SIZE + 1);
        let line = format!("insert 1 user {email}");
        assert_eq!(prepare_statement(&line), Err(PrepareError::StringTooLong));
    }

    #[test]
    fn test_unrecognized_keyword() {
        let error = prepare_statement("update 1 a b").expect_err("unrecognized");
        assert_eq!(error.to_string(), "Unrecognized keyword at start of 'update 1 a b'.");
    }
}
