//! Table and shell configuration.
//!
//! The database filename comes from the command line; everything else from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `TOYDB_MAX_PAGES`: page capacity of the table (default: `100`)
//!
//! # Invariants
//!
//! - `max_pages` is always in `1..=MAX_CONFIGURABLE_PAGES`

use std::path::PathBuf;

use crate::storage::PageNum;

/// Table configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// Maximum number of pages the table may occupy, root included.
    pub max_pages: PageNum,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_pages: Self::DEFAULT_MAX_PAGES,
        }
    }
}

impl TableConfig {
    /// Default page capacity.
    pub const DEFAULT_MAX_PAGES: PageNum = 100;
    /// Largest accepted page capacity (a 4 GiB file).
    pub const MAX_CONFIGURABLE_PAGES: PageNum = 1 << 20;
    /// Environment variable holding the page capacity.
    pub const MAX_PAGES_VAR: &'static str = "TOYDB_MAX_PAGES";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `TOYDB_MAX_PAGES` is set but not a valid page count.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_pages = match lookup(Self::MAX_PAGES_VAR) {
            Some(value) => Self::parse_max_pages(&value)?,
            None => Self::DEFAULT_MAX_PAGES,
        };
        Ok(Self { max_pages })
    }

    fn parse_max_pages(value: &str) -> Result<PageNum, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: Self::MAX_PAGES_VAR.to_string(),
            message: format!(
                "'{value}' is not a valid page count (must be 1-{})",
                Self::MAX_CONFIGURABLE_PAGES
            ),
        };
        match value.trim().parse::<PageNum>() {
            Ok(n) if (1..=Self::MAX_CONFIGURABLE_PAGES).contains(&n) => Ok(n),
            _ => Err(invalid()),
        }
    }
}

/// Shell configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Path of the database file, created if missing.
    pub database_path: PathBuf,
    pub table: TableConfig,
}

impl ShellConfig {
    /// Build the configuration from process arguments (program name first)
    /// and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no database filename is given or the environment
    /// holds an invalid value.
    pub fn from_args_and_env(
        args: impl IntoIterator<Item = String>,
    ) -> Result<Self, ConfigError> {
        Self::from_args_and_lookup(args, |name| std::env::var(name).ok())
    }

    pub fn from_args_and_lookup(
        args: impl IntoIterator<Item = String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let database_path = args
            .into_iter()
            .nth(1)
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingArgument("database filename".to_string()))?;
        let table = TableConfig::from_lookup(lookup)?;
        Ok(Self {
            database_path,
            table,
        })
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required command-line argument is missing.
    MissingArgument(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArgument(name) => write!(f, "Must supply a {name}."),
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_default_values() {
        assert_eq!(TableConfig::default().max_pages, 100);
        assert_eq!(TableConfig::from_lookup(|_| None), Ok(TableConfig::default()));
    }

    #[test]
    fn test_max_pages_from_lookup() {
        let config = TableConfig::from_lookup(|name| {
            (name == "TOYDB_MAX_PAGES").then(|| "250".to_string())
        });
        assert_eq!(config, Ok(TableConfig { max_pages: 250 }));
    }

    #[test]
    fn test_invalid_max_pages() {
        for value in ["0", "-1", "lots", "", "1048577"] {
            let result = TableConfig::from_lookup(|_| Some(value.to_string()));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { ref name, .. }) if name == "TOYDB_MAX_PAGES"),
                "value {value:?} accepted"
            );
        }
    }

    #[test]
    fn test_shell_config_from_args() {
        let config = ShellConfig::from_args_and_lookup(args(&["toydb", "mydb.db"]), |_| None)
            .expect("config");
        assert_eq!(config.database_path, PathBuf::from("mydb.db"));
        assert_eq!(config.table, TableConfig::default());
    }

    #[test]
    fn test_shell_config_missing_filename() {
        let error = ShellConfig::from_args_and_lookup(args(&["toydb"]), |_| None)
            .expect_err("missing filename");
        assert_eq!(error.to_string(), "Must supply a database filename.");
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
