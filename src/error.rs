use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category of an [`Error`], used by callers that only need to know
/// whether a batch failed to parse, broke a rule, or broke a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Syntax,
    Semantic,
    Constraint,
    Config,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Incorrect syntax near '{near}' (line {line}, column {column}): {message}")]
    Syntax {
        message: String,
        near: String,
        line: usize,
        column: usize,
    },

    #[error("Database '{0}' does not exist. Make sure that the name is entered correctly.")]
    UnknownDatabase(String),

    #[error("Invalid object name '{0}'.")]
    UnknownTable(String),

    #[error("Invalid column name '{0}'.")]
    UnknownColumn(String),

    #[error("Ambiguous column name '{0}'.")]
    AmbiguousColumn(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Column count mismatch: expected {expected} values, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    #[error("Violation of PRIMARY KEY constraint on table '{table}'. Cannot insert duplicate key {key}.")]
    PrimaryKeyViolation { table: String, key: String },

    #[error("Cannot insert the value NULL into column '{column}', table '{table}'; column does not allow nulls.")]
    NotNullViolation { table: String, column: String },

    #[error("Cannot insert or update explicit value for identity column '{column}' in table '{table}'.")]
    IdentityInsert { table: String, column: String },

    #[error("There is already an object named '{0}' in the database.")]
    AlreadyExists(String),

    #[error("Cannot find the object '{0}' because it does not exist.")]
    NotFound(String),

    #[error("Invalid table definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid ALTER TABLE change: {0}")]
    InvalidChange(String),

    #[error("{0}")]
    InvalidGrouping(String),

    #[error("Divide by zero error encountered.")]
    DivideByZero,

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::PrimaryKeyViolation { .. }
            | Error::NotNullViolation { .. }
            | Error::IdentityInsert { .. } => ErrorKind::Constraint,
            Error::Config(_) => ErrorKind::Config,
            _ => ErrorKind::Semantic,
        }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Error::TypeMismatch(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
