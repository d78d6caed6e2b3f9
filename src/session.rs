//! Session Controller
//!
//! [`SqlEngine`] is the only entry point hosts use: `execute`, `reset` and
//! `schema`. One catalog and one session live behind a single mutex, so
//! calls are serialized and none observes another's partial mutation.

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::schema::SchemaSnapshot;
use crate::sql::executor::QueryExecutor;
use crate::sql::parser::parse_sql_with_text;
use crate::sql::types::QueryResult;
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const EMPTY_BATCH_MESSAGE: &str = "Commands completed successfully.";
pub const RESET_MESSAGE: &str = "All databases have been reset to their initial state.";

/// The current-database selector. It names a database rather than holding
/// a reference, so resetting the catalog can never leave it dangling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    current_database: String,
}

impl Session {
    pub fn new(database: impl Into<String>) -> Self {
        Session {
            current_database: database.into(),
        }
    }

    pub fn current_database(&self) -> &str {
        &self.current_database
    }

    pub(crate) fn set_current_database(&mut self, name: &str) {
        self.current_database = name.to_string();
    }
}

struct EngineState {
    catalog: Catalog,
    session: Session,
}

pub struct SqlEngine {
    state: Mutex<EngineState>,
    config: EngineConfig,
}

impl Default for SqlEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlEngine {
    /// Engine over freshly seeded databases with the development defaults.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let session = Session::new(config.engine.default_database.clone());
        SqlEngine {
            state: Mutex::new(EngineState {
                catalog: Catalog::seeded(),
                session,
            }),
            config,
        }
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let catalog = Catalog::seeded();
        if !catalog.has_database(&config.engine.default_database) {
            return Err(Error::Config(format!(
                "Unknown default database: {}",
                config.engine.default_database
            )));
        }
        let session = Session::new(config.engine.default_database.clone());
        Ok(SqlEngine {
            state: Mutex::new(EngineState { catalog, session }),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse the whole batch, then run its statements in order. The result
    /// is that of the last statement, or the first error; statements that
    /// ran before an error keep their effects.
    pub fn execute(&self, sql: &str) -> QueryResult {
        let started = Instant::now();
        let statements = match parse_sql_with_text(sql) {
            Ok(statements) => statements,
            Err(err) => {
                warn!(error = %err, "batch failed to parse");
                return err.into();
            }
        };

        if statements.is_empty() {
            return QueryResult::status(EMPTY_BATCH_MESSAGE, 0);
        }

        let mut guard = self.state.lock();
        let EngineState { catalog, session } = &mut *guard;

        let mut last = QueryResult::status(EMPTY_BATCH_MESSAGE, 0);
        for (index, (statement, text)) in statements.iter().enumerate() {
            if self.config.engine.log_statements {
                debug!(
                    index,
                    kind = statement.kind(),
                    database = session.current_database(),
                    sql = %text,
                    "executing statement"
                );
            }
            match QueryExecutor::new(catalog, session).execute(statement) {
                Ok(result) => last = result,
                Err(err) => {
                    warn!(index, kind = statement.kind(), error = %err, "statement failed");
                    return err.into();
                }
            }
        }

        debug!(
            statements = statements.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "batch executed"
        );
        last
    }

    /// Restore every database to its seed content and point the session at
    /// the default database.
    pub fn reset(&self) -> QueryResult {
        let mut state = self.state.lock();
        state.catalog.reset_to_seed();
        state.session = Session::new(self.config.engine.default_database.clone());
        info!(database = %self.config.engine.default_database, "databases reset");
        QueryResult::status(RESET_MESSAGE, 0)
    }

    pub fn schema(&self) -> Result<SchemaSnapshot> {
        let state = self.state.lock();
        SchemaSnapshot::capture(&state.catalog, state.session.current_database())
    }

    pub fn current_database(&self) -> String {
        self.state.lock().session.current_database().to_string()
    }

    pub fn database_names(&self) -> Vec<String> {
        self.state.lock().catalog.database_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::config::Environment;
    use crate::sql::types::SqlValue;

    #[test]
    fn test_parse_error_runs_nothing() {
        let engine = SqlEngine::new();
        let result = engine.execute("DELETE FROM STUDENTS; SELEC * FROM STUDENTS;");
        assert!(result.error().unwrap().starts_with("Incorrect syntax near 'SELEC'"));

        let count = engine.execute("SELECT COUNT(*) FROM STUDENTS");
        assert_eq!(count.rows().unwrap(), &[vec![SqlValue::Integer(10)]]);
    }

    #[test]
    fn test_statements_before_an_error_keep_their_effects() {
        let engine = SqlEngine::new();
        let result = engine.execute(
            "USE ShopDB; DELETE FROM ORDER_ITEMS WHERE ORDER_ID = 1001; SELECT * FROM NOPE;",
        );
        assert_eq!(result.error(), Some("Invalid object name 'NOPE'."));
        assert_eq!(engine.current_database(), "ShopDB");

        let remaining = engine.execute("SELECT COUNT(*) FROM ORDER_ITEMS");
        assert_eq!(remaining.rows().unwrap(), &[vec![SqlValue::Integer(9)]]);
    }

    #[test]
    fn test_empty_batch() {
        let engine = SqlEngine::new();
        assert_eq!(
            engine.execute("  -- nothing here\n ; ;"),
            QueryResult::status(EMPTY_BATCH_MESSAGE, 0)
        );
    }

    #[test]
    fn test_reset_restores_default_database() {
        let engine = SqlEngine::new();
        engine.execute("USE LibraryDB; DROP TABLE LOANS;");
        assert_eq!(engine.reset(), QueryResult::status(RESET_MESSAGE, 0));
        assert_eq!(engine.current_database(), "UniversityDB");

        let loans = engine.execute("USE LibraryDB; SELECT COUNT(*) FROM LOANS;");
        assert_eq!(loans.rows().unwrap(), &[vec![SqlValue::Integer(8)]]);
    }

    #[test]
    fn test_configured_default_database() {
        let config = ConfigBuilder::new(Environment::Test)
            .with_default_database("ShopDB")
            .build()
            .unwrap();
        let engine = SqlEngine::with_config(config).unwrap();
        assert_eq!(engine.schema().unwrap().current_database, "ShopDB");

        engine.execute("USE UniversityDB");
        engine.reset();
        assert_eq!(engine.current_database(), "ShopDB");
    }

    #[test]
    fn test_statement_logging_does_not_change_results() {
        let config = ConfigBuilder::new(Environment::Test)
            .with_log_statements(true)
            .build()
            .unwrap();
        assert!(config.engine.log_statements);
        let engine = SqlEngine::with_config(config).unwrap();

        let result = engine.execute("USE ShopDB;\nSELECT COUNT(*) FROM ORDERS WHERE STATUS = 'é';");
        assert_eq!(result.rows().unwrap(), &[vec![SqlValue::Integer(0)]]);
    }

    #[test]
    fn test_unknown_database_leaves_context_unchanged() {
        let engine = SqlEngine::new();
        let result = engine.execute("USE MissingDB");
        assert!(result.is_error());
        assert_eq!(engine.current_database(), "UniversityDB");
    }
}
