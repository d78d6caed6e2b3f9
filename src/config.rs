//! Engine configuration
//!
//! Presets per environment, overridable from `SQLSANDBOX_*` environment
//! variables and validated before an engine is built from them.

use crate::catalog::seed::{DEFAULT_DATABASE, SEEDED_DATABASES};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

impl std::str::FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" | "testing" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(Error::Config(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(Error::Config(format!(
                "Invalid log format: {}. Must be one of: pretty, compact",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub environment: Environment,
    pub engine: EngineSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Database a new or reset session points at
    pub default_database: String,

    /// Log the text of every executed statement at debug level
    pub log_statements: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    pub format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let env = std::env::var("SQLSANDBOX_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;

        let mut config = Self::for_environment(env);
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Test => Self::test(),
            Environment::Production => Self::production(),
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            engine: EngineSettings {
                default_database: DEFAULT_DATABASE.to_string(),
                log_statements: true,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }

    pub fn test() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Test;
        config.engine.log_statements = false;
        config.logging.level = "warn".to_string();
        config.logging.format = LogFormat::Compact;
        config
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            engine: EngineSettings {
                default_database: DEFAULT_DATABASE.to_string(),
                log_statements: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
        }
    }

    /// Apply `SQLSANDBOX_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup("SQLSANDBOX_DEFAULT_DATABASE") {
            self.engine.default_database = database;
        }
        if let Some(level) = lookup("SQLSANDBOX_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Some(format) = lookup("SQLSANDBOX_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        if let Some(flag) = lookup("SQLSANDBOX_LOG_STATEMENTS") {
            self.engine.log_statements = parse_flag(&flag).ok_or_else(|| {
                Error::Config(format!("Invalid SQLSANDBOX_LOG_STATEMENTS: {}", flag))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !SEEDED_DATABASES.contains(&self.engine.default_database.as_str()) {
            return Err(Error::Config(format!(
                "Unknown default database: {}. Must be one of: {}",
                self.engine.default_database,
                SEEDED_DATABASES.join(", ")
            )));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration builder for programmatic setup
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    pub fn new(env: Environment) -> Self {
        Self {
            config: EngineConfig::for_environment(env),
        }
    }

    pub fn with_default_database(mut self, name: impl Into<String>) -> Self {
        self.config.engine.default_database = name.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_log_statements(mut self, enabled: bool) -> Self {
        self.config.engine.log_statements = enabled;
        self
    }

    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
