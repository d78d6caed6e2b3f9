// SQL Type System
use crate::error::{Error, ErrorKind, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    Integer,
    Text,
    Decimal,
    DateTime,
    Boolean,
}

impl SqlType {
    /// Map a declared T-SQL type name onto one of the five storage types.
    pub fn from_declared(name: &str) -> Option<SqlType> {
        match name.to_uppercase().as_str() {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" => Some(SqlType::Integer),
            "VARCHAR" | "NVARCHAR" | "CHAR" | "NCHAR" | "TEXT" | "NTEXT" => Some(SqlType::Text),
            "DECIMAL" | "NUMERIC" | "FLOAT" | "REAL" | "MONEY" => Some(SqlType::Decimal),
            "DATE" | "DATETIME" | "DATETIME2" | "SMALLDATETIME" => Some(SqlType::DateTime),
            "BIT" | "BOOLEAN" | "BOOL" => Some(SqlType::Boolean),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
            SqlType::Decimal => "DECIMAL",
            SqlType::DateTime => "DATETIME",
            SqlType::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Boolean(bool),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "{}", v),
            SqlValue::DateTime(v) => write!(f, "{}", v.format(DATETIME_FORMAT)),
            SqlValue::Boolean(v) => write!(f, "{}", if *v { 1 } else { 0 }),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Integer(v) => serializer.serialize_i64(*v),
            SqlValue::Decimal(v) => serializer.serialize_f64(*v),
            SqlValue::Text(v) => serializer.serialize_str(v),
            SqlValue::DateTime(v) => serializer.collect_str(&v.format(DATETIME_FORMAT)),
            SqlValue::Boolean(v) => serializer.serialize_bool(*v),
        }
    }
}

/// Hashable, equality-comparable image of a value. Used for GROUP BY buckets,
/// DISTINCT and primary key uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Null,
    Integer(i64),
    Decimal(u64),
    Text(String),
    DateTime(NaiveDateTime),
    Boolean(bool),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn text(s: impl Into<String>) -> Self {
        SqlValue::Text(s.into())
    }

    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(_) => Some(SqlType::Integer),
            SqlValue::Decimal(_) => Some(SqlType::Decimal),
            SqlValue::Text(_) => Some(SqlType::Text),
            SqlValue::DateTime(_) => Some(SqlType::DateTime),
            SqlValue::Boolean(_) => Some(SqlType::Boolean),
        }
    }

    pub fn group_key(&self) -> GroupKey {
        match self {
            SqlValue::Null => GroupKey::Null,
            SqlValue::Integer(v) => GroupKey::Integer(*v),
            // 0.0 and -0.0 must land in the same bucket
            SqlValue::Decimal(v) if *v == 0.0 => GroupKey::Decimal(0),
            SqlValue::Decimal(v) => GroupKey::Decimal(v.to_bits()),
            SqlValue::Text(v) => GroupKey::Text(v.clone()),
            SqlValue::DateTime(v) => GroupKey::DateTime(*v),
            SqlValue::Boolean(v) => GroupKey::Boolean(*v),
        }
    }

    /// Literal form used when echoing a value back in messages.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::DateTime(_) => format!("'{}'", self),
            other => other.to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(v) => Some(*v as f64),
            SqlValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert a value into the storage representation of `target`.
    pub fn coerce_to(&self, target: SqlType) -> Result<SqlValue> {
        let mismatch = || {
            Error::type_mismatch(format!(
                "cannot convert {} to {}",
                self.to_literal(),
                target
            ))
        };

        match (self, target) {
            (SqlValue::Null, _) => Ok(SqlValue::Null),

            (SqlValue::Integer(v), SqlType::Integer) => Ok(SqlValue::Integer(*v)),
            (SqlValue::Decimal(v), SqlType::Integer) => {
                let truncated = v.trunc();
                if truncated.is_finite() && truncated.abs() < i64::MAX as f64 {
                    Ok(SqlValue::Integer(truncated as i64))
                } else {
                    Err(mismatch())
                }
            }
            (SqlValue::Boolean(b), SqlType::Integer) => Ok(SqlValue::Integer(i64::from(*b))),
            (SqlValue::Text(s), SqlType::Integer) => s
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .map_err(|_| mismatch()),

            (SqlValue::Integer(v), SqlType::Decimal) => Ok(SqlValue::Decimal(*v as f64)),
            (SqlValue::Decimal(v), SqlType::Decimal) => Ok(SqlValue::Decimal(*v)),
            (SqlValue::Text(s), SqlType::Decimal) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(SqlValue::Decimal)
                .ok_or_else(mismatch),

            (SqlValue::Text(s), SqlType::Text) => Ok(SqlValue::Text(s.clone())),
            (other, SqlType::Text) => Ok(SqlValue::Text(other.to_string())),

            (SqlValue::DateTime(v), SqlType::DateTime) => Ok(SqlValue::DateTime(*v)),
            (SqlValue::Text(s), SqlType::DateTime) => parse_datetime(s)
                .map(SqlValue::DateTime)
                .ok_or_else(mismatch),

            (SqlValue::Boolean(b), SqlType::Boolean) => Ok(SqlValue::Boolean(*b)),
            (SqlValue::Integer(v), SqlType::Boolean) => Ok(SqlValue::Boolean(*v != 0)),
            (SqlValue::Text(s), SqlType::Boolean) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(SqlValue::Boolean(true)),
                "false" | "0" => Ok(SqlValue::Boolean(false)),
                _ => Err(mismatch()),
            },

            _ => Err(mismatch()),
        }
    }

    /// SQL comparison. `Ok(None)` means one side is NULL (UNKNOWN).
    pub fn compare(&self, other: &SqlValue) -> Result<Option<Ordering>> {
        use SqlValue::*;

        let ordering = match (self, other) {
            (Null, _) | (_, Null) => return Ok(None),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Integer(_) | Decimal(_), Integer(_) | Decimal(_)) => {
                compare_f64(self.as_f64().unwrap_or(0.0), other.as_f64().unwrap_or(0.0))
            }
            (Text(a), Text(b)) => a.as_str().cmp(b.as_str()),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Boolean(_), Integer(_)) | (Integer(_), Boolean(_)) => {
                let a = self.coerce_to(SqlType::Integer)?;
                let b = other.coerce_to(SqlType::Integer)?;
                return a.compare(&b);
            }
            (DateTime(_), Text(_)) => return self.compare(&other.coerce_to(SqlType::DateTime)?),
            (Text(_), DateTime(_)) => return self.coerce_to(SqlType::DateTime)?.compare(other),
            (Integer(_) | Decimal(_), Text(_)) => {
                return self.compare(&other.coerce_to(SqlType::Decimal)?)
            }
            (Text(_), Integer(_) | Decimal(_)) => {
                return self.coerce_to(SqlType::Decimal)?.compare(other)
            }
            _ => {
                return Err(Error::type_mismatch(format!(
                    "cannot compare {} with {}",
                    self.to_literal(),
                    other.to_literal()
                )))
            }
        };

        Ok(Some(ordering))
    }

    /// Total ordering for ORDER BY. NULL placement is handled by the caller.
    pub fn sort_cmp(&self, other: &SqlValue) -> Ordering {
        match self.compare(other) {
            Ok(Some(ordering)) => ordering,
            _ => Ordering::Equal,
        }
    }
}

fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Outcome of one `execute` / `reset` call, in the shape the host renders.
/// Exactly one of the tabular, status or error forms is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
    },
    Status {
        message: String,
        #[serde(rename = "rowsAffected")]
        rows_affected: u64,
    },
    Failed {
        error: String,
        #[serde(skip)]
        kind: ErrorKind,
    },
}

impl QueryResult {
    pub fn status(message: impl Into<String>, rows_affected: u64) -> Self {
        QueryResult::Status {
            message: message.into(),
            rows_affected,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QueryResult::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn rows(&self) -> Option<&[Vec<SqlValue>]> {
        match self {
            QueryResult::Rows { rows, .. } => Some(rows),
            _ => None,
        }
    }

    pub fn columns(&self) -> Option<&[String]> {
        match self {
            QueryResult::Rows { columns, .. } => Some(columns),
            _ => None,
        }
    }

    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            QueryResult::Status { rows_affected, .. } => Some(*rows_affected),
            _ => None,
        }
    }
}

impl From<Error> for QueryResult {
    fn from(err: Error) -> Self {
        QueryResult::Failed {
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}

/// Message for DML statements, matching what SQL Server prints.
pub fn rows_affected_message(count: u64) -> String {
    if count == 1 {
        "(1 row affected)".to_string()
    } else {
        format!("({} rows affected)", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_mapping() {
        assert_eq!(SqlType::from_declared("varchar"), Some(SqlType::Text));
        assert_eq!(SqlType::from_declared("INT"), Some(SqlType::Integer));
        assert_eq!(SqlType::from_declared("money"), Some(SqlType::Decimal));
        assert_eq!(SqlType::from_declared("bit"), Some(SqlType::Boolean));
        assert_eq!(SqlType::from_declared("DATETIME2"), Some(SqlType::DateTime));
        assert_eq!(SqlType::from_declared("GEOGRAPHY"), None);
    }

    #[test]
    fn test_coercion_rules() {
        assert_eq!(
            SqlValue::Decimal(3.9).coerce_to(SqlType::Integer).unwrap(),
            SqlValue::Integer(3)
        );
        assert_eq!(
            SqlValue::text("42").coerce_to(SqlType::Integer).unwrap(),
            SqlValue::Integer(42)
        );
        assert_eq!(
            SqlValue::Integer(7).coerce_to(SqlType::Text).unwrap(),
            SqlValue::text("7")
        );
        assert!(matches!(
            SqlValue::text("abc").coerce_to(SqlType::Integer),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            SqlValue::Integer(1).coerce_to(SqlType::DateTime),
            Err(Error::TypeMismatch(_))
        ));
        assert_eq!(
            SqlValue::text("2024-02-01").coerce_to(SqlType::DateTime).unwrap(),
            SqlValue::DateTime(parse_datetime("2024-02-01 00:00:00").unwrap())
        );
    }

    #[test]
    fn test_comparison_with_null_is_unknown() {
        assert_eq!(SqlValue::Null.compare(&SqlValue::Integer(1)).unwrap(), None);
        assert_eq!(
            SqlValue::Integer(2).compare(&SqlValue::Decimal(2.5)).unwrap(),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_text_compares_ordinally() {
        // 'Z' (0x5A) sorts before 'a' (0x61) under ordinal comparison
        assert_eq!(
            SqlValue::text("Zed").compare(&SqlValue::text("apple")).unwrap(),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_datetime_compares_with_text() {
        let dt = SqlValue::text("2024-03-01").coerce_to(SqlType::DateTime).unwrap();
        assert_eq!(
            dt.compare(&SqlValue::text("2024-01-15")).unwrap(),
            Some(Ordering::Greater)
        );
        assert!(SqlValue::Boolean(true).compare(&SqlValue::text("x")).is_err());
    }

    #[test]
    fn test_result_serializes_in_host_shape() {
        let rows = QueryResult::Rows {
            columns: vec!["ID".to_string(), "NAME".to_string()],
            rows: vec![vec![SqlValue::Integer(1), SqlValue::Null]],
        };
        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            serde_json::json!({ "columns": ["ID", "NAME"], "rows": [[1, null]] })
        );

        let status = QueryResult::status(rows_affected_message(1), 1);
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({ "message": "(1 row affected)", "rowsAffected": 1 })
        );

        let failed = QueryResult::from(Error::UnknownTable("X".to_string()));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({ "error": "Invalid object name 'X'." })
        );
    }
}
