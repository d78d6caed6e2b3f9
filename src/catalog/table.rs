//! Table storage: column definitions, row data and the constraint checks
//! (types, NOT NULL, PRIMARY KEY, IDENTITY) that every write goes through.
//!
//! Writes are validated in full before any row is touched, so a failing
//! INSERT or UPDATE leaves the table exactly as it was.

use crate::error::{Error, Result};
use crate::sql::types::{GroupKey, SqlType, SqlValue};
use ahash::AHashSet;
use chrono::Local;

pub type Row = Vec<SqlValue>;

/// Auto-increment state of an IDENTITY(seed, step) column.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub seed: i64,
    pub step: i64,
    pub next: i64,
}

impl Identity {
    pub fn new(seed: i64, step: i64) -> Self {
        Self {
            seed,
            step,
            next: seed,
        }
    }
}

/// Value a column takes when an INSERT does not mention it.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    Value(SqlValue),
    CurrentTimestamp,
}

impl ColumnDefault {
    fn produce(&self) -> SqlValue {
        match self {
            ColumnDefault::Value(v) => v.clone(),
            ColumnDefault::CurrentTimestamp => SqlValue::DateTime(Local::now().naive_local()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: SqlType,
    pub nullable: bool,
    pub primary_key: bool,
    pub identity: Option<Identity>,
    pub default: Option<ColumnDefault>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: SqlType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            identity: None,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn identity(mut self, seed: i64, step: i64) -> Self {
        self.identity = Some(Identity::new(seed, step));
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }
}

/// Input to [`Table::new`] and `Catalog::create_table`.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<Column>,
    /// Table-level primary key; merged with column-level `PRIMARY KEY` flags
    pub primary_key: Vec<String>,
}

/// An ALTER TABLE change.
#[derive(Debug, Clone)]
pub enum TableChange {
    AddColumn(Column),
    DropColumn(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    primary_key: Vec<usize>,
}

impl Table {
    pub fn new(definition: TableDefinition) -> Result<Self> {
        let TableDefinition {
            name,
            mut columns,
            primary_key,
        } = definition;
        let invalid = |msg: String| Error::InvalidDefinition(msg);

        if columns.is_empty() {
            return Err(invalid(format!("table '{}' must have at least one column", name)));
        }

        let mut seen = AHashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(invalid(format!(
                    "column name '{}' is specified more than once",
                    column.name
                )));
            }
        }

        let identities = columns.iter().filter(|c| c.identity.is_some()).count();
        if identities > 1 {
            return Err(invalid(format!(
                "multiple identity columns specified for table '{}'",
                name
            )));
        }
        if let Some(column) = columns
            .iter()
            .find(|c| c.identity.is_some() && c.data_type != SqlType::Integer)
        {
            return Err(invalid(format!(
                "identity column '{}' must be of an integer type",
                column.name
            )));
        }

        if !primary_key.is_empty() && columns.iter().any(|c| c.primary_key) {
            return Err(invalid(format!(
                "cannot add multiple PRIMARY KEY constraints to table '{}'",
                name
            )));
        }
        if columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(invalid(format!(
                "cannot add multiple PRIMARY KEY constraints to table '{}'",
                name
            )));
        }
        for key in &primary_key {
            let column = columns
                .iter_mut()
                .find(|c| &c.name == key)
                .ok_or_else(|| Error::UnknownColumn(key.clone()))?;
            column.primary_key = true;
            column.nullable = false;
        }

        for column in &columns {
            if let Some(ColumnDefault::Value(value)) = &column.default {
                value.coerce_to(column.data_type)?;
            }
        }

        let primary_key = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key)
            .map(|(i, _)| i)
            .collect();

        Ok(Table {
            name,
            columns,
            rows: Vec::new(),
            primary_key,
        })
    }

    /// Assemble a table from trusted seed content without re-validating it.
    pub(crate) fn from_seed(name: &str, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        let primary_key = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key)
            .map(|(i, _)| i)
            .collect();
        Table {
            name: name.to_string(),
            columns,
            rows,
            primary_key,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn primary_key_columns(&self) -> &[usize] {
        &self.primary_key
    }

    fn key_of(&self, row: &[SqlValue]) -> Option<Vec<GroupKey>> {
        if self.primary_key.is_empty() {
            return None;
        }
        Some(self.primary_key.iter().map(|&i| row[i].group_key()).collect())
    }

    fn key_display(&self, row: &[SqlValue]) -> String {
        let parts: Vec<String> = self.primary_key.iter().map(|&i| row[i].to_string()).collect();
        format!("({})", parts.join(", "))
    }

    fn check_not_null(&self, row: &[SqlValue]) -> Result<()> {
        for (column, value) in self.columns.iter().zip(row) {
            if !column.nullable && value.is_null() {
                return Err(Error::NotNullViolation {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Insert rows given either an explicit column list or, when `columns`
    /// is empty, values for every non-identity column in table order.
    /// All rows are validated before any is stored.
    pub fn insert_rows(&mut self, columns: &[String], rows: Vec<Vec<SqlValue>>) -> Result<usize> {
        let targets: Vec<usize> = if columns.is_empty() {
            (0..self.columns.len())
                .filter(|&i| self.columns[i].identity.is_none())
                .collect()
        } else {
            let mut targets = Vec::with_capacity(columns.len());
            for name in columns {
                let index = self
                    .column_index(name)
                    .ok_or_else(|| Error::UnknownColumn(name.clone()))?;
                if targets.contains(&index) {
                    return Err(Error::InvalidDefinition(format!(
                        "column name '{}' is specified more than once in the column list",
                        name
                    )));
                }
                if self.columns[index].identity.is_some() {
                    return Err(Error::IdentityInsert {
                        table: self.name.clone(),
                        column: name.clone(),
                    });
                }
                targets.push(index);
            }
            targets
        };

        let identity_column = self.columns.iter().position(|c| c.identity.is_some());
        let mut next_identity = identity_column
            .and_then(|i| self.columns[i].identity.as_ref())
            .map(|id| (id.next, id.step));

        let mut keys: AHashSet<Vec<GroupKey>> = self
            .rows
            .iter()
            .filter_map(|row| self.key_of(row))
            .collect();

        let mut prepared = Vec::with_capacity(rows.len());
        for values in rows {
            if values.len() != targets.len() {
                return Err(Error::ColumnCountMismatch {
                    expected: targets.len(),
                    found: values.len(),
                });
            }

            let mut row: Vec<Option<SqlValue>> = vec![None; self.columns.len()];
            for (&index, value) in targets.iter().zip(values) {
                row[index] = Some(value.coerce_to(self.columns[index].data_type)?);
            }

            let mut full = Vec::with_capacity(self.columns.len());
            for (index, slot) in row.into_iter().enumerate() {
                let column = &self.columns[index];
                let value = match slot {
                    Some(value) => value,
                    None if Some(index) == identity_column => {
                        let (next, step) = next_identity.unwrap_or((1, 1));
                        let following = next.checked_add(step).ok_or_else(|| {
                            Error::type_mismatch(
                                "Arithmetic overflow error converting IDENTITY to data type int.",
                            )
                        })?;
                        next_identity = Some((following, step));
                        SqlValue::Integer(next)
                    }
                    None => match &column.default {
                        Some(default) => default.produce().coerce_to(column.data_type)?,
                        None => SqlValue::Null,
                    },
                };
                full.push(value);
            }

            self.check_not_null(&full)?;
            if let Some(key) = self.key_of(&full) {
                if !keys.insert(key) {
                    return Err(Error::PrimaryKeyViolation {
                        table: self.name.clone(),
                        key: self.key_display(&full),
                    });
                }
            }
            prepared.push(full);
        }

        let count = prepared.len();
        self.rows.extend(prepared);
        if let (Some(index), Some((next, _))) = (identity_column, next_identity) {
            if let Some(identity) = self.columns[index].identity.as_mut() {
                identity.next = next;
            }
        }
        Ok(count)
    }

    /// Apply `assign` to every row matching `predicate`. `assign` returns
    /// `(column index, new value)` pairs computed from the old row.
    pub fn update_rows<P, A>(&mut self, mut predicate: P, mut assign: A) -> Result<usize>
    where
        P: FnMut(&[SqlValue]) -> Result<bool>,
        A: FnMut(&[SqlValue]) -> Result<Vec<(usize, SqlValue)>>,
    {
        let mut updates: Vec<(usize, Row)> = Vec::new();

        for (position, row) in self.rows.iter().enumerate() {
            if !predicate(row)? {
                continue;
            }
            let mut new_row = row.clone();
            for (index, value) in assign(row)? {
                let column = &self.columns[index];
                if column.identity.is_some() {
                    return Err(Error::IdentityInsert {
                        table: self.name.clone(),
                        column: column.name.clone(),
                    });
                }
                new_row[index] = value.coerce_to(column.data_type)?;
            }
            self.check_not_null(&new_row)?;
            updates.push((position, new_row));
        }

        if !self.primary_key.is_empty() && !updates.is_empty() {
            let mut final_rows = self.rows.clone();
            for (position, row) in &updates {
                final_rows[*position] = row.clone();
            }
            let mut keys = AHashSet::with_capacity(final_rows.len());
            for row in &final_rows {
                if let Some(key) = self.key_of(row) {
                    if !keys.insert(key) {
                        return Err(Error::PrimaryKeyViolation {
                            table: self.name.clone(),
                            key: self.key_display(row),
                        });
                    }
                }
            }
        }

        let count = updates.len();
        for (position, row) in updates {
            self.rows[position] = row;
        }
        Ok(count)
    }

    pub fn delete_rows<P>(&mut self, mut predicate: P) -> Result<usize>
    where
        P: FnMut(&[SqlValue]) -> Result<bool>,
    {
        let mut doomed = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            doomed.push(predicate(row)?);
        }

        let before = self.rows.len();
        let mut flags = doomed.into_iter();
        self.rows.retain(|_| !flags.next().unwrap_or(false));
        Ok(before - self.rows.len())
    }

    pub fn apply_change(&mut self, change: TableChange) -> Result<()> {
        match change {
            TableChange::AddColumn(column) => self.add_column(column),
            TableChange::DropColumn(name) => self.drop_column(&name),
        }
    }

    fn add_column(&mut self, column: Column) -> Result<()> {
        if self.column_index(&column.name).is_some() {
            return Err(Error::InvalidChange(format!(
                "column name '{}' in table '{}' is specified more than once",
                column.name, self.name
            )));
        }
        if !self.rows.is_empty() {
            if column.primary_key || column.identity.is_some() {
                return Err(Error::InvalidChange(format!(
                    "cannot add key or identity column '{}' to non-empty table '{}'",
                    column.name, self.name
                )));
            }
            if !column.nullable && column.default.is_none() {
                return Err(Error::InvalidChange(format!(
                    "column '{}' does not allow nulls and has no default; table '{}' is not empty",
                    column.name, self.name
                )));
            }
        }
        if column.identity.is_some() && self.columns.iter().any(|c| c.identity.is_some()) {
            return Err(Error::InvalidChange(format!(
                "table '{}' already has an identity column",
                self.name
            )));
        }
        if column.identity.is_some() && column.data_type != SqlType::Integer {
            return Err(Error::InvalidChange(format!(
                "identity column '{}' must be of an integer type",
                column.name
            )));
        }
        if column.primary_key && !self.primary_key.is_empty() {
            return Err(Error::InvalidChange(format!(
                "table '{}' already has a primary key",
                self.name
            )));
        }

        let fill = match &column.default {
            Some(default) => default.produce().coerce_to(column.data_type)?,
            None => SqlValue::Null,
        };
        for row in &mut self.rows {
            row.push(fill.clone());
        }
        if column.primary_key {
            self.primary_key.push(self.columns.len());
        }
        self.columns.push(column);
        Ok(())
    }

    fn drop_column(&mut self, name: &str) -> Result<()> {
        let index = self
            .column_index(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        if self.columns[index].primary_key {
            return Err(Error::InvalidChange(format!(
                "column '{}' is part of the primary key of '{}'",
                name, self.name
            )));
        }
        if self.columns.len() == 1 {
            return Err(Error::InvalidChange(format!(
                "cannot drop '{}', the only column of table '{}'",
                name, self.name
            )));
        }

        self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        for key in &mut self.primary_key {
            if *key > index {
                *key -= 1;
            }
        }
        Ok(())
    }
}
