//! Catalog Store
//!
//! Owns every database, each database's tables, and each table's rows.
//! The set of databases is fixed at the three seeded instances; only their
//! tables change.

pub mod seed;
pub mod table;

pub use table::{Column, ColumnDefault, Identity, Row, Table, TableChange, TableDefinition};

use crate::error::{Error, Result};
use crate::sql::types::SqlValue;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub name: String,
    tables: Vec<Table>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    pub(crate) fn push_table(&mut self, table: Table) {
        self.tables.push(table);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    databases: Vec<Database>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Catalog {
    /// A catalog holding the three seeded databases.
    pub fn seeded() -> Self {
        Self {
            databases: seed::seed_databases(),
        }
    }

    pub fn database_names(&self) -> Vec<String> {
        self.databases.iter().map(|d| d.name.clone()).collect()
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases.iter().any(|d| d.name == name)
    }

    pub fn get_database(&self, name: &str) -> Result<&Database> {
        self.databases
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::UnknownDatabase(name.to_string()))
    }

    pub fn get_database_mut(&mut self, name: &str) -> Result<&mut Database> {
        self.databases
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::UnknownDatabase(name.to_string()))
    }

    pub fn create_table(&mut self, db: &str, definition: TableDefinition) -> Result<()> {
        let database = self.get_database_mut(db)?;
        if database.has_table(&definition.name) {
            return Err(Error::AlreadyExists(definition.name));
        }
        let table = Table::new(definition)?;
        debug!(database = db, table = %table.name, "created table");
        database.tables.push(table);
        Ok(())
    }

    pub fn drop_table(&mut self, db: &str, name: &str) -> Result<()> {
        let database = self.get_database_mut(db)?;
        let position = database
            .tables
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        database.tables.remove(position);
        debug!(database = db, table = name, "dropped table");
        Ok(())
    }

    pub fn alter_table(&mut self, db: &str, name: &str, change: TableChange) -> Result<()> {
        let database = self.get_database_mut(db)?;
        let table = database
            .tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        table.apply_change(change)
    }

    pub fn insert_rows(
        &mut self,
        db: &str,
        table: &str,
        columns: &[String],
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<usize> {
        self.get_database_mut(db)?
            .table_mut(table)?
            .insert_rows(columns, rows)
    }

    pub fn update_rows<P, A>(&mut self, db: &str, table: &str, predicate: P, assign: A) -> Result<usize>
    where
        P: FnMut(&[SqlValue]) -> Result<bool>,
        A: FnMut(&[SqlValue]) -> Result<Vec<(usize, SqlValue)>>,
    {
        self.get_database_mut(db)?
            .table_mut(table)?
            .update_rows(predicate, assign)
    }

    pub fn delete_rows<P>(&mut self, db: &str, table: &str, predicate: P) -> Result<usize>
    where
        P: FnMut(&[SqlValue]) -> Result<bool>,
    {
        self.get_database_mut(db)?.table_mut(table)?.delete_rows(predicate)
    }

    /// Replace all databases with their seed content.
    pub fn reset_to_seed(&mut self) {
        self.databases = seed::seed_databases();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::types::SqlType;

    fn definition(name: &str) -> TableDefinition {
        TableDefinition {
            name: name.to_string(),
            columns: vec![
                Column::new("ID", SqlType::Integer).primary_key(),
                Column::new("NAME", SqlType::Text),
            ],
            primary_key: Vec::new(),
        }
    }

    #[test]
    fn test_seeded_databases() {
        let catalog = Catalog::seeded();
        assert_eq!(
            catalog.database_names(),
            vec!["UniversityDB", "ShopDB", "LibraryDB"]
        );
        assert!(catalog.get_database("UniversityDB").unwrap().has_table("STUDENTS"));
        assert!(matches!(
            catalog.get_database("universitydb"),
            Err(Error::UnknownDatabase(_))
        ));
    }

    #[test]
    fn test_create_and_drop_table() {
        let mut catalog = Catalog::seeded();
        catalog.create_table("ShopDB", definition("T")).unwrap();
        assert!(matches!(
            catalog.create_table("ShopDB", definition("T")),
            Err(Error::AlreadyExists(_))
        ));
        // same name is fine in another database
        catalog.create_table("LibraryDB", definition("T")).unwrap();

        catalog.drop_table("ShopDB", "T").unwrap();
        assert!(matches!(
            catalog.drop_table("ShopDB", "T"),
            Err(Error::NotFound(_))
        ));
        assert!(catalog.get_database("LibraryDB").unwrap().has_table("T"));
    }

    #[test]
    fn test_insert_update_delete_through_catalog() {
        let mut catalog = Catalog::seeded();
        catalog.create_table("ShopDB", definition("T")).unwrap();
        catalog
            .insert_rows(
                "ShopDB",
                "T",
                &[],
                vec![
                    vec![SqlValue::Integer(1), SqlValue::text("a")],
                    vec![SqlValue::Integer(2), SqlValue::text("b")],
                ],
            )
            .unwrap();

        let updated = catalog
            .update_rows(
                "ShopDB",
                "T",
                |row| Ok(row[0] == SqlValue::Integer(2)),
                |_| Ok(vec![(1, SqlValue::text("z"))]),
            )
            .unwrap();
        assert_eq!(updated, 1);

        let deleted = catalog.delete_rows("ShopDB", "T", |_| Ok(false)).unwrap();
        assert_eq!(deleted, 0);

        let table = catalog.get_database("ShopDB").unwrap().table("T").unwrap();
        assert_eq!(table.rows[1][1], SqlValue::text("z"));
    }

    #[test]
    fn test_reset_restores_seed() {
        let mut catalog = Catalog::seeded();
        catalog.drop_table("UniversityDB", "STUDENTS").unwrap();
        catalog.create_table("ShopDB", definition("EXTRA")).unwrap();

        catalog.reset_to_seed();
        assert_eq!(catalog, Catalog::seeded());
    }
}
