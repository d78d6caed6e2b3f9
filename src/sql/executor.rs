// Query Executor - runs parsed statements against the catalog
use super::ast::*;
use super::evaluator::{group_key, Context, Evaluator, GroupKeys, PatternCache, Scope};
use super::planner::{PlanNode, QueryPlanner};
use super::types::*;
use crate::catalog::{
    Catalog, Column, ColumnDefault, Database, Identity, Row, TableChange, TableDefinition,
};
use crate::error::{Error, Result};
use crate::session::Session;
use ahash::{AHashMap, AHashSet};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Where an output column's value comes from.
enum Projected {
    Column(usize),
    Expr(Expression),
}

struct OutputColumn {
    heading: String,
    alias: Option<String>,
    value: Projected,
}

enum SortKey {
    Output(usize),
    Expr(Expression),
}

/// Executes statements one at a time against a catalog and session.
/// Each statement either completes or fails as a whole; nothing is rolled
/// back across statements.
pub struct QueryExecutor<'a> {
    catalog: &'a mut Catalog,
    session: &'a mut Session,
    patterns: PatternCache,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(catalog: &'a mut Catalog, session: &'a mut Session) -> Self {
        QueryExecutor {
            catalog,
            session,
            patterns: PatternCache::new(),
        }
    }

    pub fn execute(&mut self, statement: &Statement) -> Result<QueryResult> {
        // LIKE patterns are cached per statement
        self.patterns = PatternCache::new();

        match statement {
            Statement::Select(stmt) => {
                let (columns, rows) = self.execute_select(stmt)?;
                Ok(QueryResult::Rows { columns, rows })
            }
            Statement::Insert(stmt) => self.execute_insert(stmt),
            Statement::Update(stmt) => self.execute_update(stmt),
            Statement::Delete(stmt) => self.execute_delete(stmt),
            Statement::CreateTable(stmt) => self.execute_create_table(stmt),
            Statement::DropTable(stmt) => self.execute_drop_table(stmt),
            Statement::AlterTable(stmt) => self.execute_alter_table(stmt),
            Statement::Use(name) => self.execute_use(name),
            Statement::CreateDatabase(_) | Statement::DropDatabase(_) => Err(Error::Unsupported(
                format!(
                    "{} is not available; the sandbox provides a fixed set of databases ({})",
                    statement.kind(),
                    self.catalog.database_names().join(", ")
                ),
            )),
        }
    }

    fn current_database(&self) -> String {
        self.session.current_database().to_string()
    }

    fn execute_select(&self, stmt: &SelectStatement) -> Result<(Vec<String>, Vec<Row>)> {
        let plan = QueryPlanner::plan(stmt)?;
        let database = self.catalog.get_database(self.session.current_database())?;
        let (scope, rows) = self.execute_node(database, &plan.source)?;
        let evaluator = Evaluator::new(&scope, &self.patterns);

        let projection = expand_projection(&scope, &plan.projection)?;
        let sort_keys = resolve_order_by(&scope, &plan.order_by, &projection)?;

        let mut output: Vec<(Row, Vec<SqlValue>)> = Vec::new();
        match &plan.aggregation {
            None => {
                for row in &rows {
                    output.push(project(&evaluator, Context::Row(row), &projection, &sort_keys)?);
                }
            }
            Some(aggregation) => {
                let keys = GroupKeys::new(&scope, &aggregation.group_by)?;
                if let Some(having) = &aggregation.having {
                    scope.check(having)?;
                }
                for group in group_rows(&evaluator, rows, keys.exprs())? {
                    let ctx = Context::Group {
                        rows: &group,
                        keys: &keys,
                    };
                    if let Some(having) = &aggregation.having {
                        if !evaluator.matches(having, ctx)? {
                            continue;
                        }
                    }
                    output.push(project(&evaluator, ctx, &projection, &sort_keys)?);
                }
            }
        }

        if plan.distinct {
            let mut seen = AHashSet::with_capacity(output.len());
            output.retain(|(row, _)| seen.insert(group_key(row)));
        }

        if !plan.order_by.is_empty() {
            output.sort_by(|(_, a), (_, b)| compare_sort_keys(a, b, &plan.order_by));
        }

        if let Some(top) = plan.top {
            output.truncate(usize::try_from(top).unwrap_or(usize::MAX));
        }

        let columns = projection.into_iter().map(|c| c.heading).collect();
        let rows = output.into_iter().map(|(row, _)| row).collect();
        Ok((columns, rows))
    }

    fn execute_node(&self, database: &Database, node: &PlanNode) -> Result<(Scope, Vec<Row>)> {
        match node {
            PlanNode::Empty => Ok((Scope::empty(), vec![Vec::new()])),
            PlanNode::TableScan { table, qualifier } => {
                let table = database.table(table)?;
                Ok((Scope::for_table(qualifier, table), table.rows.clone()))
            }
            PlanNode::NestedLoopJoin {
                left,
                right,
                join_type,
                condition,
            } => {
                let (left_scope, left_rows) = self.execute_node(database, left)?;
                let (right_scope, right_rows) = self.execute_node(database, right)?;
                let scope = left_scope.join(&right_scope);
                if let Some(condition) = condition {
                    scope.check(condition)?;
                }
                let rows = self.nested_loop_join(
                    &scope,
                    (left_scope.len(), left_rows.as_slice()),
                    (right_scope.len(), right_rows.as_slice()),
                    *join_type,
                    condition.as_ref(),
                )?;
                Ok((scope, rows))
            }
            PlanNode::Filter { input, predicate } => {
                let (scope, rows) = self.execute_node(database, input)?;
                scope.check(predicate)?;
                let evaluator = Evaluator::new(&scope, &self.patterns);
                let mut kept = Vec::with_capacity(rows.len());
                for row in rows {
                    if evaluator.matches(predicate, Context::Row(&row))? {
                        kept.push(row);
                    }
                }
                Ok((scope, kept))
            }
        }
    }

    /// The ON predicate is evaluated once per left x right pair. Unmatched
    /// rows of the preserved side(s) are padded with NULLs.
    fn nested_loop_join(
        &self,
        scope: &Scope,
        (left_width, left_rows): (usize, &[Row]),
        (right_width, right_rows): (usize, &[Row]),
        join_type: JoinType,
        condition: Option<&Expression>,
    ) -> Result<Vec<Row>> {
        let evaluator = Evaluator::new(scope, &self.patterns);
        let mut right_matched = vec![false; right_rows.len()];
        let mut joined = Vec::new();

        for left_row in left_rows {
            let mut matched = false;
            for (index, right_row) in right_rows.iter().enumerate() {
                let mut combined = Vec::with_capacity(left_width + right_width);
                combined.extend(left_row.iter().cloned());
                combined.extend(right_row.iter().cloned());

                let keep = match condition {
                    Some(condition) => evaluator.matches(condition, Context::Row(&combined))?,
                    None => true,
                };
                if keep {
                    matched = true;
                    right_matched[index] = true;
                    joined.push(combined);
                }
            }

            if !matched && matches!(join_type, JoinType::Left | JoinType::Full) {
                let mut padded = left_row.clone();
                padded.resize(left_width + right_width, SqlValue::Null);
                joined.push(padded);
            }
        }

        if matches!(join_type, JoinType::Right | JoinType::Full) {
            for (right_row, matched) in right_rows.iter().zip(&right_matched) {
                if !matched {
                    let mut padded = vec![SqlValue::Null; left_width];
                    padded.extend(right_row.iter().cloned());
                    joined.push(padded);
                }
            }
        }

        Ok(joined)
    }

    fn execute_insert(&mut self, stmt: &InsertStatement) -> Result<QueryResult> {
        let db = self.current_database();
        self.catalog.get_database(&db)?.table(&stmt.table)?;

        let rows = match &stmt.source {
            InsertSource::Values(value_rows) => {
                let scope = Scope::empty();
                let evaluator = Evaluator::new(&scope, &self.patterns);
                let mut rows = Vec::with_capacity(value_rows.len());
                for values in value_rows {
                    let mut row = Vec::with_capacity(values.len());
                    for expr in values {
                        row.push(evaluator.eval(expr, Context::Row(&[]))?);
                    }
                    rows.push(row);
                }
                rows
            }
            InsertSource::Select(select) => self.execute_select(select)?.1,
        };

        let count = self.catalog.insert_rows(&db, &stmt.table, &stmt.columns, rows)?;
        debug!(database = %db, table = %stmt.table, rows = count, "inserted rows");
        Ok(affected(count))
    }

    fn execute_update(&mut self, stmt: &UpdateStatement) -> Result<QueryResult> {
        let db = self.current_database();
        let table = self.catalog.get_database(&db)?.table(&stmt.table)?;
        let scope = Scope::for_table(&stmt.table, table);

        let mut assignments: Vec<(usize, &Expression)> = Vec::with_capacity(stmt.assignments.len());
        for (column, expr) in &stmt.assignments {
            let index = table
                .column_index(column)
                .ok_or_else(|| Error::UnknownColumn(column.clone()))?;
            if assignments.iter().any(|(i, _)| *i == index) {
                return Err(Error::InvalidChange(format!(
                    "the column name '{}' is specified more than once in the SET clause",
                    column
                )));
            }
            scope.check(expr)?;
            assignments.push((index, expr));
        }
        if let Some(predicate) = &stmt.where_clause {
            scope.check(predicate)?;
        }

        let evaluator = Evaluator::new(&scope, &self.patterns);
        let count = self.catalog.update_rows(
            &db,
            &stmt.table,
            |row| match &stmt.where_clause {
                Some(predicate) => evaluator.matches(predicate, Context::Row(row)),
                None => Ok(true),
            },
            |row| {
                assignments
                    .iter()
                    .map(|(index, expr)| Ok((*index, evaluator.eval(expr, Context::Row(row))?)))
                    .collect()
            },
        )?;
        debug!(database = %db, table = %stmt.table, rows = count, "updated rows");
        Ok(affected(count))
    }

    fn execute_delete(&mut self, stmt: &DeleteStatement) -> Result<QueryResult> {
        let db = self.current_database();
        let table = self.catalog.get_database(&db)?.table(&stmt.table)?;
        let scope = Scope::for_table(&stmt.table, table);
        if let Some(predicate) = &stmt.where_clause {
            scope.check(predicate)?;
        }

        let evaluator = Evaluator::new(&scope, &self.patterns);
        let count = self.catalog.delete_rows(&db, &stmt.table, |row| match &stmt.where_clause {
            Some(predicate) => evaluator.matches(predicate, Context::Row(row)),
            None => Ok(true),
        })?;
        debug!(database = %db, table = %stmt.table, rows = count, "deleted rows");
        Ok(affected(count))
    }

    fn execute_create_table(&mut self, stmt: &CreateTableStatement) -> Result<QueryResult> {
        let db = self.current_database();
        let columns = stmt
            .columns
            .iter()
            .map(|def| self.column_from_definition(def))
            .collect::<Result<Vec<_>>>()?;

        self.catalog.create_table(
            &db,
            TableDefinition {
                name: stmt.name.clone(),
                columns,
                primary_key: stmt.primary_key.clone(),
            },
        )?;
        Ok(QueryResult::status(format!("Table '{}' created.", stmt.name), 0))
    }

    fn execute_drop_table(&mut self, stmt: &DropTableStatement) -> Result<QueryResult> {
        let db = self.current_database();
        if stmt.if_exists && !self.catalog.get_database(&db)?.has_table(&stmt.name) {
            return Ok(QueryResult::status("Commands completed successfully.", 0));
        }
        self.catalog.drop_table(&db, &stmt.name)?;
        Ok(QueryResult::status(format!("Table '{}' dropped.", stmt.name), 0))
    }

    fn execute_alter_table(&mut self, stmt: &AlterTableStatement) -> Result<QueryResult> {
        let db = self.current_database();
        let change = match &stmt.action {
            AlterTableAction::AddColumn(def) => TableChange::AddColumn(self.column_from_definition(def)?),
            AlterTableAction::DropColumn(name) => TableChange::DropColumn(name.clone()),
        };
        self.catalog.alter_table(&db, &stmt.name, change)?;
        debug!(database = %db, table = %stmt.name, "altered table");
        Ok(QueryResult::status(format!("Table '{}' altered.", stmt.name), 0))
    }

    fn execute_use(&mut self, name: &str) -> Result<QueryResult> {
        if !self.catalog.has_database(name) {
            return Err(Error::UnknownDatabase(name.to_string()));
        }
        self.session.set_current_database(name);
        info!(database = name, "changed database context");
        Ok(QueryResult::status(
            format!("Changed database context to '{}'.", name),
            0,
        ))
    }

    fn column_from_definition(&self, def: &ColumnDefinition) -> Result<Column> {
        let default = match &def.default {
            None => None,
            Some(Expression::FunctionCall { name, args }) if name == "GETDATE" && args.is_empty() => {
                Some(ColumnDefault::CurrentTimestamp)
            }
            Some(expr) => {
                let scope = Scope::empty();
                let value = Evaluator::new(&scope, &self.patterns)
                    .eval(expr, Context::Row(&[]))
                    .map_err(|e| {
                        Error::InvalidDefinition(format!(
                            "default for column '{}' must be a constant: {}",
                            def.name, e
                        ))
                    })?;
                Some(ColumnDefault::Value(value))
            }
        };

        let identity = match def.identity {
            Some((_, 0)) => {
                return Err(Error::InvalidDefinition(format!(
                    "identity increment of column '{}' cannot be zero",
                    def.name
                )))
            }
            Some((seed, step)) => Some(Identity::new(seed, step)),
            None => None,
        };

        Ok(Column {
            name: def.name.clone(),
            data_type: def.data_type,
            nullable: def.nullable && !def.primary_key && identity.is_none(),
            primary_key: def.primary_key,
            identity,
            default,
        })
    }
}

fn affected(count: usize) -> QueryResult {
    let count = count as u64;
    QueryResult::status(rows_affected_message(count), count)
}

fn expand_projection(scope: &Scope, items: &[SelectItem]) -> Result<Vec<OutputColumn>> {
    let mut columns = Vec::new();
    for item in items {
        match item {
            SelectItem::Wildcard => {
                if scope.is_empty() {
                    return Err(Error::Unsupported(
                        "SELECT * with no tables specified is not valid".to_string(),
                    ));
                }
                for (index, column) in scope.columns().iter().enumerate() {
                    columns.push(OutputColumn {
                        heading: column.name.clone(),
                        alias: None,
                        value: Projected::Column(index),
                    });
                }
            }
            SelectItem::QualifiedWildcard(qualifier) => {
                let indices = scope.qualified(qualifier);
                if indices.is_empty() {
                    return Err(Error::UnknownTable(qualifier.clone()));
                }
                for index in indices {
                    columns.push(OutputColumn {
                        heading: scope.columns()[index].name.clone(),
                        alias: None,
                        value: Projected::Column(index),
                    });
                }
            }
            SelectItem::Expression { expr, alias } => {
                scope.check(expr)?;
                let heading = match (alias, expr) {
                    (Some(alias), _) => alias.clone(),
                    (None, Expression::Identifier(name)) => name.clone(),
                    (None, Expression::QualifiedIdentifier { column, .. }) => column.clone(),
                    (None, other) => other.to_string(),
                };
                columns.push(OutputColumn {
                    heading,
                    alias: alias.clone(),
                    value: Projected::Expr(expr.clone()),
                });
            }
        }
    }
    Ok(columns)
}

/// ORDER BY items may name an output alias or a 1-based select-list
/// position; anything else is evaluated against the source row or group.
fn resolve_order_by(
    scope: &Scope,
    order_by: &[OrderByItem],
    projection: &[OutputColumn],
) -> Result<Vec<SortKey>> {
    let mut keys = Vec::with_capacity(order_by.len());
    for item in order_by {
        let key = match &item.expr {
            Expression::Literal(SqlValue::Integer(position)) => {
                let index = usize::try_from(*position)
                    .ok()
                    .filter(|p| (1..=projection.len()).contains(p))
                    .ok_or_else(|| Error::UnknownColumn(position.to_string()))?;
                SortKey::Output(index - 1)
            }
            Expression::Identifier(name) => {
                match projection
                    .iter()
                    .position(|c| c.alias.as_deref() == Some(name.as_str()))
                {
                    Some(index) => SortKey::Output(index),
                    None => {
                        scope.check(&item.expr)?;
                        SortKey::Expr(item.expr.clone())
                    }
                }
            }
            expr => {
                scope.check(expr)?;
                SortKey::Expr(expr.clone())
            }
        };
        keys.push(key);
    }
    Ok(keys)
}

fn project(
    evaluator: &Evaluator<'_>,
    ctx: Context<'_>,
    projection: &[OutputColumn],
    sort_keys: &[SortKey],
) -> Result<(Row, Vec<SqlValue>)> {
    let mut row = Vec::with_capacity(projection.len());
    for column in projection {
        row.push(match &column.value {
            Projected::Column(index) => evaluator.column(*index, ctx)?,
            Projected::Expr(expr) => evaluator.eval(expr, ctx)?,
        });
    }

    let mut keys = Vec::with_capacity(sort_keys.len());
    for key in sort_keys {
        keys.push(match key {
            SortKey::Output(index) => row[*index].clone(),
            SortKey::Expr(expr) => evaluator.eval(expr, ctx)?,
        });
    }
    Ok((row, keys))
}

/// Bucket rows by their GROUP BY values, keeping groups in order of first
/// appearance. Without GROUP BY the whole input is one group, even when it
/// is empty.
fn group_rows(evaluator: &Evaluator<'_>, rows: Vec<Row>, group_by: &[Expression]) -> Result<Vec<Vec<Row>>> {
    if group_by.is_empty() {
        return Ok(vec![rows]);
    }

    let mut index: AHashMap<Vec<GroupKey>, usize> = AHashMap::new();
    let mut groups: Vec<Vec<Row>> = Vec::new();
    for row in rows {
        let mut values = Vec::with_capacity(group_by.len());
        for expr in group_by {
            values.push(evaluator.eval(expr, Context::Row(&row))?);
        }
        match index.get(&group_key(&values)) {
            Some(&i) => groups[i].push(row),
            None => {
                index.insert(group_key(&values), groups.len());
                groups.push(vec![row]);
            }
        }
    }
    Ok(groups)
}

/// NULLs sort last in both directions.
fn compare_sort_keys(a: &[SqlValue], b: &[SqlValue], order_by: &[OrderByItem]) -> Ordering {
    for ((x, y), item) in a.iter().zip(b).zip(order_by) {
        let ordering = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) if item.ascending => x.sort_cmp(y),
            (false, false) => y.sort_cmp(x),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse_sql;

    fn run(catalog: &mut Catalog, session: &mut Session, sql: &str) -> Result<QueryResult> {
        let mut last = QueryResult::status("Commands completed successfully.", 0);
        for statement in parse_sql(sql)? {
            last = QueryExecutor::new(catalog, session).execute(&statement)?;
        }
        Ok(last)
    }

    fn setup() -> (Catalog, Session) {
        let mut catalog = Catalog::seeded();
        let mut session = Session::new("ShopDB");
        run(
            &mut catalog,
            &mut session,
            "CREATE TABLE T (ID INT PRIMARY KEY, GRP VARCHAR(10), V INT);
             INSERT INTO T VALUES (1, 'a', 10), (2, 'b', NULL), (3, 'a', 30), (4, NULL, 5);",
        )
        .unwrap();
        (catalog, session)
    }

    #[test]
    fn test_order_by_puts_nulls_last_in_both_directions() {
        let (mut catalog, mut session) = setup();
        let asc = run(&mut catalog, &mut session, "SELECT ID FROM T ORDER BY V").unwrap();
        assert_eq!(
            asc.rows().unwrap(),
            &[
                vec![SqlValue::Integer(4)],
                vec![SqlValue::Integer(1)],
                vec![SqlValue::Integer(3)],
                vec![SqlValue::Integer(2)],
            ]
        );
        let desc = run(&mut catalog, &mut session, "SELECT ID FROM T ORDER BY V DESC").unwrap();
        assert_eq!(
            desc.rows().unwrap(),
            &[
                vec![SqlValue::Integer(3)],
                vec![SqlValue::Integer(1)],
                vec![SqlValue::Integer(4)],
                vec![SqlValue::Integer(2)],
            ]
        );
    }

    #[test]
    fn test_group_by_with_having_and_alias_ordering() {
        let (mut catalog, mut session) = setup();
        let result = run(
            &mut catalog,
            &mut session,
            "SELECT GRP, COUNT(*) AS N, SUM(V) AS TOTAL FROM T
             GROUP BY GRP HAVING COUNT(*) >= 1 ORDER BY N DESC, GRP",
        )
        .unwrap();
        assert_eq!(result.columns().unwrap(), &["GRP", "N", "TOTAL"]);
        assert_eq!(
            result.rows().unwrap(),
            &[
                vec![SqlValue::text("a"), SqlValue::Integer(2), SqlValue::Integer(40)],
                vec![SqlValue::text("b"), SqlValue::Integer(1), SqlValue::Null],
                vec![SqlValue::Null, SqlValue::Integer(1), SqlValue::Integer(5)],
            ]
        );
    }

    #[test]
    fn test_ungrouped_column_is_rejected() {
        let (mut catalog, mut session) = setup();
        let err = run(&mut catalog, &mut session, "SELECT GRP, V, COUNT(*) FROM T GROUP BY GRP")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGrouping(_)));
    }

    #[test]
    fn test_count_over_empty_input_is_zero() {
        let (mut catalog, mut session) = setup();
        let result = run(&mut catalog, &mut session, "SELECT COUNT(*), MAX(V) FROM T WHERE ID > 100")
            .unwrap();
        assert_eq!(
            result.rows().unwrap(),
            &[vec![SqlValue::Integer(0), SqlValue::Null]]
        );
    }

    #[test]
    fn test_distinct_and_top() {
        let (mut catalog, mut session) = setup();
        let result = run(&mut catalog, &mut session, "SELECT DISTINCT GRP FROM T ORDER BY GRP").unwrap();
        assert_eq!(
            result.rows().unwrap(),
            &[vec![SqlValue::text("a")], vec![SqlValue::text("b")], vec![SqlValue::Null]]
        );

        let result = run(&mut catalog, &mut session, "SELECT TOP 2 ID FROM T ORDER BY 1 DESC").unwrap();
        assert_eq!(
            result.rows().unwrap(),
            &[vec![SqlValue::Integer(4)], vec![SqlValue::Integer(3)]]
        );
    }

    #[test]
    fn test_unknown_column_reported_on_empty_table() {
        let (mut catalog, mut session) = setup();
        run(&mut catalog, &mut session, "DELETE FROM T").unwrap();
        let err = run(&mut catalog, &mut session, "SELECT NOPE FROM T").unwrap_err();
        assert_eq!(err, Error::UnknownColumn("NOPE".to_string()));
    }

    #[test]
    fn test_update_and_delete_report_affected_rows() {
        let (mut catalog, mut session) = setup();
        let result = run(&mut catalog, &mut session, "UPDATE T SET V = V * 2 WHERE GRP = 'a'").unwrap();
        assert_eq!(result.rows_affected(), Some(2));
        assert_eq!(result, QueryResult::status("(2 rows affected)", 2));

        let result = run(&mut catalog, &mut session, "DELETE FROM T WHERE V IS NULL").unwrap();
        assert_eq!(result, QueryResult::status("(1 row affected)", 1));

        let result = run(&mut catalog, &mut session, "SELECT SUM(V) FROM T").unwrap();
        assert_eq!(result.rows().unwrap(), &[vec![SqlValue::Integer(85)]]);
    }

    #[test]
    fn test_insert_select_copies_rows() {
        let (mut catalog, mut session) = setup();
        run(
            &mut catalog,
            &mut session,
            "CREATE TABLE COPY (ID INT IDENTITY(100, 10) PRIMARY KEY, GRP VARCHAR(10));
             INSERT INTO COPY (GRP) SELECT GRP FROM T WHERE GRP IS NOT NULL ORDER BY ID;",
        )
        .unwrap();
        let result = run(&mut catalog, &mut session, "SELECT * FROM COPY").unwrap();
        assert_eq!(
            result.rows().unwrap(),
            &[
                vec![SqlValue::Integer(100), SqlValue::text("a")],
                vec![SqlValue::Integer(110), SqlValue::text("b")],
                vec![SqlValue::Integer(120), SqlValue::text("a")],
            ]
        );
    }

    #[test]
    fn test_database_ddl_is_unsupported() {
        let (mut catalog, mut session) = setup();
        let err = run(&mut catalog, &mut session, "CREATE DATABASE Extra").unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert_eq!(catalog.database_names().len(), 3);
    }
}
