// Query Planner - turns a SELECT into a naive logical plan
//
// There is no cost model: sources are joined left to right with nested
// loops, in the order they are written.
use super::ast::*;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// `SELECT` without `FROM`: a single row with no columns
    Empty,
    TableScan {
        table: String,
        qualifier: String,
    },
    NestedLoopJoin {
        left: Box<PlanNode>,
        right: Box<PlanNode>,
        join_type: JoinType,
        condition: Option<Expression>,
    },
    Filter {
        input: Box<PlanNode>,
        predicate: Expression,
    },
}

/// GROUP BY / HAVING stage. Present whenever the query aggregates, even
/// without a GROUP BY clause (the whole input is then a single group).
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub group_by: Vec<Expression>,
    pub having: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub source: PlanNode,
    pub aggregation: Option<Aggregation>,
    pub projection: Vec<SelectItem>,
    pub distinct: bool,
    pub order_by: Vec<OrderByItem>,
    pub top: Option<u64>,
}

pub struct QueryPlanner;

impl QueryPlanner {
    pub fn plan(stmt: &SelectStatement) -> Result<QueryPlan> {
        if stmt.columns.is_empty() {
            return Err(Error::Unsupported("a SELECT list is required".to_string()));
        }

        let mut source = match &stmt.from {
            Some(table) => PlanNode::TableScan {
                table: table.name.clone(),
                qualifier: table.qualifier().to_string(),
            },
            None => {
                if !stmt.joins.is_empty() {
                    return Err(Error::Unsupported("JOIN requires a FROM clause".to_string()));
                }
                PlanNode::Empty
            }
        };

        for join in &stmt.joins {
            if let Some(condition) = &join.condition {
                reject_aggregate(condition, "the ON clause")?;
            }
            source = PlanNode::NestedLoopJoin {
                left: Box::new(source),
                right: Box::new(PlanNode::TableScan {
                    table: join.table.name.clone(),
                    qualifier: join.table.qualifier().to_string(),
                }),
                join_type: join.join_type,
                condition: join.condition.clone(),
            };
        }

        if let Some(predicate) = &stmt.where_clause {
            reject_aggregate(predicate, "the WHERE clause")?;
            source = PlanNode::Filter {
                input: Box::new(source),
                predicate: predicate.clone(),
            };
        }

        for expr in &stmt.group_by {
            if expr.contains_aggregate() {
                return Err(Error::InvalidGrouping(
                    "Cannot use an aggregate or a subquery in an expression used for the group by list of a GROUP BY clause."
                        .to_string(),
                ));
            }
        }

        let aggregates = stmt.columns.iter().any(|item| match item {
            SelectItem::Expression { expr, .. } => expr.contains_aggregate(),
            _ => false,
        }) || stmt.order_by.iter().any(|item| item.expr.contains_aggregate());

        let aggregation = if aggregates || !stmt.group_by.is_empty() || stmt.having.is_some() {
            Some(Aggregation {
                group_by: stmt.group_by.clone(),
                having: stmt.having.clone(),
            })
        } else {
            None
        };

        Ok(QueryPlan {
            source,
            aggregation,
            projection: stmt.columns.clone(),
            distinct: stmt.distinct,
            order_by: stmt.order_by.clone(),
            top: stmt.top,
        })
    }
}

fn reject_aggregate(expr: &Expression, clause: &str) -> Result<()> {
    if expr.contains_aggregate() {
        return Err(Error::InvalidGrouping(format!(
            "An aggregate may not appear in {}.",
            clause
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::parse_sql;

    fn plan(sql: &str) -> Result<QueryPlan> {
        match parse_sql(sql).unwrap().remove(0) {
            Statement::Select(stmt) => QueryPlanner::plan(&stmt),
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_joins_nest_left_to_right() {
        let plan = plan(
            "SELECT * FROM A a JOIN B b ON a.X = b.X LEFT JOIN C c ON b.Y = c.Y WHERE a.Z > 1",
        )
        .unwrap();

        let PlanNode::Filter { input, .. } = plan.source else {
            panic!("expected a filter on top");
        };
        let PlanNode::NestedLoopJoin {
            left, join_type, ..
        } = *input
        else {
            panic!("expected a join");
        };
        assert_eq!(join_type, JoinType::Left);
        assert!(matches!(*left, PlanNode::NestedLoopJoin { join_type: JoinType::Inner, .. }));
        assert!(plan.aggregation.is_none());
    }

    #[test]
    fn test_aggregate_without_group_by_forms_one_group() {
        let plan = plan("SELECT COUNT(*) FROM STUDENTS").unwrap();
        assert_eq!(
            plan.aggregation,
            Some(Aggregation {
                group_by: Vec::new(),
                having: None
            })
        );
    }

    #[test]
    fn test_aggregate_in_where_is_rejected() {
        let err = plan("SELECT NAME FROM T WHERE COUNT(*) > 1").unwrap_err();
        assert!(matches!(err, Error::InvalidGrouping(_)));
    }

    #[test]
    fn test_select_without_from() {
        let plan = plan("SELECT 1 + 1").unwrap();
        assert_eq!(plan.source, PlanNode::Empty);
    }
}
