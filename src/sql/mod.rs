// SQL Engine Module
// T-SQL subset: lexer, parser, planner, evaluator and executor

pub mod ast;
pub mod evaluator;
pub mod executor;
pub mod lexer;
pub mod parser;
pub mod planner;
pub mod types;

pub use ast::{Expression, SelectStatement, Statement};
pub use executor::QueryExecutor;
pub use parser::{parse_sql, Parser};
pub use planner::{QueryPlan, QueryPlanner};
pub use types::{QueryResult, SqlType, SqlValue};
