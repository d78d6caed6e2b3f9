//! Expression evaluation over rows and groups of rows.
//!
//! Predicates follow three-valued logic: comparisons involving NULL yield
//! NULL, and a filter keeps a row only when its predicate is TRUE.

use super::ast::{AggregateFunction, BinaryOperator, Expression, UnaryOperator};
use super::types::{GroupKey, SqlType, SqlValue};
use crate::catalog::{Row, Table};
use crate::error::{Error, Result};
use ahash::{AHashMap, AHashSet};
use chrono::{Datelike, Local, NaiveDateTime};
use regex::Regex;
use std::cell::RefCell;
use std::cmp::Ordering;

/// A column visible to expressions, with the table name or alias that
/// qualifies it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeColumn {
    pub qualifier: Option<String>,
    pub name: String,
}

/// Name resolution for the columns of the row being evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    columns: Vec<ScopeColumn>,
}

impl Scope {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_table(qualifier: &str, table: &Table) -> Self {
        Scope {
            columns: table
                .columns
                .iter()
                .map(|c| ScopeColumn {
                    qualifier: Some(qualifier.to_string()),
                    name: c.name.clone(),
                })
                .collect(),
        }
    }

    /// Scope of a joined row: the left columns followed by the right ones.
    pub fn join(&self, right: &Scope) -> Scope {
        let mut columns = self.columns.clone();
        columns.extend(right.columns.iter().cloned());
        Scope { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ScopeColumn] {
        &self.columns
    }

    pub fn resolve(&self, qualifier: Option<&str>, name: &str) -> Result<usize> {
        let mut found = None;
        for (index, column) in self.columns.iter().enumerate() {
            if column.name != name {
                continue;
            }
            if let Some(qualifier) = qualifier {
                if column.qualifier.as_deref() != Some(qualifier) {
                    continue;
                }
            }
            if found.is_some() {
                return Err(Error::AmbiguousColumn(name.to_string()));
            }
            found = Some(index);
        }
        found.ok_or_else(|| match qualifier {
            Some(q) => Error::UnknownColumn(format!("{}.{}", q, name)),
            None => Error::UnknownColumn(name.to_string()),
        })
    }

    /// Indices of every column qualified by `qualifier`, for `alias.*`.
    pub fn qualified(&self, qualifier: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.qualifier.as_deref() == Some(qualifier))
            .map(|(i, _)| i)
            .collect()
    }

    /// Column index an expression refers to, if it is a plain column reference.
    pub fn column_of(&self, expr: &Expression) -> Result<Option<usize>> {
        match expr {
            Expression::Identifier(name) => self.resolve(None, name).map(Some),
            Expression::QualifiedIdentifier { table, column } => {
                self.resolve(Some(table), column).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Resolve every column reference in `expr`, so unknown names are
    /// reported even when there are no rows to evaluate against.
    pub fn check(&self, expr: &Expression) -> Result<()> {
        match expr {
            Expression::Literal(_) => Ok(()),
            Expression::Identifier(_) | Expression::QualifiedIdentifier { .. } => {
                self.column_of(expr).map(|_| ())
            }
            Expression::BinaryOp { left, right, .. } => {
                self.check(left)?;
                self.check(right)
            }
            Expression::UnaryOp { expr, .. }
            | Expression::Cast { expr, .. }
            | Expression::IsNull { expr, .. } => self.check(expr),
            Expression::FunctionCall { args, .. } => args.iter().try_for_each(|a| self.check(a)),
            Expression::Aggregate { arg, .. } => match arg {
                Some(arg) => self.check(arg),
                None => Ok(()),
            },
            Expression::Case {
                operand,
                conditions,
                else_expr,
            } => {
                if let Some(operand) = operand {
                    self.check(operand)?;
                }
                for (when, then) in conditions {
                    self.check(when)?;
                    self.check(then)?;
                }
                match else_expr {
                    Some(e) => self.check(e),
                    None => Ok(()),
                }
            }
            Expression::InList { expr, list, .. } => {
                self.check(expr)?;
                list.iter().try_for_each(|e| self.check(e))
            }
            Expression::Between {
                expr, low, high, ..
            } => {
                self.check(expr)?;
                self.check(low)?;
                self.check(high)
            }
            Expression::Like { expr, pattern, .. } => {
                self.check(expr)?;
                self.check(pattern)
            }
        }
    }
}

/// GROUP BY expressions of a grouped query, with the column indices of the
/// ones that are plain column references.
#[derive(Debug, Clone)]
pub struct GroupKeys {
    exprs: Vec<Expression>,
    columns: Vec<usize>,
}

impl GroupKeys {
    pub fn new(scope: &Scope, exprs: &[Expression]) -> Result<Self> {
        let mut columns = Vec::new();
        for expr in exprs {
            if let Some(index) = scope.column_of(expr)? {
                columns.push(index);
            }
        }
        Ok(GroupKeys {
            exprs: exprs.to_vec(),
            columns,
        })
    }

    pub fn exprs(&self) -> &[Expression] {
        &self.exprs
    }
}

/// What an expression is evaluated against.
#[derive(Clone, Copy)]
pub enum Context<'a> {
    Row(&'a [SqlValue]),
    /// One bucket of a grouped query; may be empty for the single implicit
    /// group over zero input rows.
    Group {
        rows: &'a [Row],
        keys: &'a GroupKeys,
    },
}

/// Compiled LIKE patterns, shared by every evaluation in one statement.
#[derive(Default)]
pub struct PatternCache {
    compiled: RefCell<AHashMap<String, Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_match(&self, pattern: &str, text: &str) -> Result<bool> {
        if let Some(regex) = self.compiled.borrow().get(pattern) {
            return Ok(regex.is_match(text));
        }
        let regex = Regex::new(&like_to_regex(pattern)).map_err(|e| {
            Error::type_mismatch(format!("invalid LIKE pattern '{}': {}", pattern, e))
        })?;
        let matched = regex.is_match(text);
        self.compiled.borrow_mut().insert(pattern.to_string(), regex);
        Ok(matched)
    }
}

/// Translate a T-SQL LIKE pattern (`%`, `_`, `[abc]`, `[^a-z]`) into an
/// anchored regular expression.
fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    class.push(inner);
                }
                if closed && !class.is_empty() {
                    out.push('[');
                    let (negated, body) = match class.strip_prefix('^') {
                        Some(rest) => (true, rest),
                        None => (false, class.as_str()),
                    };
                    if negated {
                        out.push('^');
                    }
                    for ch in body.chars() {
                        match ch {
                            '\\' | '[' | ']' | '&' | '~' => {
                                out.push('\\');
                                out.push(ch);
                            }
                            _ => out.push(ch),
                        }
                    }
                    out.push(']');
                } else {
                    out.push_str(&regex::escape("["));
                    out.push_str(&regex::escape(&class));
                    if closed {
                        out.push_str(&regex::escape("]"));
                    }
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

/// Evaluates expressions against a fixed [`Scope`].
pub struct Evaluator<'a> {
    scope: &'a Scope,
    patterns: &'a PatternCache,
    now: NaiveDateTime,
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: &'a Scope, patterns: &'a PatternCache) -> Self {
        Evaluator {
            scope,
            patterns,
            now: Local::now().naive_local(),
        }
    }

    /// Evaluate a predicate; only TRUE passes.
    pub fn matches(&self, expr: &Expression, ctx: Context<'_>) -> Result<bool> {
        Ok(truth(&self.eval(expr, ctx)?)? == Some(true))
    }

    /// Value of column `index` in the given context. In a group, the column
    /// must be one of the GROUP BY columns.
    pub fn column(&self, index: usize, ctx: Context<'_>) -> Result<SqlValue> {
        match ctx {
            Context::Row(row) => Ok(row.get(index).cloned().unwrap_or(SqlValue::Null)),
            Context::Group { rows, keys } => {
                if !keys.columns.contains(&index) {
                    let column = &self.scope.columns[index];
                    let name = match &column.qualifier {
                        Some(q) => format!("{}.{}", q, column.name),
                        None => column.name.clone(),
                    };
                    return Err(Error::InvalidGrouping(format!(
                        "Column '{}' is invalid in the select list because it is not contained in either an aggregate function or the GROUP BY clause.",
                        name
                    )));
                }
                Ok(rows
                    .first()
                    .and_then(|row| row.get(index).cloned())
                    .unwrap_or(SqlValue::Null))
            }
        }
    }

    pub fn eval(&self, expr: &Expression, ctx: Context<'_>) -> Result<SqlValue> {
        if let Context::Group { rows, keys } = ctx {
            if !matches!(
                expr,
                Expression::Identifier(_) | Expression::QualifiedIdentifier { .. }
            ) && keys.exprs.iter().any(|key| key == expr)
            {
                return match rows.first() {
                    Some(row) => self.eval(expr, Context::Row(row)),
                    None => Ok(SqlValue::Null),
                };
            }
        }

        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Identifier(name) => {
                let index = self.scope.resolve(None, name)?;
                self.column(index, ctx)
            }
            Expression::QualifiedIdentifier { table, column } => {
                let index = self.scope.resolve(Some(table), column)?;
                self.column(index, ctx)
            }
            Expression::BinaryOp { left, op, right } => self.eval_binary(left, *op, right, ctx),
            Expression::UnaryOp { op, expr } => {
                let value = self.eval(expr, ctx)?;
                match op {
                    UnaryOperator::Not => Ok(match truth(&value)? {
                        Some(b) => SqlValue::Boolean(!b),
                        None => SqlValue::Null,
                    }),
                    UnaryOperator::Minus => negate(value),
                    UnaryOperator::Plus => match value {
                        SqlValue::Integer(_) | SqlValue::Decimal(_) | SqlValue::Null => Ok(value),
                        other => Err(Error::type_mismatch(format!(
                            "unary plus is not valid for {}",
                            other.to_literal()
                        ))),
                    },
                }
            }
            Expression::FunctionCall { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, ctx)?);
                }
                self.call_function(name, values)
            }
            Expression::Aggregate {
                func,
                arg,
                distinct,
            } => match ctx {
                Context::Group { rows, .. } => self.aggregate(func, arg.as_deref(), *distinct, rows),
                Context::Row(_) => Err(Error::InvalidGrouping(format!(
                    "An aggregate may not appear here: {}",
                    expr
                ))),
            },
            Expression::Case {
                operand,
                conditions,
                else_expr,
            } => {
                let operand = match operand {
                    Some(operand) => Some(self.eval(operand, ctx)?),
                    None => None,
                };
                for (when, then) in conditions {
                    let hit = match &operand {
                        Some(value) => {
                            let candidate = self.eval(when, ctx)?;
                            value.compare(&candidate)? == Some(Ordering::Equal)
                        }
                        None => self.matches(when, ctx)?,
                    };
                    if hit {
                        return self.eval(then, ctx);
                    }
                }
                match else_expr {
                    Some(e) => self.eval(e, ctx),
                    None => Ok(SqlValue::Null),
                }
            }
            Expression::Cast { expr, data_type } => self.eval(expr, ctx)?.coerce_to(*data_type),
            Expression::InList {
                expr,
                list,
                negated,
            } => {
                let value = self.eval(expr, ctx)?;
                if value.is_null() {
                    return Ok(SqlValue::Null);
                }
                let mut unknown = false;
                for item in list {
                    match value.compare(&self.eval(item, ctx)?)? {
                        Some(Ordering::Equal) => return Ok(SqlValue::Boolean(!negated)),
                        Some(_) => {}
                        None => unknown = true,
                    }
                }
                Ok(if unknown {
                    SqlValue::Null
                } else {
                    SqlValue::Boolean(*negated)
                })
            }
            Expression::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let value = self.eval(expr, ctx)?;
                let above = value
                    .compare(&self.eval(low, ctx)?)?
                    .map(|o| o != Ordering::Less);
                let below = value
                    .compare(&self.eval(high, ctx)?)?
                    .map(|o| o != Ordering::Greater);
                let inside = and3(above, below);
                Ok(match inside {
                    Some(b) => SqlValue::Boolean(b != *negated),
                    None => SqlValue::Null,
                })
            }
            Expression::Like {
                expr,
                pattern,
                negated,
            } => {
                let value = self.eval(expr, ctx)?;
                let pattern = self.eval(pattern, ctx)?;
                if value.is_null() || pattern.is_null() {
                    return Ok(SqlValue::Null);
                }
                let matched = self
                    .patterns
                    .is_match(&pattern.to_string(), &value.to_string())?;
                Ok(SqlValue::Boolean(matched != *negated))
            }
            Expression::IsNull { expr, negated } => {
                let value = self.eval(expr, ctx)?;
                Ok(SqlValue::Boolean(value.is_null() != *negated))
            }
        }
    }

    fn eval_binary(
        &self,
        left: &Expression,
        op: BinaryOperator,
        right: &Expression,
        ctx: Context<'_>,
    ) -> Result<SqlValue> {
        match op {
            BinaryOperator::And => {
                let l = truth(&self.eval(left, ctx)?)?;
                if l == Some(false) {
                    return Ok(SqlValue::Boolean(false));
                }
                let r = truth(&self.eval(right, ctx)?)?;
                return Ok(bool_value(and3(l, r)));
            }
            BinaryOperator::Or => {
                let l = truth(&self.eval(left, ctx)?)?;
                if l == Some(true) {
                    return Ok(SqlValue::Boolean(true));
                }
                let r = truth(&self.eval(right, ctx)?)?;
                return Ok(bool_value(or3(l, r)));
            }
            _ => {}
        }

        let l = self.eval(left, ctx)?;
        let r = self.eval(right, ctx)?;

        let comparison = |test: fn(Ordering) -> bool| -> Result<SqlValue> {
            Ok(bool_value(l.compare(&r)?.map(test)))
        };
        match op {
            BinaryOperator::Equal => comparison(|o| o == Ordering::Equal),
            BinaryOperator::NotEqual => comparison(|o| o != Ordering::Equal),
            BinaryOperator::Less => comparison(|o| o == Ordering::Less),
            BinaryOperator::Greater => comparison(|o| o == Ordering::Greater),
            BinaryOperator::LessEqual => comparison(|o| o != Ordering::Greater),
            BinaryOperator::GreaterEqual => comparison(|o| o != Ordering::Less),
            _ => arithmetic(op, &l, &r),
        }
    }

    fn aggregate(
        &self,
        func: &AggregateFunction,
        arg: Option<&Expression>,
        distinct: bool,
        rows: &[Row],
    ) -> Result<SqlValue> {
        let arg = match arg {
            Some(arg) => arg,
            None => return Ok(SqlValue::Integer(rows.len() as i64)),
        };

        let mut values = Vec::with_capacity(rows.len());
        let mut seen = AHashSet::new();
        for row in rows {
            let value = self.eval(arg, Context::Row(row))?;
            if value.is_null() {
                continue;
            }
            if distinct && !seen.insert(value.group_key()) {
                continue;
            }
            values.push(value);
        }

        match func {
            AggregateFunction::Count => Ok(SqlValue::Integer(values.len() as i64)),
            AggregateFunction::Sum => sum(func, &values),
            AggregateFunction::Avg => {
                if values.is_empty() {
                    return Ok(SqlValue::Null);
                }
                let total = sum(func, &values)?.as_f64().unwrap_or(0.0);
                Ok(SqlValue::Decimal(total / values.len() as f64))
            }
            AggregateFunction::Min | AggregateFunction::Max => {
                let want = if *func == AggregateFunction::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let mut best: Option<SqlValue> = None;
                for value in values {
                    best = match best {
                        None => Some(value),
                        Some(current) => {
                            if value.compare(&current)? == Some(want) {
                                Some(value)
                            } else {
                                Some(current)
                            }
                        }
                    };
                }
                Ok(best.unwrap_or(SqlValue::Null))
            }
        }
    }

    fn call_function(&self, name: &str, args: Vec<SqlValue>) -> Result<SqlValue> {
        let count = args.len();
        let arity = |n: usize| -> Result<()> {
            if count != n {
                return Err(Error::type_mismatch(format!(
                    "The {} function requires {} argument(s).",
                    name.to_lowercase(),
                    n
                )));
            }
            Ok(())
        };

        match name {
            "GETDATE" => {
                arity(0)?;
                Ok(SqlValue::DateTime(self.now))
            }
            "COALESCE" => {
                if args.is_empty() {
                    return Err(Error::type_mismatch(
                        "COALESCE requires at least one argument",
                    ));
                }
                Ok(args.into_iter().find(|v| !v.is_null()).unwrap_or(SqlValue::Null))
            }
            "ISNULL" => {
                arity(2)?;
                let mut args = args.into_iter();
                let value = args.next().unwrap_or(SqlValue::Null);
                let fallback = args.next().unwrap_or(SqlValue::Null);
                Ok(if value.is_null() { fallback } else { value })
            }
            "CONCAT" => {
                let mut out = String::new();
                for value in args.iter().filter(|v| !v.is_null()) {
                    out.push_str(&value.to_string());
                }
                Ok(SqlValue::Text(out))
            }
            _ => self.call_strict(name, args, arity),
        }
    }

    /// Functions that return NULL whenever any argument is NULL.
    fn call_strict(
        &self,
        name: &str,
        args: Vec<SqlValue>,
        arity: impl Fn(usize) -> Result<()>,
    ) -> Result<SqlValue> {
        if args.iter().any(SqlValue::is_null) {
            return Ok(SqlValue::Null);
        }
        let text = |i: usize| args[i].to_string();
        let integer = |i: usize| -> Result<i64> {
            match args[i].coerce_to(SqlType::Integer)? {
                SqlValue::Integer(v) => Ok(v),
                _ => Ok(0),
            }
        };
        let date = |i: usize| -> Result<NaiveDateTime> {
            match args[i].coerce_to(SqlType::DateTime)? {
                SqlValue::DateTime(v) => Ok(v),
                other => Err(Error::type_mismatch(format!(
                    "{} is not a date",
                    other.to_literal()
                ))),
            }
        };

        match name {
            "UPPER" => {
                arity(1)?;
                Ok(SqlValue::Text(text(0).to_uppercase()))
            }
            "LOWER" => {
                arity(1)?;
                Ok(SqlValue::Text(text(0).to_lowercase()))
            }
            "LEN" => {
                arity(1)?;
                Ok(SqlValue::Integer(text(0).trim_end().chars().count() as i64))
            }
            "LTRIM" => {
                arity(1)?;
                Ok(SqlValue::Text(text(0).trim_start().to_string()))
            }
            "RTRIM" => {
                arity(1)?;
                Ok(SqlValue::Text(text(0).trim_end().to_string()))
            }
            "TRIM" => {
                arity(1)?;
                Ok(SqlValue::Text(text(0).trim().to_string()))
            }
            "SUBSTRING" => {
                arity(3)?;
                let chars: Vec<char> = text(0).chars().collect();
                let start = integer(1)?;
                let length = integer(2)?;
                if length < 0 {
                    return Err(Error::type_mismatch(
                        "Invalid length parameter passed to the substring function.",
                    ));
                }
                let from = start.max(1);
                let to = start.saturating_add(length).min(chars.len() as i64 + 1);
                if to <= from {
                    return Ok(SqlValue::Text(String::new()));
                }
                Ok(SqlValue::Text(
                    chars[(from - 1) as usize..(to - 1) as usize].iter().collect(),
                ))
            }
            "LEFT" | "RIGHT" => {
                arity(2)?;
                let chars: Vec<char> = text(0).chars().collect();
                let n = integer(1)?.max(0).min(chars.len() as i64) as usize;
                let slice = if name == "LEFT" {
                    &chars[..n]
                } else {
                    &chars[chars.len() - n..]
                };
                Ok(SqlValue::Text(slice.iter().collect()))
            }
            "ABS" => {
                arity(1)?;
                match &args[0] {
                    SqlValue::Integer(v) => v
                        .checked_abs()
                        .map(SqlValue::Integer)
                        .ok_or_else(overflow),
                    SqlValue::Decimal(v) => Ok(SqlValue::Decimal(v.abs())),
                    other => Err(Error::type_mismatch(format!(
                        "ABS is not valid for {}",
                        other.to_literal()
                    ))),
                }
            }
            "ROUND" => {
                if args.len() != 1 && args.len() != 2 {
                    return Err(Error::type_mismatch(
                        "The round function requires 2 argument(s).",
                    ));
                }
                // places beyond 18 digits round to nothing or change nothing
                let places = if args.len() == 2 { integer(1)?.clamp(-18, 18) } else { 0 };
                match &args[0] {
                    SqlValue::Integer(v) if places >= 0 => Ok(SqlValue::Integer(*v)),
                    SqlValue::Integer(v) => {
                        let factor = 10f64.powi(-places as i32);
                        Ok(SqlValue::Integer(((*v as f64 / factor).round() * factor) as i64))
                    }
                    SqlValue::Decimal(v) => {
                        let factor = 10f64.powi(places as i32);
                        Ok(SqlValue::Decimal((v * factor).round() / factor))
                    }
                    other => Err(Error::type_mismatch(format!(
                        "ROUND is not valid for {}",
                        other.to_literal()
                    ))),
                }
            }
            "YEAR" => {
                arity(1)?;
                Ok(SqlValue::Integer(i64::from(date(0)?.year())))
            }
            "MONTH" => {
                arity(1)?;
                Ok(SqlValue::Integer(i64::from(date(0)?.month())))
            }
            "DAY" => {
                arity(1)?;
                Ok(SqlValue::Integer(i64::from(date(0)?.day())))
            }
            _ => Err(Error::Unsupported(format!(
                "'{}' is not a recognized built-in function name.",
                name
            ))),
        }
    }
}

/// Truth value of a predicate result: `None` is UNKNOWN.
fn truth(value: &SqlValue) -> Result<Option<bool>> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Boolean(b) => Ok(Some(*b)),
        SqlValue::Integer(v) => Ok(Some(*v != 0)),
        other => Err(Error::type_mismatch(format!(
            "{} is not a boolean condition",
            other.to_literal()
        ))),
    }
}

fn bool_value(value: Option<bool>) -> SqlValue {
    value.map(SqlValue::Boolean).unwrap_or(SqlValue::Null)
}

fn and3(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn overflow() -> Error {
    Error::type_mismatch("Arithmetic overflow error converting expression to data type int.")
}

fn negate(value: SqlValue) -> Result<SqlValue> {
    match value {
        SqlValue::Null => Ok(SqlValue::Null),
        SqlValue::Integer(v) => v.checked_neg().map(SqlValue::Integer).ok_or_else(overflow),
        SqlValue::Decimal(v) => Ok(SqlValue::Decimal(-v)),
        other => Err(Error::type_mismatch(format!(
            "cannot negate {}",
            other.to_literal()
        ))),
    }
}

/// Numeric view of an operand; numeric text is accepted the way SQL Server
/// converts it implicitly.
fn numeric(value: &SqlValue) -> Result<SqlValue> {
    match value {
        SqlValue::Integer(_) | SqlValue::Decimal(_) => Ok(value.clone()),
        SqlValue::Boolean(b) => Ok(SqlValue::Integer(i64::from(*b))),
        SqlValue::Text(s) => match s.trim().parse::<i64>() {
            Ok(v) => Ok(SqlValue::Integer(v)),
            Err(_) => value.coerce_to(SqlType::Decimal),
        },
        other => Err(Error::type_mismatch(format!(
            "{} is not a number",
            other.to_literal()
        ))),
    }
}

fn arithmetic(op: BinaryOperator, l: &SqlValue, r: &SqlValue) -> Result<SqlValue> {
    if l.is_null() || r.is_null() {
        return Ok(SqlValue::Null);
    }
    if let (BinaryOperator::Add, SqlValue::Text(a), SqlValue::Text(b)) = (op, l, r) {
        return Ok(SqlValue::Text(format!("{}{}", a, b)));
    }

    match (numeric(l)?, numeric(r)?) {
        (SqlValue::Integer(a), SqlValue::Integer(b)) => {
            let result = match op {
                BinaryOperator::Add => a.checked_add(b),
                BinaryOperator::Subtract => a.checked_sub(b),
                BinaryOperator::Multiply => a.checked_mul(b),
                BinaryOperator::Divide | BinaryOperator::Modulo if b == 0 => {
                    return Err(Error::DivideByZero)
                }
                BinaryOperator::Divide => a.checked_div(b),
                BinaryOperator::Modulo => a.checked_rem(b),
                _ => None,
            };
            result.map(SqlValue::Integer).ok_or_else(overflow)
        }
        (a, b) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            let result = match op {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::Divide | BinaryOperator::Modulo if b == 0.0 => {
                    return Err(Error::DivideByZero)
                }
                BinaryOperator::Divide => a / b,
                BinaryOperator::Modulo => a % b,
                _ => return Err(Error::type_mismatch(format!("invalid operator {}", op))),
            };
            Ok(SqlValue::Decimal(result))
        }
    }
}

fn sum(func: &AggregateFunction, values: &[SqlValue]) -> Result<SqlValue> {
    if values.is_empty() {
        return Ok(SqlValue::Null);
    }
    let mut total = SqlValue::Integer(0);
    for value in values {
        total = match (total, value) {
            (SqlValue::Integer(a), SqlValue::Integer(b)) => {
                SqlValue::Integer(a.checked_add(*b).ok_or_else(overflow)?)
            }
            (acc, SqlValue::Integer(_) | SqlValue::Decimal(_)) => SqlValue::Decimal(
                acc.as_f64().unwrap_or(0.0) + value.as_f64().unwrap_or(0.0),
            ),
            (_, other) => {
                return Err(Error::type_mismatch(format!(
                    "Operand data type {} is invalid for {} operator.",
                    other.sql_type().map(|t| t.name()).unwrap_or("NULL"),
                    func.name().to_lowercase()
                )))
            }
        };
    }
    Ok(total)
}

/// Key used to bucket rows by their GROUP BY values.
pub fn group_key(values: &[SqlValue]) -> Vec<GroupKey> {
    values.iter().map(SqlValue::group_key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parser::Parser;

    fn expr(sql: &str) -> Expression {
        Parser::new(sql).unwrap().parse_expression().unwrap()
    }

    fn scope() -> Scope {
        Scope {
            columns: vec![
                ScopeColumn {
                    qualifier: Some("s".to_string()),
                    name: "NAME".to_string(),
                },
                ScopeColumn {
                    qualifier: Some("s".to_string()),
                    name: "GPA".to_string(),
                },
                ScopeColumn {
                    qualifier: Some("d".to_string()),
                    name: "NAME".to_string(),
                },
            ],
        }
    }

    fn eval_row(sql: &str, row: &[SqlValue]) -> Result<SqlValue> {
        let scope = scope();
        let patterns = PatternCache::new();
        Evaluator::new(&scope, &patterns).eval(&expr(sql), Context::Row(row))
    }

    fn row() -> Vec<SqlValue> {
        vec![SqlValue::text("Alice"), SqlValue::Decimal(3.5), SqlValue::text("Physics")]
    }

    #[test]
    fn test_column_resolution() {
        let scope = scope();
        assert_eq!(scope.resolve(None, "GPA").unwrap(), 1);
        assert_eq!(scope.resolve(Some("d"), "NAME").unwrap(), 2);
        assert!(matches!(scope.resolve(None, "NAME"), Err(Error::AmbiguousColumn(_))));
        assert!(matches!(scope.resolve(None, "gpa"), Err(Error::UnknownColumn(_))));
    }

    #[test]
    fn test_three_valued_logic() {
        let row = vec![SqlValue::Null, SqlValue::Decimal(3.5), SqlValue::text("x")];
        assert_eq!(eval_row("s.NAME = 'a'", &row).unwrap(), SqlValue::Null);
        assert_eq!(eval_row("s.NAME = 'a' AND 1 = 0", &row).unwrap(), SqlValue::Boolean(false));
        assert_eq!(eval_row("s.NAME = 'a' OR 1 = 1", &row).unwrap(), SqlValue::Boolean(true));
        assert_eq!(eval_row("NOT s.NAME = 'a'", &row).unwrap(), SqlValue::Null);
        assert_eq!(eval_row("s.NAME IS NULL", &row).unwrap(), SqlValue::Boolean(true));
        assert_eq!(eval_row("GPA NOT IN (1, NULL)", &row).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_like_patterns() {
        let row = row();
        assert_eq!(eval_row("s.NAME LIKE 'A%'", &row).unwrap(), SqlValue::Boolean(true));
        assert_eq!(eval_row("s.NAME LIKE 'a%'", &row).unwrap(), SqlValue::Boolean(false));
        assert_eq!(eval_row("s.NAME LIKE '_lice'", &row).unwrap(), SqlValue::Boolean(true));
        assert_eq!(eval_row("s.NAME LIKE '[A-C]%'", &row).unwrap(), SqlValue::Boolean(true));
        assert_eq!(eval_row("s.NAME NOT LIKE '[^A]%'", &row).unwrap(), SqlValue::Boolean(true));
        assert_eq!(eval_row("'a.c' LIKE 'a.c'", &row).unwrap(), SqlValue::Boolean(true));
        assert_eq!(eval_row("'abc' LIKE 'a.c'", &row).unwrap(), SqlValue::Boolean(false));
    }

    #[test]
    fn test_arithmetic() {
        let row = row();
        assert_eq!(eval_row("7 / 2", &row).unwrap(), SqlValue::Integer(3));
        assert_eq!(eval_row("7 % 4", &row).unwrap(), SqlValue::Integer(3));
        assert_eq!(eval_row("GPA * 2", &row).unwrap(), SqlValue::Decimal(7.0));
        assert_eq!(eval_row("'ab' + 'cd'", &row).unwrap(), SqlValue::text("abcd"));
        assert_eq!(eval_row("1 + NULL", &row).unwrap(), SqlValue::Null);
        assert!(matches!(eval_row("1 / 0", &row), Err(Error::DivideByZero)));
        assert!(matches!(
            eval_row("9223372036854775807 + 1", &row),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_scalar_functions() {
        let row = row();
        assert_eq!(eval_row("UPPER(s.NAME)", &row).unwrap(), SqlValue::text("ALICE"));
        assert_eq!(eval_row("LEN('abc  ')", &row).unwrap(), SqlValue::Integer(3));
        assert_eq!(eval_row("SUBSTRING('abcdef', 2, 3)", &row).unwrap(), SqlValue::text("bcd"));
        assert_eq!(eval_row("SUBSTRING('abc', 0, 2)", &row).unwrap(), SqlValue::text("a"));
        assert_eq!(eval_row("LEFT('abcdef', 2)", &row).unwrap(), SqlValue::text("ab"));
        assert_eq!(eval_row("RIGHT('abcdef', 2)", &row).unwrap(), SqlValue::text("ef"));
        assert_eq!(eval_row("CONCAT('a', NULL, 1)", &row).unwrap(), SqlValue::text("a1"));
        assert_eq!(eval_row("COALESCE(NULL, NULL, 'x')", &row).unwrap(), SqlValue::text("x"));
        assert_eq!(eval_row("ISNULL(NULL, 5)", &row).unwrap(), SqlValue::Integer(5));
        assert_eq!(eval_row("ROUND(2.567, 2)", &row).unwrap(), SqlValue::Decimal(2.57));
        assert_eq!(eval_row("YEAR('2024-03-09')", &row).unwrap(), SqlValue::Integer(2024));
        assert_eq!(eval_row("UPPER(NULL)", &row).unwrap(), SqlValue::Null);
        assert!(matches!(eval_row("NOPE(1)", &row), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_round_with_extreme_places() {
        let row = row();
        assert_eq!(eval_row("ROUND(1250, -2)", &row).unwrap(), SqlValue::Integer(1300));
        assert_eq!(
            eval_row("ROUND(5, CAST('-9223372036854775808' AS INT))", &row).unwrap(),
            SqlValue::Integer(0)
        );
        assert_eq!(
            eval_row("ROUND(2.5, 9223372036854775807)", &row).unwrap(),
            SqlValue::Decimal(2.5)
        );
        assert_eq!(eval_row("ROUND(7, 9223372036854775807)", &row).unwrap(), SqlValue::Integer(7));
    }

    #[test]
    fn test_case_and_cast() {
        let row = row();
        assert_eq!(
            eval_row("CASE WHEN GPA >= 3.5 THEN 'honors' ELSE 'regular' END", &row).unwrap(),
            SqlValue::text("honors")
        );
        assert_eq!(
            eval_row("CASE d.NAME WHEN 'Math' THEN 1 WHEN 'Physics' THEN 2 END", &row).unwrap(),
            SqlValue::Integer(2)
        );
        assert_eq!(eval_row("CAST(GPA AS INT)", &row).unwrap(), SqlValue::Integer(3));
        assert!(eval_row("CAST('x' AS INT)", &row).is_err());
    }

    #[test]
    fn test_aggregates_over_group() {
        let scope = scope();
        let patterns = PatternCache::new();
        let ev = Evaluator::new(&scope, &patterns);
        let rows = vec![
            vec![SqlValue::text("a"), SqlValue::Decimal(3.0), SqlValue::text("X")],
            vec![SqlValue::text("b"), SqlValue::Null, SqlValue::text("X")],
            vec![SqlValue::text("c"), SqlValue::Decimal(4.0), SqlValue::text("X")],
        ];
        let keys = GroupKeys::new(&scope, &[expr("d.NAME")]).unwrap();
        let ctx = Context::Group {
            rows: &rows,
            keys: &keys,
        };

        assert_eq!(ev.eval(&expr("COUNT(*)"), ctx).unwrap(), SqlValue::Integer(3));
        assert_eq!(ev.eval(&expr("COUNT(GPA)"), ctx).unwrap(), SqlValue::Integer(2));
        assert_eq!(ev.eval(&expr("AVG(GPA)"), ctx).unwrap(), SqlValue::Decimal(3.5));
        assert_eq!(ev.eval(&expr("MAX(s.NAME)"), ctx).unwrap(), SqlValue::text("c"));
        assert_eq!(ev.eval(&expr("d.NAME"), ctx).unwrap(), SqlValue::text("X"));
        assert!(matches!(
            ev.eval(&expr("s.NAME"), ctx),
            Err(Error::InvalidGrouping(_))
        ));

        let empty: Vec<Row> = Vec::new();
        let ctx = Context::Group {
            rows: &empty,
            keys: &keys,
        };
        assert_eq!(ev.eval(&expr("COUNT(*)"), ctx).unwrap(), SqlValue::Integer(0));
        assert_eq!(ev.eval(&expr("SUM(GPA)"), ctx).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_aggregate_outside_group_is_rejected() {
        assert!(matches!(
            eval_row("COUNT(*) + 1", &row()),
            Err(Error::InvalidGrouping(_))
        ));
    }
}
