// SQL Parser
use std::ops::Range;

use super::ast::*;
use super::lexer::{Lexer, Spanned, Token};
use super::types::{SqlType, SqlValue};
use crate::error::{Error, Result};

/// Parse a whole batch. Any syntax error aborts the batch before anything runs.
pub fn parse_sql(sql: &str) -> Result<Vec<Statement>> {
    Parser::new(sql)?.parse_batch()
}

/// Like [`parse_sql`], but pairs every statement with the source text it was
/// parsed from (without the trailing `;`).
pub fn parse_sql_with_text(sql: &str) -> Result<Vec<(Statement, &str)>> {
    let statements = Parser::new(sql)?.parse_batch_spanned()?;
    Ok(statements
        .into_iter()
        .map(|(statement, span)| (statement, sql.get(span).unwrap_or_default().trim()))
        .collect())
}

/// Budget for nested sub-expressions, parenthesised groups and operator
/// chains. Evaluation recurses along the same path, so this also bounds the
/// executor's stack use.
pub const MAX_EXPRESSION_DEPTH: usize = 64;

pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Parser {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    fn current(&self) -> &Spanned {
        // tokenize() always ends with Eof
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn current_token(&self) -> &Token {
        &self.current().token
    }

    fn peek_token(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.position + offset)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let current = self.current();
        Error::Syntax {
            message: message.into(),
            near: current.token.describe(),
            line: current.line,
            column: current.column,
        }
    }

    /// Consume `token` if it is next.
    fn consume(&mut self, token: &Token) -> bool {
        if self.current_token() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.consume(&expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", expected.describe())))
        }
    }

    fn parse_identifier(&mut self, what: &str) -> Result<String> {
        match self.current_token().clone() {
            Token::Identifier(name) | Token::QuotedIdentifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(format!("expected {}", what))),
        }
    }

    /// `name` or `schema.name`; the schema part (e.g. `dbo`) is accepted and ignored.
    fn parse_object_name(&mut self) -> Result<String> {
        let name = self.parse_identifier("a table name")?;
        if self.current_token() == &Token::Dot {
            self.advance();
            return self.parse_identifier("a table name");
        }
        Ok(name)
    }

    fn parse_integer(&mut self, what: &str) -> Result<i64> {
        let negative = self.consume(&Token::Minus);
        match *self.current_token() {
            Token::IntegerLiteral(n) => {
                self.advance();
                Ok(if negative { -n } else { n })
            }
            _ => Err(self.error(format!("expected {}", what))),
        }
    }

    fn starts_statement(token: &Token) -> bool {
        matches!(
            token,
            Token::Select
                | Token::Insert
                | Token::Update
                | Token::Delete
                | Token::Create
                | Token::Drop
                | Token::Alter
                | Token::Use
        )
    }

    /// Parse every statement in the input. Statements are separated by `;`
    /// or simply follow one another.
    pub fn parse_batch(&mut self) -> Result<Vec<Statement>> {
        let statements = self.parse_batch_spanned()?;
        Ok(statements.into_iter().map(|(statement, _)| statement).collect())
    }

    /// [`Parser::parse_batch`] plus the byte range each statement covers.
    pub fn parse_batch_spanned(&mut self) -> Result<Vec<(Statement, Range<usize>)>> {
        let mut statements = Vec::new();

        loop {
            while self.consume(&Token::Semicolon) {}
            if self.current_token() == &Token::Eof {
                break;
            }

            let start = self.current().offset;
            let statement = self.parse()?;
            statements.push((statement, start..self.current().offset));

            match self.current_token() {
                Token::Semicolon | Token::Eof => {}
                token if Self::starts_statement(token) => {}
                _ => return Err(self.error("unexpected token after end of statement")),
            }
        }

        Ok(statements)
    }

    pub fn parse(&mut self) -> Result<Statement> {
        match self.current_token() {
            Token::Select => Ok(Statement::Select(self.parse_select()?)),
            Token::Insert => self.parse_insert(),
            Token::Update => self.parse_update(),
            Token::Delete => self.parse_delete(),
            Token::Create => self.parse_create(),
            Token::Drop => self.parse_drop(),
            Token::Alter => self.parse_alter(),
            Token::Use => {
                self.advance();
                Ok(Statement::Use(self.parse_identifier("a database name")?))
            }
            _ => Err(self.error("expected a statement")),
        }
    }

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(Token::Select)?;

        let distinct = self.consume(&Token::Distinct);

        let top = if self.consume(&Token::Top) {
            let parenthesized = self.consume(&Token::LeftParen);
            let n = self.parse_integer("a row count after TOP")?;
            if n < 0 {
                return Err(self.error("TOP requires a non-negative row count"));
            }
            if parenthesized {
                self.expect(Token::RightParen)?;
            }
            Some(n as u64)
        } else {
            None
        };

        let columns = self.parse_select_items()?;

        let mut joins = Vec::new();
        let from = if self.consume(&Token::From) {
            let first = self.parse_table_reference()?;
            while self.consume(&Token::Comma) {
                joins.push(Join {
                    join_type: JoinType::Cross,
                    table: self.parse_table_reference()?,
                    condition: None,
                });
            }
            Some(first)
        } else {
            None
        };

        while self.is_join_keyword() {
            if from.is_none() {
                return Err(self.error("JOIN requires a FROM clause"));
            }
            joins.push(self.parse_join()?);
        }

        let where_clause = if self.consume(&Token::Where) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let group_by = if self.consume(&Token::Group) {
            self.expect(Token::By)?;
            self.parse_expression_list()?
        } else {
            Vec::new()
        };

        let having = if self.consume(&Token::Having) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let order_by = if self.consume(&Token::Order) {
            self.expect(Token::By)?;
            self.parse_order_by_items()?
        } else {
            Vec::new()
        };

        Ok(SelectStatement {
            distinct,
            top,
            columns,
            from,
            joins,
            where_clause,
            group_by,
            having,
            order_by,
        })
    }

    fn parse_alias(&mut self) -> Result<Option<String>> {
        if self.consume(&Token::As) {
            return match self.current_token().clone() {
                Token::Identifier(name) | Token::QuotedIdentifier(name) | Token::StringLiteral(name) => {
                    self.advance();
                    Ok(Some(name))
                }
                _ => Err(self.error("expected an alias after AS")),
            };
        }
        match self.current_token().clone() {
            Token::Identifier(name) | Token::QuotedIdentifier(name) => {
                self.advance();
                Ok(Some(name))
            }
            _ => Ok(None),
        }
    }

    fn parse_select_items(&mut self) -> Result<Vec<SelectItem>> {
        let mut items = Vec::new();

        loop {
            let qualified_wildcard = matches!(
                self.current_token(),
                Token::Identifier(_) | Token::QuotedIdentifier(_)
            ) && self.peek_token(1) == &Token::Dot
                && self.peek_token(2) == &Token::Star;

            if self.consume(&Token::Star) {
                items.push(SelectItem::Wildcard);
            } else if qualified_wildcard {
                let table = self.parse_identifier("a table name")?;
                self.advance(); // .
                self.advance(); // *
                items.push(SelectItem::QualifiedWildcard(table));
            } else {
                let expr = self.parse_expression()?;
                let alias = self.parse_alias()?;
                items.push(SelectItem::Expression { expr, alias });
            }

            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(items)
    }

    fn parse_table_reference(&mut self) -> Result<TableReference> {
        let name = self.parse_object_name()?;
        let alias = self.parse_alias()?;
        Ok(TableReference { name, alias })
    }

    fn is_join_keyword(&self) -> bool {
        matches!(
            self.current_token(),
            Token::Join | Token::Inner | Token::Left | Token::Right | Token::Full | Token::Cross
        )
    }

    fn parse_join(&mut self) -> Result<Join> {
        let join_type = match self.current_token() {
            Token::Inner => {
                self.advance();
                self.expect(Token::Join)?;
                JoinType::Inner
            }
            Token::Left | Token::Right | Token::Full => {
                let join_type = match self.current_token() {
                    Token::Left => JoinType::Left,
                    Token::Right => JoinType::Right,
                    _ => JoinType::Full,
                };
                self.advance();
                self.consume(&Token::Outer);
                self.expect(Token::Join)?;
                join_type
            }
            Token::Cross => {
                self.advance();
                self.expect(Token::Join)?;
                JoinType::Cross
            }
            Token::Join => {
                self.advance();
                JoinType::Inner
            }
            _ => return Err(self.error("expected JOIN")),
        };

        let table = self.parse_table_reference()?;

        let condition = if join_type == JoinType::Cross {
            None
        } else {
            self.expect(Token::On)?;
            Some(self.parse_expression()?)
        };

        Ok(Join {
            join_type,
            table,
            condition,
        })
    }

    fn parse_order_by_items(&mut self) -> Result<Vec<OrderByItem>> {
        let mut items = Vec::new();

        loop {
            let expr = self.parse_expression()?;
            let ascending = if self.consume(&Token::Desc) {
                false
            } else {
                self.consume(&Token::Asc);
                true
            };
            items.push(OrderByItem { expr, ascending });

            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(items)
    }

    pub fn parse_expression(&mut self) -> Result<Expression> {
        let base = self.depth;
        self.descend()?;
        let expr = self.parse_or_expression()?;
        self.depth = base;
        Ok(expr)
    }

    /// Charge one level against the expression depth budget. Callers reset
    /// `depth` to its entry value once their subtree is complete.
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn parse_or_expression(&mut self) -> Result<Expression> {
        let base = self.depth;
        let mut left = self.parse_and_expression()?;

        while self.consume(&Token::Or) {
            self.descend()?;
            let right = self.parse_and_expression()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_and_expression(&mut self) -> Result<Expression> {
        let base = self.depth;
        let mut left = self.parse_not_expression()?;

        while self.consume(&Token::And) {
            self.descend()?;
            let right = self.parse_not_expression()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_not_expression(&mut self) -> Result<Expression> {
        if self.consume(&Token::Not) {
            let base = self.depth;
            self.descend()?;
            let expr = self.parse_not_expression()?;
            self.depth = base;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison_expression()
    }

    fn parse_comparison_expression(&mut self) -> Result<Expression> {
        let left = self.parse_additive_expression()?;

        let op = match self.current_token() {
            Token::Equal => BinaryOperator::Equal,
            Token::NotEqual => BinaryOperator::NotEqual,
            Token::Less => BinaryOperator::Less,
            Token::Greater => BinaryOperator::Greater,
            Token::LessEqual => BinaryOperator::LessEqual,
            Token::GreaterEqual => BinaryOperator::GreaterEqual,
            Token::Is => return self.parse_is_null(left),
            Token::Not | Token::In | Token::Between | Token::Like => {
                return self.parse_predicate_suffix(left)
            }
            _ => return Ok(left),
        };

        self.advance();
        let right = self.parse_additive_expression()?;

        Ok(Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_is_null(&mut self, left: Expression) -> Result<Expression> {
        self.expect(Token::Is)?;
        let negated = self.consume(&Token::Not);
        self.expect(Token::Null)?;
        Ok(Expression::IsNull {
            expr: Box::new(left),
            negated,
        })
    }

    /// `[NOT] IN (...)`, `[NOT] BETWEEN a AND b`, `[NOT] LIKE pattern`
    fn parse_predicate_suffix(&mut self, left: Expression) -> Result<Expression> {
        let negated = self.consume(&Token::Not);
        let expr = Box::new(left);

        match self.current_token() {
            Token::In => {
                self.advance();
                self.expect(Token::LeftParen)?;
                let list = self.parse_expression_list()?;
                self.expect(Token::RightParen)?;
                Ok(Expression::InList {
                    expr,
                    list,
                    negated,
                })
            }
            Token::Between => {
                self.advance();
                let low = self.parse_additive_expression()?;
                self.expect(Token::And)?;
                let high = self.parse_additive_expression()?;
                Ok(Expression::Between {
                    expr,
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                })
            }
            Token::Like => {
                self.advance();
                let pattern = self.parse_additive_expression()?;
                Ok(Expression::Like {
                    expr,
                    pattern: Box::new(pattern),
                    negated,
                })
            }
            _ => Err(self.error("expected IN, BETWEEN or LIKE")),
        }
    }

    fn parse_additive_expression(&mut self) -> Result<Expression> {
        let base = self.depth;
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            self.descend()?;
            let right = self.parse_multiplicative_expression()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> Result<Expression> {
        let base = self.depth;
        let mut left = self.parse_unary_expression()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };

            self.advance();
            self.descend()?;
            let right = self.parse_unary_expression()?;
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        self.depth = base;
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Minus,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_primary_expression(),
        };
        self.advance();
        let base = self.depth;
        self.descend()?;
        let expr = self.parse_unary_expression()?;
        self.depth = base;

        // Fold negative numeric literals so they stay literals
        Ok(match (op, expr) {
            (UnaryOperator::Minus, Expression::Literal(SqlValue::Integer(n))) => {
                Expression::Literal(SqlValue::Integer(-n))
            }
            (UnaryOperator::Minus, Expression::Literal(SqlValue::Decimal(n))) => {
                Expression::Literal(SqlValue::Decimal(-n))
            }
            (op, expr) => Expression::UnaryOp {
                op,
                expr: Box::new(expr),
            },
        })
    }

    fn parse_primary_expression(&mut self) -> Result<Expression> {
        match self.current_token().clone() {
            Token::IntegerLiteral(n) => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Integer(n)))
            }
            Token::DecimalLiteral(f) => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Decimal(f)))
            }
            Token::StringLiteral(s) => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Text(s)))
            }
            Token::True => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Boolean(true)))
            }
            Token::False => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Boolean(false)))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Literal(SqlValue::Null))
            }
            Token::Case => self.parse_case(),
            Token::Cast => {
                self.advance();
                self.expect(Token::LeftParen)?;
                let expr = self.parse_expression()?;
                self.expect(Token::As)?;
                let data_type = self.parse_data_type()?;
                self.expect(Token::RightParen)?;
                Ok(Expression::Cast {
                    expr: Box::new(expr),
                    data_type,
                })
            }
            Token::Left | Token::Right if self.peek_token(1) == &Token::LeftParen => {
                let name = if self.current_token() == &Token::Left { "LEFT" } else { "RIGHT" };
                self.advance();
                self.parse_function_call(name.to_string())
            }
            Token::Identifier(name) => {
                self.advance();

                if self.current_token() == &Token::LeftParen {
                    return self.parse_function_call(name);
                }
                if name.eq_ignore_ascii_case("CURRENT_TIMESTAMP") {
                    return Ok(Expression::FunctionCall {
                        name: "GETDATE".to_string(),
                        args: Vec::new(),
                    });
                }
                self.parse_column_reference(name)
            }
            Token::QuotedIdentifier(name) => {
                self.advance();
                self.parse_column_reference(name)
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            _ => Err(self.error("expected an expression")),
        }
    }

    fn parse_column_reference(&mut self, first: String) -> Result<Expression> {
        if self.current_token() == &Token::Dot {
            self.advance();
            let column = self.parse_identifier("a column name")?;
            return Ok(Expression::QualifiedIdentifier {
                table: first,
                column,
            });
        }
        Ok(Expression::Identifier(first))
    }

    fn parse_function_call(&mut self, name: String) -> Result<Expression> {
        self.expect(Token::LeftParen)?;

        if let Some(func) = AggregateFunction::from_name(&name) {
            if func == AggregateFunction::Count && self.consume(&Token::Star) {
                self.expect(Token::RightParen)?;
                return Ok(Expression::Aggregate {
                    func,
                    arg: None,
                    distinct: false,
                });
            }
            let distinct = self.consume(&Token::Distinct);
            let arg = self.parse_expression()?;
            self.expect(Token::RightParen)?;
            return Ok(Expression::Aggregate {
                func,
                arg: Some(Box::new(arg)),
                distinct,
            });
        }

        let args = if self.current_token() != &Token::RightParen {
            self.parse_expression_list()?
        } else {
            Vec::new()
        };
        self.expect(Token::RightParen)?;
        Ok(Expression::FunctionCall {
            name: name.to_uppercase(),
            args,
        })
    }

    fn parse_case(&mut self) -> Result<Expression> {
        self.expect(Token::Case)?;

        let operand = if self.current_token() != &Token::When {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        let mut conditions = Vec::new();
        while self.consume(&Token::When) {
            let when = self.parse_expression()?;
            self.expect(Token::Then)?;
            let then = self.parse_expression()?;
            conditions.push((when, then));
        }
        if conditions.is_empty() {
            return Err(self.error("expected WHEN"));
        }

        let else_expr = if self.consume(&Token::Else) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect(Token::End)?;

        Ok(Expression::Case {
            operand,
            conditions,
            else_expr,
        })
    }

    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut exprs = Vec::new();

        loop {
            exprs.push(self.parse_expression()?);

            if !self.consume(&Token::Comma) {
                break;
            }
        }

        Ok(exprs)
    }

    fn parse_identifier_list(&mut self, what: &str) -> Result<Vec<String>> {
        self.expect(Token::LeftParen)?;
        let mut names = vec![self.parse_identifier(what)?];
        while self.consume(&Token::Comma) {
            names.push(self.parse_identifier(what)?);
        }
        self.expect(Token::RightParen)?;
        Ok(names)
    }

    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect(Token::Insert)?;
        self.consume(&Token::Into);
        let table = self.parse_object_name()?;

        let columns = if self.current_token() == &Token::LeftParen {
            self.parse_identifier_list("a column name")?
        } else {
            Vec::new()
        };

        let source = match self.current_token() {
            Token::Values => {
                self.advance();
                let mut rows = Vec::new();
                loop {
                    self.expect(Token::LeftParen)?;
                    rows.push(self.parse_expression_list()?);
                    self.expect(Token::RightParen)?;
                    if !self.consume(&Token::Comma) {
                        break;
                    }
                }
                InsertSource::Values(rows)
            }
            Token::Select => InsertSource::Select(Box::new(self.parse_select()?)),
            _ => return Err(self.error("expected VALUES or SELECT")),
        };

        Ok(Statement::Insert(InsertStatement {
            table,
            columns,
            source,
        }))
    }

    fn parse_update(&mut self) -> Result<Statement> {
        self.expect(Token::Update)?;
        let table = self.parse_object_name()?;
        self.expect(Token::Set)?;

        let mut assignments = Vec::new();
        loop {
            let mut column = self.parse_identifier("a column name")?;
            // SET t.COL = ...
            if self.consume(&Token::Dot) {
                column = self.parse_identifier("a column name")?;
            }
            self.expect(Token::Equal)?;
            assignments.push((column, self.parse_expression()?));
            if !self.consume(&Token::Comma) {
                break;
            }
        }

        let where_clause = if self.consume(&Token::Where) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Statement::Update(UpdateStatement {
            table,
            assignments,
            where_clause,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement> {
        self.expect(Token::Delete)?;
        self.consume(&Token::From);
        let table = self.parse_object_name()?;

        let where_clause = if self.consume(&Token::Where) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Statement::Delete(DeleteStatement {
            table,
            where_clause,
        }))
    }

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect(Token::Create)?;

        match self.current_token() {
            Token::Database => {
                self.advance();
                Ok(Statement::CreateDatabase(self.parse_identifier("a database name")?))
            }
            Token::Table => {
                self.advance();
                self.parse_create_table()
            }
            _ => Err(self.error("expected TABLE or DATABASE")),
        }
    }

    fn parse_create_table(&mut self) -> Result<Statement> {
        let name = self.parse_object_name()?;
        self.expect(Token::LeftParen)?;

        let mut columns = Vec::new();
        let mut primary_key = Vec::new();

        loop {
            match self.current_token() {
                Token::Constraint => {
                    self.advance();
                    self.parse_identifier("a constraint name")?;
                    primary_key = self.parse_table_primary_key()?;
                }
                Token::Primary => primary_key = self.parse_table_primary_key()?,
                _ => columns.push(self.parse_column_definition()?),
            }

            if !self.consume(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;

        Ok(Statement::CreateTable(CreateTableStatement {
            name,
            columns,
            primary_key,
        }))
    }

    fn parse_table_primary_key(&mut self) -> Result<Vec<String>> {
        self.expect(Token::Primary)?;
        self.expect(Token::Key)?;
        self.parse_identifier_list("a column name")
    }

    /// Type name with an optional, ignored `(n)` / `(p, s)` / `(MAX)` suffix.
    fn parse_data_type(&mut self) -> Result<SqlType> {
        let type_name = match self.current_token().clone() {
            Token::Identifier(name) => name,
            _ => return Err(self.error("expected a data type")),
        };
        let data_type = SqlType::from_declared(&type_name)
            .ok_or_else(|| self.error(format!("unknown data type '{}'", type_name)))?;
        self.advance();

        if self.consume(&Token::LeftParen) {
            loop {
                match self.current_token() {
                    Token::IntegerLiteral(_) => self.advance(),
                    Token::Identifier(s) if s.eq_ignore_ascii_case("MAX") => self.advance(),
                    _ => return Err(self.error("expected a type length")),
                }
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RightParen)?;
        }

        Ok(data_type)
    }

    fn parse_column_definition(&mut self) -> Result<ColumnDefinition> {
        let name = self.parse_identifier("a column name")?;
        let data_type = self.parse_data_type()?;

        let mut column = ColumnDefinition {
            name,
            data_type,
            nullable: true,
            primary_key: false,
            identity: None,
            default: None,
        };

        loop {
            match self.current_token() {
                Token::Primary => {
                    self.advance();
                    self.expect(Token::Key)?;
                    column.primary_key = true;
                    column.nullable = false;
                }
                Token::Not => {
                    self.advance();
                    self.expect(Token::Null)?;
                    column.nullable = false;
                }
                Token::Null => {
                    self.advance();
                    column.nullable = true;
                }
                Token::Identity => {
                    self.advance();
                    let (mut seed, mut step) = (1, 1);
                    if self.consume(&Token::LeftParen) {
                        seed = self.parse_integer("an identity seed")?;
                        self.expect(Token::Comma)?;
                        step = self.parse_integer("an identity increment")?;
                        self.expect(Token::RightParen)?;
                    }
                    if step == 0 {
                        return Err(self.error("identity increment cannot be zero"));
                    }
                    column.identity = Some((seed, step));
                    column.nullable = false;
                }
                Token::Default => {
                    self.advance();
                    column.default = Some(self.parse_unary_expression()?);
                }
                Token::Constraint => {
                    self.advance();
                    self.parse_identifier("a constraint name")?;
                }
                _ => break,
            }
        }

        Ok(column)
    }

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect(Token::Drop)?;

        match self.current_token() {
            Token::Database => {
                self.advance();
                Ok(Statement::DropDatabase(self.parse_identifier("a database name")?))
            }
            Token::Table => {
                self.advance();
                let if_exists = if self.consume(&Token::If) {
                    self.expect(Token::Exists)?;
                    true
                } else {
                    false
                };
                let name = self.parse_object_name()?;
                Ok(Statement::DropTable(DropTableStatement { name, if_exists }))
            }
            _ => Err(self.error("expected TABLE or DATABASE")),
        }
    }

    fn parse_alter(&mut self) -> Result<Statement> {
        self.expect(Token::Alter)?;
        self.expect(Token::Table)?;
        let name = self.parse_object_name()?;

        let action = match self.current_token() {
            Token::Add => {
                self.advance();
                self.consume(&Token::Column);
                AlterTableAction::AddColumn(self.parse_column_definition()?)
            }
            Token::Drop => {
                self.advance();
                self.expect(Token::Column)?;
                AlterTableAction::DropColumn(self.parse_identifier("a column name")?)
            }
            _ => return Err(self.error("expected ADD or DROP COLUMN")),
        };

        Ok(Statement::AlterTable(AlterTableStatement { name, action }))
    }
}
