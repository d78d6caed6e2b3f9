// Integration tests for SQL JOIN operations
use sqlsandbox::error::Result as SandboxResult;
use sqlsandbox::sql::ast::*;
use sqlsandbox::sql::parser::Parser;
use sqlsandbox::{QueryResult, SqlEngine, SqlValue};

fn rows(result: &QueryResult) -> &[Vec<SqlValue>] {
    match result.rows() {
        Some(rows) => rows,
        None => panic!("expected rows, got {:?}", result),
    }
}

fn text(s: &str) -> SqlValue {
    SqlValue::text(s)
}

#[test]
fn test_parse_inner_join() -> SandboxResult<()> {
    let sql = "SELECT * FROM STUDENTS INNER JOIN DEPARTMENTS ON STUDENTS.DEPT_ID = DEPARTMENTS.DEPT_ID";
    let mut parser = Parser::new(sql)?;
    let statement = parser.parse()?;

    match statement {
        Statement::Select(select) => {
            assert_eq!(select.joins.len(), 1);
            assert_eq!(select.joins[0].join_type, JoinType::Inner);
            assert_eq!(select.joins[0].table.name, "DEPARTMENTS");
        }
        _ => panic!("Expected SELECT statement"),
    }

    Ok(())
}

#[test]
fn test_parse_outer_join_spellings() -> SandboxResult<()> {
    let cases = [
        ("LEFT JOIN", JoinType::Left),
        ("LEFT OUTER JOIN", JoinType::Left),
        ("RIGHT JOIN", JoinType::Right),
        ("FULL OUTER JOIN", JoinType::Full),
        ("JOIN", JoinType::Inner),
    ];

    for (keyword, expected) in cases {
        let sql = format!("SELECT * FROM A {} B ON A.ID = B.ID", keyword);
        match Parser::new(&sql)?.parse()? {
            Statement::Select(select) => assert_eq!(select.joins[0].join_type, expected, "{}", keyword),
            _ => panic!("Expected SELECT statement"),
        }
    }

    Ok(())
}

#[test]
fn test_parse_multiple_joins_with_aliases() -> SandboxResult<()> {
    let sql = "SELECT * FROM ENROLLMENTS e
               INNER JOIN STUDENTS s ON s.STUDENT_ID = e.STUDENT_ID
               LEFT JOIN COURSES AS c ON c.COURSE_ID = e.COURSE_ID
               WHERE c.CREDITS > 3";
    let mut parser = Parser::new(sql)?;
    let statement = parser.parse()?;

    match statement {
        Statement::Select(select) => {
            assert_eq!(select.from.as_ref().unwrap().alias, Some("e".to_string()));
            assert_eq!(select.joins.len(), 2);
            assert_eq!(select.joins[0].table.alias, Some("s".to_string()));
            assert_eq!(select.joins[1].join_type, JoinType::Left);
            assert_eq!(select.joins[1].table.qualifier(), "c");
            assert!(select.where_clause.is_some());
        }
        _ => panic!("Expected SELECT statement"),
    }

    Ok(())
}

#[test]
fn test_parse_cross_join_has_no_condition() -> SandboxResult<()> {
    match Parser::new("SELECT * FROM A CROSS JOIN B")?.parse()? {
        Statement::Select(select) => {
            assert_eq!(select.joins[0].join_type, JoinType::Cross);
            assert!(select.joins[0].condition.is_none());
        }
        _ => panic!("Expected SELECT statement"),
    }
    Ok(())
}

#[test]
fn test_join_without_on_is_a_syntax_error() {
    let engine = SqlEngine::new();
    let result = engine.execute("SELECT * FROM STUDENTS JOIN DEPARTMENTS");
    assert!(result.error().unwrap().starts_with("Incorrect syntax near"));
}

#[test]
fn test_inner_join_drops_unmatched_rows() {
    let engine = SqlEngine::new();
    let result = engine.execute(
        "SELECT s.FIRST_NAME, d.NAME FROM STUDENTS s \
         INNER JOIN DEPARTMENTS d ON s.DEPT_ID = d.DEPT_ID",
    );
    // Henry has no department
    assert_eq!(rows(&result).len(), 9);
    assert!(rows(&result).iter().all(|r| r[0] != text("Henry")));
}

#[test]
fn test_left_join_pads_with_nulls() {
    let engine = SqlEngine::new();
    let result = engine.execute(
        "SELECT s.FIRST_NAME, d.NAME AS DEPT FROM STUDENTS s \
         LEFT JOIN DEPARTMENTS d ON s.DEPT_ID = d.DEPT_ID \
         WHERE d.NAME IS NULL",
    );
    assert_eq!(result.columns().unwrap(), &["FIRST_NAME".to_string(), "DEPT".to_string()]);
    assert_eq!(rows(&result), &[vec![text("Henry"), SqlValue::Null]]);
}

#[test]
fn test_right_and_full_join() {
    let engine = SqlEngine::new();

    let right = engine.execute(
        "SELECT c.CODE, d.NAME FROM COURSES c \
         RIGHT JOIN DEPARTMENTS d ON c.DEPT_ID = d.DEPT_ID",
    );
    assert_eq!(rows(&right).len(), 8);
    assert!(rows(&right).contains(&vec![SqlValue::Null, text("Biology")]));

    let full = engine.execute(
        "SELECT s.STUDENT_ID, d.DEPT_ID FROM STUDENTS s \
         FULL OUTER JOIN DEPARTMENTS d ON s.DEPT_ID = d.DEPT_ID",
    );
    // every department has a student, and Henry appears once with no department
    assert_eq!(rows(&full).len(), 10);
}

#[test]
fn test_cross_join_is_cartesian() {
    let engine = SqlEngine::new();
    let result = engine.execute("SELECT COUNT(*) FROM DEPARTMENTS CROSS JOIN COURSES");
    assert_eq!(rows(&result), &[vec![SqlValue::Integer(35)]]);
}

#[test]
fn test_three_way_join_with_filter_and_order() {
    let engine = SqlEngine::new();
    let result = engine.execute(
        "SELECT s.FIRST_NAME, e.GRADE FROM ENROLLMENTS e \
         JOIN STUDENTS s ON s.STUDENT_ID = e.STUDENT_ID \
         JOIN COURSES c ON c.COURSE_ID = e.COURSE_ID \
         WHERE c.CODE = 'CS101' \
         ORDER BY s.FIRST_NAME",
    );
    assert_eq!(
        rows(&result),
        &[
            vec![text("Alice"), text("A")],
            vec![text("Chloe"), text("A")],
            vec![text("Farid"), text("C")],
        ]
    );
}

#[test]
fn test_grouped_join() {
    let engine = SqlEngine::new();
    let result = engine.execute(
        "SELECT d.NAME, COUNT(*) AS N FROM DEPARTMENTS d \
         JOIN STUDENTS s ON s.DEPT_ID = d.DEPT_ID \
         GROUP BY d.NAME \
         ORDER BY N DESC, d.NAME",
    );
    assert_eq!(
        rows(&result),
        &[
            vec![text("Computer Science"), SqlValue::Integer(3)],
            vec![text("Mathematics"), SqlValue::Integer(2)],
            vec![text("Physics"), SqlValue::Integer(2)],
            vec![text("Biology"), SqlValue::Integer(1)],
            vec![text("History"), SqlValue::Integer(1)],
        ]
    );
}

#[test]
fn test_unqualified_shared_column_is_ambiguous() {
    let engine = SqlEngine::new();
    let result = engine.execute(
        "SELECT DEPT_ID FROM STUDENTS JOIN DEPARTMENTS ON STUDENTS.DEPT_ID = DEPARTMENTS.DEPT_ID",
    );
    assert_eq!(result.error(), Some("Ambiguous column name 'DEPT_ID'."));
}

#[test]
fn test_qualified_wildcard_over_join() {
    let engine = SqlEngine::new();
    let result = engine.execute(
        "USE ShopDB; SELECT o.* FROM ORDERS o JOIN CUSTOMERS c ON c.CUSTOMER_ID = o.CUSTOMER_ID \
         WHERE c.CITY = 'Seattle' ORDER BY o.ORDER_ID",
    );
    assert_eq!(
        result.columns().unwrap(),
        &["ORDER_ID", "CUSTOMER_ID", "ORDER_DATE", "STATUS", "TOTAL"]
    );
    let ids: Vec<&SqlValue> = rows(&result).iter().map(|r| &r[0]).collect();
    assert_eq!(ids, vec![&SqlValue::Integer(1001), &SqlValue::Integer(1003)]);
}
