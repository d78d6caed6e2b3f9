// Property tests for engine invariants
use proptest::prelude::*;
use sqlsandbox::{QueryResult, SqlEngine, SqlValue};

fn count(engine: &SqlEngine, sql: &str) -> i64 {
    match engine.execute(sql).rows() {
        Some([row]) => match row.as_slice() {
            [SqlValue::Integer(n)] => *n,
            other => panic!("expected a single integer, got {:?}", other),
        },
        other => panic!("expected a single row, got {:?}", other),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn primary_key_stays_unique(ids in prop::collection::vec(0i64..20, 1..40)) {
        let engine = SqlEngine::new();
        engine.execute("CREATE TABLE T (ID INT PRIMARY KEY, N INT)");

        let mut accepted = std::collections::BTreeSet::new();
        for (n, id) in ids.iter().enumerate() {
            let result = engine.execute(&format!("INSERT INTO T VALUES ({}, {})", id, n));
            prop_assert_eq!(result.is_error(), !accepted.insert(*id));
        }

        prop_assert_eq!(count(&engine, "SELECT COUNT(*) FROM T"), accepted.len() as i64);
        prop_assert_eq!(
            count(&engine, "SELECT COUNT(DISTINCT ID) FROM T"),
            count(&engine, "SELECT COUNT(*) FROM T")
        );
    }

    #[test]
    fn inserted_values_read_back(n in -100_000i64..100_000, label in "[A-Za-z][A-Za-z ]{0,15}") {
        let engine = SqlEngine::new();
        engine.execute("CREATE TABLE T (ID INT IDENTITY(1,1) PRIMARY KEY, N INT, LABEL VARCHAR(50))");
        let insert = engine.execute(&format!("INSERT INTO T (N, LABEL) VALUES ({}, '{}')", n, label));
        prop_assert_eq!(insert, QueryResult::status("(1 row affected)", 1));

        let result = engine.execute("SELECT ID, N, LABEL FROM T");
        let expected = vec![vec![SqlValue::Integer(1), SqlValue::Integer(n), SqlValue::text(label)]];
        prop_assert_eq!(result.rows(), Some(expected.as_slice()));
    }

    #[test]
    fn seeded_tables_read_back_inserts(id in 6i64..10_000, name in "[A-Za-z][A-Za-z ]{0,15}") {
        let engine = SqlEngine::new();

        // DEPARTMENTS takes its key from the caller
        engine.execute(&format!(
            "INSERT INTO DEPARTMENTS (DEPT_ID, NAME, BUILDING) VALUES ({}, '{}', NULL)", id, name
        ));
        let department = engine.execute(&format!(
            "SELECT DEPT_ID, NAME, BUILDING FROM DEPARTMENTS WHERE DEPT_ID = {}", id
        ));
        let expected = vec![vec![SqlValue::Integer(id), SqlValue::text(name.clone()), SqlValue::Null]];
        prop_assert_eq!(department.rows(), Some(expected.as_slice()));

        // STUDENTS numbers its rows after the ten seeded students
        engine.execute(&format!(
            "INSERT INTO STUDENTS (FIRST_NAME, LAST_NAME, ENROLLMENT_YEAR) VALUES ('{}', 'Zed', 2024)", name
        ));
        let student = engine.execute("SELECT STUDENT_ID, FIRST_NAME FROM STUDENTS WHERE LAST_NAME = 'Zed'");
        let expected = vec![vec![SqlValue::Integer(11), SqlValue::text(name)]];
        prop_assert_eq!(student.rows(), Some(expected.as_slice()));
    }

    #[test]
    fn reset_restores_seed(student_cutoff in 0i64..12, order_cutoff in 1000i64..1010) {
        let engine = SqlEngine::new();
        let students = engine.execute("SELECT * FROM STUDENTS");
        let orders = engine.execute("USE ShopDB; SELECT * FROM ORDERS;");

        engine.execute(&format!(
            "USE UniversityDB; DELETE FROM STUDENTS WHERE STUDENT_ID < {}; \
             USE ShopDB; UPDATE ORDERS SET STATUS = 'Lost' WHERE ORDER_ID > {};",
            student_cutoff, order_cutoff
        ));

        engine.reset();
        prop_assert_eq!(engine.execute("SELECT * FROM STUDENTS"), students);
        prop_assert_eq!(engine.execute("USE ShopDB; SELECT * FROM ORDERS;"), orders);
    }

    #[test]
    fn order_by_does_not_change_counts(year in 2019i64..2025) {
        let engine = SqlEngine::new();
        let plain = count(&engine, &format!(
            "SELECT COUNT(*) FROM STUDENTS WHERE ENROLLMENT_YEAR >= {}", year
        ));
        let ordered = count(&engine, &format!(
            "SELECT COUNT(*) FROM STUDENTS WHERE ENROLLMENT_YEAR >= {} ORDER BY COUNT(*) DESC", year
        ));
        let listed = engine.execute(&format!(
            "SELECT STUDENT_ID FROM STUDENTS WHERE ENROLLMENT_YEAR >= {} ORDER BY LAST_NAME", year
        ));
        prop_assert_eq!(plain, ordered);
        prop_assert_eq!(plain as usize, listed.rows().map(|r| r.len()).unwrap_or(0));
    }
}
