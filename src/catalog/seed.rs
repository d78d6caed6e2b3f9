//! Fixed seed content for the three databases. Every value is a literal so
//! that each reset produces identical data; lesson exercises and quizzes
//! depend on exact query outputs.

use super::table::{Column, ColumnDefault, Row, Table};
use super::Database;
use crate::sql::types::{SqlType, SqlValue};
use chrono::NaiveDate;

pub const UNIVERSITY_DB: &str = "UniversityDB";
pub const SHOP_DB: &str = "ShopDB";
pub const LIBRARY_DB: &str = "LibraryDB";

/// Database selected when a session starts or is reset.
pub const DEFAULT_DATABASE: &str = UNIVERSITY_DB;

pub const SEEDED_DATABASES: [&str; 3] = [UNIVERSITY_DB, SHOP_DB, LIBRARY_DB];

const NULL: SqlValue = SqlValue::Null;

fn int(v: i64) -> SqlValue {
    SqlValue::Integer(v)
}

fn dec(v: f64) -> SqlValue {
    SqlValue::Decimal(v)
}

fn text(v: &str) -> SqlValue {
    SqlValue::text(v)
}

fn flag(v: bool) -> SqlValue {
    SqlValue::Boolean(v)
}

fn date(y: i32, m: u32, d: u32) -> SqlValue {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(SqlValue::DateTime)
        .unwrap_or(SqlValue::Null)
}

/// Build a table from trusted seed parts, advancing any identity counter
/// past the highest seeded value.
fn seed_table(name: &str, mut columns: Vec<Column>, rows: Vec<Row>) -> Table {
    for (index, column) in columns.iter_mut().enumerate() {
        if let Some(identity) = column.identity.as_mut() {
            let max = rows
                .iter()
                .filter_map(|row| match row.get(index) {
                    Some(SqlValue::Integer(v)) => Some(*v),
                    _ => None,
                })
                .max();
            if let Some(max) = max {
                identity.next = max + identity.step;
            }
        }
    }
    Table::from_seed(name, columns, rows)
}

fn database(name: &str, tables: Vec<Table>) -> Database {
    let mut database = Database::new(name);
    for table in tables {
        database.push_table(table);
    }
    database
}

pub fn seed_databases() -> Vec<Database> {
    vec![university(), shop(), library()]
}

fn university() -> Database {
    let departments = seed_table(
        "DEPARTMENTS",
        vec![
            Column::new("DEPT_ID", SqlType::Integer).primary_key(),
            Column::new("NAME", SqlType::Text).not_null(),
            Column::new("BUILDING", SqlType::Text),
            Column::new("BUDGET", SqlType::Decimal),
        ],
        vec![
            vec![int(1), text("Computer Science"), text("Turing Hall"), dec(1250000.0)],
            vec![int(2), text("Mathematics"), text("Euler Building"), dec(830000.0)],
            vec![int(3), text("Physics"), text("Curie Lab"), dec(970000.0)],
            vec![int(4), text("History"), text("Gibbon House"), dec(410000.0)],
            vec![int(5), text("Biology"), text("Darwin Center"), dec(760000.0)],
        ],
    );

    let students = seed_table(
        "STUDENTS",
        vec![
            Column::new("STUDENT_ID", SqlType::Integer).primary_key().identity(1, 1),
            Column::new("FIRST_NAME", SqlType::Text).not_null(),
            Column::new("LAST_NAME", SqlType::Text).not_null(),
            Column::new("EMAIL", SqlType::Text),
            Column::new("DEPT_ID", SqlType::Integer),
            Column::new("GPA", SqlType::Decimal),
            Column::new("ENROLLMENT_YEAR", SqlType::Integer).not_null(),
            Column::new("DATE_OF_BIRTH", SqlType::DateTime),
        ],
        vec![
            vec![int(1), text("Alice"), text("Johnson"), text("alice.johnson@uni.edu"), int(1), dec(3.8), int(2021), date(2003, 4, 12)],
            vec![int(2), text("Brian"), text("Smith"), text("brian.smith@uni.edu"), int(2), dec(3.2), int(2022), date(2004, 9, 30)],
            vec![int(3), text("Chloe"), text("Nguyen"), text("chloe.nguyen@uni.edu"), int(1), dec(3.95), int(2020), date(2002, 1, 18)],
            vec![int(4), text("David"), text("Garcia"), text("david.garcia@uni.edu"), int(3), dec(2.75), int(2023), date(2005, 6, 5)],
            vec![int(5), text("Emma"), text("Brown"), text("emma.brown@uni.edu"), int(4), dec(3.5), int(2021), date(2003, 11, 22)],
            vec![int(6), text("Farid"), text("Haddad"), NULL, int(1), dec(2.9), int(2022), date(2004, 2, 14)],
            vec![int(7), text("Grace"), text("Lee"), text("grace.lee@uni.edu"), int(5), dec(3.65), int(2023), date(2005, 8, 9)],
            vec![int(8), text("Henry"), text("Wilson"), text("henry.wilson@uni.edu"), NULL, dec(3.1), int(2020), date(2002, 7, 27)],
            vec![int(9), text("Isabel"), text("Rossi"), text("isabel.rossi@uni.edu"), int(2), dec(3.4), int(2022), date(2004, 3, 3)],
            vec![int(10), text("Jack"), text("Murphy"), text("jack.murphy@uni.edu"), int(3), dec(2.45), int(2021), date(2003, 12, 19)],
        ],
    );

    let courses = seed_table(
        "COURSES",
        vec![
            Column::new("COURSE_ID", SqlType::Integer).primary_key(),
            Column::new("CODE", SqlType::Text).not_null(),
            Column::new("TITLE", SqlType::Text).not_null(),
            Column::new("CREDITS", SqlType::Integer).not_null(),
            Column::new("DEPT_ID", SqlType::Integer),
        ],
        vec![
            vec![int(101), text("CS101"), text("Introduction to Programming"), int(4), int(1)],
            vec![int(102), text("CS201"), text("Data Structures"), int(4), int(1)],
            vec![int(103), text("CS305"), text("Database Systems"), int(3), int(1)],
            vec![int(201), text("MATH101"), text("Calculus I"), int(4), int(2)],
            vec![int(202), text("MATH220"), text("Linear Algebra"), int(3), int(2)],
            vec![int(301), text("PHYS101"), text("Classical Mechanics"), int(4), int(3)],
            vec![int(401), text("HIST110"), text("World History"), int(3), int(4)],
        ],
    );

    let enrollments = seed_table(
        "ENROLLMENTS",
        vec![
            Column::new("ENROLLMENT_ID", SqlType::Integer).primary_key().identity(1, 1),
            Column::new("STUDENT_ID", SqlType::Integer).not_null(),
            Column::new("COURSE_ID", SqlType::Integer).not_null(),
            Column::new("ENROLLED_ON", SqlType::DateTime),
            Column::new("GRADE", SqlType::Text),
        ],
        vec![
            vec![int(1), int(1), int(101), date(2021, 9, 1), text("A")],
            vec![int(2), int(1), int(102), date(2022, 1, 15), text("A")],
            vec![int(3), int(1), int(103), date(2022, 9, 1), text("B")],
            vec![int(4), int(2), int(201), date(2022, 9, 1), text("B")],
            vec![int(5), int(2), int(202), date(2023, 1, 16), text("C")],
            vec![int(6), int(3), int(101), date(2020, 9, 1), text("A")],
            vec![int(7), int(3), int(103), date(2021, 9, 1), text("A")],
            vec![int(8), int(4), int(301), date(2023, 9, 1), NULL],
            vec![int(9), int(5), int(401), date(2021, 9, 1), text("B")],
            vec![int(10), int(6), int(101), date(2022, 9, 1), text("C")],
            vec![int(11), int(6), int(201), date(2022, 9, 1), text("B")],
            vec![int(12), int(8), int(301), date(2020, 9, 1), text("B")],
            vec![int(13), int(9), int(202), date(2022, 9, 1), text("A")],
            vec![int(14), int(10), int(301), date(2021, 9, 1), text("D")],
            vec![int(15), int(3), int(202), date(2021, 1, 15), text("A")],
        ],
    );

    database(UNIVERSITY_DB, vec![departments, students, courses, enrollments])
}

fn shop() -> Database {
    let customers = seed_table(
        "CUSTOMERS",
        vec![
            Column::new("CUSTOMER_ID", SqlType::Integer).primary_key().identity(1, 1),
            Column::new("NAME", SqlType::Text).not_null(),
            Column::new("EMAIL", SqlType::Text),
            Column::new("CITY", SqlType::Text),
            Column::new("COUNTRY", SqlType::Text),
            Column::new("JOINED_ON", SqlType::DateTime),
        ],
        vec![
            vec![int(1), text("Olivia Martin"), text("olivia@example.com"), text("Seattle"), text("USA"), date(2022, 3, 14)],
            vec![int(2), text("Lucas Meyer"), text("lucas@example.com"), text("Berlin"), text("Germany"), date(2021, 11, 2)],
            vec![int(3), text("Sofia Costa"), text("sofia@example.com"), text("Lisbon"), text("Portugal"), date(2023, 1, 20)],
            vec![int(4), text("Noah Tanaka"), text("noah@example.com"), text("Osaka"), text("Japan"), date(2022, 7, 8)],
            vec![int(5), text("Mia Dubois"), text("mia@example.com"), text("Lyon"), text("France"), date(2023, 5, 30)],
            vec![int(6), text("Ethan Clark"), NULL, text("Toronto"), text("Canada"), date(2024, 2, 11)],
        ],
    );

    let products = seed_table(
        "PRODUCTS",
        vec![
            Column::new("PRODUCT_ID", SqlType::Integer).primary_key().identity(1, 1),
            Column::new("NAME", SqlType::Text).not_null(),
            Column::new("CATEGORY", SqlType::Text),
            Column::new("PRICE", SqlType::Decimal).not_null(),
            Column::new("STOCK", SqlType::Integer).not_null(),
            Column::new("DISCONTINUED", SqlType::Boolean)
                .not_null()
                .with_default(ColumnDefault::Value(flag(false))),
        ],
        vec![
            vec![int(1), text("Wireless Mouse"), text("Electronics"), dec(24.99), int(150), flag(false)],
            vec![int(2), text("Mechanical Keyboard"), text("Electronics"), dec(89.5), int(60), flag(false)],
            vec![int(3), text("USB-C Hub"), text("Electronics"), dec(39.0), int(0), flag(false)],
            vec![int(4), text("Coffee Mug"), text("Kitchen"), dec(12.0), int(300), flag(false)],
            vec![int(5), text("French Press"), text("Kitchen"), dec(34.95), int(45), flag(false)],
            vec![int(6), text("Notebook A5"), text("Stationery"), dec(6.5), int(500), flag(false)],
            vec![int(7), text("Fountain Pen"), text("Stationery"), dec(58.0), int(25), flag(true)],
            vec![int(8), text("Desk Lamp"), text("Home"), dec(45.0), int(80), flag(false)],
        ],
    );

    let orders = seed_table(
        "ORDERS",
        vec![
            Column::new("ORDER_ID", SqlType::Integer).primary_key().identity(1001, 1),
            Column::new("CUSTOMER_ID", SqlType::Integer).not_null(),
            Column::new("ORDER_DATE", SqlType::DateTime).not_null(),
            Column::new("STATUS", SqlType::Text).not_null(),
            Column::new("TOTAL", SqlType::Decimal),
        ],
        vec![
            vec![int(1001), int(1), date(2024, 1, 5), text("Delivered"), dec(114.49)],
            vec![int(1002), int(2), date(2024, 1, 18), text("Delivered"), dec(46.95)],
            vec![int(1003), int(1), date(2024, 2, 2), text("Shipped"), dec(45.0)],
            vec![int(1004), int(3), date(2024, 2, 14), text("Delivered"), dec(89.5)],
            vec![int(1005), int(4), date(2024, 3, 1), text("Cancelled"), dec(58.0)],
            vec![int(1006), int(5), date(2024, 3, 9), text("Processing"), dec(58.95)],
            vec![int(1007), int(2), date(2024, 3, 22), text("Shipped"), dec(13.0)],
            vec![int(1008), int(4), date(2024, 4, 2), text("Delivered"), dec(24.99)],
        ],
    );

    let order_items = Table::from_seed(
        "ORDER_ITEMS",
        vec![
            Column::new("ORDER_ID", SqlType::Integer).primary_key(),
            Column::new("PRODUCT_ID", SqlType::Integer).primary_key(),
            Column::new("QUANTITY", SqlType::Integer).not_null(),
            Column::new("UNIT_PRICE", SqlType::Decimal).not_null(),
        ],
        vec![
            vec![int(1001), int(1), int(1), dec(24.99)],
            vec![int(1001), int(2), int(1), dec(89.5)],
            vec![int(1002), int(4), int(1), dec(12.0)],
            vec![int(1002), int(5), int(1), dec(34.95)],
            vec![int(1003), int(8), int(1), dec(45.0)],
            vec![int(1004), int(2), int(1), dec(89.5)],
            vec![int(1005), int(7), int(1), dec(58.0)],
            vec![int(1006), int(5), int(1), dec(34.95)],
            vec![int(1006), int(4), int(2), dec(12.0)],
            vec![int(1007), int(6), int(2), dec(6.5)],
            vec![int(1008), int(1), int(1), dec(24.99)],
        ],
    );

    database(SHOP_DB, vec![customers, products, orders, order_items])
}

fn library() -> Database {
    let authors = seed_table(
        "AUTHORS",
        vec![
            Column::new("AUTHOR_ID", SqlType::Integer).primary_key(),
            Column::new("NAME", SqlType::Text).not_null(),
            Column::new("COUNTRY", SqlType::Text),
            Column::new("BIRTH_YEAR", SqlType::Integer),
        ],
        vec![
            vec![int(1), text("Jane Austen"), text("United Kingdom"), int(1775)],
            vec![int(2), text("George Orwell"), text("United Kingdom"), int(1903)],
            vec![int(3), text("Gabriel Garcia Marquez"), text("Colombia"), int(1927)],
            vec![int(4), text("Toni Morrison"), text("USA"), int(1931)],
            vec![int(5), text("Haruki Murakami"), text("Japan"), int(1949)],
            vec![int(6), text("Chinua Achebe"), text("Nigeria"), int(1930)],
        ],
    );

    let books = seed_table(
        "BOOKS",
        vec![
            Column::new("BOOK_ID", SqlType::Integer).primary_key().identity(1, 1),
            Column::new("TITLE", SqlType::Text).not_null(),
            Column::new("AUTHOR_ID", SqlType::Integer),
            Column::new("GENRE", SqlType::Text),
            Column::new("PUBLISHED_YEAR", SqlType::Integer),
            Column::new("ISBN", SqlType::Text),
            Column::new("AVAILABLE", SqlType::Boolean)
                .not_null()
                .with_default(ColumnDefault::Value(flag(true))),
        ],
        vec![
            vec![int(1), text("Pride and Prejudice"), int(1), text("Romance"), int(1813), text("978-0141439518"), flag(true)],
            vec![int(2), text("Emma"), int(1), text("Romance"), int(1815), text("978-0141439587"), flag(true)],
            vec![int(3), text("Nineteen Eighty-Four"), int(2), text("Dystopian"), int(1949), text("978-0451524935"), flag(false)],
            vec![int(4), text("Animal Farm"), int(2), text("Satire"), int(1945), text("978-0451526342"), flag(true)],
            vec![int(5), text("One Hundred Years of Solitude"), int(3), text("Magical Realism"), int(1967), text("978-0060883287"), flag(false)],
            vec![int(6), text("Beloved"), int(4), text("Historical Fiction"), int(1987), text("978-1400033416"), flag(true)],
            vec![int(7), text("Norwegian Wood"), int(5), text("Literary Fiction"), int(1987), text("978-0375704024"), flag(false)],
            vec![int(8), text("Kafka on the Shore"), int(5), text("Magical Realism"), int(2002), text("978-1400079278"), flag(true)],
        ],
    );

    let members = seed_table(
        "MEMBERS",
        vec![
            Column::new("MEMBER_ID", SqlType::Integer).primary_key().identity(1, 1),
            Column::new("NAME", SqlType::Text).not_null(),
            Column::new("EMAIL", SqlType::Text),
            Column::new("JOINED_ON", SqlType::DateTime).not_null(),
        ],
        vec![
            vec![int(1), text("Liam Patel"), text("liam.patel@mail.com"), date(2021, 2, 10)],
            vec![int(2), text("Ava Kowalski"), text("ava.k@mail.com"), date(2022, 6, 1)],
            vec![int(3), text("Mateo Silva"), NULL, date(2023, 3, 15)],
            vec![int(4), text("Zoe Chen"), text("zoe.chen@mail.com"), date(2023, 9, 27)],
            vec![int(5), text("Omar Farouk"), text("omar.f@mail.com"), date(2024, 1, 8)],
        ],
    );

    let loans = seed_table(
        "LOANS",
        vec![
            Column::new("LOAN_ID", SqlType::Integer).primary_key().identity(1, 1),
            Column::new("BOOK_ID", SqlType::Integer).not_null(),
            Column::new("MEMBER_ID", SqlType::Integer).not_null(),
            Column::new("LOAN_DATE", SqlType::DateTime).not_null(),
            Column::new("DUE_DATE", SqlType::DateTime).not_null(),
            Column::new("RETURN_DATE", SqlType::DateTime),
        ],
        vec![
            vec![int(1), int(3), int(1), date(2024, 1, 10), date(2024, 1, 31), date(2024, 1, 28)],
            vec![int(2), int(5), int(2), date(2024, 2, 1), date(2024, 2, 22), NULL],
            vec![int(3), int(1), int(3), date(2024, 2, 5), date(2024, 2, 26), date(2024, 2, 20)],
            vec![int(4), int(7), int(1), date(2024, 3, 1), date(2024, 3, 22), NULL],
            vec![int(5), int(3), int(4), date(2024, 3, 3), date(2024, 3, 24), NULL],
            vec![int(6), int(6), int(2), date(2024, 3, 10), date(2024, 3, 31), date(2024, 3, 29)],
            vec![int(7), int(8), int(5), date(2024, 3, 15), date(2024, 4, 5), date(2024, 4, 1)],
            vec![int(8), int(4), int(4), date(2024, 3, 20), date(2024, 4, 10), date(2024, 4, 8)],
        ],
    );

    database(LIBRARY_DB, vec![authors, books, members, loans])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    #[test]
    fn test_seed_rows_match_their_columns() {
        for database in seed_databases() {
            for table in database.tables() {
                for row in &table.rows {
                    assert_eq!(row.len(), table.columns.len(), "{}.{}", database.name, table.name);
                    for (value, column) in row.iter().zip(&table.columns) {
                        if value.is_null() {
                            assert!(column.nullable, "{}.{}", table.name, column.name);
                        } else {
                            assert_eq!(value.sql_type(), Some(column.data_type));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_seed_primary_keys_are_unique() {
        for database in seed_databases() {
            for table in database.tables() {
                let key_columns = table.primary_key_columns();
                assert!(!key_columns.is_empty(), "{} has no key", table.name);
                let mut seen = AHashSet::new();
                for row in &table.rows {
                    let key: Vec<_> = key_columns.iter().map(|&i| row[i].group_key()).collect();
                    assert!(seen.insert(key), "duplicate key in {}", table.name);
                }
            }
        }
    }

    #[test]
    fn test_identity_continues_after_seed() {
        let shop = shop();
        let orders = shop.table("ORDERS").unwrap();
        assert_eq!(orders.columns[0].identity.as_ref().unwrap().next, 1009);
    }

    #[test]
    fn test_seed_is_deterministic() {
        assert_eq!(seed_databases(), seed_databases());
    }
}
