use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sqlsandbox::sql::parser::parse_sql;
use sqlsandbox::SqlEngine;

const JOIN_QUERY: &str = "SELECT s.FIRST_NAME, c.TITLE, e.GRADE FROM ENROLLMENTS e \
    JOIN STUDENTS s ON s.STUDENT_ID = e.STUDENT_ID \
    JOIN COURSES c ON c.COURSE_ID = e.COURSE_ID \
    WHERE c.CREDITS >= 3 ORDER BY s.LAST_NAME, c.CODE";

const AGGREGATE_QUERY: &str = "SELECT d.NAME, COUNT(*) AS N, AVG(s.GPA) AS AVG_GPA \
    FROM STUDENTS s LEFT JOIN DEPARTMENTS d ON d.DEPT_ID = s.DEPT_ID \
    GROUP BY d.NAME HAVING COUNT(*) > 1 ORDER BY AVG_GPA DESC";

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, sql) in [("join", JOIN_QUERY), ("aggregate", AGGREGATE_QUERY)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), sql, |b, sql| {
            b.iter(|| black_box(parse_sql(sql).unwrap()));
        });
    }
    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let engine = SqlEngine::new();

    group.bench_function("three_way_join", |b| {
        b.iter(|| black_box(engine.execute(JOIN_QUERY)));
    });
    group.bench_function("grouped_aggregate", |b| {
        b.iter(|| black_box(engine.execute(AGGREGATE_QUERY)));
    });
    group.bench_function("like_filter", |b| {
        b.iter(|| black_box(engine.execute("SELECT * FROM STUDENTS WHERE EMAIL LIKE '%@uni.edu'")));
    });
    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [10, 100, 1000].iter() {
        let batch: String = (0..*size)
            .map(|i| format!("INSERT INTO T (V) VALUES ({});", i))
            .collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| {
                let engine = SqlEngine::new();
                engine.execute("CREATE TABLE T (ID INT IDENTITY(1,1) PRIMARY KEY, V INT)");
                black_box(engine.execute(batch))
            });
        });
    }
    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    let engine = SqlEngine::new();
    c.bench_function("reset", |b| {
        b.iter(|| black_box(engine.reset()));
    });
}

criterion_group!(benches, bench_parse, bench_select, bench_insert, bench_reset);
criterion_main!(benches);
