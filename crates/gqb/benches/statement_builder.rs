//! Benchmarks for statement rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gqb::{Builder, Comparison, Data, Dialect, ExecResult, Executor, GqbResult, Mode, Rows, SortMode, Value};

struct NoopExecutor;

impl Executor for NoopExecutor {
    async fn query(&self, _sql: &str, _binds: &[Value]) -> GqbResult<Rows> {
        Ok(Rows::default())
    }

    async fn exec(&self, _sql: &str, _binds: &[Value]) -> GqbResult<ExecResult> {
        Ok(ExecResult::default())
    }
}

fn bench_simple_select(c: &mut Criterion) {
    c.bench_function("select_simple", |b| {
        b.iter(|| {
            let mut qb = Builder::new(NoopExecutor);
            qb.where_("id", black_box(1), Comparison::Equal);
            black_box(qb.build(Mode::Select, "users", None).unwrap())
        })
    });
}

fn bench_nested_select(c: &mut Criterion) {
    c.bench_function("select_nested_groups", |b| {
        b.iter(|| {
            let mut qb = Builder::with_dialect(NoopExecutor, Dialect::Postgres);
            qb.select(["id", "name", "email"])
                .join("teams", "team_id", "id", Comparison::Equal)
                .where_("status", black_box("active"), Comparison::Equal)
                .where_group(|g| {
                    g.where_("age", 18, Comparison::GreaterOrEqual)
                        .where_in("role", ["admin", "owner", "member"]);
                })
                .or_where_group(|g| {
                    g.like("name", "J%").where_("verified", true, Comparison::Equal);
                })
                .order_by("created_at", SortMode::Desc)
                .limit(20)
                .offset(40);
            black_box(qb.build(Mode::Select, "users", None).unwrap())
        })
    });
}

fn bench_in_list(c: &mut Criterion) {
    let ids: Vec<i64> = (0..100).collect();
    c.bench_function("select_in_100", |b| {
        b.iter(|| {
            let mut qb = Builder::with_dialect(NoopExecutor, Dialect::Postgres);
            qb.where_in("id", ids.iter().copied());
            black_box(qb.build(Mode::Select, "users", None).unwrap())
        })
    });
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("insert_10_columns", |b| {
        b.iter(|| {
            let data: Data = (0..10).map(|i| (format!("col_{i}"), i)).collect();
            let qb = Builder::new(NoopExecutor);
            black_box(qb.build(Mode::Insert, "users", Some(&data)).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_simple_select,
    bench_nested_select,
    bench_in_list,
    bench_insert
);
criterion_main!(benches);
