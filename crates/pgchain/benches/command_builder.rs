use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgchain::{Command, Value, command, render_debug, translate_placeholders};

/// SELECT col0, col1, ... FROM t WHERE col0 = ? AND col1 = ? ...
fn build_select(n: usize) -> Command {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let predicate = (0..n)
        .map(|i| format!("col{i} = ?"))
        .collect::<Vec<_>>()
        .join(" AND ");
    command()
        .select(columns)
        .from(["t"])
        .where_(&predicate, (0..n as i64).map(Value::from))
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_builder/build");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n)));
        });
    }

    group.finish();
}

fn bench_to_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_builder/to_sql");

    for n in [1, 5, 10, 50, 100] {
        let cmd = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &cmd, |b, cmd| {
            b.iter(|| black_box(cmd.to_sql()));
        });
    }

    group.finish();
}

fn bench_pp(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_builder/pp");

    for n in [1, 5, 10, 50, 100] {
        let cmd = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &cmd, |b, cmd| {
            b.iter(|| black_box(cmd.pp()));
        });
    }

    group.finish();
}

fn bench_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_builder/values");

    for n in [10, 100, 1000] {
        let rows: Vec<Vec<Value>> = (0..n)
            .map(|i| vec![Value::from(format!("name{i}")), Value::from(i), Value::Null])
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &rows, |b, rows| {
            b.iter(|| {
                let cmd = command()
                    .insert(["name", "age", "email"])
                    .into("actor")
                    .values(rows.iter().cloned());
                black_box(cmd);
            });
        });
    }

    group.finish();
}

fn bench_placeholders(c: &mut Criterion) {
    let sql = vec!["col = ?"; 200].join(" AND ");
    let args: Vec<Value> = (0..200).map(Value::from).collect();

    c.bench_function("placeholder/translate_200", |b| {
        b.iter(|| black_box(translate_placeholders(black_box(&sql))));
    });
    c.bench_function("placeholder/render_debug_200", |b| {
        b.iter(|| black_box(render_debug(black_box(&sql), black_box(&args))));
    });
}

criterion_group!(
    benches,
    bench_build,
    bench_to_sql,
    bench_pp,
    bench_values,
    bench_placeholders
);
criterion_main!(benches);
