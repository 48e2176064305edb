use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use toon_syntax::{encode, parse, tokenize};

fn table_document(rows: usize) -> String {
    let mut out = format!("users[{rows}]{{id,name,email,active}}:\n");
    for i in 0..rows {
        out.push_str(&format!("  {i},User {i},user{i}@example.com,true\n"));
    }
    out.pop();
    out
}

fn nested_document() -> String {
    "order:\n  id: 12345\n  customer:\n    name: Alice\n    vip: true\n  tags[3]: new,paid,shipped\n  items[2]:\n    - sku: WIDGET-001\n      price: 29.99\n    - sku: GADGET-002\n      price: 49.99"
        .to_string()
}

fn table_json(rows: usize) -> String {
    let users: Vec<serde_json::Value> = (0..rows)
        .map(|i| {
            serde_json::json!({
                "id": i,
                "name": format!("User {i}"),
                "email": format!("user{i}@example.com"),
                "active": true,
            })
        })
        .collect();
    serde_json::json!({ "users": users }).to_string()
}

fn benchmark_tokenize(c: &mut Criterion) {
    let simple = "name: Alice\nage: 30\nactive: true";
    let nested = nested_document();

    let mut group = c.benchmark_group("tokenize");
    group.bench_function("simple", |b| b.iter(|| tokenize(black_box(simple))));
    group.bench_function("nested", |b| b.iter(|| tokenize(black_box(&nested))));
    group.finish();
}

fn benchmark_parse_simple(c: &mut Criterion) {
    let source = "name: Alice\nage: 30\nactive: true\ntags[3]: a,b,c";
    c.bench_function("parse_simple", |b| b.iter(|| parse(black_box(source))));
}

fn benchmark_parse_nested(c: &mut Criterion) {
    let source = nested_document();
    c.bench_function("parse_nested", |b| b.iter(|| parse(black_box(&source))));
}

fn benchmark_parse_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_table");
    for size in [10, 100, 1000].iter() {
        let source = table_document(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| parse(black_box(source)))
        });
    }
    group.finish();
}

fn benchmark_parse_malformed(c: &mut Criterion) {
    // Recovery paths are the hot spot in editor use; keep them fast too.
    let mut source = String::new();
    for i in 0..100 {
        if i % 3 == 0 {
            source.push_str(&format!("broken line {i}\n"));
        } else {
            source.push_str(&format!("key{i}: value {i}\n"));
        }
    }
    c.bench_function("parse_malformed", |b| b.iter(|| parse(black_box(&source))));
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for size in [10, 100, 1000].iter() {
        let json = table_json(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &json, |b, json| {
            b.iter(|| encode(black_box(json)))
        });
    }
    group.finish();
}

fn benchmark_encode_vs_json_size(c: &mut Criterion) {
    let json = table_json(100);
    c.bench_function("encode_table_100", |b| b.iter(|| encode(black_box(&json))));
}

criterion_group!(
    benches,
    benchmark_tokenize,
    benchmark_parse_simple,
    benchmark_parse_nested,
    benchmark_parse_table,
    benchmark_parse_malformed,
    benchmark_encode,
    benchmark_encode_vs_json_size
);
criterion_main!(benches);
