//! Benchmarks for book compilation performance.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_possible_truncation)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use xlbook::{compile, compile_str, validate, Book, CompileOptions};

/// A book with `pages` pages of `groups` groups of `columns` columns.
///
/// Every other column is numeric with a range rule and a style; the rest
/// sum their left neighbour with a column in the first group.
fn synthetic_book(pages: usize, groups: usize, columns: usize) -> Value {
    let pages: Vec<Value> = (0..pages)
        .map(|p| {
            let groups: Vec<Value> = (0..groups)
                .map(|g| {
                    let columns: Vec<Value> = (0..columns)
                        .map(|c| {
                            let name = format!("c{c}");
                            if c % 2 == 0 {
                                json!({
                                    "name": name,
                                    "type": {
                                        "type": "numeric",
                                        "rule": { "type": "between", "low": 0, "high": 100 },
                                        "styles": [{
                                            "rule": { "type": ">", "value": 90 },
                                            "apply": "@hot"
                                        }],
                                        "format": "@decimal"
                                    }
                                })
                            } else {
                                json!({
                                    "name": name,
                                    "type": "@money",
                                    "value": {
                                        "type": "compound",
                                        "with": "+",
                                        "items": [
                                            { "type": "selector", "from": {
                                                "column": { "column": format!("c{}", c - 1) },
                                                "rows": "self"
                                            }},
                                            { "type": "selector", "from": {
                                                "column": { "group": "g0", "column": "c0" },
                                                "rows": "$0"
                                            }}
                                        ]
                                    }
                                })
                            }
                        })
                        .collect();
                    json!({ "name": format!("g{g}"), "theme": "@striped", "columns": columns })
                })
                .collect();
            json!({ "name": format!("Page {p}"), "rows": 500, "groups": groups })
        })
        .collect();

    json!({
        "name": "Synthetic",
        "theme": {
            "header": { "bold": true, "back": "@accent1+40" },
            "data": { "beneath": { "type": "dotted", "color": "@text1" } }
        },
        "definitions": {
            "colors": { "hot": "#C00000" },
            "styles": { "hot": { "fore": "#FFFFFF", "back": "@hot" } },
            "themes": { "striped": { "data": { "back": "@background2" } } },
            "types": { "money": { "type": "numeric", "format": "@currency" } }
        },
        "pages": pages
    })
}

/// Benchmark the compiler alone on a validated book
fn bench_compile(c: &mut Criterion) {
    let book: Book = validate(synthetic_book(4, 4, 10)).expect("synthetic book is valid");
    let options = CompileOptions::default();

    c.bench_function("compile_4x4x10", |b| {
        b.iter(|| compile(black_box(&book), &options))
    });
}

/// Benchmark parse, validate and compile together
fn bench_compile_str(c: &mut Criterion) {
    let source = synthetic_book(4, 4, 10).to_string();
    let options = CompileOptions::default();

    let mut group = c.benchmark_group("end_to_end");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("compile_str_4x4x10", |b| {
        b.iter(|| compile_str(black_box(&source), &options).expect("synthetic book parses"))
    });
    group.finish();
}

/// Compare compile time across book sizes
fn bench_book_sizes(c: &mut Criterion) {
    let sizes = [(1, 1, 10), (2, 4, 20), (8, 8, 40)];
    let options = CompileOptions::default();

    let mut group = c.benchmark_group("book_size_comparison");

    for (pages, groups, columns) in sizes {
        let book: Book =
            validate(synthetic_book(pages, groups, columns)).expect("synthetic book is valid");
        let total = pages * groups * columns;

        group.throughput(Throughput::Elements(total as u64));
        group.bench_with_input(
            BenchmarkId::new("compile", format!("{pages}x{groups}x{columns}")),
            &book,
            |b, book| b.iter(|| compile(black_box(book), &options)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compile, bench_compile_str, bench_book_sizes);

criterion_main!(benches);
