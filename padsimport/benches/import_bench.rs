use criterion::{black_box, criterion_group, criterion_main, Criterion};
use padsimport::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn bench_import_file(c: &mut Criterion) {
    let options = ImportOptions::default();

    c.bench_function("import_file", |b| {
        b.iter(|| {
            PadsImportCore::import_file(
                black_box(&fixture_path("multi_sheet.txt")),
                black_box(options.clone()),
            )
        });
    });
}

fn bench_parse_str(c: &mut Criterion) {
    let content = std::fs::read_to_string(fixture_path("power_net.txt")).unwrap_or_default();

    c.bench_function("parse_str", |b| {
        b.iter(|| padsimport::PadsParser::parse_str(black_box(&content)));
    });
}

criterion_group!(benches, bench_import_file, bench_parse_str);
criterion_main!(benches);
