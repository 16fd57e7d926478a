use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dump_extract::extractor::{ExtractOptions, RowExtractor};
use dump_extract::parser::{split_tuples, TupleMatcher, SMALL_BUFFER_SIZE};
use dump_extract::schema::SchemaRegistry;
use dump_extract::writer::TsvWriter;
use std::hint::black_box;

fn generate_page_dump(statements: usize, tuples_per_statement: usize) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"-- MySQL dump 10.16\nLOCK TABLES `page` WRITE;\n");

    let mut id = 0;
    for _ in 0..statements {
        data.extend_from_slice(b"INSERT INTO `page` VALUES ");
        for t in 0..tuples_per_statement {
            if t > 0 {
                data.push(b',');
            }
            id += 1;
            data.extend_from_slice(
                format!(
                    "({},0,'Title_{}_(disambiguation),_it\\'s','',0,0,0,0.{},'20180410125914',NULL,{},{},'wikitext',NULL)",
                    id, id, id * 7919, id * 3, id % 5000
                )
                .as_bytes(),
            );
        }
        data.extend_from_slice(b";\n");
    }

    data.extend_from_slice(b"UNLOCK TABLES;\n");
    data
}

fn bench_match_tuples(c: &mut Criterion) {
    let registry = SchemaRegistry::builtin();
    let page = registry.lookup("page").unwrap();
    let matcher = TupleMatcher::new(page.grammar());

    let data = generate_page_dump(1, 1000);
    let line = data
        .split(|&b| b == b'\n')
        .find(|l| l.starts_with(b"INSERT"))
        .unwrap();
    let values = &line[b"INSERT INTO `page` VALUES ".len()..];

    let mut group = c.benchmark_group("tuple_matcher");
    group.throughput(Throughput::Bytes(values.len() as u64));
    group.bench_function("page_1000_tuples", |b| {
        b.iter(|| {
            let mut matched = 0;
            for tuple in split_tuples(black_box(values)) {
                if matcher.match_tuple(tuple).is_ok() {
                    matched += 1;
                }
            }
            black_box(matched)
        })
    });
    group.finish();
}

fn bench_extract_throughput(c: &mut Criterion) {
    let registry = SchemaRegistry::builtin();
    let page = registry.lookup("page").unwrap();

    let mut group = c.benchmark_group("extract_throughput");

    for statements in [10, 100, 500] {
        let data = generate_page_dump(statements, 200);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("page", format!("{}_stmts", statements)),
            &data,
            |b, data| {
                b.iter(|| {
                    let mut sink = TsvWriter::new(Vec::with_capacity(data.len()));
                    let summary = RowExtractor::new(page.clone(), ExtractOptions::default())
                        .run(&data[..], SMALL_BUFFER_SIZE, &mut sink)
                        .unwrap();
                    black_box(summary.statistics.rows_written)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_match_tuples, bench_extract_throughput);
criterion_main!(benches);
