use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use markup::perf_fixtures::{make_blocks, make_long_paragraph, make_table, make_unclosed_nesting};
use markup::{ConverterConfig, HtmlToMarkupConverter, convert_html_to_markup, parse_html, tokenize};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 5_000;
const TABLE_ROWS: usize = 2_000;

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&input)).expect("tokenize");
            black_box(tokens.len());
        });
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_parse_large", |b| {
        b.iter(|| {
            let root = parse_html(black_box(&input)).expect("parse");
            black_box(root);
        });
    });
}

fn bench_parse_unclosed_nesting(c: &mut Criterion) {
    let input = make_unclosed_nesting(2_000);
    c.bench_function("bench_parse_unclosed_nesting", |b| {
        b.iter(|| {
            let root = parse_html(black_box(&input)).expect("parse");
            black_box(root);
        });
    });
}

fn bench_transform_large(c: &mut Criterion) {
    let config = ConverterConfig::default();
    let root = parse_html(&make_blocks(LARGE_BLOCKS)).expect("parse");
    c.bench_function("bench_transform_large", |b| {
        b.iter_batched(
            || root.clone(),
            |root| {
                let tree = HtmlToMarkupConverter::new(&config)
                    .convert(root)
                    .expect("convert");
                black_box(tree);
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_convert_table(c: &mut Criterion) {
    let config = ConverterConfig::default();
    let input = make_table(TABLE_ROWS);
    c.bench_function("bench_convert_table", |b| {
        b.iter(|| {
            let xml = convert_html_to_markup(black_box(&input), &config).expect("convert");
            black_box(xml.len());
        });
    });
}

fn bench_convert_paginated(c: &mut Criterion) {
    let config = ConverterConfig::default().with_block_max_size(512);
    let input = make_long_paragraph(50_000);
    c.bench_function("bench_convert_paginated", |b| {
        b.iter(|| {
            let xml = convert_html_to_markup(black_box(&input), &config).expect("convert");
            black_box(xml.len());
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_parse_large,
    bench_parse_unclosed_nesting,
    bench_transform_large,
    bench_convert_table,
    bench_convert_paginated
);
criterion_main!(benches);
