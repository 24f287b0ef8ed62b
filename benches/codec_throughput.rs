use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use csv_rowcodec::{
    DecodePipeline, EncodePipeline, ErrorPolicy, FormatOptions, ProjectionMask, Row, estimate,
    types::{DataType, Field, RowType},
};
use tempfile::TempDir;

fn orders_row_type() -> RowType {
    RowType::new(vec![
        Field::required("id", DataType::Integer),
        Field::new("ordered_at", DataType::Timestamp),
        Field::new("amount", DataType::Decimal),
        Field::new("status", DataType::String),
        Field::new("tags", DataType::array(DataType::String)),
    ])
}

fn generate_orders(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("orders.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    for i in 0..rows {
        let status = match i % 3 {
            0 => "shipped",
            1 => "pending",
            _ => "processing",
        };
        let day = (i % 28) + 1;
        let hour = i % 24;
        writeln!(
            file,
            "{i},2024-01-{day:02} {hour:02}:00:00,{}.{:02},{status},a;b",
            i % 1000,
            i % 100
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_codec(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_orders(50_000);
    let row_type = orders_row_type();
    let options = FormatOptions::default();

    let full = DecodePipeline::new(&row_type, &options, None, ErrorPolicy::Strict)
        .expect("full decoder");
    let projection = ProjectionMask::top_level(&[0, 3]);
    let projected = DecodePipeline::new(&row_type, &options, Some(&projection), ErrorPolicy::Strict)
        .expect("projected decoder");
    let decoded: Vec<Row> = full
        .decode_path(&csv_path)
        .expect("open csv")
        .collect::<Result<_, _>>()
        .expect("decode rows");
    let encoder = EncodePipeline::new(&row_type, &options).expect("encoder");

    let mut group = c.benchmark_group("codec");

    group.bench_function("decode_all_columns", |b| {
        b.iter(|| full.decode_path(&csv_path).expect("open csv").count());
    });

    group.bench_function("decode_projected", |b| {
        b.iter(|| projected.decode_path(&csv_path).expect("open csv").count());
    });

    group.bench_function("encode_all_columns", |b| {
        b.iter_batched(
            || (),
            |_| encoder.encode_to_vec(&decoded).expect("encode rows"),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("estimate_row_count", |b| {
        b.iter(|| estimate::estimate([&csv_path]));
    });

    group.finish();
    drop(temp_dir);
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
