use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fastmm::{read_matrix_market_coo, write_body, ReadOptions, TripletFormatter, WriteOptions};

fn generate_coo_document(records: usize) -> String {
    let mut text = String::with_capacity(records * 16 + 64);
    text.push_str("%%MatrixMarket matrix coordinate real general\n");
    text.push_str(&format!("{records} {records} {records}\n"));
    for k in 0..records {
        text.push_str(&format!("{} {} {}.25\n", k + 1, (k * 7) % records + 1, k));
    }
    text
}

fn bench_count_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_lines");
    for size_mb in [1usize, 16] {
        let line = "123 456 7.890123\n";
        let data = line.repeat(size_mb * 1024 * 1024 / line.len());
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("memchr", format!("{size_mb}MB")),
            data.as_bytes(),
            |b, data| b.iter(|| fastmm::chunks::count_lines(black_box(data))),
        );
    }
    group.finish();
}

fn bench_read_coo(c: &mut Criterion) {
    let document = generate_coo_document(200_000);
    let mut group = c.benchmark_group("read_coo");
    group.throughput(Throughput::Bytes(document.len() as u64));
    for threads in [1usize, 4] {
        let options = ReadOptions {
            chunk_size_bytes: 1 << 16,
            num_threads: threads,
            ..ReadOptions::default()
        };
        group.bench_with_input(
            BenchmarkId::new("threads", threads),
            &document,
            |b, document| {
                b.iter(|| {
                    let mut reader = document.as_bytes();
                    read_matrix_market_coo::<_, f64>(black_box(&mut reader), &options).unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_format_triplets(c: &mut Criterion) {
    let n = 200_000usize;
    let rows: Vec<u64> = (0..n as u64).collect();
    let cols: Vec<u64> = (0..n as u64).map(|k| (k * 7) % n as u64).collect();
    let values: Vec<f64> = (0..n).map(|k| k as f64 + 0.25).collect();
    let options = WriteOptions {
        num_threads: 1,
        ..WriteOptions::default()
    };

    c.bench_function("format_triplets", |b| {
        b.iter(|| {
            let mut formatter = TripletFormatter::new(&rows, &cols, &values).unwrap();
            let mut out = Vec::with_capacity(n * 25);
            write_body(&mut out, &mut formatter, &options).unwrap();
            black_box(out)
        })
    });
}

criterion_group!(
    benches,
    bench_count_lines,
    bench_read_coo,
    bench_format_triplets
);
criterion_main!(benches);
