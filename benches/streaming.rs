//! Benchmarks for pql-stream.
//!
//! These run the streaming parser over in-memory response bodies, delivered
//! in network-sized chunks, so no PQL server is needed.
//!
//! Run benchmarks: `cargo bench`

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use futures::stream;
use pql_stream::{JsonArrayParser, coerce};
use tokio::runtime::Runtime;
use tokio_util::io::StreamReader;

/// Typical TCP read size.
const CHUNK_SIZE: usize = 16 * 1024;

/// Build a JSON array body of `count` person records.
fn generate_body(count: usize) -> Vec<u8> {
    let mut body = String::with_capacity(count * 128);
    body.push('[');
    for i in 0..count {
        if i > 0 {
            body.push(',');
        }
        body.push_str(&format!(
            r#"{{"name":"person {}","age":{},"birthday":"19{:02}-0{}-1{}","siblings":["a","b"],"address":{{"street":"{} Main St","zip":{}}}}}"#,
            i,
            i % 100,
            i % 100,
            (i % 9) + 1,
            i % 10,
            i,
            97000 + (i % 1000)
        ));
    }
    body.push(']');
    body.into_bytes()
}

/// Split a body into fixed-size chunks, as a network read would.
fn chunked_reader(body: &[u8]) -> impl tokio::io::AsyncRead + Unpin {
    let chunks: Vec<std::io::Result<Bytes>> = body
        .chunks(CHUNK_SIZE)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    StreamReader::new(stream::iter(chunks))
}

/// Benchmark parsing throughput
fn bench_parse(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let sizes = [1_000, 10_000, 50_000];

    let mut group = c.benchmark_group("parse");
    group.sample_size(10);

    for size in sizes {
        let body = generate_body(size);
        group.throughput(Throughput::Bytes(body.len() as u64));

        group.bench_with_input(BenchmarkId::new("records", size), &body, |b, body| {
            b.to_async(&rt).iter(|| async {
                let mut parser = JsonArrayParser::new(chunked_reader(body));
                let mut count = 0;
                while parser.next().await.unwrap().is_some() {
                    count += 1;
                }
                count
            });
        });
    }

    group.finish();
}

/// Benchmark the cost of date coercion on top of parsing
fn bench_coerce(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let size = 10_000;
    let body = generate_body(size);

    let mut group = c.benchmark_group("coerce");
    group.sample_size(10);
    group.throughput(Throughput::Elements(size as u64));

    group.bench_function("10k_records_with_dates", |b| {
        b.to_async(&rt).iter(|| async {
            let mut parser = JsonArrayParser::new(chunked_reader(&body));
            let mut dates = 0;
            while let Some(record) = parser.next().await.unwrap() {
                if coerce(&record).get("birthday").and_then(|v| v.as_time()).is_some() {
                    dates += 1;
                }
            }
            dates
        });
    });

    group.finish();
}

/// Benchmark time to first record on a large body
fn bench_first_record_latency(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let body = generate_body(50_000);

    let mut group = c.benchmark_group("latency");
    group.sample_size(20);

    group.bench_function("time_to_first_record", |b| {
        b.to_async(&rt).iter(|| async {
            let mut parser = JsonArrayParser::new(chunked_reader(&body));
            match parser.next().await {
                Ok(Some(record)) => record,
                Ok(None) => panic!("No records in body"),
                Err(e) => panic!("Error reading record: {}", e),
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_coerce,
    bench_first_record_latency,
);

criterion_main!(benches);
