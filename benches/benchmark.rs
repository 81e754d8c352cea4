//! Performance benchmarks for TblTransfer
//!
//! Run with: cargo bench
//!
//! Uses a synthetic gapped chain so no external data is needed.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tbl_transfer::core::{
    parse_chain_bytes, Bias, ChainIndex, CoordinateMapper, CoordinateTranslator, SequenceLengths,
};
use tbl_transfer::formats::{TblTransfer, TransferOptions};

const BLOCK: u64 = 1_000;
const BLOCKS: u64 = 1_000;

/// Chain of BLOCKS aligned blocks separated by 10bp reference / 5bp alternate gaps
fn synthetic_chain() -> Vec<u8> {
    let ref_len = BLOCKS * BLOCK + (BLOCKS - 1) * 10;
    let alt_len = BLOCKS * BLOCK + (BLOCKS - 1) * 5;
    let mut text = format!(
        "chain 1000 ref {} + 0 {} alt {} + 0 {} 1\n",
        ref_len, ref_len, alt_len, alt_len
    );
    for _ in 0..BLOCKS - 1 {
        text.push_str(&format!("{} 10 5\n", BLOCK));
    }
    text.push_str(&format!("{}\n\n", BLOCK));
    text.into_bytes()
}

fn synthetic_mapper() -> CoordinateMapper {
    let chain = parse_chain_bytes(&synthetic_chain()).unwrap();
    CoordinateMapper::new(ChainIndex::from_chain_data(chain))
}

/// Feature table with `records` records of 100 gene/CDS pairs each
fn synthetic_tbl(records: usize) -> String {
    let mut doc = String::new();
    for _ in 0..records {
        doc.push_str(">Feature gb|ref|\n");
        for f in 0..100u64 {
            let start = f * 9_000 + 7;
            let end = start + 2_500;
            doc.push_str(&format!("{}\t{}\tgene\n\t\t\tgene\tg{}\n", start, end, f));
            doc.push_str(&format!("{}\t{}\tCDS\n\t\t\tproduct\tp{}\n", end, start, f));
            doc.push_str(&format!("\t\t\tprotein_id\tgb|P{}.1|\n", f));
        }
    }
    doc
}

/// Benchmark chain parsing and indexing
fn bench_chain_loading(c: &mut Criterion) {
    let data = synthetic_chain();
    c.bench_function("chain_load", |b| {
        b.iter(|| {
            let chain = parse_chain_bytes(black_box(&data)).unwrap();
            black_box(ChainIndex::from_chain_data(chain))
        })
    });
}

/// Benchmark single biased position lookups, inside a block and in a gap
fn bench_position_lookup(c: &mut Criterion) {
    let mapper = synthetic_mapper();
    c.bench_function("translate_aligned", |b| {
        b.iter(|| mapper.translate_position(black_box("ref"), black_box(500_123), Bias::RoundDown))
    });
    c.bench_function("translate_gap", |b| {
        b.iter(|| mapper.translate_position(black_box("ref"), black_box(1_005), Bias::RoundDown))
    });
}

/// Benchmark whole-document transfer, sequential and parallel
fn bench_transfer(c: &mut Criterion) {
    let mapper = synthetic_mapper();
    let lengths: SequenceLengths = [("alt".to_string(), BLOCKS * BLOCK)].into_iter().collect();

    let mut group = c.benchmark_group("tbl_transfer");
    for records in [1usize, 10, 50] {
        let doc = synthetic_tbl(records);
        let lines: Vec<String> = doc.lines().map(str::to_string).collect();
        group.throughput(Throughput::Elements(lines.len() as u64));

        group.bench_with_input(BenchmarkId::new("sequential", records), &doc, |b, doc| {
            b.iter(|| {
                let mut transfer = TblTransfer::new(&mapper, &lengths, TransferOptions::default());
                let mut out = Vec::with_capacity(doc.len());
                transfer.transfer(doc.as_bytes(), &mut out).unwrap();
                black_box(out)
            })
        });

        group.bench_with_input(BenchmarkId::new("parallel", records), &lines, |b, lines| {
            b.iter(|| {
                let options = TransferOptions::default().with_threads(4);
                let mut transfer = TblTransfer::new(&mapper, &lengths, options);
                let mut out = Vec::new();
                transfer.transfer_records(lines, &mut out).unwrap();
                black_box(out)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chain_loading, bench_position_lookup, bench_transfer);
criterion_main!(benches);
