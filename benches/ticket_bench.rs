//! Benchmarks for ticket issuance, signing and verification.
//!
//! Run with:
//! ```sh
//! cargo bench --bench ticket_bench
//! ```
//!
//! Issuance runs once per device request, so the interesting numbers are
//! per-ticket latency for each type and the share of it spent in HMAC.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use cuco_core::{CucoTimestamp, DeviceKeys, RequestIntent, bytes::flip_hex_bytes};
use cuco_ticket::{
    Authenticator, Defaults, DeviceAttributes, TicketFactory, create_ticket_at, serialize,
};
use std::hint::black_box;

const ADDRESS: &str = "0x73a99b188a1054aac0a0d77ceb6883ef0fc1c515";
const AK: &str = "D53470ED1DE204EAAB9ED03AA8BAEE86";
const UK: &str = "2A6BCC61D12DCD2FDAD9457D9738E421";

fn keys() -> DeviceKeys {
    DeviceKeys::new(ADDRESS, AK, UK)
}

fn attributes() -> DeviceAttributes {
    DeviceAttributes::from_json_str(
        r#"{"data": [
            ["IT", "Welcome"],
            ["BT", "Your computer is locked by CUCo Firmware security"],
            ["BW", "This is a test warning message :GNV: :FI:86400"],
            ["ticketlifetime", 86400],
            ["TW", "02A300"],
            ["MaxUC", "64"]
        ]}"#,
    )
    .unwrap()
}

fn issued_at() -> CucoTimestamp {
    CucoTimestamp::from_epoch_seconds(0x1D9093DD)
}

/// Full issue path (select, build, sign, render) per ticket type.
fn bench_issue(c: &mut Criterion) {
    let mut group = c.benchmark_group("issue");
    group.throughput(Throughput::Elements(1));

    let factory = TicketFactory::new(Defaults::new());
    let keys = keys();
    let attributes = attributes();

    let cases = [
        ("free", "0", RequestIntent::normal()),
        ("normal", "1", RequestIntent::normal()),
        ("blocked", "2", RequestIntent::normal()),
        ("start", "1", RequestIntent::check()),
    ];

    for (name, state, intent) in cases {
        group.bench_with_input(BenchmarkId::new("ticket", name), &state, |b, &state| {
            b.iter(|| {
                let wire = factory
                    .issue_at(black_box(state), &keys, &attributes, intent, issued_at())
                    .unwrap();
                black_box(wire)
            });
        });
    }

    group.finish();
}

/// Signing only, with the authenticator built once or per call.
fn bench_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("sign");
    group.throughput(Throughput::Elements(1));

    let ticket = create_ticket_at(
        "1",
        &keys(),
        &attributes(),
        &Defaults::new(),
        RequestIntent::normal(),
        issued_at(),
    )
    .unwrap();
    let authenticator = Authenticator::from_hex_key(AK).unwrap();

    group.bench_function("reused_key", |b| {
        b.iter(|| black_box(serialize(black_box(&ticket), &authenticator).unwrap()));
    });

    group.bench_function("fresh_key", |b| {
        b.iter(|| {
            let authenticator = Authenticator::from_hex_key(black_box(AK)).unwrap();
            black_box(serialize(&ticket, &authenticator).unwrap())
        });
    });

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let wire = TicketFactory::default()
        .issue_at("1", &keys(), &attributes(), RequestIntent::normal(), issued_at())
        .unwrap();
    let authenticator = Authenticator::from_hex_key(AK).unwrap();

    c.bench_function("verify", |b| {
        b.iter(|| black_box(authenticator.verify(black_box(&wire)).unwrap()));
    });
}

fn bench_flip(c: &mut Criterion) {
    let mut group = c.benchmark_group("flip_hex_bytes");

    for (name, hex) in [("key", AK.to_string()), ("digest", "ab".repeat(32))] {
        group.throughput(Throughput::Bytes(hex.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &hex, |b, hex| {
            b.iter(|| black_box(flip_hex_bytes(black_box(hex)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_issue, bench_sign, bench_verify, bench_flip);
criterion_main!(benches);
