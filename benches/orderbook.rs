//! Benchmarks for orderbook operations.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use depth_sync::config::GapPolicy;
use depth_sync::orderbook::{BookSide, OrderBook, SideOrder};
use depth_sync::types::{CurrencyPair, DepthSnapshot, DiffEvent, PriceLevel};
use rust_decimal::Decimal;

fn ladder(size: i64, start: i64) -> Vec<PriceLevel> {
    (0..size)
        .map(|i| PriceLevel::new(Decimal::new(start + i, 4), Decimal::new(100 + i, 0)))
        .collect()
}

fn bench_side_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("side_upsert");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut side = BookSide::from_levels(SideOrder::Ascending, ladder(size, 1_000));
            let mid = Decimal::new(1_000 + size / 2, 4);

            b.iter(|| {
                // Update an existing level, then remove and restore one
                side.upsert(black_box(PriceLevel::new(mid, Decimal::new(7, 0))));
                side.upsert(black_box(PriceLevel::new(mid, Decimal::ZERO)));
                side.upsert(black_box(PriceLevel::new(mid, Decimal::new(100, 0))));
            });
        });
    }

    group.finish();
}

fn bench_apply_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_diff");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let snapshot = DepthSnapshot {
                last_event_id: 0,
                timestamp: 0,
                bids: ladder(size, 1_000),
                asks: ladder(size, 1_000 + size),
            };
            let mut book = OrderBook::from_snapshot(CurrencyPair::new("hns", "btc"), snapshot);
            let mut event = DiffEvent {
                bid_updates: ladder(5, 1_000 + size / 2),
                ask_updates: ladder(5, 1_000 + size + size / 2),
                ..DiffEvent::default()
            };

            b.iter(|| {
                event.first_event_id = book.last_event_id() + 1;
                event.last_event_id = event.first_event_id;
                black_box(book.apply_diff(black_box(&event), GapPolicy::Tolerate));
            });
        });
    }

    group.finish();
}

fn bench_publish_clone(c: &mut Criterion) {
    let snapshot = DepthSnapshot {
        last_event_id: 1,
        timestamp: 0,
        bids: ladder(50, 1_000),
        asks: ladder(50, 1_050),
    };
    let book = OrderBook::from_snapshot(CurrencyPair::new("hns", "btc"), snapshot);

    c.bench_function("publish_clone_50", |b| {
        b.iter(|| black_box(book.clone()));
    });
}

fn bench_best_prices(c: &mut Criterion) {
    let snapshot = DepthSnapshot {
        last_event_id: 1,
        timestamp: 0,
        bids: ladder(50, 1_000),
        asks: ladder(50, 1_050),
    };
    let book = OrderBook::from_snapshot(CurrencyPair::new("hns", "btc"), snapshot);

    c.bench_function("orderbook_spread", |b| {
        b.iter(|| black_box(book.spread()));
    });
    c.bench_function("orderbook_mid_price", |b| {
        b.iter(|| black_box(book.mid_price()));
    });
}

criterion_group!(
    benches,
    bench_side_upsert,
    bench_apply_diff,
    bench_publish_clone,
    bench_best_prices
);
criterion_main!(benches);
