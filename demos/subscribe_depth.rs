//! Live depth sync - follows a Namebase order book and prints the top of book
//!
//! Usage:
//!   cargo run --example subscribe_depth
//!
//! Optional:
//!   DEPTH_PAIR=HNS/USDT   # pair to follow (default: HNS/BTC)
//!   RUST_LOG=depth_sync=debug

use std::sync::Arc;

use depth_sync::config::{ReconnectConfig, SyncConfig};
use depth_sync::orderbook::BookBoard;
use depth_sync::types::CurrencyPair;
use depth_sync::{Config, NamebaseClient, OrderBook, SyncEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("depth_sync=info".parse()?),
        )
        .init();

    let pair = match std::env::var("DEPTH_PAIR") {
        Ok(raw) => {
            let (base, quote) = raw.split_once('/').ok_or("DEPTH_PAIR must look like HNS/BTC")?;
            CurrencyPair::new(base, quote)
        }
        Err(_) => CurrencyPair::new("hns", "btc"),
    };

    println!("=== Namebase Depth Sync ===\n");

    let client = NamebaseClient::new(Config::default())?;
    let symbols = client.load_symbols().await?;
    println!("{} symbols listed", symbols.len());

    let config = SyncConfig::new()
        .with_symbols(symbols)
        .with_reconnect(ReconnectConfig::new().max_attempts(5));
    let engine = SyncEngine::new(client, config);

    let mut subscription = engine.subscribe(pair.clone()).await?;
    println!("Following {} (Press Ctrl+C to stop)\n", pair);

    let board = Arc::new(BookBoard::new());
    let start_time = std::time::Instant::now();
    let mut book_count = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            book = subscription.recv() => match book {
                Some(book) => {
                    book_count += 1;
                    print_book_summary(&book);
                    board.update(book);

                    if book_count % 50 == 0 {
                        let elapsed = start_time.elapsed().as_secs_f64();
                        println!(
                            "\n--- {} books in {:.1}s ({:.1}/s) | {:?} ---\n",
                            book_count,
                            elapsed,
                            book_count as f64 / elapsed,
                            subscription.stats()
                        );
                    }
                }
                None => break,
            },
        }
    }

    let reason = subscription.shutdown().await;
    println!("\nSession ended: {}", reason);
    if let Some(book) = board.get_orderbook(&pair) {
        println!("Last book at event {}", book.last_event_id());
    }
    Ok(())
}

fn print_book_summary(book: &OrderBook) {
    let fmt = |level: Option<depth_sync::types::PriceLevel>| match level {
        Some(l) => format!("{} @ {}", l.quantity, l.price),
        None => "-".to_string(),
    };

    println!(
        "[{}] BID: {} | ASK: {} | spread: {} | levels: {:?}",
        book.last_event_id(),
        fmt(book.best_bid()),
        fmt(book.best_ask()),
        book.spread().map_or("-".to_string(), |s| s.to_string()),
        book.num_levels()
    );
}
