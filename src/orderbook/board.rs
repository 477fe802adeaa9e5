//! Latest-book view over many subscriptions.
//!
//! [`BookBoard`] drains [`DepthSubscription`]s and keeps the most recent book
//! of each pair for any number of readers. It is the consumer side of the
//! engine: the engine publishes every update, the board keeps only the last.
//!
//! # Design
//!
//! A single `parking_lot::RwLock` guards an `FxHashMap` keyed by pair.
//! Readers get clones so no lock is held while they inspect a book.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::sync::{DepthSubscription, TerminationReason};
use crate::types::{CurrencyPair, Price, PriceLevel};

use super::OrderBook;

/// State of a pair on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    /// Tracked but no book received yet
    WaitingForBook,
    /// Receiving books
    Live,
    /// Its subscription ended; resubscribe to revive it
    Terminated,
}

#[derive(Debug)]
struct BoardEntry {
    book: Option<OrderBook>,
    state: BoardState,
    updates: u64,
}

impl BoardEntry {
    fn waiting() -> Self {
        Self {
            book: None,
            state: BoardState::WaitingForBook,
            updates: 0,
        }
    }
}

/// Thread-safe latest-book-per-pair container
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use depth_sync::config::SyncConfig;
/// use depth_sync::orderbook::BookBoard;
/// use depth_sync::sync::SyncEngine;
/// use depth_sync::types::CurrencyPair;
/// use depth_sync::{Config, NamebaseClient};
///
/// # async fn example() -> depth_sync::Result<()> {
/// let engine = SyncEngine::new(NamebaseClient::new(Config::default())?, SyncConfig::default());
/// let board = Arc::new(BookBoard::new());
///
/// let pair = CurrencyPair::new("hns", "btc");
/// board.track(engine.subscribe(pair.clone()).await?);
///
/// if let Some(bid) = board.best_bid(&pair) {
///     println!("Best bid: {} @ {}", bid.quantity, bid.price);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct BookBoard {
    books: RwLock<FxHashMap<CurrencyPair, BoardEntry>>,
}

impl BookBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow a subscription, replacing the pair's book with every publish
    ///
    /// The returned task finishes when the subscription terminates, yielding
    /// its termination reason.
    pub fn track(
        self: &Arc<Self>,
        mut subscription: DepthSubscription,
    ) -> JoinHandle<TerminationReason> {
        let pair = subscription.pair().clone();
        self.books
            .write()
            .entry(pair.clone())
            .or_insert_with(BoardEntry::waiting)
            .state = BoardState::WaitingForBook;

        let board = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(book) = subscription.recv().await {
                board.update(book);
            }

            if let Some(entry) = board.books.write().get_mut(&pair) {
                entry.state = BoardState::Terminated;
            }
            let reason = subscription.shutdown().await;
            debug!(pair = %pair, reason = %reason, "board stopped tracking pair");
            reason
        })
    }

    /// Store a book as the latest for its pair
    pub fn update(&self, book: OrderBook) {
        let mut books = self.books.write();
        let entry = books
            .entry(book.pair().clone())
            .or_insert_with(BoardEntry::waiting);
        entry.book = Some(book);
        entry.state = BoardState::Live;
        entry.updates += 1;
    }

    /// Remove a pair from the board
    pub fn remove_pair(&self, pair: &CurrencyPair) {
        self.books.write().remove(pair);
    }

    /// Get the state of a pair
    pub fn get_state(&self, pair: &CurrencyPair) -> Option<BoardState> {
        self.books.read().get(pair).map(|e| e.state)
    }

    /// Number of books received for a pair
    pub fn updates(&self, pair: &CurrencyPair) -> u64 {
        self.books.read().get(pair).map_or(0, |e| e.updates)
    }

    /// Get a copy of the latest book of a pair
    pub fn get_orderbook(&self, pair: &CurrencyPair) -> Option<OrderBook> {
        self.books.read().get(pair).and_then(|e| e.book.clone())
    }

    /// Get best bid for a pair
    pub fn best_bid(&self, pair: &CurrencyPair) -> Option<PriceLevel> {
        self.with_book(pair, OrderBook::best_bid)
    }

    /// Get best ask for a pair
    pub fn best_ask(&self, pair: &CurrencyPair) -> Option<PriceLevel> {
        self.with_book(pair, OrderBook::best_ask)
    }

    /// Get mid price for a pair
    pub fn mid_price(&self, pair: &CurrencyPair) -> Option<Price> {
        self.with_book(pair, OrderBook::mid_price)
    }

    /// Get spread for a pair
    pub fn spread(&self, pair: &CurrencyPair) -> Option<Price> {
        self.with_book(pair, OrderBook::spread)
    }

    fn with_book<T>(
        &self,
        pair: &CurrencyPair,
        f: impl FnOnce(&OrderBook) -> Option<T>,
    ) -> Option<T> {
        self.books.read().get(pair).and_then(|e| e.book.as_ref()).and_then(f)
    }

    /// Pairs whose subscription has terminated
    pub fn terminated_pairs(&self) -> Vec<CurrencyPair> {
        self.books
            .read()
            .iter()
            .filter(|(_, e)| e.state == BoardState::Terminated)
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    /// All pairs on the board
    pub fn pairs(&self) -> Vec<CurrencyPair> {
        self.books.read().keys().cloned().collect()
    }

    /// Number of pairs on the board
    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    /// Check if the board is empty
    pub fn is_empty(&self) -> bool {
        self.books.read().is_empty()
    }

    /// Remove every pair
    pub fn clear(&self) {
        self.books.write().clear();
    }
}
