//! Local order book data structures.
//!
//! - [`side`] - one price-ordered side with O(log n) level upserts
//! - [`book`] - the two-sided book and its event-id sequencing gate
//! - [`board`] - latest book per pair for concurrent readers
//!
//! # Example
//!
//! ```rust
//! use depth_sync::config::GapPolicy;
//! use depth_sync::orderbook::{ApplyOutcome, OrderBook};
//! use depth_sync::types::{CurrencyPair, DepthSnapshot, DiffEvent, PriceLevel};
//! use rust_decimal::Decimal;
//!
//! let snapshot = DepthSnapshot {
//!     last_event_id: 5,
//!     asks: vec![PriceLevel::new(Decimal::new(10, 0), Decimal::ONE)],
//!     ..DepthSnapshot::default()
//! };
//! let mut book = OrderBook::from_snapshot(CurrencyPair::new("hns", "btc"), snapshot);
//!
//! let event = DiffEvent {
//!     first_event_id: 6,
//!     last_event_id: 6,
//!     ask_updates: vec![PriceLevel::new(Decimal::new(10, 0), Decimal::ZERO)],
//!     ..DiffEvent::default()
//! };
//! assert_eq!(book.apply_diff(&event, GapPolicy::Tolerate), ApplyOutcome::Applied);
//! assert!(book.best_ask().is_none());
//! ```

pub mod board;
pub mod book;
pub mod side;

pub use board::{BoardState, BookBoard};
pub use book::{ApplyOutcome, OrderBook};
pub use side::{BookSide, LevelChange, SideOrder};
