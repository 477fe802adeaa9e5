//! Core order book data structure.
//!
//! An [`OrderBook`] pairs an ascending ask [`BookSide`] with a descending bid
//! [`BookSide`] and remembers the id of the last diff event applied to it.
//! That id is the sequencing gate: a diff is accepted only if it starts after
//! the last applied point.

use crate::config::GapPolicy;
use crate::types::{
    CurrencyPair, DepthSnapshot, DiffEvent, EventId, Price, PriceLevel, Quantity, TimestampMs,
};

use super::side::{BookSide, SideOrder};

/// Result of offering a diff event to the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Levels were applied and the event id advanced
    Applied,
    /// Event carried no level updates
    Heartbeat,
    /// Event starts at or before the last applied id; the book already
    /// reflects it
    Stale,
    /// Event skips ahead of the next expected id (only reported under
    /// [`GapPolicy::Resync`]); nothing was applied
    Gap {
        /// Expected first event id
        expected: EventId,
        /// First event id received
        got: EventId,
    },
}

/// Local order book for a single trading pair.
///
/// # Design Decisions
///
/// 1. **Decimal prices**: the venue quotes arbitrary-precision decimals, so
///    prices are exact [`rust_decimal::Decimal`] values and level matching
///    never suffers float rounding.
///
/// 2. **Sorted vectors**: each side is a best-first `Vec` updated by binary
///    search. Best bid/ask are the first element; publishing a copy is two
///    contiguous clones.
///
/// 3. **Sequence tracking**: `last_event_id` starts at the snapshot's id and
///    only moves when a diff is applied.
///
/// # Thread Safety
///
/// This struct is `Send + Sync` but not internally synchronized. The sync
/// engine owns each book exclusively and hands out clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBook {
    /// Trading pair
    pair: CurrencyPair,

    /// Bid levels, sorted descending by price (best bid first)
    bids: BookSide,

    /// Ask levels, sorted ascending by price (best ask first)
    asks: BookSide,

    /// Id of the last applied event
    last_event_id: EventId,

    /// Time of the last applied event (or of the snapshot)
    timestamp: TimestampMs,
}

impl OrderBook {
    /// Create a new empty orderbook for the given pair
    #[must_use]
    pub fn new(pair: CurrencyPair) -> Self {
        Self {
            pair,
            bids: BookSide::bids(),
            asks: BookSide::asks(),
            last_event_id: 0,
            timestamp: 0,
        }
    }

    /// Build a book from a REST snapshot
    ///
    /// Levels are normalized into best-first order whatever order the venue
    /// delivered them in.
    #[must_use]
    pub fn from_snapshot(pair: CurrencyPair, snapshot: DepthSnapshot) -> Self {
        Self {
            pair,
            bids: BookSide::from_levels(SideOrder::Descending, snapshot.bids),
            asks: BookSide::from_levels(SideOrder::Ascending, snapshot.asks),
            last_event_id: snapshot.last_event_id,
            timestamp: snapshot.timestamp,
        }
    }

    /// Get the trading pair
    #[must_use]
    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    /// Id of the last applied event
    #[must_use]
    pub const fn last_event_id(&self) -> EventId {
        self.last_event_id
    }

    /// Time of the last applied event
    #[must_use]
    pub const fn timestamp(&self) -> TimestampMs {
        self.timestamp
    }

    /// Offer a diff event to the book
    ///
    /// The event is applied only if `first_event_id > last_event_id`. When
    /// applied, every bid and ask update is upserted and the book takes the
    /// event's `last_event_id` and `event_time`. An inverted range
    /// (`last_event_id < first_event_id`) advances the book to
    /// `first_event_id`, so the book's event id never moves backwards.
    pub fn apply_diff(&mut self, event: &DiffEvent, policy: GapPolicy) -> ApplyOutcome {
        if event.is_empty() {
            return ApplyOutcome::Heartbeat;
        }

        if event.first_event_id <= self.last_event_id {
            return ApplyOutcome::Stale;
        }

        let expected = self.last_event_id + 1;
        if policy == GapPolicy::Resync && event.first_event_id != expected {
            return ApplyOutcome::Gap {
                expected,
                got: event.first_event_id,
            };
        }

        for level in &event.bid_updates {
            self.bids.upsert(*level);
        }
        for level in &event.ask_updates {
            self.asks.upsert(*level);
        }

        self.last_event_id = event.last_event_id.max(event.first_event_id);
        self.timestamp = event.event_time;
        ApplyOutcome::Applied
    }

    /// Set a bid level directly (zero quantity removes it)
    pub fn set_bid(&mut self, price: Price, quantity: Quantity) {
        self.bids.upsert(PriceLevel::new(price, quantity));
    }

    /// Set an ask level directly (zero quantity removes it)
    pub fn set_ask(&mut self, price: Price, quantity: Quantity) {
        self.asks.upsert(PriceLevel::new(price, quantity));
    }

    /// Bid side, best (highest) first
    #[must_use]
    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    /// Ask side, best (lowest) first
    #[must_use]
    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    /// Get the best bid (highest price)
    #[must_use]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.best()
    }

    /// Get the best ask (lowest price)
    #[must_use]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.best()
    }

    /// Get the mid price
    ///
    /// Returns the average of best bid and best ask, or `None` if either is missing.
    #[must_use]
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Price::TWO),
            _ => None,
        }
    }

    /// Get the spread (best ask - best bid)
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Check if the book is crossed (best bid >= best ask)
    ///
    /// This shouldn't happen in a healthy market but is useful for validation.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid.price >= ask.price,
            _ => false,
        }
    }

    /// Check if the orderbook is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get the number of price levels as `(bids, asks)`
    #[must_use]
    pub fn num_levels(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }
}
