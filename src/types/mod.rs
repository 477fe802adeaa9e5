//! Venue data types.
//!
//! - [`depth`] - price levels, diff events and depth snapshots (wire decoding)
//! - [`market`] - currency pairs and symbol metadata

pub mod depth;
pub mod market;

pub use depth::{DepthSnapshot, DiffEvent, PriceLevel};
pub use market::{Currency, CurrencyPair, ExchangeInfo, SymbolInfo, SymbolTable};

/// Price of one unit of the base currency, in the quote currency
///
/// The venue sends prices as decimal strings such as `"0.06844"`; keeping them
/// as [`rust_decimal::Decimal`] gives exact comparisons for level matching.
pub type Price = rust_decimal::Decimal;

/// Aggregate resting quantity at a price level
pub type Quantity = rust_decimal::Decimal;

/// Venue sequence id of a depth event
pub type EventId = i64;

/// Timestamp in milliseconds since Unix epoch
pub type TimestampMs = i64;
