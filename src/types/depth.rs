//! Depth wire types: price levels, diff events and REST snapshots.
//!
//! The venue encodes a price level as a two-element array of decimal strings,
//! `["0.06844", "10760"]` meaning price then quantity. Diff events arrive on
//! the depth WebSocket as
//!
//! ```json
//! {
//!   "eventType": "depthUpdate",
//!   "eventTime": 1580752012397,
//!   "symbol": "HNSBTC",
//!   "firstEventId": 101,
//!   "lastEventId": 103,
//!   "bids": [["0.00000915", "1200"]],
//!   "asks": [["0.00000921", "0"]]
//! }
//! ```
//!
//! and the REST depth endpoint returns `lastEventId`, `timestamp`, `bids`
//! and `asks` with the same level encoding.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;

use super::{EventId, Price, Quantity, TimestampMs};
use crate::error::DecodeError;

/// A price and the aggregate quantity resting at it
///
/// A quantity of zero never describes resting interest; inside a diff event it
/// means "remove this level".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceLevel {
    /// Level price
    pub price: Price,
    /// Aggregate quantity (zero = remove)
    pub quantity: Quantity,
}

impl PriceLevel {
    /// Create a price level
    #[must_use]
    pub const fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }

    /// Decode `[price, quantity]` tokens
    ///
    /// Extra tokens are ignored.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::MissingFields`] if fewer than two tokens are given
    /// - [`DecodeError::InvalidDecimal`] if a token is not a decimal
    /// - [`DecodeError::NegativeValue`] if a token is negative
    ///
    /// # Example
    ///
    /// ```rust
    /// use depth_sync::types::PriceLevel;
    ///
    /// let level = PriceLevel::from_tokens(&["0.06844", "10760"]).unwrap();
    /// assert_eq!(level.price.to_string(), "0.06844");
    /// assert!(PriceLevel::from_tokens(&["0.06844"]).is_err());
    /// ```
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, DecodeError> {
        if tokens.len() < 2 {
            return Err(DecodeError::MissingFields(tokens.len()));
        }
        Ok(Self {
            price: parse_decimal(tokens[0].as_ref())?,
            quantity: parse_decimal(tokens[1].as_ref())?,
        })
    }

    /// Whether this level removes the price from the book
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.quantity.is_zero()
    }
}

fn parse_decimal(token: &str) -> Result<Decimal, DecodeError> {
    let token = token.trim();
    let value = Decimal::from_str(token).map_err(|e| DecodeError::InvalidDecimal {
        token: token.to_string(),
        reason: e.to_string(),
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DecodeError::NegativeValue(token.to_string()));
    }
    Ok(value)
}

/// One element of a level array: the venue sends strings, bare JSON numbers
/// are accepted as well.
struct Token(String);

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TokenVisitor;

        impl<'de> Visitor<'de> for TokenVisitor {
            type Value = Token;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Token, E> {
                Ok(Token(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Token, E> {
                Ok(Token(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Token, E> {
                Ok(Token(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Token, E> {
                Ok(Token(v.to_string()))
            }

            // f64 Display never uses exponent notation, so the text parses as
            // a Decimal whenever the value is in range.
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Token, E> {
                Ok(Token(v.to_string()))
            }
        }

        deserializer.deserialize_any(TokenVisitor)
    }
}

impl<'de> Deserialize<'de> for PriceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LevelVisitor;

        impl<'de> Visitor<'de> for LevelVisitor {
            type Value = PriceLevel;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [price, quantity] array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PriceLevel, A::Error> {
                let mut tokens = Vec::with_capacity(2);
                while let Some(Token(token)) = seq.next_element()? {
                    tokens.push(token);
                }
                PriceLevel::from_tokens(&tokens).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_seq(LevelVisitor)
    }
}

/// A level list sent as `null` decodes as empty, like a missing one.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<PriceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<PriceLevel>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Incremental depth update covering event ids `first_event_id..=last_event_id`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffEvent {
    /// Event type, `depthUpdate` for diffs
    pub event_type: String,
    /// Event time in milliseconds
    pub event_time: TimestampMs,
    /// Venue symbol
    pub symbol: String,
    /// First event id in this batch
    pub first_event_id: EventId,
    /// Last event id in this batch
    pub last_event_id: EventId,
    /// Bid level changes
    #[serde(rename = "bids", deserialize_with = "null_as_empty")]
    pub bid_updates: Vec<PriceLevel>,
    /// Ask level changes
    #[serde(rename = "asks", deserialize_with = "null_as_empty")]
    pub ask_updates: Vec<PriceLevel>,
}

impl DiffEvent {
    /// Decode a raw stream message
    ///
    /// Missing fields take their defaults, so control frames without levels
    /// decode to an empty event.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] if the payload is not a depth
    /// envelope or a level inside it is invalid.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
    }

    /// No bid and no ask updates (heartbeat)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bid_updates.is_empty() && self.ask_updates.is_empty()
    }

    /// Total number of level updates
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.bid_updates.len() + self.ask_updates.len()
    }
}

/// Full book at a point in time, from the REST depth endpoint
///
/// Asks are delivered ascending and bids descending, but the book built from a
/// snapshot does not rely on that order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DepthSnapshot {
    /// Id of the last event reflected in this snapshot
    pub last_event_id: EventId,
    /// Snapshot time in milliseconds
    #[serde(alias = "ts")]
    pub timestamp: TimestampMs,
    /// Bid levels
    #[serde(deserialize_with = "null_as_empty")]
    pub bids: Vec<PriceLevel>,
    /// Ask levels
    #[serde(deserialize_with = "null_as_empty")]
    pub asks: Vec<PriceLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_level() {
        let level: PriceLevel = serde_json::from_str(r#"["0.06844", "10760"]"#).unwrap();
        assert_eq!(level, PriceLevel::new(dec!(0.06844), dec!(10760)));
        assert!(!level.is_removal());
    }

    #[test]
    fn test_decode_level_missing_quantity() {
        assert_eq!(
            PriceLevel::from_tokens(&["0.06844"]),
            Err(DecodeError::MissingFields(1))
        );

        let err = serde_json::from_str::<PriceLevel>(r#"["0.06844"]"#).unwrap_err();
        assert!(err.to_string().contains("at least two fields"));
    }

    #[test]
    fn test_decode_level_invalid_decimal() {
        let err = PriceLevel::from_tokens(&["abc", "1"]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidDecimal { ref token, .. } if token == "abc"));
    }

    #[test]
    fn test_decode_level_negative() {
        assert_eq!(
            PriceLevel::from_tokens(&["1", "-2"]),
            Err(DecodeError::NegativeValue("-2".to_string()))
        );
    }

    #[test]
    fn test_decode_level_integer_tokens_and_extras() {
        let level: PriceLevel = serde_json::from_str(r#"[10, 0, "ignored"]"#).unwrap();
        assert_eq!(level, PriceLevel::new(dec!(10), dec!(0)));
        assert!(level.is_removal());
    }

    #[test]
    fn test_decode_level_float_tokens() {
        let level: PriceLevel = serde_json::from_str("[0.5, 1]").unwrap();
        assert_eq!(level, PriceLevel::new(dec!(0.5), dec!(1)));

        let level: PriceLevel = serde_json::from_str("[0.00000915, 12.25]").unwrap();
        assert_eq!(level, PriceLevel::new(dec!(0.00000915), dec!(12.25)));

        assert!(serde_json::from_str::<PriceLevel>("[-0.5, 1]").is_err());
    }

    #[test]
    fn test_decode_diff_event() {
        let raw = br#"{
            "eventType": "depthUpdate",
            "eventTime": 1580752012397,
            "symbol": "HNSBTC",
            "firstEventId": 101,
            "lastEventId": 103,
            "bids": [["0.00000915", "1200"]],
            "asks": [["0.00000921", "0"], ["0.00000925", "40"]]
        }"#;

        let event = DiffEvent::decode(raw).unwrap();
        assert_eq!(event.event_type, "depthUpdate");
        assert_eq!(event.event_time, 1580752012397);
        assert_eq!(event.first_event_id, 101);
        assert_eq!(event.last_event_id, 103);
        assert_eq!(event.bid_updates, vec![PriceLevel::new(dec!(0.00000915), dec!(1200))]);
        assert_eq!(event.ask_updates.len(), 2);
        assert_eq!(event.update_count(), 3);
    }

    #[test]
    fn test_decode_control_frame_is_empty() {
        let event = DiffEvent::decode(br#"{"eventType": "subscribed"}"#).unwrap();
        assert!(event.is_empty());
    }

    #[test]
    fn test_decode_diff_event_null_side() {
        let raw = br#"{"firstEventId":6,"lastEventId":6,"bids":[["9","3"]],"asks":null}"#;

        let event = DiffEvent::decode(raw).unwrap();
        assert_eq!(event.bid_updates, vec![PriceLevel::new(dec!(9), dec!(3))]);
        assert!(event.ask_updates.is_empty());
        assert!(!event.is_empty());

        let event = DiffEvent::decode(br#"{"firstEventId":7,"bids":null,"asks":null}"#).unwrap();
        assert!(event.is_empty());
    }

    #[test]
    fn test_decode_diff_event_bad_level() {
        let err = DiffEvent::decode(br#"{"firstEventId": 1, "bids": [["0.1"]]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(ref msg) if msg.contains("at least two fields")));

        assert!(matches!(
            DiffEvent::decode(b"not json"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_snapshot() {
        let raw = r#"{
            "lastEventId": 5,
            "timestamp": 1580752012000,
            "bids": [["9", "1"], ["8", "2"]],
            "asks": [["10", "1"], ["11", "2"]]
        }"#;

        let snapshot: DepthSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.last_event_id, 5);
        assert_eq!(snapshot.timestamp, 1580752012000);
        assert_eq!(snapshot.bids[0], PriceLevel::new(dec!(9), dec!(1)));
        assert_eq!(snapshot.asks[1], PriceLevel::new(dec!(11), dec!(2)));
    }

    #[test]
    fn test_decode_snapshot_null_side() {
        let raw = r#"{"lastEventId": 5, "bids": null, "asks": [["10", "1"]]}"#;

        let snapshot: DepthSnapshot = serde_json::from_str(raw).unwrap();
        assert!(snapshot.bids.is_empty());
        assert_eq!(snapshot.asks, vec![PriceLevel::new(dec!(10), dec!(1))]);
    }
}
