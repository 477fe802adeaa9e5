//! Currency pairs and symbol metadata.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Currency code, always upper case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency(String);

impl Currency {
    /// Create a currency from any casing
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Get the currency code
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A trading pair such as HNS/BTC
///
/// `Display` renders the venue symbol (`HNSBTC`).
///
/// # Example
///
/// ```rust
/// use depth_sync::types::CurrencyPair;
///
/// let pair = CurrencyPair::new("hns", "btc");
/// assert_eq!(pair.to_string(), "HNSBTC");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    /// Base currency
    pub base: Currency,
    /// Quote currency
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a trading pair
    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> Self {
        Self {
            base: Currency::new(base),
            quote: Currency::new(quote),
        }
    }

    /// Venue symbol (`BASEQUOTE`)
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Check whether a venue symbol names this pair
    pub fn matches_symbol(&self, symbol: &str) -> bool {
        symbol.trim().eq_ignore_ascii_case(&self.symbol())
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}

/// Trading rules of a single symbol, from `/api/v0/info`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    /// Venue symbol, e.g. `HNSBTC`
    pub symbol: String,
    /// Trading status, e.g. `TRADING`
    #[serde(default)]
    pub status: String,
    /// Base currency code
    pub base_asset: String,
    /// Decimal places allowed for base quantities
    #[serde(default)]
    pub base_precision: u32,
    /// Quote currency code
    pub quote_asset: String,
    /// Decimal places allowed for quote prices
    #[serde(default)]
    pub quote_precision: u32,
    /// Supported order types
    #[serde(default)]
    pub order_types: Vec<String>,
}

impl SymbolInfo {
    /// The pair this symbol trades
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.base_asset, &self.quote_asset)
    }
}

/// Exchange info response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfo {
    /// Exchange timezone
    #[serde(default)]
    pub timezone: String,
    /// Server time in milliseconds
    #[serde(default)]
    pub server_time: i64,
    /// Listed symbols
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

/// Immutable symbol metadata keyed by pair
///
/// Loaded once before any subscription starts and handed to the engine
/// through [`SyncConfig::with_symbols`](crate::config::SyncConfig::with_symbols).
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: FxHashMap<CurrencyPair, SymbolInfo>,
}

impl SymbolTable {
    /// Look up a pair
    pub fn get(&self, pair: &CurrencyPair) -> Option<&SymbolInfo> {
        self.symbols.get(pair)
    }

    /// Check if a pair is listed
    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.symbols.contains_key(pair)
    }

    /// Number of listed pairs
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate over listed pairs
    pub fn pairs(&self) -> impl Iterator<Item = &CurrencyPair> + '_ {
        self.symbols.keys()
    }
}

impl From<ExchangeInfo> for SymbolTable {
    fn from(info: ExchangeInfo) -> Self {
        info.symbols.into_iter().collect()
    }
}

impl FromIterator<SymbolInfo> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = SymbolInfo>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().map(|s| (s.pair(), s)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_display() {
        let pair = CurrencyPair::new("hns", "Btc");
        assert_eq!(pair.to_string(), "HNSBTC");
        assert_eq!(pair.symbol(), "HNSBTC");
        assert_eq!(pair, CurrencyPair::new("HNS", "BTC"));
    }

    #[test]
    fn test_matches_symbol() {
        let pair = CurrencyPair::new("hns", "btc");
        assert!(pair.matches_symbol("HNSBTC"));
        assert!(pair.matches_symbol("hnsbtc"));
        assert!(!pair.matches_symbol("HNSUSDT"));
    }

    #[test]
    fn test_exchange_info_into_table() {
        let json = r#"{
            "timezone": "UTC",
            "serverTime": 1580752012397,
            "symbols": [
                {
                    "symbol": "HNSBTC",
                    "status": "TRADING",
                    "baseAsset": "HNS",
                    "basePrecision": 6,
                    "quoteAsset": "BTC",
                    "quotePrecision": 8,
                    "orderTypes": ["LMT", "MKT"]
                }
            ]
        }"#;

        let info: ExchangeInfo = serde_json::from_str(json).unwrap();
        let table = SymbolTable::from(info);

        assert_eq!(table.len(), 1);
        let hns = table.get(&CurrencyPair::new("hns", "btc")).unwrap();
        assert_eq!(hns.quote_precision, 8);
        assert_eq!(hns.order_types, vec!["LMT", "MKT"]);
        assert!(!table.contains(&CurrencyPair::new("hns", "usdt")));
    }
}
