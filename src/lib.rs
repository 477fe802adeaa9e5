//! # depth-sync
//!
//! Keeps a local copy of an exchange order book in sync with the venue, using
//! the classic snapshot-plus-diff scheme: load a REST depth snapshot, then
//! apply the WebSocket diff events that come after it.
//!
//! ## Features
//!
//! - **Sequenced updates** - events already covered by the snapshot are
//!   dropped by event id
//! - **Full resync** - stream failures rebuild the book from a fresh snapshot
//!   with bounded, jittered backoff
//! - **Backpressure** - books are published on a bounded channel, each one a
//!   deep copy the consumer owns
//! - **Exact prices** - `rust_decimal` prices and quantities, no floats
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use depth_sync::config::SyncConfig;
//! use depth_sync::types::CurrencyPair;
//! use depth_sync::{Config, NamebaseClient, SyncEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), depth_sync::Error> {
//!     let client = NamebaseClient::new(Config::default())?;
//!     let symbols = client.load_symbols().await?;
//!
//!     let engine = SyncEngine::new(client, SyncConfig::default().with_symbols(symbols));
//!     let mut subscription = engine.subscribe(CurrencyPair::new("hns", "btc")).await?;
//!
//!     while let Some(book) = subscription.recv().await {
//!         println!("{:?} / {:?}", book.best_bid(), book.best_ask());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`sync`] - the synchronization engine and its venue seam
//! - [`orderbook`] - sorted book sides, the sequencing gate, a multi-pair board
//! - [`client`] - Namebase REST and WebSocket clients
//! - [`types`] - wire types for depth snapshots, diff events and symbols
//! - [`config`] - client, engine and reconnect configuration
//! - [`error`] - error types for the crate

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod orderbook;
pub mod sync;
pub mod types;

use async_trait::async_trait;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use error::Error;
pub use orderbook::OrderBook;
pub use sync::{DepthSubscription, SyncEngine};

use client::websocket::{depth_url, DepthStream};
use types::{CurrencyPair, DepthSnapshot, SymbolTable};

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// The Namebase exchange client
///
/// Serves depth snapshots over REST and opens depth diff streams over
/// WebSocket; plug it into a [`SyncEngine`] to follow books.
#[derive(Debug, Clone)]
pub struct NamebaseClient {
    config: Config,
    rest_client: client::rest::RestClient,
}

impl NamebaseClient {
    /// Create a new Namebase client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: Config) -> Result<Self> {
        let rest_client = client::rest::RestClient::new(&config)?;
        Ok(Self {
            config,
            rest_client,
        })
    }

    /// Get a reference to the REST client
    pub fn rest(&self) -> &client::rest::RestClient {
        &self.rest_client
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch the exchange symbol table
    pub async fn load_symbols(&self) -> Result<SymbolTable> {
        let info = self.rest_client.exchange_info().await?;
        let symbols = SymbolTable::from(info);
        tracing::debug!(symbols = symbols.len(), "loaded exchange symbols");
        Ok(symbols)
    }
}

#[async_trait]
impl sync::DepthVenue for NamebaseClient {
    type Transport = DepthStream;

    async fn fetch_snapshot(&self, pair: &CurrencyPair, depth: usize) -> Result<DepthSnapshot> {
        self.rest_client.depth(pair, depth).await
    }

    async fn open_stream(&self, _pair: &CurrencyPair) -> Result<DepthStream> {
        let url = depth_url(self.config.websocket_url());
        DepthStream::connect(&url, self.config.timeout()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = Config::default().with_rest_base_url("https://example.test");
        let client = NamebaseClient::new(config).unwrap();
        assert_eq!(client.rest().base_url(), "https://example.test");
        assert_eq!(
            client.config().websocket_url(),
            crate::config::DEFAULT_WEBSOCKET_URL
        );
    }
}
