//! Collaborator seam between the engine and a venue.
//!
//! The engine needs exactly two things from a venue: a depth snapshot on
//! demand and a re-openable stream of encoded diff events.
//! [`NamebaseClient`](crate::NamebaseClient) implements these over REST and
//! WebSocket; tests implement them with scripted in-memory transports.

use async_trait::async_trait;

use crate::types::{CurrencyPair, DepthSnapshot};
use crate::Result;

/// A venue that can serve depth snapshots and diff event streams
#[async_trait]
pub trait DepthVenue: Send + Sync + 'static {
    /// Transport carrying one pair's diff events
    type Transport: EventTransport;

    /// Fetch the book for `pair`, at most `depth` levels per side
    ///
    /// # Errors
    ///
    /// Network failure, timeout or a non-success response.
    async fn fetch_snapshot(&self, pair: &CurrencyPair, depth: usize) -> Result<DepthSnapshot>;

    /// Open a persistent diff event stream for `pair`
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    async fn open_stream(&self, pair: &CurrencyPair) -> Result<Self::Transport>;
}

/// An open, ordered stream of encoded diff events
#[async_trait]
pub trait EventTransport: Send + 'static {
    /// Wait for the next encoded event
    ///
    /// # Errors
    ///
    /// Any read failure, including the remote closing the stream. The engine
    /// treats every error as a reason to resync.
    async fn read_message(&mut self) -> Result<Vec<u8>>;

    /// Close the stream. Calling this more than once is harmless.
    async fn close(&mut self);
}
