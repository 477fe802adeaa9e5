//! Order book synchronization engine.
//!
//! [`SyncEngine::subscribe`] opens a venue's diff event stream for one pair,
//! loads a REST snapshot, and spawns a worker that keeps the book current:
//!
//! 1. each diff event is gated against the book's last applied event id and
//!    dropped if the snapshot already covers it;
//! 2. accepted events are applied to both sides;
//! 3. a deep copy of the book is published on the subscription's channel.
//!
//! When the stream fails, the worker closes it, opens a new one and rebuilds
//! the book from a fresh snapshot; nothing from the old book survives. If
//! that cannot be done within the [`ReconnectConfig`](crate::config::ReconnectConfig)
//! budget the session terminates and the channel closes.
//!
//! # Example
//!
//! ```rust,no_run
//! use depth_sync::config::SyncConfig;
//! use depth_sync::sync::SyncEngine;
//! use depth_sync::types::CurrencyPair;
//! use depth_sync::{Config, NamebaseClient};
//!
//! # async fn example() -> depth_sync::Result<()> {
//! let client = NamebaseClient::new(Config::default())?;
//! let engine = SyncEngine::new(client, SyncConfig::default());
//!
//! let mut subscription = engine.subscribe(CurrencyPair::new("hns", "btc")).await?;
//! while let Some(book) = subscription.recv().await {
//!     println!("best bid {:?} best ask {:?}", book.best_bid(), book.best_ask());
//! }
//! // Channel closed: the session terminated; resubscribe if desired
//! println!("terminated: {:?}", subscription.state());
//! # Ok(())
//! # }
//! ```

mod session;
pub mod venue;

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::Error;
use crate::orderbook::OrderBook;
use crate::types::CurrencyPair;
use crate::Result;

use session::Session;
pub use tokio::sync::mpsc::error::TryRecvError;
pub use venue::{DepthVenue, EventTransport};

/// Lifecycle of a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Opening the diff event stream
    Connecting,
    /// Fetching a snapshot
    Snapshotting,
    /// Applying and publishing diff events
    Streaming,
    /// Finished; nothing more will be published
    Terminated(TerminationReason),
}

impl SessionState {
    /// Check if the session has finished
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated(_))
    }
}

/// Why a session stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The subscription was stopped or dropped by its owner
    Stopped,
    /// The book receiver was dropped
    ConsumerDropped,
    /// Every resync attempt after a stream failure failed
    ReconnectFailed {
        /// Attempts made
        attempts: u32,
        /// Last error seen
        error: String,
    },
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Stopped => write!(f, "stopped"),
            TerminationReason::ConsumerDropped => write!(f, "consumer dropped"),
            TerminationReason::ReconnectFailed { attempts, error } => {
                write!(f, "resync failed after {} attempts: {}", attempts, error)
            }
        }
    }
}

/// Counters for one subscription
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Diff events applied to the book
    pub applied: u64,
    /// Books handed to the consumer
    pub published: u64,
    /// Events dropped by the sequencing gate
    pub stale: u64,
    /// Events without level updates
    pub heartbeats: u64,
    /// Messages that failed to decode
    pub decode_errors: u64,
    /// Events for another symbol
    pub foreign: u64,
    /// Sequence gaps detected (resync gap policy only)
    pub gaps: u64,
    /// Full resyncs started
    pub resyncs: u64,
}

/// Engine that turns a [`DepthVenue`] into per-pair book subscriptions
///
/// Each subscription runs on its own task with its own book and transport,
/// so any number of pairs can be followed concurrently.
pub struct SyncEngine<V: DepthVenue> {
    venue: Arc<V>,
    config: SyncConfig,
}

impl<V: DepthVenue> fmt::Debug for SyncEngine<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<V: DepthVenue> SyncEngine<V> {
    /// Create an engine owning the venue
    pub fn new(venue: V, config: SyncConfig) -> Self {
        Self::with_shared_venue(Arc::new(venue), config)
    }

    /// Create an engine over a venue shared with other code
    pub fn with_shared_venue(venue: Arc<V>, config: SyncConfig) -> Self {
        Self { venue, config }
    }

    /// Get the venue
    pub fn venue(&self) -> &V {
        &self.venue
    }

    /// Get the engine configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Start following the book of `pair`
    ///
    /// Opens the diff event stream, then loads the initial snapshot, then
    /// spawns the streaming worker. Neither step is retried here.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedPair`] if a symbol table is configured and does
    ///   not list `pair`
    /// - [`Error::Connect`] if the stream cannot be opened or the first
    ///   snapshot cannot be fetched
    pub async fn subscribe(&self, pair: CurrencyPair) -> Result<DepthSubscription> {
        if let Some(symbols) = self.config.symbols() {
            if !symbols.contains(&pair) {
                return Err(Error::UnsupportedPair(pair.to_string()));
            }
        }

        let (state_tx, state_rx) = watch::channel(SessionState::Connecting);

        debug!(pair = %pair, "opening depth stream");
        let mut transport = match self.venue.open_stream(&pair).await {
            Ok(transport) => transport,
            Err(err) => {
                warn!(pair = %pair, error = %err, "failed to open depth stream");
                return Err(Error::connect(&pair, err));
            }
        };

        state_tx.send_replace(SessionState::Snapshotting);
        let snapshot = match self
            .venue
            .fetch_snapshot(&pair, self.config.snapshot_depth())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(pair = %pair, error = %err, "failed to fetch depth snapshot");
                transport.close().await;
                return Err(Error::connect(&pair, err));
            }
        };

        let book = OrderBook::from_snapshot(pair.clone(), snapshot);
        info!(
            pair = %pair,
            last_event_id = book.last_event_id(),
            bids = book.bids().len(),
            asks = book.asks().len(),
            "depth snapshot loaded, streaming"
        );
        state_tx.send_replace(SessionState::Streaming);

        let (books_tx, books_rx) = mpsc::channel(self.config.channel_capacity());
        let (stop_tx, stop_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(SyncStats::default()));

        let session = Session {
            venue: Arc::clone(&self.venue),
            pair: pair.clone(),
            config: self.config.clone(),
            transport,
            book,
            books: books_tx,
            state: state_tx,
            stop: stop_rx,
            stats: Arc::clone(&stats),
        };
        let task = tokio::spawn(session.run());

        Ok(DepthSubscription {
            pair,
            books: books_rx,
            state: state_rx,
            stop: stop_tx,
            stats,
            task,
        })
    }
}

/// Handle to a running book subscription
///
/// Books arrive on [`recv`](Self::recv); `None` means the session has
/// terminated and [`state`](Self::state) says why. Dropping the handle stops
/// the session.
#[derive(Debug)]
pub struct DepthSubscription {
    pair: CurrencyPair,
    books: mpsc::Receiver<OrderBook>,
    state: watch::Receiver<SessionState>,
    stop: watch::Sender<bool>,
    stats: Arc<Mutex<SyncStats>>,
    task: JoinHandle<TerminationReason>,
}

impl DepthSubscription {
    /// Get the subscribed pair
    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    /// Wait for the next published book
    ///
    /// Returns `None` once the session has terminated.
    pub async fn recv(&mut self) -> Option<OrderBook> {
        self.books.recv().await
    }

    /// Take a published book if one is buffered
    ///
    /// # Errors
    ///
    /// - [`TryRecvError::Empty`] if the session is running but nothing is
    ///   buffered yet
    /// - [`TryRecvError::Disconnected`] once the session has terminated and
    ///   every buffered book has been taken
    pub fn try_recv(&mut self) -> std::result::Result<OrderBook, TryRecvError> {
        self.books.try_recv()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver that observes lifecycle changes
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Check if the session is still running
    pub fn is_running(&self) -> bool {
        !self.state.borrow().is_terminated()
    }

    /// Counters so far
    pub fn stats(&self) -> SyncStats {
        *self.stats.lock()
    }

    /// Ask the session to stop; the channel closes once it has
    pub fn stop(&self) {
        // Err only means the worker is already gone
        let _ = self.stop.send(true);
    }

    /// Stop the session and wait for it to finish
    pub async fn shutdown(self) -> TerminationReason {
        self.stop();
        match self.task.await {
            Ok(reason) => reason,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => TerminationReason::Stopped,
        }
    }
}
