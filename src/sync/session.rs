//! Per-pair streaming worker.
//!
//! A [`Session`] is created by [`SyncEngine::subscribe`](super::SyncEngine::subscribe)
//! once the stream is open and the first snapshot is loaded, and then runs on
//! its own task until it is stopped, its consumer goes away, or a resync
//! cannot be completed.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use crate::config::SyncConfig;
use crate::error::Error;
use crate::orderbook::{ApplyOutcome, OrderBook};
use crate::types::{CurrencyPair, DiffEvent};
use crate::Result;

use super::venue::{DepthVenue, EventTransport};
use super::{SessionState, SyncStats, TerminationReason};

pub(crate) struct Session<V: DepthVenue> {
    pub(crate) venue: Arc<V>,
    pub(crate) pair: CurrencyPair,
    pub(crate) config: SyncConfig,
    pub(crate) transport: V::Transport,
    /// Owned exclusively by this worker; consumers only see clones
    pub(crate) book: OrderBook,
    pub(crate) books: mpsc::Sender<OrderBook>,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) stop: watch::Receiver<bool>,
    pub(crate) stats: Arc<Mutex<SyncStats>>,
}

impl<V: DepthVenue> Session<V> {
    /// Run until terminated, then close the stream and the output channel
    pub(crate) async fn run(mut self) -> TerminationReason {
        let reason = self.stream().await;
        self.transport.close().await;

        match &reason {
            TerminationReason::ReconnectFailed { .. } => {
                error!(pair = %self.pair, reason = %reason, "depth session terminated");
            }
            _ => info!(pair = %self.pair, reason = %reason, "depth session terminated"),
        }

        self.state
            .send_replace(SessionState::Terminated(reason.clone()));
        reason
    }

    async fn stream(&mut self) -> TerminationReason {
        loop {
            let message = tokio::select! {
                biased;
                _ = self.stop.changed() => return TerminationReason::Stopped,
                message = self.transport.read_message() => message,
            };

            let handled = match message {
                Ok(payload) => self.on_message(&payload).await,
                Err(err) => {
                    warn!(pair = %self.pair, error = %err, "depth stream read failed, resyncing");
                    self.resync().await
                }
            };

            if let Err(reason) = handled {
                return reason;
            }
        }
    }

    async fn on_message(&mut self, payload: &[u8]) -> std::result::Result<(), TerminationReason> {
        let event = match DiffEvent::decode(payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    pair = %self.pair,
                    error = %err,
                    raw = %String::from_utf8_lossy(payload),
                    "dropping undecodable depth event"
                );
                self.stats.lock().decode_errors += 1;
                return Ok(());
            }
        };

        if !event.symbol.is_empty() && !self.pair.matches_symbol(&event.symbol) {
            trace!(pair = %self.pair, symbol = %event.symbol, "ignoring event for another symbol");
            self.stats.lock().foreign += 1;
            return Ok(());
        }

        match self.book.apply_diff(&event, self.config.gap_policy()) {
            ApplyOutcome::Applied => {
                self.stats.lock().applied += 1;
                self.publish().await
            }
            ApplyOutcome::Heartbeat => {
                self.stats.lock().heartbeats += 1;
                Ok(())
            }
            ApplyOutcome::Stale => {
                debug!(
                    pair = %self.pair,
                    first_event_id = event.first_event_id,
                    last_applied = self.book.last_event_id(),
                    "dropping event already covered by the book"
                );
                self.stats.lock().stale += 1;
                Ok(())
            }
            ApplyOutcome::Gap { expected, got } => {
                let gap = Error::SequenceGap { expected, got };
                warn!(pair = %self.pair, error = %gap, "resyncing after sequence gap");
                self.stats.lock().gaps += 1;
                self.resync().await
            }
        }
    }

    /// Hand a deep copy of the book to the consumer, waiting for buffer space
    async fn publish(&mut self) -> std::result::Result<(), TerminationReason> {
        let copy = self.book.clone();

        tokio::select! {
            biased;
            _ = self.stop.changed() => Err(TerminationReason::Stopped),
            sent = self.books.send(copy) => match sent {
                Ok(()) => {
                    self.stats.lock().published += 1;
                    Ok(())
                }
                Err(_) => Err(TerminationReason::ConsumerDropped),
            },
        }
    }

    /// Close the stream and rebuild the book from a new stream and snapshot
    async fn resync(&mut self) -> std::result::Result<(), TerminationReason> {
        self.transport.close().await;
        self.stats.lock().resyncs += 1;

        let policy = self.config.reconnect().clone();
        let attempts = policy.attempts();
        let mut stop = self.stop.clone();
        let mut last_error = None;

        for attempt in 0..attempts {
            let delay = policy.jittered_delay(attempt);
            if !delay.is_zero() {
                debug!(
                    pair = %self.pair,
                    delay_ms = delay.as_millis() as u64,
                    "waiting before resync"
                );
                tokio::select! {
                    biased;
                    _ = stop.changed() => return Err(TerminationReason::Stopped),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let reopened = tokio::select! {
                biased;
                _ = stop.changed() => return Err(TerminationReason::Stopped),
                reopened = self.reopen() => reopened,
            };

            match reopened {
                Ok(()) => {
                    info!(
                        pair = %self.pair,
                        attempt = attempt + 1,
                        last_event_id = self.book.last_event_id(),
                        "depth book resynchronized"
                    );
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        pair = %self.pair,
                        attempt = attempt + 1,
                        attempts,
                        error = %err,
                        "resync attempt failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(TerminationReason::ReconnectFailed {
            attempts,
            error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    /// One reopen + snapshot cycle; the new book replaces the old one entirely
    async fn reopen(&mut self) -> Result<()> {
        self.state.send_replace(SessionState::Connecting);
        self.transport = self.venue.open_stream(&self.pair).await?;

        self.state.send_replace(SessionState::Snapshotting);
        let snapshot = match self
            .venue
            .fetch_snapshot(&self.pair, self.config.snapshot_depth())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.transport.close().await;
                return Err(err);
            }
        };

        self.book = OrderBook::from_snapshot(self.pair.clone(), snapshot);
        self.state.send_replace(SessionState::Streaming);
        Ok(())
    }
}
