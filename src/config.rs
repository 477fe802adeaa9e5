//! Configuration for the venue client and the synchronization engine.
//!
//! - [`Config`] - venue endpoints and network timeouts
//! - [`SyncConfig`] - per-subscription engine settings
//! - [`ReconnectConfig`] - resync attempt budget and backoff
//! - [`GapPolicy`] - what to do when diff event ids skip ahead

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::types::market::SymbolTable;

/// Default REST base URL
pub const DEFAULT_REST_BASE_URL: &str = "https://www.namebase.io";

/// Default WebSocket base URL
pub const DEFAULT_WEBSOCKET_URL: &str = "wss://app.namebase.io:443";

/// Configuration for the Namebase API client
///
/// # Example
///
/// ```rust
/// use depth_sync::Config;
///
/// let config = Config::new()
///     .with_timeout(std::time::Duration::from_secs(30));
/// assert_eq!(config.rest_base_url(), "https://www.namebase.io");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// REST API base URL
    rest_base_url: String,

    /// WebSocket base URL
    websocket_url: String,

    /// HTTP request and WebSocket dial timeout
    timeout: Duration,
}

impl Config {
    /// Create a configuration pointing at the production venue
    pub fn new() -> Self {
        Self {
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            websocket_url: DEFAULT_WEBSOCKET_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the REST base URL
    #[must_use]
    pub fn with_rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into();
        self
    }

    /// Set the WebSocket base URL
    #[must_use]
    pub fn with_websocket_url(mut self, url: impl Into<String>) -> Self {
        self.websocket_url = url.into();
        self
    }

    /// Set the HTTP request / WebSocket dial timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the REST API base URL
    pub fn rest_base_url(&self) -> &str {
        &self.rest_base_url
    }

    /// Get the WebSocket base URL
    pub fn websocket_url(&self) -> &str {
        &self.websocket_url
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// How the engine treats a diff event whose first id is past the gate but
/// does not directly follow the last applied id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Apply it anyway. Venue batches are not always contiguous.
    #[default]
    Tolerate,
    /// Drop the event and rebuild the book from a fresh snapshot.
    Resync,
}

/// Configuration for resync behavior after a stream failure
///
/// Each attempt reopens the stream and fetches a fresh snapshot. When every
/// attempt fails the session terminates.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of reopen + snapshot attempts per resync (at least 1)
    pub max_attempts: u32,
    /// Delay before the first attempt
    pub initial_delay_ms: u64,
    /// Maximum delay between attempts
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Random extra delay as a fraction of the computed delay (0.0 = none,
    /// clamped to 1.0; NaN means none)
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 100,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl ReconnectConfig {
    /// Create a new reconnect config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// One immediate attempt; any failure during resync is fatal.
    pub fn eager() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
            jitter: 0.0,
        }
    }

    /// Set maximum attempts (values below 1 are treated as 1)
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set initial delay in milliseconds
    pub fn initial_delay_ms(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Set maximum delay in milliseconds
    pub fn max_delay_ms(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    /// Set backoff multiplier
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set jitter fraction
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Effective attempt budget
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Calculate the delay before a given attempt (0-based), without jitter
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(delay_ms)
    }

    /// Delay before a given attempt with jitter applied
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        let jitter = self.jitter_fraction();
        if jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let extra = base.as_secs_f64() * rand::thread_rng().gen_range(0.0..=jitter);
        base + Duration::from_secs_f64(extra)
    }

    /// `jitter` clamped to `0.0..=1.0`; NaN and infinities count as no jitter
    fn jitter_fraction(&self) -> f64 {
        if self.jitter.is_finite() {
            self.jitter.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Settings for [`SyncEngine`](crate::sync::SyncEngine) subscriptions
///
/// # Example
///
/// ```rust
/// use depth_sync::config::{GapPolicy, ReconnectConfig, SyncConfig};
///
/// let config = SyncConfig::new()
///     .with_snapshot_depth(100)
///     .with_gap_policy(GapPolicy::Resync)
///     .with_reconnect(ReconnectConfig::eager());
/// assert_eq!(config.snapshot_depth(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct SyncConfig {
    snapshot_depth: usize,
    channel_capacity: usize,
    gap_policy: GapPolicy,
    reconnect: ReconnectConfig,
    symbols: Option<Arc<SymbolTable>>,
}

impl SyncConfig {
    /// Create a config with default values: 50 snapshot levels, a publish
    /// buffer of one book, tolerant gap handling and default reconnect policy
    pub fn new() -> Self {
        Self {
            snapshot_depth: 50,
            channel_capacity: 1,
            gap_policy: GapPolicy::default(),
            reconnect: ReconnectConfig::default(),
            symbols: None,
        }
    }

    /// Set the number of levels requested per snapshot
    #[must_use]
    pub fn with_snapshot_depth(mut self, depth: usize) -> Self {
        self.snapshot_depth = depth;
        self
    }

    /// Set the publish buffer size (minimum 1)
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the gap policy
    #[must_use]
    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    /// Set the reconnect policy
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Restrict subscriptions to pairs listed in this symbol table
    #[must_use]
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = Some(Arc::new(symbols));
        self
    }

    /// Get the snapshot depth
    pub fn snapshot_depth(&self) -> usize {
        self.snapshot_depth
    }

    /// Get the publish buffer size
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }

    /// Get the gap policy
    pub fn gap_policy(&self) -> GapPolicy {
        self.gap_policy
    }

    /// Get the reconnect policy
    pub fn reconnect(&self) -> &ReconnectConfig {
        &self.reconnect
    }

    /// Get the symbol table, if any
    pub fn symbols(&self) -> Option<&SymbolTable> {
        self.symbols.as_deref()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert_eq!(config.rest_base_url(), DEFAULT_REST_BASE_URL);
        assert_eq!(config.websocket_url(), DEFAULT_WEBSOCKET_URL);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_builder_pattern() {
        let config = Config::new()
            .with_rest_base_url("http://127.0.0.1:8080")
            .with_websocket_url("ws://127.0.0.1:8081")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.rest_base_url(), "http://127.0.0.1:8080");
        assert_eq!(config.websocket_url(), "ws://127.0.0.1:8081");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_sync_config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.snapshot_depth(), 50);
        assert_eq!(config.channel_capacity(), 1);
        assert_eq!(config.gap_policy(), GapPolicy::Tolerate);
        assert!(config.symbols().is_none());
    }

    #[test]
    fn test_channel_capacity_floor() {
        let config = SyncConfig::new().with_channel_capacity(0);
        assert_eq!(config.channel_capacity(), 1);
    }

    #[test]
    fn test_reconnect_config_default() {
        let config = ReconnectConfig::default();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.initial_delay_ms, 100);
        assert_eq!(config.max_delay_ms, 30_000);
        assert!((config.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eager_reconnect() {
        let config = ReconnectConfig::eager();
        assert_eq!(config.attempts(), 1);
        assert_eq!(config.jittered_delay(0), Duration::ZERO);
        assert_eq!(ReconnectConfig::eager().max_attempts(0).attempts(), 1);
    }

    #[test]
    fn test_delay_calculation() {
        let config = ReconnectConfig::new()
            .initial_delay_ms(100)
            .backoff_multiplier(2.0)
            .max_delay_ms(1000);

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(800));
        // Should cap at max_delay_ms
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(10), Duration::from_millis(1000));
    }

    #[test]
    fn test_jitter_bounds() {
        let config = ReconnectConfig::new()
            .initial_delay_ms(100)
            .backoff_multiplier(1.0)
            .jitter(0.5);

        for _ in 0..32 {
            let delay = config.jittered_delay(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(151));
        }
    }

    #[test]
    fn test_out_of_range_jitter_is_clamped() {
        let base = ReconnectConfig::new()
            .initial_delay_ms(100)
            .backoff_multiplier(1.0);

        for jitter in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -3.0] {
            let config = base.clone().jitter(jitter);
            assert_eq!(config.jittered_delay(0), Duration::from_millis(100));
        }

        let config = base.jitter(1e300);
        for _ in 0..32 {
            let delay = config.jittered_delay(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(201));
        }
    }
}
