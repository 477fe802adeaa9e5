//! WebSocket transport for the Namebase depth diff stream.
//!
//! A [`DepthStream`] is one connection to the venue's depth ticker, owned by
//! a single pair's session. It carries raw payloads only; decoding and
//! sequencing are the engine's job.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use depth_sync::client::websocket::{depth_url, DepthStream};
//! use depth_sync::config::DEFAULT_WEBSOCKET_URL;
//!
//! # async fn example() -> depth_sync::Result<()> {
//! let url = depth_url(DEFAULT_WEBSOCKET_URL);
//! let mut stream = DepthStream::connect(&url, Duration::from_secs(10)).await?;
//!
//! let payload = stream.read_message().await?;
//! println!("{}", String::from_utf8_lossy(&payload));
//! stream.close().await;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use crate::error::Error;
use crate::sync::EventTransport;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Path of the depth diff ticker, relative to the WebSocket base URL
pub const DEPTH_STREAM_PATH: &str = "/ws/v0/ticker/depth";

/// Build the depth stream URL from the WebSocket base URL
///
/// The venue multiplexes every symbol on this one stream; events for other
/// pairs are filtered out by the session.
pub fn depth_url(websocket_url: &str) -> String {
    format!("{}{}", websocket_url.trim_end_matches('/'), DEPTH_STREAM_PATH)
}

/// One open depth diff stream
///
/// # Thread Safety
///
/// This stream is NOT thread-safe; it is owned by a single session worker.
#[derive(Debug)]
pub struct DepthStream {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    closed: bool,
}

impl DepthStream {
    /// Connect to a depth stream URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the handshake does not finish within
    /// `timeout`, or the WebSocket error if it fails.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, Error> {
        debug!(url = %url, "connecting depth stream");

        let (ws_stream, _response) =
            match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url)).await {
                Ok(connected) => connected?,
                Err(_) => return Err(Error::Timeout),
            };
        let (write, read) = ws_stream.split();

        Ok(Self {
            write,
            read,
            closed: false,
        })
    }

    /// Receive the next data payload
    ///
    /// Pings are answered and other control frames skipped.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] once the remote closes or the stream ends,
    /// or the WebSocket error on a read failure.
    pub async fn read_message(&mut self) -> Result<Vec<u8>, Error> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }

        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
                Some(Ok(Message::Binary(data))) => return Ok(data),
                Some(Ok(Message::Ping(data))) => {
                    trace!("answering ping");
                    self.write.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(frame = ?frame, "depth stream closed by remote");
                    self.closed = true;
                    return Err(Error::ConnectionClosed);
                }
                // Pong and raw frames
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => {
                    self.closed = true;
                    return Err(Error::ConnectionClosed);
                }
            }
        }
    }

    /// Close the WebSocket connection
    ///
    /// Calling this more than once is harmless.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.write.close().await {
            debug!(error = %e, "error while closing depth stream");
        }
    }

    /// Check if the stream has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl EventTransport for DepthStream {
    async fn read_message(&mut self) -> crate::Result<Vec<u8>> {
        DepthStream::read_message(self).await
    }

    async fn close(&mut self) {
        DepthStream::close(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_url() {
        assert_eq!(
            depth_url("wss://app.namebase.io:443"),
            "wss://app.namebase.io:443/ws/v0/ticker/depth"
        );
        assert_eq!(
            depth_url("ws://localhost:9000/"),
            "ws://localhost:9000/ws/v0/ticker/depth"
        );
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Nothing listens on the discard port in test environments
        let result = DepthStream::connect("ws://127.0.0.1:9/", Duration::from_secs(5)).await;
        assert!(result.is_err());
    }
}
