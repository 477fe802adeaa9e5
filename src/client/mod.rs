//! Namebase venue clients.
//!
//! This module contains:
//!
//! - [`rest`] - HTTP client for the depth snapshot and symbol table endpoints
//! - [`websocket`] - WebSocket transport for the depth diff stream

pub mod rest;
pub mod websocket;

pub use rest::RestClient;
pub use websocket::DepthStream;
