//! HTTP REST client for the Namebase public market data API.
//!
//! Only the unauthenticated endpoints the synchronizer needs are covered:
//! the depth snapshot and the exchange symbol table.
//!
//! # Example
//!
//! ```rust,no_run
//! use depth_sync::types::CurrencyPair;
//! use depth_sync::{Config, NamebaseClient};
//!
//! # async fn example() -> depth_sync::Result<()> {
//! let client = NamebaseClient::new(Config::default())?;
//!
//! let snapshot = client.rest().depth(&CurrencyPair::new("hns", "btc"), 50).await?;
//! println!("snapshot at event {}", snapshot.last_event_id);
//! # Ok(())
//! # }
//! ```

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{ApiError, Error};
use crate::types::{CurrencyPair, DepthSnapshot, ExchangeInfo};

const DEPTH_PATH: &str = "/api/v0/depth";
const EXCHANGE_INFO_PATH: &str = "/api/v0/info";

/// HTTP client for the Namebase REST API
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a new REST client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.rest_base_url().trim_end_matches('/').to_string(),
        })
    }

    /// Make a GET request to the API
    ///
    /// # Arguments
    ///
    /// * `path` - API path (without base URL)
    /// * `query` - Query parameters, URL-encoded in order
    pub async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        tracing::trace!(url = %url, "GET");

        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, Error> {
        let base = format!("{}{}", self.base_url, path);
        if query.is_empty() {
            Ok(Url::parse(&base)?)
        } else {
            Ok(Url::parse_with_params(&base, query.iter().map(|(k, v)| (*k, v.as_str())))?)
        }
    }

    /// Handle the HTTP response, checking for errors
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_body(status, &body)
    }

    /// Fetch the depth snapshot of `pair`, at most `limit` levels per side
    pub async fn depth(&self, pair: &CurrencyPair, limit: usize) -> Result<DepthSnapshot, Error> {
        self.get(
            DEPTH_PATH,
            &[("symbol", pair.symbol()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Fetch the exchange's symbol table
    pub async fn exchange_info(&self) -> Result<ExchangeInfo, Error> {
        self.get(EXCHANGE_INFO_PATH, &[]).await
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Turn a status and body into a value or an [`Error::Api`]
///
/// The venue reports some failures with a success status and a non-empty
/// `code` field, so the body is inspected regardless of status.
fn parse_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, Error> {
    let value: Option<serde_json::Value> = serde_json::from_str(body).ok();

    if let Some(error) = value.as_ref().and_then(|v| api_error(status, v)) {
        return Err(Error::Api(error));
    }

    if !(200..300).contains(&status) {
        return Err(Error::Api(ApiError::new(status, body)));
    }

    match value {
        Some(value) => serde_json::from_value(value).map_err(Error::from),
        None => serde_json::from_str(body).map_err(Error::from),
    }
}

fn api_error(status: u16, value: &serde_json::Value) -> Option<ApiError> {
    let code = value
        .get("code")
        .and_then(|v| v.as_str())
        .filter(|c| !c.is_empty());
    let message = value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str());

    let success = (200..300).contains(&status);
    match (code, message) {
        (Some(code), message) => Some(ApiError::with_code(
            status,
            code,
            message.unwrap_or(code),
        )),
        (None, Some(message)) if !success => Some(ApiError::new(status, message)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_url() {
        let client = RestClient::new(&Config::default().with_rest_base_url("https://example.test/"))
            .unwrap();
        let url = client
            .url(
                DEPTH_PATH,
                &[("symbol", "HNSBTC".to_string()), ("limit", "50".to_string())],
            )
            .unwrap();

        assert_eq!(client.base_url(), "https://example.test");
        assert_eq!(
            url.as_str(),
            "https://example.test/api/v0/depth?symbol=HNSBTC&limit=50"
        );
    }

    #[test]
    fn test_parse_snapshot_body() {
        let body = r#"{"lastEventId":42,"timestamp":1,"bids":[["0.5","2"]],"asks":[]}"#;
        let snapshot: DepthSnapshot = parse_body(200, body).unwrap();

        assert_eq!(snapshot.last_event_id, 42);
        assert_eq!(snapshot.bids.len(), 1);
    }

    #[test]
    fn test_success_status_with_code_is_error() {
        let body = r#"{"code":"INVALID_SYMBOL","message":"unknown symbol"}"#;
        match parse_body::<DepthSnapshot>(200, body) {
            Err(Error::Api(err)) => {
                assert_eq!(err.status, 200);
                assert_eq!(err.code.as_deref(), Some("INVALID_SYMBOL"));
                assert_eq!(err.message, "unknown symbol");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_code_is_not_error() {
        let body = r#"{"code":"","lastEventId":7,"bids":[],"asks":[]}"#;
        let snapshot: DepthSnapshot = parse_body(200, body).unwrap();
        assert_eq!(snapshot.last_event_id, 7);
    }

    #[test]
    fn test_error_status() {
        match parse_body::<DepthSnapshot>(503, "upstream unavailable") {
            Err(Error::Api(err)) => {
                assert!(err.is_server_error());
                assert_eq!(err.message, "upstream unavailable");
            }
            other => panic!("expected API error, got {:?}", other),
        }

        match parse_body::<DepthSnapshot>(404, r#"{"message":"not found"}"#) {
            Err(Error::Api(err)) => {
                assert!(err.is_client_error());
                assert_eq!(err.code, None);
                assert_eq!(err.message, "not found");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_success_body() {
        assert!(matches!(
            parse_body::<DepthSnapshot>(200, "not json"),
            Err(Error::Json(_))
        ));
    }
}
