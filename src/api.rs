use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::category::RaceCategory;
use crate::error::{ApiError, NetworkError};

pub const DEFAULT_ENDPOINT: &str =
    "https://api.neds.com.au/rest/v1/racing/?method=nextraces&count=10";

/// Upper bound on a whole request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// All races from one fetch, keyed by race id. No ordering.
pub type RaceCollection = HashMap<String, RaceSummary>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RacesResponse {
    pub status: i64,
    pub data: RaceData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RaceData {
    pub next_to_go_ids: Vec<String>,
    pub race_summaries: RaceCollection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RaceSummary {
    pub race_id: String,
    pub race_number: u32,
    pub meeting_name: String,
    pub category_id: String,
    #[serde(rename = "advertised_start")]
    pub start_time: StartTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct StartTime {
    pub seconds: i64,
}

impl RaceSummary {
    /// Advertised start, in epoch seconds.
    pub fn start_seconds(&self) -> i64 {
        self.start_time.seconds
    }

    pub fn category(&self) -> Option<RaceCategory> {
        RaceCategory::from_id(&self.category_id)
    }

    /// Signed seconds until the advertised start; negative once the jump has passed.
    pub fn seconds_until(&self, now: i64) -> i64 {
        self.start_seconds() - now
    }
}

/// Anything that can hand back a fresh set of races.
///
/// The scheduler only talks to this trait so tests can feed it scripted data.
#[async_trait]
pub trait RaceSource: Send + Sync {
    async fn fetch_races(&self) -> Result<RacesResponse, ApiError>;
}

pub struct RacingClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Default for RacingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RacingClient {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, DEFAULT_TIMEOUT)
    }

    pub fn with_endpoint(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, timeout)
    }

    /// Use a caller-built transport, e.g. one with a proxy or custom TLS roots.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> Result<Url, ApiError> {
        match Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
            _ => Err(ApiError::InvalidUrl {
                url: self.base_url.clone(),
            }),
        }
    }

    /// Issue a single GET against the configured endpoint. No retries.
    pub async fn get_races(&self) -> Result<RacesResponse, ApiError> {
        let url = self.endpoint()?;
        debug!("Fetching races from {}", url);

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(NetworkError::from)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Race feed answered with status {}", status);
            return Err(NetworkError::Status(status.as_u16()).into());
        }

        let body = response.bytes().await.map_err(NetworkError::from)?;
        let races = decode_races(&body)?;

        debug!(
            "Fetched {} race summaries ({} next-to-go ids)",
            races.data.race_summaries.len(),
            races.data.next_to_go_ids.len()
        );
        Ok(races)
    }
}

#[async_trait]
impl RaceSource for RacingClient {
    async fn fetch_races(&self) -> Result<RacesResponse, ApiError> {
        self.get_races().await
    }
}

/// Parse a response body into the race envelope.
pub fn decode_races(body: &[u8]) -> Result<RacesResponse, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::Decoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const VALID_BODY: &str = r#"{
        "status": 200,
        "data": {
            "next_to_go_ids": ["123", "456"],
            "race_summaries": {
                "123": {
                    "race_id": "123",
                    "race_number": 1,
                    "meeting_name": "Horse go go",
                    "category_id": "1",
                    "advertised_start": { "seconds": 1609459200 }
                }
            }
        }
    }"#;

    fn http_response(status: u16, body: &str) -> String {
        let reason = if status == 200 { "OK" } else { "Error" };
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        )
    }

    /// Serve one canned response on an ephemeral port and return its URL.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.flush().await;
                let _ = stream.shutdown().await;
            }
        });

        format!("http://{}/rest/v1/racing/?method=nextraces&count=10", addr)
    }

    /// Accept a connection and never answer.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                tokio::time::sleep(Duration::from_secs(5)).await;
                drop(stream);
            }
        });

        format!("http://{}/", addr)
    }

    #[test]
    fn test_decode_valid_envelope() {
        let races = decode_races(VALID_BODY.as_bytes()).unwrap();
        assert_eq!(races.status, 200);
        assert_eq!(races.data.next_to_go_ids, vec!["123", "456"]);

        let race = &races.data.race_summaries["123"];
        assert_eq!(race.race_number, 1);
        assert_eq!(race.meeting_name, "Horse go go");
        assert_eq!(race.start_seconds(), 1609459200);
        assert_eq!(race.category(), None);
    }

    #[test]
    fn test_decode_accepts_empty_meeting_and_negative_start() {
        let body = r#"{"status":200,"data":{"next_to_go_ids":[],"race_summaries":{
            "a":{"race_id":"a","race_number":3,"meeting_name":"","category_id":"x","advertised_start":{"seconds":-5}}}}}"#;
        let races = decode_races(body.as_bytes()).unwrap();
        let race = &races.data.race_summaries["a"];
        assert!(race.meeting_name.is_empty());
        assert_eq!(race.start_seconds(), -5);
        assert_eq!(race.seconds_until(10), -15);
    }

    #[test]
    fn test_decode_missing_field_is_decoding_error() {
        let body = r#"{"status":200,"data":{"next_to_go_ids":[],"race_summaries":{
            "a":{"race_id":"a","race_number":3,"meeting_name":"M","advertised_start":{"seconds":1}}}}}"#;
        assert!(matches!(decode_races(body.as_bytes()), Err(ApiError::Decoding(_))));
    }

    #[test]
    fn test_decode_type_mismatch_is_decoding_error() {
        let body = r#"{"status":"ok","data":{"next_to_go_ids":[],"race_summaries":{}}}"#;
        assert!(matches!(decode_races(body.as_bytes()), Err(ApiError::Decoding(_))));
    }

    #[tokio::test]
    async fn test_fetch_valid_response() {
        let url = serve_once(http_response(200, VALID_BODY)).await;
        let client = RacingClient::with_endpoint(url, DEFAULT_TIMEOUT);

        let races = client.fetch_races().await.unwrap();
        assert_eq!(races.status, 200);
        assert!(races.data.race_summaries.contains_key("123"));
    }

    #[tokio::test]
    async fn test_fetch_empty_body_is_decoding_error() {
        let url = serve_once(http_response(200, "")).await;
        let client = RacingClient::with_endpoint(url, DEFAULT_TIMEOUT);

        let err = client.fetch_races().await.unwrap_err();
        assert!(matches!(err, ApiError::Decoding(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_malformed_json_is_decoding_error() {
        let url = serve_once(http_response(200, r#"{ "invalid_key": "invalid_value", }"#)).await;
        let client = RacingClient::with_endpoint(url, DEFAULT_TIMEOUT);

        let err = client.fetch_races().await.unwrap_err();
        assert!(matches!(err, ApiError::Decoding(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_non_200_is_network_error() {
        let url = serve_once(http_response(503, VALID_BODY)).await;
        let client = RacingClient::with_endpoint(url, DEFAULT_TIMEOUT);

        let err = client.fetch_races().await.unwrap_err();
        assert!(
            matches!(err, ApiError::Network(NetworkError::Status(503))),
            "got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_network_error() {
        let url = serve_silence().await;
        let client = RacingClient::with_endpoint(url, Duration::from_millis(200));

        let err = client.fetch_races().await.unwrap_err();
        assert!(err.is_timeout(), "got {:?}", err);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RacingClient::with_endpoint(format!("http://{}/", addr), DEFAULT_TIMEOUT);
        let err = client.fetch_races().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let client = RacingClient::with_endpoint("invalidURL", DEFAULT_TIMEOUT);
        let err = client.fetch_races().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }), "got {:?}", err);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_scheme() {
        let client = RacingClient::with_endpoint("ftp://example.com/races", DEFAULT_TIMEOUT);
        let err = client.fetch_races().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }), "got {:?}", err);
    }
}
