//! Submission gateway for accepted scans.
//!
//! The scanner hands each accepted identifier to a [`SubmissionGateway`]. The
//! HTTP implementation posts a room-entry request to the attendance backend:
//!
//! ```text
//! POST {base_url}/api/RoomEntryRequest/CreateRequest
//! Content-Type: application/json
//!
//! {"nfcId": "04A1B2C3D4E5F6", "roomId": 12}
//! ```
//!
//! Any HTTP response is returned as a [`SubmissionReceipt`]; only a status of
//! 200 counts as delivered. Transport failures (timeout, refused connection)
//! surface as [`GatewayError`]. Neither is retried.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use classtap_core::RoomId;
use classtap_core::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_SUBMIT_TIMEOUT_MS, ROOM_ENTRY_REQUEST_PATH,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Configuration for the HTTP gateway
///
/// # Example
///
/// ```
/// use classtap_network::HttpGatewayConfig;
/// use std::time::Duration;
///
/// let config = HttpGatewayConfig {
///     base_url: "http://192.168.0.10:5000".to_string(),
///     timeout: Duration::from_secs(5),
/// };
/// assert_eq!(
///     config.endpoint(),
///     "http://192.168.0.10:5000/api/RoomEntryRequest/CreateRequest"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Backend base URL, without the request path
    pub base_url: String,

    /// Timeout for the whole request
    pub timeout: Duration,
}

impl HttpGatewayConfig {
    /// Full URL of the room-entry endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            ROOM_ENTRY_REQUEST_PATH
        )
    }
}

impl Default for HttpGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_SUBMIT_TIMEOUT_MS),
        }
    }
}

/// Errors that prevent a submission from getting any HTTP response
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request did not complete within the configured timeout
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Connection or transport failure
    #[error("Request failed: {0}")]
    Request(String),

    /// HTTP client could not be constructed
    #[error("Client build failed: {0}")]
    ClientBuild(String),
}

/// Response received from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub status_code: u16,
    pub body: String,
}

impl SubmissionReceipt {
    /// Whether the backend accepted the request.
    pub fn is_delivered(&self) -> bool {
        self.status_code == 200
    }
}

/// Destination for accepted scans.
pub trait SubmissionGateway: Send + Sync {
    /// Submit one identifier for a room.
    ///
    /// # Errors
    /// Returns an error only when no HTTP response was obtained.
    async fn submit(
        &self,
        identifier: &str,
        room_id: RoomId,
    ) -> Result<SubmissionReceipt, GatewayError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomEntryRequest<'a> {
    nfc_id: &'a str,
    room_id: i32,
}

/// reqwest-backed gateway posting JSON room-entry requests.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpGateway {
    /// Build a gateway with its own connection pool.
    ///
    /// # Errors
    /// Returns [`GatewayError::ClientBuild`] if the TLS backend cannot initialize.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::ClientBuild(e.to_string()))?;

        let endpoint = config.endpoint();
        debug!("Created HTTP gateway for {}", endpoint);

        Ok(Self {
            http,
            endpoint,
            timeout: config.timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl SubmissionGateway for HttpGateway {
    async fn submit(
        &self,
        identifier: &str,
        room_id: RoomId,
    ) -> Result<SubmissionReceipt, GatewayError> {
        let request = RoomEntryRequest {
            nfc_id: identifier,
            room_id: room_id.as_i32(),
        };

        debug!(
            "POST {} nfcId={} roomId={}",
            self.endpoint, identifier, room_id
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Submission of {} timed out after {}ms", identifier, self.timeout_ms());
                    GatewayError::Timeout(self.timeout_ms())
                } else {
                    error!("Submission of {} failed: {}", identifier, e);
                    GatewayError::Request(e.to_string())
                }
            })?;

        let status_code = response.status().as_u16();
        // A body that fails to decode still leaves a usable status code
        let body = response.text().await.unwrap_or_default();
        let receipt = SubmissionReceipt { status_code, body };

        if receipt.is_delivered() {
            info!("Entry request for {} in room {} delivered", identifier, room_id);
        } else {
            warn!(
                "Backend rejected {} with status {}: {}",
                identifier, receipt.status_code, receipt.body
            );
        }

        Ok(receipt)
    }
}
