//! Transport seam
//!
//! Every call to the service is a POST carrying JSON, a url-encoded form,
//! a multipart upload or nothing at all. `Transport` is the only place
//! that touches the network; the gateway above it is pure translation.

use crate::config::{normalize_base_url, ClientConfig, USER_AGENT};
use crate::error::{AppError, Result};
use crate::models::FileUpload;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde_json::Value;

/// Body of a request
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    /// Binary part named `archivo` plus a JSON part named `json`
    Multipart { metadata: Value, file: FileUpload },
}

/// Status and body text of a reply
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload` to `endpoint` (relative to the service base URL).
    ///
    /// Fails only on transport problems; non-2xx statuses are returned.
    async fn post(&self, endpoint: &str, payload: Payload) -> Result<RawResponse>;
}

/// reqwest-backed transport with fixed connect and request budgets
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Generic(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = Url::parse(&normalize_base_url(&config.api_base_url))
            .map_err(|e| AppError::Generic(format!("Invalid API base URL: {}", e)))?;

        tracing::info!("HTTP transport targeting {}", base_url);

        Ok(Self { client, base_url })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint)
            .map_err(|e| AppError::Generic(format!("Invalid endpoint {}: {}", endpoint, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, payload: Payload) -> Result<RawResponse> {
        let url = self.endpoint_url(endpoint)?;
        tracing::debug!("POST {}", url);

        let request = self.client.post(url);
        let request = match payload {
            Payload::Empty => request,
            Payload::Json(value) => request.json(&value),
            Payload::Form(fields) => request.form(&fields),
            Payload::Multipart { metadata, file } => {
                let size = file.bytes.len();
                let file_part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.mime_type)
                    .map_err(AppError::from_transport)?;
                let json_part = Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(AppError::from_transport)?;

                tracing::debug!("Multipart upload to {} ({} bytes)", endpoint, size);
                request.multipart(Form::new().part("json", json_part).part("archivo", file_part))
            }
        };

        let response = request.send().await.map_err(AppError::from_transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(AppError::from_transport)?;

        if !(200..300).contains(&status) {
            tracing::warn!("{} returned status {}", endpoint, status);
        }

        Ok(RawResponse { status, body })
    }
}
