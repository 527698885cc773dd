//! HTTP remote quote source.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use super::{QuoteUpload, RemoteError, RemoteQuote, RemoteResult, RemoteSource};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Remote source backed by an HTTP endpoint.
///
/// Expects `GET {base}/quotes` to return a JSON array of remote records and
/// `POST {base}/quotes` to accept an upload payload and answer with the
/// assigned identifier.
#[derive(Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(endpoint: impl Into<String>) -> RemoteResult<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let base_url = normalize_endpoint(endpoint.into())?;
        Ok(Self {
            base_url,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    fn quotes_url(&self) -> String {
        format!("{}/quotes", self.base_url)
    }
}

#[async_trait::async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_remote(&self) -> RemoteResult<Vec<RemoteQuote>> {
        let response = self
            .client
            .get(self.quotes_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }

        Ok(response.json::<Vec<RemoteQuote>>().await?)
    }

    async fn upload(&self, upload: &QuoteUpload) -> RemoteResult<String> {
        let response = self
            .client
            .post(self.quotes_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(upload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api(parse_api_error(status, &body)));
        }

        let payload = response.json::<UploadResponse>().await?;
        payload.try_into()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    server_id: Option<String>,
    id: Option<String>,
}

impl TryFrom<UploadResponse> for String {
    type Error = RemoteError;

    fn try_from(value: UploadResponse) -> RemoteResult<Self> {
        value
            .server_id
            .or(value.id)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                RemoteError::InvalidPayload("response did not include server_id/id".to_string())
            })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", compact_text(trimmed), status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> RemoteResult<String> {
    let endpoint = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("endpoint must not be empty".to_string())
    })?;
    if is_http_url(&endpoint) {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}
