//! HTTP transport boundary.
//!
//! The client never talks to `reqwest` directly; it goes through the
//! [`Transport`] trait so hosts can supply their own adapter (proxies,
//! recording transports in tests). [`ReqwestTransport`] is the default.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientOptions;
use crate::error::{BeatSaverError, Result};
use crate::progress::RequestOptions;

/// Largest body we pre-allocate for based on `Content-Length`.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Bytes,
    /// Parsed `Retry-After` header, in seconds.
    pub retry_after_secs: Option<u64>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after_secs: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BeatSaverError::ParseError`] on a malformed payload.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Best-effort human readable message for a failed response.
    pub(crate) fn error_message(&self) -> String {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            for field in ["message", "error", "identifier"] {
                if let Some(msg) = json.get(field).and_then(|m| m.as_str()) {
                    return msg.to_string();
                }
            }
        }

        let body = String::from_utf8_lossy(&self.body);
        if body.trim().is_empty() {
            format!("HTTP {}", self.status)
        } else {
            body.into_owned()
        }
    }
}

/// Issues the raw requests a [`BeatSaver`](crate::BeatSaver) client needs.
///
/// Implementations must be safe for concurrent use; the client imposes no
/// queueing. `get` must honour the cancellation token and progress sink in
/// `options`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a GET request and buffer the body.
    async fn get(&self, url: Url, options: &RequestOptions) -> Result<HttpResponse>;

    /// Perform a POST request with a JSON body.
    async fn post_json(&self, url: Url, body: &serde_json::Value) -> Result<HttpResponse>;
}

/// Default [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Build a transport using the User-Agent and timeout from `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the TLS backend
    /// cannot be initialised.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let http = Client::builder()
            .user_agent(options.user_agent()?)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(options.timeout)
            .build()
            .map_err(BeatSaverError::HttpError)?;

        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, options), fields(url = %url))]
    async fn get(&self, url: Url, options: &RequestOptions) -> Result<HttpResponse> {
        if options.is_cancelled() {
            return Err(BeatSaverError::Cancelled);
        }

        let mut progress = options.reporter();
        progress.start();

        tracing::debug!("GET");
        let response = tokio::select! {
            biased;
            () = options.cancelled() => return Err(BeatSaverError::Cancelled),
            response = self.http.get(url).send() => response.map_err(BeatSaverError::HttpError)?,
        };

        let status = response.status().as_u16();
        let retry_after_secs = retry_after(&response);
        let total = response.content_length();

        let capacity = total.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
        let mut body = Vec::with_capacity(capacity);
        let mut stream = response.bytes_stream();

        loop {
            let chunk = tokio::select! {
                biased;
                () = options.cancelled() => return Err(BeatSaverError::Cancelled),
                chunk = stream.next() => chunk,
            };

            match chunk {
                Some(chunk) => {
                    let chunk = chunk.map_err(BeatSaverError::HttpError)?;
                    body.extend_from_slice(&chunk);
                    progress.report_bytes(body.len() as u64, total);
                }
                None => break,
            }
        }

        tracing::debug!(status, bytes = body.len(), "response received");
        let response = HttpResponse {
            status,
            body: Bytes::from(body),
            retry_after_secs,
        };

        // Error statuses never report completion.
        if response.is_success() || response.is_not_found() {
            progress.finish();
        }
        Ok(response)
    }

    #[tracing::instrument(skip(self, body), fields(url = %url))]
    async fn post_json(&self, url: Url, body: &serde_json::Value) -> Result<HttpResponse> {
        tracing::debug!("POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(BeatSaverError::HttpError)?;

        let status = response.status().as_u16();
        let retry_after_secs = retry_after(&response);
        let body = response.bytes().await.map_err(BeatSaverError::HttpError)?;

        Ok(HttpResponse {
            status,
            body,
            retry_after_secs,
        })
    }
}

fn retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
        assert!(HttpResponse::new(404, "").is_not_found());
    }

    #[test]
    fn test_error_message_from_json() {
        let resp = HttpResponse::new(400, r#"{"code": 3, "identifier": "ERR_BAD_TICKET"}"#);
        assert_eq!(resp.error_message(), "ERR_BAD_TICKET");

        let resp = HttpResponse::new(500, r#"{"message": "boom", "identifier": "ERR_X"}"#);
        assert_eq!(resp.error_message(), "boom");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(HttpResponse::new(502, "Bad Gateway").error_message(), "Bad Gateway");
        assert_eq!(HttpResponse::new(503, "").error_message(), "HTTP 503");
    }

    #[test]
    fn test_json_decode_error() {
        let resp = HttpResponse::new(200, "not json");
        let result: Result<serde_json::Value> = resp.json();
        assert!(matches!(result, Err(BeatSaverError::ParseError(_))));
    }
}
