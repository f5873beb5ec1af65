// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client capability used by upload handlers and the connectivity probe.
//!
//! Provides a trait-based layer that enables:
//! - A reqwest client with bounded exponential backoff for production
//! - Mock clients for unit testing
//!
//! Transport retries are independent of the queue's per-item retry delay.
//! Only idempotent requests are retried here: `GET`, `PUT`, `DELETE`, and
//! `POST` when it carries an `Idempotency-Key`.

use std::path::PathBuf;
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Error code for connection failures and timeouts.
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
/// Error code for local file access failures during uploads.
pub const IO_ERROR: &str = "IO_ERROR";
/// Error code for unparseable response bodies.
pub const DECODE_ERROR: &str = "DECODE_ERROR";

const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// A failed request, as reported to handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(NETWORK_ERROR, message)
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(format!("HTTP_{status}"), message)
    }

    /// True when the server could not be reached at all.
    pub fn is_network(&self) -> bool {
        self.code == NETWORK_ERROR
    }
}

/// Result type for HTTP client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// A multipart upload: text fields plus one file part read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub fields: Vec<(String, String)>,
    pub file_field: String,
    pub file_path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
}

impl UploadForm {
    pub fn new(file_path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        let file_path = file_path.into();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        UploadForm {
            fields: Vec::new(),
            file_field: "file".to_string(),
            file_path,
            file_name,
            mime_type: mime_type.into(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }
}

/// HTTP client capability.
///
/// `idempotency_key` is the sync item id; implementations may attach it to
/// the request so a retried `POST` is safe to replay.
pub trait HttpClient: Send + Sync {
    fn get(&self, path: &str) -> BoxFuture<'_, ApiResult<Value>>;

    fn post(
        &self,
        path: &str,
        body: Value,
        idempotency_key: Option<&str>,
    ) -> BoxFuture<'_, ApiResult<Value>>;

    fn upload_file(
        &self,
        path: &str,
        form: UploadForm,
        idempotency_key: Option<&str>,
    ) -> BoxFuture<'_, ApiResult<Value>>;
}

/// Bounded exponential backoff for transport retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-indexed): `base * 2^retry`, capped.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Statuses worth retrying on an idempotent request.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Whether a request may be replayed by the transport.
pub fn is_idempotent(method: &Method, has_idempotency_key: bool) -> bool {
    match *method {
        Method::GET | Method::PUT | Method::DELETE => true,
        Method::POST => has_idempotency_key,
        _ => false,
    }
}

/// Configuration for [`ReqwestClient`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub auth_token: Option<String>,
    pub retry: RetryPolicy,
    /// Attach `Idempotency-Key` to POSTs, making them retryable.
    pub idempotency_keys: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            base_url: "http://localhost:3000/api".to_string(),
            timeout: Duration::from_secs(30),
            auth_token: None,
            retry: RetryPolicy::default(),
            idempotency_keys: false,
        }
    }
}

enum Body {
    Empty,
    Json(Value),
    Multipart {
        fields: Vec<(String, String)>,
        file_field: String,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

/// Outcome of a single attempt, before the retry decision.
struct AttemptError {
    error: ApiError,
    transient: bool,
}

/// Production HTTP client built on reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
    config: HttpConfig,
}

impl ReqwestClient {
    pub fn new(config: HttpConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::network(e.to_string()))?;
        Ok(ReqwestClient { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Body,
        idempotency_key: Option<String>,
    ) -> ApiResult<Value> {
        let key = idempotency_key.filter(|_| self.config.idempotency_keys);
        let replayable = is_idempotent(&method, key.is_some());
        let url = self.url(path);
        let mut retry = 0;

        loop {
            match self.attempt(&method, &url, &body, key.as_deref()).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.transient || !replayable || retry >= self.config.retry.max_retries => {
                    return Err(e.error);
                }
                Err(e) => {
                    let delay = self.config.retry.delay_for_retry(retry);
                    tracing::warn!(
                        "{} {} failed (attempt {}/{}), retrying in {}ms: {}",
                        method,
                        path,
                        retry + 1,
                        self.config.retry.max_retries + 1,
                        delay.as_millis(),
                        e.error
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        body: &Body,
        idempotency_key: Option<&str>,
    ) -> Result<Value, AttemptError> {
        let mut request = self.client.request(method.clone(), url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY, key);
        }
        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(value),
            Body::Multipart {
                fields,
                file_field,
                file_name,
                mime_type,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime_type)
                    .map_err(|e| AttemptError {
                        error: ApiError::new(IO_ERROR, e.to_string()),
                        transient: false,
                    })?;
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(name.clone(), value.clone());
                }
                request.multipart(form.part(file_field.clone(), part))
            }
        };

        let response = request.send().await.map_err(|e| AttemptError {
            error: ApiError::network(e.to_string()),
            transient: true,
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AttemptError {
            error: ApiError::network(e.to_string()),
            transient: true,
        })?;

        if status.is_success() {
            return decode_body(&text).map_err(|error| AttemptError {
                error,
                transient: false,
            });
        }

        Err(AttemptError {
            error: error_from_response(status, &text),
            transient: is_retryable_status(status.as_u16()),
        })
    }
}

fn decode_body(text: &str) -> ApiResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ApiError::new(DECODE_ERROR, e.to_string()))
}

/// Builds the error for a non-2xx response, preferring the server's own
/// `code`/`message` fields when the body carries them.
fn error_from_response(status: StatusCode, text: &str) -> ApiError {
    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let body: Option<Value> = serde_json::from_str(text).ok();
    let field = |name: &str| {
        body.as_ref()
            .and_then(|b| b.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let message = field("message")
        .or_else(|| field("error"))
        .unwrap_or(fallback);
    match field("code") {
        Some(code) => ApiError::new(code, message),
        None => ApiError::http(status.as_u16(), message),
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, path: &str) -> BoxFuture<'_, ApiResult<Value>> {
        let path = path.to_string();
        Box::pin(async move { self.execute(Method::GET, &path, Body::Empty, None).await })
    }

    fn post(
        &self,
        path: &str,
        body: Value,
        idempotency_key: Option<&str>,
    ) -> BoxFuture<'_, ApiResult<Value>> {
        let path = path.to_string();
        let key = idempotency_key.map(str::to_string);
        Box::pin(async move { self.execute(Method::POST, &path, Body::Json(body), key).await })
    }

    fn upload_file(
        &self,
        path: &str,
        form: UploadForm,
        idempotency_key: Option<&str>,
    ) -> BoxFuture<'_, ApiResult<Value>> {
        let path = path.to_string();
        let key = idempotency_key.map(str::to_string);
        Box::pin(async move {
            let bytes = tokio::fs::read(&form.file_path).await.map_err(|e| {
                ApiError::new(
                    IO_ERROR,
                    format!("failed to read {}: {e}", form.file_path.display()),
                )
            })?;
            let body = Body::Multipart {
                fields: form.fields,
                file_field: form.file_field,
                file_name: form.file_name,
                mime_type: form.mime_type,
                bytes,
            };
            self.execute(Method::POST, &path, body, key).await
        })
    }
}
