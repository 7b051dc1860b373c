//! Document extraction: upload the PDF to the document-understanding API.
//!
//! One multipart POST per document, no retries. The response JSON is kept
//! as an opaque [`serde_json::Value`]; its schema belongs to the external
//! service and is only ever forwarded into the generation prompts.

use crate::error::Pdf2VoiceError;
use crate::pipeline::input::validate_document;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

const SERVICE: &str = "extraction";

/// Longest response body quoted back in an error message.
const MAX_ERROR_BODY: usize = 500;

/// Structured description of a document, as returned by the extractor.
///
/// Guaranteed non-empty: the extractor refuses to build one from `null`,
/// `{}`, `[]`, `""`, `false` or `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult(Value);

impl ExtractionResult {
    /// Wrap a JSON value, rejecting empty ones.
    pub fn new(value: Value) -> Result<Self, Pdf2VoiceError> {
        if is_empty_json(&value) {
            return Err(Pdf2VoiceError::EmptyResponse { service: SERVICE });
        }
        Ok(Self(value))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Client for the document-extraction endpoint.
#[derive(Clone)]
pub struct Extractor {
    client: reqwest::Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Extractor {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            timeout_secs,
        }
    }

    /// Send the PDF at `path` to the extraction API.
    ///
    /// # Errors
    /// - `FileNotFound` / `EmptyFile` before any request is sent
    /// - `Unprocessable` for HTTP 422, carrying the API's `detail`
    /// - `HttpStatus` for any other non-2xx status
    /// - `InvalidJson` when a 2xx body is not JSON
    /// - `EmptyResponse` when the JSON carries nothing
    pub async fn extract(&self, path: &Path) -> Result<ExtractionResult, Pdf2VoiceError> {
        let size = validate_document(path).await?;
        info!("Extracting {} ({} bytes)", path.display(), size);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Pdf2VoiceError::StagingFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| Pdf2VoiceError::Internal(format!("multipart: {e}")))?;
        let form = Form::new().part("pdf", part);

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Basic {}", self.api_key))
            .header("X-Include-Marginalia", "false")
            .header("X-Include-Metadata-In-Markdown", "false")
            .multipart(form)
            .send()
            .await
            .map_err(|e| Pdf2VoiceError::from_reqwest(SERVICE, self.timeout_secs, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Pdf2VoiceError::from_reqwest(SERVICE, self.timeout_secs, e))?;
        debug!("Extraction responded {} with {} bytes", status, body.len());

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(Pdf2VoiceError::Unprocessable {
                detail: unprocessable_detail(&body),
            });
        }
        if !status.is_success() {
            return Err(Pdf2VoiceError::HttpStatus {
                service: SERVICE,
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            warn!("Invalid JSON from extraction API: {}", truncate(&body, MAX_ERROR_BODY));
            Pdf2VoiceError::InvalidJson {
                service: SERVICE,
                detail: e.to_string(),
            }
        })?;

        ExtractionResult::new(value)
    }
}

/// Pull `detail` out of a 422 body; FastAPI may send a string or a list.
fn unprocessable_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "Unknown error".to_string(),
            Some(other) => other.to_string(),
        },
        _ => "Unknown error".to_string(),
    }
}

/// JSON values that carry no content.
pub(crate) fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars).collect();
        out.push('\u{2026}');
        out
    }
}
