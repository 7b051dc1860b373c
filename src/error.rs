//! Error types for the edgequake-pdf2voice library.
//!
//! Every stage returns `Result<_, Pdf2VoiceError>`. A stage never retries and
//! never hands back a partial artifact: the pipeline stops at the first error
//! and returns it unchanged, so the caller sees exactly which stage failed and
//! why.
//!
//! Variants are grouped by [`ErrorKind`] so callers that only care about the
//! category (show a generic message, decide whether re-submitting the same
//! file could help) can match on [`Pdf2VoiceError::kind`] instead of the full
//! variant list.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`Pdf2VoiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Missing or empty input file, empty synthesis text.
    Input,
    /// Network failure, timeout, or a non-2xx HTTP status.
    Transport,
    /// Structured rejection from a service (HTTP 422 from the extractor).
    Validation,
    /// A response body that should have been JSON was not.
    Decode,
    /// A successful call that produced no usable payload.
    EmptyResult,
    /// Required configuration is missing or invalid.
    Config,
    /// Local filesystem failure while staging or persisting artifacts.
    Io,
    /// Unexpected internal error.
    Internal,
}

/// All errors returned by the edgequake-pdf2voice library.
#[derive(Debug, Error)]
pub enum Pdf2VoiceError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but has zero length.
    #[error("File is empty: '{path}'")]
    EmptyFile { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// Text handed to the speech synthesizer was empty after trimming.
    #[error("Text to synthesise is empty")]
    EmptyText,

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request could not be sent or the response could not be read.
    #[error("{service} request failed: {reason}")]
    RequestFailed {
        service: &'static str,
        reason: String,
    },

    /// The request exceeded the configured client timeout.
    #[error("{service} request timed out after {secs}s\nIncrease --timeout.")]
    Timeout { service: &'static str, secs: u64 },

    /// The service answered with a non-2xx status.
    #[error("{service} returned HTTP {status}: {body}")]
    HttpStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The language-model provider reported an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The speech service reported an error event.
    #[error("Speech synthesis failed: {message}")]
    SpeechFailed { message: String },

    // ── Validation errors ─────────────────────────────────────────────────
    /// The extraction API rejected the document (HTTP 422).
    #[error(
        "PDF processing failed (422): {detail}. \
Please ensure the PDF is valid and not corrupted."
    )]
    Unprocessable { detail: String },

    // ── Decode errors ─────────────────────────────────────────────────────
    /// A response body was expected to be JSON but was not.
    #[error("Invalid JSON response from {service}: {detail}")]
    InvalidJson {
        service: &'static str,
        detail: String,
    },

    /// A response was valid JSON but did not have the expected shape.
    #[error("Unexpected response from {service}: {detail}")]
    UnexpectedResponse {
        service: &'static str,
        detail: String,
    },

    // ── Empty-result errors ───────────────────────────────────────────────
    /// A technically successful call yielded nothing usable.
    #[error("Empty response from {service}")]
    EmptyResponse { service: &'static str },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A required environment variable is absent or blank.
    #[error("Missing required configuration: {var} is not set")]
    MissingConfig { var: &'static str },

    /// The named LLM provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not stage a file inside the request workspace.
    #[error("Failed to stage '{path}': {source}")]
    StagingFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2VoiceError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::EmptyFile { .. }
            | Self::InvalidInput { .. }
            | Self::EmptyText => ErrorKind::Input,
            Self::RequestFailed { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::LlmApiError { .. }
            | Self::SpeechFailed { .. } => ErrorKind::Transport,
            Self::Unprocessable { .. } => ErrorKind::Validation,
            Self::InvalidJson { .. } | Self::UnexpectedResponse { .. } => ErrorKind::Decode,
            Self::EmptyResponse { .. } => ErrorKind::EmptyResult,
            Self::MissingConfig { .. }
            | Self::ProviderNotConfigured { .. }
            | Self::InvalidConfig(_) => ErrorKind::Config,
            Self::StagingFailed { .. } | Self::OutputWriteFailed { .. } => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Map a `reqwest` error onto the transport variants.
    pub(crate) fn from_reqwest(service: &'static str, timeout_secs: u64, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                service,
                secs: timeout_secs,
            }
        } else {
            Self::RequestFailed {
                service,
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprocessable_display_carries_detail() {
        let e = Pdf2VoiceError::Unprocessable {
            detail: "File is encrypted".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("422"), "got: {msg}");
        assert!(msg.contains("File is encrypted"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Validation);
    }

    #[test]
    fn http_status_display() {
        let e = Pdf2VoiceError::HttpStatus {
            service: "extraction",
            status: 503,
            body: "overloaded".into(),
        };
        assert!(e.to_string().contains("HTTP 503"));
        assert_eq!(e.kind(), ErrorKind::Transport);
    }

    #[test]
    fn missing_config_names_variable() {
        let e = Pdf2VoiceError::MissingConfig {
            var: "LANDING_AI_API_KEY",
        };
        assert!(e.to_string().contains("LANDING_AI_API_KEY"));
        assert_eq!(e.kind(), ErrorKind::Config);
    }

    #[test]
    fn input_and_empty_kinds() {
        assert_eq!(Pdf2VoiceError::EmptyText.kind(), ErrorKind::Input);
        assert_eq!(
            Pdf2VoiceError::EmptyFile {
                path: PathBuf::from("a.pdf")
            }
            .kind(),
            ErrorKind::Input
        );
        assert_eq!(
            Pdf2VoiceError::EmptyResponse {
                service: "extraction"
            }
            .kind(),
            ErrorKind::EmptyResult
        );
        assert_eq!(
            Pdf2VoiceError::InvalidJson {
                service: "extraction",
                detail: "expected value".into()
            }
            .kind(),
            ErrorKind::Decode
        );
    }

    #[test]
    fn timeout_display() {
        let e = Pdf2VoiceError::Timeout {
            service: "speech",
            secs: 120,
        };
        assert!(e.to_string().contains("120s"));
        assert!(e.to_string().contains("speech"));
    }
}
