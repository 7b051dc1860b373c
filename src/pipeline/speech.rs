//! Speech synthesis: narrative text in, audio handle out.
//!
//! [`synthesize`] validates the text and hands it to a [`SpeechBackend`].
//! The shipped backend, [`GradioSpeech`], drives a Kokoro TTS space through
//! Gradio's two-step HTTP API:
//!
//! ```text
//! POST {space}/gradio_api/call/{api}            {"data": [text, voice, speed]}
//!   ◀─ {"event_id": "…"}
//! GET  {space}/gradio_api/call/{api}/{event_id}
//!   ◀─ event: complete
//!      data: [audio, metrics, performance_summary]
//! ```
//!
//! The backend's triple is returned as-is; nothing is retried.

use crate::config::PipelineConfig;
use crate::error::Pdf2VoiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const SERVICE: &str = "speech";

/// Input to a speech backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    /// Voice name; `None` lets the service pick its default.
    pub voice: Option<String>,
    pub speed: f32,
}

/// What the speech service returns, unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOutput {
    /// URL or local path of the generated audio.
    pub audio_path: String,
    /// Service-defined performance metrics.
    pub metrics: Value,
    /// Human-readable performance summary.
    pub performance_summary: String,
}

/// A text-to-speech service.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Make exactly one synthesis call.
    async fn generate(&self, request: &SpeechRequest) -> Result<SpeechOutput, Pdf2VoiceError>;
}

/// Synthesise `text` with the given voice and speed.
///
/// Empty (or whitespace-only) text fails with [`Pdf2VoiceError::EmptyText`]
/// without contacting the backend.
pub async fn synthesize(
    backend: &dyn SpeechBackend,
    text: &str,
    voice: Option<&str>,
    speed: f32,
) -> Result<SpeechOutput, Pdf2VoiceError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Pdf2VoiceError::EmptyText);
    }

    let request = SpeechRequest {
        text: text.to_string(),
        voice: voice.map(str::to_string),
        speed,
    };
    debug!(
        "Synthesising {} chars (voice={:?}, speed={})",
        request.text.len(),
        request.voice,
        request.speed
    );

    let output = backend.generate(&request).await?;
    info!("Audio generated successfully: {}", output.audio_path);
    info!("Performance summary: {}", output.performance_summary);
    Ok(output)
}

/// Read a text file and synthesise its trimmed contents.
pub async fn synthesize_file(
    backend: &dyn SpeechBackend,
    path: &Path,
    voice: Option<&str>,
    speed: f32,
) -> Result<SpeechOutput, Pdf2VoiceError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Pdf2VoiceError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2VoiceError::StagingFailed {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    synthesize(backend, text.trim(), voice, speed).await
}

// ── Gradio backend ───────────────────────────────────────────────────────

/// [`SpeechBackend`] for a Gradio app (e.g. a Hugging Face space).
#[derive(Clone)]
pub struct GradioSpeech {
    client: reqwest::Client,
    space_url: String,
    api_name: String,
    hf_token: Option<String>,
    timeout_secs: u64,
}

impl GradioSpeech {
    pub fn new(client: reqwest::Client, space_url: impl Into<String>, api_name: impl Into<String>) -> Self {
        Self {
            client,
            space_url: space_url.into(),
            api_name: api_name.into(),
            hf_token: None,
            timeout_secs: 120,
        }
    }

    pub fn with_hf_token(mut self, token: Option<String>) -> Self {
        self.hf_token = token;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn call_url(&self) -> String {
        format!(
            "{}/gradio_api/call/{}",
            self.space_url.trim_end_matches('/'),
            self.api_name.trim_start_matches('/')
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.hf_token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<String, Pdf2VoiceError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Pdf2VoiceError::from_reqwest(SERVICE, self.timeout_secs, e))?;
        if !status.is_success() {
            return Err(Pdf2VoiceError::HttpStatus {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl SpeechBackend for GradioSpeech {
    async fn generate(&self, request: &SpeechRequest) -> Result<SpeechOutput, Pdf2VoiceError> {
        let call_url = self.call_url();
        let payload = json!({ "data": [request.text, request.voice, request.speed] });

        let response = self
            .authorize(self.client.post(&call_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Pdf2VoiceError::from_reqwest(SERVICE, self.timeout_secs, e))?;
        let body = self.read_body(response).await?;
        let event_id = parse_event_id(&body)?;
        debug!("Gradio queued event {}", event_id);

        let response = self
            .authorize(self.client.get(format!("{call_url}/{event_id}")))
            .send()
            .await
            .map_err(|e| Pdf2VoiceError::from_reqwest(SERVICE, self.timeout_secs, e))?;
        let stream = self.read_body(response).await?;

        let data = parse_sse_result(&stream)?;
        parse_output(&data)
    }
}

/// Use `config.speech_backend` when set, otherwise the configured Gradio space.
pub fn resolve_speech_backend(config: &PipelineConfig, client: &reqwest::Client) -> Arc<dyn SpeechBackend> {
    if let Some(ref backend) = config.speech_backend {
        return Arc::clone(backend);
    }
    Arc::new(
        GradioSpeech::new(client.clone(), &config.tts_space_url, &config.tts_api_name)
            .with_hf_token(config.hf_token.clone())
            .with_timeout_secs(config.timeout_secs),
    )
}

fn parse_event_id(body: &str) -> Result<String, Pdf2VoiceError> {
    let value: Value = serde_json::from_str(body).map_err(|e| Pdf2VoiceError::InvalidJson {
        service: SERVICE,
        detail: e.to_string(),
    })?;
    value
        .get("event_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Pdf2VoiceError::UnexpectedResponse {
            service: SERVICE,
            detail: format!("no event_id in {value}"),
        })
}

/// Find the `complete` (or `error`) event in a Gradio SSE body.
fn parse_sse_result(stream: &str) -> Result<Value, Pdf2VoiceError> {
    let mut event = "";
    for line in stream.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            match event {
                "complete" => {
                    return serde_json::from_str(data).map_err(|e| Pdf2VoiceError::InvalidJson {
                        service: SERVICE,
                        detail: e.to_string(),
                    });
                }
                "error" => {
                    let message = match serde_json::from_str::<Value>(data) {
                        Ok(Value::String(s)) => s,
                        Ok(Value::Null) | Err(_) if data.is_empty() || data == "null" => {
                            "the space reported an error without details".to_string()
                        }
                        _ => data.to_string(),
                    };
                    return Err(Pdf2VoiceError::SpeechFailed { message });
                }
                _ => {}
            }
        }
    }
    Err(Pdf2VoiceError::EmptyResponse { service: SERVICE })
}

/// Map Gradio's `[audio, metrics, summary]` onto [`SpeechOutput`].
fn parse_output(data: &Value) -> Result<SpeechOutput, Pdf2VoiceError> {
    let items = data
        .as_array()
        .filter(|a| a.len() >= 3)
        .ok_or_else(|| Pdf2VoiceError::UnexpectedResponse {
            service: SERVICE,
            detail: format!("expected [audio, metrics, summary], got {data}"),
        })?;

    let audio_path = match &items[0] {
        Value::String(s) => Some(s.clone()),
        Value::Object(file) => file
            .get("url")
            .and_then(Value::as_str)
            .or_else(|| file.get("path").and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
    .filter(|p| !p.is_empty())
    .ok_or(Pdf2VoiceError::EmptyResponse { service: SERVICE })?;

    let performance_summary = match &items[2] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    Ok(SpeechOutput {
        audio_path,
        metrics: items[1].clone(),
        performance_summary,
    })
}
