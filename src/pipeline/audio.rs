//! Audio retrieval: turn the synthesizer's handle into bytes in memory.
//!
//! The speech service answers with a URL (remote spaces) or a local path
//! (in-process backends). Either way the audio is loaded into an
//! [`AudioArtifact`] so it outlives the request workspace.

use crate::error::Pdf2VoiceError;
use crate::pipeline::generate::write_atomic;
use crate::pipeline::input::is_url;
use crate::pipeline::speech::SpeechOutput;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

/// Synthesised audio plus the service's performance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioArtifact {
    /// Raw audio bytes (WAV for Kokoro). Not serialised.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Suggested file name, taken from the handle.
    pub file_name: String,
    /// Handle the service returned.
    pub source: String,
    pub metrics: Value,
    pub performance_summary: String,
}

impl AudioArtifact {
    /// Write the audio to `path`, creating parent directories.
    pub async fn save(&self, path: &Path) -> Result<(), Pdf2VoiceError> {
        write_atomic(path, &self.bytes).await?;
        info!("Audio saved to: {}", path.display());
        Ok(())
    }
}

/// Load the audio referenced by `output`.
pub async fn fetch_audio(
    client: &reqwest::Client,
    output: &SpeechOutput,
    timeout_secs: u64,
) -> Result<AudioArtifact, Pdf2VoiceError> {
    let handle = output.audio_path.as_str();
    let bytes = if is_url(handle) {
        download(client, handle, timeout_secs).await?
    } else {
        tokio::fs::read(handle).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Pdf2VoiceError::FileNotFound {
                    path: handle.into(),
                }
            } else {
                Pdf2VoiceError::StagingFailed {
                    path: handle.into(),
                    source: e,
                }
            }
        })?
    };

    if bytes.is_empty() {
        return Err(Pdf2VoiceError::EmptyResponse { service: "speech" });
    }
    debug!("Fetched {} audio bytes from {}", bytes.len(), handle);

    Ok(AudioArtifact {
        bytes,
        file_name: file_name_of(handle),
        source: handle.to_string(),
        metrics: output.metrics.clone(),
        performance_summary: output.performance_summary.clone(),
    })
}

async fn download(client: &reqwest::Client, url: &str, timeout_secs: u64) -> Result<Vec<u8>, Pdf2VoiceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Pdf2VoiceError::from_reqwest("audio download", timeout_secs, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Pdf2VoiceError::HttpStatus {
            service: "audio download",
            status: status.as_u16(),
            body: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2VoiceError::from_reqwest("audio download", timeout_secs, e))?;
    Ok(bytes.to_vec())
}

/// Last path segment of a URL or path; Gradio URLs end in `file=/tmp/…/x.wav`.
fn file_name_of(handle: &str) -> String {
    handle
        .rsplit(['/', '\\', '='])
        .next()
        .filter(|n| !n.is_empty() && n.contains('.'))
        .unwrap_or("speech.wav")
        .to_string()
}
