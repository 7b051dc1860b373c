//! # edgequake-pdf2voice
//!
//! Turn a short PDF into Spanish Markdown and an English spoken-word
//! narrative, then read the narrative aloud.
//!
//! ## Why this crate?
//!
//! Research papers and reports are written to be read, not heard. Equations,
//! tables and citation clutter make plain text-to-speech unbearable. This
//! crate lets a document-understanding API recover the document's
//! structure, asks a language model to rewrite it for two audiences (a
//! Spanish reader and an English listener), and hands the listener's version
//! to a text-to-speech service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file, download URL, or stage an upload
//!  ├─ 2. Extract    multipart upload to the extraction API → JSON
//!  ├─ 3. Markdown   LLM: Spanish Markdown, technical terms kept in English
//!  ├─ 4. Narrative  LLM: English prose written to be read aloud
//!  └─ 5. Speech     TTS (Kokoro on a Gradio space) → audio bytes
//! ```
//!
//! Stages run strictly in order and the first failure ends the request.
//! Each request works in its own temporary directory, deleted when the
//! request ends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2voice::{Pipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // LANDING_AI_URL, LANDING_AI_API_KEY and GROQ_API_KEY
//!     let pipeline = Pipeline::new(PipelineConfig::from_env()?)?;
//!     let output = pipeline.convert("paper.pdf").await?;
//!     println!("{}", output.markdown.text);
//!     if let Some(audio) = output.audio {
//!         audio.save("paper.wav".as_ref()).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2voice` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2voice = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use convert::{convert, convert_sync, Pipeline};
pub use error::{ErrorKind, Pdf2VoiceError};
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::audio::AudioArtifact;
pub use pipeline::extract::{ExtractionResult, Extractor};
pub use pipeline::fence::FencedText;
pub use pipeline::generate::{generate_markdown, generate_narrative};
pub use pipeline::llm::{ChatModel, ProviderChat};
pub use pipeline::speech::{synthesize, GradioSpeech, SpeechBackend, SpeechOutput, SpeechRequest};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
