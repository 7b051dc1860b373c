//! Conversion entry points.
//!
//! A [`Pipeline`] holds the three service clients and runs the stages of a
//! request strictly one after another:
//!
//! ```text
//! Input ─▶ Extract ─▶ Markdown ─▶ Narrative ─▶ Speech (optional)
//! ```
//!
//! The first failing stage ends the request; its error is returned and no
//! partial output is produced. Every request gets its own
//! [`RequestContext`], whose workspace directory is removed when the request
//! ends either way.

use crate::config::PipelineConfig;
use crate::error::Pdf2VoiceError;
use crate::output::ConversionOutput;
use crate::pipeline::audio::fetch_audio;
use crate::pipeline::context::RequestContext;
use crate::pipeline::extract::Extractor;
use crate::pipeline::generate::{generate_markdown, generate_narrative, write_atomic};
use crate::pipeline::input::resolve_input;
use crate::pipeline::llm::{resolve_chat_model, ChatModel};
use crate::pipeline::speech::{resolve_speech_backend, synthesize_file, SpeechBackend};
use crate::progress::Stage;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where the document of a request comes from.
enum Source<'a> {
    /// Local path or HTTP/HTTPS URL.
    Input(&'a str),
    /// In-memory upload.
    Upload { name: &'a str, bytes: &'a [u8] },
}

/// The configured conversion pipeline.
///
/// Cheap to share behind an `Arc`; each call to [`Pipeline::convert`] is an
/// independent request.
pub struct Pipeline {
    config: PipelineConfig,
    client: reqwest::Client,
    extractor: Extractor,
    chat: Arc<dyn ChatModel>,
    speech: Arc<dyn SpeechBackend>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("chat_model", &self.chat.model_name())
            .finish()
    }
}

impl Pipeline {
    /// Build the HTTP client and every service client from `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, Pdf2VoiceError> {
        let client = build_client(config.timeout_secs)?;
        let chat = resolve_chat_model(&config)?;
        let speech = resolve_speech_backend(&config, &client);
        let extractor = Extractor::new(
            client.clone(),
            &config.extraction_url,
            &config.extraction_api_key,
            config.timeout_secs,
        );
        Ok(Self::with_components(config, client, extractor, chat, speech))
    }

    /// Assemble a pipeline from pre-built parts.
    pub fn with_components(
        config: PipelineConfig,
        client: reqwest::Client,
        extractor: Extractor,
        chat: Arc<dyn ChatModel>,
        speech: Arc<dyn SpeechBackend>,
    ) -> Self {
        Self {
            config,
            client,
            extractor,
            chat,
            speech,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert a local PDF or an HTTP/HTTPS URL.
    pub async fn convert(&self, input: &str) -> Result<ConversionOutput, Pdf2VoiceError> {
        info!("Starting conversion: {}", input);
        self.run(Source::Input(input)).await
    }

    /// Convert an uploaded PDF held in memory.
    ///
    /// The bytes are staged in the request workspace under `name` (final
    /// path component only) and removed with it.
    pub async fn convert_upload(
        &self,
        name: &str,
        bytes: &[u8],
    ) -> Result<ConversionOutput, Pdf2VoiceError> {
        info!("Starting conversion of upload {} ({} bytes)", name, bytes.len());
        self.run(Source::Upload { name, bytes }).await
    }

    /// Convert and persist the artifacts.
    ///
    /// Nothing is written unless every stage succeeds. Then the Markdown
    /// goes to `markdown_path` and the audio, when synthesised, to
    /// `audio_path`. Both writes create parent directories and are atomic.
    pub async fn convert_to_files(
        &self,
        input: &str,
        markdown_path: &Path,
        audio_path: Option<&Path>,
    ) -> Result<ConversionOutput, Pdf2VoiceError> {
        info!("Starting conversion: {}", input);
        let output = self.run(Source::Input(input)).await?;

        write_atomic(markdown_path, output.markdown.as_str()).await?;
        info!("Markdown file saved successfully at: {}", markdown_path.display());

        if let (Some(path), Some(audio)) = (audio_path, output.audio.as_ref()) {
            audio.save(path).await?;
        } else if audio_path.is_some() {
            warn!("Audio output requested but speech synthesis is disabled");
        }
        Ok(output)
    }

    async fn run(&self, source: Source<'_>) -> Result<ConversionOutput, Pdf2VoiceError> {
        let total_start = Instant::now();
        let mut ctx = RequestContext::new(self.config.workspace_root.as_deref())?;

        // ── Step 1: Resolve input ────────────────────────────────────────
        let (document, ms) = self
            .stage(Stage::Input, async {
                match source {
                    Source::Input(input) => {
                        resolve_input(input, ctx.workspace(), &self.client, self.config.timeout_secs)
                            .await
                    }
                    Source::Upload { name, bytes } => {
                        ctx.workspace().stage_upload(name, bytes).await
                    }
                }
            })
            .await?;
        ctx.document = Some(document);
        ctx.stats.input_ms = ms;

        // ── Step 2: Extract ──────────────────────────────────────────────
        let (extraction, ms) = self
            .stage(Stage::Extract, async {
                self.extractor.extract(ctx.document()?).await
            })
            .await?;
        ctx.extraction = Some(extraction);
        ctx.stats.extract_ms = ms;

        // ── Step 3: Spanish Markdown ─────────────────────────────────────
        let (markdown, ms) = self
            .stage(Stage::Markdown, async {
                generate_markdown(self.chat.as_ref(), ctx.extraction()?, None).await
            })
            .await?;
        if !markdown.fence_found {
            ctx.stats.unfenced_replies += 1;
        }
        ctx.markdown = Some(markdown);
        ctx.stats.markdown_ms = ms;

        // ── Step 4: English narrative ────────────────────────────────────
        let (narrative, ms) = self
            .stage(Stage::Narrative, async {
                generate_narrative(self.chat.as_ref(), ctx.extraction()?).await
            })
            .await?;
        if !narrative.fence_found {
            ctx.stats.unfenced_replies += 1;
        }
        ctx.narrative = Some(narrative);
        ctx.stats.narrative_ms = ms;

        // ── Step 5: Speech ───────────────────────────────────────────────
        if self.config.synthesize_speech {
            let (audio, ms) = self
                .stage(Stage::Speech, async {
                    let narrative_path = ctx.stage_narrative().await?;
                    let output = synthesize_file(
                        self.speech.as_ref(),
                        &narrative_path,
                        self.config.voice.as_deref(),
                        self.config.speed,
                    )
                    .await?;
                    debug!("Speech metrics: {}", output.metrics);
                    fetch_audio(&self.client, &output, self.config.timeout_secs).await
                })
                .await?;
            ctx.audio = Some(audio);
            ctx.stats.speech_ms = Some(ms);
        } else {
            debug!("Speech synthesis disabled; skipping");
        }

        let total_ms = total_start.elapsed().as_millis() as u64;
        let output = ctx.finish(total_ms)?;
        info!("Conversion complete: {}", output.summary());

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_conversion_complete(total_ms);
        }
        Ok(output)
    }

    /// Run one stage, reporting it to the progress callback.
    async fn stage<T, F>(&self, stage: Stage, fut: F) -> Result<(T, u64), Pdf2VoiceError>
    where
        F: Future<Output = Result<T, Pdf2VoiceError>>,
    {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_stage_start(stage);
        }
        debug!("Stage {} started", stage);

        let start = Instant::now();
        let result = fut.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(value) => {
                info!("Stage {} finished in {}ms", stage, elapsed_ms);
                if let Some(cb) = cb {
                    cb.on_stage_complete(stage, elapsed_ms);
                }
                Ok((value, elapsed_ms))
            }
            Err(e) => {
                warn!("Stage {} failed after {}ms: {}", stage, elapsed_ms, e);
                if let Some(cb) = cb {
                    cb.on_stage_error(stage, &e.to_string());
                }
                Err(e)
            }
        }
    }
}

/// Convert a PDF file or URL with a one-off [`Pipeline`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2voice::{convert, PipelineConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::from_env()?;
/// let output = convert("paper.pdf", &config).await?;
/// println!("{}", output.markdown.text);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    input: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<ConversionOutput, Pdf2VoiceError> {
    Pipeline::new(config.clone())?.convert(input.as_ref()).await
}

/// Synchronous wrapper around [`convert`].
///
/// Runs on a private current-thread runtime; must not be called from inside
/// an async context.
pub fn convert_sync(
    input: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<ConversionOutput, Pdf2VoiceError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Pdf2VoiceError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input, config))
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client, Pdf2VoiceError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("pdf2voice/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Pdf2VoiceError::Internal(format!("HTTP client: {e}")))
}
