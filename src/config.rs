//! Configuration types for the PDF-to-voice pipeline.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built via
//! its [`PipelineConfigBuilder`] or read from the process environment with
//! [`PipelineConfig::from_env`]. Credentials are validated when the config is
//! built, so a missing key fails before any file is staged or any request is
//! sent.

use crate::error::Pdf2VoiceError;
use crate::pipeline::llm::ChatModel;
use crate::pipeline::speech::SpeechBackend;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default chat model served by Groq.
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

/// Groq's OpenAI-compatible API root.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Hugging Face space hosting Kokoro TTS.
pub const DEFAULT_TTS_SPACE_URL: &str = "https://remsky-kokoro-tts-zero.hf.space";

/// Gradio endpoint of the Kokoro space that turns text into speech.
pub const DEFAULT_TTS_API_NAME: &str = "/generate_speech_from_ui";

/// Environment variables read by [`PipelineConfig::from_env`].
pub mod env {
    pub const EXTRACTION_URL: &str = "LANDING_AI_URL";
    pub const EXTRACTION_API_KEY: &str = "LANDING_AI_API_KEY";
    pub const LLM_API_KEY: &str = "GROQ_API_KEY";
    pub const LLM_BASE_URL: &str = "GROQ_BASE_URL";
    pub const MODEL: &str = "PDF2VOICE_MODEL";
    pub const PROVIDER: &str = "PDF2VOICE_PROVIDER";
    pub const TTS_SPACE_URL: &str = "PDF2VOICE_TTS_SPACE";
    pub const HF_TOKEN: &str = "HF_TOKEN";
}

/// Configuration for one pipeline instance.
///
/// # Example
/// ```rust
/// use edgequake_pdf2voice::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .extraction_url("https://api.va.landing.ai/v1/tools/agentic-document-analysis")
///     .extraction_api_key("landing-key")
///     .llm_api_key("gsk_test")
///     .voice("af_nova")
///     .build()
///     .unwrap();
/// assert_eq!(config.speed, 1.0);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Document-extraction endpoint (multipart POST).
    pub extraction_url: String,

    /// Credential sent as `Authorization: Basic <key>` to the extractor.
    pub extraction_api_key: String,

    /// API key for the OpenAI-compatible chat endpoint.
    pub llm_api_key: Option<String>,

    /// Root of the OpenAI-compatible chat API. Default: Groq.
    pub llm_base_url: String,

    /// Chat model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Name of an `edgequake-llm` provider ("openai", "anthropic", "ollama", …).
    /// When set, it replaces the OpenAI-compatible client and reads its own
    /// API key from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed chat model. Takes precedence over `provider_name`.
    pub chat_model: Option<Arc<dyn ChatModel>>,

    /// Sampling temperature for both generators. Default: 0.7.
    pub temperature: f32,

    /// Output token cap per generation. `None` leaves it to the provider.
    pub max_tokens: Option<usize>,

    /// Gradio space serving the speech endpoint.
    pub tts_space_url: String,

    /// Gradio API name of the speech endpoint.
    pub tts_api_name: String,

    /// Optional Hugging Face token for private or rate-limited spaces.
    pub hf_token: Option<String>,

    /// Pre-constructed speech backend. Takes precedence over the Gradio space.
    pub speech_backend: Option<Arc<dyn SpeechBackend>>,

    /// Voice name passed to the synthesizer. `None` uses the service default.
    pub voice: Option<String>,

    /// Speech speed multiplier. Range: 0.5–2.0. Default: 1.0.
    pub speed: f32,

    /// Run the speech stage after the generators. Default: true.
    pub synthesize_speech: bool,

    /// Per-request HTTP timeout in seconds. Default: 120.
    ///
    /// Extraction of a dense page and a 70B reasoning model can each take
    /// well over a minute; shorter timeouts cut off healthy requests.
    pub timeout_secs: u64,

    /// Directory under which per-request workspaces are created.
    /// `None` uses the system temp directory.
    pub workspace_root: Option<PathBuf>,

    /// Optional stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction_url: String::new(),
            extraction_api_key: String::new(),
            llm_api_key: None,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            chat_model: None,
            temperature: 0.7,
            max_tokens: None,
            tts_space_url: DEFAULT_TTS_SPACE_URL.to_string(),
            tts_api_name: DEFAULT_TTS_API_NAME.to_string(),
            hf_token: None,
            speech_backend: None,
            voice: None,
            speed: 1.0,
            synthesize_speech: true,
            timeout_secs: 120,
            workspace_root: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("extraction_url", &self.extraction_url)
            .field("extraction_api_key", &redact(&self.extraction_api_key))
            .field("llm_api_key", &self.llm_api_key.as_deref().map(redact))
            .field("llm_base_url", &self.llm_base_url)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("chat_model", &self.chat_model.as_ref().map(|_| "<dyn ChatModel>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("tts_space_url", &self.tts_space_url)
            .field("tts_api_name", &self.tts_api_name)
            .field(
                "speech_backend",
                &self.speech_backend.as_ref().map(|_| "<dyn SpeechBackend>"),
            )
            .field("voice", &self.voice)
            .field("speed", &self.speed)
            .field("synthesize_speech", &self.synthesize_speech)
            .field("timeout_secs", &self.timeout_secs)
            .field("workspace_root", &self.workspace_root)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from the process environment.
    ///
    /// `LANDING_AI_URL` and `LANDING_AI_API_KEY` are required; `GROQ_API_KEY`
    /// is required unless `PDF2VOICE_PROVIDER` names an `edgequake-llm`
    /// provider. Blank values count as missing.
    pub fn from_env() -> Result<Self, Pdf2VoiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Pdf2VoiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(Pdf2VoiceError::MissingConfig { var: key });

        let mut builder = Self::builder()
            .extraction_url(require(env::EXTRACTION_URL)?)
            .extraction_api_key(require(env::EXTRACTION_API_KEY)?);

        if let Some(key) = get(env::LLM_API_KEY) {
            builder = builder.llm_api_key(key);
        }
        if let Some(url) = get(env::LLM_BASE_URL) {
            builder = builder.llm_base_url(url);
        }
        if let Some(model) = get(env::MODEL) {
            builder = builder.model(model);
        }
        if let Some(provider) = get(env::PROVIDER) {
            builder = builder.provider_name(provider);
        }
        if let Some(space) = get(env::TTS_SPACE_URL) {
            builder = builder.tts_space_url(space);
        }
        if let Some(token) = get(env::HF_TOKEN) {
            builder = builder.hf_token(token);
        }

        builder.build()
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl fmt::Debug for PipelineConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineConfigBuilder {
    pub fn extraction_url(mut self, url: impl Into<String>) -> Self {
        self.config.extraction_url = url.into();
        self
    }

    pub fn extraction_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.extraction_api_key = key.into();
        self
    }

    pub fn llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.llm_api_key = Some(key.into());
        self
    }

    pub fn llm_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.llm_base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.config.chat_model = Some(model);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn tts_space_url(mut self, url: impl Into<String>) -> Self {
        self.config.tts_space_url = url.into();
        self
    }

    pub fn tts_api_name(mut self, name: impl Into<String>) -> Self {
        self.config.tts_api_name = name.into();
        self
    }

    pub fn hf_token(mut self, token: impl Into<String>) -> Self {
        self.config.hf_token = Some(token.into());
        self
    }

    pub fn speech_backend(mut self, backend: Arc<dyn SpeechBackend>) -> Self {
        self.config.speech_backend = Some(backend);
        self
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.config.voice = Some(voice.into());
        self
    }

    pub fn speed(mut self, speed: f32) -> Self {
        self.config.speed = speed.clamp(0.5, 2.0);
        self
    }

    pub fn synthesize_speech(mut self, v: bool) -> Self {
        self.config.synthesize_speech = v;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn workspace_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.workspace_root = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Pdf2VoiceError> {
        let c = &self.config;
        if c.extraction_url.trim().is_empty() {
            return Err(Pdf2VoiceError::MissingConfig {
                var: env::EXTRACTION_URL,
            });
        }
        if c.extraction_api_key.trim().is_empty() {
            return Err(Pdf2VoiceError::MissingConfig {
                var: env::EXTRACTION_API_KEY,
            });
        }
        let has_llm_key = c
            .llm_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if c.chat_model.is_none() && c.provider_name.is_none() && !has_llm_key {
            return Err(Pdf2VoiceError::MissingConfig {
                var: env::LLM_API_KEY,
            });
        }
        if c.model.trim().is_empty() {
            return Err(Pdf2VoiceError::InvalidConfig("model must not be empty".into()));
        }
        if !c.speed.is_finite() {
            return Err(Pdf2VoiceError::InvalidConfig(format!(
                "speed must be a finite number, got {}",
                c.speed
            )));
        }
        if c.timeout_secs == 0 {
            return Err(Pdf2VoiceError::InvalidConfig(
                "timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
