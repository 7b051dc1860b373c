//! Language-model access: one prompt in, one message out.
//!
//! Both generators only need "invoke with prompt, get message", so the seam
//! is the small [`ChatModel`] trait rather than a full provider API.
//! [`ProviderChat`] adapts any `edgequake-llm` provider to it: either one
//! selected by name (`openai`, `anthropic`, `gemini`, `ollama`, …) or an
//! [`OpenAIProvider`] pointed at an OpenAI-compatible base URL. The default
//! targets Groq.

use crate::config::PipelineConfig;
use crate::error::Pdf2VoiceError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "llm";

/// A chat model that answers a single user prompt.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send `prompt` as one user message and return the reply text.
    async fn invoke(&self, prompt: &str) -> Result<String, Pdf2VoiceError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

// ── edgequake-llm adapter ────────────────────────────────────────────────

/// [`ChatModel`] backed by an `edgequake-llm` provider.
pub struct ProviderChat {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: CompletionOptions,
    timeout_secs: Option<u64>,
}

impl ProviderChat {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, options: CompletionOptions) -> Self {
        Self {
            provider,
            model: model.into(),
            options,
            timeout_secs: None,
        }
    }

    /// Bound each call; an overrun is a [`Pdf2VoiceError::Timeout`].
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Instantiate a named provider with the given model.
    ///
    /// The provider reads its own API key (`OPENAI_API_KEY`, …) from the
    /// environment.
    pub fn from_name(
        provider_name: &str,
        model: &str,
        options: CompletionOptions,
    ) -> Result<Self, Pdf2VoiceError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            Pdf2VoiceError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider, model, options))
    }

    /// Chat against an OpenAI-compatible endpoint (`{base_url}/chat/completions`).
    pub fn openai_compatible(
        base_url: &str,
        api_key: &str,
        model: &str,
        options: CompletionOptions,
    ) -> Self {
        let provider = OpenAIProvider::compatible(api_key, base_url.trim_end_matches('/')).with_model(model);
        Self::new(Arc::new(provider), model, options)
    }
}

#[async_trait]
impl ChatModel for ProviderChat {
    async fn invoke(&self, prompt: &str) -> Result<String, Pdf2VoiceError> {
        let messages = vec![ChatMessage::user(prompt)];
        let call = self.provider.chat(&messages, Some(&self.options));
        let result = match self.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
                .await
                .map_err(|_| Pdf2VoiceError::Timeout { service: SERVICE, secs })?,
            None => call.await,
        };
        let response = result.map_err(|e| Pdf2VoiceError::LlmApiError {
            message: format!("{e}"),
        })?;

        debug!(
            "{}: {} prompt tokens, {} completion tokens",
            self.model, response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Resolve the chat model, from most-specific to least-specific:
///
/// 1. **Pre-built model** (`config.chat_model`), used as-is.
/// 2. **Named provider** (`config.provider_name`) through `edgequake-llm`.
/// 3. **OpenAI-compatible endpoint** (`config.llm_base_url`, Groq by
///    default) authenticated with `config.llm_api_key`.
pub fn resolve_chat_model(config: &PipelineConfig) -> Result<Arc<dyn ChatModel>, Pdf2VoiceError> {
    if let Some(ref model) = config.chat_model {
        return Ok(Arc::clone(model));
    }

    if let Some(ref name) = config.provider_name {
        let chat = ProviderChat::from_name(name, &config.model, build_options(config))?
            .with_timeout_secs(config.timeout_secs);
        return Ok(Arc::new(chat));
    }

    let api_key = config
        .llm_api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or(Pdf2VoiceError::MissingConfig {
            var: crate::config::env::LLM_API_KEY,
        })?;

    let chat = ProviderChat::openai_compatible(&config.llm_base_url, api_key, &config.model, build_options(config))
        .with_timeout_secs(config.timeout_secs);
    Ok(Arc::new(chat))
}

/// Build `CompletionOptions` from the pipeline config.
fn build_options(config: &PipelineConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_llm::MockProvider;

    fn config() -> PipelineConfig {
        PipelineConfig::builder()
            .extraction_url("http://extract")
            .extraction_api_key("k")
            .llm_api_key("gsk")
            .build()
            .unwrap()
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl ChatModel for Fixed {
        async fn invoke(&self, _prompt: &str) -> Result<String, Pdf2VoiceError> {
            Ok("fixed".into())
        }

        fn model_name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&config());
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, None);
    }

    #[test]
    fn build_options_carries_overrides() {
        let mut cfg = config();
        cfg.temperature = 0.2;
        cfg.max_tokens = Some(512);
        let opts = build_options(&cfg);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(512));
    }

    #[tokio::test]
    async fn provider_chat_returns_provider_content() {
        let provider = Arc::new(MockProvider::new());
        provider.add_response("hola").await;
        let chat = ProviderChat::new(provider, "mock-model", CompletionOptions::default());
        assert_eq!(chat.invoke("hi").await.unwrap(), "hola");
        assert_eq!(chat.model_name(), "mock-model");
    }

    struct Stalled;

    #[async_trait]
    impl LLMProvider for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        fn model(&self) -> &str {
            "stalled-model"
        }

        fn max_context_length(&self) -> usize {
            4096
        }

        async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<edgequake_llm::LLMResponse> {
            std::future::pending().await
        }

        async fn complete_with_options(
            &self,
            prompt: &str,
            _options: &CompletionOptions,
        ) -> edgequake_llm::Result<edgequake_llm::LLMResponse> {
            self.complete(prompt).await
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<edgequake_llm::LLMResponse> {
            self.complete("").await
        }
    }

    #[tokio::test]
    async fn provider_chat_times_out() {
        let chat = ProviderChat::new(Arc::new(Stalled), "stalled-model", CompletionOptions::default())
            .with_timeout_secs(1);
        let err = chat.invoke("hi").await.unwrap_err();
        assert!(matches!(err, Pdf2VoiceError::Timeout { service: "llm", secs: 1 }), "got {err:?}");
    }

    #[test]
    fn resolve_prefers_prebuilt_model() {
        let mut cfg = config();
        cfg.chat_model = Some(Arc::new(Fixed("custom-model")));
        let resolved = resolve_chat_model(&cfg).unwrap();
        assert_eq!(resolved.model_name(), "custom-model");
    }

    #[test]
    fn resolve_defaults_to_openai_compatible() {
        let resolved = resolve_chat_model(&config()).unwrap();
        assert_eq!(resolved.model_name(), crate::config::DEFAULT_MODEL);
    }

    #[test]
    fn resolve_without_key_is_missing_config() {
        let mut cfg = config();
        cfg.llm_api_key = None;
        let err = resolve_chat_model(&cfg).err().unwrap();
        assert!(matches!(err, Pdf2VoiceError::MissingConfig { .. }), "got {err:?}");
    }
}
