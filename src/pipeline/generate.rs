//! The two generation stages: Spanish Markdown and English narrative.
//!
//! Each stage is one prompt, one model call, one fence extraction. A reply
//! that is empty after extraction is an error: there is nothing to show or
//! to read aloud.

use crate::error::Pdf2VoiceError;
use crate::pipeline::extract::ExtractionResult;
use crate::pipeline::fence::{extract_fenced, FencedText};
use crate::pipeline::llm::ChatModel;
use crate::prompts::{markdown_prompt, narrative_prompt, MARKDOWN_FENCE, NARRATIVE_FENCE};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Generate the English spoken-word narrative.
pub async fn generate_narrative(
    model: &dyn ChatModel,
    extraction: &ExtractionResult,
) -> Result<FencedText, Pdf2VoiceError> {
    let prompt = narrative_prompt(extraction.as_value());
    generate(model, &prompt, NARRATIVE_FENCE).await
}

/// Generate the Spanish Markdown rendition.
///
/// When `destination` is given the Markdown is also written there, creating
/// parent directories as needed.
pub async fn generate_markdown(
    model: &dyn ChatModel,
    extraction: &ExtractionResult,
    destination: Option<&Path>,
) -> Result<FencedText, Pdf2VoiceError> {
    let prompt = markdown_prompt(extraction.as_value());
    let markdown = generate(model, &prompt, MARKDOWN_FENCE).await?;

    if let Some(path) = destination {
        write_atomic(path, markdown.as_str()).await?;
        info!("Markdown file saved successfully at: {}", path.display());
    }

    Ok(markdown)
}

async fn generate(
    model: &dyn ChatModel,
    prompt: &str,
    fence: &str,
) -> Result<FencedText, Pdf2VoiceError> {
    debug!(
        "Invoking {} for '{}' output ({} prompt chars)",
        model.model_name(),
        fence,
        prompt.len()
    );
    let response = model.invoke(prompt).await?;
    let fenced = extract_fenced(&response, fence);

    if !fenced.fence_found {
        warn!(
            "Model reply has no ```{} fence; using the raw response ({} chars)",
            fence,
            response.len()
        );
    }
    if fenced.text.trim().is_empty() {
        return Err(Pdf2VoiceError::EmptyResponse { service: "llm" });
    }
    Ok(fenced)
}

/// Write `contents` to `path` through a uniquely named temp file in the
/// same directory, renamed into place once complete.
pub(crate) async fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), Pdf2VoiceError> {
    let path = path.to_path_buf();
    let contents = contents.as_ref().to_vec();
    tokio::task::spawn_blocking(move || persist_atomic(&path, &contents))
        .await
        .map_err(|e| Pdf2VoiceError::Internal(format!("write task failed: {e}")))?
}

fn persist_atomic(path: &Path, contents: &[u8]) -> Result<(), Pdf2VoiceError> {
    let write_err = |e: std::io::Error| Pdf2VoiceError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(contents).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies with a fixed string and records the prompts it saw.
    struct CannedModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn invoke(&self, prompt: &str) -> Result<String, Pdf2VoiceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn invoke(&self, _prompt: &str) -> Result<String, Pdf2VoiceError> {
            Err(Pdf2VoiceError::LlmApiError {
                message: "rate limited".into(),
            })
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn extraction() -> ExtractionResult {
        ExtractionResult::new(json!({"pages": [{"text": "Hello"}]})).unwrap()
    }

    #[tokio::test]
    async fn markdown_scenario_hola() {
        let model = CannedModel::new("```markdown\n# Hola\n```");
        let md = generate_markdown(&model, &extraction(), None).await.unwrap();
        assert_eq!(md.text, "# Hola");
        assert!(md.fence_found);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(r#"{"pages":[{"text":"Hello"}]}"#));
    }

    #[tokio::test]
    async fn markdown_without_fence_is_raw() {
        let raw = "# Hola\n\nSin bloque.";
        let model = CannedModel::new(raw);
        let md = generate_markdown(&model, &extraction(), None).await.unwrap();
        assert_eq!(md.text, raw);
        assert!(!md.fence_found);
    }

    #[tokio::test]
    async fn narrative_fence_extracted() {
        let model = CannedModel::new("Sure.\n```text\nThe paper says hello.\n```");
        let text = generate_narrative(&model, &extraction()).await.unwrap();
        assert_eq!(text.text, "The paper says hello.");
    }

    #[tokio::test]
    async fn narrative_ignores_markdown_fence() {
        let raw = "```markdown\n# Not narrative\n```";
        let model = CannedModel::new(raw);
        let text = generate_narrative(&model, &extraction()).await.unwrap();
        assert_eq!(text.text, raw);
        assert!(!text.fence_found);
    }

    #[tokio::test]
    async fn empty_reply_is_an_error() {
        let model = CannedModel::new("   ");
        let err = generate_narrative(&model, &extraction()).await.unwrap_err();
        assert!(matches!(err, Pdf2VoiceError::EmptyResponse { service: "llm" }));
    }

    #[tokio::test]
    async fn model_error_propagates() {
        let err = generate_markdown(&FailingModel, &extraction(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2VoiceError::LlmApiError { .. }));
    }

    #[tokio::test]
    async fn markdown_is_persisted_with_parents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("md_docs/nested/output.md");
        let model = CannedModel::new("```markdown\n# Hola\n```");

        generate_markdown(&model, &extraction(), Some(dest.as_path()))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "# Hola");
        let siblings = std::fs::read_dir(dest.parent().unwrap()).unwrap().count();
        assert_eq!(siblings, 1, "no temp file may be left next to the output");
    }

    #[tokio::test]
    async fn concurrent_writes_to_one_path_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("output.md");

        let (a, b) = tokio::join!(write_atomic(&dest, "first"), write_atomic(&dest, "second"));
        a.unwrap();
        b.unwrap();

        let text = std::fs::read_to_string(&dest).unwrap();
        assert!(text == "first" || text == "second", "got {text:?}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("output.md");
        std::fs::write(&dest, "old").unwrap();

        write_atomic(&dest, "new").await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new");
    }
}
