//! Per-request state passed from stage to stage.
//!
//! A [`RequestContext`] owns the request's workspace and every artifact
//! produced so far. Nothing here is shared between requests, and dropping
//! the context removes the workspace directory.

use crate::error::Pdf2VoiceError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::audio::AudioArtifact;
use crate::pipeline::extract::ExtractionResult;
use crate::pipeline::fence::FencedText;
use crate::pipeline::input::RequestWorkspace;
use std::path::{Path, PathBuf};

/// File the narrative is written to before speech synthesis.
pub const NARRATIVE_FILE: &str = "narrative.txt";

/// Artifacts of one conversion request.
#[derive(Debug)]
pub struct RequestContext {
    workspace: RequestWorkspace,
    pub document: Option<PathBuf>,
    pub extraction: Option<ExtractionResult>,
    pub markdown: Option<FencedText>,
    pub narrative: Option<FencedText>,
    pub audio: Option<AudioArtifact>,
    pub stats: ConversionStats,
}

impl RequestContext {
    /// Start a request with a fresh workspace under `root` (system temp
    /// directory when `None`).
    pub fn new(root: Option<&Path>) -> Result<Self, Pdf2VoiceError> {
        Ok(Self {
            workspace: RequestWorkspace::create(root)?,
            document: None,
            extraction: None,
            markdown: None,
            narrative: None,
            audio: None,
            stats: ConversionStats::default(),
        })
    }

    pub fn workspace(&self) -> &RequestWorkspace {
        &self.workspace
    }

    /// Resolved local PDF. Fails if the input stage has not run.
    pub fn document(&self) -> Result<&Path, Pdf2VoiceError> {
        self.document
            .as_deref()
            .ok_or_else(|| missing("document"))
    }

    /// Extraction result. Fails if the extract stage has not run.
    pub fn extraction(&self) -> Result<&ExtractionResult, Pdf2VoiceError> {
        self.extraction.as_ref().ok_or_else(|| missing("extraction"))
    }

    /// Narrative text. Fails if the narrative stage has not run.
    pub fn narrative(&self) -> Result<&FencedText, Pdf2VoiceError> {
        self.narrative.as_ref().ok_or_else(|| missing("narrative"))
    }

    /// Write the narrative into the workspace for the speech stage.
    pub async fn stage_narrative(&self) -> Result<PathBuf, Pdf2VoiceError> {
        let narrative = self.narrative()?;
        self.workspace
            .write_text(NARRATIVE_FILE, &narrative.text)
            .await
    }

    /// Finish the request: remove the workspace and assemble the output.
    pub fn finish(self, total_ms: u64) -> Result<ConversionOutput, Pdf2VoiceError> {
        let Self {
            workspace,
            extraction,
            markdown,
            narrative,
            audio,
            mut stats,
            ..
        } = self;
        workspace.close()?;

        stats.total_ms = total_ms;
        Ok(ConversionOutput {
            extraction: extraction.ok_or_else(|| missing("extraction"))?,
            markdown: markdown.ok_or_else(|| missing("markdown"))?,
            narrative: narrative.ok_or_else(|| missing("narrative"))?,
            audio,
            stats,
        })
    }
}

fn missing(artifact: &str) -> Pdf2VoiceError {
    Pdf2VoiceError::Internal(format!("{artifact} requested before its stage ran"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn narrative_is_staged_in_workspace() {
        let mut ctx = RequestContext::new(None).unwrap();
        assert!(ctx.stage_narrative().await.is_err());

        ctx.narrative = Some(FencedText {
            text: "Hello.".into(),
            fence_found: true,
        });
        let path = ctx.stage_narrative().await.unwrap();
        assert!(path.starts_with(ctx.workspace().path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Hello.");
    }

    #[test]
    fn finish_requires_every_text_artifact() {
        let ctx = RequestContext::new(None).unwrap();
        assert!(matches!(ctx.finish(1), Err(Pdf2VoiceError::Internal(_))));
    }

    #[test]
    fn finish_removes_workspace() {
        let root = tempfile::tempdir().unwrap();
        let mut ctx = RequestContext::new(Some(root.path())).unwrap();
        let dir = ctx.workspace().path().to_path_buf();
        assert!(dir.exists());

        ctx.extraction = Some(ExtractionResult::new(json!({"a": 1})).unwrap());
        ctx.markdown = Some(FencedText {
            text: "# Hola".into(),
            fence_found: true,
        });
        ctx.narrative = Some(FencedText {
            text: "Hello.".into(),
            fence_found: true,
        });
        let out = ctx.finish(7).unwrap();
        assert_eq!(out.stats.total_ms, 7);
        assert!(!dir.exists());
    }

    #[test]
    fn two_requests_never_share_a_workspace() {
        let a = RequestContext::new(None).unwrap();
        let b = RequestContext::new(None).unwrap();
        assert_ne!(a.workspace().path(), b.workspace().path());
    }
}
