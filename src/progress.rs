//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to be told
//! when each stage starts, finishes, or fails. The CLI uses it to drive a
//! spinner; a server could forward the same events to a websocket.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2voice::{PipelineProgressCallback, Stage};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct StageLog(Mutex<Vec<Stage>>);
//!
//! impl PipelineProgressCallback for StageLog {
//!     fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the conversion pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Resolve or stage the input PDF.
    Input,
    /// Document-understanding API call.
    Extract,
    /// Spanish Markdown generation.
    Markdown,
    /// English spoken-word narrative generation.
    Narrative,
    /// Text-to-speech call and audio retrieval.
    Speech,
}

impl Stage {
    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Extract => "extract",
            Stage::Markdown => "markdown",
            Stage::Narrative => "narrative",
            Stage::Speech => "speech",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// Stages run strictly one after another, so events never overlap. All
/// methods default to no-ops.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage produced its artifact.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage failed. No later stage will start.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the last stage succeeded.
    fn on_conversion_complete(&self, total_ms: u64) {
        let _ = total_ms;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start:{stage}"));
        }

        fn on_stage_complete(&self, stage: Stage, _elapsed_ms: u64) {
            self.events.lock().unwrap().push(format!("done:{stage}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error:{stage}:{error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Extract);
        cb.on_stage_complete(Stage::Extract, 10);
        cb.on_stage_error(Stage::Markdown, "boom");
        cb.on_conversion_complete(42);
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Extract);
        rec.on_stage_complete(Stage::Extract, 5);
        rec.on_stage_start(Stage::Markdown);
        rec.on_stage_error(Stage::Markdown, "HTTP 500");

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start:extract",
                "done:extract",
                "start:markdown",
                "error:markdown:HTTP 500"
            ]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Speech);
    }
}
