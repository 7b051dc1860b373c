//! Result types returned by a conversion.

use crate::pipeline::audio::AudioArtifact;
use crate::pipeline::extract::ExtractionResult;
use crate::pipeline::fence::FencedText;
use serde::Serialize;

/// Everything one conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Raw extraction JSON, as returned by the extraction API.
    pub extraction: ExtractionResult,
    /// Spanish Markdown rendition of the document.
    pub markdown: FencedText,
    /// English spoken-word narrative.
    pub narrative: FencedText,
    /// Synthesised narrative; `None` when speech was disabled.
    pub audio: Option<AudioArtifact>,
    pub stats: ConversionStats,
}

/// Per-stage wall-clock timings, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub input_ms: u64,
    pub extract_ms: u64,
    pub markdown_ms: u64,
    pub narrative_ms: u64,
    /// `None` when speech was disabled.
    pub speech_ms: Option<u64>,
    pub total_ms: u64,
    /// Generation stages whose reply had no fenced block and was used raw.
    pub unfenced_replies: usize,
}

impl ConversionOutput {
    /// Summary line for logs and the CLI.
    pub fn summary(&self) -> String {
        let audio = match self.audio {
            Some(ref a) => format!("{} audio bytes", a.bytes.len()),
            None => "no audio".to_string(),
        };
        format!(
            "{} markdown chars, {} narrative chars, {}, {}ms",
            self.markdown.text.chars().count(),
            self.narrative.text.chars().count(),
            audio,
            self.stats.total_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output(audio: Option<AudioArtifact>) -> ConversionOutput {
        ConversionOutput {
            extraction: ExtractionResult::new(json!({"pages": [1]})).unwrap(),
            markdown: FencedText {
                text: "# Hola".into(),
                fence_found: true,
            },
            narrative: FencedText {
                text: "Hello there.".into(),
                fence_found: true,
            },
            audio,
            stats: ConversionStats {
                total_ms: 42,
                ..Default::default()
            },
        }
    }

    #[test]
    fn summary_without_audio() {
        assert_eq!(
            output(None).summary(),
            "6 markdown chars, 12 narrative chars, no audio, 42ms"
        );
    }

    #[test]
    fn serialises_without_audio_bytes() {
        let audio = AudioArtifact {
            bytes: vec![1, 2, 3],
            file_name: "a.wav".into(),
            source: "/tmp/a.wav".into(),
            metrics: json!({}),
            performance_summary: "fast".into(),
        };
        let v = serde_json::to_value(output(Some(audio))).unwrap();
        assert_eq!(v["markdown"]["text"], "# Hola");
        assert_eq!(v["audio"]["file_name"], "a.wav");
        assert!(v["audio"].get("bytes").is_none());
        assert_eq!(v["stats"]["speech_ms"], serde_json::Value::Null);
    }
}
