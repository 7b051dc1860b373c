//! Fence extraction: pull the payload out of a labelled code fence.
//!
//! Both generation prompts ask the model to wrap its answer in
//! ` ```label ... ``` `. Reasoning models often print a preamble (or a
//! `<think>` block) before the fence, so only the fenced interior is kept.
//!
//! When the model ignores the instruction there is no fence to find. The
//! whole response is then returned verbatim and [`FencedText::fence_found`]
//! is `false`, letting callers tell a clean extraction from the fallback.

use crate::prompts::{MARKDOWN_FENCE, NARRATIVE_FENCE};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Text produced by a generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FencedText {
    /// Trimmed fence interior, or the raw response when no fence was found.
    pub text: String,
    /// Whether a labelled fence was found in the response.
    pub fence_found: bool,
}

impl FencedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

static RE_TEXT_FENCE: Lazy<Regex> = Lazy::new(|| fence_regex(NARRATIVE_FENCE).unwrap());

static RE_MARKDOWN_FENCE: Lazy<Regex> = Lazy::new(|| fence_regex(MARKDOWN_FENCE).unwrap());

/// First ` ```label\n … \n``` ` block, non-greedy, spanning lines.
fn fence_regex(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?s)```{}\n(.+?)\n```", regex::escape(label)))
}

/// Extract the interior of the first fence labelled `label`.
///
/// Returns the trimmed interior when a fence is present, otherwise the
/// response unchanged.
pub fn extract_fenced(response: &str, label: &str) -> FencedText {
    let captured = match label {
        NARRATIVE_FENCE => capture(&RE_TEXT_FENCE, response),
        MARKDOWN_FENCE => capture(&RE_MARKDOWN_FENCE, response),
        other => fence_regex(other)
            .ok()
            .and_then(|re| capture(&re, response)),
    };

    match captured {
        Some(text) => FencedText {
            text,
            fence_found: true,
        },
        None => FencedText {
            text: response.to_string(),
            fence_found: false,
        },
    }
}

fn capture(re: &Regex, response: &str) -> Option<String> {
    re.captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
