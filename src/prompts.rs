//! Prompts for the two LLM generation stages.
//!
//! Both prompts embed the extraction JSON verbatim and ask the model to wrap
//! its answer in a labelled fence, which
//! [`crate::pipeline::fence::extract_fenced`] later strips.

use serde_json::Value;

/// Fence label the narrative prompt asks for.
pub const NARRATIVE_FENCE: &str = "text";

/// Fence label the Markdown prompt asks for.
pub const MARKDOWN_FENCE: &str = "markdown";

/// Instruction for the spoken-word English narrative.
///
/// The placeholder `{content}` is replaced with the extraction JSON.
pub const NARRATIVE_PROMPT_TEMPLATE: &str = r#"Generate a clear, descriptive summary of the following content in English. Focus on creating well-structured paragraphs that flow naturally when read aloud:

Guidelines:
- Present technical terms and equations in a clear, spoken-word format
- Create coherent paragraphs suitable for text-to-speech
- Ensure natural transitions between topics
- Keep the tone professional but accessible
- Format mathematical equations in a way that's easy to understand when read aloud
- Wrap the output in ```text and ``` tags

Content to summarize:
{content}"#;

/// Instruction for the Spanish Markdown rendition.
///
/// The placeholder `{content}` is replaced with the extraction JSON.
pub const MARKDOWN_PROMPT_TEMPLATE: &str = r#"Convert the following content into a well-structured markdown format while preserving the original information and technical details. Translate the content to Spanish while keeping technical terms in English:

Guidelines:
- Maintain all technical terms (like 'deep learning', 'embedding'), numbers, and mathematical formulas in English exactly as they appear
- Translate all non-technical content to Spanish
- Preserve the hierarchical structure of the content
- Use appropriate markdown syntax for:
  * Headers (using #, ##, ###)
  * Lists (using - or * for bullets)
  * Code blocks (using ```)
  * Mathematical equations in md format ($inline$ and $$display$$)
- Keep all references and citations in their original format
- Generate tables info, their contents, and abbreviations in English
- Ensure the output is wrapped in ```markdown and ``` tags

Content to format:
{content}"#;

/// Build the narrative prompt for an extraction result.
pub fn narrative_prompt(extraction: &Value) -> String {
    NARRATIVE_PROMPT_TEMPLATE.replace("{content}", &extraction.to_string())
}

/// Build the Markdown prompt for an extraction result.
pub fn markdown_prompt(extraction: &Value) -> String {
    MARKDOWN_PROMPT_TEMPLATE.replace("{content}", &extraction.to_string())
}
