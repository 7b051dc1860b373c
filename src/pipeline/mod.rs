//! Pipeline stages for PDF-to-voice conversion.
//!
//! Each submodule implements exactly one step, so every step can be tested
//! against a mock service without the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ generate (markdown) ──▶ generate (narrative) ──▶ speech ──▶ audio
//! (path/URL) (HTTP API)    (LLM, Spanish)          (LLM, English)         (TTS)    (bytes)
//! ```
//!
//! 1. [`input`]    — resolve a path, URL or upload into the request workspace
//! 2. [`extract`]  — multipart upload to the document-extraction API
//! 3. [`generate`] — prompt the [`llm`] and pull the answer out of its
//!    [`fence`]d block
//! 4. [`speech`]   — hand the narrative to the text-to-speech backend
//! 5. [`audio`]    — load the synthesised audio so it outlives the workspace
//!
//! [`context`] carries the intermediate artifacts of one request between
//! stages.

pub mod audio;
pub mod context;
pub mod extract;
pub mod fence;
pub mod generate;
pub mod input;
pub mod llm;
pub mod speech;
