//! CLI binary for edgequake-pdf2voice.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2voice::config::env;
use edgequake_pdf2voice::{
    ConversionOutput, Pipeline, PipelineConfig, PipelineProgressCallback, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner naming the running stage, with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Input => "Reading document…",
        Stage::Extract => "Extracting document structure…",
        Stage::Markdown => "Writing Spanish Markdown…",
        Stage::Narrative => "Writing English narrative…",
        Stage::Speech => "Synthesising speech…",
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.label());
        self.bar.set_message(stage_message(stage));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<10} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let msg = if error.chars().count() > 80 {
            let head: String = error.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {:<10} {}", red("✗"), stage.label(), red(&msg)));
        self.bar.finish_and_clear();
    }

    fn on_conversion_complete(&self, total_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} converted in {}",
            green("✔"),
            bold(&format!("{:.1}s", total_ms as f64 / 1000.0))
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Spanish Markdown to stdout, audio to a file
  pdf2voice paper.pdf --audio-out paper.wav

  # Markdown to a file, no speech
  pdf2voice paper.pdf -o md_docs/output.md --no-audio

  # Convert from URL with a different voice
  pdf2voice https://arxiv.org/pdf/1706.03762 --voice af_nova --audio-out attention.wav

  # Use an edgequake-llm provider instead of Groq
  pdf2voice --provider openai --model gpt-4.1-mini paper.pdf

  # Full output (extraction, markdown, narrative, stats) as JSON
  pdf2voice --json --no-audio paper.pdf > output.json

ENVIRONMENT VARIABLES:
  LANDING_AI_URL          Document-extraction endpoint (required)
  LANDING_AI_API_KEY      Document-extraction credential (required)
  GROQ_API_KEY            Groq API key (required unless --provider is set)
  GROQ_BASE_URL           OpenAI-compatible API root (default: Groq)
  PDF2VOICE_MODEL         Chat model ID (default: deepseek-r1-distill-llama-70b)
  PDF2VOICE_PROVIDER      edgequake-llm provider: openai, anthropic, gemini, ollama
  PDF2VOICE_TTS_SPACE     Gradio space URL for text-to-speech
  HF_TOKEN                Hugging Face token for private or rate-limited spaces
"#;

/// Turn a PDF into Spanish Markdown and an English audio narrative.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2voice",
    version,
    about = "Turn a PDF into Spanish Markdown and an English audio narrative",
    long_about = "Send a short PDF (local file or URL) to a document-extraction API, ask a \
language model for a Spanish Markdown rendition and an English spoken-word narrative, and \
synthesise the narrative with a Kokoro text-to-speech space.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "PDF2VOICE_OUTPUT")]
    output: Option<PathBuf>,

    /// Write the synthesised audio to this file.
    #[arg(long, env = "PDF2VOICE_AUDIO_OUT")]
    audio_out: Option<PathBuf>,

    /// Also print the English narrative to stderr.
    #[arg(long)]
    show_narrative: bool,

    /// Skip speech synthesis.
    #[arg(long, env = "PDF2VOICE_NO_AUDIO", conflicts_with = "audio_out")]
    no_audio: bool,

    /// TTS voice name (e.g. af_bella, af_nova, am_adam).
    #[arg(long, env = "PDF2VOICE_VOICE")]
    voice: Option<String>,

    /// Speech speed multiplier (0.5–2.0).
    #[arg(long, env = "PDF2VOICE_SPEED", default_value_t = 1.0)]
    speed: f32,

    /// Document-extraction endpoint.
    #[arg(long, env = env::EXTRACTION_URL)]
    extraction_url: Option<String>,

    /// Document-extraction credential.
    #[arg(long, env = env::EXTRACTION_API_KEY, hide_env_values = true)]
    extraction_key: Option<String>,

    /// API key for the OpenAI-compatible endpoint.
    #[arg(long, env = env::LLM_API_KEY, hide_env_values = true)]
    llm_api_key: Option<String>,

    /// OpenAI-compatible API root.
    #[arg(long, env = env::LLM_BASE_URL)]
    llm_base_url: Option<String>,

    /// Chat model ID.
    #[arg(long, env = env::MODEL)]
    model: Option<String>,

    /// edgequake-llm provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = env::PROVIDER,
        long_help = "Use an edgequake-llm provider instead of the OpenAI-compatible endpoint.\n\
          The provider reads its own API key (OPENAI_API_KEY, ANTHROPIC_API_KEY, …)."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2VOICE_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per generation.
    #[arg(long, env = "PDF2VOICE_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Gradio space URL for text-to-speech.
    #[arg(long, env = env::TTS_SPACE_URL)]
    tts_space: Option<String>,

    /// Hugging Face token for the speech space.
    #[arg(long, env = env::HF_TOKEN, hide_env_values = true)]
    hf_token: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "PDF2VOICE_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Output structured JSON (ConversionOutput) instead of Markdown.
    #[arg(long, env = "PDF2VOICE_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "PDF2VOICE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2VOICE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2VOICE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; -v brings them back at DEBUG.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let pipeline = Pipeline::new(config).context("Failed to set up pipeline")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = match cli.output {
        Some(ref md_path) => pipeline
            .convert_to_files(&cli.input, md_path, cli.audio_out.as_deref())
            .await
            .context("Conversion failed")?,
        None => {
            let output = pipeline
                .convert(&cli.input)
                .await
                .context("Conversion failed")?;
            if let (Some(path), Some(audio)) = (cli.audio_out.as_deref(), output.audio.as_ref()) {
                audio.save(path).await.context("Failed to write audio")?;
            }
            output
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output.is_none() {
        write_stdout(&output.markdown.text)?;
    }

    if cli.show_narrative && !cli.quiet {
        eprintln!("{}\n{}", bold("Narrative:"), output.narrative.text);
    }
    if !cli.quiet {
        print_summary(&cli, &output);
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .temperature(cli.temperature)
        .speed(cli.speed)
        .synthesize_speech(!cli.no_audio)
        .timeout_secs(cli.timeout);

    if let Some(ref url) = cli.extraction_url {
        builder = builder.extraction_url(url);
    }
    if let Some(ref key) = cli.extraction_key {
        builder = builder.extraction_api_key(key);
    }
    if let Some(ref key) = cli.llm_api_key {
        builder = builder.llm_api_key(key);
    }
    if let Some(ref url) = cli.llm_base_url {
        builder = builder.llm_base_url(url);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref space) = cli.tts_space {
        builder = builder.tts_space_url(space);
    }
    if let Some(ref token) = cli.hf_token {
        builder = builder.hf_token(token);
    }
    if let Some(ref voice) = cli.voice {
        builder = builder.voice(voice);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn write_stdout(markdown: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(markdown.as_bytes())
        .context("Failed to write to stdout")?;
    if !markdown.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn print_summary(cli: &Cli, output: &ConversionOutput) {
    if let Some(ref path) = cli.output {
        eprintln!("   Markdown  →  {}", bold(&path.display().to_string()));
    }
    match (&output.audio, cli.audio_out.as_ref()) {
        (Some(audio), Some(path)) => {
            eprintln!("   Audio     →  {}", bold(&path.display().to_string()));
            eprintln!("   {}", dim(&audio.performance_summary));
        }
        (Some(audio), None) => {
            eprintln!(
                "   Audio     {}  {}",
                dim(&format!("{} bytes (use --audio-out to keep it)", audio.bytes.len())),
                dim(&audio.source)
            );
        }
        (None, _) => {}
    }
    if output.stats.unfenced_replies > 0 {
        eprintln!(
            "   {} model replies had no fenced block and were used verbatim",
            output.stats.unfenced_replies
        );
    }
    // With the spinner on, per-stage lines were already printed.
    if cli.no_progress || cli.json {
        eprintln!("{}", output.summary());
    }
}
