//! CLI binary for edgequake-yt2pptx.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig` and a `Generator`, then prints the deck URL.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_yt2pptx::{
    resolve_video_id, DeckStorage, GenerationConfig, GenerationProgressCallback, Generator,
    HttpStorage, JsonFileStore, LocalDirStorage, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

/// Terminal progress callback: a spinner naming the current stage plus one
/// log line per completed stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Generating");
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn stage_elapsed(&self) -> String {
        let elapsed = self
            .stage_started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        format!("{:.1}s", elapsed as f64 / 1000.0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, _video_id: &str, stage: Stage) {
        if let Ok(mut s) = self.stage_started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, _video_id: &str, stage: Stage) {
        self.bar.println(format!(
            "  {} {:<26} {}",
            green("✓"),
            stage.to_string(),
            dim(&self.stage_elapsed())
        ));
    }

    fn on_run_failed(&self, _video_id: &str, stage: Option<Stage>, error: &str) {
        self.bar.finish_and_clear();
        let stage = stage.map(|s| s.to_string()).unwrap_or_else(|| "run".into());
        eprintln!("  {} {:<26} {}", red("✗"), stage, red(error));
    }

    fn on_run_complete(&self, video_id: &str, _url: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} deck for {} published", green("✔"), bold(video_id));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Register yourself once, then generate
  yt2pptx --owner me --register-owner https://www.youtube.com/watch?v=dQw4w9WgXcQ

  # Bare video id, decks copied to ./decks
  yt2pptx --owner me --output-dir ./decks dQw4w9WgXcQ

  # Upload to a storage endpoint instead of a local directory
  yt2pptx --owner me --upload-url https://files.example.com/upload \
          --upload-token $TOKEN https://youtu.be/dQw4w9WgXcQ

  # Machine-readable result
  yt2pptx --owner me --json dQw4w9WgXcQ

LIMITS:
  Videos longer than 10 minutes are rejected. Videos without captions get a
  short three-slide deck explaining that the content is limited.

ENVIRONMENT VARIABLES:
  RAPID_API_KEY           RapidAPI key for the yt-api video/info endpoint
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  YT2PPTX_OWNER           Default owner id
"#;

/// Turn a YouTube video into a PowerPoint deck using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "yt2pptx",
    version,
    about = "Turn a YouTube video into a PowerPoint deck using an LLM",
    long_about = "Fetches a YouTube video's captions, asks an LLM for a title and a slide \
outline, writes a 16:9 .pptx and publishes it to local storage or an upload endpoint. \
Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// YouTube URL or 11-character video id.
    input: String,

    /// Owner id the deck is generated for.
    #[arg(long, env = "YT2PPTX_OWNER")]
    owner: Option<String>,

    /// Directory holding users.json and presentations.jsonl.
    #[arg(long, env = "YT2PPTX_DATA_DIR", default_value = "./yt2pptx-data")]
    data_dir: PathBuf,

    /// Register --owner in the data directory before generating.
    #[arg(long)]
    register_owner: bool,

    /// Directory decks are copied to when no --upload-url is given.
    #[arg(long, env = "YT2PPTX_OUTPUT_DIR", default_value = "./decks")]
    output_dir: PathBuf,

    /// Multipart upload endpoint; the response must carry `url` or `data.url`.
    #[arg(long, env = "YT2PPTX_UPLOAD_URL")]
    upload_url: Option<String>,

    /// Bearer token for --upload-url.
    #[arg(long, env = "YT2PPTX_UPLOAD_TOKEN", hide_env_values = true)]
    upload_token: Option<String>,

    /// Number of content slides to request (1–30).
    #[arg(long, env = "YT2PPTX_SLIDES", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..=30))]
    slides: u32,

    /// Maximum video length in seconds.
    #[arg(long, env = "YT2PPTX_MAX_SECONDS", default_value_t = 600)]
    max_seconds: u64,

    /// Preferred captions language.
    #[arg(long, env = "YT2PPTX_LANGUAGE", default_value = "en")]
    language: String,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// RapidAPI key for video metadata.
    #[arg(long, env = "RAPID_API_KEY", hide_env_values = true)]
    rapidapi_key: Option<String>,

    /// Per-LLM-call timeout in seconds.
    #[arg(long, env = "YT2PPTX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Print the result as JSON (`{"success":…}`).
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "YT2PPTX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "YT2PPTX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "YT2PPTX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports each stage; keep library logs to errors
    // while it is active.
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

    let video_id = resolve_video_id(&cli.input).context("Could not read a video id")?;

    // ── Datastore ────────────────────────────────────────────────────────
    let store = JsonFileStore::new(&cli.data_dir);
    if cli.register_owner {
        let owner = cli
            .owner
            .as_deref()
            .context("--register-owner needs --owner")?;
        store
            .ensure_user(owner)
            .await
            .with_context(|| format!("Failed to register owner in {:?}", cli.data_dir))?;
    }

    // ── Storage ──────────────────────────────────────────────────────────
    let storage: Arc<dyn DeckStorage> = match cli.upload_url {
        Some(ref url) => Arc::new(
            HttpStorage::new(url.clone(), cli.upload_token.clone(), cli.api_timeout)
                .context("Failed to build upload client")?,
        ),
        None => Arc::new(LocalDirStorage::new(&cli.output_dir)),
    };

    // ── Generator ────────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let generator = Generator::builder(config)
        .storage(storage)
        .store(Arc::new(store))
        .build()
        .context("Failed to set up the generator")?;

    let start = Instant::now();
    let result = generator.generate(&video_id, cli.owner.as_deref()).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    } else if let Some(ref url) = result.url {
        println!("{url}");
        if !cli.quiet {
            eprintln!("   {}", dim(&format!("{}ms total", start.elapsed().as_millis())));
        }
    }

    if !result.success {
        if !cli.json && !show_progress {
            eprintln!(
                "{} {}",
                red("✘"),
                result.error.as_deref().unwrap_or("generation failed")
            );
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .slide_count(cli.slides as usize)
        .max_video_secs(cli.max_seconds)
        .language(cli.language.clone())
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.rapidapi_key {
        builder = builder.rapidapi_key(key.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
