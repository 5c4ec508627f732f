//! CLI binary for unishare-summarizer.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SummaryConfig` and `RequestContext` and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use unishare_summarizer::media::SUPPORTED_EXTENSIONS;
use unishare_summarizer::pipeline::staging::release_path;
use unishare_summarizer::{
    classify, summarize_file, FileState, Labels, Language, PipelineObserver, PipelineState,
    RequestContext, SummaryConfig, SummaryResponse,
};

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

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Spinner driven by pipeline state transitions.
struct SpinnerObserver {
    bar: ProgressBar,
    labels: &'static Labels,
}

impl SpinnerObserver {
    fn new(language: Language) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            labels: language.labels(),
        })
    }
}

impl PipelineObserver for SpinnerObserver {
    fn on_state(&self, state: PipelineState) {
        match state {
            PipelineState::Idle => {}
            PipelineState::Staged | PipelineState::Classified => {
                self.bar.set_prefix("Staging");
                self.bar.set_message(self.labels.processing);
            }
            PipelineState::Submitted => {
                self.bar.set_prefix("Uploaded");
            }
            PipelineState::Polling => {
                self.bar.set_prefix("Processing");
                self.bar.set_message("waiting for the service…");
            }
            PipelineState::Ready => {
                self.bar.set_prefix("Ready");
            }
            PipelineState::Generating => {
                self.bar.set_prefix("Generating");
                self.bar.set_message(self.labels.processing);
            }
            PipelineState::Done | PipelineState::Errored => self.bar.finish_and_clear(),
        }
    }

    fn on_poll(&self, attempt: u32, state: FileState) {
        if state == FileState::Processing {
            self.bar.set_message(format!("status check {attempt}"));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # English summary of lecture notes (stdout)
  summarize notes.pdf

  # Arabic summary of a recorded lecture, written to a file
  summarize --language ar --major "الطب البشري" lecture.mp4 -o summary.md

  # Choose major and category explicitly
  summarize --major "Computer Science" --category "Past Exam" exam.jpg

  # JSON envelope for scripting
  summarize --json slides.pdf > response.json

  # Show the majors and categories offered for a language
  summarize --list-options --language ar

SUPPORTED FILES:
  Listed by --list-options. Anything else is uploaded without a MIME type
  (use --mime to set one).

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY            Gemini API key
  GEMINI_API_KEY            Fallback when GOOGLE_API_KEY is unset
  UNISHARE_MODEL            Override model ID (default gemini-1.5-flash)
  UNISHARE_GEMINI_BASE_URL  Override the API endpoint
  RUST_LOG                  tracing filter, e.g. unishare_summarizer=debug
"#;

/// Summarise study material with Gemini, in English or Arabic.
#[derive(Parser, Debug)]
#[command(
    name = "summarize",
    version,
    about = "Summarise PDFs, images, audio and video with Google Gemini",
    long_about = "Upload a document, image or recording to Google Gemini and print a \
three-section summary (overview, key insights, terminology) in English or Arabic, \
tailored to the student's major and the kind of material.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File to summarise.
    #[arg(required_unless_present = "list_options")]
    input: Option<PathBuf>,

    /// Output language.
    #[arg(short, long, env = "UNISHARE_LANGUAGE", value_enum, default_value = "en")]
    language: LanguageArg,

    /// Student's major. Default: first major for the language.
    #[arg(long)]
    major: Option<String>,

    /// Kind of material. Default: first category for the language.
    #[arg(long)]
    category: Option<String>,

    /// Declared MIME type; overrides the extension lookup.
    #[arg(long)]
    mime: Option<String>,

    /// Write the summary to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Gemini model ID.
    #[arg(long, env = "UNISHARE_MODEL", default_value = unishare_summarizer::config::DEFAULT_MODEL)]
    model: String,

    /// Gemini API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini REST endpoint.
    #[arg(long, env = "UNISHARE_GEMINI_BASE_URL",
          default_value = unishare_summarizer::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Delay between status checks while the file is processing, in ms.
    #[arg(long, default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Maximum status checks before giving up (0 = wait indefinitely).
    #[arg(long, default_value_t = 300)]
    max_polls: u32,

    /// Sampling temperature (0.0–2.0). Default: service default.
    #[arg(long)]
    temperature: Option<f32>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 300)]
    api_timeout: u64,

    /// Directory for staged uploads. Default: system temp dir.
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Print the JSON response envelope instead of Markdown.
    #[arg(long)]
    json: bool,

    /// Print the majors and categories offered for --language and exit.
    #[arg(long)]
    list_options: bool,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except the summary and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LanguageArg {
    En,
    Ar,
}

impl From<LanguageArg> for Language {
    fn from(v: LanguageArg) -> Self {
        match v {
            LanguageArg::En => Language::English,
            LanguageArg::Ar => Language::Arabic,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let language: Language = cli.language.into();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the feedback when active; keep INFO logs off it.
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

    // ── List-options mode ────────────────────────────────────────────────
    if cli.list_options {
        print_options(language);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(ref input) = cli.input else {
        anyhow::bail!("No input file given");
    };

    let ctx = RequestContext::new(
        language,
        cli.major
            .clone()
            .unwrap_or_else(|| language.majors().first().copied().unwrap_or_default().to_string()),
        cli.category.clone().unwrap_or_else(|| {
            language
                .categories()
                .first()
                .copied()
                .unwrap_or_default()
                .to_string()
        }),
    );

    let observer = show_progress.then(|| SpinnerObserver::new(language));
    let config = build_config(&cli, observer.clone())?;

    if !cli.quiet && !cli.json {
        let labels = language.labels();
        eprintln!("{}", bold(labels.title));
        eprintln!("{}", dim(labels.subtitle));
        eprintln!(
            "{}",
            dim(&format!(
                "{}: {}  ·  {}: {}",
                labels.major_label, ctx.major, labels.category_label, ctx.category
            ))
        );
    }

    let name = input.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    if !cli.quiet && cli.mime.is_none() && classify(&name, None).is_empty() {
        eprintln!(
            "{}",
            dim(&format!(
                "{name}: not one of {}; the service will infer its type",
                SUPPORTED_EXTENSIONS.join(", ")
            ))
        );
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let result = summarize_file(input, cli.mime.as_deref(), &ctx, &config).await;
    if let Some(obs) = observer {
        obs.bar.finish_and_clear();
    }

    if cli.json {
        let response = SummaryResponse::from_result(&result, language);
        let json =
            serde_json::to_string_pretty(&response).context("Failed to serialise response")?;
        println!("{json}");
        return Ok(if response.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{} {}", red("✘"), red(&e.user_message(language)));
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Some(ref path) = cli.output {
        write_atomic(path, &output.text).await?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.text.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if !cli.quiet {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            language.labels().success,
            dim(&format!(
                "{} · {} status checks · {}ms",
                output.remote_file, output.status_checks, output.stats.total_ms
            )),
        );
        if let Some(ref path) = cli.output {
            eprintln!("   → {}", bold(&path.display().to_string()));
        }
        if !output.is_complete() {
            eprintln!(
                "   {}",
                dim(&format!("missing section(s): {:?}", output.missing_sections))
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `SummaryConfig`.
fn build_config(cli: &Cli, observer: Option<Arc<SpinnerObserver>>) -> Result<SummaryConfig> {
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .unwrap_or_default();

    let mut builder = SummaryConfig::builder()
        .api_key(api_key)
        .base_url(cli.base_url.as_str())
        .model(cli.model.as_str())
        .poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .max_polls((cli.max_polls > 0).then_some(cli.max_polls))
        .request_timeout_secs(cli.api_timeout);

    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(ref dir) = cli.staging_dir {
        builder = builder.staging_dir(dir);
    }
    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}

/// Write `text` via a temp file + rename so readers never see a partial file.
async fn write_atomic(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, text)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        release_path(&tmp_path);
        return Err(e).with_context(|| format!("Failed to write {}", path.display()));
    }
    Ok(())
}

fn print_options(language: Language) {
    let labels = language.labels();
    println!("{}", bold("Files"));
    for ext in SUPPORTED_EXTENSIONS {
        let mime = classify(&format!("x.{ext}"), None);
        println!("  {ext:<6} {mime}");
    }
    println!("{}", bold(labels.major_label));
    for m in language.majors() {
        println!("  {m}");
    }
    println!("{}", bold(labels.category_label));
    for c in language.categories() {
        println!("  {c}");
    }
}
