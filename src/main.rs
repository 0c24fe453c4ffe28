use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use radiocheck::config::{self, Config};
use radiocheck::error::ErrorKind;
use radiocheck::format;
use radiocheck::gemini::GeminiClient;
use radiocheck::history::HistoryStore;
use radiocheck::history_list::{self, SortOrder};
use radiocheck::models::{HistoryId, UploadedFile};
use radiocheck::pipeline::{Outcome, Pipeline};
use radiocheck::selection::Selection;
use radiocheck::storage::FileStore;
use radiocheck::view::View;

#[derive(Parser)]
#[command(name = "radiocheck", about = "Radio-readiness critique for audio tracks")]
struct Cli {
    /// Audio file to analyze (WAV, MP3, or AIFF). Without one, the TUI starts.
    path: Option<String>,

    /// Output the analysis as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Launch the interactive TUI (analyzing PATH first, if given)
    #[arg(long)]
    tui: bool,

    /// Print the stored analysis history
    #[arg(long)]
    history: bool,

    /// History order
    #[arg(long, value_enum, default_value_t = SortOrder::NewestFirst)]
    sort: SortOrder,

    /// Compare two stored analyses by id
    #[arg(long, num_args = 2, value_names = ["ID", "ID"])]
    compare: Option<Vec<u64>>,

    /// Delete all stored analyses
    #[arg(long)]
    clear_history: bool,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model used for the critique
    #[arg(long, env = "RADIOCHECK_MODEL", default_value = config::DEFAULT_MODEL)]
    model: String,

    /// Gemini API base URL
    #[arg(long, env = "RADIOCHECK_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Sampling temperature
    #[arg(long, default_value_t = config::DEFAULT_TEMPERATURE)]
    temperature: f64,

    /// HTTP timeout for one analysis, in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Where history and logs are kept
    #[arg(long, env = "RADIOCHECK_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            api_key: self
                .api_key
                .clone()
                .or_else(|| std::env::var("API_KEY").ok())
                .filter(|k| !k.trim().is_empty()),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
            data_dir: self.data_dir.clone().unwrap_or_else(config::default_data_dir),
        }
    }
}

/// Log to stderr for one-shot commands.
fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to a file while the TUI owns the terminal.
fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init();
    Ok(())
}

fn print_history(pipeline: &Pipeline<FileStore>, sort: SortOrder) {
    let rows = history_list::rows(pipeline.history(), &Selection::new(), sort);
    println!("{}", format::format_history_table(&rows));
}

fn print_comparison(pipeline: &Pipeline<FileStore>, ids: &[u64]) -> Result<()> {
    let mut selection = Selection::new();
    for &id in ids {
        let id = HistoryId(id);
        if pipeline.history_store().get(id).is_none() {
            anyhow::bail!("No analysis with id {} in history", id);
        }
        selection.toggle(id);
    }
    match selection.resolve(pipeline.history())[..] {
        [older, newer] => println!("{}", format::format_comparison(older, newer)),
        _ => anyhow::bail!("--compare needs two different ids"),
    }
    Ok(())
}

fn analyze_once(
    runtime: &tokio::runtime::Runtime,
    pipeline: &mut Pipeline<FileStore>,
    config: &Config,
    path: &str,
    json: bool,
) -> Result<()> {
    let file_path = Path::new(path);
    if !config::is_accepted_audio(path) {
        anyhow::bail!("'{}' is not a WAV, MP3, or AIFF file", path);
    }
    if !file_path.is_file() {
        anyhow::bail!("File '{}' does not exist", path);
    }
    let file = UploadedFile::from_path(file_path)
        .with_context(|| format!("Invalid file name: {}", path))?;

    let client = GeminiClient::new(config)?;
    eprintln!("Analyzing {} with {}...", file.name, client.model());

    let outcome = runtime.block_on(pipeline.submit(&client, Some(&file)));
    match outcome {
        Some(Outcome::Added(_)) => {
            if let View::Single(item) = pipeline.view() {
                if json {
                    println!("{}", format::format_json(item));
                } else {
                    println!("{}", format::format_report(item));
                }
            }
            Ok(())
        }
        Some(Outcome::Failed(kind)) => anyhow::bail!("{}", kind.message()),
        Some(Outcome::Stale) | None => anyhow::bail!("{}", ErrorKind::Unknown.message()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    let one_shot = cli.path.is_some() || cli.history || cli.clear_history || cli.compare.is_some();
    let use_tui = cli.tui || !one_shot;
    if use_tui && cli.json {
        anyhow::bail!("--json cannot be used with the TUI");
    }

    if use_tui {
        init_file_logging(&config.log_path())?;
    } else {
        init_stderr_logging();
    }

    let history = HistoryStore::load(FileStore::new(&config.data_dir));
    let mut pipeline = Pipeline::new(history);

    if cli.clear_history {
        pipeline.clear_history();
        eprintln!("History cleared");
        return Ok(());
    }

    if cli.history {
        print_history(&pipeline, cli.sort);
        return Ok(());
    }

    if let Some(ref ids) = cli.compare {
        return print_comparison(&pipeline, ids);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    if use_tui {
        let client = GeminiClient::new(&config)?;
        return radiocheck::tui::run(
            pipeline,
            Arc::new(client),
            runtime.handle().clone(),
            &config.model,
            cli.path.as_deref(),
        );
    }

    match cli.path.as_deref() {
        Some(path) => analyze_once(&runtime, &mut pipeline, &config, path, cli.json),
        None => anyhow::bail!("No file given"),
    }
}
