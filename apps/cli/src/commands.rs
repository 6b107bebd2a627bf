//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use gitdocx_core::{
    CancelToken, ConvertConfig, ConvertResult, DEFAULT_TITLE, ProgressReporter, convert,
    convert_tracked,
};
use gitdocx_shared::{AppConfig, CrawlConfig, Layout, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// GitDocx: render a GitHub folder's source files into Word documents.
#[derive(Parser)]
#[command(
    name = "gitdocx",
    version,
    about = "Render the source files of a GitHub repository folder into .docx documents, one per folder.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert a repository folder into documents.
    Convert {
        /// Repository address, e.g. https://github.com/owner/repo/tree/main/src.
        url: String,

        /// Output directory (defaults to `defaults.output_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// File extension to include; repeat for several (defaults to `defaults.extensions`).
        #[arg(short, long = "ext", value_name = "EXT")]
        extensions: Vec<String>,

        /// Access token (defaults to the env var named by `github.token_env`).
        #[arg(long)]
        token: Option<String>,

        /// Grouping: by-folder or single.
        #[arg(long)]
        layout: Option<Layout>,

        /// Report title used by the single layout.
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,

        /// Count matching files before converting, for a determinate progress bar.
        #[arg(long)]
        count: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "gitdocx=info",
        1 => "gitdocx=debug",
        _ => "gitdocx=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Options of the `convert` command after parsing.
struct ConvertArgs {
    url: String,
    out: Option<PathBuf>,
    extensions: Vec<String>,
    token: Option<String>,
    layout: Option<Layout>,
    title: String,
    count: bool,
}

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert {
            url,
            out,
            extensions,
            token,
            layout,
            title,
            count,
        } => {
            cmd_convert(ConvertArgs {
                url,
                out,
                extensions,
                token,
                layout,
                title,
                count,
            })
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_convert(args: ConvertArgs) -> Result<()> {
    let config = load_config()?;
    let count_first = args.count;
    let convert_config = build_convert_config(&config, args);

    info!(
        url = %convert_config.url,
        out = %convert_config.output_dir.display(),
        extensions = ?convert_config.crawl.extensions,
        layout = %convert_config.crawl.layout,
        "converting repository folder"
    );

    let reporter = CliProgress::new();
    let result = if count_first {
        convert_tracked(&convert_config, &reporter, &CancelToken::new()).await
    } else {
        convert(&convert_config, &reporter).await
    };
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            reporter.abandon();
            return Err(eyre!(e));
        }
    };

    println!();
    println!("  Conversion complete!");
    println!("  Files:     {}", result.processed);
    println!("  Documents: {}", result.artifacts.len());
    for artifact in &result.artifacts {
        println!("    - {}", artifact.filename);
    }
    if !result.skipped_files.is_empty() {
        println!("  Skipped:   {} file(s) could not be downloaded", result.skipped_files.len());
    }
    if !result.skipped_folders.is_empty() {
        println!("  Skipped:   {} folder(s) could not be listed", result.skipped_folders.len());
    }
    println!("  Output:    {}", result.output_dir.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

/// Merge command-line overrides onto the loaded config.
fn build_convert_config(config: &AppConfig, args: ConvertArgs) -> ConvertConfig {
    let mut crawl = CrawlConfig::from(config);
    if args.token.is_some() {
        crawl.token = args.token;
    }
    if !args.extensions.is_empty() {
        crawl.extensions = args.extensions.iter().map(|e| normalize_extension(e)).collect();
    }
    if let Some(layout) = args.layout {
        crawl.layout = layout;
    }

    ConvertConfig {
        url: args.url,
        output_dir: args
            .out
            .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir)),
        crawl,
        title: args.title,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// `cpp` and `.cpp` both mean the `.cpp` suffix.
fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, label: &str) {
        self.spinner.set_message(label.to_string());
    }

    fn counted(&self, total: usize) {
        self.spinner.set_message(format!("Found {total} matching file(s)"));
    }

    fn file_started(&self, name: &str) {
        self.spinner.set_message(format!("Downloading {name}"));
    }

    fn file_processed(&self, name: &str, processed: usize, total: usize) {
        if total > 0 {
            self.spinner.set_message(format!("[{processed}/{total}] {name}"));
        } else {
            self.spinner.set_message(format!("[{processed}] {name}"));
        }
    }

    fn done(&self, _result: &ConvertResult) {
        self.spinner.finish_and_clear();
    }
}
