#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use glean_core::{ErrorCode, config};
use output::{Failure, OutputMode};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "glean: on-device semantic search",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of .glean/config.toml and the user config.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (defaults to pretty on a terminal, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        OutputMode::resolve(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Search",
        about = "Rank items against a query",
        long_about = "Rank a JSON array of items ({id, label, keywords?, description?}) by relevance to a query.\n\nUses the configured embedding backend when available and token overlap otherwise.",
        after_help = "EXAMPLES:\n    # Rank a command palette\n    gl rank \"open recent\" --items commands.json\n\n    # Token overlap only, top 3\n    gl rank settings --items commands.json --lexical -n 3\n\n    # Emit machine-readable output\n    gl rank settings --items commands.json --json"
    )]
    Rank(cmd::rank::RankArgs),

    #[command(
        next_help_heading = "Search",
        about = "Find relevant passages in a document",
        long_about = "Rank the sentences (or paragraphs) of a document by semantic similarity to a query.\n\nRequires an embedding backend: set [embedder] provider in .glean/config.toml or export GLEAN_EMBEDDER.",
        after_help = "EXAMPLES:\n    # Best five sentences\n    gl find \"connection pooling\" --file notes.md\n\n    # Paragraphs, stricter threshold\n    gl find retries --file design.md --paragraphs --min-score 0.5\n\n    # Mark matches in the full text\n    gl find retries --file design.md --highlight"
    )]
    Find(cmd::find::FindArgs),

    #[command(
        next_help_heading = "Search",
        about = "Search a document with queries read from stdin",
        long_about = "Load a document, then read queries from stdin line by line. Queries are debounced like keystrokes in a search box; each committed result set is printed as it lands.",
        after_help = "EXAMPLES:\n    # Type queries, Ctrl-D to finish\n    gl interactive --file notes.md\n\n    # JSON lines output\n    printf 'pool\\n' | gl interactive --file notes.md --json"
    )]
    Interactive(cmd::interactive::InteractiveArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("GLEAN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "glean=debug,info"
        } else {
            "glean=info,warn"
        })
    });

    let format = env::var("GLEAN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries results; logs go to stderr.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();
    let config = config::resolve_config(&project_root, cli.config.as_deref()).map_err(|err| {
        let failure = Failure::new(ErrorCode::ConfigParseError, format!("{err:#}"));
        cmd::fail(output, &failure, format!("{}: {err}", ErrorCode::ConfigParseError))
    })?;
    debug!(
        provider = ?config.embedder.provider,
        semantic = config.search.semantic,
        "resolved config"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match &cli.command {
            Commands::Rank(args) => cmd::rank::run_rank(args, &config, output).await,
            Commands::Find(args) => cmd::find::run_find(args, &config, output).await,
            Commands::Interactive(args) => {
                cmd::interactive::run_interactive(args, &config, output).await
            }
        }
    })
}
