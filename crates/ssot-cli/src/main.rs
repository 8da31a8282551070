//! SSOT CLI - Command-line interface for SSOT Atlas
//!
//! Every invocation loads the repository from disk, runs one request and
//! exits. Nothing is cached between runs.

use clap::{Parser, Subcommand};
use colored::Colorize;
use ssot_core::CategoryFilter;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{AnalysisKind, GraphView, Request, TaxonomyAction};

#[derive(Parser)]
#[command(name = "ssot")]
#[command(author = "SSOT Atlas Contributors")]
#[command(version)]
#[command(about = "Structure, search and vocabulary checks for SSOT documentation repositories", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Print results as JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Repository root
    #[arg(long, global = true, env = "SSOT_REPO_PATH", default_value = ".")]
    repo: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .ssot/config.json
    Init,

    /// Show corpus statistics
    Status,

    /// Search the repository for an answer
    Query {
        /// Free-text question
        question: String,

        /// Category to search (files, engineering, tools, platforms, _meta or all)
        #[arg(short, long, default_value = "all")]
        category: CategoryFilter,

        /// Topic keyword added to the question
        #[arg(short, long)]
        topic: Option<String>,

        /// Maximum results (defaults to the configured max_results)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Inspect the reference graph
    Graph {
        #[arg(value_enum, default_value = "all")]
        view: GraphView,
    },

    /// Check term usage against the taxonomy
    Taxonomy {
        #[command(subcommand)]
        action: TaxonomyAction,
    },

    /// Run a combined analysis and print findings with recommendations
    Analyze {
        #[arg(value_enum, default_value = "full")]
        kind: AnalysisKind,
    },
}

impl From<Commands> for Request {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Init => Request::Init,
            Commands::Status => Request::Status,
            Commands::Query {
                question,
                category,
                topic,
                limit,
            } => Request::Query {
                question,
                category,
                topic,
                limit,
            },
            Commands::Graph { view } => Request::Graph(view),
            Commands::Taxonomy { action } => Request::Taxonomy(action),
            Commands::Analyze { kind } => Request::Analyze(kind),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .init();
    }

    let request = Request::from(cli.command);
    let result = commands::run(&cli.repo, cli.json, request).await;

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
