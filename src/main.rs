use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mallscope::cli;
use mallscope::config;
use mallscope::filter::FilterSelection;

#[derive(Debug, Parser)]
#[command(name = "mallscope")]
#[command(about = "Mall customer analytics dashboard with an LLM question box")]
struct App {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the dashboard server (default when no subcommand is given)
    Serve,
    /// Print a per-gender overview of the dataset
    Summary {
        /// Restrict to these genders (repeatable)
        #[arg(long = "gender")]
        genders: Vec<String>,
        /// Minimum age
        #[arg(long)]
        min_age: Option<u32>,
    },
    /// Ask the chat model a question and print the answer
    Ask {
        /// The question to ask
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },
    /// Show recent entries from the ask log
    History {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check config files, dataset source, and chat credentials
    Health,
    /// Inspect or edit the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.mallscope/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `server.port 9000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MALLSCOPE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let app = App::parse();
    init_tracing();

    let cfg = config::load();

    match app.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cli::run_serve(&cfg),
        Commands::Summary { genders, min_age } => {
            cli::run_summary(&cfg, &FilterSelection::new(genders, min_age))
        }
        Commands::Ask { question } => cli::run_ask(&cfg, &question.join(" ")),
        Commands::History { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(format.as_str()));
            cli::run_history(&cfg, limit, fmt)
        }
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
