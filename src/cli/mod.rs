//! CLI command implementations for mallscope.
//!
//! Provides subcommand handlers for:
//! - `mallscope serve`: run the dashboard (default)
//! - `mallscope summary`: dataset overview
//! - `mallscope ask "question"`: one-off question from the terminal
//! - `mallscope history`: recent entries from the ask log
//! - `mallscope health`: config, dataset, and chat key checks
//! - `mallscope config show|init|set|reset`: configuration management

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::logger::{self, AskLogEntry};
use crate::analytics::reporter;
use crate::config::{self, MallscopeConfig};
use crate::dataset::Dataset;
use crate::filter::{self, FilterSelection};
use crate::llm::{self, Dispatcher};
use crate::web::{self, AppState};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// mallscope serve
// ---------------------------------------------------------------------------

/// Load the dataset and run the dashboard until interrupted.
pub fn run_serve(cfg: &MallscopeConfig) -> Result<()> {
    let state = AppState::from_config(cfg)?;
    web::serve(state, &cfg.server.bind_addr(), cfg.server.workers)
}

// ---------------------------------------------------------------------------
// mallscope summary
// ---------------------------------------------------------------------------

/// Print a per-gender overview of the dataset, optionally filtered.
pub fn run_summary(cfg: &MallscopeConfig, selection: &FilterSelection) -> Result<()> {
    let dataset = Dataset::load(&cfg.dataset).context("failed to load customer dataset")?;
    let view = filter::filter(&dataset, selection);

    println!("{}", "Mall Customer Summary".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Customers:".bold(), dataset.len());
    if !selection.is_unrestricted() {
        println!("  {} {}", "Matching: ".bold(), view.len());
    }
    if let Some((min, max)) = dataset.age_range() {
        println!("  {} {min}–{max}", "Age range:".bold());
    }
    println!();

    if view.is_empty() {
        println!("{}", "No customers match this selection.".yellow());
        return Ok(());
    }

    println!(
        "  {:<12} {:>6} {:>9} {:>12} {:>12}",
        "Gender".bold(),
        "Count".bold(),
        "Avg age".bold(),
        "Avg income".bold(),
        "Avg score".bold()
    );
    println!("  {}", "-".repeat(55));
    for gender in view.genders() {
        let rows: Vec<_> = view.iter().filter(|r| r.gender == gender).collect();
        let n = rows.len() as f64;
        let avg_age = rows.iter().map(|r| f64::from(r.age)).sum::<f64>() / n;
        let avg_income = rows.iter().map(|r| r.annual_income).sum::<f64>() / n;
        let avg_score = rows.iter().map(|r| r.spending_score).sum::<f64>() / n;
        println!(
            "  {:<12} {:>6} {:>9.1} {:>11.1}k {:>12.1}",
            gender,
            rows.len(),
            avg_age,
            avg_income,
            avg_score
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// mallscope ask
// ---------------------------------------------------------------------------

/// Send one question and print the reply.
pub fn run_ask(cfg: &MallscopeConfig, question: &str) -> Result<()> {
    if question.is_empty() {
        anyhow::bail!("question is empty");
    }

    let dispatcher = Dispatcher::from_config(cfg);
    let answer = dispatcher.ask(1, question);

    if answer.starts_with(llm::ERROR_PREFIX) {
        eprintln!("{}", answer.red());
        anyhow::bail!("the chat endpoint did not answer");
    }
    println!("{answer}");
    Ok(())
}

// ---------------------------------------------------------------------------
// mallscope history
// ---------------------------------------------------------------------------

/// Show the most recent ask-log entries and a summary.
pub fn run_history(cfg: &MallscopeConfig, limit: usize, format: OutputFormat) -> Result<()> {
    let path = cfg
        .logging
        .resolved_ask_log_path()
        .context("could not determine home directory")?;
    let entries = logger::read_recent(&path, limit);

    if entries.is_empty() {
        println!("{}", "No questions logged yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_history_json(&entries)?,
        OutputFormat::Table => print_history_table(&entries),
    }
    Ok(())
}

fn print_history_table(entries: &[AskLogEntry]) {
    let summary = reporter::summarize(entries);

    println!("{}", "Recent Questions".bold().cyan());
    println!("{}", "=".repeat(70));
    println!(
        "  {:<26} {:<18} {:>9} {:>9} {:>8}",
        "Time".bold(),
        "Model".bold(),
        "Q chars".bold(),
        "A chars".bold(),
        "Latency".bold()
    );
    for e in entries {
        let status = if e.success { "✓".green() } else { "✗".red() };
        println!(
            "{} {:<26} {:<18} {:>9} {:>9} {:>6}ms",
            status,
            truncate(&e.timestamp, 26),
            truncate(&e.model, 18),
            e.question_chars,
            e.answer_chars,
            e.latency_ms
        );
    }
    println!();
    println!(
        "  {} {}  {} {:.0}%  {} {:.0}ms  {} {}ms",
        "Total:".bold(),
        summary.total,
        "Success:".bold(),
        summary.success_pct(),
        "Avg latency:".bold(),
        summary.avg_latency_ms,
        "Max:".bold(),
        summary.max_latency_ms
    );
}

fn print_history_json(entries: &[AskLogEntry]) -> Result<()> {
    let summary = reporter::summarize(entries);
    let value = serde_json::json!({
        "entries": entries,
        "summary": {
            "total": summary.total,
            "succeeded": summary.succeeded,
            "failed": summary.failed,
            "avg_latency_ms": summary.avg_latency_ms,
            "max_latency_ms": summary.max_latency_ms,
        },
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// mallscope health
// ---------------------------------------------------------------------------

/// Check config files, dataset reachability, and the chat credential.
pub fn run_health(cfg: &MallscopeConfig) -> Result<()> {
    println!("{}", "mallscope Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.mallscope/config.toml found"
        } else {
            "not found (run `mallscope config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".mallscope.toml found"
        } else {
            "none (optional)"
        },
    );

    match Dataset::load(&cfg.dataset) {
        Ok(ds) => print_health_item("Dataset", !ds.is_empty(), &format!("{} customers", ds.len())),
        Err(e) => print_health_item("Dataset", false, &format!("{e:#}")),
    }

    let key_present = std::env::var(&cfg.chat.api_key_env)
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false);
    print_health_item(
        "Chat API key",
        key_present,
        &if key_present {
            format!("{} is set", cfg.chat.api_key_env)
        } else {
            format!("{} is not set", cfg.chat.api_key_env)
        },
    );
    print_health_item(
        "Chat model",
        true,
        &format!("{} @ {}", cfg.chat.model, cfg.chat.endpoint),
    );
    print_health_item("Listen address", true, &cfg.server.bind_addr());

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// mallscope config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective mallscope Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.mallscope/config.toml", global_exists);
    print_source(".mallscope.toml", project_exists);
    println!("  {} {}", "·".dimmed(), "environment (PORT, MALLSCOPE_*)".dimmed());

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Write the default config file.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
