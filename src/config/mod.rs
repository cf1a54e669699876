/// Configuration system for mallscope.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::MallscopeConfig::default()`]
/// 2. **User global config**: `~/.mallscope/config.toml`
/// 3. **Project local config**: `.mallscope.toml` in the current working directory
/// 4. **Environment variables**: `PORT` and `MALLSCOPE_*` overrides (highest precedence)
///
/// The resolved config is built once in `main` and handed down by reference;
/// nothing reads it from global state.
///
/// # Usage
///
/// ```rust,ignore
/// use mallscope::config;
///
/// let cfg = config::load();
/// println!("listening on {}", cfg.server.bind_addr());
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::MallscopeConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved mallscope configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. File layers are merged key by key, so a project file only replaces
/// the values it actually sets.
pub fn load() -> MallscopeConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    // Layer 2: user global config (~/.mallscope/config.toml)
    if let Some(global) = load_toml_file(global_config_path()) {
        merge_config(&mut merged, global);
    }

    // Layer 3: project local config (.mallscope.toml)
    if let Some(project) = load_toml_file(project_config_path()) {
        merge_config(&mut merged, project);
    }

    // Layer 1 fills whatever no file set
    let resolved: Result<MallscopeConfig, _> = merged.try_into();
    let mut config = match resolved {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config files disagree with schema; using defaults");
            MallscopeConfig::default()
        }
    };

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config);

    config
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken config file must not keep the dashboard
/// from starting.
fn load_toml_file(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str::<MallscopeConfig>(&content) {
        Ok(_) => toml::from_str(&content).ok(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

/// Merge a loaded config layer into the base, table by table.
///
/// Keys present in `overlay` win; keys it does not mention are kept.
fn merge_config(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_config(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.mallscope/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mallscope").join("config.toml"))
}

/// Path to the project local config: `.mallscope.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".mallscope.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `PORT`: listener port
/// - `MALLSCOPE_HOST`: listener interface
/// - `MALLSCOPE_WORKERS`: worker thread count
/// - `MALLSCOPE_DATASET_URL`: remote CSV location
/// - `MALLSCOPE_DATASET_PATH`: local CSV file
/// - `MALLSCOPE_CHAT_URL`: chat-completion endpoint
/// - `MALLSCOPE_CHAT_MODEL`: model identifier
/// - `MALLSCOPE_CHAT_TIMEOUT_MS`: chat request timeout
/// - `MALLSCOPE_ASK_LOG`: ask log enabled (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut MallscopeConfig) {
    // Server
    if let Ok(val) = std::env::var("PORT")
        && let Ok(port) = val.trim().parse::<u16>()
    {
        config.server.port = port;
    }
    if let Ok(val) = std::env::var("MALLSCOPE_HOST")
        && !val.is_empty()
    {
        config.server.host = val;
    }
    if let Ok(val) = std::env::var("MALLSCOPE_WORKERS")
        && let Ok(workers) = val.parse::<usize>()
    {
        config.server.workers = workers.max(1);
    }

    // Dataset
    if let Ok(val) = std::env::var("MALLSCOPE_DATASET_URL")
        && !val.is_empty()
    {
        config.dataset.url = val;
    }
    if let Ok(val) = std::env::var("MALLSCOPE_DATASET_PATH") {
        config.dataset.path = val;
    }

    // Chat
    if let Ok(val) = std::env::var("MALLSCOPE_CHAT_URL")
        && !val.is_empty()
    {
        config.chat.endpoint = val;
    }
    if let Ok(val) = std::env::var("MALLSCOPE_CHAT_MODEL")
        && !val.is_empty()
    {
        config.chat.model = val;
    }
    if let Ok(val) = std::env::var("MALLSCOPE_CHAT_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.chat.timeout_ms = ms;
    }

    // Logging
    if let Ok(val) = std::env::var("MALLSCOPE_ASK_LOG") {
        config.logging.ask_log = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
pub(crate) fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.mallscope/config.toml`.
///
/// Creates the `~/.mallscope/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.mallscope/ directory")?;
    }

    fs::write(&path, MallscopeConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `server.port`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let base = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&MallscopeConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&base).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    // Reject edits that would no longer deserialize (e.g. a port out of range)
    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    toml::from_str::<MallscopeConfig>(&output)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("empty config key segment in '{key}'");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // Parse according to the type of the existing value
    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
