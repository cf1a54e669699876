/// Configuration schema and defaults for mallscope.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[server]`, `[dataset]`, `[chat]`, and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Public CSV with the mall customer dataset.
pub const DEFAULT_DATASET_URL: &str = "https://raw.githubusercontent.com/EdwinAAH/Inteligencia-de-negocios/refs/heads/main/Mall_Customers.csv";

/// OpenAI-compatible chat-completion endpoint.
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

pub const DEFAULT_CHAT_MODEL: &str = "llama3-8b-8192";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert in mall customer analysis.";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level mallscope configuration.
///
/// Maps directly to the `~/.mallscope/config.toml` and `.mallscope.toml`
/// file schemas. All sections and fields are optional: missing values fall
/// back to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MallscopeConfig {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub chat: ChatConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind. `0.0.0.0` listens on all interfaces.
    pub host: String,
    /// TCP port. `PORT` in the environment takes precedence.
    pub port: u16,
    /// Number of worker threads pulling requests off the listener.
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8050,
            workers: 4,
        }
    }
}

impl ServerConfig {
    /// `host:port` string accepted by `tiny_http::Server::http`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// [dataset]
// ---------------------------------------------------------------------------

/// Where the customer CSV is loaded from at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Remote CSV location.
    pub url: String,
    /// Local CSV file. When non-empty it is used instead of `url`.
    pub path: String,
    /// Timeout for fetching the remote CSV (milliseconds).
    pub fetch_timeout_ms: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATASET_URL.to_string(),
            path: String::new(),
            fetch_timeout_ms: 30_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [chat]
// ---------------------------------------------------------------------------

/// Remote chat-completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Full URL of the chat-completion endpoint.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// System instruction preceding the user's question.
    pub system_prompt: String,
    /// Request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Name of the environment variable holding the bearer token.
    ///
    /// The token itself is never stored in a config file.
    pub api_key_env: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_ms: 30_000,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Ask-log settings. Diagnostic log verbosity is controlled by `MALLSCOPE_LOG`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append one JSONL entry per dispatched question.
    pub ask_log: bool,
    /// Override for the ask-log location (default `~/.mallscope/ask-log.jsonl`).
    pub ask_log_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            ask_log: true,
            ask_log_path: String::new(),
        }
    }
}

impl LoggingConfig {
    /// Resolve the ask-log file, honoring the override.
    pub fn resolved_ask_log_path(&self) -> Option<PathBuf> {
        if self.ask_log_path.is_empty() {
            crate::analytics::logger::ask_log_path()
        } else {
            Some(PathBuf::from(&self.ask_log_path))
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl MallscopeConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `mallscope config init` to create a commented starting point.
    pub fn default_toml() -> String {
        format!(
            r#"# mallscope Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (PORT, MALLSCOPE_*)
#   2. Project config (.mallscope.toml in current directory)
#   3. User global config (~/.mallscope/config.toml)
#   4. Built-in defaults

[server]
host = "0.0.0.0"
port = 8050           # PORT overrides
workers = 4

[dataset]
url = "{DEFAULT_DATASET_URL}"
path = ""             # Local CSV; takes precedence over url when set
fetch_timeout_ms = 30000

[chat]
endpoint = "{DEFAULT_CHAT_ENDPOINT}"
model = "{DEFAULT_CHAT_MODEL}"
system_prompt = "{DEFAULT_SYSTEM_PROMPT}"
timeout_ms = 30000
api_key_env = "GROQ_API_KEY"   # The key is read from this variable at startup

[logging]
ask_log = true
ask_log_path = ""     # Default: ~/.mallscope/ask-log.jsonl
"#
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
