/// Question dispatcher: forwards a dashboard question to a remote
/// chat-completion model and returns the reply as plain text.
///
/// # Behavior
///
/// - Nothing is sent unless the ask button has been clicked at least once
///   and the question is non-empty; the answer is then `""`. The question
///   text is forwarded as typed, whitespace included.
/// - The conversation is always two turns: a fixed system instruction and
///   the user's question.
/// - Every failure (missing key, network, HTTP status, malformed payload)
///   becomes a human-readable string in place of the answer. [`Dispatcher::ask`]
///   never returns an error and never panics on a remote failure.
/// - One question at a time per client: while a client's request is in
///   flight, further asks from that client get [`BUSY_MESSAGE`] (see
///   [`gate::AskGate`]). Other clients are served normally.
///
/// # Architecture
///
/// [`ChatBackend`] is the seam between the dispatcher and the transport.
/// [`client::ChatClient`] is the real `ureq` implementation; tests plug in
/// canned backends.
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod client;
pub mod gate;

use crate::analytics::logger::{self, AskLogEntry};
use crate::config::MallscopeConfig;
use crate::config::schema::DEFAULT_SYSTEM_PROMPT;
use client::ChatClient;
use gate::AskGate;

/// Prefix of the text returned in place of an answer when the call fails.
pub const ERROR_PREFIX: &str = "Error querying the assistant";

/// Returned when a question arrives while another is still being answered.
pub const BUSY_MESSAGE: &str = "Another question is still being answered. Please wait.";

/// Client key used by [`Dispatcher::ask`] when the caller has no identity
/// of its own (the CLI, tests).
pub const LOCAL_CLIENT: &str = "local";

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One question and whatever came back for it (answer or error text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub question: String,
    pub answer: String,
}

/// Anything that can turn a conversation into a reply.
pub trait ChatBackend: Send + Sync {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str {
        "unknown"
    }

    /// Whether the backend has what it needs to authenticate.
    fn has_credentials(&self) -> bool {
        true
    }
}

impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(messages)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn has_credentials(&self) -> bool {
        (**self).has_credentials()
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    backend: Box<dyn ChatBackend>,
    system_prompt: String,
    gate: AskGate,
    ask_log: Option<PathBuf>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("model", &self.backend.model_name())
            .field("system_prompt", &self.system_prompt)
            .field("busy", &self.gate.is_busy())
            .field("ask_log", &self.ask_log)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(backend: impl ChatBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            gate: AskGate::new(),
            ask_log: None,
        }
    }

    /// Dispatcher over the real HTTP client, as configured.
    pub fn from_config(config: &MallscopeConfig) -> Self {
        let client = ChatClient::from_config(&config.chat);
        if !client.has_credentials() {
            tracing::warn!(
                env = %config.chat.api_key_env,
                "no chat API key in environment; questions will return an error"
            );
        }

        let mut dispatcher = Self::new(client).with_system_prompt(config.chat.system_prompt.clone());
        if config.logging.ask_log
            && let Some(path) = config.logging.resolved_ask_log_path()
        {
            dispatcher = dispatcher.with_ask_log(path);
        }
        dispatcher
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Append one JSONL line per dispatched question to `path`.
    pub fn with_ask_log(mut self, path: PathBuf) -> Self {
        self.ask_log = Some(path);
        self
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Whether the backend has an API key (or needs none).
    pub fn has_credentials(&self) -> bool {
        self.backend.has_credentials()
    }

    /// Whether any client has a question in flight.
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Whether `client` has a question in flight.
    pub fn is_busy_for(&self, client: &str) -> bool {
        self.gate.is_busy_for(client)
    }

    /// The two-turn conversation sent for `question`.
    pub fn build_messages(&self, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(question),
        ]
    }

    /// Answer `question` for the [`LOCAL_CLIENT`].
    pub fn ask(&self, clicks: u32, question: &str) -> String {
        self.ask_from(LOCAL_CLIENT, clicks, question)
    }

    /// Answer `question` if the ask button has been clicked.
    ///
    /// Returns `""` without contacting the backend when `clicks == 0` or the
    /// question is empty. Returns [`BUSY_MESSAGE`] when `client` already has
    /// a question in flight.
    pub fn ask_from(&self, client: &str, clicks: u32, question: &str) -> String {
        if clicks == 0 || question.is_empty() {
            return String::new();
        }

        let Some(_permit) = self.gate.try_acquire(client) else {
            tracing::info!(client, "ask rejected: this client already has a question in flight");
            return BUSY_MESSAGE.to_string();
        };

        let messages = self.build_messages(question);
        let start = Instant::now();
        let result = self.backend.complete(&messages);
        let latency_ms = start.elapsed().as_millis() as u64;

        let (answer, success) = match result {
            Ok(answer) => {
                tracing::info!(
                    model = self.backend.model_name(),
                    latency_ms,
                    answer_chars = answer.chars().count(),
                    "question answered"
                );
                (answer, true)
            }
            Err(e) => {
                tracing::warn!(
                    model = self.backend.model_name(),
                    latency_ms,
                    error = %format!("{e:#}"),
                    "question failed"
                );
                (format!("{ERROR_PREFIX}: {e:#}"), false)
            }
        };

        if let Some(path) = &self.ask_log {
            logger::log_ask(
                path,
                &AskLogEntry::new(
                    self.backend.model_name(),
                    question.chars().count(),
                    answer.chars().count(),
                    latency_ms,
                    success,
                ),
            );
        }

        answer
    }

    /// [`ask_from`](Self::ask_from), packaged with the question.
    pub fn exchange(&self, client: &str, clicks: u32, question: &str) -> ChatExchange {
        ChatExchange {
            question: question.to_string(),
            answer: self.ask_from(client, clicks, question),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
