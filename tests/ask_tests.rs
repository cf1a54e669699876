/// Query dispatcher tests.
///
/// The remote model is simulated in two ways: canned `ChatBackend`
/// implementations for dispatcher behavior, and a throwaway `tiny_http`
/// listener on 127.0.0.1 for the real `ureq` client. No test reaches the
/// public internet.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use mallscope::llm::client::{ChatClient, extract_answer};
use mallscope::llm::{BUSY_MESSAGE, ChatBackend, ChatMessage, Dispatcher, ERROR_PREFIX, LOCAL_CLIENT};

// ---------------------------------------------------------------------------
// Simulated backends
// ---------------------------------------------------------------------------

/// Parses a fixed raw response body the way the HTTP client does.
struct CannedBody(&'static str);

impl ChatBackend for CannedBody {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        let body: serde_json::Value = serde_json::from_str(self.0)?;
        extract_answer(&body)
    }
}

/// Counts calls; always fails like a refused connection.
#[derive(Default)]
struct Refused {
    calls: AtomicUsize,
}

impl ChatBackend for Refused {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("connection refused")
    }
}

/// Blocks inside `complete` until released, to hold the gate open.
struct Blocking {
    entered: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl ChatBackend for Blocking {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        self.entered.wait();
        self.release.wait();
        Ok("done".to_string())
    }
}

// ---------------------------------------------------------------------------
// No-dispatch cases
// ---------------------------------------------------------------------------

#[test]
fn zero_clicks_or_empty_question_sends_nothing() {
    let backend = Arc::new(Refused::default());
    let dispatcher = Dispatcher::new(Arc::clone(&backend));

    assert_eq!(dispatcher.ask(0, "Who spends most?"), "");
    assert_eq!(dispatcher.ask(0, ""), "");
    assert_eq!(dispatcher.ask(1, ""), "");
    assert_eq!(dispatcher.ask(7, ""), "");
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn whitespace_question_is_still_dispatched() {
    let backend = Arc::new(Refused::default());
    let dispatcher = Dispatcher::new(Arc::clone(&backend));

    let answer = dispatcher.ask(1, "   ");
    assert!(answer.starts_with(ERROR_PREFIX), "got {answer:?}");
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn returns_first_choice_content_verbatim() {
    let dispatcher = Dispatcher::new(CannedBody(
        r#"{"choices":[{"message":{"content":"Women aged 30-40 spend most"}}]}"#,
    ));
    assert_eq!(
        dispatcher.ask(1, "Which segment spends most?"),
        "Women aged 30-40 spend most"
    );
}

#[test]
fn connection_error_becomes_text() {
    let backend = Arc::new(Refused::default());
    let dispatcher = Dispatcher::new(Arc::clone(&backend));

    let answer = dispatcher.ask(1, "Which segment spends most?");
    assert!(answer.starts_with(ERROR_PREFIX), "got {answer:?}");
    assert!(answer.contains("connection refused"));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn malformed_payload_becomes_text() {
    let dispatcher = Dispatcher::new(CannedBody(r#"{"unexpected": true}"#));
    assert!(dispatcher.ask(1, "q").starts_with(ERROR_PREFIX));

    let dispatcher = Dispatcher::new(CannedBody("<html>502 Bad Gateway</html>"));
    assert!(dispatcher.ask(1, "q").starts_with(ERROR_PREFIX));
}

// ---------------------------------------------------------------------------
// Overlap guard
// ---------------------------------------------------------------------------

#[test]
fn overlapping_ask_is_turned_away() {
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let dispatcher = Arc::new(Dispatcher::new(Blocking {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    }));

    let first = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.ask(1, "first"))
    };

    // First request is now inside the backend
    entered.wait();
    assert!(dispatcher.is_busy());
    assert!(dispatcher.is_busy_for(LOCAL_CLIENT));
    assert_eq!(dispatcher.ask(2, "second"), BUSY_MESSAGE);

    release.wait();
    assert_eq!(first.join().unwrap(), "done");
    assert!(!dispatcher.is_busy());
}

#[test]
fn other_clients_are_not_turned_away() {
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let dispatcher = Arc::new(Dispatcher::new(Blocking {
        entered: Arc::clone(&entered),
        release: Arc::clone(&release),
    }));

    let first = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.ask_from("page-a", 1, "first"))
    };
    entered.wait();
    assert!(dispatcher.is_busy_for("page-a"));
    assert!(!dispatcher.is_busy_for("page-b"));
    assert_eq!(dispatcher.ask_from("page-a", 2, "again"), BUSY_MESSAGE);

    // A second page gets through while page-a is still waiting
    let second = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || dispatcher.ask_from("page-b", 1, "second"))
    };
    entered.wait();

    // Both pages now meet at the release barrier and finish together
    assert_eq!(first.join().unwrap(), "done");
    assert_eq!(second.join().unwrap(), "done");
    assert!(!dispatcher.is_busy());
}

// ---------------------------------------------------------------------------
// Real HTTP client against a local listener
// ---------------------------------------------------------------------------

/// What the fake endpoint saw.
struct Captured {
    authorization: Option<String>,
    body: serde_json::Value,
}

/// Serve exactly one request with `status` and `reply`, reporting what arrived.
fn one_shot_server(status: u16, reply: &'static str) -> (String, mpsc::Receiver<Captured>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            let mut raw = String::new();
            request.as_reader().read_to_string(&mut raw).unwrap();
            let body = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);

            let response = tiny_http::Response::from_string(reply).with_status_code(status);
            let _ = request.respond(response);
            let _ = tx.send(Captured { authorization, body });
        }
    });

    (format!("http://{addr}/openai/v1/chat/completions"), rx)
}

#[test]
fn client_posts_model_messages_and_bearer_token() {
    let (endpoint, seen) = one_shot_server(
        200,
        r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Women aged 30-40 spend most"}}]}"#,
    );
    let client = ChatClient::new(
        endpoint,
        "llama3-8b-8192",
        Some("test-key".to_string()),
        Duration::from_secs(5),
    );
    let dispatcher = Dispatcher::new(client);

    assert_eq!(
        dispatcher.ask(1, "Which segment spends most?"),
        "Women aged 30-40 spend most"
    );

    let captured = seen.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(captured.authorization.as_deref(), Some("Bearer test-key"));
    assert_eq!(captured.body["model"], "llama3-8b-8192");
    let messages = captured.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "Which segment spends most?");
}

#[test]
fn client_reports_http_status_errors() {
    let (endpoint, _seen) = one_shot_server(401, r#"{"error":{"message":"Invalid API Key"}}"#);
    let client = ChatClient::new(endpoint, "m", Some("bad".to_string()), Duration::from_secs(5));
    let answer = Dispatcher::new(client).ask(1, "q");

    assert!(answer.starts_with(ERROR_PREFIX));
    assert!(answer.contains("401"));
    assert!(answer.contains("Invalid API Key"));
}

#[test]
fn client_connection_refused_never_panics() {
    // Bind then drop to get a local port with nothing listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = ChatClient::new(
        format!("http://127.0.0.1:{port}/v1/chat/completions"),
        "m",
        Some("k".to_string()),
        Duration::from_secs(2),
    );
    let answer = Dispatcher::new(client).ask(1, "q");
    assert!(answer.starts_with(ERROR_PREFIX), "got {answer:?}");
}

#[test]
fn client_without_key_explains_itself() {
    let client = ChatClient::new("http://127.0.0.1:9/v1", "m", None, Duration::from_secs(1));
    let answer = Dispatcher::new(client).ask(1, "q");
    assert!(answer.starts_with(ERROR_PREFIX));
    assert!(answer.contains("no API key"));
}
