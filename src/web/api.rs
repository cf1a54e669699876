//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a
//! `Response<Cursor<Vec<u8>>>` with JSON content.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiny_http::{Response, StatusCode};

use crate::charts::{self, ChartSet};
use crate::filter::{self, FilterSelection};

use super::{AppState, content_type_json};

// ---------------------------------------------------------------------------
// JSON request / response types
// ---------------------------------------------------------------------------

/// Filter widget options derived from the dataset.
#[derive(Serialize)]
struct OptionsResponse {
    genders: Vec<String>,
    age_min: Option<u32>,
    age_max: Option<u32>,
    age_marks: Vec<u32>,
    total: usize,
}

/// Chart API response.
#[derive(Serialize)]
struct ChartsResponse {
    total: usize,
    matched: usize,
    selection: FilterSelection,
    charts: ChartSet,
}

/// Ask request body. Missing fields mean "not clicked" / "no question".
///
/// `clicks` is signed so a zero or negative count reaches the "not clicked"
/// path instead of failing to parse. `client` identifies the page that is
/// asking; each client may have one question in flight.
#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    clicks: i64,
    #[serde(default)]
    question: String,
    #[serde(default)]
    client: String,
}

impl AskRequest {
    /// Click count for the dispatcher; anything below one means not clicked.
    fn click_count(&self) -> u32 {
        if self.clicks <= 0 {
            0
        } else {
            u32::try_from(self.clicks).unwrap_or(u32::MAX)
        }
    }

    /// Gate key for this request. Anonymous pages share one slot.
    fn client_key(&self) -> &str {
        let client = self.client.trim();
        if client.is_empty() { "anonymous" } else { client }
    }
}

/// Health API response.
#[derive(Serialize)]
struct HealthResponse {
    records: usize,
    genders: Vec<String>,
    chat_endpoint: String,
    model: String,
    api_key_present: bool,
    ask_in_flight: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON success response.
fn json_response<T: Serialize>(data: &T) -> Result<Response<Cursor<Vec<u8>>>> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(200)))
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/options`: genders and age slider bounds.
pub fn get_options(state: &AppState) -> Result<Response<Cursor<Vec<u8>>>> {
    let range = state.dataset.age_range();
    let resp = OptionsResponse {
        genders: state.dataset.genders(),
        age_min: range.map(|(min, _)| min),
        age_max: range.map(|(_, max)| max),
        age_marks: state.dataset.age_marks(),
        total: state.dataset.len(),
    };

    json_response(&resp)
}

/// `GET /api/charts?gender=..&min_age=..`: the four charts for a selection.
pub fn get_charts(state: &AppState, query: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let selection = FilterSelection::from_query(query);
    let view = filter::filter(&state.dataset, &selection);

    let resp = ChartsResponse {
        total: state.dataset.len(),
        matched: view.len(),
        charts: charts::render(&view),
        selection,
    };

    json_response(&resp)
}

/// `POST /api/ask`: forward a question to the chat model.
///
/// Expects JSON body:
/// `{ "clicks": 1, "question": "Which customers spend most?", "client": "<page id>" }`
pub fn post_ask(state: &AppState, body: &str) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: AskRequest = serde_json::from_str(body).context("invalid JSON in ask request")?;
    let exchange = state
        .dispatcher
        .exchange(req.client_key(), req.click_count(), &req.question);
    json_response(&exchange)
}

/// `GET /api/health`: dataset and chat backend summary.
pub fn get_health(state: &AppState) -> Result<Response<Cursor<Vec<u8>>>> {
    let resp = HealthResponse {
        records: state.dataset.len(),
        genders: state.dataset.genders(),
        chat_endpoint: state.chat_endpoint.clone(),
        model: state.dispatcher.model_name().to_string(),
        api_key_present: state.dispatcher.has_credentials(),
        ask_in_flight: state.dispatcher.is_busy(),
    };

    json_response(&resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
