//! Shared integration-test harness: an in-process fake of the mock server's
//! admin API, plus helpers for running the compiled `stubchaos` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use stubchaos::config::Target;
use stubchaos::mutation::Orchestrator;
use stubchaos::store::HttpStore;

/// Per-call timeout used by test targets.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// State held by the fake admin API.
#[derive(Debug, Default)]
pub struct AdminState {
    /// Current mappings, in creation order.
    pub mappings: Vec<Value>,
    /// Mappings restored by `POST /__admin/mappings/reset`.
    pub persisted: Vec<Value>,
    /// Last settings document posted.
    pub settings: Option<Value>,
    /// `"METHOD path"` for every request received.
    pub requests: Vec<String>,
    /// Ids whose `PUT` answers 500.
    pub failing_updates: Vec<String>,
    /// When set, `PUT` echoes this id instead of the stored one.
    pub echo_id: Option<String>,
    next_id: u64,
}

type Shared = Arc<Mutex<AdminState>>;

fn lock(state: &Shared) -> MutexGuard<'_, AdminState> {
    state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A fake admin API listening on an ephemeral localhost port.
///
/// The server task is aborted on drop.
pub struct FakeAdmin {
    /// Base url (without `/__admin`).
    pub url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl FakeAdmin {
    /// Starts an empty server.
    pub async fn start() -> Self {
        Self::with_mappings(Vec::new()).await
    }

    /// Starts a server holding `mappings`. Mappings without an id get one.
    #[allow(clippy::missing_panics_doc)]
    pub async fn with_mappings(mappings: Vec<Value>) -> Self {
        let mut state = AdminState::default();
        for mut mapping in mappings {
            if mapping.get("id").is_none() {
                state.next_id += 1;
                mapping["id"] = json!(format!("m{}", state.next_id));
            }
            state.mappings.push(mapping);
        }
        state.persisted = state.mappings.clone();
        let state = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/__admin/mappings", get(list_mappings).post(create_mapping))
            .route("/__admin/mappings/reset", post(reset_mappings))
            .route(
                "/__admin/mappings/{id}",
                get(get_mapping).put(update_mapping).delete(delete_mapping),
            )
            .route("/__admin/settings", post(post_settings))
            .route("/__admin/reset", post(reset_all))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake admin");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake admin server");
        });

        Self {
            url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Target pointing at this server.
    pub fn target(&self) -> Target {
        Target {
            url: self.url.clone(),
            timeout: TEST_TIMEOUT,
        }
    }

    /// Orchestrator backed by an [`HttpStore`] on this server.
    #[allow(clippy::missing_panics_doc)]
    pub fn orchestrator(&self) -> Orchestrator<HttpStore> {
        Orchestrator::new(HttpStore::new(&self.target()).expect("http store"))
    }

    /// Snapshot of the stored mappings.
    pub fn mappings(&self) -> Vec<Value> {
        lock(&self.state).mappings.clone()
    }

    /// Stored mapping by id.
    pub fn mapping(&self, id: &str) -> Option<Value> {
        lock(&self.state)
            .mappings
            .iter()
            .find(|m| m["id"] == id)
            .cloned()
    }

    /// Last posted settings.
    pub fn settings(&self) -> Option<Value> {
        lock(&self.state).settings.clone()
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// Number of requests with the given method.
    pub fn count(&self, method: &str) -> usize {
        let prefix = format!("{method} ");
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.starts_with(&prefix))
            .count()
    }

    /// Makes `PUT` for `id` answer 500.
    pub fn fail_updates_for(&self, id: &str) {
        lock(&self.state).failing_updates.push(id.to_string());
    }

    /// Makes every `PUT` echo `id`.
    pub fn echo_id(&self, id: &str) {
        lock(&self.state).echo_id = Some(id.to_string());
    }
}

impl Drop for FakeAdmin {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "errors": [{ "title": format!("mapping {id} not found") }] })),
    )
        .into_response()
}

async fn list_mappings(State(state): State<Shared>) -> Json<Value> {
    let mut state = lock(&state);
    state.requests.push("GET /__admin/mappings".to_string());
    let total = state.mappings.len();
    Json(json!({ "mappings": state.mappings, "meta": { "total": total } }))
}

async fn create_mapping(State(state): State<Shared>, Json(mut mapping): Json<Value>) -> Response {
    let mut state = lock(&state);
    state.requests.push("POST /__admin/mappings".to_string());
    state.next_id += 1;
    mapping["id"] = json!(format!("m{}", state.next_id));
    state.mappings.push(mapping.clone());
    (StatusCode::CREATED, Json(mapping)).into_response()
}

async fn get_mapping(State(state): State<Shared>, UrlPath(id): UrlPath<String>) -> Response {
    let mut state = lock(&state);
    state.requests.push(format!("GET /__admin/mappings/{id}"));
    match state.mappings.iter().find(|m| m["id"] == id.as_str()) {
        Some(mapping) => Json(mapping.clone()).into_response(),
        None => not_found(&id),
    }
}

async fn update_mapping(
    State(state): State<Shared>,
    UrlPath(id): UrlPath<String>,
    Json(mut mapping): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    state.requests.push(format!("PUT /__admin/mappings/{id}"));
    if state.failing_updates.contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "update refused").into_response();
    }
    let echoed = state.echo_id.clone().unwrap_or_else(|| id.clone());
    let Some(slot) = state.mappings.iter_mut().find(|m| m["id"] == id.as_str()) else {
        return not_found(&id);
    };
    mapping["id"] = json!(id);
    *slot = mapping.clone();
    mapping["id"] = json!(echoed);
    Json(mapping).into_response()
}

async fn delete_mapping(State(state): State<Shared>, UrlPath(id): UrlPath<String>) -> Response {
    let mut state = lock(&state);
    state.requests.push(format!("DELETE /__admin/mappings/{id}"));
    let before = state.mappings.len();
    state.mappings.retain(|m| m["id"] != id.as_str());
    if state.mappings.len() == before {
        return not_found(&id);
    }
    StatusCode::OK.into_response()
}

async fn post_settings(State(state): State<Shared>, Json(settings): Json<Value>) -> StatusCode {
    let mut state = lock(&state);
    state.requests.push("POST /__admin/settings".to_string());
    state.settings = Some(settings);
    StatusCode::OK
}

async fn reset_all(State(state): State<Shared>) -> StatusCode {
    let mut state = lock(&state);
    state.requests.push("POST /__admin/reset".to_string());
    state.mappings = state.persisted.clone();
    state.settings = None;
    StatusCode::OK
}

async fn reset_mappings(State(state): State<Shared>) -> StatusCode {
    let mut state = lock(&state);
    state.requests.push("POST /__admin/mappings/reset".to_string());
    state.mappings = state.persisted.clone();
    StatusCode::OK
}

// ============================================================================
// Binary helpers
// ============================================================================

/// Path to the compiled `stubchaos` binary.
pub fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_stubchaos")
}

/// Runs the binary with `args` and returns its output.
pub async fn run_cli(args: &[&str]) -> std::process::Output {
    run_cli_env(args, &[]).await
}

/// Runs the binary with `args` and extra environment variables.
#[allow(clippy::missing_panics_doc)]
pub async fn run_cli_env(args: &[&str], envs: &[(&str, &str)]) -> std::process::Output {
    tokio::process::Command::new(bin())
        .args(args)
        .envs(envs.iter().copied())
        .env_remove("STUBCHAOS_URL")
        .env_remove("STUBCHAOS_CONFIG")
        .env_remove("STUBCHAOS_HOST")
        .env_remove("STUBCHAOS_PORT")
        .output()
        .await
        .expect("failed to run stubchaos")
}

/// Parses the binary's stdout as JSON.
#[allow(clippy::missing_panics_doc)]
pub fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}"))
}

/// Path to a file in `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
