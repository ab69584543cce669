// SPDX-License-Identifier: MIT

//! HTTP API for the browser front end

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post, put},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::banana::error::StudioError;
use crate::banana::studio::{append_style, AppMode, GeneratedImage, Studio, STYLE_PRESETS};
use crate::banana::workflow::{
    EdgeId, ExecutorEvent, NodeId, NodeKind, PointerTarget, Position, RunOutcome, WorkflowSession,
};
use crate::genai::{GenerationClient, ImageData};

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Request body cap. Remix uploads arrive base64-encoded inside JSON, which
/// grows the file by a third.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Shared server state: the studio plus the single canvas session
#[derive(Clone)]
pub struct AppState {
    pub studio: Studio,
    pub session: Arc<WorkflowSession>,
}

impl AppState {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            studio: Studio::new(client.clone()),
            session: Arc::new(WorkflowSession::new(client)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/modes", get(list_modes))
        .route("/api/generate", post(generate))
        .route("/api/remix", post(remix))
        .route("/api/optimize", post(optimize))
        .route("/api/workflow", get(get_workflow).delete(clear_workflow))
        .route("/api/workflow/nodes", post(add_node))
        .route("/api/workflow/nodes/{id}", delete(remove_node))
        .route("/api/workflow/nodes/{id}/prompt", put(edit_prompt))
        .route("/api/workflow/edges", post(add_edge))
        .route("/api/workflow/edges/{id}", delete(remove_edge))
        .route("/api/workflow/pointer", post(pointer_event))
        .route("/api/workflow/run", post(run_workflow))
        .route("/api/workflow/run/stream", post(stream_workflow))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(
    client: Arc<dyn GenerationClient>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(AppState::new(client));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

fn studio_error(err: StudioError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        StudioError::Validation(_) | StudioError::Graph(_) => StatusCode::BAD_REQUEST,
        StudioError::Executor(_) => StatusCode::CONFLICT,
        StudioError::Generation(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

fn image_json(record: &GeneratedImage) -> Value {
    json!({
        "id": record.id,
        "mode": record.mode,
        "prompt": record.prompt,
        "image": record.image,
        "created_at": record.created_at,
        "download_name": record.download_name(),
    })
}

fn outcome_json(outcome: &RunOutcome) -> Value {
    match outcome {
        RunOutcome::Succeeded { output } => json!({ "status": "succeeded", "output": output }),
        RunOutcome::Failed(failure) => json!({ "status": "failed", "error": failure.to_string() }),
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_modes() -> Json<Value> {
    let modes: Vec<Value> = AppMode::ALL
        .iter()
        .map(|m| json!({ "mode": m, "label": m.label() }))
        .collect();
    Json(json!({ "modes": modes, "styles": STYLE_PRESETS }))
}

// === Studio modes ===

#[derive(Deserialize)]
struct PromptRequest {
    prompt: String,
}

#[derive(Deserialize)]
struct GenerateRequest {
    prompt: String,
    /// Optional style preset appended to the prompt
    #[serde(default)]
    style: Option<String>,
}

#[derive(Deserialize)]
struct RemixRequest {
    prompt: String,
    /// Source image as a data URL
    image: Option<String>,
    #[serde(default)]
    style: Option<String>,
}

fn styled_prompt(prompt: &str, style: Option<&str>) -> String {
    match style {
        Some(style) => append_style(prompt, style),
        None => prompt.to_string(),
    }
}

async fn generate(State(state): State<AppState>, Json(req): Json<GenerateRequest>) -> ApiResult {
    let prompt = styled_prompt(&req.prompt, req.style.as_deref());
    let record = state
        .studio
        .text_to_image(&prompt)
        .await
        .map_err(studio_error)?;
    Ok(Json(image_json(&record)))
}

async fn remix(State(state): State<AppState>, Json(req): Json<RemixRequest>) -> ApiResult {
    let source = match req.image.as_deref() {
        Some(url) => Some(ImageData::from_data_url(url).map_err(|e| {
            error_response(StatusCode::BAD_REQUEST, format!("Invalid source image: {}", e))
        })?),
        None => None,
    };
    let prompt = styled_prompt(&req.prompt, req.style.as_deref());
    let record = state
        .studio
        .image_to_image(&prompt, source.as_ref())
        .await
        .map_err(studio_error)?;
    Ok(Json(image_json(&record)))
}

async fn optimize(State(state): State<AppState>, Json(req): Json<PromptRequest>) -> Json<Value> {
    let prompt = state.studio.optimize(&req.prompt).await;
    Json(json!({ "prompt": prompt }))
}

// === Workflow canvas ===

async fn snapshot_json(state: &AppState) -> Json<Value> {
    let snapshot = state.session.snapshot().await;
    Json(serde_json::to_value(snapshot).unwrap_or_else(|e| json!({ "error": e.to_string() })))
}

async fn get_workflow(State(state): State<AppState>) -> Json<Value> {
    snapshot_json(&state).await
}

async fn clear_workflow(State(state): State<AppState>) -> Json<Value> {
    state.session.editor().lock().await.clear();
    snapshot_json(&state).await
}

#[derive(Deserialize)]
struct AddNodeRequest {
    kind: NodeKind,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

async fn add_node(State(state): State<AppState>, Json(req): Json<AddNodeRequest>) -> Json<Value> {
    let id = state
        .session
        .editor()
        .lock()
        .await
        .add_node(req.kind, Position::new(req.x, req.y));
    Json(json!({ "id": id }))
}

async fn remove_node(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let removed = state
        .session
        .editor()
        .lock()
        .await
        .remove_node(&NodeId(id));
    Json(json!({ "removed": removed }))
}

async fn edit_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PromptRequest>,
) -> ApiResult {
    state
        .session
        .editor()
        .lock()
        .await
        .edit_prompt(&NodeId(id), req.prompt)
        .map_err(|e| studio_error(e.into()))?;
    Ok(snapshot_json(&state).await)
}

#[derive(Deserialize)]
struct AddEdgeRequest {
    source: NodeId,
    target: NodeId,
}

async fn add_edge(State(state): State<AppState>, Json(req): Json<AddEdgeRequest>) -> ApiResult {
    let id = state
        .session
        .editor()
        .lock()
        .await
        .connect(&req.source, &req.target)
        .map_err(|e| studio_error(e.into()))?;
    Ok(Json(json!({ "id": id })))
}

async fn remove_edge(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let removed = state
        .session
        .editor()
        .lock()
        .await
        .disconnect(&EdgeId(id));
    Json(json!({ "removed": removed }))
}

#[derive(Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum PointerEvent {
    Down {
        target: PointerTarget,
        x: f64,
        y: f64,
    },
    Move {
        x: f64,
        y: f64,
    },
    Up,
    Click {
        target: PointerTarget,
    },
}

async fn pointer_event(State(state): State<AppState>, Json(event): Json<PointerEvent>) -> Json<Value> {
    {
        let mut editor = state.session.editor().lock().await;
        match event {
            PointerEvent::Down { target, x, y } => editor.pointer_down(&target, Position::new(x, y)),
            PointerEvent::Move { x, y } => editor.pointer_move(Position::new(x, y)),
            PointerEvent::Up => editor.pointer_up(),
            PointerEvent::Click { target } => editor.click(&target),
        }
    }
    snapshot_json(&state).await
}

async fn run_workflow(State(state): State<AppState>) -> ApiResult {
    let outcome = state
        .session
        .run()
        .await
        .map_err(|e| studio_error(e.into()))?;
    Ok(Json(outcome_json(&outcome)))
}

async fn stream_workflow(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        log::info!("Starting streaming workflow run");
        // Rejections are reported through the channel as well
        let _ = state.session.run_stream(tx).await;
    });

    let stream = ReceiverStream::new(rx).map(|event: ExecutorEvent| {
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().data("serialization error")))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::GenerationError;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct FixedClient;

    #[async_trait]
    impl GenerationClient for FixedClient {
        async fn generate_from_text(&self, _prompt: &str) -> Result<ImageData, GenerationError> {
            Ok(ImageData::new("image/png", vec![1, 2, 3]))
        }

        async fn generate_from_image_and_text(
            &self,
            _prompt: &str,
            _source: &ImageData,
        ) -> Result<ImageData, GenerationError> {
            Err(GenerationError::other("quota exceeded"))
        }

        async fn rewrite_prompt(&self, prompt: &str) -> Result<String, GenerationError> {
            Ok(format!("{}, golden hour", prompt))
        }
    }

    /// Generation blocks until `release` is notified
    struct GatedClient {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl GenerationClient for GatedClient {
        async fn generate_from_text(&self, _prompt: &str) -> Result<ImageData, GenerationError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(ImageData::new("image/png", vec![1, 2, 3]))
        }

        async fn generate_from_image_and_text(
            &self,
            prompt: &str,
            _source: &ImageData,
        ) -> Result<ImageData, GenerationError> {
            self.generate_from_text(prompt).await
        }

        async fn rewrite_prompt(&self, prompt: &str) -> Result<String, GenerationError> {
            Ok(prompt.to_string())
        }
    }

    fn state() -> AppState {
        AppState::new(Arc::new(FixedClient))
    }

    /// Serve the router on an ephemeral port and return its base URL
    async fn spawn_server(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_generate_returns_data_url() {
        let Json(body) = generate(
            State(state()),
            Json(GenerateRequest {
                prompt: "banana".into(),
                style: Some("pixel art".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(body["image"], "data:image/png;base64,AQID");
        assert_eq!(body["prompt"], "banana, pixel art");
        assert!(body["download_name"]
            .as_str()
            .unwrap()
            .starts_with("banana-gen-"));
    }

    #[tokio::test]
    async fn test_generate_blank_prompt_is_bad_request() {
        let (status, Json(body)) = generate(
            State(state()),
            Json(GenerateRequest {
                prompt: "".into(),
                style: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Prompt must not be empty");
    }

    #[tokio::test]
    async fn test_remix_surfaces_generation_error() {
        let (status, Json(body)) = remix(
            State(state()),
            Json(RemixRequest {
                prompt: "make it blue".into(),
                image: Some("data:image/png;base64,AQID".into()),
                style: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "quota exceeded");
    }

    #[tokio::test]
    async fn test_optimize() {
        let Json(body) = optimize(
            State(state()),
            Json(PromptRequest {
                prompt: "banana".into(),
            }),
        )
        .await;
        assert_eq!(body["prompt"], "banana, golden hour");
    }

    #[tokio::test]
    async fn test_run_workflow_fills_output() {
        let state = state();
        let Json(body) = run_workflow(State(state.clone())).await.unwrap();
        assert_eq!(body["status"], "succeeded");

        let Json(snapshot) = get_workflow(State(state)).await;
        assert_eq!(
            snapshot["nodes"][2]["payload"]["image"],
            "data:image/png;base64,AQID"
        );
        assert_eq!(snapshot["executor"]["state"], "idle");
        assert_eq!(snapshot["connectors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pointer_drag_round_trip() {
        let state = state();
        let events = [
            json!({ "event": "down", "target": { "type": "node", "node": "1" }, "x": 0.0, "y": 0.0 }),
            json!({ "event": "move", "x": 15.0, "y": 5.0 }),
            json!({ "event": "up" }),
        ];
        let mut last = Value::Null;
        for event in events {
            let event: PointerEvent = serde_json::from_value(event).unwrap();
            let Json(snapshot) = pointer_event(State(state.clone()), Json(event)).await;
            last = snapshot;
        }
        assert_eq!(last["nodes"][0]["position"], json!({ "x": 65.0, "y": 105.0 }));
        assert_eq!(last["selection"], "1");
        assert!(last["drag"].is_null());
    }

    #[tokio::test]
    async fn test_add_edge_to_missing_node_is_bad_request() {
        let (status, _) = add_edge(
            State(state()),
            Json(AddEdgeRequest {
                source: "1".into(),
                target: "99".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_remix_accepts_multi_megabyte_upload() {
        let base = spawn_server(state()).await;
        let photo = ImageData::new("image/jpeg", vec![0xAB; 3 * 1024 * 1024]);

        let resp = reqwest::Client::new()
            .post(format!("{}/api/remix", base))
            .json(&json!({ "prompt": "make it blue", "image": photo.to_data_url() }))
            .send()
            .await
            .unwrap();

        // The upload reaches the client, which fails with its own error
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "quota exceeded");
    }

    #[tokio::test]
    async fn test_concurrent_stream_is_rejected() {
        let client = Arc::new(GatedClient {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let base = spawn_server(AppState::new(client.clone())).await;
        let http = reqwest::Client::new();
        let url = format!("{}/api/workflow/run/stream", base);

        let first = {
            let http = http.clone();
            let url = url.clone();
            tokio::spawn(async move { http.post(url).send().await.unwrap().text().await.unwrap() })
        };
        client.entered.notified().await;

        let second = http.post(&url).send().await.unwrap().text().await.unwrap();
        assert!(second.contains("Rejected"), "{}", second);
        assert!(second.contains("Workflow is already running"), "{}", second);
        assert!(!second.contains("Started"), "{}", second);

        client.release.notify_one();
        let first = first.await.unwrap();
        assert!(first.contains("Started"), "{}", first);
        assert!(first.contains("Succeeded"), "{}", first);
    }
}
