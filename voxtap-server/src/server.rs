use crate::error::AppError;
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use voxtap_core::{
    ActionDescriptor, Command, CommandEngine, ConversationRecord, ElementDescriptor,
    EngineError, Resolution, Strategy, SymbolicTarget,
};
use voxtap_providers::{LLMProvider, Message};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CommandEngine>,
    provider: Option<Arc<dyn LLMProvider>>,
    provider_timeout: Duration,
}

impl AppState {
    pub fn new(
        engine: Arc<CommandEngine>,
        provider: Option<Arc<dyn LLMProvider>>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            provider,
            provider_timeout,
        }
    }
}

// --- Request/Response Types ---
#[derive(Deserialize)]
struct CommandRequest {
    #[serde(default)]
    command_text: String,
    screen_context: Option<String>,
    #[serde(default)]
    ui_elements: Vec<ElementDescriptor>,
    /// Also hand the resolved action to the executor.
    #[serde(default)]
    execute: bool,
}

#[derive(Serialize)]
struct CommandResponse {
    action: ActionDescriptor,
    target: SymbolicTarget,
    strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    performed: Option<bool>,
    history: Vec<ConversationRecord>,
}

#[derive(Serialize)]
struct CommandFailure {
    error: &'static str,
    history: Vec<ConversationRecord>,
}

#[derive(Deserialize)]
struct AnalyzeImageRequest {
    #[serde(default)]
    command: String,
    image: Option<String>,
}

#[derive(Deserialize)]
struct FindElementRequest {
    #[serde(default)]
    voice_command: String,
    #[serde(default)]
    ui_elements: Vec<ElementDescriptor>,
}

#[derive(Deserialize)]
struct ActionRequest {
    action: String,
    app_name: Option<String>,
    task_name: Option<String>,
    x: Option<i32>,
    y: Option<i32>,
}

#[derive(Serialize)]
struct ActionResponse {
    result: bool,
    history: Vec<ConversationRecord>,
}

#[derive(Deserialize)]
struct LlmRequest {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct LlmResponse {
    response_text: String,
}

fn build_command(
    text: String,
    screen_context: Option<String>,
    ui_elements: Vec<ElementDescriptor>,
) -> Result<Command, EngineError> {
    let mut command = Command::new(text.trim())?;
    if let Some(image) = screen_context {
        command = command.with_screen_context(image)?;
    }
    command.with_ui_elements(ui_elements)
}

// --- Handlers ---
async fn command_handler(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;
    let command = build_command(
        payload.command_text,
        payload.screen_context,
        payload.ui_elements,
    )?;

    let outcome = state.engine.handle(command).await;
    let performed = if payload.execute {
        Some(state.engine.perform(&outcome).await)
    } else {
        None
    };

    match outcome.resolution {
        Resolution::Resolved {
            action,
            target,
            strategy,
            ..
        } => Ok(Json(CommandResponse {
            action,
            target,
            strategy,
            performed,
            history: outcome.history,
        })
        .into_response()),
        Resolution::Failed { .. } => Ok((
            StatusCode::BAD_REQUEST,
            Json(CommandFailure {
                error: "no_match",
                history: outcome.history,
            }),
        )
            .into_response()),
    }
}

/// Screen-capture flow used by the mobile client: answers with bare
/// coordinates.
async fn analyze_image_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeImageRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(payload) = payload?;
    let command = build_command(payload.command, payload.image, Vec::new())?;
    let outcome = state.engine.handle(command).await;

    if let Some(err) = outcome.error() {
        return Err(err.into());
    }
    match outcome.resolution.action() {
        ActionDescriptor::Tap { x, y } => Ok(Json(json!({ "x": x, "y": y }))),
        other => Ok(Json(json!({ "action": other }))),
    }
}

async fn find_element_handler(
    State(state): State<AppState>,
    payload: Result<Json<FindElementRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(payload) = payload?;
    let text = payload.voice_command.trim();
    if text.is_empty() {
        return Err(EngineError::InvalidInput("voice_command must not be empty".to_string()).into());
    }

    let element = state
        .engine
        .find_element(text, &payload.ui_elements)
        .ok_or(AppError::ElementNotFound)?;
    Ok(Json(json!({ "element": element })))
}

async fn action_handler(
    State(state): State<AppState>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    let Json(payload) = payload?;
    let missing = |field: &str| {
        EngineError::InvalidInput(format!("'{}' requires '{}'", payload.action, field))
    };

    let action = match payload.action.as_str() {
        "open_app" => ActionDescriptor::LaunchApp {
            name: payload.app_name.clone().ok_or_else(|| missing("app_name"))?,
        },
        "run_tasker" => ActionDescriptor::RunTask {
            name: payload.task_name.clone().ok_or_else(|| missing("task_name"))?,
        },
        "click_button" | "tap" => ActionDescriptor::Tap {
            x: payload.x.ok_or_else(|| missing("x"))?,
            y: payload.y.ok_or_else(|| missing("y"))?,
        },
        other => {
            return Err(EngineError::InvalidInput(format!("Unknown action: {}", other)).into());
        }
    };

    let description = match &action {
        ActionDescriptor::LaunchApp { name } | ActionDescriptor::RunTask { name } => {
            format!("{} {}", payload.action, name)
        }
        ActionDescriptor::Tap { x, y } => format!("{} ({}, {})", payload.action, x, y),
        ActionDescriptor::None => payload.action.clone(),
    };

    let dispatched = state.engine.dispatch(&description, action).await?;
    Ok(Json(ActionResponse {
        result: dispatched.performed,
        history: dispatched.history,
    }))
}

/// Free-form passthrough to the configured provider.
async fn llm_handler(
    State(state): State<AppState>,
    payload: Result<Json<LlmRequest>, JsonRejection>,
) -> Result<Json<LlmResponse>, AppError> {
    let Json(payload) = payload?;
    if payload.text.trim().is_empty() {
        return Err(EngineError::InvalidInput("text must not be empty".to_string()).into());
    }
    let provider = state.provider.as_ref().ok_or(AppError::ProviderUnavailable)?;

    let messages = [Message::user(payload.text)];
    let response = tokio::time::timeout(state.provider_timeout, provider.generate(&messages))
        .await
        .map_err(|_| AppError::ProviderTimeout)?
        .map_err(AppError::Provider)?;

    Ok(Json(LlmResponse {
        response_text: response.text().to_string(),
    }))
}

async fn history_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "history": state.engine.history() }))
}

async fn metrics_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.engine.metrics();
    Json(json!({
        "counters": snapshot,
        "llm_success_rate": snapshot.llm_success_rate(),
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "provider": state.engine.has_interpreter() }))
}

// --- Server ---
pub fn router(state: AppState, body_limit_kb: usize) -> Router {
    Router::new()
        .route("/command", post(command_handler))
        .route("/analyze-image", post(analyze_image_handler))
        .route("/find-element", post(find_element_handler))
        .route("/action", post(action_handler))
        .route("/llm", post(llm_handler))
        .route("/history", get(history_handler))
        .route("/metrics", get(metrics_handler))
        .route("/healthcheck", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit_kb * 1024))
}

pub async fn run_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down gracefully");
        })
        .await?;

    Ok(())
}
