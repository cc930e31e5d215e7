// src/server.rs

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::{
    A2aRequest, A2aResponse, Agent, AgentCard, ExporterAgent, OcrAgent, ParserAgent, Request,
    Response, TaskRequest, TaskResponse, ValidatorAgent,
};
use crate::config::Config;
use crate::error::AppError;
use crate::export::Exporter;
use crate::validation::{Pipeline, Rules};

/// Agents shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<ValidatorAgent>,
    pub exporter: Arc<ExporterAgent>,
    pub parser: ParserAgent,
    pub ocr: Arc<OcrAgent>,
}

impl AppState {
    pub fn from_config(cfg: &Config) -> Result<Self, AppError> {
        let rules = Rules::from(&cfg.validation);
        Ok(Self {
            validator: Arc::new(ValidatorAgent::new(Pipeline::new(rules))),
            exporter: Arc::new(ExporterAgent::new(Exporter::new(&cfg.export.dir))),
            parser: ParserAgent,
            ocr: Arc::new(OcrAgent::from_config(cfg)?),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/.well-known/agent.json", get(agent_card))
        .route("/tasks/send", post(send_task))
        .route("/a2a", post(a2a))
        .route("/agents/validator", post(validate))
        .route("/agents/exporter", post(export))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.ocr.card().clone())
}

// Bodies are taken as `Result` so decode failures get the same `{error}` shape.

async fn send_task(
    State(state): State<AppState>,
    body: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, AppError> {
    let Json(request) = body?;
    Ok(Json(state.ocr.handle(request).await?))
}

async fn a2a(
    State(state): State<AppState>,
    body: Result<Json<A2aRequest>, JsonRejection>,
) -> Result<Json<A2aResponse>, AppError> {
    let Json(request) = body?;
    Ok(Json(state.parser.handle(request)?))
}

async fn validate(
    State(state): State<AppState>,
    body: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Response>, AppError> {
    let Json(request) = body?;
    Ok(Json(state.validator.handle(request).await))
}

async fn export(
    State(state): State<AppState>,
    body: Result<Json<Request>, JsonRejection>,
) -> Result<Json<Response>, AppError> {
    let Json(request) = body?;
    Ok(Json(state.exporter.handle(request).await))
}

/// Bind the configured address and serve until the process is stopped.
pub async fn serve(cfg: &Config) -> Result<(), AppError> {
    let app = router(AppState::from_config(cfg)?);
    let listener = TcpListener::bind(cfg.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Agents listening");
    axum::serve(listener, app).await?;
    Ok(())
}
