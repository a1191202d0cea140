use super::AppState;
use crate::connectors::Descriptor;
use crate::etl::{PipelineDefinition, RunResult};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub async fn health() -> Json<&'static str> {
    Json("ok")
}

pub async fn connectors(State(state): State<Arc<AppState>>) -> Json<Vec<Descriptor>> {
    Json(state.engine.registry().available())
}

pub async fn list_pipelines(State(state): State<Arc<AppState>>) -> Json<Vec<PipelineDefinition>> {
    Json(state.engine.list())
}

pub async fn create_pipeline(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PipelineDefinition>, JsonRejection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let Json(definition) = payload.map_err(|rejection| {
        log::debug!("Rejected pipeline body: {}", rejection);
        (StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    state
        .engine
        .create(definition)
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;

    Ok(Json(json!({ "status": "created" })))
}

/// Run a pipeline under a child of the shutdown token
///
/// The run is cancelled if the request is dropped (client gone), if the
/// configured timeout elapses, or when the server shuts down.
pub async fn run_pipeline(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<RunResult> {
    let cancel = state.shutdown.child_token();
    let _disconnect = cancel.clone().drop_guard();

    if let Some(timeout) = state.run_timeout {
        let cancel = cancel.clone();
        let name = name.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    log::warn!("Run of '{}' timed out after {:?}", name, timeout);
                    cancel.cancel();
                }
            }
        });
    }

    Json(state.engine.run(&cancel, &name).await)
}
