//! HTTP API.
//!
//! Contract routes are mounted at `/contracts` and again under `/api`.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use charter_types::{Contract, ContractPage, DeleteResult, UpdateResult};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ServiceError};
use crate::validation::{self, ListParams};
use crate::{ws, DaemonState};

/// Build the full router: contract CRUD, health check, WebSocket.
pub fn build_router(state: Arc<DaemonState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws::upgrade))
        .merge(contract_routes())
        .nest("/api", contract_routes())
        .with_state(state)
}

fn contract_routes() -> Router<Arc<DaemonState>> {
    Router::new()
        .route("/contracts", get(list_contracts).post(create_contract))
        .route(
            "/contracts/:id",
            get(get_contract).put(update_contract).delete(delete_contract),
        )
}

async fn healthz() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn create_contract(
    State(state): State<Arc<DaemonState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Contract>)> {
    let Json(body) = payload.map_err(|e| ServiceError::validation(e.body_text()))?;
    let new = validation::new_contract(&body)?;
    let created = state.mutations.create(new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_contracts(
    State(state): State<Arc<DaemonState>>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ContractPage>> {
    let Query(params) = params.map_err(|e| ServiceError::validation(e.body_text()))?;
    debug!("GET /contracts {:?}", params);
    let page = state.queries.list(&params).await?;
    Ok(Json(page))
}

async fn get_contract(
    State(state): State<Arc<DaemonState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Contract>> {
    let id = validation::contract_id(&raw_id)?;
    let contract = state.queries.get(&id).await?;
    Ok(Json(contract))
}

async fn update_contract(
    State(state): State<Arc<DaemonState>>,
    Path(raw_id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdateResult>> {
    let id = validation::contract_id(&raw_id)?;
    let Json(body) = payload.map_err(|e| ServiceError::validation(e.body_text()))?;
    let patch = validation::patch(&body)?;
    let updated = state.mutations.update(&id, patch).await?;
    Ok(Json(UpdateResult {
        result: vec![updated],
    }))
}

async fn delete_contract(
    State(state): State<Arc<DaemonState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteResult>> {
    let id = validation::contract_id(&raw_id)?;
    let deleted = state.mutations.delete(&id).await?;
    Ok(Json(deleted))
}
