//! `/experiments` handlers.
//!
//! POST /experiments — register an experiment, returns its first `auth_hash`
//! GET  /experiments — list live experiments (tokens redacted)
//! PUT  /experiments — update an experiment by `id`, authorized by `auth_hash`
//!
//! Success is reported as 201 for all three, including the listing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Map, Value};
use tracing::info;

use super::allow_list::AllowList;
use super::error::AppError;
use crate::error::Operation;
use crate::service::{ExperimentRegistry, Registration};

type JsonBody = Result<Json<Map<String, Value>>, JsonRejection>;

pub async fn create_experiment(
    Extension(registry): Extension<Arc<ExperimentRegistry>>,
    Extension(allow): Extension<AllowList>,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: JsonBody,
) -> Result<Response, AppError> {
    registry
        .sweep()
        .await
        .map_err(|e| AppError::registry(e, Operation::Create))?;
    let Json(input) = body.map_err(AppError::bad_body)?;

    // Answered to any peer, ahead of the allow-list.
    if is_teapot(&input) {
        return Ok((
            StatusCode::IM_A_TEAPOT,
            Json(json!({ "success": true, "teapot": false })),
        )
            .into_response());
    }
    allow.check(&peer)?;

    let registration = registry
        .create(&input)
        .await
        .map_err(|e| AppError::registry(e, Operation::Create))?;
    info!(
        "Added experiment {} from {}",
        registration.id,
        peer_label(&peer)
    );
    Ok(issued(&registration))
}

pub async fn list_experiments(
    Extension(registry): Extension<Arc<ExperimentRegistry>>,
    Extension(allow): Extension<AllowList>,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<Response, AppError> {
    allow.check(&peer)?;
    let experiments = registry
        .list()
        .await
        .map_err(|e| AppError::registry(e, Operation::List))?;
    info!(
        "Sent {} experiments to {}",
        experiments.len(),
        peer_label(&peer)
    );
    Ok((StatusCode::CREATED, Json(experiments)).into_response())
}

pub async fn update_experiment(
    Extension(registry): Extension<Arc<ExperimentRegistry>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: JsonBody,
) -> Result<Response, AppError> {
    let Json(input) = body.map_err(AppError::bad_body)?;
    let registration = registry
        .update(&input)
        .await
        .map_err(|e| AppError::registry(e, Operation::Update))?;
    info!(
        "Updated experiment {} from {}",
        registration.id,
        peer_label(&peer)
    );
    Ok(issued(&registration))
}

fn issued(registration: &Registration) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "auth_hash": registration.auth_hash.to_string(),
        })),
    )
        .into_response()
}

/// `{"teapot": true}` and nothing else.
fn is_teapot(input: &Map<String, Value>) -> bool {
    input.len() == 1 && input.get("teapot") == Some(&Value::Bool(true))
}

fn peer_label(peer: &Option<ConnectInfo<SocketAddr>>) -> String {
    peer.as_ref()
        .map_or_else(|| "unknown peer".to_string(), |ConnectInfo(addr)| addr.to_string())
}
