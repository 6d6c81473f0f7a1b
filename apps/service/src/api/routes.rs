use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::Config;
use crate::database::Database;
use crate::monitoring::status;
use crate::monitoring::types::ProbeRecord;

const HISTORY_DEFAULT_LIMIT: usize = 200;
const HISTORY_MAX_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct AppState {
    pub database: Arc<dyn Database>,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ip/update", post(update_ip))
        .route("/ip/status", get(get_status))
        .route("/ip/history", get(get_history))
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn unauthorized() -> ApiError {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"})))
}

fn internal_error(e: anyhow::Error) -> ApiError {
    tracing::error!("api request failed: {e:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "internal error"})))
}

/// Constant token comparison against the configured `API_TOKEN`
fn require_token(headers: &HeaderMap, config: &Config) -> Result<(), ApiError> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == config.api_token => Ok(()),
        _ => Err(unauthorized()),
    }
}

#[derive(Debug, Default, Deserialize)]
struct UpdateRequest {
    ip: Option<String>,
}

/// Overwrite the tracked address. Reporters that sit behind the address
/// they are reporting may omit the body and let the remote address stand in.
async fn update_ip(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Option<Json<UpdateRequest>>,
) -> Result<Json<Value>, ApiError> {
    require_token(&headers, &state.config)?;

    let ip = body
        .and_then(|Json(request)| request.ip)
        .unwrap_or_else(|| remote.ip().to_string());

    let tracked = state
        .database
        .set_tracked_address(&ip)
        .await
        .map_err(internal_error)?;

    Ok(Json(json!({
        "ok": true,
        "ip": tracked.address,
        "timestamp": tracked.updated_at,
    })))
}

async fn get_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_token(&headers, &state.config)?;

    let snapshot = status::snapshot(state.database.as_ref())
        .await
        .map_err(internal_error)?;

    let last_check = snapshot.last_check.map(|record| {
        json!({
            "time": record.time,
            "reachable": record.reachable,
            "method": record.method,
            "detail": record.detail,
        })
    });

    Ok(Json(match snapshot.tracked {
        None => json!({ "status": "no-ip", "last_check": last_check }),
        Some(tracked) => json!({
            "current_ip": tracked.address,
            "ip_updated_at": tracked.updated_at,
            "last_check": last_check,
        }),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ProbeRecord>>, ApiError> {
    require_token(&headers, &state.config)?;

    let limit = query
        .limit
        .unwrap_or(HISTORY_DEFAULT_LIMIT)
        .clamp(1, HISTORY_MAX_LIMIT);

    let checks = state
        .database
        .latest_checks(limit)
        .await
        .map_err(internal_error)?;

    Ok(Json(checks))
}
