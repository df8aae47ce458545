use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{
    ErrorResponse, SimulatePayload, api_request_from_payload, build_monte_carlo_response,
    build_project_response, build_stress_response,
};
use crate::core::template_listings;

pub async fn run_http_server(bind: [u8; 4], port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from((bind, port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "FIRE HTTP API listening");
    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/api/project", post(project_handler))
        .route("/api/monte-carlo", post(monte_carlo_handler))
        .route("/api/stress", post(stress_handler))
        .route("/api/templates", get(templates_handler))
        .fallback(not_found_handler)
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn templates_handler() -> Response {
    json_response(StatusCode::OK, template_listings())
}

async fn project_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    let request = match decode(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    json_response(StatusCode::OK, build_project_response(&request))
}

async fn monte_carlo_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    let request = match decode(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    // Trials fan out over rayon; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || build_monte_carlo_response(&request)).await;
    match outcome {
        Ok(Ok(response)) => json_response(StatusCode::OK, response),
        Ok(Err(msg)) => error_response(StatusCode::BAD_REQUEST, msg),
        Err(e) => {
            warn!(error = %e, "monte carlo worker failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "simulation failed")
        }
    }
}

async fn stress_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    let request = match decode(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match build_stress_response(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, msg),
    }
}

fn decode(
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Result<super::ApiRequest, Response> {
    let Json(payload) = payload.map_err(|rejection| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid API JSON payload: {}", rejection.body_text()),
        )
    })?;
    api_request_from_payload(payload).map_err(|msg| error_response(StatusCode::BAD_REQUEST, msg))
}

/// Every body is JSON and simulation output is never cached.
fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let headers = [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))];
    (status, headers, Json(body)).into_response()
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: error.into(),
        },
    )
}
