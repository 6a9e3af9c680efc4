//! REST API handlers.
//!
//! Each handler goes through the `ServiceDirectory` lifecycle API or its
//! read side and returns JSON responses.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::{debug, info};

use meshdns_registry::*;
use meshdns_resolver::{Credentials, QueryType, render_prometheus};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn status_for(err: &MeshDnsError) -> StatusCode {
    match err {
        MeshDnsError::Validation(_) => StatusCode::BAD_REQUEST,
        MeshDnsError::NotFound(_) => StatusCode::NOT_FOUND,
        MeshDnsError::NoHealthyEndpoint(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn mesh_error(err: MeshDnsError) -> axum::response::Response {
    let status = status_for(&err);
    debug!(status = status.as_u16(), error = %err, "request rejected");
    error_response(&err.to_string(), status).into_response()
}

/// Outcome of an idempotent mutation.
#[derive(serde::Serialize)]
struct Outcome {
    id: String,
    applied: bool,
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

// ── Services ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
}

/// GET /api/v1/services
pub async fn list_services(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    match params.service_type.as_deref() {
        None => ApiResponse::ok(state.directory.list_all()).into_response(),
        Some(raw) => match raw.parse::<ServiceType>() {
            Ok(t) => ApiResponse::ok(state.directory.list_by_type(t)).into_response(),
            Err(e) => mesh_error(e),
        },
    }
}

/// POST /api/v1/services
pub async fn register_typed(
    State(state): State<ApiState>,
    Json(descriptor): Json<TypedServiceDescriptor>,
) -> impl IntoResponse {
    match state.directory.register_typed_service(descriptor) {
        Ok(record) => (StatusCode::CREATED, ApiResponse::ok(record)).into_response(),
        Err(e) => mesh_error(e),
    }
}

/// POST /api/v1/services/stateful
pub async fn register_stateful(
    State(state): State<ApiState>,
    Json(descriptor): Json<StatefulServiceDescriptor>,
) -> impl IntoResponse {
    match state.directory.register_stateful_service(descriptor) {
        Ok(record) => (StatusCode::CREATED, ApiResponse::ok(record)).into_response(),
        Err(e) => mesh_error(e),
    }
}

/// GET /api/v1/services/{id}
pub async fn get_service(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.directory.get_record(&id) {
        Some(record) => ApiResponse::ok(record).into_response(),
        None => error_response("service not found", StatusCode::NOT_FOUND).into_response(),
    }
}

/// DELETE /api/v1/services/{id}
///
/// Always 200: tearing down an unknown service is a no-op.
pub async fn deregister(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let applied = state.directory.deregister(&id);
    info!(service_id = %id, applied, "deregister requested");
    ApiResponse::ok(Outcome { id, applied })
}

/// PUT /api/v1/services/{id}/endpoints
pub async fn update_endpoints(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(endpoints): Json<Vec<ServiceEndpoint>>,
) -> impl IntoResponse {
    match state.directory.update_endpoints(&id, endpoints) {
        Ok(record) => ApiResponse::ok(record).into_response(),
        Err(e) => mesh_error(e),
    }
}

// ── Health reports ─────────────────────────────────────────────

/// POST /api/v1/services/{id}/endpoints/{ordinal}/healthy
pub async fn mark_healthy(
    State(state): State<ApiState>,
    Path((id, ordinal)): Path<(String, u32)>,
) -> impl IntoResponse {
    let applied = state.directory.mark_healthy(&id, ordinal);
    ApiResponse::ok(Outcome { id, applied })
}

/// POST /api/v1/services/{id}/endpoints/{ordinal}/unhealthy
pub async fn mark_unhealthy(
    State(state): State<ApiState>,
    Path((id, ordinal)): Path<(String, u32)>,
) -> impl IntoResponse {
    let applied = state.directory.mark_unhealthy(&id, ordinal);
    ApiResponse::ok(Outcome { id, applied })
}

// ── Queries ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(rename = "type")]
    pub query_type: Option<String>,
}

/// GET /api/v1/query/{name}
pub async fn query(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(params): Query<QueryParams>,
) -> impl IntoResponse {
    let query_type = match params.query_type.as_deref().map(str::parse::<QueryType>) {
        None => QueryType::Any,
        Some(Ok(t)) => t,
        Some(Err(e)) => return mesh_error(e),
    };
    ApiResponse::ok(state.queries.handle_query(&name, query_type)).into_response()
}

/// GET /api/v1/namespaces/{ns}/services/{name}/leader
pub async fn leader(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.directory.resolve_leader(&name, &namespace) {
        Some(endpoint) => ApiResponse::ok(endpoint).into_response(),
        None => error_response("no healthy leader", StatusCode::NOT_FOUND).into_response(),
    }
}

/// GET /api/v1/namespaces/{ns}/services/{name}/balanced
pub async fn balanced(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
) -> impl IntoResponse {
    ApiResponse::ok(state.directory.resolve_balanced(&name, &namespace))
}

#[derive(Debug, Deserialize)]
pub struct UrlParams {
    pub scheme: Option<String>,
}

/// GET /api/v1/namespaces/{ns}/services/{name}/url
pub async fn service_url(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(params): Query<UrlParams>,
) -> impl IntoResponse {
    let scheme = params.scheme.as_deref().unwrap_or("http");
    match state.directory.build_service_url(&name, &namespace, scheme) {
        Ok(url) => ApiResponse::ok(url).into_response(),
        Err(e) => mesh_error(e),
    }
}

/// Connection-string request body.
#[derive(Debug, Deserialize)]
pub struct ConnectionRequest {
    pub db_name: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// POST /api/v1/namespaces/{ns}/services/{name}/connection
pub async fn connection_string(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
    Json(req): Json<ConnectionRequest>,
) -> impl IntoResponse {
    match state.directory.build_connection_string(
        &name,
        &namespace,
        &req.db_name,
        req.credentials.as_ref(),
    ) {
        Ok(url) => ApiResponse::ok(url).into_response(),
        Err(e) => mesh_error(e),
    }
}

// ── Stats ──────────────────────────────────────────────────────

/// GET /api/v1/stats
pub async fn stats(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(state.directory.stats())
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = render_prometheus(&state.directory.stats());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
