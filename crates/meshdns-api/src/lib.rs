//! meshdns-api — REST API for meshdns.
//!
//! Provides axum route handlers for registering services, reporting
//! endpoint health, and querying the derived record set.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness |
//! | GET | `/api/v1/services` | List services (`?type=` filters) |
//! | POST | `/api/v1/services` | Register a typed service |
//! | POST | `/api/v1/services/stateful` | Register a stateful service |
//! | GET | `/api/v1/services/{id}` | Get a service record |
//! | DELETE | `/api/v1/services/{id}` | Deregister a service |
//! | PUT | `/api/v1/services/{id}/endpoints` | Replace endpoints |
//! | POST | `/api/v1/services/{id}/endpoints/{ordinal}/healthy` | Mark healthy |
//! | POST | `/api/v1/services/{id}/endpoints/{ordinal}/unhealthy` | Mark unhealthy |
//! | GET | `/api/v1/query/{name}` | Answer a DNS question (`?type=`) |
//! | GET | `/api/v1/namespaces/{ns}/services/{name}/leader` | Current leader |
//! | GET | `/api/v1/namespaces/{ns}/services/{name}/balanced` | Healthy endpoints by weight |
//! | GET | `/api/v1/namespaces/{ns}/services/{name}/url` | Service URL (`?scheme=`) |
//! | POST | `/api/v1/namespaces/{ns}/services/{name}/connection` | Connection string |
//! | GET | `/api/v1/stats` | Directory statistics |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post, put};
use meshdns_resolver::{QueryHandler, ServiceDirectory};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub directory: ServiceDirectory,
    pub queries: QueryHandler,
}

/// Build the complete API router (REST + metrics + liveness).
pub fn build_router(directory: ServiceDirectory) -> Router {
    let api_state = ApiState {
        queries: QueryHandler::new(directory.clone()),
        directory,
    };

    let api_routes = Router::new()
        .route("/services", get(handlers::list_services).post(handlers::register_typed))
        .route("/services/stateful", post(handlers::register_stateful))
        .route("/services/{id}", get(handlers::get_service).delete(handlers::deregister))
        .route("/services/{id}/endpoints", put(handlers::update_endpoints))
        .route(
            "/services/{id}/endpoints/{ordinal}/healthy",
            post(handlers::mark_healthy),
        )
        .route(
            "/services/{id}/endpoints/{ordinal}/unhealthy",
            post(handlers::mark_unhealthy),
        )
        .route("/query/{name}", get(handlers::query))
        .route("/namespaces/{ns}/services/{name}/leader", get(handlers::leader))
        .route("/namespaces/{ns}/services/{name}/balanced", get(handlers::balanced))
        .route("/namespaces/{ns}/services/{name}/url", get(handlers::service_url))
        .route(
            "/namespaces/{ns}/services/{name}/connection",
            post(handlers::connection_string),
        )
        .route("/stats", get(handlers::stats))
        .with_state(api_state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::prometheus_metrics).with_state(api_state))
}
