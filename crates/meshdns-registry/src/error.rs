//! Error types for the meshdns service registry.

use thiserror::Error;

/// Result type alias for registry and resolver operations.
pub type MeshDnsResult<T> = Result<T, MeshDnsError>;

/// Errors surfaced to callers of the lifecycle API and the mesh helpers.
///
/// Absence is not an error for most read paths: resolver lookups and
/// idempotent teardown return `Option`/`bool` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshDnsError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("no healthy endpoint: {0}")]
    NoHealthyEndpoint(String),
}
