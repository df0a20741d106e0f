//! Error types for the pod engine.

/// Result type alias for pod-engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the transport boundary.
///
/// Status synthesis and classification never fail — malformed snapshots
/// degrade to defaults instead.  Only connect/request failures reach callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Opening a stream against a pod sub-resource failed.
    #[error("stream connect failed: {0}")]
    Connect(String),

    /// A plain request against a pod sub-resource failed.
    #[error("request failed: {0}")]
    Request(String),
}
