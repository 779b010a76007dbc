use thiserror::Error;

/// Failures of the primary classification path.
///
/// Callers recover from all of these with the fallback heuristic.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("capability probe failed for '{token}': {message}")]
    ProbeFailed { token: String, message: String },

    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}
