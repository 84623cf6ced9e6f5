use thiserror::Error;

/// Failure of a single pipeline run.
///
/// Every variant is terminal for the trigger that produced it; nothing is
/// retried. The payload is the human-readable message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Empty city, empty or inverted date range, zero day count.
    #[error("{0}")]
    InvalidInput(String),

    /// The geocoder returned no match for the place.
    #[error("{0}")]
    NotFound(String),

    /// The position source refused to hand out a location.
    #[error("{0}")]
    PermissionDenied(String),

    /// No position capability is available.
    #[error("{0}")]
    Unsupported(String),

    /// Non-success status or malformed payload from a provider.
    #[error("{0}")]
    Upstream(String),
}

impl PipelineError {
    pub(crate) fn upstream(context: &str, err: impl std::fmt::Display) -> Self {
        PipelineError::Upstream(format!("{context}: {err}"))
    }
}
