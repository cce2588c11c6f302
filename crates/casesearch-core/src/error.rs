use thiserror::Error;

/// Failures a search dispatch can observe.
///
/// `Clone` so the last error can ride along in published pipeline state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Remote index unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote index timed out after {0} ms")]
    RemoteTimeout(u64),

    #[error("Records unavailable: {0}")]
    Records(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SearchError {
    /// True for failures that the local fallback scorer can recover from.
    pub fn is_remote(&self) -> bool {
        matches!(self, SearchError::RemoteUnavailable(_) | SearchError::RemoteTimeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
