use casesearch_core::error::SearchError;
use casesearch_core::types::SearchResult;

/// `Idle → Pending → (Succeeded | Failed) → Idle`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// What presentation renders. Re-published on every transition.
///
/// `error` can be set on a `Succeeded` state: the remote index failed and the
/// results came from the local fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub phase: SearchPhase,
    pub results: Vec<SearchResult>,
    pub loading: bool,
    pub error: Option<SearchError>,
}

impl SearchState {
    pub fn idle() -> Self { Self::default() }

    pub fn succeeded(results: Vec<SearchResult>, error: Option<SearchError>) -> Self {
        Self { phase: SearchPhase::Succeeded, results, loading: false, error }
    }

    pub fn failed(error: SearchError) -> Self {
        Self { phase: SearchPhase::Failed, results: Vec::new(), loading: false, error: Some(error) }
    }

    pub fn is_settled(&self) -> bool { matches!(self.phase, SearchPhase::Succeeded | SearchPhase::Failed) }
}
