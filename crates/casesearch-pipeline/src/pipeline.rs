use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use casesearch_core::config::SearchSettings;
use casesearch_core::error::{Result, SearchError};
use casesearch_core::traits::{RecordSource, RemoteIndex};
use casesearch_core::types::SearchResult;
use casesearch_core::unify::unify;
use casesearch_local::{LocalFallbackScorer, ScanLimits};

use crate::state::{SearchPhase, SearchState};

/// Generation a dispatch was issued under. Results are published only while
/// it is still the session's current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchToken {
    generation: u64,
}

impl DispatchToken {
    pub fn generation(&self) -> u64 { self.generation }
}

#[derive(Debug, Default)]
struct Session {
    query: String,
    scope: Option<String>,
    generation: u64,
    /// Bumped only by resets. A debounce timer armed under an older epoch
    /// must not dispatch.
    epoch: u64,
}

struct Shared {
    remote: Option<Arc<dyn RemoteIndex>>,
    records: Arc<dyn RecordSource>,
    scorer: Mutex<LocalFallbackScorer>,
    settings: SearchSettings,
    session: Mutex<Session>,
    state: watch::Sender<SearchState>,
}

/// One search session: debounced query text, case scope, and the published
/// `{results, loading, error}` state.
///
/// Must be driven from inside a tokio runtime; the debounce timer and every
/// dispatch run as spawned tasks.
pub struct QueryPipeline {
    shared: Arc<Shared>,
    debounce: Mutex<Option<JoinHandle<()>>>,
}

impl QueryPipeline {
    pub fn new(settings: SearchSettings, records: Arc<dyn RecordSource>, remote: Option<Arc<dyn RemoteIndex>>) -> Self {
        let scorer = LocalFallbackScorer::new(settings.weights.clone());
        let (state, _) = watch::channel(SearchState::idle());
        let shared = Shared {
            remote,
            records,
            scorer: Mutex::new(scorer),
            settings,
            session: Mutex::new(Session::default()),
            state,
        };
        Self { shared: Arc::new(shared), debounce: Mutex::new(None) }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> { self.shared.state.subscribe() }

    pub fn state(&self) -> SearchState { self.shared.state.borrow().clone() }

    /// Raw text as last typed.
    pub fn query(&self) -> String { lock(&self.shared.session).query.clone() }

    pub fn scope(&self) -> Option<String> { lock(&self.shared.session).scope.clone() }

    pub fn settings(&self) -> &SearchSettings { &self.shared.settings }

    /// Record a keystroke. Non-blank text (re)starts the debounce timer; blank
    /// text drops any pending work and returns to idle.
    pub fn set_query(&self, text: &str) {
        let mut debounce = lock(&self.debounce);
        if let Some(handle) = debounce.take() { handle.abort(); }

        let effective = text.trim().to_string();
        if effective.is_empty() {
            self.shared.reset(text, None);
            return;
        }
        let epoch = {
            let mut session = lock(&self.shared.session);
            session.query = text.to_string();
            session.epoch
        };

        let shared = Arc::clone(&self.shared);
        let delay = self.shared.settings.debounce();
        *debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.issue(effective, epoch);
        }));
    }

    /// Skip the remaining debounce window and dispatch the current query now.
    /// Returns the dispatch task, or `None` for a blank query.
    pub fn flush(&self) -> Option<JoinHandle<()>> {
        if let Some(handle) = lock(&self.debounce).take() { handle.abort(); }
        let (effective, epoch) = {
            let session = lock(&self.shared.session);
            (session.query.trim().to_string(), session.epoch)
        };
        if effective.is_empty() { return None; }
        self.shared.issue(effective, epoch)
    }

    /// Switch case. Anything in flight for the old scope is discarded and the
    /// query resets to empty. Setting the current scope again is a no-op.
    pub fn set_scope(&self, scope: Option<String>) {
        if lock(&self.shared.session).scope == scope { return; }
        self.cancel_debounce();
        self.shared.reset("", Some(scope));
    }

    /// The search surface closed: cancel everything and go idle.
    pub fn close(&self) {
        self.cancel_debounce();
        self.shared.reset("", None);
    }

    fn cancel_debounce(&self) {
        if let Some(handle) = lock(&self.debounce).take() { handle.abort(); }
    }
}

impl Drop for QueryPipeline {
    fn drop(&mut self) { self.close(); }
}

impl Shared {
    /// Invalidate in-flight dispatches and publish idle. `scope` replaces the
    /// current scope when given.
    fn reset(&self, query: &str, scope: Option<Option<String>>) {
        let mut session = lock(&self.session);
        session.generation += 1;
        session.epoch += 1;
        session.query = query.to_string();
        if let Some(scope) = scope { session.scope = scope; }
        self.state.send_replace(SearchState::idle());
    }

    /// Start a dispatch for `query` unless the session was reset after the
    /// caller read `epoch`. An abort can miss a timer already past its sleep.
    fn issue(self: &Arc<Self>, query: String, epoch: u64) -> Option<JoinHandle<()>> {
        let (token, scope) = {
            let mut session = lock(&self.session);
            if session.epoch != epoch {
                tracing::debug!(armed = epoch, current = session.epoch, "session reset before dispatch; dropping query");
                return None;
            }
            session.generation += 1;
            (DispatchToken { generation: session.generation }, session.scope.clone())
        };
        self.apply(token, |state| {
            state.phase = SearchPhase::Pending;
            state.loading = true;
            state.error = None;
        });
        let shared = Arc::clone(self);
        Some(tokio::spawn(async move { shared.dispatch(token, scope, query).await }))
    }

    async fn dispatch(&self, token: DispatchToken, scope: Option<String>, query: String) {
        let mut remote_error = None;
        if let (Some(remote), Some(scope_id)) = (self.remote.as_ref(), scope.as_deref()) {
            match tokio::time::timeout(self.settings.remote_timeout(), remote.query(scope_id, &query)).await {
                Ok(Ok(results)) => {
                    let results = unify(results, self.settings.max_results);
                    tracing::info!(scope = scope_id, query = %query, hits = results.len(), "remote index answered");
                    self.publish(token, SearchState::succeeded(results, None));
                    return;
                }
                Ok(Err(e)) => {
                    tracing::warn!(scope = scope_id, error = %e, "remote index failed; falling back to local scan");
                    remote_error = Some(e);
                }
                Err(_) => {
                    tracing::warn!(scope = scope_id, timeout_ms = self.settings.remote_timeout_ms, "remote index timed out; falling back to local scan");
                    remote_error = Some(SearchError::RemoteTimeout(self.settings.remote_timeout_ms));
                }
            }
        }

        if !self.is_current(token) {
            tracing::debug!(generation = token.generation, "dispatch superseded before local scan");
            return;
        }
        let state = match self.run_local(scope.as_deref(), &query) {
            Ok(results) => {
                tracing::info!(query = %query, hits = results.len(), fallback = remote_error.is_some(), "local scan answered");
                SearchState::succeeded(results, remote_error)
            }
            Err(e) => {
                if let Some(remote) = &remote_error { tracing::warn!(error = %remote, "remote index failed as well"); }
                tracing::warn!(error = %e, "search failed");
                SearchState::failed(e)
            }
        };
        self.publish(token, state);
    }

    fn run_local(&self, scope: Option<&str>, query: &str) -> Result<Vec<SearchResult>> {
        let records = self.records.records(scope)?;
        let mut scorer = lock(&self.scorer);
        Ok(scorer.search(query, &records, ScanLimits::from(&self.settings)))
    }

    fn is_current(&self, token: DispatchToken) -> bool { lock(&self.session).generation == token.generation }

    fn publish(&self, token: DispatchToken, state: SearchState) { self.apply(token, move |s| *s = state); }

    /// Mutate published state if `token` is still current; otherwise drop the update.
    fn apply(&self, token: DispatchToken, f: impl FnOnce(&mut SearchState)) {
        let session = lock(&self.session);
        if session.generation != token.generation {
            tracing::debug!(stale = token.generation, current = session.generation, "discarding stale search results");
            return;
        }
        self.state.send_modify(f);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> { m.lock().unwrap_or_else(PoisonError::into_inner) }
