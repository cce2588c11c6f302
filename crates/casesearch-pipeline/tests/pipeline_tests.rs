use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::sleep;

use casesearch_core::config::SearchSettings;
use casesearch_core::error::{Result, SearchError};
use casesearch_core::traits::{RecordSource, RemoteIndex};
use casesearch_core::types::{FileMatch, FileRecord, FindingMatch, MatchType, NoteMatch, SearchResult};
use casesearch_pipeline::{InMemoryRecords, QueryPipeline, SearchPhase};

type Script = Box<dyn Fn(&str) -> (Duration, Result<Vec<SearchResult>>) + Send + Sync>;

struct ScriptedRemote {
    calls: Mutex<Vec<(String, String)>>,
    script: Script,
}

impl ScriptedRemote {
    fn new(script: impl Fn(&str) -> (Duration, Result<Vec<SearchResult>>) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), script: Box::new(script) })
    }

    fn calls(&self) -> Vec<(String, String)> { self.calls.lock().unwrap().clone() }
}

impl RemoteIndex for ScriptedRemote {
    fn query<'a>(&'a self, scope_id: &'a str, text: &'a str) -> BoxFuture<'a, Result<Vec<SearchResult>>> {
        self.calls.lock().unwrap().push((scope_id.to_string(), text.to_string()));
        let (delay, reply) = (self.script)(text);
        Box::pin(async move {
            sleep(delay).await;
            reply
        })
    }
}

struct BrokenRecords;

impl RecordSource for BrokenRecords {
    fn records(&self, _scope_id: Option<&str>) -> Result<Arc<[Arc<FileRecord>]>> {
        Err(SearchError::Records("inventory not loaded".into()))
    }
}

fn note(id: &str, rank: f32) -> SearchResult {
    SearchResult::Note(NoteMatch { id: id.to_string(), file_id: None, snippet: None, rank })
}

fn inventory() -> Arc<InMemoryRecords> {
    Arc::new(InMemoryRecords::new(vec![
        FileRecord::new("/case/contract.pdf", "contract.pdf"),
        FileRecord::new("/case/notes.txt", "notes.txt").with_data(r#"{"notes":"contract review"}"#),
        FileRecord::new("/case/photo.jpg", "photo.jpg"),
    ]))
}

fn pipeline_with(remote: Option<Arc<ScriptedRemote>>) -> QueryPipeline {
    let remote = remote.map(|r| r as Arc<dyn RemoteIndex>);
    QueryPipeline::new(SearchSettings::default(), inventory(), remote)
}

fn ids(results: &[SearchResult]) -> Vec<&str> { results.iter().map(|r| r.identity()).collect() }

#[tokio::test(start_paused = true)]
async fn blank_query_never_dispatches() {
    let remote = ScriptedRemote::new(|_| (Duration::ZERO, Ok(vec![])));
    let pipeline = pipeline_with(Some(remote.clone()));
    pipeline.set_scope(Some("case-1".into()));
    for q in ["", "   ", "\t"] {
        pipeline.set_query(q);
        sleep(Duration::from_millis(500)).await;
    }
    assert!(remote.calls().is_empty());
    let state = pipeline.state();
    assert_eq!(state.phase, SearchPhase::Idle);
    assert!(state.results.is_empty());
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn keystrokes_inside_window_collapse_into_one_dispatch() {
    let remote = ScriptedRemote::new(|q| (Duration::from_millis(5), Ok(vec![note(q, 1.0)])));
    let pipeline = pipeline_with(Some(remote.clone()));
    pipeline.set_scope(Some("case-1".into()));

    pipeline.set_query("c");
    pipeline.set_query("co");
    sleep(Duration::from_millis(100)).await;
    pipeline.set_query("con ");
    sleep(Duration::from_millis(250)).await;
    assert!(remote.calls().is_empty(), "still inside the debounce window");

    sleep(Duration::from_millis(200)).await;
    assert_eq!(remote.calls(), [("case-1".to_string(), "con".to_string())]);
    assert_eq!(ids(&pipeline.state().results), ["con"]);
}

#[tokio::test(start_paused = true)]
async fn loading_is_published_while_remote_is_pending() {
    let remote = ScriptedRemote::new(|_| (Duration::from_millis(200), Ok(vec![note("n1", 1.0)])));
    let pipeline = pipeline_with(Some(remote));
    pipeline.set_scope(Some("case-1".into()));
    let mut rx = pipeline.subscribe();

    pipeline.set_query("contract");
    rx.changed().await.unwrap();
    {
        let pending = rx.borrow_and_update();
        assert_eq!(pending.phase, SearchPhase::Pending);
        assert!(pending.loading);
    }

    rx.changed().await.unwrap();
    let done = rx.borrow().clone();
    assert_eq!(done.phase, SearchPhase::Succeeded);
    assert!(!done.loading);
    assert_eq!(done.error, None);
    assert_eq!(ids(&done.results), ["n1"]);
}

#[tokio::test(start_paused = true)]
async fn late_earlier_dispatch_does_not_overwrite_newer_one() {
    let remote = ScriptedRemote::new(|q| {
        let delay = if q == "slow" { 500 } else { 10 };
        (Duration::from_millis(delay), Ok(vec![note(q, 1.0)]))
    });
    let pipeline = pipeline_with(Some(remote.clone()));
    pipeline.set_scope(Some("case-1".into()));

    pipeline.set_query("slow");
    sleep(Duration::from_millis(350)).await; // A dispatched at 300ms, resolves at 800ms
    pipeline.set_query("fast");
    sleep(Duration::from_millis(350)).await; // B dispatched at 650ms, resolved at 660ms
    assert_eq!(ids(&pipeline.state().results), ["fast"]);

    sleep(Duration::from_millis(1000)).await; // A resolved, must be dropped
    let state = pipeline.state();
    assert_eq!(state.phase, SearchPhase::Succeeded);
    assert_eq!(ids(&state.results), ["fast"]);
    assert_eq!(remote.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn flushed_dispatches_apply_in_issue_order() {
    let remote = ScriptedRemote::new(|q| {
        let delay = if q == "first" { 300 } else { 20 };
        (Duration::from_millis(delay), Ok(vec![note(q, 1.0)]))
    });
    let pipeline = pipeline_with(Some(remote));
    pipeline.set_scope(Some("case-1".into()));

    pipeline.set_query("first");
    let a = pipeline.flush().expect("dispatch a");
    pipeline.set_query("second");
    let b = pipeline.flush().expect("dispatch b");
    b.await.unwrap();
    a.await.unwrap();
    assert_eq!(ids(&pipeline.state().results), ["second"]);
}

#[tokio::test(start_paused = true)]
async fn remote_failure_falls_back_to_local_scan() {
    let remote = ScriptedRemote::new(|_| (Duration::from_millis(20), Err(SearchError::RemoteUnavailable("index offline".into()))));
    let pipeline = pipeline_with(Some(remote.clone()));
    pipeline.set_scope(Some("case-1".into()));

    pipeline.set_query("contract");
    sleep(Duration::from_millis(400)).await;

    let state = pipeline.state();
    assert_eq!(state.phase, SearchPhase::Succeeded);
    assert_eq!(ids(&state.results), ["/case/contract.pdf", "/case/notes.txt"]);
    assert!(state.results.iter().all(|r| r.match_type() == MatchType::File));
    assert_eq!(state.error, Some(SearchError::RemoteUnavailable("index offline".into())));
    assert_eq!(remote.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_remote_times_out_into_fallback() {
    let remote = ScriptedRemote::new(|_| (Duration::from_secs(60), Ok(vec![note("never", 9.0)])));
    let settings = SearchSettings { remote_timeout_ms: 1000, ..SearchSettings::default() };
    let pipeline = QueryPipeline::new(settings, inventory(), Some(remote as Arc<dyn RemoteIndex>));
    pipeline.set_scope(Some("case-1".into()));

    pipeline.set_query("photo");
    sleep(Duration::from_millis(1500)).await;

    let state = pipeline.state();
    assert_eq!(state.phase, SearchPhase::Succeeded);
    assert_eq!(ids(&state.results), ["/case/photo.jpg"]);
    assert_eq!(state.error, Some(SearchError::RemoteTimeout(1000)));
}

#[tokio::test(start_paused = true)]
async fn no_scope_goes_straight_to_local_scan() {
    let remote = ScriptedRemote::new(|_| (Duration::ZERO, Ok(vec![note("remote", 1.0)])));
    let pipeline = pipeline_with(Some(remote.clone()));

    pipeline.set_query("contract");
    sleep(Duration::from_millis(400)).await;

    assert!(remote.calls().is_empty());
    let state = pipeline.state();
    assert_eq!(state.phase, SearchPhase::Succeeded);
    assert_eq!(ids(&state.results), ["/case/contract.pdf", "/case/notes.txt"]);
    assert_eq!(state.error, None);
}

#[tokio::test(start_paused = true)]
async fn scope_change_discards_in_flight_results() {
    let remote = ScriptedRemote::new(|_| (Duration::from_millis(500), Ok(vec![note("old-case", 1.0)])));
    let pipeline = pipeline_with(Some(remote.clone()));
    pipeline.set_scope(Some("case-1".into()));

    pipeline.set_query("contract");
    sleep(Duration::from_millis(350)).await;
    assert!(pipeline.state().loading);

    pipeline.set_scope(Some("case-2".into()));
    assert_eq!(pipeline.query(), "");
    assert_eq!(pipeline.state().phase, SearchPhase::Idle);

    sleep(Duration::from_millis(1000)).await;
    let state = pipeline.state();
    assert_eq!(state.phase, SearchPhase::Idle);
    assert!(state.results.is_empty());
    assert!(!state.loading);
    assert_eq!(pipeline.scope().as_deref(), Some("case-2"));
    assert_eq!(remote.calls(), [("case-1".to_string(), "contract".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn same_scope_keeps_session() {
    let pipeline = pipeline_with(None);
    pipeline.set_scope(Some("case-1".into()));
    pipeline.set_query("contract");
    pipeline.set_scope(Some("case-1".into()));
    assert_eq!(pipeline.query(), "contract");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(pipeline.state().results.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn close_cancels_pending_debounce_and_dispatch() {
    let remote = ScriptedRemote::new(|_| (Duration::from_millis(100), Ok(vec![note("n1", 1.0)])));
    let pipeline = pipeline_with(Some(remote.clone()));
    pipeline.set_scope(Some("case-1".into()));

    pipeline.set_query("contract");
    sleep(Duration::from_millis(100)).await;
    pipeline.close();
    sleep(Duration::from_millis(1000)).await;
    assert!(remote.calls().is_empty(), "debounce timer was cancelled");

    pipeline.set_query("contract");
    sleep(Duration::from_millis(350)).await;
    pipeline.close();
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(remote.calls().len(), 1);
    assert_eq!(pipeline.state().phase, SearchPhase::Idle);
    assert!(pipeline.state().results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_pipeline_discards_in_flight_dispatch() {
    let remote = ScriptedRemote::new(|_| (Duration::from_millis(100), Ok(vec![note("n1", 1.0)])));
    let pipeline = pipeline_with(Some(remote.clone()));
    pipeline.set_scope(Some("case-1".into()));
    let rx = pipeline.subscribe();

    pipeline.set_query("contract");
    sleep(Duration::from_millis(350)).await;
    assert!(rx.borrow().loading);
    drop(pipeline);
    sleep(Duration::from_millis(1000)).await;

    assert_eq!(remote.calls().len(), 1);
    let state = rx.borrow().clone();
    assert_eq!(state.phase, SearchPhase::Idle);
    assert!(state.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn clearing_the_query_returns_to_idle() {
    let pipeline = pipeline_with(None);
    pipeline.set_query("contract");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(pipeline.state().results.len(), 2);

    pipeline.set_query("  ");
    let state = pipeline.state();
    assert_eq!(state.phase, SearchPhase::Idle);
    assert!(state.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn remote_results_are_ranked_and_capped() {
    let remote = ScriptedRemote::new(|_| {
        (
            Duration::from_millis(5),
            Ok(vec![
                note("n-low", 1.0),
                SearchResult::File(FileMatch { path: "/case/a.pdf".into(), name: "a.pdf".into(), folder: None, snippet: None, rank: 3.0 }),
                SearchResult::Finding(FindingMatch { id: "f1".into(), title: "Hidden account".into(), snippet: None, rank: 2.0 }),
                note("n-tie", 2.0),
            ]),
        )
    });
    let settings = SearchSettings { max_results: 3, ..SearchSettings::default() };
    let pipeline = QueryPipeline::new(settings, inventory(), Some(remote as Arc<dyn RemoteIndex>));
    pipeline.set_scope(Some("case-1".into()));
    pipeline.set_query("account");
    sleep(Duration::from_millis(400)).await;

    assert_eq!(ids(&pipeline.state().results), ["/case/a.pdf", "f1", "n-tie"]);
}

#[tokio::test(start_paused = true)]
async fn total_failure_is_published_as_failed() {
    let remote = ScriptedRemote::new(|_| (Duration::ZERO, Err(SearchError::RemoteUnavailable("down".into()))));
    let pipeline = QueryPipeline::new(SearchSettings::default(), Arc::new(BrokenRecords), Some(remote as Arc<dyn RemoteIndex>));
    pipeline.set_scope(Some("case-1".into()));
    pipeline.set_query("contract");
    sleep(Duration::from_millis(400)).await;

    let state = pipeline.state();
    assert_eq!(state.phase, SearchPhase::Failed);
    assert!(state.results.is_empty());
    assert!(!state.loading);
    assert_eq!(state.error, Some(SearchError::Records("inventory not loaded".into())));
}

#[tokio::test(start_paused = true)]
async fn reloaded_inventory_is_seen_by_next_dispatch() {
    let records = inventory();
    let pipeline = QueryPipeline::new(SearchSettings::list_filter(), records.clone(), None);
    pipeline.set_query("ledger");
    sleep(Duration::from_millis(200)).await;
    assert!(pipeline.state().results.is_empty());

    records.replace(vec![Arc::new(FileRecord::new("/case/ledger.xlsx", "ledger.xlsx"))]);
    pipeline.set_query("ledger ");
    sleep(Duration::from_millis(200)).await;
    assert_eq!(ids(&pipeline.state().results), ["/case/ledger.xlsx"]);
}
