use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::{FileRecord, SearchResult};

/// Persistent full-text index scoped to a case.
///
/// Implementations may be slow and may fail; failures are returned, never
/// panicked. Results can arrive in any order and of any match type.
pub trait RemoteIndex: Send + Sync {
    fn query<'a>(&'a self, scope_id: &'a str, text: &'a str) -> BoxFuture<'a, Result<Vec<SearchResult>>>;
}

/// Supplies the records the local scorer may see for a scope.
pub trait RecordSource: Send + Sync {
    fn records(&self, scope_id: Option<&str>) -> Result<Arc<[Arc<FileRecord>]>>;
}
