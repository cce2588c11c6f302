use std::sync::{Arc, PoisonError, RwLock};

use casesearch_core::error::Result;
use casesearch_core::traits::RecordSource;
use casesearch_core::types::FileRecord;

/// Records currently loaded by the inventory view.
///
/// The inventory swaps the whole snapshot on reload; scans already running
/// keep the snapshot they started with.
pub struct InMemoryRecords {
    records: RwLock<Arc<[Arc<FileRecord>]>>,
}

impl InMemoryRecords {
    pub fn new(records: Vec<FileRecord>) -> Self { Self::from_shared(records.into_iter().map(Arc::new).collect()) }

    pub fn from_shared(records: Vec<Arc<FileRecord>>) -> Self { Self { records: RwLock::new(Arc::from(records)) } }

    pub fn replace(&self, records: Vec<Arc<FileRecord>>) {
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(records);
    }

    pub fn snapshot(&self) -> Arc<[Arc<FileRecord>]> {
        Arc::clone(&self.records.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize { self.snapshot().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl RecordSource for InMemoryRecords {
    fn records(&self, _scope_id: Option<&str>) -> Result<Arc<[Arc<FileRecord>]>> { Ok(self.snapshot()) }
}
