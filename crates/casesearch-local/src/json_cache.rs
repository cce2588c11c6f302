use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use casesearch_core::types::FileRecord;

pub type Fields = Map<String, Value>;

struct Entry {
	record: Weak<FileRecord>,
	fields: Arc<Fields>,
}

/// Parsed structured blobs keyed by record instance.
///
/// Entries hold only a weak handle to their record, so a dropped record is
/// never kept alive here; [`JsonFieldCache::prune`] drops its entry. A record
/// replaced by a new `Arc` is a different key and gets parsed afresh. Parsed
/// maps are shared as `Arc` and never mutated after insertion.
#[derive(Default)]
pub struct JsonFieldCache {
	entries: HashMap<usize, Entry>,
	parses: u64,
}

impl JsonFieldCache {
	pub fn new() -> Self { Self::default() }

	/// Parsed blob for `record`, or `None` when the record carries no blob.
	/// Malformed or non-object blobs yield an empty map.
	pub fn fields(&mut self, record: &Arc<FileRecord>) -> Option<Arc<Fields>> {
		let blob = record.data.as_deref()?;
		let key = Arc::as_ptr(record) as usize;
		// A live weak handle pins the allocation, so equal addresses mean the same instance.
		if let Some(entry) = self.entries.get(&key) { return Some(Arc::clone(&entry.fields)); }
		let fields = Arc::new(parse_blob(&record.absolute_path, blob));
		self.parses += 1;
		self.entries.insert(key, Entry { record: Arc::downgrade(record), fields: Arc::clone(&fields) });
		Some(fields)
	}

	/// Drop entries whose record is gone. Returns how many were removed.
	pub fn prune(&mut self) -> usize {
		let before = self.entries.len();
		self.entries.retain(|_, e| e.record.strong_count() > 0);
		before - self.entries.len()
	}

	pub fn len(&self) -> usize { self.entries.len() }

	pub fn is_empty(&self) -> bool { self.entries.is_empty() }

	/// Number of blob parses performed so far.
	pub fn parse_count(&self) -> u64 { self.parses }
}

fn parse_blob(path: &str, blob: &str) -> Fields {
	match serde_json::from_str::<Value>(blob) {
		Ok(Value::Object(map)) => map,
		Ok(_) => {
			tracing::debug!(record = path, "structured data is not an object; treating as empty");
			Map::new()
		}
		Err(e) => {
			tracing::debug!(record = path, error = %e, "malformed structured data; treating as empty");
			Map::new()
		}
	}
}
