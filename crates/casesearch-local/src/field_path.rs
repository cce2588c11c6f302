use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A dotted path into a structured blob, split once.
///
/// Numeric segments also index into arrays, so `parties.0` reaches the first
/// element of a `parties` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
	raw: String,
	segments: Vec<String>,
}

impl FieldPath {
	pub fn parse(raw: &str) -> Self {
		let segments = raw.split('.').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
		Self { raw: raw.to_string(), segments }
	}

	pub fn raw(&self) -> &str { &self.raw }

	pub fn segments(&self) -> &[String] { &self.segments }

	pub fn resolve<'v>(&self, fields: &'v Map<String, Value>) -> Option<&'v Value> {
		let (first, rest) = self.segments.split_first()?;
		let mut current = fields.get(first)?;
		for seg in rest {
			current = match current {
				Value::Object(map) => map.get(seg)?,
				Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
				_ => return None,
			};
		}
		Some(current)
	}
}

/// Raw path string → parsed path. Never evicted: its size is bounded by the
/// number of configured field paths, not by the dataset.
#[derive(Debug, Default)]
pub struct FieldPathCache {
	paths: HashMap<String, Arc<FieldPath>>,
}

impl FieldPathCache {
	pub fn new() -> Self { Self::default() }

	pub fn get(&mut self, raw: &str) -> Arc<FieldPath> {
		if let Some(path) = self.paths.get(raw) { return Arc::clone(path); }
		let path = Arc::new(FieldPath::parse(raw));
		self.paths.insert(raw.to_string(), Arc::clone(&path));
		path
	}

	pub fn len(&self) -> usize { self.paths.len() }

	pub fn is_empty(&self) -> bool { self.paths.is_empty() }
}
