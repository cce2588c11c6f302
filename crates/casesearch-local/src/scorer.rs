use serde_json::Value;
use std::sync::Arc;

use casesearch_core::config::{ScoreWeights, SearchSettings, DEFAULT_MAX_PROCESSED, DEFAULT_MAX_RESULTS};
use casesearch_core::types::{FileMatch, FileRecord, SearchResult};
use casesearch_core::unify::sort_by_rank;

use crate::field_path::{FieldPath, FieldPathCache};
use crate::json_cache::{Fields, JsonFieldCache};

const SNIPPET_CHARS: usize = 120;

/// Bounds for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
	pub max_results: usize,
	/// Records past this index are never inspected.
	pub max_processed: usize,
}

impl Default for ScanLimits {
	fn default() -> Self { Self { max_results: DEFAULT_MAX_RESULTS, max_processed: DEFAULT_MAX_PROCESSED } }
}

impl From<&SearchSettings> for ScanLimits {
	fn from(s: &SearchSettings) -> Self { Self { max_results: s.max_results, max_processed: s.max_processed } }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
	pub inspected: usize,
	/// Matches collected before the final sort and cap.
	pub accepted: usize,
	pub terminated_early: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
	pub results: Vec<SearchResult>,
	pub stats: ScanStats,
}

struct Curated {
	path: Arc<FieldPath>,
	weight: u32,
}

/// In-memory multi-field scorer over file records.
///
/// Owns its caches: parsed field paths live for the scorer's lifetime, parsed
/// blobs live as long as their record does.
pub struct LocalFallbackScorer {
	weights: ScoreWeights,
	paths: FieldPathCache,
	blobs: JsonFieldCache,
}

impl Default for LocalFallbackScorer {
	fn default() -> Self { Self::new(ScoreWeights::default()) }
}

impl LocalFallbackScorer {
	pub fn new(weights: ScoreWeights) -> Self {
		Self { weights, paths: FieldPathCache::new(), blobs: JsonFieldCache::new() }
	}

	pub fn weights(&self) -> &ScoreWeights { &self.weights }

	pub fn field_paths(&self) -> &FieldPathCache { &self.paths }

	pub fn json_cache(&self) -> &JsonFieldCache { &self.blobs }

	pub fn search(&mut self, query: &str, records: &[Arc<FileRecord>], limits: ScanLimits) -> Vec<SearchResult> {
		self.search_with_stats(query, records, limits).results
	}

	pub fn search_with_stats(&mut self, query: &str, records: &[Arc<FileRecord>], limits: ScanLimits) -> ScanOutcome {
		let needle = query.trim().to_lowercase();
		if needle.is_empty() || limits.max_results == 0 { return ScanOutcome::default(); }

		let pruned = self.blobs.prune();
		if pruned > 0 { tracing::debug!(pruned, "dropped cached fields of released records"); }

		let curated: Vec<Curated> = self
			.weights
			.curated
			.iter()
			.map(|f| Curated { path: self.paths.get(&f.path), weight: f.weight })
			.collect();
		let collect_cap = limits.max_results.saturating_mul(2);
		let window = records.len().min(limits.max_processed);

		let mut stats = ScanStats::default();
		let mut matches = Vec::new();
		for record in &records[..window] {
			stats.inspected += 1;
			let Some((score, snippet)) = self.score_record(record, &needle, &curated) else { continue };
			matches.push(SearchResult::File(FileMatch {
				path: record.absolute_path.clone(),
				name: record.name.clone(),
				folder: record.folder_path.clone(),
				snippet,
				rank: score as f32,
			}));
			if matches.len() >= collect_cap { break; }
		}
		stats.accepted = matches.len();
		stats.terminated_early = stats.inspected < window;

		sort_by_rank(&mut matches);
		matches.truncate(limits.max_results);
		tracing::debug!(
			query = %needle,
			inspected = stats.inspected,
			accepted = stats.accepted,
			skipped = records.len() - window,
			early = stats.terminated_early,
			"local scan finished"
		);
		ScanOutcome { results: matches, stats }
	}

	/// Score for one record plus the snippet of the field that matched, or
	/// `None` when nothing matched.
	fn score_record(&mut self, record: &Arc<FileRecord>, needle: &str, curated: &[Curated]) -> Option<(u32, Option<String>)> {
		if record.name.to_lowercase().contains(needle) { return Some((self.weights.name, None)); }

		let fields = self.blobs.fields(record)?;
		let mut score = 0u32;
		let mut snippet = None;
		for field in curated {
			let Some(value) = field.path.resolve(&fields) else { continue };
			if let Some(text) = find_match(value, needle) {
				score = score.saturating_add(field.weight);
				snippet.get_or_insert_with(|| format_snippet(field.path.raw(), &text));
			}
		}
		// curated values all missed here, so rescanning them cannot hit
		if score == 0 {
			if let Some((key, text)) = find_custom_match(&fields, needle) {
				score = self.weights.custom;
				snippet = Some(format_snippet(key, &text));
			}
		}
		(score > 0).then_some((score, snippet))
	}
}

/// First value outside the curated fields that contains `needle`.
fn find_custom_match<'f>(fields: &'f Fields, needle: &str) -> Option<(&'f str, String)> {
	fields.iter().find_map(|(key, value)| find_match(value, needle).map(|text| (key.as_str(), text)))
}

/// Depth-first search for a scalar whose text contains `needle`.
fn find_match(value: &Value, needle: &str) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) => s.to_lowercase().contains(needle).then(|| s.clone()),
		Value::Number(n) => {
			let s = n.to_string();
			s.contains(needle).then_some(s)
		}
		Value::Bool(b) => {
			let s = b.to_string();
			s.contains(needle).then_some(s)
		}
		Value::Array(items) => items.iter().find_map(|v| find_match(v, needle)),
		Value::Object(map) => map.values().find_map(|v| find_match(v, needle)),
	}
}

fn format_snippet(label: &str, text: &str) -> String {
	let mut out: String = text.chars().take(SNIPPET_CHARS).collect();
	if text.chars().count() > SNIPPET_CHARS { out.push_str("..."); }
	format!("{}: {}", label, out)
}
