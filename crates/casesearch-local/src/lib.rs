//! casesearch-local
//!
//! The fallback scorer used when the case index is unreachable or no case is
//! open: a bounded, early-terminating scan over in-memory file records with
//! weighted name/curated/custom field matching. See `scorer` for the ranking
//! rules and `json_cache`/`field_path` for the parse-once caches.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]
pub mod field_path;
pub mod json_cache;
pub mod scorer;

pub use field_path::{FieldPath, FieldPathCache};
pub use json_cache::JsonFieldCache;
pub use scorer::{LocalFallbackScorer, ScanLimits, ScanOutcome, ScanStats};
