//! casesearch-pipeline
//!
//! Debounced, cancellation-safe query pipeline. Prefers the case's remote
//! index, falls back to the local scorer, and publishes
//! `{results, loading, error}` through a watch channel.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]
pub mod pipeline;
pub mod records;
pub mod state;

pub use pipeline::{DispatchToken, QueryPipeline};
pub use records::InMemoryRecords;
pub use state::{SearchPhase, SearchState};
