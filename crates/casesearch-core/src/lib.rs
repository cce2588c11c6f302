//! casesearch-core
//!
//! Domain types, the remote-index and record-source seams, the result
//! ordering contract, configuration and inventory loading shared by the
//! local scorer and the query pipeline.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod inventory;
pub mod traits;
pub mod types;
pub mod unify;

pub use error::{Result, SearchError};
pub use traits::{RecordSource, RemoteIndex};
pub use types::{FileMatch, FileRecord, FindingMatch, MatchType, NoteMatch, SearchResult, TimelineMatch};
