//! Domain types shared by the local scorer, the remote index seam and the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type CaseId = String;
pub type RecordId = String;

/// A file/inventory record as supplied by the inventory subsystem.
///
/// - `absolute_path`: identity, unique within a case
/// - `name`: display name (usually the file name)
/// - `folder_path`: containing folder, shown next to file hits
/// - `data`: optional serialized JSON object with extensible fields
///   (`document_type`, `document_description`, `notes`, custom fields)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub absolute_path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl FileRecord {
    pub fn new(absolute_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self { absolute_path: absolute_path.into(), name: name.into(), folder_path: None, data: None }
    }

    pub fn with_folder(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = Some(folder_path.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// Discriminant of a [`SearchResult`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    File,
    Note,
    Finding,
    Timeline,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchType::File => "file",
            MatchType::Note => "note",
            MatchType::Finding => "finding",
            MatchType::Timeline => "timeline",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileMatch {
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub rank: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteMatch {
    pub id: RecordId,
    /// `None` for case-level notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub rank: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FindingMatch {
    pub id: RecordId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub rank: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineMatch {
    pub id: RecordId,
    /// Unix timestamp of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub rank: f32,
}

/// One hit, from either the local scorer or the remote index.
///
/// `rank` is non-negative and higher is always better. The identity is the
/// file path for file hits and the record id for everything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "match_type", rename_all = "lowercase")]
pub enum SearchResult {
    File(FileMatch),
    Note(NoteMatch),
    Finding(FindingMatch),
    Timeline(TimelineMatch),
}

impl SearchResult {
    pub fn match_type(&self) -> MatchType {
        match self {
            SearchResult::File(_) => MatchType::File,
            SearchResult::Note(_) => MatchType::Note,
            SearchResult::Finding(_) => MatchType::Finding,
            SearchResult::Timeline(_) => MatchType::Timeline,
        }
    }

    pub fn rank(&self) -> f32 {
        match self {
            SearchResult::File(m) => m.rank,
            SearchResult::Note(m) => m.rank,
            SearchResult::Finding(m) => m.rank,
            SearchResult::Timeline(m) => m.rank,
        }
    }

    pub(crate) fn rank_mut(&mut self) -> &mut f32 {
        match self {
            SearchResult::File(m) => &mut m.rank,
            SearchResult::Note(m) => &mut m.rank,
            SearchResult::Finding(m) => &mut m.rank,
            SearchResult::Timeline(m) => &mut m.rank,
        }
    }

    pub fn identity(&self) -> &str {
        match self {
            SearchResult::File(m) => &m.path,
            SearchResult::Note(m) => &m.id,
            SearchResult::Finding(m) => &m.id,
            SearchResult::Timeline(m) => &m.id,
        }
    }

    pub fn snippet(&self) -> Option<&str> {
        match self {
            SearchResult::File(m) => m.snippet.as_deref(),
            SearchResult::Note(m) => m.snippet.as_deref(),
            SearchResult::Finding(m) => m.snippet.as_deref(),
            SearchResult::Timeline(m) => m.snippet.as_deref(),
        }
    }
}
