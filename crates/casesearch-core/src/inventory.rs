//! Build `FileRecord`s from a directory tree or an exported inventory file.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use crate::types::FileRecord;

/// Walk `root` and return one record per regular file, sorted by path.
///
/// Each record gets a small structured blob with the derived `document_type`,
/// `document_description` and upper-cased `file_type`, so the scorer has
/// something beyond the name.
pub fn scan_directory(root: &Path) -> Result<Vec<FileRecord>> {
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }
    let mut records = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let folder = path.parent().map(|p| p.to_string_lossy().to_string());
        let file_type = path.extension().map(|e| e.to_string_lossy().to_uppercase()).unwrap_or_default();
        let document_type = derive_document_type(&name);
        let data = json!({
            "document_type": document_type,
            "document_description": derive_document_description(&name, document_type, &file_type),
            "file_type": file_type,
        });
        let mut record = FileRecord::new(path.to_string_lossy().to_string(), name).with_data(data.to_string());
        record.folder_path = folder;
        records.push(record);
    }
    records.sort_by(|a, b| a.absolute_path.cmp(&b.absolute_path));
    tracing::debug!(root = %root.display(), count = records.len(), "scanned inventory");
    Ok(records)
}

/// Document type guessed from well-known file name fragments.
pub fn derive_document_type(file_name: &str) -> &'static str {
    let name = file_name.to_lowercase().replace('-', "_");
    if name.contains("bank_statement") { "Bank Statement" }
    else if name.contains("credit_card_statement") { "Credit Card Statement" }
    else if name.contains("crypto_statement") { "Crypto Statement" }
    else if name.contains("retirement_statement") { "Retirement Statement" }
    else if name.contains("discovery_document") { "Discovery Request" }
    else { "Document" }
}

const MONTHS: [(&str, &str); 12] = [
    ("jan", "Jan"), ("feb", "Feb"), ("mar", "Mar"), ("apr", "Apr"), ("may", "May"), ("jun", "Jun"),
    ("jul", "Jul"), ("aug", "Aug"), ("sep", "Sep"), ("oct", "Oct"), ("nov", "Nov"), ("dec", "Dec"),
];

/// Human description such as `Joint Bank Statement Sep 25 PDF`.
///
/// A `joint` file name adds the `Joint ` prefix, retirement statements are
/// spelled out, the statement period is taken from the name when present and
/// PDF/CSV files get a format suffix (` PDF`, `_CSV`).
pub fn derive_document_description(file_name: &str, document_type: &str, file_type: &str) -> String {
    let name = file_name.to_lowercase();
    let mut out = String::new();
    if name.contains("joint") { out.push_str("Joint "); }
    out.push_str(if document_type == "Retirement Statement" { "Retirement Account Statement" } else { document_type });
    if let Some(period) = statement_period(&name) {
        out.push(' ');
        out.push_str(&period);
    }
    match file_type {
        "PDF" => out.push_str(" PDF"),
        "CSV" => out.push_str("_CSV"),
        _ => {}
    }
    out
}

/// First `<month> <yy|yyyy>` in a lower-cased name, e.g. `sep25` → `Sep 25`.
fn statement_period(name: &str) -> Option<String> {
    MONTHS.iter().find_map(|(needle, short)| {
        let pos = name.find(needle)?;
        let rest = &name[pos + needle.len()..];
        let digits = &rest[rest.find(|c: char| c.is_ascii_digit())?..];
        let year: String = digits.chars().take_while(char::is_ascii_digit).collect();
        matches!(year.len(), 2 | 4).then(|| format!("{} {}", short, year))
    })
}

#[derive(Deserialize)]
struct RawRecord {
    absolute_path: String,
    name: String,
    #[serde(default)]
    folder_path: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Load records from a JSON array. `data` may be an embedded object or an
/// already-serialized string; both end up as the serialized blob.
pub fn load_records_json(path: &Path) -> Result<Vec<FileRecord>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let raw: Vec<RawRecord> = serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(raw
        .into_iter()
        .map(|r| FileRecord {
            absolute_path: r.absolute_path,
            name: r.name,
            folder_path: r.folder_path,
            data: match r.data {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s),
                Some(other) => Some(other.to_string()),
            },
        })
        .collect())
}
