//! Input acquisition for assignment summaries.
//!
//! Items and responses come either from the backend store over HTTP or
//! from local JSON files (fixtures, exports). Serving the computed
//! summary is out of scope; this module only reads.

use crate::models::{Item, StudentResponse};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// An assignment as returned by the backend store.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentRecord {
    /// Display title; filled with a placeholder when the store omits it.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// HTTP client for the backend store.
pub struct StoreClient {
    base_url: String,
    http: reqwest::Client,
}

impl StoreClient {
    /// Create a client against the given base URL.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Fetch an assignment (title + items) from the store.
    pub async fn fetch_assignment(&self, assignment_id: &str) -> Result<AssignmentRecord> {
        let url = format!("{}/assignments/{}", self.base_url, assignment_id);
        debug!("Fetching assignment from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach backend at {}", url))?
            .error_for_status()
            .with_context(|| format!("Backend rejected request for assignment '{}'", assignment_id))?;

        let mut record: AssignmentRecord = response
            .json()
            .await
            .context("Failed to parse assignment payload")?;

        if record.title.as_deref().map_or(true, str::is_empty) {
            record.title = Some(format!("Assignment {}", assignment_id));
        }

        Ok(record)
    }

    /// Fetch all student responses recorded for an assignment.
    pub async fn fetch_responses(&self, assignment_id: &str) -> Result<Vec<StudentResponse>> {
        let url = format!("{}/assignments/{}/responses", self.base_url, assignment_id);
        debug!("Fetching responses from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach backend at {}", url))?
            .error_for_status()
            .with_context(|| {
                format!("Backend rejected responses request for assignment '{}'", assignment_id)
            })?;

        response
            .json()
            .await
            .context("Failed to parse responses payload")
    }
}

/// Items loaded from a local file.
#[derive(Debug, Clone)]
pub struct LoadedItems {
    pub title: Option<String>,
    pub items: Vec<Item>,
}

/// Items file shape: either a bare array or a `{ title, items }`
/// envelope as exported by the item bank.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsFile {
    Envelope {
        #[serde(default)]
        title: Option<String>,
        items: Vec<Item>,
    },
    Bare(Vec<Item>),
}

/// Load items from a local JSON file.
pub fn load_items(path: &Path) -> Result<LoadedItems> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items file: {}", path.display()))?;

    let parsed: ItemsFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse items file: {}", path.display()))?;

    Ok(match parsed {
        ItemsFile::Envelope { title, items } => LoadedItems { title, items },
        ItemsFile::Bare(items) => LoadedItems { title: None, items },
    })
}

/// Load student responses from a local JSON file (a bare array).
pub fn load_responses(path: &Path) -> Result<Vec<StudentResponse>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read responses file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse responses file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_items_bare_array() {
        let file = write_temp(r#"[{"id": "i1", "stem": "Which organelle?", "teks": ["BIO.5.A"]}]"#);

        let loaded = load_items(file.path()).unwrap();
        assert!(loaded.title.is_none());
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].id, "i1");
    }

    #[test]
    fn test_load_items_envelope() {
        let file = write_temp(
            r#"{"title": "Cell Biology Check", "items": [{"id": "i1"}, {"id": "i2"}]}"#,
        );

        let loaded = load_items(file.path()).unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Cell Biology Check"));
        assert_eq!(loaded.items.len(), 2);
    }

    #[test]
    fn test_load_responses() {
        let file = write_temp(
            r#"[{"itemId": "i1", "studentId": "s1", "isCorrect": true},
                {"itemId": "i1", "studentId": "s2", "score": 3, "maxScore": 5}]"#,
        );

        let responses = load_responses(file.path()).unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses[0].correct());
        assert!(!responses[1].correct());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = load_items(Path::new("/nonexistent/items.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_unreachable_backend_errors() {
        // Port 9 (discard) is not listening; the error should carry the URL
        let client = StoreClient::new("http://127.0.0.1:9/", 1).unwrap();
        let result = tokio_test::block_on(client.fetch_assignment("a1"));
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("127.0.0.1:9"));
    }
}
