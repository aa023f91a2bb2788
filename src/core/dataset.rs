//! Versioned mock datasets

use serde::{Deserialize, Serialize};

use super::mark::Mark;
use super::resolver::FilePaths;
use super::transport::{HttpClient, TransportError};

/// A PDF listed by a dataset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentEntry {
    /// Filename without extension, as passed to the file resolver
    pub id: String,
    pub title: String,
}

impl DocumentEntry {
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

/// Contents of `/mocks/v{version}/data.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub documents: Vec<DocumentEntry>,
    pub marks: Vec<Mark>,
    /// Total mark count when the file only carries part of them
    pub total: Option<usize>,
}

impl Dataset {
    /// Marks on the zero-based `page` of `page_size` entries
    pub fn marks_page(&self, page: usize, page_size: usize) -> Vec<Mark> {
        self.marks
            .iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect()
    }

    pub fn total_marks(&self) -> usize {
        self.total.unwrap_or(self.marks.len())
    }
}

/// Fetches datasets over HTTP
#[derive(Debug, Clone)]
pub struct DatasetClient {
    http: HttpClient,
    paths: FilePaths,
}

impl DatasetClient {
    pub fn new(http: HttpClient, paths: FilePaths) -> Self {
        Self { http, paths }
    }

    /// Fetch and decode the dataset for `version`
    pub async fn fetch(&self, version: &str) -> Result<Dataset, TransportError> {
        let path = self.paths.dataset(version);
        let dataset: Dataset = self.http.get(&path).await?;
        tracing::info!(
            "Loaded dataset v{}: {} documents, {} marks",
            version,
            dataset.documents.len(),
            dataset.marks.len()
        );
        Ok(dataset)
    }
}
