//! Marks placed against document content

use serde::{Deserialize, Serialize};

/// Where a mark points inside a document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkLocation {
    /// Identifier of the document (the PDF filename without extension)
    pub document: String,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Vertical offset within the page, 0.0 (top) to 1.0 (bottom)
    #[serde(default)]
    pub offset: f32,
}

fn default_page() -> u32 {
    1
}

/// What the list and viewer panels show for a mark
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkDisplay {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// A single annotation, unique by `id` within a document version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub id: String,
    pub location: MarkLocation,
    #[serde(default)]
    pub display: MarkDisplay,
}

impl Mark {
    /// Create a mark on the given document page
    pub fn new(id: impl Into<String>, document: impl Into<String>, page: u32) -> Self {
        Self {
            id: id.into(),
            location: MarkLocation {
                document: document.into(),
                page,
                offset: 0.0,
            },
            display: MarkDisplay::default(),
        }
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.display.label = label.into();
        self
    }

    /// Set the display note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.display.note = Some(note.into());
        self
    }

    /// Label to show in lists, falling back to the identifier
    pub fn title(&self) -> &str {
        if self.display.label.is_empty() {
            &self.id
        } else {
            &self.display.label
        }
    }
}

/// Merge `incoming` into `existing` by mark id.
///
/// A mark whose id is already present replaces the old record in place; new ids
/// are appended in the order they arrive.
pub fn merge_marks(existing: &mut Vec<Mark>, incoming: impl IntoIterator<Item = Mark>) {
    for mark in incoming {
        match existing.iter_mut().find(|m| m.id == mark.id) {
            Some(slot) => *slot = mark,
            None => existing.push(mark),
        }
    }
}
