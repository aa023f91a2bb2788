//! Marks of the active document version, with fetch and dialog state

use thiserror::Error;

use crate::core::mark::{merge_marks, Mark};
use crate::core::transport::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Overlapping fetches are rejected rather than queued
    #[error("a mark fetch is already in flight")]
    FetchInFlight,

    /// The store was reset after the fetch started; its result is dropped
    #[error("fetch result arrived after the mark list was reset")]
    StaleFetch,

    /// The result belongs to a dataset version that is no longer active
    #[error("marks fetched for v{fetched} but v{current} is active")]
    VersionMismatch { fetched: String, current: String },

    #[error("mark {0} already exists")]
    DuplicateMark(String),

    #[error("no mark with id {0}")]
    UnknownMark(String),
}

/// Page cursor for incremental mark loading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Next zero-based page to fetch
    pub page: usize,
    pub page_size: usize,
    /// Total marks available, once known
    pub total: Option<usize>,
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            total: None,
        }
    }
}

/// One page of marks as returned by a fetch
#[derive(Debug, Clone, Default)]
pub struct MarkPage {
    pub marks: Vec<Mark>,
    pub total: usize,
}

/// Proof that a fetch was started; consumed by [`MarkListStore::settle`]
#[derive(Debug)]
pub struct FetchTicket {
    generation: u64,
}

/// Collection state behind the mark list panel
#[derive(Debug)]
pub struct MarkListStore {
    marks: Vec<Mark>,
    loading: bool,
    pagination: Pagination,
    /// Mark being created or edited in the dialog
    pub editing: Option<Mark>,
    pub dialog_visible: bool,
    last_error: Option<TransportError>,
    generation: u64,
}

impl MarkListStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            marks: Vec::new(),
            loading: false,
            pagination: Pagination::new(page_size),
            editing: None,
            dialog_visible: false,
            last_error: None,
            generation: 0,
        }
    }

    /// Marks in display order
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn get(&self, id: &str) -> Option<&Mark> {
        self.marks.iter().find(|m| m.id == id)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Why the last fetch failed, until the next one starts
    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    /// Whether another page may exist
    pub fn has_more(&self) -> bool {
        self.pagination
            .total
            .map_or(true, |total| self.marks.len() < total)
    }

    /// Mark a fetch as in flight. Fails while another fetch is outstanding.
    pub fn begin_fetch(&mut self) -> Result<FetchTicket, StoreError> {
        if self.loading {
            return Err(StoreError::FetchInFlight);
        }
        self.loading = true;
        self.last_error = None;
        Ok(FetchTicket {
            generation: self.generation,
        })
    }

    /// Apply the outcome of the fetch started with `ticket` and clear the loading flag
    pub fn settle(
        &mut self,
        ticket: FetchTicket,
        result: Result<MarkPage, TransportError>,
    ) -> Result<(), StoreError> {
        if ticket.generation != self.generation {
            return Err(StoreError::StaleFetch);
        }
        self.loading = false;

        match result {
            Ok(page) => {
                tracing::debug!(
                    "Mark page {} settled with {} marks",
                    self.pagination.page,
                    page.marks.len()
                );
                merge_marks(&mut self.marks, page.marks);
                self.pagination.page += 1;
                self.pagination.total = Some(page.total);
            }
            Err(err) => {
                tracing::error!("Failed to fetch marks: {}", err);
                self.last_error = Some(err);
            }
        }
        Ok(())
    }

    /// Append a newly created mark
    pub fn add_mark(&mut self, mark: Mark) -> Result<(), StoreError> {
        if self.get(&mark.id).is_some() {
            return Err(StoreError::DuplicateMark(mark.id));
        }
        self.marks.push(mark);
        if let Some(total) = self.pagination.total.as_mut() {
            *total += 1;
        }
        Ok(())
    }

    /// Replace an existing mark, keeping its position
    pub fn update_mark(&mut self, mark: Mark) -> Result<(), StoreError> {
        if self.get(&mark.id).is_none() {
            return Err(StoreError::UnknownMark(mark.id));
        }
        merge_marks(&mut self.marks, [mark]);
        Ok(())
    }

    pub fn remove_mark(&mut self, id: &str) -> Option<Mark> {
        let index = self.marks.iter().position(|m| m.id == id)?;
        if let Some(total) = self.pagination.total.as_mut() {
            *total = total.saturating_sub(1);
        }
        Some(self.marks.remove(index))
    }

    /// Show the mark dialog, editing `mark` or a fresh one
    pub fn open_dialog(&mut self, mark: Option<Mark>) {
        self.editing = mark;
        self.dialog_visible = true;
    }

    pub fn close_dialog(&mut self) {
        self.dialog_visible = false;
        self.editing = None;
    }

    /// Drop all state; any fetch still in flight becomes stale
    pub fn reset(&mut self) {
        let page_size = self.pagination.page_size;
        let generation = self.generation + 1;
        *self = Self::new(page_size);
        self.generation = generation;
    }
}
