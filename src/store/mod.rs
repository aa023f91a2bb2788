//! Session state shared by the UI panels
//!
//! One [`Session`] is built at startup and lives for the whole run. Switching
//! dataset version is the navigation boundary: it resets the mark list, the
//! selection, the document list and any remembered file failures, while bus
//! subscriptions and the PDF cache survive.

pub mod mark_list;
pub mod pdf_info;
pub mod selection;

use std::collections::HashMap;
use std::rc::Rc;

use crate::core::dataset::DocumentEntry;
use crate::core::event_bus::EventBus;
use crate::core::mark::Mark;
use crate::core::resolver::{ResolveError, ResolvedFile};
use crate::core::transport::TransportError;
use mark_list::{FetchTicket, MarkListStore, MarkPage, StoreError};
use pdf_info::{PdfInfoStore, PdfKey};
use selection::SelectionStore;

/// Topic carrying [`AppEvent::MarkClick`]
pub const MARK_CLICK: &str = "mark:click";

/// Payloads published on the session bus
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A mark was selected, or the selection was cleared
    MarkClick(Option<Mark>),
}

/// Bus and stores for one viewer session
pub struct Session {
    pub bus: Rc<EventBus<AppEvent>>,
    pub selection: Rc<SelectionStore>,
    pub marks: MarkListStore,
    pub pdfs: PdfInfoStore,
    /// Documents listed by the active dataset
    pub documents: Vec<DocumentEntry>,
    /// Last failed resolution per file. Shown until the file is selected
    /// again, retried, or the version changes; never served as a cache hit.
    file_errors: HashMap<PdfKey, ResolveError>,
    version: String,
}

impl Session {
    pub fn new(version: &str, page_size: usize) -> Self {
        let bus = Rc::new(EventBus::new());
        Self {
            selection: Rc::new(SelectionStore::new(Rc::clone(&bus))),
            bus,
            marks: MarkListStore::new(page_size),
            pdfs: PdfInfoStore::new(),
            documents: Vec::new(),
            file_errors: HashMap::new(),
            version: version.to_string(),
        }
    }

    /// Active dataset version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether a result produced for `version` still applies
    pub fn is_current(&self, version: &str) -> bool {
        self.version == version
    }

    pub fn document(&self, id: &str) -> Option<&DocumentEntry> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    /// Navigate to another dataset version.
    ///
    /// Clears the mark list, the documents, remembered file failures and the
    /// selection.
    pub fn switch_version(&mut self, version: &str) {
        tracing::info!("Switching dataset from v{} to v{}", self.version, version);
        self.version = version.to_string();
        self.marks.reset();
        self.documents.clear();
        self.file_errors.clear();
        self.selection.select(None);
    }

    /// Apply a finished dataset fetch.
    ///
    /// The version is checked first, then the ticket; documents are only
    /// replaced once the mark list accepted the page.
    pub fn apply_marks(
        &mut self,
        version: &str,
        ticket: FetchTicket,
        result: Result<(Vec<DocumentEntry>, MarkPage), TransportError>,
    ) -> Result<(), StoreError> {
        if !self.is_current(version) {
            return Err(StoreError::VersionMismatch {
                fetched: version.to_string(),
                current: self.version.clone(),
            });
        }

        match result {
            Ok((documents, page)) => {
                self.marks.settle(ticket, Ok(page))?;
                self.documents = documents;
            }
            Err(err) => self.marks.settle(ticket, Err(err))?,
        }
        Ok(())
    }

    /// Failure shown for `key`, if its last resolution failed
    pub fn file_error(&self, key: &PdfKey) -> Option<&ResolveError> {
        self.file_errors.get(key)
    }

    /// Decide whether `key` needs a resolution now and mark it pending if so.
    ///
    /// A remembered failure holds the file back until `reselected` is set,
    /// i.e. the user picked a mark again, which forgets the failure.
    pub fn begin_file(&mut self, key: &PdfKey, reselected: bool) -> bool {
        if reselected && self.file_errors.remove(key).is_some() {
            tracing::debug!("Selection retries v{}/{}", key.version, key.filename);
        }
        if self.file_errors.contains_key(key) {
            return false;
        }
        self.pdfs.begin_resolve(key)
    }

    /// Forget a failed resolution so the next frame resolves again
    pub fn retry_file(&mut self, key: &PdfKey) {
        self.file_errors.remove(key);
    }

    /// Record a finished resolution. Results for a version that is no longer
    /// active still land in the PDF cache, keyed by their own version.
    pub fn apply_file(&mut self, key: PdfKey, result: Result<ResolvedFile, ResolveError>) {
        if let Err(e) = &result {
            let path = e.path().unwrap_or(&key.filename);
            tracing::error!("Failed to resolve {}: {}", path, e);
            if self.is_current(&key.version) {
                self.file_errors.insert(key.clone(), e.clone());
            }
        }
        self.pdfs.record(key, &result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn not_found(key: &PdfKey) -> Result<ResolvedFile, ResolveError> {
        Err(ResolveError::NotFound {
            path: format!("/web/mocks/v{}/{}.pdf", key.version, key.filename),
            status: 404,
        })
    }

    fn unreachable() -> TransportError {
        TransportError::Connectivity {
            path: "/mocks/v1/data.json".to_string(),
            message: "connection refused".to_string(),
        }
    }

    fn loaded(ids: &[&str]) -> Result<(Vec<DocumentEntry>, MarkPage), TransportError> {
        let documents = ids
            .iter()
            .map(|id| DocumentEntry {
                id: id.to_string(),
                title: String::new(),
            })
            .collect();
        Ok((documents, MarkPage::default()))
    }

    #[test]
    fn test_switch_version_resets_marks_and_selection() {
        let mut session = Session::new("1", 10);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.bus.subscribe(MARK_CLICK, move |event: &AppEvent| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });

        session.marks.add_mark(Mark::new("a", "1", 1)).unwrap();
        session.selection.select(session.marks.get("a").cloned());
        session.switch_version("2");

        assert_eq!(session.version(), "2");
        assert!(session.is_current("2"));
        assert!(!session.is_current("1"));
        assert!(session.marks.marks().is_empty());
        assert!(session.selection.current().is_none());
        assert_eq!(*events.borrow().last().unwrap(), AppEvent::MarkClick(None));
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn test_missing_file_is_resolved_again_on_next_selection() {
        let mut session = Session::new("1", 10);
        let key = PdfKey::new("1", "9");

        assert!(session.begin_file(&key, true));
        session.apply_file(key.clone(), not_found(&key));
        assert!(matches!(
            session.file_error(&key),
            Some(ResolveError::NotFound { status: 404, .. })
        ));

        // Redrawing the same selection does not resolve again
        assert!(!session.begin_file(&key, false));
        assert!(session.file_error(&key).is_some());

        // Picking the mark again does
        assert!(session.begin_file(&key, true));
        assert!(session.file_error(&key).is_none());
    }

    #[test]
    fn test_version_round_trip_forgets_file_failures() {
        let mut session = Session::new("1", 10);
        let key = PdfKey::new("1", "9");
        assert!(session.begin_file(&key, true));
        session.apply_file(key.clone(), not_found(&key));

        session.switch_version("2");
        session.switch_version("1");

        assert!(session.file_error(&key).is_none());
        assert!(session.begin_file(&key, false));
    }

    #[test]
    fn test_retry_clears_failure() {
        let mut session = Session::new("1", 10);
        let key = PdfKey::new("1", "2");
        assert!(session.begin_file(&key, true));
        session.apply_file(
            key.clone(),
            Err(ResolveError::ResolutionFailed {
                path: "/web/mocks/v1/2.pdf".to_string(),
                source: unreachable(),
            }),
        );
        assert!(session.file_error(&key).is_some_and(ResolveError::is_retryable));

        session.retry_file(&key);
        assert!(session.begin_file(&key, false));
    }

    #[test]
    fn test_failure_for_previous_version_is_not_remembered() {
        let mut session = Session::new("1", 10);
        let key = PdfKey::new("1", "9");
        assert!(session.begin_file(&key, true));

        session.switch_version("2");
        session.apply_file(key.clone(), not_found(&key));

        assert!(session.file_error(&key).is_none());
        assert!(!session.pdfs.contains(&key));
    }

    #[test]
    fn test_marks_for_previous_version_are_dropped() {
        let mut session = Session::new("1", 10);
        let ticket = session.marks.begin_fetch().unwrap();
        session.switch_version("2");

        let err = session.apply_marks("1", ticket, loaded(&["1"])).unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionMismatch {
                fetched: "1".to_string(),
                current: "2".to_string(),
            }
        );
        assert!(session.documents.is_empty());
        assert!(!session.marks.loading());
    }

    #[test]
    fn test_stale_fetch_after_round_trip_leaves_documents_alone() {
        let mut session = Session::new("1", 10);
        let stale = session.marks.begin_fetch().unwrap();
        session.switch_version("2");
        session.switch_version("1");
        let ticket = session.marks.begin_fetch().unwrap();

        let err = session.apply_marks("1", stale, loaded(&["old"])).unwrap_err();
        assert_eq!(err, StoreError::StaleFetch);
        assert!(session.documents.is_empty());
        assert!(session.marks.loading());

        session.apply_marks("1", ticket, loaded(&["new"])).unwrap();
        assert!(session.document("new").is_some());
        assert!(session.document("old").is_none());
        assert!(!session.marks.loading());
    }

    #[test]
    fn test_failed_fetch_keeps_documents() {
        let mut session = Session::new("1", 10);
        let ticket = session.marks.begin_fetch().unwrap();
        session.apply_marks("1", ticket, loaded(&["1"])).unwrap();

        let ticket = session.marks.begin_fetch().unwrap();
        session.apply_marks("1", ticket, Err(unreachable())).unwrap();

        assert_eq!(session.documents.len(), 1);
        assert_eq!(session.marks.last_error(), Some(&unreachable()));
    }
}
