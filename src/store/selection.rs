//! The currently selected mark

use std::cell::RefCell;
use std::rc::Rc;

use super::{AppEvent, MARK_CLICK};
use crate::core::event_bus::{EmitReport, EventBus};
use crate::core::mark::Mark;

/// Single source of truth for which mark is selected.
///
/// Every call to [`select`](Self::select) publishes [`AppEvent::MarkClick`] on
/// [`MARK_CLICK`], including when the same mark is selected again, so that
/// subscribers such as the viewer repeat their reaction (scroll to the mark).
pub struct SelectionStore {
    current: RefCell<Option<Mark>>,
    bus: Rc<EventBus<AppEvent>>,
}

impl SelectionStore {
    pub fn new(bus: Rc<EventBus<AppEvent>>) -> Self {
        Self {
            current: RefCell::new(None),
            bus,
        }
    }

    /// Replace the selection (`None` clears it) and notify subscribers.
    ///
    /// The new value is stored before any subscriber runs, so handlers that read
    /// [`current`](Self::current) see it.
    pub fn select(&self, mark: Option<Mark>) -> EmitReport {
        match &mark {
            Some(m) => tracing::debug!("Selected mark {}", m.id),
            None => tracing::debug!("Cleared mark selection"),
        }
        *self.current.borrow_mut() = mark.clone();
        self.bus.emit(MARK_CLICK, &AppEvent::MarkClick(mark))
    }

    /// The selected mark, if any
    pub fn current(&self) -> Option<Mark> {
        self.current.borrow().clone()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|mark| mark.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_log() -> (SelectionStore, Rc<RefCell<Vec<Option<String>>>>) {
        let bus = Rc::new(EventBus::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        bus.subscribe(MARK_CLICK, move |event: &AppEvent| {
            let AppEvent::MarkClick(mark) = event;
            sink.borrow_mut().push(mark.as_ref().map(|m| m.id.clone()));
            Ok(())
        });
        (SelectionStore::new(bus), log)
    }

    #[test]
    fn test_starts_empty() {
        let (store, log) = store_with_log();
        assert!(store.current().is_none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_one_emission_per_select_in_order() {
        let (store, log) = store_with_log();
        let sequence = ["a", "b", "b", "c", "a"];
        for id in sequence {
            store.select(Some(Mark::new(id, "1", 1)));
        }

        assert_eq!(store.current().unwrap().id, "a");
        let expected: Vec<_> = sequence.iter().map(|id| Some(id.to_string())).collect();
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn test_reselecting_same_mark_emits_again() {
        let (store, log) = store_with_log();
        let mark = Mark::new("m", "2", 3);
        store.select(Some(mark.clone()));
        store.select(Some(mark));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_clear_selection_emits_none() {
        let (store, log) = store_with_log();
        store.select(Some(Mark::new("m", "2", 3)));
        store.select(None);

        assert!(store.current().is_none());
        assert!(!store.is_selected("m"));
        assert_eq!(*log.borrow(), vec![Some("m".to_string()), None]);
    }

    #[test]
    fn test_handlers_observe_new_value() {
        let bus = Rc::new(EventBus::new());
        let store = Rc::new(SelectionStore::new(Rc::clone(&bus)));
        let seen = Rc::new(RefCell::new(None));

        let reader = Rc::clone(&store);
        let sink = Rc::clone(&seen);
        bus.subscribe(MARK_CLICK, move |_: &AppEvent| {
            *sink.borrow_mut() = reader.current().map(|m| m.id);
            Ok(())
        });

        store.select(Some(Mark::new("x", "1", 1)));
        assert_eq!(seen.borrow().as_deref(), Some("x"));
    }

    #[test]
    fn test_faulty_subscriber_does_not_block_selection() {
        let (store, log) = store_with_log();
        store.bus.subscribe(MARK_CLICK, |_: &AppEvent| Err(anyhow::anyhow!("viewer gone")));

        let report = store.select(Some(Mark::new("m", "1", 1)));
        assert_eq!(report.faults.len(), 1);
        assert_eq!(store.current().unwrap().id, "m");
        assert_eq!(log.borrow().len(), 1);
    }
}
