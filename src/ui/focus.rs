//! Per-panel reaction to mark selection

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;

use crate::core::event_bus::{EventBus, SubscriptionId};
use crate::core::mark::Mark;
use crate::store::{AppEvent, MARK_CLICK};

/// What a panel last heard on [`MARK_CLICK`], plus whether it still owes a scroll
#[derive(Debug, Default)]
pub struct FocusState {
    pub focused: Option<Mark>,
    scroll_pending: bool,
    /// Set by every selection, cleared by [`FocusState::take_fresh`]
    fresh: bool,
}

impl FocusState {
    /// Create a state that follows `mark:click` on `bus`
    pub fn follow(bus: &EventBus<AppEvent>, panel: &'static str) -> (Rc<RefCell<Self>>, SubscriptionId) {
        let state = Rc::new(RefCell::new(Self::default()));
        let sink = Rc::clone(&state);
        let id = bus.subscribe(MARK_CLICK, move |event| {
            let AppEvent::MarkClick(mark) = event;
            let mut state = sink
                .try_borrow_mut()
                .map_err(|_| anyhow!("{panel} focus is borrowed during selection"))?;
            state.scroll_pending = mark.is_some();
            state.fresh = mark.is_some();
            state.focused = mark.clone();
            Ok(())
        });
        (state, id)
    }

    pub fn is_focused(&self, id: &str) -> bool {
        self.focused.as_ref().is_some_and(|mark| mark.id == id)
    }

    /// Document of the focused mark
    pub fn document(&self) -> Option<&str> {
        self.focused.as_ref().map(|mark| mark.location.document.as_str())
    }

    /// Consume the pending scroll request
    pub fn take_scroll(&mut self) -> bool {
        std::mem::take(&mut self.scroll_pending)
    }

    /// Whether a mark was selected since the last call
    pub fn take_fresh(&mut self) -> bool {
        std::mem::take(&mut self.fresh)
    }
}
