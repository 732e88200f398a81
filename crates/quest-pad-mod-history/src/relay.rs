/// Per-controller adapters that translate controller notifications into
/// history events.
///
/// Element edits carrying a revert action are dropped here: reverts are
/// bookkeeping for undoing synced edits and are never part of the history.
use std::sync::Arc;

use quest_pad_core::{Edit, ElementEdit, NoteEdit, NoteQuestHidden, OsmQuestHidden};
use quest_pad_edits::{
    ElementEditsListener, HideNoteQuestListener, HideOsmQuestListener, NoteEditsListener,
};

use crate::listener::{HistoryBus, HistoryEvent};

pub(crate) struct ElementEditsRelay {
    bus: Arc<HistoryBus>,
}

impl ElementEditsRelay {
    pub(crate) fn new(bus: Arc<HistoryBus>) -> Self {
        Self { bus }
    }

    fn relay(&self, edit: &ElementEdit, event: fn(Edit) -> HistoryEvent) {
        if edit.action.is_revert() {
            tracing::trace!("Not relaying revert element edit #{}", edit.id);
            return;
        }
        self.bus.emit(&event(Edit::Element(edit.clone())));
    }
}

impl ElementEditsListener for ElementEditsRelay {
    fn on_added_edit(&self, edit: &ElementEdit) {
        self.relay(edit, HistoryEvent::Added);
    }

    fn on_synced_edit(&self, edit: &ElementEdit) {
        self.relay(edit, HistoryEvent::Synced);
    }

    fn on_deleted_edit(&self, edit: &ElementEdit) {
        self.relay(edit, HistoryEvent::Deleted);
    }
}

pub(crate) struct NoteEditsRelay {
    bus: Arc<HistoryBus>,
}

impl NoteEditsRelay {
    pub(crate) fn new(bus: Arc<HistoryBus>) -> Self {
        Self { bus }
    }
}

impl NoteEditsListener for NoteEditsRelay {
    fn on_added_edit(&self, edit: &NoteEdit) {
        self.bus.emit(&HistoryEvent::Added(Edit::Note(edit.clone())));
    }

    fn on_synced_edit(&self, edit: &NoteEdit) {
        self.bus
            .emit(&HistoryEvent::Synced(Edit::Note(edit.clone())));
    }

    fn on_deleted_edit(&self, edit: &NoteEdit) {
        self.bus
            .emit(&HistoryEvent::Deleted(Edit::Note(edit.clone())));
    }
}

pub(crate) struct NoteQuestHiddenRelay {
    bus: Arc<HistoryBus>,
}

impl NoteQuestHiddenRelay {
    pub(crate) fn new(bus: Arc<HistoryBus>) -> Self {
        Self { bus }
    }
}

impl HideNoteQuestListener for NoteQuestHiddenRelay {
    fn on_hid(&self, edit: &NoteQuestHidden) {
        self.bus
            .emit(&HistoryEvent::Added(Edit::NoteQuestHidden(edit.clone())));
    }

    fn on_unhid(&self, edit: &NoteQuestHidden) {
        self.bus
            .emit(&HistoryEvent::Deleted(Edit::NoteQuestHidden(edit.clone())));
    }

    fn on_unhid_all(&self) {
        self.bus.emit(&HistoryEvent::Invalidated);
    }
}

pub(crate) struct OsmQuestHiddenRelay {
    bus: Arc<HistoryBus>,
}

impl OsmQuestHiddenRelay {
    pub(crate) fn new(bus: Arc<HistoryBus>) -> Self {
        Self { bus }
    }
}

impl HideOsmQuestListener for OsmQuestHiddenRelay {
    fn on_hid(&self, edit: &OsmQuestHidden) {
        self.bus
            .emit(&HistoryEvent::Added(Edit::OsmQuestHidden(edit.clone())));
    }

    fn on_unhid(&self, edit: &OsmQuestHidden) {
        self.bus
            .emit(&HistoryEvent::Deleted(Edit::OsmQuestHidden(edit.clone())));
    }

    fn on_unhid_all(&self) {
        self.bus.emit(&HistoryEvent::Invalidated);
    }
}
