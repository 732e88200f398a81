// Scripted stand-ins for the four controllers.
//
// Each fake returns whatever the test put in it, records every undo call
// and lets the test fire listener notifications by hand.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use quest_pad_core::{
    Edit, ElementEdit, ElementEditAction, ElementType, LatLon, ListenerSet, NoteEdit,
    NoteEditAction, NoteQuestHidden, OsmQuestHidden, OsmQuestKey, StringMapChangesBuilder,
};
use quest_pad_edits::{
    ElementEditsListener, ElementEditsSource, HideNoteQuestListener, HideOsmQuestListener,
    NoteEditsListener, NoteEditsSource, NoteQuestHiddenSource, OsmQuestHiddenSource,
};
use quest_pad_mod_history::{EditHistoryListener, EditSources, HistoryEvent};

// ── Records ────────────────────────────────────────────────────────────

pub fn element_edit(id: u64, timestamp: i64, is_synced: bool) -> ElementEdit {
    let mut builder = StringMapChangesBuilder::new(Default::default());
    builder.add("phone", format!("555-{id}"));
    ElementEdit {
        id,
        quest_type: "AddPlacePhone".to_string(),
        element_type: ElementType::Node,
        element_id: id as i64,
        source: "survey".to_string(),
        position: LatLon::default(),
        created_timestamp: timestamp,
        is_synced,
        action: ElementEditAction::UpdateElementTags {
            changes: builder.create(),
        },
    }
}

pub fn revert_edit(id: u64, timestamp: i64) -> ElementEdit {
    ElementEdit {
        action: ElementEditAction::RevertDeletePoiNode,
        ..element_edit(id, timestamp, false)
    }
}

pub fn note_edit(id: u64, timestamp: i64, is_synced: bool) -> NoteEdit {
    NoteEdit {
        id,
        note_id: id as i64,
        position: LatLon::default(),
        action: NoteEditAction::Comment,
        text: "still there".to_string(),
        created_timestamp: timestamp,
        is_synced,
    }
}

pub fn hidden_note_quest(note_id: i64, timestamp: i64) -> NoteQuestHidden {
    NoteQuestHidden {
        note_id,
        position: LatLon::default(),
        created_timestamp: timestamp,
    }
}

pub fn hidden_osm_quest(element_id: i64, timestamp: i64) -> OsmQuestHidden {
    OsmQuestHidden {
        element_type: ElementType::Way,
        element_id,
        quest_type: "AddVegan".to_string(),
        position: LatLon::default(),
        created_timestamp: timestamp,
    }
}

// ── Fake controllers ───────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeElementEdits {
    pub edits: Mutex<Vec<ElementEdit>>,
    pub undone: Mutex<Vec<u64>>,
    pub undo_result: Mutex<bool>,
    pub listeners: ListenerSet<dyn ElementEditsListener>,
}

impl FakeElementEdits {
    pub fn emit_added(&self, edit: &ElementEdit) {
        self.listeners.for_each(|l| l.on_added_edit(edit));
    }
    pub fn emit_synced(&self, edit: &ElementEdit) {
        self.listeners.for_each(|l| l.on_synced_edit(edit));
    }
    pub fn emit_deleted(&self, edit: &ElementEdit) {
        self.listeners.for_each(|l| l.on_deleted_edit(edit));
    }
}

impl ElementEditsSource for FakeElementEdits {
    fn get_all(&self) -> Vec<ElementEdit> {
        self.edits.lock().clone()
    }
    fn undo(&self, edit: &ElementEdit) -> bool {
        self.undone.lock().push(edit.id);
        *self.undo_result.lock()
    }
    fn add_listener(&self, listener: Arc<dyn ElementEditsListener>) {
        self.listeners.add(listener);
    }
    fn remove_listener(&self, listener: &Arc<dyn ElementEditsListener>) -> bool {
        self.listeners.remove(listener)
    }
}

#[derive(Default)]
pub struct FakeNoteEdits {
    pub edits: Mutex<Vec<NoteEdit>>,
    pub undone: Mutex<Vec<u64>>,
    pub undo_result: Mutex<bool>,
    pub listeners: ListenerSet<dyn NoteEditsListener>,
}

impl FakeNoteEdits {
    pub fn emit_added(&self, edit: &NoteEdit) {
        self.listeners.for_each(|l| l.on_added_edit(edit));
    }
    pub fn emit_synced(&self, edit: &NoteEdit) {
        self.listeners.for_each(|l| l.on_synced_edit(edit));
    }
    pub fn emit_deleted(&self, edit: &NoteEdit) {
        self.listeners.for_each(|l| l.on_deleted_edit(edit));
    }
}

impl NoteEditsSource for FakeNoteEdits {
    fn get_all(&self) -> Vec<NoteEdit> {
        self.edits.lock().clone()
    }
    fn undo(&self, edit: &NoteEdit) -> bool {
        self.undone.lock().push(edit.id);
        *self.undo_result.lock()
    }
    fn add_listener(&self, listener: Arc<dyn NoteEditsListener>) {
        self.listeners.add(listener);
    }
    fn remove_listener(&self, listener: &Arc<dyn NoteEditsListener>) -> bool {
        self.listeners.remove(listener)
    }
}

#[derive(Default)]
pub struct FakeNoteQuests {
    pub hidden: Mutex<Vec<NoteQuestHidden>>,
    pub queried_with: Mutex<Vec<i64>>,
    pub unhidden: Mutex<Vec<i64>>,
    pub unhide_result: Mutex<bool>,
    pub listeners: ListenerSet<dyn HideNoteQuestListener>,
}

impl FakeNoteQuests {
    pub fn emit_hid(&self, edit: &NoteQuestHidden) {
        self.listeners.for_each(|l| l.on_hid(edit));
    }
    pub fn emit_unhid(&self, edit: &NoteQuestHidden) {
        self.listeners.for_each(|l| l.on_unhid(edit));
    }
    pub fn emit_unhid_all(&self) {
        self.listeners.for_each(|l| l.on_unhid_all());
    }
}

impl NoteQuestHiddenSource for FakeNoteQuests {
    fn get_all_hidden_newer_than(&self, timestamp: i64) -> Vec<NoteQuestHidden> {
        self.queried_with.lock().push(timestamp);
        self.hidden
            .lock()
            .iter()
            .filter(|h| h.created_timestamp >= timestamp)
            .cloned()
            .collect()
    }
    fn unhide(&self, note_id: i64) -> bool {
        self.unhidden.lock().push(note_id);
        *self.unhide_result.lock()
    }
    fn add_hide_listener(&self, listener: Arc<dyn HideNoteQuestListener>) {
        self.listeners.add(listener);
    }
    fn remove_hide_listener(&self, listener: &Arc<dyn HideNoteQuestListener>) -> bool {
        self.listeners.remove(listener)
    }
}

#[derive(Default)]
pub struct FakeOsmQuests {
    pub hidden: Mutex<Vec<OsmQuestHidden>>,
    pub queried_with: Mutex<Vec<i64>>,
    pub unhidden: Mutex<Vec<OsmQuestKey>>,
    pub unhide_result: Mutex<bool>,
    pub listeners: ListenerSet<dyn HideOsmQuestListener>,
}

impl FakeOsmQuests {
    pub fn emit_hid(&self, edit: &OsmQuestHidden) {
        self.listeners.for_each(|l| l.on_hid(edit));
    }
    pub fn emit_unhid(&self, edit: &OsmQuestHidden) {
        self.listeners.for_each(|l| l.on_unhid(edit));
    }
    pub fn emit_unhid_all(&self) {
        self.listeners.for_each(|l| l.on_unhid_all());
    }
}

impl OsmQuestHiddenSource for FakeOsmQuests {
    fn get_all_hidden_newer_than(&self, timestamp: i64) -> Vec<OsmQuestHidden> {
        self.queried_with.lock().push(timestamp);
        self.hidden
            .lock()
            .iter()
            .filter(|h| h.created_timestamp >= timestamp)
            .cloned()
            .collect()
    }
    fn unhide(&self, key: &OsmQuestKey) -> bool {
        self.unhidden.lock().push(key.clone());
        *self.unhide_result.lock()
    }
    fn add_hide_listener(&self, listener: Arc<dyn HideOsmQuestListener>) {
        self.listeners.add(listener);
    }
    fn remove_hide_listener(&self, listener: &Arc<dyn HideOsmQuestListener>) -> bool {
        self.listeners.remove(listener)
    }
}

pub struct Fakes {
    pub element_edits: Arc<FakeElementEdits>,
    pub note_edits: Arc<FakeNoteEdits>,
    pub note_quests: Arc<FakeNoteQuests>,
    pub osm_quests: Arc<FakeOsmQuests>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            element_edits: Arc::new(FakeElementEdits::default()),
            note_edits: Arc::new(FakeNoteEdits::default()),
            note_quests: Arc::new(FakeNoteQuests::default()),
            osm_quests: Arc::new(FakeOsmQuests::default()),
        }
    }

    pub fn sources(&self) -> EditSources {
        EditSources {
            element_edits: self.element_edits.clone(),
            note_edits: self.note_edits.clone(),
            note_quests: self.note_quests.clone(),
            osm_quests: self.osm_quests.clone(),
        }
    }

    pub fn seed_element_edits(&self, edits: impl IntoIterator<Item = ElementEdit>) {
        self.element_edits.edits.lock().extend(edits);
    }

    pub fn seed_note_edits(&self, edits: impl IntoIterator<Item = NoteEdit>) {
        self.note_edits.edits.lock().extend(edits);
    }

    pub fn seed_hidden_notes(&self, hidden: impl IntoIterator<Item = NoteQuestHidden>) {
        self.note_quests.hidden.lock().extend(hidden);
    }

    pub fn seed_hidden_quests(&self, hidden: impl IntoIterator<Item = OsmQuestHidden>) {
        self.osm_quests.hidden.lock().extend(hidden);
    }

    /// Total number of undo and unhide calls over all fakes.
    pub fn undo_calls(&self) -> usize {
        self.element_edits.undone.lock().len()
            + self.note_edits.undone.lock().len()
            + self.note_quests.unhidden.lock().len()
            + self.osm_quests.unhidden.lock().len()
    }

    pub fn listener_counts(&self) -> [usize; 4] {
        [
            self.element_edits.listeners.len(),
            self.note_edits.listeners.len(),
            self.note_quests.listeners.len(),
            self.osm_quests.listeners.len(),
        ]
    }
}

// ── Recording listener ─────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<HistoryEvent>>,
}

impl RecordingListener {
    pub fn take(&self) -> Vec<HistoryEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EditHistoryListener for RecordingListener {
    fn on_added(&self, edit: &Edit) {
        self.events.lock().push(HistoryEvent::Added(edit.clone()));
    }
    fn on_synced(&self, edit: &Edit) {
        self.events.lock().push(HistoryEvent::Synced(edit.clone()));
    }
    fn on_deleted(&self, edit: &Edit) {
        self.events.lock().push(HistoryEvent::Deleted(edit.clone()));
    }
    fn on_invalidated(&self) {
        self.events.lock().push(HistoryEvent::Invalidated);
    }
}
