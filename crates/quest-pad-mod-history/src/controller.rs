/// The edit history: one timeline over all edit and hide controllers.
///
/// Nothing is cached. Every query asks the four controllers for their
/// current records, merges them and sorts by creation time, so a result is
/// always a fresh snapshot. The controllers are small local stores, which
/// keeps the repeated scans cheap enough.
use std::sync::Arc;

use quest_pad_core::{Clock, Edit};
use quest_pad_edits::{
    ElementEditsListener, ElementEditsSource, HideNoteQuestListener, HideOsmQuestListener,
    NoteEditsListener, NoteEditsSource, NoteQuestHiddenSource, OsmQuestHiddenSource,
};

use crate::config::HistoryConfig;
use crate::listener::{EditHistoryListener, HistoryBus};
use crate::relay::{ElementEditsRelay, NoteEditsRelay, NoteQuestHiddenRelay, OsmQuestHiddenRelay};

/// The four controllers the history reads from and undoes through.
#[derive(Clone)]
pub struct EditSources {
    pub element_edits: Arc<dyn ElementEditsSource>,
    pub note_edits: Arc<dyn NoteEditsSource>,
    pub note_quests: Arc<dyn NoteQuestHiddenSource>,
    pub osm_quests: Arc<dyn OsmQuestHiddenSource>,
}

/// All edits done by the user in one place.
///
/// Registers one relay listener with each controller on construction and
/// removes them again on drop.
pub struct EditHistoryController {
    sources: EditSources,
    config: HistoryConfig,
    clock: Arc<dyn Clock>,
    bus: Arc<HistoryBus>,
    element_relay: Arc<dyn ElementEditsListener>,
    note_relay: Arc<dyn NoteEditsListener>,
    note_quest_relay: Arc<dyn HideNoteQuestListener>,
    osm_quest_relay: Arc<dyn HideOsmQuestListener>,
}

impl std::fmt::Debug for EditHistoryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditHistoryController")
            .field("config", &self.config)
            .field("listeners", &self.bus.len())
            .finish()
    }
}

impl EditHistoryController {
    pub fn new(sources: EditSources, config: HistoryConfig, clock: Arc<dyn Clock>) -> Self {
        let bus = Arc::new(HistoryBus::default());

        let element_relay: Arc<dyn ElementEditsListener> =
            Arc::new(ElementEditsRelay::new(Arc::clone(&bus)));
        let note_relay: Arc<dyn NoteEditsListener> =
            Arc::new(NoteEditsRelay::new(Arc::clone(&bus)));
        let note_quest_relay: Arc<dyn HideNoteQuestListener> =
            Arc::new(NoteQuestHiddenRelay::new(Arc::clone(&bus)));
        let osm_quest_relay: Arc<dyn HideOsmQuestListener> =
            Arc::new(OsmQuestHiddenRelay::new(Arc::clone(&bus)));

        sources
            .element_edits
            .add_listener(Arc::clone(&element_relay));
        sources.note_edits.add_listener(Arc::clone(&note_relay));
        sources
            .note_quests
            .add_hide_listener(Arc::clone(&note_quest_relay));
        sources
            .osm_quests
            .add_hide_listener(Arc::clone(&osm_quest_relay));

        Self {
            sources,
            config,
            clock,
            bus,
            element_relay,
            note_relay,
            note_quest_relay,
            osm_quest_relay,
        }
    }

    /// All edits, newest first.
    ///
    /// Revert element edits are left out, and so are hidden quests older
    /// than the configured maximum age. Entries with equal timestamps keep
    /// the order element edits, note edits, hidden note quests, hidden map
    /// quests.
    pub fn get_all(&self) -> Vec<Edit> {
        let max_age = self
            .clock
            .now_millis()
            .saturating_sub(self.config.max_undo_history_age_millis());

        let mut result: Vec<Edit> = Vec::new();
        result.extend(
            self.sources
                .element_edits
                .get_all()
                .into_iter()
                .filter(|e| !e.action.is_revert())
                .map(Edit::Element),
        );
        result.extend(self.sources.note_edits.get_all().into_iter().map(Edit::Note));
        result.extend(
            self.sources
                .note_quests
                .get_all_hidden_newer_than(max_age)
                .into_iter()
                .map(Edit::NoteQuestHidden),
        );
        result.extend(
            self.sources
                .osm_quests
                .get_all_hidden_newer_than(max_age)
                .into_iter()
                .map(Edit::OsmQuestHidden),
        );

        result.sort_by(|a, b| b.created_timestamp().cmp(&a.created_timestamp()));
        result
    }

    /// The newest edit that can still be undone.
    pub fn get_most_recent_undoable(&self) -> Option<Edit> {
        // Undoable entries can come from any source, so this goes through
        // the full merge. The stores are small.
        self.get_all().into_iter().find(Edit::is_undoable)
    }

    /// Undoes `edit` through the controller that owns it.
    ///
    /// Returns false without touching any controller if the edit is not
    /// undoable. The history emits no event of its own: listeners hear
    /// about the undo through the owning controller's notification.
    pub fn undo(&self, edit: &Edit) -> bool {
        if !edit.is_undoable() {
            tracing::debug!("Refusing to undo {}: not undoable", edit.key());
            return false;
        }
        tracing::debug!("Undoing {}", edit.key());

        match edit {
            Edit::Element(e) => self.sources.element_edits.undo(e),
            Edit::Note(e) => self.sources.note_edits.undo(e),
            Edit::NoteQuestHidden(e) => self.sources.note_quests.unhide(e.note_id),
            Edit::OsmQuestHidden(e) => self.sources.osm_quests.unhide(&e.key()),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn EditHistoryListener>) {
        self.bus.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn EditHistoryListener>) -> bool {
        self.bus.remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }
}

impl Drop for EditHistoryController {
    fn drop(&mut self) {
        self.sources
            .element_edits
            .remove_listener(&self.element_relay);
        self.sources.note_edits.remove_listener(&self.note_relay);
        self.sources
            .note_quests
            .remove_hide_listener(&self.note_quest_relay);
        self.sources
            .osm_quests
            .remove_hide_listener(&self.osm_quest_relay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::HistoryEvent;
    use parking_lot::Mutex;
    use quest_pad_core::{
        ElementEditAction, ElementKey, ElementType, LatLon, ManualClock, NoteEditAction,
        OsmQuestKey, StringMapChangesBuilder,
    };
    use quest_pad_edits::{
        ElementEditsController, NoteEditsController, NoteQuestController, OsmQuestController,
    };

    const HOUR: i64 = 60 * 60 * 1000;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<HistoryEvent>>,
    }

    impl EditHistoryListener for Recorder {
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

    struct Fixture {
        clock: Arc<ManualClock>,
        element_edits: Arc<ElementEditsController>,
        note_edits: Arc<NoteEditsController>,
        note_quests: Arc<NoteQuestController>,
        osm_quests: Arc<OsmQuestController>,
        history: EditHistoryController,
        recorder: Arc<Recorder>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(100 * HOUR));
        let element_edits = Arc::new(ElementEditsController::new(clock.clone(), None));
        let note_edits = Arc::new(NoteEditsController::new(clock.clone(), None));
        let note_quests = Arc::new(NoteQuestController::new(clock.clone(), None));
        let osm_quests = Arc::new(OsmQuestController::new(clock.clone(), None));
        let history = EditHistoryController::new(
            EditSources {
                element_edits: element_edits.clone(),
                note_edits: note_edits.clone(),
                note_quests: note_quests.clone(),
                osm_quests: osm_quests.clone(),
            },
            HistoryConfig::default(),
            clock.clone(),
        );
        let recorder = Arc::new(Recorder::default());
        history.add_listener(recorder.clone());
        Fixture {
            clock,
            element_edits,
            note_edits,
            note_quests,
            osm_quests,
            history,
            recorder,
        }
    }

    fn add_phone_edit(f: &Fixture) -> quest_pad_core::ElementEdit {
        let mut builder = StringMapChangesBuilder::new(Default::default());
        builder.add("phone", "555");
        f.element_edits
            .add(
                "AddPlacePhone",
                ElementKey::new(ElementType::Node, 1),
                "survey",
                LatLon::default(),
                ElementEditAction::UpdateElementTags {
                    changes: builder.create(),
                },
            )
            .expect("add")
    }

    #[test]
    fn test_merges_all_sources_newest_first() {
        let f = fixture();
        add_phone_edit(&f);
        f.clock.advance(1);
        f.osm_quests
            .hide(
                OsmQuestKey::new(ElementType::Way, 2, "AddVegan"),
                LatLon::default(),
            )
            .expect("hide");
        f.clock.advance(1);
        f.note_edits
            .add(3, LatLon::default(), NoteEditAction::Comment, "hi")
            .expect("add");
        f.clock.advance(1);
        f.note_quests.hide(4, LatLon::default()).expect("hide");

        let kinds: Vec<&str> = f
            .history
            .get_all()
            .iter()
            .map(|e| match e {
                Edit::Element(_) => "element",
                Edit::Note(_) => "note",
                Edit::NoteQuestHidden(_) => "note-quest",
                Edit::OsmQuestHidden(_) => "osm-quest",
            })
            .collect();
        assert_eq!(kinds, vec!["note-quest", "note", "osm-quest", "element"]);
    }

    #[test]
    fn test_relays_controller_events() {
        let f = fixture();
        let edit = add_phone_edit(&f);
        f.element_edits.mark_synced(edit.id).expect("sync");
        f.note_quests.hide(9, LatLon::default()).expect("hide");
        f.note_quests.unhide(9);

        let events = f.recorder.events.lock();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], HistoryEvent::Added(Edit::Element(e)) if e.id == edit.id));
        assert!(matches!(&events[1], HistoryEvent::Synced(Edit::Element(e)) if e.is_synced));
        assert!(matches!(&events[2], HistoryEvent::Added(Edit::NoteQuestHidden(_))));
        assert!(matches!(&events[3], HistoryEvent::Deleted(Edit::NoteQuestHidden(_))));
    }

    #[test]
    fn test_undo_synced_element_edit_hides_revert() {
        let f = fixture();
        let edit = add_phone_edit(&f);
        f.element_edits.mark_synced(edit.id).expect("sync");
        f.recorder.events.lock().clear();

        let entry = f.history.get_most_recent_undoable().expect("undoable");
        assert!(f.history.undo(&entry));

        // The revert exists in the store but neither in the history nor
        // in the relayed events.
        assert_eq!(f.element_edits.get_all().len(), 1);
        assert!(f.history.get_all().is_empty());
        let events = f.recorder.events.lock();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], HistoryEvent::Deleted(Edit::Element(e)) if e.id == edit.id));
    }

    #[test]
    fn test_hidden_quests_age_out_of_history() {
        let f = fixture();
        f.note_quests.hide(1, LatLon::default()).expect("hide");
        add_phone_edit(&f);
        assert_eq!(f.history.get_all().len(), 2);

        f.clock.advance(13 * HOUR);
        let all = f.history.get_all();
        assert_eq!(all.len(), 1);
        assert!(matches!(all[0], Edit::Element(_)));
        // Still hidden, just no longer undoable from the history.
        assert!(f.note_quests.is_hidden(1));
    }

    #[test]
    fn test_undo_stale_hidden_entries_fails() {
        let f = fixture();
        f.note_quests.hide(1, LatLon::default()).expect("hide");
        let key = OsmQuestKey::new(ElementType::Node, 2, "AddKosher");
        f.osm_quests.hide(key.clone(), LatLon::default()).expect("hide");
        let entries = f.history.get_all();
        assert_eq!(entries.len(), 2);

        assert!(f.note_quests.unhide(1));
        assert!(f.osm_quests.unhide(&key));
        for entry in &entries {
            assert!(!f.history.undo(entry), "stale {} undone", entry.key());
        }
        assert!(!f.note_quests.is_hidden(1));
    }

    #[test]
    fn test_unhide_all_invalidates() {
        let f = fixture();
        f.osm_quests
            .hide(
                OsmQuestKey::new(ElementType::Node, 1, "AddHalal"),
                LatLon::default(),
            )
            .expect("hide");
        f.recorder.events.lock().clear();

        f.osm_quests.unhide_all().expect("unhide all");
        assert_eq!(*f.recorder.events.lock(), vec![HistoryEvent::Invalidated]);
    }

    #[test]
    fn test_drop_unregisters_relays() {
        let f = fixture();
        let Fixture {
            element_edits,
            history,
            recorder,
            ..
        } = f;
        drop(history);

        add_phone_edit_on(&element_edits);
        assert!(recorder.events.lock().is_empty());
    }

    fn add_phone_edit_on(ctrl: &ElementEditsController) {
        ctrl.add(
            "AddPlacePhone",
            ElementKey::new(ElementType::Node, 1),
            "survey",
            LatLon::default(),
            ElementEditAction::DeletePoiNode,
        )
        .expect("add");
    }
}
