/// What the edit history needs from each controller.
///
/// Every controller offers a query, the one mutation used to undo an entry,
/// and a listener registration. Listeners are called synchronously on the
/// thread that made the change, after the controller released its locks.
use std::sync::Arc;

use quest_pad_core::{ElementEdit, NoteEdit, NoteQuestHidden, OsmQuestHidden, OsmQuestKey};

pub trait ElementEditsListener: Send + Sync {
    fn on_added_edit(&self, edit: &ElementEdit);
    fn on_synced_edit(&self, edit: &ElementEdit);
    fn on_deleted_edit(&self, edit: &ElementEdit);
}

pub trait NoteEditsListener: Send + Sync {
    fn on_added_edit(&self, edit: &NoteEdit);
    fn on_synced_edit(&self, edit: &NoteEdit);
    fn on_deleted_edit(&self, edit: &NoteEdit);
}

pub trait HideNoteQuestListener: Send + Sync {
    fn on_hid(&self, edit: &NoteQuestHidden);
    fn on_unhid(&self, edit: &NoteQuestHidden);
    fn on_unhid_all(&self);
}

pub trait HideOsmQuestListener: Send + Sync {
    fn on_hid(&self, edit: &OsmQuestHidden);
    fn on_unhid(&self, edit: &OsmQuestHidden);
    fn on_unhid_all(&self);
}

pub trait ElementEditsSource: Send + Sync {
    /// All stored element edits, reverts included, oldest first.
    fn get_all(&self) -> Vec<ElementEdit>;
    /// Returns whether the edit was undone.
    fn undo(&self, edit: &ElementEdit) -> bool;
    fn add_listener(&self, listener: Arc<dyn ElementEditsListener>);
    fn remove_listener(&self, listener: &Arc<dyn ElementEditsListener>) -> bool;
}

pub trait NoteEditsSource: Send + Sync {
    fn get_all(&self) -> Vec<NoteEdit>;
    fn undo(&self, edit: &NoteEdit) -> bool;
    fn add_listener(&self, listener: Arc<dyn NoteEditsListener>);
    fn remove_listener(&self, listener: &Arc<dyn NoteEditsListener>) -> bool;
}

pub trait NoteQuestHiddenSource: Send + Sync {
    /// Hidden note quests with `created_timestamp >= timestamp`.
    fn get_all_hidden_newer_than(&self, timestamp: i64) -> Vec<NoteQuestHidden>;
    /// Returns whether the quest was hidden before.
    fn unhide(&self, note_id: i64) -> bool;
    fn add_hide_listener(&self, listener: Arc<dyn HideNoteQuestListener>);
    fn remove_hide_listener(&self, listener: &Arc<dyn HideNoteQuestListener>) -> bool;
}

pub trait OsmQuestHiddenSource: Send + Sync {
    /// Hidden map quests with `created_timestamp >= timestamp`.
    fn get_all_hidden_newer_than(&self, timestamp: i64) -> Vec<OsmQuestHidden>;
    /// Returns whether the quest was hidden before.
    fn unhide(&self, key: &OsmQuestKey) -> bool;
    fn add_hide_listener(&self, listener: Arc<dyn HideOsmQuestListener>);
    fn remove_hide_listener(&self, listener: &Arc<dyn HideOsmQuestListener>) -> bool;
}
