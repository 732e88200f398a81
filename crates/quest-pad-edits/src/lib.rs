/// The four stores behind the edit history.
///
/// Element edits, note edits, hidden note quests and hidden map quests each
/// live in their own controller. Controllers keep their records in memory,
/// optionally write them through to an embedded redb database, and notify
/// registered listeners after every change.
pub mod element_edits;
pub mod note_edits;
pub mod note_quests;
pub mod osm_quests;
pub mod persistence;
pub mod source;

pub use element_edits::ElementEditsController;
pub use note_edits::NoteEditsController;
pub use note_quests::NoteQuestController;
pub use osm_quests::OsmQuestController;
pub use persistence::EditStore;
pub use source::{
    ElementEditsListener, ElementEditsSource, HideNoteQuestListener, HideOsmQuestListener,
    NoteEditsListener, NoteEditsSource, NoteQuestHiddenSource, OsmQuestHiddenSource,
};
