/// Shared data model for quest-pad.
///
/// Map element identities, tag changes, quest types and their answers, and
/// the `Edit` record shown in the edit history. Also carries the clock and
/// listener plumbing that the edit controllers are built on.
pub mod clock;
pub mod edit;
pub mod element;
pub mod listeners;
pub mod quest;
pub mod quests;
pub mod tags;

pub use clock::{Clock, ManualClock, SystemClock};
pub use edit::{
    Edit, EditKey, ElementEdit, ElementEditAction, NoteEdit, NoteEditAction, NoteQuestHidden,
    OsmQuestHidden, OsmQuestKey,
};
pub use element::{ElementKey, ElementType, LatLon};
pub use listeners::ListenerSet;
pub use quest::{update_tags_action, QuestType};
pub use tags::{StringMapChanges, StringMapChangesBuilder, StringMapEntryChange};
