/// Everything that shows up in the edit history.
///
/// Four sources feed the history: element edits, note edits and the two
/// kinds of hidden-quest records. `Edit` is the closed union over them.
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::element::{ElementKey, ElementType, LatLon};
use crate::tags::StringMapChanges;

// ── Element edits ──────────────────────────────────────────────────────

/// What an element edit does to the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementEditAction {
    UpdateElementTags { changes: StringMapChanges },
    /// Undoes an already uploaded `UpdateElementTags`.
    RevertUpdateElementTags { changes: StringMapChanges },
    DeletePoiNode,
    /// Undoes an already uploaded `DeletePoiNode`.
    RevertDeletePoiNode,
}

impl ElementEditAction {
    /// Reverts are bookkeeping for undoing synced edits and never appear
    /// in the history themselves.
    pub fn is_revert(&self) -> bool {
        matches!(
            self,
            Self::RevertUpdateElementTags { .. } | Self::RevertDeletePoiNode
        )
    }

    /// The action that undoes this one once it has been uploaded.
    pub fn create_reverted(&self) -> Option<Self> {
        match self {
            Self::UpdateElementTags { changes } => Some(Self::RevertUpdateElementTags {
                changes: changes.reversed(),
            }),
            Self::DeletePoiNode => Some(Self::RevertDeletePoiNode),
            Self::RevertUpdateElementTags { .. } | Self::RevertDeletePoiNode => None,
        }
    }
}

impl fmt::Display for ElementEditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateElementTags { changes } => write!(f, "{changes}"),
            Self::RevertUpdateElementTags { changes } => write!(f, "revert {changes}"),
            Self::DeletePoiNode => f.write_str("delete"),
            Self::RevertDeletePoiNode => f.write_str("revert delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementEdit {
    /// Assigned by the element edits controller.
    pub id: u64,
    /// Stable name of the quest type that produced the edit.
    pub quest_type: String,
    pub element_type: ElementType,
    pub element_id: i64,
    /// How the user obtained the information, e.g. "survey".
    pub source: String,
    pub position: LatLon,
    /// Milliseconds since the Unix epoch.
    pub created_timestamp: i64,
    pub is_synced: bool,
    pub action: ElementEditAction,
}

impl ElementEdit {
    pub fn element_key(&self) -> ElementKey {
        ElementKey::new(self.element_type, self.element_id)
    }

    /// Pending edits can be dropped; synced ones only if they can be reverted.
    pub fn is_undoable(&self) -> bool {
        !self.is_synced || self.action.create_reverted().is_some()
    }
}

// ── Note edits ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteEditAction {
    Create,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEdit {
    pub id: u64,
    /// Negative for notes created locally and not uploaded yet.
    pub note_id: i64,
    pub position: LatLon,
    pub action: NoteEditAction,
    pub text: String,
    pub created_timestamp: i64,
    pub is_synced: bool,
}

impl NoteEdit {
    /// A note comment cannot be taken back once it is online.
    pub fn is_undoable(&self) -> bool {
        !self.is_synced
    }
}

// ── Hidden quests ──────────────────────────────────────────────────────

/// The note quest for `note_id` was hidden by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteQuestHidden {
    pub note_id: i64,
    pub position: LatLon,
    pub created_timestamp: i64,
}

/// Identifies one quest on one map element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OsmQuestKey {
    pub element_type: ElementType,
    pub element_id: i64,
    /// `QuestType::name()` of the quest.
    pub quest_type: String,
}

impl OsmQuestKey {
    pub fn new(element_type: ElementType, element_id: i64, quest_type: impl Into<String>) -> Self {
        Self {
            element_type,
            element_id,
            quest_type: quest_type.into(),
        }
    }
}

impl fmt::Display for OsmQuestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.element_type, self.element_id, self.quest_type
        )
    }
}

impl FromStr for OsmQuestKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (element, quest_type) = s
            .rsplit_once('/')
            .ok_or_else(|| anyhow!("Expected `type/id/QuestType`, got `{s}`"))?;
        let element: ElementKey = element.parse()?;
        if quest_type.is_empty() {
            anyhow::bail!("Missing quest type in `{s}`");
        }
        Ok(Self::new(element.element_type, element.id, quest_type))
    }
}

/// The quest `quest_type` on an element was hidden by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmQuestHidden {
    pub element_type: ElementType,
    pub element_id: i64,
    pub quest_type: String,
    pub position: LatLon,
    pub created_timestamp: i64,
}

impl OsmQuestHidden {
    pub fn key(&self) -> OsmQuestKey {
        OsmQuestKey::new(self.element_type, self.element_id, self.quest_type.clone())
    }
}

// ── Edit ───────────────────────────────────────────────────────────────

/// One entry of the edit history.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Element(ElementEdit),
    Note(NoteEdit),
    NoteQuestHidden(NoteQuestHidden),
    OsmQuestHidden(OsmQuestHidden),
}

impl Edit {
    pub fn created_timestamp(&self) -> i64 {
        match self {
            Edit::Element(e) => e.created_timestamp,
            Edit::Note(e) => e.created_timestamp,
            Edit::NoteQuestHidden(e) => e.created_timestamp,
            Edit::OsmQuestHidden(e) => e.created_timestamp,
        }
    }

    pub fn is_undoable(&self) -> bool {
        match self {
            Edit::Element(e) => e.is_undoable(),
            Edit::Note(e) => e.is_undoable(),
            Edit::NoteQuestHidden(_) | Edit::OsmQuestHidden(_) => true,
        }
    }

    pub fn position(&self) -> LatLon {
        match self {
            Edit::Element(e) => e.position,
            Edit::Note(e) => e.position,
            Edit::NoteQuestHidden(e) => e.position,
            Edit::OsmQuestHidden(e) => e.position,
        }
    }

    pub fn key(&self) -> EditKey {
        match self {
            Edit::Element(e) => EditKey::ElementEdit(e.id),
            Edit::Note(e) => EditKey::NoteEdit(e.id),
            Edit::NoteQuestHidden(e) => EditKey::HiddenNoteQuest(e.note_id),
            Edit::OsmQuestHidden(e) => EditKey::HiddenOsmQuest(e.key()),
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::Element(e) => {
                write!(f, "{} on {}: {}", e.quest_type, e.element_key(), e.action)?;
                if !e.is_synced {
                    f.write_str(" (pending)")?;
                }
                Ok(())
            }
            Edit::Note(e) => {
                let verb = match e.action {
                    NoteEditAction::Create => "created",
                    NoteEditAction::Comment => "commented on",
                };
                write!(f, "{verb} note #{}: \"{}\"", e.note_id, e.text)?;
                if !e.is_synced {
                    f.write_str(" (pending)")?;
                }
                Ok(())
            }
            Edit::NoteQuestHidden(e) => write!(f, "hid quest for note #{}", e.note_id),
            Edit::OsmQuestHidden(e) => write!(
                f,
                "hid {} on {}",
                e.quest_type,
                ElementKey::new(e.element_type, e.element_id)
            ),
        }
    }
}

/// Identity of an `Edit` within its source, as used on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditKey {
    ElementEdit(u64),
    NoteEdit(u64),
    HiddenNoteQuest(i64),
    HiddenOsmQuest(OsmQuestKey),
}

impl fmt::Display for EditKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditKey::ElementEdit(id) => write!(f, "element-edit:{id}"),
            EditKey::NoteEdit(id) => write!(f, "note-edit:{id}"),
            EditKey::HiddenNoteQuest(note_id) => write!(f, "hidden-note:{note_id}"),
            EditKey::HiddenOsmQuest(key) => write!(f, "hidden-quest:{key}"),
        }
    }
}

impl FromStr for EditKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("Expected `kind:id`, got `{s}`"))?;
        let key = match kind {
            "element-edit" => EditKey::ElementEdit(
                rest.parse()
                    .with_context(|| format!("Invalid element edit id in `{s}`"))?,
            ),
            "note-edit" => EditKey::NoteEdit(
                rest.parse()
                    .with_context(|| format!("Invalid note edit id in `{s}`"))?,
            ),
            "hidden-note" => EditKey::HiddenNoteQuest(
                rest.parse()
                    .with_context(|| format!("Invalid note id in `{s}`"))?,
            ),
            "hidden-quest" => EditKey::HiddenOsmQuest(rest.parse()?),
            other => anyhow::bail!("Unknown edit kind: {other}"),
        };
        Ok(key)
    }
}
