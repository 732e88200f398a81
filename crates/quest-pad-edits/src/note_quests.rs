/// Hidden note quests.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use quest_pad_core::{Clock, LatLon, ListenerSet, NoteQuestHidden};

use crate::persistence::EditStore;
use crate::source::{HideNoteQuestListener, NoteQuestHiddenSource};

/// Tracks which note quests the user chose not to see.
pub struct NoteQuestController {
    hidden: RwLock<BTreeMap<i64, NoteQuestHidden>>,
    listeners: ListenerSet<dyn HideNoteQuestListener>,
    clock: Arc<dyn Clock>,
    persistence: Option<Arc<EditStore>>,
}

impl std::fmt::Debug for NoteQuestController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteQuestController")
            .field("hidden", &self.hidden.read().len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NoteQuestController {
    pub fn new(clock: Arc<dyn Clock>, persistence: Option<Arc<EditStore>>) -> Self {
        Self {
            hidden: RwLock::new(BTreeMap::new()),
            listeners: ListenerSet::new(),
            clock,
            persistence,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the persistence layer fails to read.
    pub fn load_or_new(clock: Arc<dyn Clock>, persistence: Option<Arc<EditStore>>) -> Result<Self> {
        let controller = Self::new(clock, persistence);
        if let Some(pl) = &controller.persistence {
            let stored = pl
                .read_hidden_note_quests()
                .context("Failed to load hidden note quests")?;
            *controller.hidden.write() = stored.into_iter().map(|h| (h.note_id, h)).collect();
        }
        Ok(controller)
    }

    /// Hides the quest for `note_id`. Hiding an already hidden quest
    /// returns the existing record and notifies nobody.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    pub fn hide(&self, note_id: i64, position: LatLon) -> Result<NoteQuestHidden> {
        let hidden = {
            let mut map = self.hidden.write();
            if let Some(existing) = map.get(&note_id) {
                return Ok(existing.clone());
            }
            let hidden = NoteQuestHidden {
                note_id,
                position,
                created_timestamp: self.clock.now_millis(),
            };
            if let Some(pl) = &self.persistence {
                pl.put_hidden_note_quest(&hidden)
                    .context("Failed to store hidden note quest")?;
            }
            map.insert(note_id, hidden.clone());
            hidden
        };

        tracing::info!("Hid quest for note #{note_id}");
        self.listeners.for_each(|l| l.on_hid(&hidden));
        Ok(hidden)
    }

    /// Shows the quest for `note_id` again. Returns false if it was not
    /// hidden or storing fails.
    pub fn unhide(&self, note_id: i64) -> bool {
        let removed = {
            let mut map = self.hidden.write();
            if !map.contains_key(&note_id) {
                return false;
            }
            if let Some(pl) = &self.persistence {
                if let Err(e) = pl.delete_hidden_note_quest(note_id) {
                    tracing::warn!("Failed to unhide quest for note #{note_id}: {e:#}");
                    return false;
                }
            }
            map.remove(&note_id)
        };

        let Some(removed) = removed else {
            return false;
        };
        tracing::info!("Unhid quest for note #{note_id}");
        self.listeners.for_each(|l| l.on_unhid(&removed));
        true
    }

    /// Shows every hidden note quest again. Returns how many were hidden.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be deleted from disk.
    pub fn unhide_all(&self) -> Result<usize> {
        let count = {
            let mut map = self.hidden.write();
            if let Some(pl) = &self.persistence {
                pl.clear_hidden_note_quests()
                    .context("Failed to clear hidden note quests")?;
            }
            let count = map.len();
            map.clear();
            count
        };

        tracing::info!("Unhid {count} note quests");
        self.listeners.for_each(|l| l.on_unhid_all());
        Ok(count)
    }

    pub fn is_hidden(&self, note_id: i64) -> bool {
        self.hidden.read().contains_key(&note_id)
    }

    /// All hidden note quests, oldest first.
    pub fn get_all_hidden(&self) -> Vec<NoteQuestHidden> {
        self.get_all_hidden_newer_than(i64::MIN)
    }

    /// Hidden note quests with `created_timestamp >= timestamp`, oldest first.
    pub fn get_all_hidden_newer_than(&self, timestamp: i64) -> Vec<NoteQuestHidden> {
        let mut result: Vec<NoteQuestHidden> = self
            .hidden
            .read()
            .values()
            .filter(|h| h.created_timestamp >= timestamp)
            .cloned()
            .collect();
        result.sort_by_key(|h| h.created_timestamp);
        result
    }

    pub fn add_hide_listener(&self, listener: Arc<dyn HideNoteQuestListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_hide_listener(&self, listener: &Arc<dyn HideNoteQuestListener>) -> bool {
        self.listeners.remove(listener)
    }
}

impl NoteQuestHiddenSource for NoteQuestController {
    fn get_all_hidden_newer_than(&self, timestamp: i64) -> Vec<NoteQuestHidden> {
        NoteQuestController::get_all_hidden_newer_than(self, timestamp)
    }

    fn unhide(&self, note_id: i64) -> bool {
        NoteQuestController::unhide(self, note_id)
    }

    fn add_hide_listener(&self, listener: Arc<dyn HideNoteQuestListener>) {
        NoteQuestController::add_hide_listener(self, listener);
    }

    fn remove_hide_listener(&self, listener: &Arc<dyn HideNoteQuestListener>) -> bool {
        NoteQuestController::remove_hide_listener(self, listener)
    }
}
