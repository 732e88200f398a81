/// Note edits: new notes and comments on existing notes.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use quest_pad_core::{Clock, LatLon, ListenerSet, NoteEdit, NoteEditAction};

use crate::persistence::EditStore;
use crate::source::{NoteEditsListener, NoteEditsSource};

const ID_COUNTER: &str = "note_edits";

#[derive(Debug)]
struct State {
    edits: BTreeMap<u64, NoteEdit>,
    next_id: u64,
}

/// Owns all note edits of the user. Only pending note edits can be undone.
pub struct NoteEditsController {
    state: RwLock<State>,
    listeners: ListenerSet<dyn NoteEditsListener>,
    clock: Arc<dyn Clock>,
    persistence: Option<Arc<EditStore>>,
}

impl std::fmt::Debug for NoteEditsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("NoteEditsController")
            .field("edits", &state.edits.len())
            .field("next_id", &state.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NoteEditsController {
    pub fn new(clock: Arc<dyn Clock>, persistence: Option<Arc<EditStore>>) -> Self {
        Self {
            state: RwLock::new(State {
                edits: BTreeMap::new(),
                next_id: 1,
            }),
            listeners: ListenerSet::new(),
            clock,
            persistence,
        }
    }

    /// Loads stored note edits, or creates an empty controller without persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistence layer fails to read.
    pub fn load_or_new(clock: Arc<dyn Clock>, persistence: Option<Arc<EditStore>>) -> Result<Self> {
        let controller = Self::new(clock, persistence);
        if let Some(pl) = &controller.persistence {
            let edits = pl.read_note_edits().context("Failed to load note edits")?;
            let stored_next = pl
                .load_counter(ID_COUNTER)
                .context("Failed to load note edit counter")?
                .unwrap_or(1);

            let mut state = controller.state.write();
            state.next_id = edits
                .iter()
                .map(|e| e.id + 1)
                .max()
                .unwrap_or(1)
                .max(stored_next);
            state.edits = edits.into_iter().map(|e| (e.id, e)).collect();
            tracing::debug!("Loaded {} note edits", state.edits.len());
        }
        Ok(controller)
    }

    /// Records a new pending note edit and notifies listeners.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit cannot be persisted; nothing changes then.
    pub fn add(
        &self,
        note_id: i64,
        position: LatLon,
        action: NoteEditAction,
        text: &str,
    ) -> Result<NoteEdit> {
        let edit = {
            let mut state = self.state.write();
            let edit = NoteEdit {
                id: state.next_id,
                note_id,
                position,
                action,
                text: text.to_string(),
                created_timestamp: self.clock.now_millis(),
                is_synced: false,
            };
            self.persist(|pl| {
                pl.put_note_edit(&edit)?;
                pl.save_counter(ID_COUNTER, edit.id + 1)
            })
            .context("Failed to store note edit")?;

            state.next_id = edit.id + 1;
            state.edits.insert(edit.id, edit.clone());
            edit
        };

        tracing::info!("Added note edit #{} on note #{}", edit.id, edit.note_id);
        self.listeners.for_each(|l| l.on_added_edit(&edit));
        Ok(edit)
    }

    pub fn get(&self, id: u64) -> Option<NoteEdit> {
        self.state.read().edits.get(&id).cloned()
    }

    /// All note edits, ordered by id.
    pub fn get_all(&self) -> Vec<NoteEdit> {
        self.state.read().edits.values().cloned().collect()
    }

    /// Marks a note edit as uploaded. Returns false if it is unknown or already synced.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    pub fn mark_synced(&self, id: u64) -> Result<bool> {
        let synced = {
            let mut state = self.state.write();
            let Some(edit) = state.edits.get(&id).filter(|e| !e.is_synced) else {
                return Ok(false);
            };
            let mut synced = edit.clone();
            synced.is_synced = true;
            self.persist(|pl| pl.put_note_edit(&synced))
                .context("Failed to store synced note edit")?;
            state.edits.insert(id, synced.clone());
            synced
        };

        tracing::debug!("Note edit #{id} synced");
        self.listeners.for_each(|l| l.on_synced_edit(&synced));
        Ok(true)
    }

    /// Removes synced note edits created before `timestamp`. Returns how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion cannot be persisted.
    pub fn delete_synced_older_than(&self, timestamp: i64) -> Result<usize> {
        let mut deleted = Vec::new();
        let result = {
            let mut state = self.state.write();
            let ids: Vec<u64> = state
                .edits
                .values()
                .filter(|e| e.is_synced && e.created_timestamp < timestamp)
                .map(|e| e.id)
                .collect();

            let mut result: Result<()> = Ok(());
            for id in ids {
                if let Err(e) = self.persist(|pl| pl.delete_note_edit(id).map(|_| ())) {
                    result = Err(e).context("Failed to delete old note edit");
                    break;
                }
                if let Some(edit) = state.edits.remove(&id) {
                    deleted.push(edit);
                }
            }
            result
        };

        if !deleted.is_empty() {
            tracing::info!("Pruned {} synced note edits", deleted.len());
        }
        for edit in &deleted {
            self.listeners.for_each(|l| l.on_deleted_edit(edit));
        }
        result.map(|_| deleted.len())
    }

    /// Drops a pending note edit. Returns false if it is gone, already
    /// uploaded, or storing fails.
    pub fn undo(&self, edit: &NoteEdit) -> bool {
        let removed = {
            let mut state = self.state.write();
            match state.edits.get(&edit.id) {
                None => {
                    tracing::debug!("Note edit #{} is gone, nothing to undo", edit.id);
                    return false;
                }
                Some(current) if current.is_synced => {
                    tracing::debug!("Note edit #{} is already uploaded", edit.id);
                    return false;
                }
                Some(_) => {}
            }
            if let Err(e) = self.persist(|pl| pl.delete_note_edit(edit.id).map(|_| ())) {
                tracing::warn!("Failed to delete note edit #{}: {e:#}", edit.id);
                return false;
            }
            state.edits.remove(&edit.id)
        };

        let Some(removed) = removed else {
            return false;
        };
        tracing::info!("Undid note edit #{}", removed.id);
        self.listeners.for_each(|l| l.on_deleted_edit(&removed));
        true
    }

    pub fn add_listener(&self, listener: Arc<dyn NoteEditsListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn NoteEditsListener>) -> bool {
        self.listeners.remove(listener)
    }

    fn persist(&self, write: impl FnOnce(&EditStore) -> Result<()>) -> Result<()> {
        match &self.persistence {
            Some(pl) => write(pl),
            None => Ok(()),
        }
    }
}

impl NoteEditsSource for NoteEditsController {
    fn get_all(&self) -> Vec<NoteEdit> {
        NoteEditsController::get_all(self)
    }

    fn undo(&self, edit: &NoteEdit) -> bool {
        NoteEditsController::undo(self, edit)
    }

    fn add_listener(&self, listener: Arc<dyn NoteEditsListener>) {
        NoteEditsController::add_listener(self, listener);
    }

    fn remove_listener(&self, listener: &Arc<dyn NoteEditsListener>) -> bool {
        NoteEditsController::remove_listener(self, listener)
    }
}
