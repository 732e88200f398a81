/// Element edits: tag changes and deletions waiting for (or done by) upload.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use quest_pad_core::{Clock, ElementEdit, ElementEditAction, ElementKey, LatLon, ListenerSet};

use crate::persistence::EditStore;
use crate::source::{ElementEditsListener, ElementEditsSource};

const ID_COUNTER: &str = "element_edits";

#[derive(Debug)]
struct State {
    edits: BTreeMap<u64, ElementEdit>,
    next_id: u64,
}

/// Owns all element edits of the user.
///
/// Writes go to disk first (if persistence is enabled), then to memory, and
/// only then are listeners notified, outside of the lock.
pub struct ElementEditsController {
    state: RwLock<State>,
    listeners: ListenerSet<dyn ElementEditsListener>,
    clock: Arc<dyn Clock>,
    persistence: Option<Arc<EditStore>>,
}

impl std::fmt::Debug for ElementEditsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ElementEditsController")
            .field("edits", &state.edits.len())
            .field("next_id", &state.next_id)
            .field("listeners", &self.listeners.len())
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl ElementEditsController {
    /// Creates an empty controller.
    ///
    /// Pass `persistence: None` for in-memory-only mode.
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

    /// Loads stored edits, or creates an empty controller without persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if the persistence layer fails to read.
    pub fn load_or_new(clock: Arc<dyn Clock>, persistence: Option<Arc<EditStore>>) -> Result<Self> {
        let controller = Self::new(clock, persistence);
        if let Some(pl) = &controller.persistence {
            let edits = pl
                .read_element_edits()
                .context("Failed to load element edits")?;
            let stored_next = pl
                .load_counter(ID_COUNTER)
                .context("Failed to load element edit counter")?
                .unwrap_or(1);

            let mut state = controller.state.write();
            state.next_id = edits
                .iter()
                .map(|e| e.id + 1)
                .max()
                .unwrap_or(1)
                .max(stored_next);
            state.edits = edits.into_iter().map(|e| (e.id, e)).collect();
            tracing::debug!("Loaded {} element edits", state.edits.len());
        }
        Ok(controller)
    }

    /// Records a new pending edit and notifies listeners.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit cannot be persisted; nothing changes then.
    pub fn add(
        &self,
        quest_type: &str,
        element: ElementKey,
        source: &str,
        position: LatLon,
        action: ElementEditAction,
    ) -> Result<ElementEdit> {
        let edit = {
            let mut state = self.state.write();
            let edit = ElementEdit {
                id: state.next_id,
                quest_type: quest_type.to_string(),
                element_type: element.element_type,
                element_id: element.id,
                source: source.to_string(),
                position,
                created_timestamp: self.clock.now_millis(),
                is_synced: false,
                action,
            };
            self.persist(|pl| {
                pl.put_element_edit(&edit)?;
                pl.save_counter(ID_COUNTER, edit.id + 1)
            })
            .context("Failed to store element edit")?;

            state.next_id = edit.id + 1;
            state.edits.insert(edit.id, edit.clone());
            edit
        };

        tracing::info!(
            "Added element edit #{} ({} on {})",
            edit.id,
            edit.quest_type,
            edit.element_key()
        );
        self.listeners.for_each(|l| l.on_added_edit(&edit));
        Ok(edit)
    }

    pub fn get(&self, id: u64) -> Option<ElementEdit> {
        self.state.read().edits.get(&id).cloned()
    }

    /// All edits, reverts included, ordered by id.
    pub fn get_all(&self) -> Vec<ElementEdit> {
        self.state.read().edits.values().cloned().collect()
    }

    /// Edits that still wait for upload, oldest first.
    pub fn get_unsynced(&self) -> Vec<ElementEdit> {
        self.state
            .read()
            .edits
            .values()
            .filter(|e| !e.is_synced)
            .cloned()
            .collect()
    }

    /// Marks an edit as uploaded. Returns false if it is unknown or already synced.
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
            self.persist(|pl| pl.put_element_edit(&synced))
                .context("Failed to store synced element edit")?;
            state.edits.insert(id, synced.clone());
            synced
        };

        tracing::debug!("Element edit #{id} synced");
        self.listeners.for_each(|l| l.on_synced_edit(&synced));
        Ok(true)
    }

    /// Removes synced edits created before `timestamp`. Returns how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion cannot be persisted. Edits deleted
    /// before the failure stay deleted and are reported to listeners.
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
                if let Err(e) = self.persist(|pl| pl.delete_element_edit(id).map(|_| ())) {
                    result = Err(e).context("Failed to delete old element edit");
                    break;
                }
                if let Some(edit) = state.edits.remove(&id) {
                    deleted.push(edit);
                }
            }
            result
        };

        if !deleted.is_empty() {
            tracing::info!("Pruned {} synced element edits", deleted.len());
        }
        for edit in &deleted {
            self.listeners.for_each(|l| l.on_deleted_edit(edit));
        }
        result.map(|_| deleted.len())
    }

    /// Undoes an edit.
    ///
    /// A pending edit is simply dropped. A synced edit is dropped from the
    /// log and replaced by a pending revert of its action. Returns false if
    /// the edit no longer exists, cannot be reverted, or storing fails.
    pub fn undo(&self, edit: &ElementEdit) -> bool {
        let mut state = self.state.write();
        let Some(current) = state.edits.get(&edit.id).cloned() else {
            tracing::debug!("Element edit #{} is gone, nothing to undo", edit.id);
            return false;
        };

        if !current.is_synced {
            if let Err(e) = self.persist(|pl| pl.delete_element_edit(current.id).map(|_| ())) {
                tracing::warn!("Failed to delete element edit #{}: {e:#}", current.id);
                return false;
            }
            state.edits.remove(&current.id);
            drop(state);

            tracing::info!("Undid pending element edit #{}", current.id);
            self.listeners.for_each(|l| l.on_deleted_edit(&current));
            return true;
        }

        let Some(reverted) = current.action.create_reverted() else {
            tracing::debug!("Element edit #{} cannot be reverted", current.id);
            return false;
        };
        let revert = ElementEdit {
            id: state.next_id,
            created_timestamp: self.clock.now_millis(),
            is_synced: false,
            action: reverted,
            ..current.clone()
        };
        let stored = self.persist(|pl| {
            pl.replace_element_edit(current.id, &revert)?;
            pl.save_counter(ID_COUNTER, revert.id + 1)
        });
        if let Err(e) = stored {
            tracing::warn!("Failed to store revert of element edit #{}: {e:#}", current.id);
            return false;
        }
        state.next_id = revert.id + 1;
        state.edits.remove(&current.id);
        state.edits.insert(revert.id, revert.clone());
        drop(state);

        tracing::info!(
            "Reverting synced element edit #{} with #{}",
            current.id,
            revert.id
        );
        self.listeners.for_each(|l| l.on_deleted_edit(&current));
        self.listeners.for_each(|l| l.on_added_edit(&revert));
        true
    }

    pub fn add_listener(&self, listener: Arc<dyn ElementEditsListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ElementEditsListener>) -> bool {
        self.listeners.remove(listener)
    }

    fn persist(&self, write: impl FnOnce(&EditStore) -> Result<()>) -> Result<()> {
        match &self.persistence {
            Some(pl) => write(pl),
            None => Ok(()),
        }
    }
}

impl ElementEditsSource for ElementEditsController {
    fn get_all(&self) -> Vec<ElementEdit> {
        ElementEditsController::get_all(self)
    }

    fn undo(&self, edit: &ElementEdit) -> bool {
        ElementEditsController::undo(self, edit)
    }

    fn add_listener(&self, listener: Arc<dyn ElementEditsListener>) {
        ElementEditsController::add_listener(self, listener);
    }

    fn remove_listener(&self, listener: &Arc<dyn ElementEditsListener>) -> bool {
        ElementEditsController::remove_listener(self, listener)
    }
}
