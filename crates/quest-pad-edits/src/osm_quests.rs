/// Hidden map quests, keyed by element and quest type.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use quest_pad_core::{Clock, LatLon, ListenerSet, OsmQuestHidden, OsmQuestKey};

use crate::persistence::EditStore;
use crate::source::{HideOsmQuestListener, OsmQuestHiddenSource};

/// Tracks which map quests the user chose not to see.
pub struct OsmQuestController {
    hidden: RwLock<BTreeMap<OsmQuestKey, OsmQuestHidden>>,
    listeners: ListenerSet<dyn HideOsmQuestListener>,
    clock: Arc<dyn Clock>,
    persistence: Option<Arc<EditStore>>,
}

impl std::fmt::Debug for OsmQuestController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsmQuestController")
            .field("hidden", &self.hidden.read().len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl OsmQuestController {
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
                .read_hidden_osm_quests()
                .context("Failed to load hidden quests")?;
            *controller.hidden.write() = stored.into_iter().map(|h| (h.key(), h)).collect();
        }
        Ok(controller)
    }

    /// Hides the quest `key`. Hiding an already hidden quest returns the
    /// existing record and notifies nobody.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    pub fn hide(&self, key: OsmQuestKey, position: LatLon) -> Result<OsmQuestHidden> {
        let hidden = {
            let mut map = self.hidden.write();
            if let Some(existing) = map.get(&key) {
                return Ok(existing.clone());
            }
            let hidden = OsmQuestHidden {
                element_type: key.element_type,
                element_id: key.element_id,
                quest_type: key.quest_type.clone(),
                position,
                created_timestamp: self.clock.now_millis(),
            };
            if let Some(pl) = &self.persistence {
                pl.put_hidden_osm_quest(&hidden)
                    .context("Failed to store hidden quest")?;
            }
            map.insert(key, hidden.clone());
            hidden
        };

        tracing::info!("Hid quest {}", hidden.key());
        self.listeners.for_each(|l| l.on_hid(&hidden));
        Ok(hidden)
    }

    /// Shows the quest again. Returns false if it was not hidden or
    /// storing fails.
    pub fn unhide(&self, key: &OsmQuestKey) -> bool {
        let removed = {
            let mut map = self.hidden.write();
            if !map.contains_key(key) {
                return false;
            }
            if let Some(pl) = &self.persistence {
                if let Err(e) = pl.delete_hidden_osm_quest(key) {
                    tracing::warn!("Failed to unhide quest {key}: {e:#}");
                    return false;
                }
            }
            map.remove(key)
        };

        let Some(removed) = removed else {
            return false;
        };
        tracing::info!("Unhid quest {key}");
        self.listeners.for_each(|l| l.on_unhid(&removed));
        true
    }

    /// Shows every hidden quest again. Returns how many were hidden.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be deleted from disk.
    pub fn unhide_all(&self) -> Result<usize> {
        let count = {
            let mut map = self.hidden.write();
            if let Some(pl) = &self.persistence {
                pl.clear_hidden_osm_quests()
                    .context("Failed to clear hidden quests")?;
            }
            let count = map.len();
            map.clear();
            count
        };

        tracing::info!("Unhid {count} quests");
        self.listeners.for_each(|l| l.on_unhid_all());
        Ok(count)
    }

    pub fn is_hidden(&self, key: &OsmQuestKey) -> bool {
        self.hidden.read().contains_key(key)
    }

    /// All hidden quests, oldest first.
    pub fn get_all_hidden(&self) -> Vec<OsmQuestHidden> {
        self.get_all_hidden_newer_than(i64::MIN)
    }

    /// Hidden quests with `created_timestamp >= timestamp`, oldest first.
    pub fn get_all_hidden_newer_than(&self, timestamp: i64) -> Vec<OsmQuestHidden> {
        let mut result: Vec<OsmQuestHidden> = self
            .hidden
            .read()
            .values()
            .filter(|h| h.created_timestamp >= timestamp)
            .cloned()
            .collect();
        result.sort_by_key(|h| h.created_timestamp);
        result
    }

    pub fn add_hide_listener(&self, listener: Arc<dyn HideOsmQuestListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_hide_listener(&self, listener: &Arc<dyn HideOsmQuestListener>) -> bool {
        self.listeners.remove(listener)
    }
}

impl OsmQuestHiddenSource for OsmQuestController {
    fn get_all_hidden_newer_than(&self, timestamp: i64) -> Vec<OsmQuestHidden> {
        OsmQuestController::get_all_hidden_newer_than(self, timestamp)
    }

    fn unhide(&self, key: &OsmQuestKey) -> bool {
        OsmQuestController::unhide(self, key)
    }

    fn add_hide_listener(&self, listener: Arc<dyn HideOsmQuestListener>) {
        OsmQuestController::add_hide_listener(self, listener);
    }

    fn remove_hide_listener(&self, listener: &Arc<dyn HideOsmQuestListener>) -> bool {
        OsmQuestController::remove_hide_listener(self, listener)
    }
}
