/// Disk persistence for the edit controllers, backed by redb.
///
/// Uses a single redb database file with one table per record kind, each
/// storing bincode-serialized records under a string key:
/// - `element_edits`: keyed by zero-padded edit id
/// - `note_edits`: keyed by zero-padded edit id
/// - `hidden_note_quests`: keyed by note id
/// - `hidden_osm_quests`: keyed by `"{type}/{id}/{QuestType}"`
///
/// A `counters` table keeps the next id per controller so ids are never
/// reused across sessions.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use quest_pad_core::{ElementEdit, NoteEdit, NoteQuestHidden, OsmQuestHidden, OsmQuestKey};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableHandle};
use serde::de::DeserializeOwned;
use serde::Serialize;

type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

const ELEMENT_EDITS_TABLE: RecordTable = TableDefinition::new("element_edits");
const NOTE_EDITS_TABLE: RecordTable = TableDefinition::new("note_edits");
const HIDDEN_NOTE_QUESTS_TABLE: RecordTable = TableDefinition::new("hidden_note_quests");
const HIDDEN_OSM_QUESTS_TABLE: RecordTable = TableDefinition::new("hidden_osm_quests");

/// Counter table: controller name → next id to hand out.
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Formats an edit id so that lexicographic order equals numeric order.
fn id_key(id: u64) -> String {
    format!("{id:020}")
}

fn note_key(note_id: i64) -> String {
    note_id.to_string()
}

fn quest_key(key: &OsmQuestKey) -> String {
    key.to_string()
}

/// Persistence layer for edits and hidden quests.
///
/// Thread-safe: redb supports concurrent readers and serialized writers.
/// Shared across controllers via `Arc<EditStore>`.
pub struct EditStore {
    db: Database,
}

impl std::fmt::Debug for EditStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditStore").finish()
    }
}

impl EditStore {
    /// Opens or creates `edits.redb` in the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened.
    pub fn open(data_dir: &Path) -> Result<Arc<Self>> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("edits.redb");
        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open edit database: {}", db_path.display()))?;

        // Ensure tables exist
        let write_txn = db
            .begin_write()
            .context("Failed to begin initial write transaction")?;
        {
            for table in [
                ELEMENT_EDITS_TABLE,
                NOTE_EDITS_TABLE,
                HIDDEN_NOTE_QUESTS_TABLE,
                HIDDEN_OSM_QUESTS_TABLE,
            ] {
                let _ = write_txn
                    .open_table(table)
                    .with_context(|| format!("Failed to create {} table", table.name()))?;
            }
            let _ = write_txn
                .open_table(COUNTERS_TABLE)
                .context("Failed to create counters table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial transaction")?;

        Ok(Arc::new(Self { db }))
    }

    // ── Element edits ──────────────────────────────────────────────────

    /// Inserts or overwrites an element edit.
    pub fn put_element_edit(&self, edit: &ElementEdit) -> Result<()> {
        self.put(ELEMENT_EDITS_TABLE, &id_key(edit.id), edit)
    }

    pub fn delete_element_edit(&self, id: u64) -> Result<bool> {
        self.remove(ELEMENT_EDITS_TABLE, &id_key(id))
    }

    /// Removes edit `old_id` and stores `new` in a single transaction.
    pub fn replace_element_edit(&self, old_id: u64, new: &ElementEdit) -> Result<()> {
        let bytes = bincode::serialize(new).context("Failed to serialize element edit")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(ELEMENT_EDITS_TABLE)
                .context("Failed to open element_edits table")?;
            let _ = table
                .remove(id_key(old_id).as_str())
                .context("Failed to remove replaced element edit")?;
            table
                .insert(id_key(new.id).as_str(), bytes.as_slice())
                .context("Failed to insert element edit")?;
        }
        write_txn
            .commit()
            .context("Failed to commit element edit replacement")?;
        Ok(())
    }

    /// Reads all element edits, ordered by id.
    pub fn read_element_edits(&self) -> Result<Vec<ElementEdit>> {
        self.read_all(ELEMENT_EDITS_TABLE)
    }

    // ── Note edits ─────────────────────────────────────────────────────

    pub fn put_note_edit(&self, edit: &NoteEdit) -> Result<()> {
        self.put(NOTE_EDITS_TABLE, &id_key(edit.id), edit)
    }

    pub fn delete_note_edit(&self, id: u64) -> Result<bool> {
        self.remove(NOTE_EDITS_TABLE, &id_key(id))
    }

    /// Reads all note edits, ordered by id.
    pub fn read_note_edits(&self) -> Result<Vec<NoteEdit>> {
        self.read_all(NOTE_EDITS_TABLE)
    }

    // ── Hidden quests ──────────────────────────────────────────────────

    pub fn put_hidden_note_quest(&self, hidden: &NoteQuestHidden) -> Result<()> {
        self.put(HIDDEN_NOTE_QUESTS_TABLE, &note_key(hidden.note_id), hidden)
    }

    pub fn delete_hidden_note_quest(&self, note_id: i64) -> Result<bool> {
        self.remove(HIDDEN_NOTE_QUESTS_TABLE, &note_key(note_id))
    }

    pub fn clear_hidden_note_quests(&self) -> Result<usize> {
        self.clear(HIDDEN_NOTE_QUESTS_TABLE)
    }

    pub fn read_hidden_note_quests(&self) -> Result<Vec<NoteQuestHidden>> {
        self.read_all(HIDDEN_NOTE_QUESTS_TABLE)
    }

    pub fn put_hidden_osm_quest(&self, hidden: &OsmQuestHidden) -> Result<()> {
        self.put(HIDDEN_OSM_QUESTS_TABLE, &quest_key(&hidden.key()), hidden)
    }

    pub fn delete_hidden_osm_quest(&self, key: &OsmQuestKey) -> Result<bool> {
        self.remove(HIDDEN_OSM_QUESTS_TABLE, &quest_key(key))
    }

    pub fn clear_hidden_osm_quests(&self) -> Result<usize> {
        self.clear(HIDDEN_OSM_QUESTS_TABLE)
    }

    pub fn read_hidden_osm_quests(&self) -> Result<Vec<OsmQuestHidden>> {
        self.read_all(HIDDEN_OSM_QUESTS_TABLE)
    }

    // ── Counters ───────────────────────────────────────────────────────

    /// Saves the next id a controller will hand out.
    ///
    /// # Errors
    ///
    /// Returns an error if the write transaction fails.
    pub fn save_counter(&self, name: &str, next_id: u64) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(COUNTERS_TABLE)
                .context("Failed to open counters table")?;
            table
                .insert(name, next_id)
                .context("Failed to insert counter")?;
        }
        write_txn.commit().context("Failed to commit counter")?;
        Ok(())
    }

    /// Loads a counter, or `None` if it was never saved.
    pub fn load_counter(&self, name: &str) -> Result<Option<u64>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(COUNTERS_TABLE)
            .context("Failed to open counters table")?;

        let value = table
            .get(name)
            .context("Failed to read counter")?
            .map(|guard| guard.value());
        Ok(value)
    }

    // ── Generic record access ──────────────────────────────────────────

    fn put<T: Serialize>(&self, table_def: RecordTable, key: &str, record: &T) -> Result<()> {
        let bytes = bincode::serialize(record).context("Failed to serialize record")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(table_def)
                .with_context(|| format!("Failed to open {} table", table_def.name()))?;
            table
                .insert(key, bytes.as_slice())
                .context("Failed to insert record")?;
        }
        write_txn
            .commit()
            .context("Failed to commit write transaction")?;
        Ok(())
    }

    fn remove(&self, table_def: RecordTable, key: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let removed = {
            let mut table = write_txn
                .open_table(table_def)
                .with_context(|| format!("Failed to open {} table", table_def.name()))?;
            let removed = table
                .remove(key)
                .context("Failed to remove record")?
                .is_some();
            removed
        };
        write_txn.commit().context("Failed to commit removal")?;
        Ok(removed)
    }

    fn clear(&self, table_def: RecordTable) -> Result<usize> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let removed = {
            let mut table = write_txn
                .open_table(table_def)
                .with_context(|| format!("Failed to open {} table", table_def.name()))?;

            let keys_to_remove: Vec<String> = table
                .iter()
                .context("Failed to iterate table for clearing")?
                .filter_map(|entry| entry.ok().map(|(k, _)| k.value().to_string()))
                .collect();

            for key in &keys_to_remove {
                table
                    .remove(key.as_str())
                    .context("Failed to remove entry")?;
            }
            keys_to_remove.len()
        };
        write_txn.commit().context("Failed to commit clearing")?;
        Ok(removed)
    }

    fn read_all<T: DeserializeOwned>(&self, table_def: RecordTable) -> Result<Vec<T>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(table_def)
            .with_context(|| format!("Failed to open {} table", table_def.name()))?;

        let mut records = Vec::new();
        for entry in table.iter().context("Failed to iterate table")? {
            let (_, value_guard) = entry.context("Failed to read entry")?;
            let record: T = bincode::deserialize(value_guard.value())
                .context("Failed to deserialize record")?;
            records.push(record);
        }
        Ok(records)
    }
}
