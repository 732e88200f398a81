/// Wires the edit stores and the history together and runs CLI commands.
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use quest_pad_config::AppConfig;
use quest_pad_core::quests::{
    is_known_quest_type, AddDietType, AddPlacePhone, DietType, PlacePhoneAnswer,
};
use quest_pad_core::{
    update_tags_action, Clock, Edit, EditKey, ElementEditAction, ElementKey, LatLon,
    NoteEditAction, QuestType,
};
use quest_pad_edits::{
    EditStore, ElementEditsController, NoteEditsController, NoteQuestController,
    OsmQuestController,
};
use quest_pad_mod_history::{EditHistoryController, EditHistoryListener, EditSources, HistoryConfig};

use crate::cli::{Command, ElementEditArgs};

/// Reports history changes through `tracing`.
struct LoggingListener;

impl EditHistoryListener for LoggingListener {
    fn on_added(&self, edit: &Edit) {
        tracing::info!("History: added {}", edit.key());
    }

    fn on_synced(&self, edit: &Edit) {
        tracing::info!("History: synced {}", edit.key());
    }

    fn on_deleted(&self, edit: &Edit) {
        tracing::info!("History: removed {}", edit.key());
    }

    fn on_invalidated(&self) {
        tracing::info!("History: invalidated");
    }
}

pub struct App {
    config: AppConfig,
    clock: Arc<dyn Clock>,
    element_edits: Arc<ElementEditsController>,
    note_edits: Arc<NoteEditsController>,
    note_quests: Arc<NoteQuestController>,
    osm_quests: Arc<OsmQuestController>,
    history: EditHistoryController,
}

impl App {
    /// Opens the edit database in `data_dir` and loads all controllers.
    pub fn open(config: AppConfig, data_dir: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = EditStore::open(data_dir)?;

        let element_edits = Arc::new(ElementEditsController::load_or_new(
            Arc::clone(&clock),
            Some(Arc::clone(&store)),
        )?);
        let note_edits = Arc::new(NoteEditsController::load_or_new(
            Arc::clone(&clock),
            Some(Arc::clone(&store)),
        )?);
        let note_quests = Arc::new(NoteQuestController::load_or_new(
            Arc::clone(&clock),
            Some(Arc::clone(&store)),
        )?);
        let osm_quests = Arc::new(OsmQuestController::load_or_new(
            Arc::clone(&clock),
            Some(store),
        )?);

        let history = EditHistoryController::new(
            EditSources {
                element_edits: element_edits.clone(),
                note_edits: note_edits.clone(),
                note_quests: note_quests.clone(),
                osm_quests: osm_quests.clone(),
            },
            HistoryConfig::from(&config),
            Arc::clone(&clock),
        );
        history.add_listener(Arc::new(LoggingListener));

        Ok(Self {
            config,
            clock,
            element_edits,
            note_edits,
            note_quests,
            osm_quests,
            history,
        })
    }

    pub fn run(&self, command: Command, out: &mut impl Write) -> Result<()> {
        match command {
            Command::History { undoable } => self.print_history(undoable, out),
            Command::Undo { key } => self.undo(key, out),
            Command::AnswerPhone {
                element,
                phone,
                no_sign,
                edit,
            } => {
                let answer = match phone {
                    Some(phone) if !no_sign => PlacePhoneAnswer::PlacePhone(phone),
                    _ => PlacePhoneAnswer::NoPlacePhoneSign,
                };
                self.answer(&AddPlacePhone, &answer, element, edit, out)
            }
            Command::AnswerDiet {
                element,
                diet,
                answer,
                edit,
            } => {
                let quest = AddDietType::new(diet.into());
                let answer: DietType = answer.into();
                self.answer(&quest, &answer, element, edit, out)
            }
            Command::DeletePoi {
                element,
                quest,
                edit,
            } => {
                if !is_known_quest_type(&quest) {
                    bail!("Unknown quest type `{quest}`");
                }
                let added = self.element_edits.add(
                    &quest,
                    element,
                    &edit.source,
                    edit.position.to_lat_lon(),
                    ElementEditAction::DeletePoiNode,
                )?;
                writeln!(out, "Recorded {}", EditKey::ElementEdit(added.id))?;
                Ok(())
            }
            Command::CommentNote {
                note_id,
                text,
                position,
            } => {
                if text.trim().is_empty() {
                    bail!("Note comment must not be empty");
                }
                let added = self.note_edits.add(
                    note_id,
                    position.to_lat_lon(),
                    NoteEditAction::Comment,
                    &text,
                )?;
                writeln!(out, "Recorded {}", EditKey::NoteEdit(added.id))?;
                Ok(())
            }
            Command::HideQuest { key, position } => {
                if !is_known_quest_type(&key.quest_type) {
                    bail!("Unknown quest type `{}`", key.quest_type);
                }
                let hidden = self.osm_quests.hide(key, position.to_lat_lon())?;
                writeln!(out, "Hid {}", EditKey::HiddenOsmQuest(hidden.key()))?;
                Ok(())
            }
            Command::HideNote { note_id, position } => {
                self.note_quests.hide(note_id, position.to_lat_lon())?;
                writeln!(out, "Hid {}", EditKey::HiddenNoteQuest(note_id))?;
                Ok(())
            }
            Command::UnhideAll => {
                let count = self.note_quests.unhide_all()? + self.osm_quests.unhide_all()?;
                writeln!(out, "Unhid {count} quests")?;
                Ok(())
            }
            Command::MarkSynced { key } => self.mark_synced(&key, out),
            Command::Prune => self.prune(out),
        }
    }

    fn print_history(&self, undoable_only: bool, out: &mut impl Write) -> Result<()> {
        let edits: Vec<Edit> = self
            .history
            .get_all()
            .into_iter()
            .filter(|e| !undoable_only || e.is_undoable())
            .collect();
        if edits.is_empty() {
            writeln!(out, "No edits")?;
            return Ok(());
        }
        for edit in &edits {
            let marker = if edit.is_undoable() { '*' } else { ' ' };
            writeln!(
                out,
                "{marker} {}  {:<32} {edit}",
                format_timestamp(edit.created_timestamp()),
                edit.key().to_string(),
            )?;
        }
        Ok(())
    }

    fn undo(&self, key: Option<EditKey>, out: &mut impl Write) -> Result<()> {
        let edit = match key {
            Some(key) => self
                .history
                .get_all()
                .into_iter()
                .find(|e| e.key() == key)
                .with_context(|| format!("No edit {key} in the history"))?,
            None => self
                .history
                .get_most_recent_undoable()
                .context("Nothing to undo")?,
        };
        if !self.history.undo(&edit) {
            bail!("Could not undo {}", edit.key());
        }
        writeln!(out, "Undid {}: {edit}", edit.key())?;
        Ok(())
    }

    fn answer<Q: QuestType>(
        &self,
        quest: &Q,
        answer: &Q::Answer,
        element: ElementKey,
        args: ElementEditArgs,
        out: &mut impl Write,
    ) -> Result<()> {
        let tags: BTreeMap<String, String> = args.tags.into_iter().collect();
        let Some(action) = update_tags_action(quest, answer, &tags) else {
            writeln!(out, "Nothing to change on {element}")?;
            return Ok(());
        };
        let position: LatLon = args.position.to_lat_lon();
        let added = self
            .element_edits
            .add(quest.name(), element, &args.source, position, action)?;
        writeln!(
            out,
            "Recorded {}: {}",
            EditKey::ElementEdit(added.id),
            Edit::Element(added)
        )?;
        Ok(())
    }

    fn mark_synced(&self, key: &EditKey, out: &mut impl Write) -> Result<()> {
        let synced = match key {
            EditKey::ElementEdit(id) => self.element_edits.mark_synced(*id)?,
            EditKey::NoteEdit(id) => self.note_edits.mark_synced(*id)?,
            EditKey::HiddenNoteQuest(_) | EditKey::HiddenOsmQuest(_) => {
                bail!("Hidden quests are never uploaded")
            }
        };
        if synced {
            writeln!(out, "Marked {key} as synced")?;
        } else {
            writeln!(out, "{key} is unknown or already synced")?;
        }
        Ok(())
    }

    fn prune(&self, out: &mut impl Write) -> Result<()> {
        let retention_millis = i64::try_from(self.config.synced_edits_retention_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let cutoff = self.clock.now_millis().saturating_sub(retention_millis);

        let count = self.element_edits.delete_synced_older_than(cutoff)?
            + self.note_edits.delete_synced_older_than(cutoff)?;
        writeln!(out, "Pruned {count} synced edits")?;
        Ok(())
    }
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{DietAnswerArg, DietArg, PositionArgs};
    use quest_pad_core::{ElementType, ManualClock, OsmQuestKey};

    const NOW: i64 = 1_700_000_000_000;

    fn open(dir: &Path, clock: Arc<ManualClock>) -> App {
        App::open(AppConfig::default(), dir, clock).unwrap()
    }

    fn run(app: &App, command: Command) -> String {
        let mut out = Vec::new();
        app.run(command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn node(id: i64) -> ElementKey {
        ElementKey::new(ElementType::Node, id)
    }

    // ── Recording ──────────────────────────────────────────────────────

    #[test]
    fn test_answer_phone_records_element_edit() {
        let dir = tempfile::tempdir().unwrap();
        let app = open(dir.path(), Arc::new(ManualClock::new(NOW)));

        let output = run(
            &app,
            Command::AnswerPhone {
                element: node(42),
                phone: Some(" 555 0100 ".to_string()),
                no_sign: false,
                edit: ElementEditArgs::default(),
            },
        );
        assert_eq!(
            output,
            "Recorded element-edit:1: AddPlacePhone on node/42: +phone=555 0100 (pending)\n"
        );
    }

    #[test]
    fn test_answer_without_change_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let app = open(dir.path(), Arc::new(ManualClock::new(NOW)));

        let output = run(
            &app,
            Command::AnswerDiet {
                element: node(1),
                diet: DietArg::Vegan,
                answer: DietAnswerArg::Only,
                edit: ElementEditArgs {
                    tags: vec![("diet:vegan".to_string(), "only".to_string())],
                    ..Default::default()
                },
            },
        );
        assert_eq!(output, "Nothing to change on node/1\n");
        assert!(app.history.get_all().is_empty());
    }

    #[test]
    fn test_hide_quest_rejects_unknown_quest_type() {
        let dir = tempfile::tempdir().unwrap();
        let app = open(dir.path(), Arc::new(ManualClock::new(NOW)));

        let result = app.run(
            Command::HideQuest {
                key: OsmQuestKey::new(ElementType::Way, 1, "AddRoadName"),
                position: PositionArgs::default(),
            },
            &mut Vec::new(),
        );
        assert!(result.is_err());
    }

    // ── History and undo ───────────────────────────────────────────────

    #[test]
    fn test_history_lists_newest_first_with_undoable_marker() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(NOW));
        let app = open(dir.path(), clock.clone());

        run(
            &app,
            Command::CommentNote {
                note_id: 5,
                text: "shop closed".to_string(),
                position: PositionArgs::default(),
            },
        );
        clock.advance(1_000);
        run(
            &app,
            Command::HideNote {
                note_id: 6,
                position: PositionArgs::default(),
            },
        );
        run(
            &app,
            Command::MarkSynced {
                key: EditKey::NoteEdit(1),
            },
        );

        let output = run(&app, Command::History { undoable: false });
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("* "));
        assert!(lines[0].contains("hidden-note:6"));
        assert!(lines[1].starts_with("  "));
        assert!(lines[1].contains("note-edit:1"));

        let undoable = run(&app, Command::History { undoable: true });
        assert_eq!(undoable.lines().count(), 1);
    }

    #[test]
    fn test_undo_most_recent_then_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(NOW));
        let app = open(dir.path(), clock.clone());

        run(
            &app,
            Command::DeletePoi {
                element: node(7),
                quest: "AddPlacePhone".to_string(),
                edit: ElementEditArgs::default(),
            },
        );
        clock.advance(1);
        run(
            &app,
            Command::HideQuest {
                key: OsmQuestKey::new(ElementType::Node, 8, "AddHalal"),
                position: PositionArgs::default(),
            },
        );

        let output = run(&app, Command::Undo { key: None });
        assert!(output.starts_with("Undid hidden-quest:node/8/AddHalal"));

        let output = run(
            &app,
            Command::Undo {
                key: Some(EditKey::ElementEdit(1)),
            },
        );
        assert!(output.starts_with("Undid element-edit:1"));
        assert!(app.run(Command::Undo { key: None }, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(NOW));
        {
            let app = open(dir.path(), clock.clone());
            run(
                &app,
                Command::HideNote {
                    note_id: -3,
                    position: PositionArgs::default(),
                },
            );
        }
        let app = open(dir.path(), clock);
        let output = run(&app, Command::UnhideAll);
        assert_eq!(output, "Unhid 1 quests\n");
    }

    // ── Sync and prune ─────────────────────────────────────────────────

    #[test]
    fn test_mark_synced_rejects_hidden_quests() {
        let dir = tempfile::tempdir().unwrap();
        let app = open(dir.path(), Arc::new(ManualClock::new(NOW)));
        let result = app.run(
            Command::MarkSynced {
                key: EditKey::HiddenNoteQuest(1),
            },
            &mut Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_prune_deletes_old_synced_edits_only() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(NOW));
        let app = open(dir.path(), clock.clone());

        for id in 1..=2 {
            run(
                &app,
                Command::AnswerPhone {
                    element: node(id),
                    phone: None,
                    no_sign: true,
                    edit: ElementEditArgs::default(),
                },
            );
        }
        run(
            &app,
            Command::MarkSynced {
                key: EditKey::ElementEdit(1),
            },
        );
        clock.advance(8 * 24 * 60 * 60 * 1000);

        assert_eq!(run(&app, Command::Prune), "Pruned 1 synced edits\n");
        assert_eq!(app.element_edits.get_all().len(), 1);
        assert_eq!(app.element_edits.get_all()[0].element_id, 2);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }
}
