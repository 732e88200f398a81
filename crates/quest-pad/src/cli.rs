/// Command-line interface definition.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use quest_pad_core::quests::{Diet, DietType};
use quest_pad_core::{EditKey, ElementKey, LatLon, OsmQuestKey};

/// Records quest answers as map edits and lets you browse and undo them.
#[derive(Parser, Debug)]
#[command(name = "quest-pad", version, about)]
pub struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of the edit database, overrides the config.
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List all edits, newest first.
    History {
        /// Only list edits that can still be undone.
        #[arg(long)]
        undoable: bool,
    },
    /// Undo an edit, by default the most recent undoable one.
    Undo {
        /// Key as printed by `history`, e.g. `element-edit:3`.
        #[arg(long)]
        key: Option<EditKey>,
    },
    /// Answer the phone number quest for an element.
    AnswerPhone {
        /// Element as `type/id`, e.g. `node/42`.
        element: ElementKey,
        /// The phone number. Omit together with `--no-sign`.
        #[arg(required_unless_present = "no_sign", conflicts_with = "no_sign")]
        phone: Option<String>,
        /// The place shows no phone number.
        #[arg(long = "no-sign")]
        no_sign: bool,
        #[command(flatten)]
        edit: ElementEditArgs,
    },
    /// Answer a diet quest for an element.
    AnswerDiet {
        element: ElementKey,
        #[arg(value_enum)]
        diet: DietArg,
        #[arg(value_enum)]
        answer: DietAnswerArg,
        #[command(flatten)]
        edit: ElementEditArgs,
    },
    /// Delete a point of interest node.
    DeletePoi {
        element: ElementKey,
        /// Quest type the deletion was made from.
        #[arg(long, default_value = "AddPlacePhone")]
        quest: String,
        #[command(flatten)]
        edit: ElementEditArgs,
    },
    /// Comment on a note.
    CommentNote {
        #[arg(allow_negative_numbers = true)]
        note_id: i64,
        text: String,
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Hide a quest on an element, given as `type/id/QuestType`.
    HideQuest {
        key: OsmQuestKey,
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Hide the quest of a note.
    HideNote {
        #[arg(allow_negative_numbers = true)]
        note_id: i64,
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Show all hidden quests again.
    UnhideAll,
    /// Mark an element or note edit as uploaded.
    MarkSynced { key: EditKey },
    /// Delete synced edits older than the configured retention.
    Prune,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PositionArgs {
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub lat: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub lon: f64,
}

impl PositionArgs {
    pub fn to_lat_lon(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ElementEditArgs {
    /// Current tag of the element as `key=value`. Repeatable.
    #[arg(long = "tag", value_parser = parse_tag)]
    pub tags: Vec<(String, String)>,

    /// How the answer was obtained.
    #[arg(long, default_value = "survey")]
    pub source: String,

    #[command(flatten)]
    pub position: PositionArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietArg {
    Vegan,
    Vegetarian,
    Halal,
    Kosher,
}

impl From<DietArg> for Diet {
    fn from(arg: DietArg) -> Self {
        match arg {
            DietArg::Vegan => Diet::Vegan,
            DietArg::Vegetarian => Diet::Vegetarian,
            DietArg::Halal => Diet::Halal,
            DietArg::Kosher => Diet::Kosher,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietAnswerArg {
    Yes,
    No,
    Only,
}

impl From<DietAnswerArg> for DietType {
    fn from(arg: DietAnswerArg) -> Self {
        match arg {
            DietAnswerArg::Yes => DietType::Yes,
            DietAnswerArg::No => DietType::No,
            DietAnswerArg::Only => DietType::Only,
        }
    }
}

fn parse_tag(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected `key=value`, got `{s}`")),
    }
}
