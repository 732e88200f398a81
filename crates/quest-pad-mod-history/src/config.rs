/// Configuration for the edit history.
use std::time::Duration;

use quest_pad_config::AppConfig;

/// Hidden quests older than this are left out of the history.
pub const DEFAULT_MAX_UNDO_HISTORY_AGE: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Cut-off for hidden-quest records. Element and note edits are pruned
    /// by their own controllers and are not filtered by age here.
    pub max_undo_history_age: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_history_age: DEFAULT_MAX_UNDO_HISTORY_AGE,
        }
    }
}

impl HistoryConfig {
    pub fn max_undo_history_age_millis(&self) -> i64 {
        i64::try_from(self.max_undo_history_age.as_millis()).unwrap_or(i64::MAX)
    }
}

impl From<&AppConfig> for HistoryConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_undo_history_age: Duration::from_secs(config.max_undo_history_age_secs),
        }
    }
}
