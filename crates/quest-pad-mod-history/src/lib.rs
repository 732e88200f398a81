/// Unified, undoable edit history.
///
/// Provides an `EditHistoryController` that merges element edits, note edits
/// and hidden quests from their controllers into one timeline, newest first.
/// Undo is dispatched back to whichever controller owns the entry, and the
/// controllers' change notifications are relayed to history listeners as a
/// single stream.
pub mod config;
pub mod controller;
pub mod listener;
mod relay;

pub use config::HistoryConfig;
pub use controller::{EditHistoryController, EditSources};
pub use listener::{EditHistoryListener, HistoryEvent};
