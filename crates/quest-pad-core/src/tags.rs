/// Tag changes produced by quest answers.
///
/// A `StringMapChangesBuilder` records changes against the element's current
/// tags; `create()` freezes them into a `StringMapChanges` that can be
/// stored with an edit, applied, or reversed for a revert.
use std::collections::BTreeMap;
use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A single change to one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringMapEntryChange {
    Add {
        key: String,
        value: String,
    },
    Modify {
        key: String,
        value_before: String,
        value: String,
    },
    Delete {
        key: String,
        value_before: String,
    },
}

impl StringMapEntryChange {
    pub fn key(&self) -> &str {
        match self {
            Self::Add { key, .. } | Self::Modify { key, .. } | Self::Delete { key, .. } => key,
        }
    }

    /// The change that undoes this one.
    pub fn reversed(&self) -> Self {
        match self {
            Self::Add { key, value } => Self::Delete {
                key: key.clone(),
                value_before: value.clone(),
            },
            Self::Modify {
                key,
                value_before,
                value,
            } => Self::Modify {
                key: key.clone(),
                value_before: value.clone(),
                value: value_before.clone(),
            },
            Self::Delete { key, value_before } => Self::Add {
                key: key.clone(),
                value: value_before.clone(),
            },
        }
    }

    /// Whether `tags` no longer look the way this change expects.
    pub fn conflicts_with(&self, tags: &BTreeMap<String, String>) -> bool {
        match self {
            Self::Add { key, value } => tags.get(key).is_some_and(|v| v != value),
            Self::Modify {
                key,
                value_before,
                value,
            } => tags
                .get(key)
                .map_or(true, |v| v != value_before && v != value),
            Self::Delete { key, value_before } => {
                tags.get(key).is_some_and(|v| v != value_before)
            }
        }
    }

    fn apply_to(&self, tags: &mut BTreeMap<String, String>) {
        match self {
            Self::Add { key, value } | Self::Modify { key, value, .. } => {
                tags.insert(key.clone(), value.clone());
            }
            Self::Delete { key, .. } => {
                tags.remove(key);
            }
        }
    }
}

impl fmt::Display for StringMapEntryChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { key, value } => write!(f, "+{key}={value}"),
            Self::Modify {
                key,
                value_before,
                value,
            } => write!(f, "~{key}={value_before}->{value}"),
            Self::Delete { key, value_before } => write!(f, "-{key}={value_before}"),
        }
    }
}

/// An ordered set of tag changes, at most one per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMapChanges {
    changes: Vec<StringMapEntryChange>,
}

impl StringMapChanges {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StringMapEntryChange> {
        self.changes.iter()
    }

    pub fn reversed(&self) -> Self {
        Self {
            changes: self.changes.iter().map(|c| c.reversed()).collect(),
        }
    }

    pub fn has_conflicts_with(&self, tags: &BTreeMap<String, String>) -> bool {
        self.changes.iter().any(|c| c.conflicts_with(tags))
    }

    /// Applies all changes, or none if any of them conflicts.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first conflicting key.
    pub fn apply_to(&self, tags: &mut BTreeMap<String, String>) -> Result<()> {
        if let Some(conflict) = self.changes.iter().find(|c| c.conflicts_with(tags)) {
            bail!("Tag change conflicts with current value of `{}`", conflict.key());
        }
        for change in &self.changes {
            change.apply_to(tags);
        }
        Ok(())
    }
}

impl fmt::Display for StringMapChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, change) in self.changes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{change}")?;
        }
        Ok(())
    }
}

/// Records tag changes relative to an element's current tags.
#[derive(Debug, Clone)]
pub struct StringMapChangesBuilder {
    source: BTreeMap<String, String>,
    changes: BTreeMap<String, StringMapEntryChange>,
}

impl StringMapChangesBuilder {
    pub fn new(source: BTreeMap<String, String>) -> Self {
        Self {
            source,
            changes: BTreeMap::new(),
        }
    }

    /// Sets `key` to `value`, as an add or a modify depending on the
    /// element's current tags. Setting a tag to its current value is a no-op.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let change = match self.source.get(&key) {
            Some(before) if *before == value => {
                self.changes.remove(&key);
                return;
            }
            Some(before) => StringMapEntryChange::Modify {
                key: key.clone(),
                value_before: before.clone(),
                value,
            },
            None => StringMapEntryChange::Add {
                key: key.clone(),
                value,
            },
        };
        self.changes.insert(key, change);
    }

    /// Removes `key`. Returns false if the element does not have it.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.source.get(key) {
            Some(before) => {
                self.changes.insert(
                    key.to_string(),
                    StringMapEntryChange::Delete {
                        key: key.to_string(),
                        value_before: before.clone(),
                    },
                );
                true
            }
            None => self.changes.remove(key).is_some(),
        }
    }

    /// Value of `key` after the changes recorded so far.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self.changes.get(key) {
            Some(StringMapEntryChange::Add { value, .. })
            | Some(StringMapEntryChange::Modify { value, .. }) => Some(value.as_str()),
            Some(StringMapEntryChange::Delete { .. }) => None,
            None => self.source.get(key).map(String::as_str),
        }
    }

    pub fn create(self) -> StringMapChanges {
        StringMapChanges {
            changes: self.changes.into_values().collect(),
        }
    }
}
