/// The contract between a quest's answer form and the edit it produces.
use std::collections::BTreeMap;

use crate::edit::ElementEditAction;
use crate::tags::StringMapChangesBuilder;

/// A kind of question asked about map elements.
///
/// The answer form is an opaque producer of `Answer` values; the quest type
/// only knows how to turn an answer into tag changes.
pub trait QuestType: Send + Sync {
    type Answer;

    /// Stable identifier stored with edits and hidden quests.
    ///
    /// Must not change between releases, otherwise hidden quests can no
    /// longer be matched and un-hidden.
    fn name(&self) -> &'static str;

    /// Commit message used when uploading edits of this quest type.
    fn commit_message(&self) -> &'static str;

    fn wiki_link(&self) -> Option<&'static str> {
        None
    }

    fn apply_answer_to(&self, answer: &Self::Answer, changes: &mut StringMapChangesBuilder);
}

/// Builds the tag update an answer produces for an element with `tags`.
///
/// Returns `None` when the answer would not change anything.
pub fn update_tags_action<Q>(
    quest: &Q,
    answer: &Q::Answer,
    tags: &BTreeMap<String, String>,
) -> Option<ElementEditAction>
where
    Q: QuestType + ?Sized,
{
    let mut builder = StringMapChangesBuilder::new(tags.clone());
    quest.apply_answer_to(answer, &mut builder);
    let changes = builder.create();
    if changes.is_empty() {
        None
    } else {
        Some(ElementEditAction::UpdateElementTags { changes })
    }
}
