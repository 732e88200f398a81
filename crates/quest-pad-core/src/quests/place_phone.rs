/// Phone number quest for shops, offices and other places.
use crate::quest::QuestType;
use crate::tags::StringMapChangesBuilder;

/// What the phone number form can answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacePhoneAnswer {
    PlacePhone(String),
    /// The place does not show a phone number anywhere.
    NoPlacePhoneSign,
}

/// Asks for the phone number of shops, offices, amenities and the like.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddPlacePhone;

impl QuestType for AddPlacePhone {
    type Answer = PlacePhoneAnswer;

    fn name(&self) -> &'static str {
        "AddPlacePhone"
    }

    fn commit_message(&self) -> &'static str {
        "Determine phone number for places"
    }

    fn wiki_link(&self) -> Option<&'static str> {
        Some("Key:phone")
    }

    fn apply_answer_to(&self, answer: &PlacePhoneAnswer, changes: &mut StringMapChangesBuilder) {
        match answer {
            PlacePhoneAnswer::NoPlacePhoneSign => changes.add("phone:signed", "no"),
            PlacePhoneAnswer::PlacePhone(phone) => changes.add("phone", phone.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_phone_answer_sets_phone() {
        let mut changes = StringMapChangesBuilder::new(BTreeMap::new());
        AddPlacePhone.apply_answer_to(
            &PlacePhoneAnswer::PlacePhone(" +1 555 0100 ".into()),
            &mut changes,
        );
        assert_eq!(changes.get("phone"), Some("+1 555 0100"));
        assert_eq!(changes.get("phone:signed"), None);
    }

    #[test]
    fn test_no_sign_answer_sets_phone_signed() {
        let mut changes = StringMapChangesBuilder::new(BTreeMap::new());
        AddPlacePhone.apply_answer_to(&PlacePhoneAnswer::NoPlacePhoneSign, &mut changes);
        assert_eq!(changes.get("phone:signed"), Some("no"));
        assert_eq!(changes.get("phone"), None);
    }
}
