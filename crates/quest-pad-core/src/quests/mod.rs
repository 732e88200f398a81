/// Quest types shipped with quest-pad.
pub mod diet_type;
pub mod place_phone;

pub use diet_type::{AddDietType, Diet, DietType};
pub use place_phone::{AddPlacePhone, PlacePhoneAnswer};

use crate::quest::QuestType;

/// Stable names of every known quest type.
pub fn quest_type_names() -> Vec<&'static str> {
    let mut names = vec![AddPlacePhone.name()];
    names.extend(Diet::ALL.iter().map(|d| AddDietType::new(*d).name()));
    names
}

pub fn is_known_quest_type(name: &str) -> bool {
    quest_type_names().contains(&name)
}
