/// Diet quests: does this place offer vegan/vegetarian/halal/kosher food?
///
/// One quest type per diet, all sharing the yes/no/only answer form.
use crate::quest::QuestType;
use crate::tags::StringMapChangesBuilder;

/// Answer of the yes / no / only form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DietType {
    Yes,
    No,
    Only,
}

impl DietType {
    pub fn osm_value(self) -> &'static str {
        match self {
            DietType::Yes => "yes",
            DietType::No => "no",
            DietType::Only => "only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diet {
    Vegan,
    Vegetarian,
    Halal,
    Kosher,
}

impl Diet {
    pub const ALL: [Diet; 4] = [Diet::Vegan, Diet::Vegetarian, Diet::Halal, Diet::Kosher];

    /// Suffix of the `diet:*` key.
    pub fn key(self) -> &'static str {
        match self {
            Diet::Vegan => "vegan",
            Diet::Vegetarian => "vegetarian",
            Diet::Halal => "halal",
            Diet::Kosher => "kosher",
        }
    }
}

/// Asks whether a place serves food for one particular diet.
#[derive(Debug, Clone, Copy)]
pub struct AddDietType {
    diet: Diet,
}

impl AddDietType {
    pub fn new(diet: Diet) -> Self {
        Self { diet }
    }

    pub fn diet(&self) -> Diet {
        self.diet
    }

    /// Text shown above the buttons of the answer form.
    pub fn explanation(&self) -> Option<&'static str> {
        match self.diet {
            Diet::Vegan => Some(
                "Only answer yes if there are vegan dishes on the menu, \
                 not if they only can be made on request.",
            ),
            Diet::Vegetarian => Some(
                "Only answer yes if there are vegetarian dishes on the menu \
                 besides a salad.",
            ),
            Diet::Halal => Some(
                "Only answer yes if the food is prepared according to halal rules, \
                 e.g. if the place is certified.",
            ),
            Diet::Kosher => None,
        }
    }
}

impl QuestType for AddDietType {
    type Answer = DietType;

    fn name(&self) -> &'static str {
        match self.diet {
            Diet::Vegan => "AddVegan",
            Diet::Vegetarian => "AddVegetarian",
            Diet::Halal => "AddHalal",
            Diet::Kosher => "AddKosher",
        }
    }

    fn commit_message(&self) -> &'static str {
        match self.diet {
            Diet::Vegan => "Add vegan diet type",
            Diet::Vegetarian => "Add vegetarian diet type",
            Diet::Halal => "Add halal diet type",
            Diet::Kosher => "Add kosher diet type",
        }
    }

    fn wiki_link(&self) -> Option<&'static str> {
        Some("Key:diet")
    }

    fn apply_answer_to(&self, answer: &DietType, changes: &mut StringMapChangesBuilder) {
        changes.add(format!("diet:{}", self.diet.key()), answer.osm_value());
    }
}
