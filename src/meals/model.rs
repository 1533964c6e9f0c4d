use serde::{Deserialize, Serialize};

use super::input::lenient_u32;

/// Display category for a meal. The raw `type` string is kept verbatim on the
/// record; this is only how it is classified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealCategory {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Other,
}

impl MealCategory {
    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "breakfast" => Self::Breakfast,
            "lunch" => Self::Lunch,
            "dinner" => Self::Dinner,
            "snack" => Self::Snack,
            _ => Self::Other,
        }
    }
}

/// One food line of an estimated breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoodItem {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub calories: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub carbs: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub protein: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub fat: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MealRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub calories: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub carbs: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub protein: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub fat: u32,
    #[serde(default)]
    pub foods: Vec<FoodItem>,
}

impl MealRecord {
    pub fn category(&self) -> MealCategory {
        MealCategory::classify(&self.kind)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Totals {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub calories: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub carbs: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub protein: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub fat: u32,
}

/// Everything stored for one calendar day.
///
/// Fields are crate-private: totals are derived from `meals` by the ledger and
/// nothing outside the crate may set them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecord {
    #[serde(default)]
    pub(crate) meals: Vec<MealRecord>,
    #[serde(default)]
    pub(crate) totals: Totals,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub(crate) protein_goal: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub(crate) calorie_goal: u32,
}

impl DailyRecord {
    pub fn meals(&self) -> &[MealRecord] {
        &self.meals
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn protein_goal(&self) -> u32 {
        self.protein_goal
    }

    pub fn calorie_goal(&self) -> u32 {
        self.calorie_goal
    }
}
