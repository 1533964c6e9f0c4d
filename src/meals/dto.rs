use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ledger::MealLedger,
    model::{FoodItem, MealCategory, MealRecord, Totals},
    progress::ProgressView,
};

pub const MANUAL_ENTRY_MESSAGE: &str = "Failed to calculate. Please enter manually.";

/// A meal as rendered: the stored record plus its display category.
#[derive(Debug, Serialize)]
pub struct MealView {
    #[serde(flatten)]
    pub meal: MealRecord,
    pub category: MealCategory,
}

impl From<MealRecord> for MealView {
    fn from(meal: MealRecord) -> Self {
        let category = meal.category();
        Self { meal, category }
    }
}

/// Everything the client needs to redraw after any change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayView {
    pub date: String,
    pub meals: Vec<MealView>,
    pub totals: Totals,
    pub protein_goal: u32,
    pub calorie_goal: u32,
    pub progress: ProgressView,
    pub pending_foods: Vec<FoodItem>,
}

impl From<&MealLedger> for TodayView {
    fn from(ledger: &MealLedger) -> Self {
        let record = ledger.record();
        Self {
            date: ledger.date_key().to_string(),
            meals: record.meals().iter().cloned().map(MealView::from).collect(),
            totals: record.totals(),
            protein_goal: record.protein_goal(),
            calorie_goal: record.calorie_goal(),
            progress: ledger.progress().clone(),
            pending_foods: ledger.pending_foods().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MealCreatedResponse {
    pub meal: MealView,
    pub today: TodayView,
}

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub description: String,
}
