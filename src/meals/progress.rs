use serde::Serialize;

use super::model::Totals;

/// Goal progress as shown next to the totals.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub protein_percent: f64,
    pub protein_label: String,
    pub protein_met: bool,
    pub calorie_percent: f64,
    pub calorie_label: String,
    pub calorie_met: bool,
}

struct GoalStatus {
    percent: f64,
    label: String,
    met: bool,
}

pub fn evaluate_progress(totals: &Totals, protein_goal: u32, calorie_goal: u32) -> ProgressView {
    let protein = goal_status(totals.protein, protein_goal, "g");
    let calories = goal_status(totals.calories, calorie_goal, "kcal");
    ProgressView {
        protein_percent: protein.percent,
        protein_label: protein.label,
        protein_met: protein.met,
        calorie_percent: calories.percent,
        calorie_label: calories.label,
        calorie_met: calories.met,
    }
}

// A zero goal means "unset": never met, no progress.
fn goal_status(current: u32, goal: u32, unit: &str) -> GoalStatus {
    let label = format!("{current} / {goal} {unit}");
    if goal == 0 {
        return GoalStatus {
            percent: 0.0,
            label,
            met: false,
        };
    }
    let percent = (100.0 * f64::from(current) / f64::from(goal)).min(100.0);
    GoalStatus {
        percent,
        label,
        met: current >= goal,
    }
}
