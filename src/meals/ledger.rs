use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{
    input::{coerce_count, AddMealInput},
    model::{DailyRecord, FoodItem, MealRecord},
    progress::{evaluate_progress, ProgressView},
    store::DailyRecordStore,
    totals::compute_totals,
};
use crate::clock::Clock;

/// Owns today's [`DailyRecord`] and is the only thing that mutates it.
///
/// Every mutation goes through [`MealLedger::recompute`] before it is
/// persisted, so totals and progress always match the meal list. Persistence
/// is best-effort: a failed save is logged by the store and the in-memory
/// state is kept.
pub struct MealLedger {
    store: DailyRecordStore,
    clock: Arc<dyn Clock>,
    date_key: String,
    record: DailyRecord,
    progress: ProgressView,
    pending_foods: Vec<FoodItem>,
}

impl MealLedger {
    /// An empty ledger for the clock's current day. Call
    /// [`initialize`](Self::initialize) to pick up stored state.
    pub fn new(store: DailyRecordStore, clock: Arc<dyn Clock>) -> Self {
        let date_key = clock.date_key();
        let record = DailyRecord::default();
        let progress = evaluate_progress(&record.totals, 0, 0);
        Self {
            store,
            clock,
            date_key,
            record,
            progress,
            pending_foods: Vec::new(),
        }
    }

    pub async fn open(store: DailyRecordStore, clock: Arc<dyn Clock>) -> Self {
        let mut ledger = Self::new(store, clock);
        ledger.initialize().await;
        ledger
    }

    #[instrument(skip(self))]
    pub async fn initialize(&mut self) {
        self.date_key = self.clock.date_key();
        self.record = self.store.load(&self.date_key).await;
        self.recompute();
        info!(date = %self.date_key, meals = self.record.meals.len(), "ledger initialized");
    }

    pub fn date_key(&self) -> &str {
        &self.date_key
    }

    pub fn record(&self) -> &DailyRecord {
        &self.record
    }

    pub fn progress(&self) -> &ProgressView {
        &self.progress
    }

    pub fn pending_foods(&self) -> &[FoodItem] {
        &self.pending_foods
    }

    /// Switches to the clock's current day if it has moved on. Readers call
    /// this before rendering so they never show a stale day.
    pub async fn refresh(&mut self) {
        self.roll_over_if_needed().await;
    }

    /// Holds an estimated breakdown until the next `add_meal`.
    pub async fn stage_breakdown(&mut self, foods: Vec<FoodItem>) {
        self.roll_over_if_needed().await;
        debug!(date = %self.date_key, foods = foods.len(), "food breakdown staged");
        self.pending_foods = foods;
    }

    pub async fn discard_pending_breakdown(&mut self) {
        self.roll_over_if_needed().await;
        self.pending_foods.clear();
    }

    #[instrument(skip(self, input), fields(date = %self.date_key))]
    pub async fn add_meal(&mut self, input: AddMealInput) -> MealRecord {
        self.roll_over_if_needed().await;

        let meal = MealRecord {
            id: self.next_id(),
            name: input.name,
            kind: input.kind,
            calories: coerce_count(&input.calories),
            carbs: coerce_count(&input.carbs),
            protein: coerce_count(&input.protein),
            fat: coerce_count(&input.fat),
            foods: std::mem::take(&mut self.pending_foods),
        };
        self.record.meals.push(meal.clone());
        self.recompute();
        self.persist().await;

        info!(meal_id = meal.id, calories = meal.calories, foods = meal.foods.len(), "meal added");
        meal
    }

    /// Returns whether a meal was removed. Unknown ids are not an error.
    #[instrument(skip(self), fields(date = %self.date_key))]
    pub async fn delete_meal(&mut self, id: i64) -> bool {
        self.roll_over_if_needed().await;

        let before = self.record.meals.len();
        self.record.meals.retain(|m| m.id != id);
        let removed = self.record.meals.len() != before;
        self.recompute();
        self.persist().await;

        if removed {
            info!(meal_id = id, "meal deleted");
        } else {
            debug!(meal_id = id, "delete for unknown meal ignored");
        }
        removed
    }

    #[instrument(skip(self), fields(date = %self.date_key))]
    pub async fn set_protein_goal(&mut self, value: &Value) {
        self.roll_over_if_needed().await;
        self.record.protein_goal = coerce_count(value);
        self.recompute();
        self.persist().await;
    }

    #[instrument(skip(self), fields(date = %self.date_key))]
    pub async fn set_calorie_goal(&mut self, value: &Value) {
        self.roll_over_if_needed().await;
        self.record.calorie_goal = coerce_count(value);
        self.recompute();
        self.persist().await;
    }

    #[instrument(skip(self), fields(date = %self.date_key))]
    pub async fn reset_day(&mut self) {
        self.roll_over_if_needed().await;
        // best-effort, the store logs failures
        let _ = self.store.clear(&self.date_key).await;
        self.record = DailyRecord::default();
        self.pending_foods.clear();
        self.recompute();
        info!(date = %self.date_key, "day reset");
    }

    /// The single place totals and progress are derived.
    fn recompute(&mut self) {
        self.record.totals = compute_totals(&self.record.meals);
        self.progress = evaluate_progress(
            &self.record.totals,
            self.record.protein_goal,
            self.record.calorie_goal,
        );
    }

    async fn persist(&self) {
        let _ = self.store.save(&self.date_key, &self.record).await;
    }

    async fn roll_over_if_needed(&mut self) {
        let today = self.clock.date_key();
        if today == self.date_key {
            return;
        }
        info!(from = %self.date_key, to = %today, "day changed; switching record");
        self.pending_foods.clear();
        self.initialize().await;
    }

    // Time-derived, strictly increasing within the day.
    fn next_id(&self) -> i64 {
        let now = self.clock.now_millis();
        match self.record.meals.iter().map(|m| m.id).max() {
            Some(max) if max >= now => max.saturating_add(1),
            _ => now,
        }
    }
}
