use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{
        EstimateRequest, GoalRequest, MealCreatedResponse, TodayView, MANUAL_ENTRY_MESSAGE,
    },
    input::AddMealInput,
};
use crate::{error::EstimationError, estimator::Estimate, state::AppState};

pub fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/today", get(get_today))
        .route("/meals", post(add_meal))
        .route("/meals/:id", delete(delete_meal))
        .route("/goals/protein", put(set_protein_goal))
        .route("/goals/calories", put(set_calorie_goal))
        .route("/reset", post(reset_day))
}

pub fn estimate_routes() -> Router<AppState> {
    Router::new()
        .route("/estimate", post(estimate))
        .route("/estimate/pending", delete(discard_pending))
}

#[instrument(skip(state))]
pub async fn get_today(State(state): State<AppState>) -> Json<TodayView> {
    let mut ledger = state.ledger.lock().await;
    ledger.refresh().await;
    Json(TodayView::from(&*ledger))
}

/// POST /meals
///
/// Refused while an estimate is in flight: its breakdown belongs to the meal
/// the client submits once the estimate returns.
#[instrument(skip(state, input))]
pub async fn add_meal(
    State(state): State<AppState>,
    Json(input): Json<AddMealInput>,
) -> Result<(StatusCode, Json<MealCreatedResponse>), (StatusCode, String)> {
    if state.is_estimating() {
        warn!("meal submitted while an estimate is in flight");
        return Err((
            StatusCode::CONFLICT,
            "an estimate is in progress; submit the meal when it completes".into(),
        ));
    }

    let mut ledger = state.ledger.lock().await;
    let meal = ledger.add_meal(input).await;
    Ok((
        StatusCode::CREATED,
        Json(MealCreatedResponse {
            meal: meal.into(),
            today: TodayView::from(&*ledger),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn delete_meal(State(state): State<AppState>, Path(id): Path<i64>) -> Json<TodayView> {
    let mut ledger = state.ledger.lock().await;
    ledger.delete_meal(id).await;
    Json(TodayView::from(&*ledger))
}

#[instrument(skip(state))]
pub async fn set_protein_goal(
    State(state): State<AppState>,
    Json(body): Json<GoalRequest>,
) -> Json<TodayView> {
    let mut ledger = state.ledger.lock().await;
    ledger.set_protein_goal(&body.value).await;
    Json(TodayView::from(&*ledger))
}

#[instrument(skip(state))]
pub async fn set_calorie_goal(
    State(state): State<AppState>,
    Json(body): Json<GoalRequest>,
) -> Json<TodayView> {
    let mut ledger = state.ledger.lock().await;
    ledger.set_calorie_goal(&body.value).await;
    Json(TodayView::from(&*ledger))
}

#[instrument(skip(state))]
pub async fn reset_day(State(state): State<AppState>) -> Json<TodayView> {
    let mut ledger = state.ledger.lock().await;
    ledger.reset_day().await;
    Json(TodayView::from(&*ledger))
}

/// POST /estimate { description }
///
/// On success the food breakdown is staged on the ledger for the next meal.
/// The ledger lock is not held while the estimator runs.
#[instrument(skip(state, body))]
pub async fn estimate(
    State(state): State<AppState>,
    Json(body): Json<EstimateRequest>,
) -> Result<Json<Estimate>, (StatusCode, String)> {
    if body.description.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "description is required".into()));
    }

    let Some(_busy) = state.try_begin_estimate() else {
        warn!("estimate requested while another is in flight");
        return Err((
            StatusCode::CONFLICT,
            "an estimate is already in progress".into(),
        ));
    };

    // a new estimate supersedes whatever was staged before
    state.ledger.lock().await.discard_pending_breakdown().await;

    match state.estimator.estimate(&body.description).await {
        Ok(estimate) => {
            state
                .ledger
                .lock()
                .await
                .stage_breakdown(estimate.foods.clone())
                .await;
            info!(calories = estimate.totals.calories, "estimate ready");
            Ok(Json(estimate))
        }
        Err(EstimationError::BlankDescription) => {
            Err((StatusCode::BAD_REQUEST, "description is required".into()))
        }
        Err(e) => {
            error!(error = %e, "estimate failed; asking for manual entry");
            Err((StatusCode::BAD_GATEWAY, MANUAL_ENTRY_MESSAGE.into()))
        }
    }
}

#[instrument(skip(state))]
pub async fn discard_pending(State(state): State<AppState>) -> Json<TodayView> {
    let mut ledger = state.ledger.lock().await;
    ledger.discard_pending_breakdown().await;
    Json(TodayView::from(&*ledger))
}
