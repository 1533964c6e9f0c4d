//! Meal description → nutrition estimate, via an external text model.
//!
//! The backend only fetches raw text; this module validates it and owns the
//! retry policy.

pub mod gemini;
pub mod parse;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use crate::clock::Sleeper;
use crate::error::EstimationError;
pub use parse::{Estimate, SYSTEM_INSTRUCTION};

/// The external collaborator: sends one request and returns the model's text.
#[async_trait]
pub trait EstimationBackend: Send + Sync {
    async fn generate(&self, description: &str, instruction: &str)
        -> Result<String, EstimationError>;
}

/// Bounded retry with linear backoff: after failed attempt `i` (0-based) wait
/// `backoff_step * (i + 1)`, saturating at `Duration::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt_index: u32) -> Duration {
        self.backoff_step
            .checked_mul(attempt_index.saturating_add(1))
            .unwrap_or(Duration::MAX)
    }
}

pub struct NutritionEstimator {
    backend: Arc<dyn EstimationBackend>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl NutritionEstimator {
    pub fn new(
        backend: Arc<dyn EstimationBackend>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            sleeper,
            policy,
        }
    }

    /// Estimates one meal. Returns the last attempt's error once the policy
    /// is exhausted.
    #[instrument(skip(self, description), fields(len = description.len()))]
    pub async fn estimate(&self, description: &str) -> Result<Estimate, EstimationError> {
        if description.trim().is_empty() {
            return Err(EstimationError::BlankDescription);
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let result = match self.backend.generate(description, SYSTEM_INSTRUCTION).await {
                Ok(text) => parse::parse_estimate(&text),
                Err(e) => Err(e),
            };

            let err = match result {
                Ok(estimate) => {
                    info!(
                        attempt = attempt + 1,
                        calories = estimate.totals.calories,
                        foods = estimate.foods.len(),
                        "estimate received"
                    );
                    return Ok(estimate);
                }
                Err(e) => e,
            };

            if !err.is_retryable() || attempt + 1 >= max_attempts {
                error!(attempts = attempt + 1, error = %err, "estimation failed");
                return Err(err);
            }

            let delay = self.policy.delay_after(attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "estimation attempt failed; retrying"
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
