use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock, TokioSleeper};
use crate::config::AppConfig;
use crate::db::PgKeyValueStore;
use crate::estimator::{gemini::GeminiBackend, NutritionEstimator};
use crate::meals::{ledger::MealLedger, store::DailyRecordStore};
use crate::preferences::Preferences;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    /// Ledger operations are serialized; each runs to completion under the lock.
    pub ledger: Arc<Mutex<MealLedger>>,
    pub estimator: Arc<NutritionEstimator>,
    pub preferences: Preferences,
    estimating: Arc<AtomicBool>,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let kv: Arc<dyn KeyValueStore> = match &config.database_url {
            Some(url) => {
                tracing::info!("using postgres key-value store");
                Arc::new(PgKeyValueStore::connect(url).await?)
            }
            None => match FileStore::new(&config.data_dir).await {
                Ok(store) => {
                    tracing::info!(dir = %config.data_dir.display(), "using file key-value store");
                    Arc::new(store)
                }
                Err(e) => {
                    tracing::error!(error = %format!("{e:#}"), "data dir unusable; records will not outlive this process");
                    Arc::new(MemoryStore::new())
                }
            },
        };

        if config.estimator.api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; estimation requests will be rejected upstream");
        }
        let backend = Arc::new(GeminiBackend::new(&config.estimator)?);
        let estimator = NutritionEstimator::new(
            backend,
            Arc::new(TokioSleeper),
            config.estimator.retry_policy(),
        );

        Ok(Self::from_parts(kv, Arc::new(SystemClock), estimator).await)
    }

    pub async fn from_parts(
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        estimator: NutritionEstimator,
    ) -> Self {
        let ledger = MealLedger::open(DailyRecordStore::new(kv.clone()), clock).await;
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            estimator: Arc::new(estimator),
            preferences: Preferences::new(kv),
            estimating: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_estimating(&self) -> bool {
        self.estimating.load(Ordering::Acquire)
    }

    /// Claims the single estimation slot. `None` while another estimate is
    /// in flight; the slot is released when the guard drops.
    pub fn try_begin_estimate(&self) -> Option<EstimateGuard> {
        self.estimating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| EstimateGuard {
                flag: self.estimating.clone(),
            })
    }

    #[cfg(test)]
    pub async fn fake(backend: Arc<dyn crate::estimator::EstimationBackend>) -> Self {
        use crate::clock::testing::FixedClock;

        let clock = FixedClock::at(time::macros::datetime!(2026-10-16 12:00 UTC));
        Self::fake_with_clock(backend, Arc::new(clock)).await
    }

    #[cfg(test)]
    pub async fn fake_with_clock(
        backend: Arc<dyn crate::estimator::EstimationBackend>,
        clock: Arc<crate::clock::testing::FixedClock>,
    ) -> Self {
        use crate::clock::testing::RecordingSleeper;
        use crate::estimator::RetryPolicy;

        let estimator = NutritionEstimator::new(
            backend,
            Arc::new(RecordingSleeper::default()),
            RetryPolicy::default(),
        );
        Self::from_parts(Arc::new(MemoryStore::new()), clock, estimator).await
    }
}

pub struct EstimateGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for EstimateGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
