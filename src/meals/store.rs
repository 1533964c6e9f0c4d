use std::sync::Arc;

use tracing::{debug, error, warn};

use super::model::DailyRecord;
use crate::{error::StoreError, storage::KeyValueStore};

/// Reads and writes one [`DailyRecord`] per date key.
#[derive(Clone)]
pub struct DailyRecordStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DailyRecordStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Missing, unreadable and malformed entries all load as a fresh day.
    pub async fn load(&self, date_key: &str) -> DailyRecord {
        let raw = match self.kv.get(date_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(date = %date_key, "no stored record; starting fresh");
                return DailyRecord::default();
            }
            Err(e) => {
                warn!(date = %date_key, error = %format!("{e:#}"), "reading day record failed");
                return DailyRecord::default();
            }
        };

        match serde_json::from_str::<DailyRecord>(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(date = %date_key, error = %e, "stored day record is malformed; ignoring");
                DailyRecord::default()
            }
        }
    }

    pub async fn save(&self, date_key: &str, record: &DailyRecord) -> Result<(), StoreError> {
        let result = async {
            let body = serde_json::to_string(record)?;
            self.kv.put(date_key, body).await?;
            Ok::<_, StoreError>(())
        }
        .await;

        match &result {
            Ok(()) => debug!(date = %date_key, meals = record.meals.len(), "day record saved"),
            Err(e) => error!(date = %date_key, error = %e, "saving day record failed"),
        }
        result
    }

    pub async fn clear(&self, date_key: &str) -> Result<(), StoreError> {
        self.kv.delete(date_key).await.map_err(|e| {
            error!(date = %date_key, error = %format!("{e:#}"), "clearing day record failed");
            StoreError::from(e)
        })
    }
}
