use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::estimator::RetryPolicy;

pub const DEFAULT_ESTIMATOR_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_ESTIMATOR_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Deserialize)]
pub struct EstimatorConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
}

impl EstimatorConfig {
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            backoff_step: Duration::from_millis(self.backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres is used when set; otherwise entries go to files in `data_dir`.
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub estimator: EstimatorConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let number = |name: &str, default: u64| {
            non_empty(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let estimator = EstimatorConfig {
            base_url: non_empty("ESTIMATOR_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ESTIMATOR_BASE_URL.into()),
            model: non_empty("ESTIMATOR_MODEL").unwrap_or_else(|| DEFAULT_ESTIMATOR_MODEL.into()),
            api_key: non_empty("GEMINI_API_KEY"),
            max_attempts: u32::try_from(number("ESTIMATOR_MAX_ATTEMPTS", 3)).unwrap_or(3),
            backoff_ms: number("ESTIMATOR_BACKOFF_MS", 1000),
            timeout_secs: number("ESTIMATOR_TIMEOUT_SECS", 30),
        };
        anyhow::ensure!(
            estimator.base_url.starts_with("http://") || estimator.base_url.starts_with("https://"),
            "ESTIMATOR_BASE_URL must be an http(s) URL"
        );

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            data_dir: non_empty("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            estimator,
        })
    }
}
