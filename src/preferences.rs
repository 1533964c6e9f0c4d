use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::storage::KeyValueStore;

/// Global entry, outside the per-day `YYYY-MM-DD` keyspace.
pub const COLOR_MODE_KEY: &str = "color-mode";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Dark,
    #[default]
    Light,
}

impl ColorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// Only an exact `"dark"` selects dark mode.
    pub fn from_stored(raw: &str) -> Self {
        if raw == "dark" {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

#[derive(Clone)]
pub struct Preferences {
    kv: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn color_mode(&self) -> ColorMode {
        match self.kv.get(COLOR_MODE_KEY).await {
            Ok(Some(raw)) => ColorMode::from_stored(&raw),
            Ok(None) => ColorMode::default(),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "reading color mode failed");
                ColorMode::default()
            }
        }
    }

    /// Best-effort; a failed write is logged and the requested mode returned.
    pub async fn set_color_mode(&self, mode: ColorMode) -> ColorMode {
        if let Err(e) = self.kv.put(COLOR_MODE_KEY, mode.as_str().to_string()).await {
            error!(error = %format!("{e:#}"), mode = mode.as_str(), "saving color mode failed");
        }
        mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{testing::BrokenStore, MemoryStore};

    #[tokio::test]
    async fn defaults_to_light_and_remembers_dark() {
        let kv = Arc::new(MemoryStore::new());
        let prefs = Preferences::new(kv.clone());
        assert_eq!(prefs.color_mode().await, ColorMode::Light);

        prefs.set_color_mode(ColorMode::Dark).await;
        assert_eq!(prefs.color_mode().await, ColorMode::Dark);
        assert_eq!(kv.get(COLOR_MODE_KEY).await.unwrap().as_deref(), Some("dark"));

        prefs.set_color_mode(ColorMode::Light).await;
        assert_eq!(kv.get(COLOR_MODE_KEY).await.unwrap().as_deref(), Some("light"));
    }

    #[tokio::test]
    async fn unknown_stored_value_reads_as_light() {
        let kv = Arc::new(MemoryStore::new());
        kv.put(COLOR_MODE_KEY, "sepia".into()).await.unwrap();
        assert_eq!(Preferences::new(kv).color_mode().await, ColorMode::Light);
    }

    #[tokio::test]
    async fn storage_failures_are_tolerated() {
        let prefs = Preferences::new(Arc::new(BrokenStore));
        assert_eq!(prefs.color_mode().await, ColorMode::Light);
        assert_eq!(prefs.set_color_mode(ColorMode::Dark).await, ColorMode::Dark);
    }
}
