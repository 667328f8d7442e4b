//! Engine configuration.

use std::time::Duration;

use serde::Deserialize;

/// Tunables for the upload pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Remote folder that receives every upload.
    pub folder: String,

    /// Hard ceiling on failed attempts before an item is finalized as failure.
    pub max_tries: u32,

    /// Bulkhead: the most items one drain cycle will work concurrently.
    pub batch_limit: usize,

    /// Cadence of the periodic trigger, in seconds.
    pub drain_interval_secs: u64,
}

impl EngineConfig {
    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_interval_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            folder: "/linkdrop-uploads".to_string(),
            max_tries: 3,
            batch_limit: 30,
            drain_interval_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_pipeline_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.max_tries, 3);
        assert_eq!(config.batch_limit, 30);
        assert_eq!(config.drain_interval(), Duration::from_secs(30));
    }

    #[test]
    fn partial_config_files_fill_in_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"folder": "/photos", "batch_limit": 5}"#).unwrap();
        assert_eq!(config.folder, "/photos");
        assert_eq!(config.batch_limit, 5);
        assert_eq!(config.max_tries, 3);
    }
}
