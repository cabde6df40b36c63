use serde::{Deserialize, Serialize};

/// Policy defaults applied when a subject does not carry its own threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsConfig {
    pub default_minimum_percent: f64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            default_minimum_percent: 75.0,
        }
    }
}
