use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_PASS_THRESHOLD_TENTHS;

/// Default time limit: 75 minutes.
pub const DEFAULT_TOTAL_SECONDS: u32 = 75 * 60;

/// Knobs fixed at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub total_seconds: u32,
    pub pass_threshold_tenths: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_seconds: DEFAULT_TOTAL_SECONDS,
            pass_threshold_tenths: DEFAULT_PASS_THRESHOLD_TENTHS,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_total_seconds(mut self, total_seconds: u32) -> Self {
        self.total_seconds = total_seconds;
        self
    }

    #[must_use]
    pub fn with_pass_threshold_tenths(mut self, tenths: u32) -> Self {
        self.pass_threshold_tenths = tenths;
        self
    }
}
