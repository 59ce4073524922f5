use serde::{Deserialize, Serialize};

use crate::config::SchedulingConfig;

/// Policy dials for suggestion ranking and publication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentConfig {
    /// Trailing window, in days, over which realized services spread load
    /// toward less-recently-used volunteers.
    pub ranking_window_days: i64,
    /// When false, every generated plan requires human confirmation before
    /// the scale can be published.
    pub auto_assign: bool,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            ranking_window_days: 90,
            auto_assign: true,
        }
    }
}

impl From<&SchedulingConfig> for AssignmentConfig {
    fn from(config: &SchedulingConfig) -> Self {
        Self {
            ranking_window_days: config.ranking_window_days,
            auto_assign: config.auto_assign,
        }
    }
}
