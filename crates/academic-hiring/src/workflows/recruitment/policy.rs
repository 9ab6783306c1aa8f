use chrono::Duration;

use crate::config::WorkflowConfig;

const DEFAULT_JURY_DEADLINE_DAYS: u32 = 14;

/// Decision and assignment dials applied by the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowPolicy {
    /// When set, `decide` refuses while any assigned evaluation is still open.
    pub require_completed_evaluations: bool,
    jury_deadline_days: u32,
}

impl WorkflowPolicy {
    pub fn new(require_completed_evaluations: bool, jury_deadline_days: u32) -> Self {
        let jury_deadline_days = if jury_deadline_days == 0 {
            DEFAULT_JURY_DEADLINE_DAYS
        } else {
            jury_deadline_days
        };

        Self {
            require_completed_evaluations,
            jury_deadline_days,
        }
    }

    pub fn jury_deadline_days(&self) -> u32 {
        self.jury_deadline_days
    }

    /// Offset applied to assignments that do not carry an explicit deadline.
    pub fn default_jury_deadline(&self) -> Duration {
        Duration::days(i64::from(self.jury_deadline_days))
    }
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self::new(false, DEFAULT_JURY_DEADLINE_DAYS)
    }
}

impl From<&WorkflowConfig> for WorkflowPolicy {
    fn from(config: &WorkflowConfig) -> Self {
        Self::new(
            config.require_completed_evaluations,
            config.jury_deadline_days,
        )
    }
}
