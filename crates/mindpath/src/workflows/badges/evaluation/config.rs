use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MENTAL_HEALTH_CATEGORY: &str = "mental_health";
pub const DEFAULT_EARLY_USER_WINDOW_MONTHS: u32 = 1;

/// Rule configuration shared by the evaluator and the progress snapshot builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub launch_date: NaiveDate,
    pub early_user_window_months: u32,
    pub mental_health_category: String,
}

impl EvaluationConfig {
    pub fn new(launch_date: NaiveDate) -> Self {
        Self {
            launch_date,
            early_user_window_months: DEFAULT_EARLY_USER_WINDOW_MONTHS,
            mental_health_category: DEFAULT_MENTAL_HEALTH_CATEGORY.to_string(),
        }
    }

    /// Last calendar day on which a new account still counts as an early user.
    pub fn early_user_cutoff(&self) -> NaiveDate {
        self.launch_date
            .checked_add_months(Months::new(self.early_user_window_months))
            .unwrap_or(NaiveDate::MAX)
    }
}
