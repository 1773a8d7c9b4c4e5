mod config;
mod rules;

pub use config::{EvaluationConfig, DEFAULT_EARLY_USER_WINDOW_MONTHS, DEFAULT_MENTAL_HEALTH_CATEGORY};

use super::criteria::{BadgeCriteria, CriterionKind};
use super::domain::LearnerProgressSnapshot;
use serde::{Deserialize, Serialize};

// Absorbs float error so that e.g. 7/10 renders as 70 rather than 69.
const PERCENT_EPSILON: f64 = 1e-9;

/// Stateless evaluator that applies badge criteria to a progress snapshot.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// True when every criterion holds. Absent or empty criteria are never satisfied.
    pub fn is_satisfied(
        &self,
        snapshot: &LearnerProgressSnapshot,
        criteria: Option<&BadgeCriteria>,
    ) -> bool {
        match criteria {
            Some(criteria) if !criteria.is_empty() => criteria
                .criteria()
                .iter()
                .all(|criterion| rules::criterion_met(criterion, snapshot, &self.config)),
            _ => false,
        }
    }

    /// Average of the capped per-criterion ratios, floored to a whole percentage.
    pub fn progress_percentage(
        &self,
        snapshot: &LearnerProgressSnapshot,
        criteria: Option<&BadgeCriteria>,
    ) -> u8 {
        self.assess(snapshot, criteria).progress
    }

    pub fn assess(
        &self,
        snapshot: &LearnerProgressSnapshot,
        criteria: Option<&BadgeCriteria>,
    ) -> CriteriaAssessment {
        let checks: Vec<CriterionCheck> = criteria
            .map(|criteria| {
                criteria
                    .criteria()
                    .iter()
                    .map(|criterion| rules::check_criterion(criterion, snapshot, &self.config))
                    .collect()
            })
            .unwrap_or_default();

        let satisfied = !checks.is_empty() && checks.iter().all(|check| check.met);
        let progress = progress_from_checks(&checks);

        CriteriaAssessment {
            satisfied,
            progress,
            checks,
        }
    }
}

fn progress_from_checks(checks: &[CriterionCheck]) -> u8 {
    if checks.is_empty() {
        return 0;
    }

    let sum: f64 = checks.iter().map(|check| check.ratio.clamp(0.0, 1.0)).sum();
    let percent = (sum / checks.len() as f64 * 100.0 + PERCENT_EPSILON).floor();
    percent.clamp(0.0, 100.0) as u8
}

/// Outcome of a single criterion, kept so progress views can explain themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionCheck {
    pub kind: CriterionKind,
    pub met: bool,
    pub ratio: f64,
    pub notes: String,
}

/// Evaluation output for one badge: the verdict, its progress, and the trail behind both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaAssessment {
    pub satisfied: bool,
    pub progress: u8,
    pub checks: Vec<CriterionCheck>,
}
