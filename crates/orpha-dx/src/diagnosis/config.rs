use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning constants for both ranking modes.
///
/// The defaults reproduce the historical behavior of the service. They carry no
/// derivation beyond that, so they are exposed here for tuning and tests rather
/// than baked into the scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Fast mode: each recognized absent symptom multiplies the score by
    /// `1 - weight * absent_penalty_factor`.
    pub absent_penalty_factor: f64,
    /// True mode: likelihood contributed by a present symptom the disorder has
    /// no association with.
    pub unseen_symptom_likelihood: f64,
    /// True mode: maximum number of disorders in the candidate set.
    pub candidate_limit: usize,
    /// True mode: evidence substituted when every candidate scores zero.
    pub evidence_floor: f64,
    /// True mode: optional wall-clock budget checked between candidates.
    #[serde(default)]
    pub true_mode_deadline_ms: Option<u64>,
}

impl RankingConfig {
    pub const DEFAULT_ABSENT_PENALTY_FACTOR: f64 = 0.5;
    pub const DEFAULT_UNSEEN_SYMPTOM_LIKELIHOOD: f64 = 0.01;
    pub const DEFAULT_CANDIDATE_LIMIT: usize = 25;
    pub const DEFAULT_EVIDENCE_FLOOR: f64 = 1e-10;

    pub fn deadline(&self) -> Option<Duration> {
        self.true_mode_deadline_ms.map(Duration::from_millis)
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            absent_penalty_factor: Self::DEFAULT_ABSENT_PENALTY_FACTOR,
            unseen_symptom_likelihood: Self::DEFAULT_UNSEEN_SYMPTOM_LIKELIHOOD,
            candidate_limit: Self::DEFAULT_CANDIDATE_LIMIT,
            evidence_floor: Self::DEFAULT_EVIDENCE_FLOOR,
            true_mode_deadline_ms: None,
        }
    }
}
