//! Symptom-to-disorder ranking.
//!
//! Two strategies share one facade:
//!
//! * `fast` sums association weights per disorder, applies a multiplicative
//!   penalty for absent symptoms and clamps at 1.0. The clamp is a saturation,
//!   not a probability law; downstream consumers rely on the relative order.
//! * `true` computes `P(d | S) = P(S | d) P(d) / P(S)` over a bounded candidate
//!   set. `P(d)` is the disorder's share of all associations in the corpus, an
//!   empirical stand-in for prevalence.

mod bayes;
mod candidates;
mod config;
mod fast;
mod query;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use config::RankingConfig;
pub use query::{
    ComputationMode, DiagnosisQuery, DiagnosisRequest, ListingParams, QueryError, ResolvedQuery,
    DEFAULT_TOP_N, MAX_TOP_N, MIN_TOP_N,
};
pub use router::diagnosis_router;
pub use service::{
    DiagnosisError, DiagnosisService, DiseaseListing, DisorderSummary, SymptomListing, SystemInfo,
};

use crate::knowledge::{AssociationTable, DisorderId};
use serde::Serialize;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::debug;

/// One ranked disorder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    #[serde(skip)]
    pub disorder_id: DisorderId,
    pub disorder_name: String,
    pub orpha_code: String,
    pub probability: f64,
    pub matching_symptoms: Vec<String>,
    pub total_symptoms: usize,
    pub confidence_score: f64,
}

/// Outcome of a ranking call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub results: Vec<ScoredCandidate>,
    pub total_diseases_evaluated: usize,
    pub input_symptoms: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unrecognized_symptoms: Vec<String>,
    pub processing_time_ms: f64,
    pub computation_mode: ComputationMode,
}

/// Stateless scorer; all state lives in the table snapshot passed per call.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn rank(
        &self,
        table: &AssociationTable,
        query: &ResolvedQuery,
    ) -> Result<Ranking, DiagnosisError> {
        let started = Instant::now();

        let (mut results, evaluated) = match query.mode {
            ComputationMode::Fast => {
                let results = fast::aggregate(table, &query.present, &query.absent, &self.config);
                let evaluated = results.len();
                (results, evaluated)
            }
            ComputationMode::True => {
                let candidates =
                    candidates::select(table, &query.present, self.config.candidate_limit);
                let results = bayes::posteriors(
                    table,
                    &query.present,
                    &query.absent,
                    &candidates,
                    &self.config,
                    started,
                )?;
                (results, candidates.len())
            }
        };

        sort_candidates(&mut results);
        results.truncate(query.top_n);

        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!(
            mode = %query.mode,
            evaluated,
            returned = results.len(),
            processing_time_ms,
            "ranking computed"
        );

        Ok(Ranking {
            results,
            total_diseases_evaluated: evaluated,
            input_symptoms: query.present.clone(),
            unrecognized_symptoms: query.unrecognized.clone(),
            processing_time_ms,
            computation_mode: query.mode,
        })
    }
}

/// Probability desc, confidence desc, then canonical disorder order.
pub(crate) fn sort_candidates(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(compare_candidates);
}

fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.probability
        .total_cmp(&a.probability)
        .then_with(|| b.confidence_score.total_cmp(&a.confidence_score))
        .then_with(|| a.disorder_id.cmp(&b.disorder_id))
}

pub(crate) fn confidence(matched: usize, requested: usize) -> f64 {
    matched as f64 / requested.max(1) as f64
}
