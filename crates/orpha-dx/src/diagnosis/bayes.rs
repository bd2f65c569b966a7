use super::{confidence, DiagnosisError, RankingConfig, ScoredCandidate};
use crate::knowledge::{AssociationTable, DisorderId};
use std::time::Instant;
use tracing::warn;

struct Unnormalized {
    disorder_id: DisorderId,
    /// `ln(prior * likelihood)`; negative infinity for a zero likelihood.
    log_weight: f64,
    matched: Vec<String>,
}

/// Normalized posterior for each candidate.
///
/// Evidence is summed over the candidate set only, so posteriors add up to at
/// most one across the candidates and to exactly one when the candidates cover
/// every disorder. Weights are kept in log space and normalized with
/// log-sum-exp, so long symptom lists do not underflow to zero. Candidates with
/// a zero posterior and no matching symptom are left out of the returned list.
pub(super) fn posteriors(
    table: &AssociationTable,
    present: &[String],
    absent: &[String],
    candidates: &[DisorderId],
    config: &RankingConfig,
    started: Instant,
) -> Result<Vec<ScoredCandidate>, DiagnosisError> {
    let total_associations = table.all_records().len();
    if total_associations == 0 {
        return Ok(Vec::new());
    }
    let deadline = config.deadline();

    let mut scored = Vec::with_capacity(candidates.len());
    for (evaluated, &disorder_id) in candidates.iter().enumerate() {
        if let Some(deadline) = deadline {
            if started.elapsed() >= deadline {
                warn!(
                    evaluated,
                    candidates = candidates.len(),
                    deadline_ms = deadline.as_millis() as u64,
                    "true-mode ranking exceeded its deadline"
                );
                return Err(DiagnosisError::ComputationTimeout {
                    deadline_ms: deadline.as_millis() as u64,
                    evaluated,
                });
            }
        }

        let prior = table.association_count(disorder_id) as f64 / total_associations as f64;

        let mut log_weight = prior.ln();
        let mut matched = Vec::new();
        for symptom in present {
            match table.association(disorder_id, symptom) {
                Some(record) => {
                    log_weight += record.weight().ln();
                    matched.push(record.symptom.clone());
                }
                None => log_weight += config.unseen_symptom_likelihood.ln(),
            }
        }
        for symptom in absent {
            if let Some(record) = table.association(disorder_id, symptom) {
                log_weight += (1.0 - record.weight()).ln();
            }
        }

        scored.push(Unnormalized {
            disorder_id,
            log_weight,
            matched,
        });
    }

    let max_log_weight = scored
        .iter()
        .map(|entry| entry.log_weight)
        .filter(|value| value.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let (offset, evidence) = if max_log_weight.is_finite() {
        let evidence: f64 = scored
            .iter()
            .map(|entry| (entry.log_weight - max_log_weight).exp())
            .sum();
        (max_log_weight, evidence)
    } else {
        // Every candidate carries an excluded association.
        (0.0, config.evidence_floor)
    };

    Ok(scored
        .into_iter()
        .filter(|entry| entry.log_weight.is_finite() || !entry.matched.is_empty())
        .filter_map(|entry| {
            let disorder = table.disorder(entry.disorder_id)?;
            Some(ScoredCandidate {
                disorder_id: entry.disorder_id,
                disorder_name: disorder.name.clone(),
                orpha_code: disorder.orpha_code.clone(),
                probability: ((entry.log_weight - offset).exp() / evidence).clamp(0.0, 1.0),
                confidence_score: confidence(entry.matched.len(), present.len()),
                matching_symptoms: entry.matched,
                total_symptoms: disorder.symptom_count,
            })
        })
        .collect())
}
