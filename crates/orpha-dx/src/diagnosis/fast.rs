use super::{confidence, RankingConfig, ScoredCandidate};
use crate::knowledge::{AssociationTable, DisorderId};
use std::collections::BTreeMap;

#[derive(Default)]
struct Tally {
    score: f64,
    matched: Vec<String>,
}

/// Additive score per disorder reachable from `present`, penalized by the
/// recognized absent symptoms of that disorder.
pub(super) fn aggregate(
    table: &AssociationTable,
    present: &[String],
    absent: &[String],
    config: &RankingConfig,
) -> Vec<ScoredCandidate> {
    let mut tallies: BTreeMap<DisorderId, Tally> = BTreeMap::new();

    for symptom in present {
        for record in table.records_for_symptom(symptom) {
            let tally = tallies.entry(record.disorder_id).or_default();
            tally.score += record.weight();
            tally.matched.push(record.symptom.clone());
        }
    }

    tallies
        .into_iter()
        .filter_map(|(disorder_id, tally)| {
            let disorder = table.disorder(disorder_id)?;

            let penalty: f64 = absent
                .iter()
                .filter_map(|symptom| table.association(disorder_id, symptom))
                .map(|record| 1.0 - record.weight() * config.absent_penalty_factor)
                .product();
            let score = tally.score * penalty;

            Some(ScoredCandidate {
                disorder_id,
                disorder_name: disorder.name.clone(),
                orpha_code: disorder.orpha_code.clone(),
                probability: score.clamp(0.0, 1.0),
                confidence_score: confidence(tally.matched.len(), present.len()),
                matching_symptoms: tally.matched,
                total_symptoms: disorder.symptom_count,
            })
        })
        .collect()
}
