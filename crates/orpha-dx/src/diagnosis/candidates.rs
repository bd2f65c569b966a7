use crate::knowledge::{AssociationTable, DisorderId};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Disorders the true-mode ranker evaluates.
///
/// Every disorder associated with a present symptom qualifies. Above `limit`
/// the best-documented disorders (most associations, then canonical order) are
/// kept. With no match at all the first `limit` disorders of the table stand in,
/// so the ranker still produces a defined, if uninformative, answer.
pub(super) fn select(
    table: &AssociationTable,
    present: &[String],
    limit: usize,
) -> Vec<DisorderId> {
    let matched: BTreeSet<DisorderId> = present
        .iter()
        .flat_map(|symptom| table.records_for_symptom(symptom))
        .map(|record| record.disorder_id)
        .collect();

    if matched.is_empty() {
        return table
            .disorders()
            .iter()
            .take(limit)
            .map(|disorder| disorder.id)
            .collect();
    }

    let mut candidates: Vec<DisorderId> = matched.into_iter().collect();
    if candidates.len() > limit {
        candidates.sort_by_key(|id| (Reverse(table.association_count(*id)), *id));
        candidates.truncate(limit);
    }
    candidates
}
