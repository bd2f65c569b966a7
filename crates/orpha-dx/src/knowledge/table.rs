use super::frequency::FrequencyCategory;
use super::parser::ClinicalSignRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Dense disorder index assigned in first-seen ingestion order. Ranking uses
/// it as the canonical tie-breaking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DisorderId(pub u32);

impl DisorderId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Disorder {
    pub id: DisorderId,
    pub orpha_code: String,
    pub name: String,
    /// Number of clinical signs recorded for the disorder.
    pub symptom_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Association {
    pub disorder_id: DisorderId,
    pub orpha_code: String,
    pub symptom: String,
    pub frequency: FrequencyCategory,
}

impl Association {
    pub fn weight(&self) -> f64 {
        self.frequency.weight()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub disorders: usize,
    pub symptoms: usize,
    pub associations: usize,
}

/// Immutable disorder/symptom association snapshot with the lookups the
/// ranking modes need. Built once per ingestion and shared behind an `Arc`.
#[derive(Debug)]
pub struct AssociationTable {
    disorders: Vec<Disorder>,
    associations: Vec<Association>,
    by_disorder: Vec<Vec<usize>>,
    by_symptom: HashMap<String, Vec<usize>>,
    symptom_ids: HashMap<String, u32>,
    pairs: HashMap<(DisorderId, u32), usize>,
    vocabulary: Vec<String>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl AssociationTable {
    pub fn builder(source: impl Into<String>) -> AssociationTableBuilder {
        AssociationTableBuilder::new(source)
    }

    pub fn disorders(&self) -> &[Disorder] {
        &self.disorders
    }

    pub fn disorder(&self, id: DisorderId) -> Option<&Disorder> {
        self.disorders.get(id.index())
    }

    pub fn disorder_by_code(&self, orpha_code: &str) -> Option<&Disorder> {
        self.disorders
            .iter()
            .find(|disorder| disorder.orpha_code == orpha_code)
    }

    pub fn all_records(&self) -> &[Association] {
        &self.associations
    }

    pub fn records_for_symptom(&self, symptom: &str) -> impl Iterator<Item = &Association> + '_ {
        let indices = self
            .by_symptom
            .get(symptom)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        indices.iter().map(move |&idx| &self.associations[idx])
    }

    pub fn records_for_disorder(&self, id: DisorderId) -> impl Iterator<Item = &Association> + '_ {
        let indices = self
            .by_disorder
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        indices.iter().map(move |&idx| &self.associations[idx])
    }

    pub fn association(&self, id: DisorderId, symptom: &str) -> Option<&Association> {
        let symptom_id = self.symptom_ids.get(symptom)?;
        self.pairs
            .get(&(id, *symptom_id))
            .map(|&idx| &self.associations[idx])
    }

    /// Number of associations recorded for a disorder.
    pub fn association_count(&self, id: DisorderId) -> usize {
        self.by_disorder.get(id.index()).map_or(0, Vec::len)
    }

    pub fn contains_symptom(&self, symptom: &str) -> bool {
        self.symptom_ids.contains_key(symptom)
    }

    /// Known symptom terms in ascending order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            disorders: self.disorders.len(),
            symptoms: self.vocabulary.len(),
            associations: self.associations.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Accumulates associations, enforcing one association per disorder/symptom
/// pair. The first occurrence wins.
#[derive(Debug)]
pub struct AssociationTableBuilder {
    source: String,
    disorders: Vec<Disorder>,
    codes: HashMap<String, DisorderId>,
    associations: Vec<Association>,
    symptom_ids: HashMap<String, u32>,
    pairs: HashMap<(DisorderId, u32), usize>,
    duplicates: usize,
}

impl AssociationTableBuilder {
    fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            disorders: Vec::new(),
            codes: HashMap::new(),
            associations: Vec::new(),
            symptom_ids: HashMap::new(),
            pairs: HashMap::new(),
            duplicates: 0,
        }
    }

    /// Record an association. Returns `false` when the pair was already present.
    pub fn insert(
        &mut self,
        orpha_code: &str,
        disorder_name: &str,
        symptom: &str,
        frequency: FrequencyCategory,
    ) -> bool {
        let disorder_id = match self.codes.get(orpha_code) {
            Some(id) => *id,
            None => {
                let id = DisorderId(self.disorders.len() as u32);
                self.disorders.push(Disorder {
                    id,
                    orpha_code: orpha_code.to_string(),
                    name: disorder_name.to_string(),
                    symptom_count: 0,
                });
                self.codes.insert(orpha_code.to_string(), id);
                id
            }
        };

        let next_symptom_id = self.symptom_ids.len() as u32;
        let symptom_id = *self
            .symptom_ids
            .entry(symptom.to_string())
            .or_insert(next_symptom_id);

        if self.pairs.contains_key(&(disorder_id, symptom_id)) {
            debug!(orpha_code, symptom, "ignoring duplicate association");
            self.duplicates += 1;
            return false;
        }

        self.pairs
            .insert((disorder_id, symptom_id), self.associations.len());
        self.associations.push(Association {
            disorder_id,
            orpha_code: orpha_code.to_string(),
            symptom: symptom.to_string(),
            frequency,
        });
        self.disorders[disorder_id.index()].symptom_count += 1;
        true
    }

    pub(crate) fn insert_record(&mut self, record: &ClinicalSignRecord) -> bool {
        self.insert(
            &record.orpha_code,
            &record.disorder_name,
            &record.symptom,
            record.frequency,
        )
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn build(self) -> AssociationTable {
        let mut by_disorder = vec![Vec::new(); self.disorders.len()];
        let mut by_symptom: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, association) in self.associations.iter().enumerate() {
            by_disorder[association.disorder_id.index()].push(idx);
            by_symptom
                .entry(association.symptom.clone())
                .or_default()
                .push(idx);
        }

        let mut vocabulary: Vec<String> = self.symptom_ids.keys().cloned().collect();
        vocabulary.sort();

        AssociationTable {
            disorders: self.disorders,
            associations: self.associations,
            by_disorder,
            by_symptom,
            symptom_ids: self.symptom_ids,
            pairs: self.pairs,
            vocabulary,
            source: self.source,
            loaded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AssociationTable {
        let mut builder = AssociationTable::builder("test");
        builder.insert("558", "Marfan syndrome", "Arachnodactyly", FrequencyCategory::VeryFrequent);
        builder.insert("558", "Marfan syndrome", "Myopia", FrequencyCategory::Frequent);
        builder.insert("166024", "Nance-Horan syndrome", "Myopia", FrequencyCategory::Occasional);
        builder.build()
    }

    #[test]
    fn indexes_records_by_symptom_and_disorder() {
        let table = sample();
        let myopia: Vec<_> = table
            .records_for_symptom("Myopia")
            .map(|record| record.orpha_code.as_str())
            .collect();
        assert_eq!(myopia, vec!["558", "166024"]);

        let marfan = table.disorder_by_code("558").expect("marfan present");
        assert_eq!(marfan.symptom_count, 2);
        assert_eq!(table.records_for_disorder(marfan.id).count(), 2);
        assert_eq!(table.records_for_symptom("Fever").count(), 0);
    }

    #[test]
    fn keeps_first_association_for_duplicate_pairs() {
        let mut builder = AssociationTable::builder("test");
        assert!(builder.insert("558", "Marfan syndrome", "Myopia", FrequencyCategory::Frequent));
        assert!(!builder.insert("558", "Marfan syndrome", "Myopia", FrequencyCategory::VeryRare));
        assert_eq!(builder.duplicates(), 1);

        let table = builder.build();
        let id = table.disorder_by_code("558").expect("present").id;
        let association = table.association(id, "Myopia").expect("association");
        assert_eq!(association.frequency, FrequencyCategory::Frequent);
        assert_eq!(table.stats().associations, 1);
    }

    #[test]
    fn vocabulary_is_sorted_and_deduplicated() {
        let table = sample();
        assert_eq!(table.vocabulary(), &["Arachnodactyly", "Myopia"]);
        assert!(table.contains_symptom("Myopia"));
        assert!(!table.contains_symptom("myopia"));
    }

    #[test]
    fn disorder_ids_follow_ingestion_order() {
        let table = sample();
        let ids: Vec<_> = table.disorders().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![DisorderId(0), DisorderId(1)]);
        assert_eq!(table.association_count(DisorderId(1)), 1);
        assert_eq!(table.association_count(DisorderId(9)), 0);
    }
}
