use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::query::{DiagnosisQuery, DiagnosisRequest, ListingParams, QueryError};
use super::{Ranking, RankingConfig, RankingEngine};
use crate::knowledge::{AssociationStore, AssociationTable, DataSourceKind, StoreError};

/// Service composing the association store and the ranking engine.
pub struct DiagnosisService<S> {
    store: Arc<S>,
    engine: Arc<RankingEngine>,
}

impl<S> Clone for DiagnosisService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S> DiagnosisService<S>
where
    S: AssociationStore + 'static,
{
    pub fn new(store: Arc<S>, config: RankingConfig) -> Self {
        Self {
            store,
            engine: Arc::new(RankingEngine::new(config)),
        }
    }

    /// Validate, resolve against one snapshot, and rank.
    pub fn diagnose(&self, request: DiagnosisRequest) -> Result<Ranking, DiagnosisError> {
        let started = Instant::now();
        let query = DiagnosisQuery::from_request(request)?;
        let table = self.store.snapshot()?;

        let resolved = query.resolve(&table);
        if !resolved.has_valid_symptoms() {
            warn!(
                unrecognized = ?resolved.unrecognized,
                "diagnosis rejected: no recognized present symptoms"
            );
            return Err(DiagnosisError::NoValidSymptoms {
                unrecognized: resolved.unrecognized,
            });
        }

        let mut ranking = self.engine.rank(&table, &resolved)?;
        ranking.processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        info!(
            mode = %ranking.computation_mode,
            symptoms = ranking.input_symptoms.len(),
            unrecognized = ranking.unrecognized_symptoms.len(),
            evaluated = ranking.total_diseases_evaluated,
            returned = ranking.results.len(),
            processing_time_ms = ranking.processing_time_ms,
            "diagnosis completed"
        );

        Ok(ranking)
    }

    /// Known vocabulary, optionally filtered by a case-insensitive substring.
    pub fn symptoms(&self, params: &ListingParams) -> Result<SymptomListing, DiagnosisError> {
        let limit = params.validated_limit()?;
        let table = self.store.snapshot()?;
        let search = params.search_term();

        let filtered: Vec<&String> = match search {
            Some(term) => {
                let needle = term.to_lowercase();
                table
                    .vocabulary()
                    .iter()
                    .filter(|symptom| symptom.to_lowercase().contains(&needle))
                    .collect()
            }
            None => table.vocabulary().iter().collect(),
        };

        Ok(SymptomListing {
            filtered_count: filtered.len(),
            symptoms: filtered.into_iter().take(limit).cloned().collect(),
            total_available: table.vocabulary().len(),
            search_term: search.map(str::to_string),
        })
    }

    /// Disorders sorted by name, optionally filtered by a case-insensitive substring.
    pub fn diseases(&self, params: &ListingParams) -> Result<DiseaseListing, DiagnosisError> {
        let limit = params.validated_limit()?;
        let table = self.store.snapshot()?;
        let search = params.search_term();
        let needle = search.map(str::to_lowercase);

        let mut filtered: Vec<DisorderSummary> = table
            .disorders()
            .iter()
            .filter(|disorder| match &needle {
                Some(needle) => disorder.name.to_lowercase().contains(needle),
                None => true,
            })
            .map(|disorder| DisorderSummary {
                disorder_name: disorder.name.clone(),
                orpha_code: disorder.orpha_code.clone(),
                symptom_count: disorder.symptom_count,
            })
            .collect();
        filtered.sort_by(|a, b| {
            a.disorder_name
                .cmp(&b.disorder_name)
                .then_with(|| a.orpha_code.cmp(&b.orpha_code))
        });

        let filtered_count = filtered.len();
        filtered.truncate(limit);

        Ok(DiseaseListing {
            diseases: filtered,
            total_available: table.disorders().len(),
            filtered_count,
            search_term: search.map(str::to_string),
        })
    }

    pub fn info(&self) -> Result<SystemInfo, DiagnosisError> {
        let (data_source, table) = self.store.resolve()?;
        Ok(SystemInfo::from_table(&table, data_source))
    }
}

/// Error raised by the diagnosis service.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
    #[error("none of the provided symptoms are found in the database")]
    NoValidSymptoms { unrecognized: Vec<String> },
    #[error("association data unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("ranking exceeded its {deadline_ms}ms deadline after {evaluated} candidates")]
    ComputationTimeout { deadline_ms: u64, evaluated: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomListing {
    pub symptoms: Vec<String>,
    pub total_available: usize,
    pub filtered_count: usize,
    pub search_term: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisorderSummary {
    pub disorder_name: String,
    pub orpha_code: String,
    pub symptom_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseListing {
    pub diseases: Vec<DisorderSummary>,
    pub total_available: usize,
    pub filtered_count: usize,
    pub search_term: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemInfo {
    pub total_diseases: usize,
    pub total_symptoms: usize,
    pub total_associations: usize,
    pub api_version: &'static str,
    pub status: &'static str,
    pub data_source: DataSourceKind,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

impl SystemInfo {
    fn from_table(table: &AssociationTable, data_source: DataSourceKind) -> Self {
        let stats = table.stats();
        Self {
            total_diseases: stats.disorders,
            total_symptoms: stats.symptoms,
            total_associations: stats.associations,
            api_version: env!("CARGO_PKG_VERSION"),
            status: "operational",
            data_source,
            source: table.source().to_string(),
            loaded_at: table.loaded_at(),
        }
    }
}
