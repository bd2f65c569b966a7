use crate::knowledge::normalizer::normalize_term;
use crate::knowledge::AssociationTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const MIN_TOP_N: usize = 1;
pub const MAX_TOP_N: usize = 50;
pub const DEFAULT_TOP_N: usize = 10;

/// Ranking strategy, chosen explicitly by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputationMode {
    /// Additive weighted aggregation over the symptom index.
    #[default]
    Fast,
    /// Normalized Bayesian posterior over a bounded candidate set.
    True,
}

impl ComputationMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::True => "true",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(Self::Fast),
            "true" => Some(Self::True),
            _ => None,
        }
    }
}

impl fmt::Display for ComputationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Wire payload for `POST /diagnose`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    pub present_symptoms: Vec<String>,
    #[serde(default)]
    pub absent_symptoms: Vec<String>,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub computation_mode: ComputationMode,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl DiagnosisRequest {
    pub fn new(present_symptoms: Vec<String>, computation_mode: ComputationMode) -> Self {
        Self {
            present_symptoms,
            absent_symptoms: Vec::new(),
            top_n: DEFAULT_TOP_N,
            computation_mode,
        }
    }
}

/// Preconditions rejected before a request reaches the ranking engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("at least one present symptom is required")]
    NoPresentSymptoms,
    #[error("top_n must be between 1 and 50, got {0}")]
    TopNOutOfRange(usize),
    #[error("limit must be between 1 and {max}, got {value}")]
    LimitOutOfRange { value: usize, max: usize },
}

/// A request that passed validation: symptoms normalized and deduplicated in
/// their original order. A symptom listed as both present and absent is kept
/// as present only.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisQuery {
    pub present: Vec<String>,
    pub absent: Vec<String>,
    pub top_n: usize,
    pub mode: ComputationMode,
}

impl DiagnosisQuery {
    pub fn from_request(request: DiagnosisRequest) -> Result<Self, QueryError> {
        if !(MIN_TOP_N..=MAX_TOP_N).contains(&request.top_n) {
            return Err(QueryError::TopNOutOfRange(request.top_n));
        }

        let present = dedup_terms(&request.present_symptoms, &HashSet::new());
        if present.is_empty() {
            return Err(QueryError::NoPresentSymptoms);
        }

        let exclude: HashSet<&str> = present.iter().map(String::as_str).collect();
        let absent = dedup_terms(&request.absent_symptoms, &exclude);

        Ok(Self {
            present,
            absent,
            top_n: request.top_n,
            mode: request.computation_mode,
        })
    }

    /// Split the query against the table vocabulary. Unknown present symptoms
    /// are reported back; unknown absent symptoms are dropped silently.
    pub fn resolve(&self, table: &AssociationTable) -> ResolvedQuery {
        let (present, unrecognized): (Vec<String>, Vec<String>) = self
            .present
            .iter()
            .cloned()
            .partition(|symptom| table.contains_symptom(symptom));

        let absent = self
            .absent
            .iter()
            .filter(|symptom| table.contains_symptom(symptom))
            .cloned()
            .collect();

        ResolvedQuery {
            present,
            absent,
            unrecognized,
            top_n: self.top_n,
            mode: self.mode,
        }
    }
}

fn dedup_terms(raw: &[String], exclude: &HashSet<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|term| normalize_term(term))
        .filter(|term| !term.is_empty() && !exclude.contains(term.as_str()))
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Query restricted to the vocabulary of one table snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub present: Vec<String>,
    pub absent: Vec<String>,
    pub unrecognized: Vec<String>,
    pub top_n: usize,
    pub mode: ComputationMode,
}

impl ResolvedQuery {
    pub fn has_valid_symptoms(&self) -> bool {
        !self.present.is_empty()
    }
}

/// Parameters shared by the vocabulary listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ListingParams {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 10_000;

    pub fn validated_limit(&self) -> Result<usize, QueryError> {
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT);
        if limit == 0 || limit > Self::MAX_LIMIT {
            return Err(QueryError::LimitOutOfRange {
                value: limit,
                max: Self::MAX_LIMIT,
            });
        }
        Ok(limit)
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}
