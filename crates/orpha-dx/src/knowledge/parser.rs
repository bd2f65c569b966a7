use super::frequency::FrequencyCategory;
use super::normalizer::normalize_term;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use tracing::{debug, warn};

pub(crate) const REQUIRED_COLUMNS: [&str; 4] =
    ["orpha_code", "disorder_name", "hpo_term", "hpo_frequency"];

/// One clinical sign of one disorder, as flattened by the Orphanet export.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClinicalSignRecord {
    pub(crate) orpha_code: String,
    pub(crate) disorder_name: String,
    pub(crate) symptom: String,
    pub(crate) frequency: FrequencyCategory,
}

#[derive(Debug, Default)]
pub(crate) struct ParsedExport {
    pub(crate) records: Vec<ClinicalSignRecord>,
    pub(crate) rows_read: usize,
    pub(crate) rows_skipped: usize,
}

#[derive(Debug)]
pub(crate) enum ParseError {
    Csv(csv::Error),
    MissingColumn(&'static str),
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<ParsedExport, ParseError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers
            .iter()
            .any(|header| header.trim_start_matches('\u{feff}') == column)
        {
            return Err(ParseError::MissingColumn(column));
        }
    }

    let mut parsed = ParsedExport::default();

    for (index, record) in csv_reader.deserialize::<ClinicalSignRow>().enumerate() {
        parsed.rows_read += 1;
        let line = index + 2;

        let row = match record {
            Ok(row) => row,
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => {
                warn!(line, error = %err, "skipping malformed clinical sign row");
                parsed.rows_skipped += 1;
                continue;
            }
        };

        match row.into_record() {
            Some(record) => parsed.records.push(record),
            None => {
                debug!(line, "skipping clinical sign row with missing identity fields");
                parsed.rows_skipped += 1;
            }
        }
    }

    Ok(parsed)
}

#[derive(Debug, Deserialize)]
struct ClinicalSignRow {
    #[serde(
        alias = "\u{feff}orpha_code",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    orpha_code: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    disorder_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    hpo_term: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    hpo_frequency: Option<String>,
}

impl ClinicalSignRow {
    fn into_record(self) -> Option<ClinicalSignRecord> {
        let orpha_code = normalize_orpha_code(&self.orpha_code?)?;
        let disorder_name = non_empty(normalize_term(&self.disorder_name?))?;
        let symptom = non_empty(normalize_term(&self.hpo_term?))?;
        let frequency = self
            .hpo_frequency
            .as_deref()
            .map(FrequencyCategory::parse)
            .unwrap_or(FrequencyCategory::Unknown);

        Some(ClinicalSignRecord {
            orpha_code,
            disorder_name,
            symptom,
            frequency,
        })
    }
}

/// Spreadsheet round-trips turn `558` into `558.0`; both name the same disorder.
fn normalize_orpha_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let code = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if code.is_empty() || code.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(code.to_string())
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(value)
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
