//! Orphanet clinical-sign ingestion and the association table the ranking
//! engine reads from.

mod frequency;
pub(crate) mod normalizer;
mod parser;
pub mod store;
mod table;

pub use frequency::{frequency_weight, FrequencyCategory};
pub use store::{
    AssociationStore, CsvFileStore, DataSourceKind, InMemoryStore, SourceChain, StoreError,
};
pub use table::{
    Association, AssociationTable, AssociationTableBuilder, Disorder, DisorderId, TableStats,
};

use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum KnowledgeLoadError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingColumn(&'static str),
    Empty { rows_read: usize },
}

impl std::fmt::Display for KnowledgeLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KnowledgeLoadError::Io(err) => write!(f, "failed to read clinical sign export: {}", err),
            KnowledgeLoadError::Csv(err) => write!(f, "invalid clinical sign CSV data: {}", err),
            KnowledgeLoadError::MissingColumn(column) => {
                write!(f, "clinical sign export is missing the '{}' column", column)
            }
            KnowledgeLoadError::Empty { rows_read } => write!(
                f,
                "clinical sign export contained no usable associations ({} rows read)",
                rows_read
            ),
        }
    }
}

impl std::error::Error for KnowledgeLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KnowledgeLoadError::Io(err) => Some(err),
            KnowledgeLoadError::Csv(err) => Some(err),
            KnowledgeLoadError::MissingColumn(_) | KnowledgeLoadError::Empty { .. } => None,
        }
    }
}

impl From<std::io::Error> for KnowledgeLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for KnowledgeLoadError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<parser::ParseError> for KnowledgeLoadError {
    fn from(err: parser::ParseError) -> Self {
        match err {
            parser::ParseError::Csv(err) => Self::Csv(err),
            parser::ParseError::MissingColumn(column) => Self::MissingColumn(column),
        }
    }
}

/// Counters describing one ingestion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicates: usize,
    pub disorders: usize,
    pub symptoms: usize,
    pub associations: usize,
}

/// Builds an [`AssociationTable`] from the flattened clinical-sign CSV export.
pub struct KnowledgeImporter;

impl KnowledgeImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(AssociationTable, LoadReport), KnowledgeLoadError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, path.display().to_string())
    }

    pub fn from_reader<R: Read>(
        reader: R,
        source: impl Into<String>,
    ) -> Result<(AssociationTable, LoadReport), KnowledgeLoadError> {
        let source = source.into();
        let parsed = parser::parse_records(reader)?;

        let mut builder = AssociationTable::builder(source.clone());
        for record in &parsed.records {
            builder.insert_record(record);
        }
        let duplicates = builder.duplicates();
        let table = builder.build();

        if table.is_empty() {
            return Err(KnowledgeLoadError::Empty {
                rows_read: parsed.rows_read,
            });
        }

        let stats = table.stats();
        let report = LoadReport {
            rows_read: parsed.rows_read,
            rows_skipped: parsed.rows_skipped,
            duplicates,
            disorders: stats.disorders,
            symptoms: stats.symptoms,
            associations: stats.associations,
        };

        info!(
            %source,
            rows = report.rows_read,
            skipped = report.rows_skipped,
            duplicates = report.duplicates,
            disorders = report.disorders,
            symptoms = report.symptoms,
            "loaded clinical sign associations"
        );

        Ok((table, report))
    }
}
