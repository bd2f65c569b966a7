use super::table::{Association, AssociationTable};
use super::{KnowledgeImporter, KnowledgeLoadError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Role a source plays in the ordered lookup performed by [`SourceChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Primary,
    Cached,
    Fallback,
}

impl DataSourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Cached => "cached",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error enumeration for association sources.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} source has no association data loaded")]
    Empty { kind: DataSourceKind },
    #[error("{kind} source unavailable: {reason}")]
    Unavailable {
        kind: DataSourceKind,
        reason: String,
    },
    #[error("{kind} source failed to load: {source}")]
    Load {
        kind: DataSourceKind,
        #[source]
        source: KnowledgeLoadError,
    },
    #[error("no association source could be read ({attempts} attempted)")]
    Exhausted { attempts: usize },
}

/// Read access to disorder/symptom associations.
///
/// Implementations hand out whole immutable snapshots so a ranking call sees a
/// single consistent table even if the store is refreshed mid-request.
pub trait AssociationStore: Send + Sync {
    fn kind(&self) -> DataSourceKind;

    fn snapshot(&self) -> Result<Arc<AssociationTable>, StoreError>;

    /// Snapshot together with the kind of source that produced it.
    fn resolve(&self) -> Result<(DataSourceKind, Arc<AssociationTable>), StoreError> {
        Ok((self.kind(), self.snapshot()?))
    }

    /// Associations touching any of `symptoms`, grouped by symptom in set
    /// order and read through the symptom index.
    fn fetch(&self, symptoms: &BTreeSet<String>) -> Result<Vec<Association>, StoreError> {
        let table = self.snapshot()?;
        Ok(symptoms
            .iter()
            .flat_map(|symptom| table.records_for_symptom(symptom))
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<Association>, StoreError> {
        Ok(self.snapshot()?.all_records().to_vec())
    }
}

/// Holds a snapshot in memory. Refreshing swaps the whole `Arc`, never the
/// table contents.
pub struct InMemoryStore {
    kind: DataSourceKind,
    table: RwLock<Option<Arc<AssociationTable>>>,
}

impl InMemoryStore {
    pub fn new(kind: DataSourceKind) -> Self {
        Self {
            kind,
            table: RwLock::new(None),
        }
    }

    pub fn with_table(kind: DataSourceKind, table: AssociationTable) -> Self {
        Self {
            kind,
            table: RwLock::new(Some(Arc::new(table))),
        }
    }

    /// Install a new snapshot, returning the previous one.
    pub fn replace(
        &self,
        table: AssociationTable,
    ) -> Result<Option<Arc<AssociationTable>>, StoreError> {
        let mut guard = self.table.write().map_err(|_| self.poisoned())?;
        Ok(guard.replace(Arc::new(table)))
    }

    pub fn is_loaded(&self) -> bool {
        self.table
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn poisoned(&self) -> StoreError {
        StoreError::Unavailable {
            kind: self.kind,
            reason: "snapshot lock poisoned".to_string(),
        }
    }
}

impl AssociationStore for InMemoryStore {
    fn kind(&self) -> DataSourceKind {
        self.kind
    }

    fn snapshot(&self) -> Result<Arc<AssociationTable>, StoreError> {
        let guard = self.table.read().map_err(|_| self.poisoned())?;
        guard
            .as_ref()
            .cloned()
            .ok_or(StoreError::Empty { kind: self.kind })
    }
}

/// Lazily loads a clinical-sign CSV export and keeps the resulting snapshot
/// until [`CsvFileStore::reload`] is called.
///
/// A file that exists but fails to parse is not re-read on every snapshot:
/// the failure is remembered and reported as `Unavailable` until `reload`.
pub struct CsvFileStore {
    path: PathBuf,
    cache: InMemoryStore,
    failure: RwLock<Option<String>>,
}

impl CsvFileStore {
    pub fn new(kind: DataSourceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: InMemoryStore::new(kind),
            failure: RwLock::new(None),
        }
    }

    /// Re-read the export and swap it in, forgetting any earlier load
    /// failure. On failure the previous snapshot stays in place.
    pub fn reload(&self) -> Result<Arc<AssociationTable>, StoreError> {
        self.failure
            .write()
            .map_err(|_| self.cache.poisoned())?
            .take();
        self.load()
    }

    fn load(&self) -> Result<Arc<AssociationTable>, StoreError> {
        let kind = self.cache.kind;
        if !self.path.exists() {
            return Err(StoreError::Unavailable {
                kind,
                reason: format!("{} does not exist", self.path.display()),
            });
        }

        let (table, _report) = match KnowledgeImporter::from_path(&self.path) {
            Ok(loaded) => loaded,
            Err(source) => {
                warn!(
                    %kind,
                    path = %self.path.display(),
                    error = %source,
                    "clinical sign export rejected"
                );
                let mut failure = self.failure.write().map_err(|_| self.cache.poisoned())?;
                *failure = Some(source.to_string());
                return Err(StoreError::Load { kind, source });
            }
        };
        self.cache.replace(table)?;
        self.cache.snapshot()
    }

    fn previous_failure(&self) -> Result<Option<String>, StoreError> {
        let guard = self.failure.read().map_err(|_| self.cache.poisoned())?;
        Ok(guard.clone())
    }
}

impl AssociationStore for CsvFileStore {
    fn kind(&self) -> DataSourceKind {
        self.cache.kind
    }

    fn snapshot(&self) -> Result<Arc<AssociationTable>, StoreError> {
        match self.cache.snapshot() {
            Ok(table) => Ok(table),
            Err(StoreError::Empty { kind }) => match self.previous_failure()? {
                Some(reason) => Err(StoreError::Unavailable {
                    kind,
                    reason: format!("previous load failed: {reason}"),
                }),
                None => self.load(),
            },
            Err(err) => Err(err),
        }
    }
}

/// Ordered list of sources; the first one able to produce a snapshot wins.
#[derive(Clone, Default)]
pub struct SourceChain {
    sources: Vec<Arc<dyn AssociationStore>>,
}

impl SourceChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Arc<dyn AssociationStore>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn kinds(&self) -> Vec<DataSourceKind> {
        self.sources.iter().map(|source| source.kind()).collect()
    }

    /// Resolve once and log the outcome. Called at startup so the first
    /// request does not pay the ingestion cost.
    pub fn warm(&self) -> Option<DataSourceKind> {
        match self.resolve() {
            Ok((kind, table)) => {
                let stats = table.stats();
                info!(
                    %kind,
                    source = table.source(),
                    disorders = stats.disorders,
                    symptoms = stats.symptoms,
                    associations = stats.associations,
                    "association table ready"
                );
                Some(kind)
            }
            Err(err) => {
                warn!(error = %err, "no association data available at startup");
                None
            }
        }
    }
}

impl AssociationStore for SourceChain {
    fn kind(&self) -> DataSourceKind {
        self.sources
            .first()
            .map(|source| source.kind())
            .unwrap_or(DataSourceKind::Primary)
    }

    fn snapshot(&self) -> Result<Arc<AssociationTable>, StoreError> {
        self.resolve().map(|(_, table)| table)
    }

    /// Snapshot from the first healthy source.
    fn resolve(&self) -> Result<(DataSourceKind, Arc<AssociationTable>), StoreError> {
        for source in &self.sources {
            let kind = source.kind();
            match source.snapshot() {
                Ok(table) => {
                    debug!(%kind, source = table.source(), "association source selected");
                    return Ok((kind, table));
                }
                Err(StoreError::Empty { .. }) => {
                    debug!(%kind, "association source empty, trying next");
                }
                Err(err) => {
                    warn!(%kind, error = %err, "association source failed, trying next");
                }
            }
        }

        Err(StoreError::Exhausted {
            attempts: self.sources.len(),
        })
    }
}
