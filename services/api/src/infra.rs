use metrics_exporter_prometheus::PrometheusHandle;
use orpha_dx::config::DataConfig;
use orpha_dx::knowledge::{CsvFileStore, DataSourceKind, InMemoryStore, SourceChain};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    /// Target of `POST /upload-data`; consulted before the CSV files.
    pub(crate) uploads: Arc<InMemoryStore>,
    pub(crate) sources: SourceChain,
}

/// Uploaded data first, then the primary export, then the bundled fallback.
pub(crate) fn build_sources(data: &DataConfig) -> (Arc<InMemoryStore>, SourceChain) {
    let uploads = Arc::new(InMemoryStore::new(DataSourceKind::Cached));
    let chain = SourceChain::new()
        .with_source(uploads.clone())
        .with_source(Arc::new(CsvFileStore::new(
            DataSourceKind::Primary,
            data.primary.clone(),
        )))
        .with_source(Arc::new(CsvFileStore::new(
            DataSourceKind::Fallback,
            data.fallback.clone(),
        )));
    (uploads, chain)
}
