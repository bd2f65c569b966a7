use crate::infra::build_sources;
use clap::Args;
use orpha_dx::config::AppConfig;
use orpha_dx::diagnosis::{
    ComputationMode, DiagnosisRequest, DiagnosisService, ListingParams, Ranking, SymptomListing,
    DEFAULT_TOP_N,
};
use orpha_dx::error::AppError;
use orpha_dx::knowledge::{CsvFileStore, DataSourceKind, SourceChain};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DiagnoseArgs {
    /// Clinical sign CSV export. Defaults to the configured data paths.
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Observed symptoms (HPO terms)
    #[arg(long, required = true, num_args = 1..)]
    pub(crate) present: Vec<String>,
    /// Symptoms confirmed absent
    #[arg(long, num_args = 1..)]
    pub(crate) absent: Vec<String>,
    /// Number of disorders to report (1-50)
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub(crate) top_n: usize,
    /// Ranking strategy: fast or true
    #[arg(long, default_value = "fast", value_parser = parse_mode)]
    pub(crate) mode: ComputationMode,
    /// Print the raw JSON ranking instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SymptomsArgs {
    /// Clinical sign CSV export. Defaults to the configured data paths.
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Case-insensitive substring filter
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Maximum number of symptoms to print
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

fn parse_mode(raw: &str) -> Result<ComputationMode, String> {
    ComputationMode::parse(raw).ok_or_else(|| format!("unknown mode '{raw}', expected fast or true"))
}

fn load_service(data: Option<PathBuf>) -> Result<DiagnosisService<SourceChain>, AppError> {
    let config = AppConfig::load()?;
    let sources = match data {
        Some(path) => SourceChain::new().with_source(Arc::new(CsvFileStore::new(
            DataSourceKind::Primary,
            path,
        ))),
        None => build_sources(&config.data).1,
    };
    Ok(DiagnosisService::new(Arc::new(sources), config.ranking))
}

pub(crate) fn run_diagnose(args: DiagnoseArgs) -> Result<(), AppError> {
    let DiagnoseArgs {
        data,
        present,
        absent,
        top_n,
        mode,
        json,
    } = args;

    let service = load_service(data)?;
    let ranking = service.diagnose(DiagnosisRequest {
        present_symptoms: present,
        absent_symptoms: absent,
        top_n,
        computation_mode: mode,
    })?;

    if json {
        match serde_json::to_string_pretty(&ranking) {
            Ok(payload) => println!("{}", payload),
            Err(err) => println!("Ranking payload unavailable: {}", err),
        }
    } else {
        render_ranking(&ranking);
    }
    Ok(())
}

pub(crate) fn run_symptoms(args: SymptomsArgs) -> Result<(), AppError> {
    let SymptomsArgs {
        data,
        search,
        limit,
    } = args;

    let service = load_service(data)?;
    let listing = service.symptoms(&ListingParams { search, limit })?;
    render_symptoms(&listing);
    Ok(())
}

fn render_ranking(ranking: &Ranking) {
    println!(
        "Ranking ({} mode) for: {}",
        ranking.computation_mode,
        ranking.input_symptoms.join(", ")
    );
    if !ranking.unrecognized_symptoms.is_empty() {
        println!(
            "- Ignored unrecognized symptoms: {}",
            ranking.unrecognized_symptoms.join(", ")
        );
    }
    println!(
        "- {} disorders evaluated in {:.1} ms",
        ranking.total_diseases_evaluated, ranking.processing_time_ms
    );

    if ranking.results.is_empty() {
        println!("No disorder matches the given symptoms");
        return;
    }
    for (rank, candidate) in ranking.results.iter().enumerate() {
        println!(
            "{:>2}. {} (ORPHA:{}) | p={:.4} | confidence {:.0}% | {}/{} signs matched",
            rank + 1,
            candidate.disorder_name,
            candidate.orpha_code,
            candidate.probability,
            candidate.confidence_score * 100.0,
            candidate.matching_symptoms.len(),
            candidate.total_symptoms
        );
        println!("    matched: {}", candidate.matching_symptoms.join(", "));
    }
}

fn render_symptoms(listing: &SymptomListing) {
    match &listing.search_term {
        Some(term) => println!(
            "{} of {} symptoms match '{}'",
            listing.filtered_count, listing.total_available, term
        ),
        None => println!("{} symptoms known", listing.total_available),
    }
    for symptom in &listing.symptoms {
        println!("  - {}", symptom);
    }
    if listing.symptoms.len() < listing.filtered_count {
        println!(
            "  ... {} more (raise --limit to see them)",
            listing.filtered_count - listing.symptoms.len()
        );
    }
}
