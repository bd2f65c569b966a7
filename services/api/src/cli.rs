use crate::console::{run_diagnose, run_symptoms, DiagnoseArgs, SymptomsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use orpha_dx::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Orpha DX",
    about = "Rank rare disorders from clinical signs over the Orphanet association export",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rank disorders for a set of present and absent symptoms
    Diagnose(DiagnoseArgs),
    /// List the known symptom vocabulary
    Symptoms(SymptomsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Diagnose(args) => run_diagnose(args),
        Command::Symptoms(args) => run_symptoms(args),
    }
}
