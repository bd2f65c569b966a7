mod cli;
mod console;
mod infra;
mod routes;
mod server;

use orpha_dx::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
