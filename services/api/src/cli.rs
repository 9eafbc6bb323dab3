use crate::commands::{run_import, run_seed, ImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use curriculum::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Curriculum Resource Portal",
    about = "Serve the curriculum portal, seed its taxonomy, and bulk-import learning materials",
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
    /// Classify and import every PDF in a directory
    Import(ImportArgs),
    /// Create the standard levels, grades, categories, pathways and resource types
    Seed,
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
        Command::Import(args) => run_import(args),
        Command::Seed => run_seed(),
    }
}
