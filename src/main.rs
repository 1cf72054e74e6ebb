use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use fundsim::api::ProjectArgs;
use fundsim::log::init_logging;

#[derive(Parser)]
#[command(
    name = "fundsim",
    version,
    about = "Monthly deposit fund growth simulator with market shock events"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web UI and JSON API
    Serve {
        #[arg(long, env = "FUNDSIM_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Run one projection and print it as JSON
    Project(ProjectArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve { port } => fundsim::api::run_http_server(port)
            .await
            .with_context(|| format!("HTTP server on port {port} failed")),
        Commands::Project(args) => {
            let json = fundsim::api::project_json(args).map_err(|e| anyhow!(e))?;
            println!("{json}");
            Ok(())
        }
    }
}
