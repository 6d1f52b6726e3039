//! TestForge CLI - Main Entry Point
//!
//! Generate, run and review LLM-written test scripts from the terminal.

use clap::{Parser, Subcommand};

use testforge_cli::client::ApiClient;
use testforge_cli::commands::{results, run, scripts, stats};
use testforge_cli::output::{self, print_error, print_success};

/// TestForge CLI - LLM-generated tests for web pages
#[derive(Parser)]
#[command(name = "testforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Server address
    #[arg(long, default_value = "http://127.0.0.1:5000", env = "TESTFORGE_SERVER", global = true)]
    server: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage generated scripts
    #[command(subcommand)]
    Scripts(scripts::ScriptCommands),

    /// Generate and run tests
    #[command(subcommand)]
    Run(run::RunCommands),

    /// Review and export results
    #[command(subcommand)]
    Results(results::ResultCommands),

    /// Show aggregate pass/fail counts
    Stats,

    /// Check server status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = ApiClient::new(&cli.server);

    let outcome = match cli.command {
        Commands::Scripts(cmd) => scripts::execute(cmd, client, cli.format).await,
        Commands::Run(cmd) => run::execute(cmd, client, cli.format).await,
        Commands::Results(cmd) => results::execute(cmd, client, cli.format).await,
        Commands::Stats => stats::execute(client, cli.format).await,
        Commands::Status => {
            if client.health_check().await {
                print_success(&format!("Server is running at {}", cli.server));
                Ok(())
            } else {
                print_error(&format!("Server is not responding at {}", cli.server));
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = outcome {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
