//! Run Commands

use anyhow::Result;
use clap::Subcommand;
use testforge_common::{ExecutionResult, TestStatus};

use crate::client::ApiClient;
use crate::commands::results::ResultDisplay;
use crate::output::{print_item, print_success, print_warning, OutputFormat};

#[derive(Subcommand)]
pub enum RunCommands {
    /// Generate a script for a URL and run it once
    Generate {
        /// Target URL
        #[arg(short, long)]
        url: String,

        /// Script language (JavaScript, Python, Solidity)
        #[arg(short, long, default_value = "JavaScript")]
        language: String,

        /// UNIT or REGRESSION
        #[arg(short, long)]
        test_type: String,

        /// Mocha or Jest (server default: Jest)
        #[arg(short, long)]
        framework: Option<String>,
    },

    /// Run a stored script again
    Script {
        /// Script ID
        id: String,

        /// UNIT or REGRESSION
        #[arg(short, long)]
        test_type: String,

        /// Mocha or Jest (server default: Jest)
        #[arg(short, long)]
        framework: Option<String>,
    },
}

fn report(result: &ExecutionResult, format: OutputFormat) {
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(result).unwrap_or_default());
        return;
    }

    match result.status {
        TestStatus::Pass => print_success("Test passed"),
        TestStatus::Fail => print_warning("Test failed"),
    }
    print_item(&ResultDisplay::from(result), format);
    if let Some(error) = &result.error_message {
        println!("{}", error);
    }
}

pub async fn execute(cmd: RunCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        RunCommands::Generate {
            url,
            language,
            test_type,
            framework,
        } => {
            let run = client
                .generate_and_run(&url, &language, &test_type, framework.as_deref())
                .await?;
            if matches!(format, OutputFormat::Json) {
                println!("{}", serde_json::to_string_pretty(&run).unwrap_or_default());
            } else {
                print_success(&format!(
                    "Script '{}' stored as {}",
                    run.test_script.name, run.test_script.id
                ));
                report(&run.test_result, format);
            }
        }

        RunCommands::Script {
            id,
            test_type,
            framework,
        } => {
            let result = client
                .run_script(&id, &test_type, framework.as_deref())
                .await?;
            report(&result, format);
        }
    }

    Ok(())
}
