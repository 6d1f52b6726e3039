//! Result Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;
use testforge_common::{ExecutionResult, ResolvedResult};

use crate::client::ApiClient;
use crate::export::{render, ExportFormat, ExportRow, ResultFilter};
use crate::output::{print_list, print_success, status_label, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum ResultCommands {
    /// List results, newest first
    List {
        #[arg(long, value_enum, default_value_t = ResultFilter::All)]
        filter: ResultFilter,

        /// Only results of this script
        #[arg(long)]
        script: Option<String>,
    },

    /// Export results as CSV or JSON
    Export {
        /// csv or json
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        to: ExportFormat,

        #[arg(long, value_enum, default_value_t = ResultFilter::All)]
        filter: ResultFilter,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Result display wrapper for serialization
#[derive(Serialize)]
pub struct ResultDisplay {
    pub id: String,
    pub script: String,
    pub status: String,
    pub test_type: String,
    pub error: String,
    pub created_at: String,
}

impl From<&ExecutionResult> for ResultDisplay {
    fn from(result: &ExecutionResult) -> Self {
        Self {
            id: result.id.clone(),
            script: result.script_id.clone(),
            status: result.status.to_string(),
            test_type: result.test_type.to_string(),
            error: result.error_message.clone().unwrap_or_default(),
            created_at: result.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&ResolvedResult> for ResultDisplay {
    fn from(r: &ResolvedResult) -> Self {
        let mut display = ResultDisplay::from(&r.result);
        if let Some(script) = &r.script {
            display.script = script.name.clone();
        }
        display
    }
}

impl TableDisplay for ResultDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Script", "Status", "Type", "Error", "Created"]
    }

    fn row(&self) -> Vec<String> {
        let status = match self.status.parse() {
            Ok(status) => status_label(status),
            Err(_) => self.status.clone(),
        };
        let error = match self.error.lines().next() {
            Some(line) if line.chars().count() > 60 => {
                format!("{}...", line.chars().take(57).collect::<String>())
            }
            Some(line) => line.to_string(),
            None => String::new(),
        };

        vec![
            self.id.clone(),
            self.script.clone(),
            status,
            self.test_type.clone(),
            error,
            self.created_at.clone(),
        ]
    }
}

pub async fn execute(cmd: ResultCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        ResultCommands::List { filter, script } => {
            let results = filter.apply(client.list_results(script.as_deref()).await?);
            let displays: Vec<ResultDisplay> = results.iter().map(ResultDisplay::from).collect();
            print_list(&displays, format);
        }

        ResultCommands::Export { to, filter, output } => {
            let results = filter.apply(client.list_results(None).await?);
            let rows: Vec<ExportRow> = results.iter().map(ExportRow::from).collect();
            let content = render(&rows, to)?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, content).await?;
                    print_success(&format!(
                        "Exported {} results to {}",
                        rows.len(),
                        path.display()
                    ));
                }
                None => println!("{}", content),
            }
        }
    }

    Ok(())
}
