//! Script Commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use testforge_common::GeneratedScript;

use crate::client::ApiClient;
use crate::output::{print_item, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum ScriptCommands {
    /// List stored scripts, newest first
    List,

    /// Show one script, including its source
    Get {
        /// Script ID
        id: String,
    },

    /// Generate and store a script without running it
    Generate {
        /// Target URL
        #[arg(short, long)]
        url: String,

        /// Script language (JavaScript, Python, Solidity)
        #[arg(short, long, default_value = "JavaScript")]
        language: String,
    },
}

/// Script display wrapper for serialization
#[derive(Serialize)]
pub struct ScriptDisplay {
    pub id: String,
    pub name: String,
    pub language: String,
    pub created_at: String,
}

impl From<&GeneratedScript> for ScriptDisplay {
    fn from(script: &GeneratedScript) -> Self {
        Self {
            id: script.id.clone(),
            name: script.name.clone(),
            language: script.language.to_string(),
            created_at: script.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl TableDisplay for ScriptDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Name", "Language", "Created"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.language.clone(),
            self.created_at.clone(),
        ]
    }
}

fn print_script(script: &GeneratedScript, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(script).unwrap_or_default());
        }
        _ => {
            print_item(&ScriptDisplay::from(script), format);
            println!("{}", script.description);
            println!();
            println!("{}", script.code);
        }
    }
}

pub async fn execute(cmd: ScriptCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        ScriptCommands::List => {
            let scripts = client.list_scripts().await?;
            let displays: Vec<ScriptDisplay> = scripts.iter().map(ScriptDisplay::from).collect();
            print_list(&displays, format);
        }

        ScriptCommands::Get { id } => {
            let script = client.get_script(&id).await?;
            print_script(&script, format);
        }

        ScriptCommands::Generate { url, language } => {
            let script = client.generate_script(&url, &language).await?;
            print_success(&format!("Script '{}' generated", script.name));
            print_script(&script, format);
        }
    }

    Ok(())
}
