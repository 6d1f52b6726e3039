//! Result filtering and CSV/JSON export

use clap::ValueEnum;
use serde::Serialize;
use testforge_common::{ExecutionResult, ResolvedResult, TestKind, TestStatus};

/// Result filter, as offered on the results dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ResultFilter {
    #[default]
    All,
    Pass,
    Fail,
    Unit,
    Regression,
}

impl ResultFilter {
    pub fn matches(&self, result: &ExecutionResult) -> bool {
        match self {
            ResultFilter::All => true,
            ResultFilter::Pass => result.status == TestStatus::Pass,
            ResultFilter::Fail => result.status == TestStatus::Fail,
            ResultFilter::Unit => result.test_type == TestKind::Unit,
            ResultFilter::Regression => result.test_type == TestKind::Regression,
        }
    }

    pub fn apply(&self, results: Vec<ResolvedResult>) -> Vec<ResolvedResult> {
        results
            .into_iter()
            .filter(|r| self.matches(&r.result))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// One exported result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub test_name: String,
    pub status: TestStatus,
    pub test_type: TestKind,
    pub execution_time: f64,
    pub date: String,
}

impl From<&ResolvedResult> for ExportRow {
    fn from(r: &ResolvedResult) -> Self {
        Self {
            test_name: r
                .script
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            status: r.result.status,
            test_type: r.result.test_type,
            execution_time: r.result.execution_time,
            date: r.result.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

const CSV_HEADER: &str = "testName,status,testType,executionTime,date";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render `rows` in `format`
pub fn render(rows: &[ExportRow], format: ExportFormat) -> anyhow::Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        ExportFormat::Csv => {
            let mut out = String::from(CSV_HEADER);
            for row in rows {
                out.push('\n');
                out.push_str(
                    &[
                        csv_field(&row.test_name),
                        row.status.to_string(),
                        row.test_type.to_string(),
                        row.execution_time.to_string(),
                        row.date.clone(),
                    ]
                    .join(","),
                );
            }
            Ok(out)
        }
    }
}
