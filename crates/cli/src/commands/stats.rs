//! Stats Command

use anyhow::Result;
use serde::Serialize;
use testforge_common::{ResultStats, StatusCounts};

use crate::client::ApiClient;
use crate::output::{print_list, OutputFormat, TableDisplay};

/// One line of the stats table
#[derive(Serialize)]
pub struct StatsRow {
    pub scope: &'static str,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
}

impl StatsRow {
    fn new(scope: &'static str, counts: StatusCounts) -> Self {
        Self {
            scope,
            total: counts.total,
            passed: counts.passed,
            failed: counts.failed,
        }
    }

    fn pass_rate(&self) -> String {
        if self.total == 0 {
            "-".to_string()
        } else {
            format!("{:.1}%", self.passed as f64 * 100.0 / self.total as f64)
        }
    }
}

impl TableDisplay for StatsRow {
    fn headers() -> Vec<&'static str> {
        vec!["Scope", "Total", "Passed", "Failed", "Pass rate"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.scope.to_string(),
            self.total.to_string(),
            self.passed.to_string(),
            self.failed.to_string(),
            self.pass_rate(),
        ]
    }
}

pub fn rows(stats: &ResultStats) -> Vec<StatsRow> {
    vec![
        StatsRow::new(
            "all",
            StatusCounts {
                total: stats.total,
                passed: stats.passed,
                failed: stats.failed,
            },
        ),
        StatsRow::new("unit", stats.unit_tests),
        StatsRow::new("regression", stats.regression_tests),
    ]
}

pub async fn execute(client: ApiClient, format: OutputFormat) -> Result<()> {
    let stats = client.stats().await?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_list(&rows(&stats), format);
    println!("Average execution time: {} ms", stats.average_execution_time);
    Ok(())
}
