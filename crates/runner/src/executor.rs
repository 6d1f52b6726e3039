//! Runs materialized scripts through Mocha or Jest

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use testforge_common::{Error, Framework, Language, Result, TestStatus};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::materialize::{cleanup, Materializer};

/// Executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Directory materialized scripts are written to
    pub scratch_dir: PathBuf,

    /// Working directory for runner processes (where `node_modules` lives).
    /// Defaults to the server's own working directory.
    pub working_dir: Option<PathBuf>,

    /// Program and leading arguments used to invoke Mocha
    pub mocha_command: Vec<String>,

    /// Program and leading arguments used to invoke Jest
    pub jest_command: Vec<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            scratch_dir: testforge_common::default_scratch_dir(),
            working_dir: None,
            mocha_command: vec!["yarn".to_string(), "mocha".to_string()],
            jest_command: vec!["yarn".to_string(), "jest".to_string()],
        }
    }
}

impl ExecutorConfig {
    fn command_for(&self, framework: Framework) -> &[String] {
        match framework {
            Framework::Mocha => &self.mocha_command,
            Framework::Jest => &self.jest_command,
        }
    }
}

/// Arguments asking `framework` for a JSON summary on stdout
fn report_args(framework: Framework) -> &'static [&'static str] {
    match framework {
        Framework::Mocha => &["--reporter", "json"],
        Framework::Jest => &["--json"],
    }
}

/// Result of one execution attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub output: String,
    pub status: TestStatus,
    pub error_message: Option<String>,
}

impl ExecutionOutcome {
    fn failed(output: String, error_message: String) -> Self {
        Self {
            output,
            status: TestStatus::Fail,
            error_message: Some(error_message),
        }
    }
}

/// Pull the failure count out of a runner's JSON summary.
///
/// Runners invoked through a package manager may wrap the JSON in banner
/// lines, so the outermost `{...}` span is tried when the whole text is not JSON.
pub fn parse_summary(framework: Framework, stdout: &str) -> std::result::Result<TestStatus, String> {
    let summary: serde_json::Value = match serde_json::from_str(stdout.trim()) {
        Ok(v) => v,
        Err(e) => {
            let span = stdout
                .find('{')
                .zip(stdout.rfind('}'))
                .filter(|(start, end)| start < end)
                .map(|(start, end)| &stdout[start..=end]);
            match span.and_then(|s| serde_json::from_str(s).ok()) {
                Some(v) => v,
                None => return Err(format!("unparsable {} summary: {}", framework, e)),
            }
        }
    };

    let failures = match framework {
        Framework::Mocha => summary
            .get("failures")
            .and_then(|v| v.as_u64())
            // the reporter emits `failures` as an array of failed tests
            .or_else(|| summary.pointer("/stats/failures").and_then(|v| v.as_u64())),
        Framework::Jest => summary.get("numFailedTests").and_then(|v| v.as_u64()),
    };

    match failures {
        Some(0) => Ok(TestStatus::Pass),
        Some(_) => Ok(TestStatus::Fail),
        None => Err(format!("{} summary has no failure count", framework)),
    }
}

/// Materializes scripts and runs them through the configured runner
#[derive(Debug, Clone)]
pub struct Executor {
    config: ExecutorConfig,
    materializer: Materializer,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        let materializer = Materializer::new(config.scratch_dir.clone());
        Self {
            config,
            materializer,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute `source` once and report the outcome.
    ///
    /// Runner problems and unsupported languages become FAIL outcomes; only
    /// scratch-file I/O errors are returned as `Err`.
    pub async fn execute(
        &self,
        source: &str,
        language: Language,
        framework: Framework,
    ) -> Result<ExecutionOutcome> {
        if !language.is_executable() {
            let err = Error::UnsupportedLanguage(language.to_string());
            info!("Skipping execution: {}", err);
            return Ok(ExecutionOutcome::failed(String::new(), err.to_string()));
        }

        let path = self.materializer.materialize(source, language, framework).await?;
        let outcome = self.run_file(&path, framework).await;
        cleanup(&path).await;

        Ok(outcome)
    }

    /// Run an already materialized file. The file is left in place.
    pub async fn run_file(&self, path: &Path, framework: Framework) -> ExecutionOutcome {
        let Some((program, leading)) = self.config.command_for(framework).split_first() else {
            return ExecutionOutcome::failed(
                String::new(),
                format!("no command configured for {}", framework),
            );
        };

        let mut cmd = Command::new(program);
        cmd.args(leading)
            .arg(path)
            .args(report_args(framework))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        debug!("Running {} against {}", framework, path.display());

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                error!("Failed to spawn {}: {}", program, e);
                return ExecutionOutcome::failed(
                    String::new(),
                    format!("failed to spawn {}: {}", program, e),
                );
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("{} exited with {}", program, output.status)
            } else {
                stderr
            };
            error!("Test execution error: {}", message);
            return ExecutionOutcome::failed(stdout, message);
        }

        match parse_summary(framework, &stdout) {
            Ok(status) => {
                info!("{} reported {}", framework, status);
                ExecutionOutcome {
                    output: stdout,
                    status,
                    error_message: None,
                }
            }
            Err(message) => {
                error!("Test execution error: {}", message);
                ExecutionOutcome::failed(stdout, message)
            }
        }
    }
}
