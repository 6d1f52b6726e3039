//! Core types for TestForge

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Current time at the millisecond precision the store keeps
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Source language of a generated script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    JavaScript,
    Python,
    Solidity,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::JavaScript, Language::Python, Language::Solidity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::Python => "Python",
            Language::Solidity => "Solidity",
        }
    }

    /// Only JavaScript scripts can be handed to a runner.
    pub fn is_executable(&self) -> bool {
        matches!(self, Language::JavaScript)
    }

    /// File extension used when a script is written to disk
    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::JavaScript => "js",
            Language::Python => "py",
            Language::Solidity => "sol",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Validation(format!(
                    "unknown language '{}', expected one of JavaScript, Python, Solidity",
                    s
                ))
            })
    }
}

/// Kind of test requested from the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestKind {
    Unit,
    Regression,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::Unit => "UNIT",
            TestKind::Regression => "REGRESSION",
        }
    }
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNIT" => Ok(TestKind::Unit),
            "REGRESSION" => Ok(TestKind::Regression),
            _ => Err(Error::Validation(format!(
                "unknown test type '{}', expected UNIT or REGRESSION",
                s
            ))),
        }
    }
}

/// JavaScript test runner a script is executed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Framework {
    Mocha,
    #[default]
    Jest,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Mocha => "Mocha",
            Framework::Jest => "Jest",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mocha" => Ok(Framework::Mocha),
            "jest" => Ok(Framework::Jest),
            _ => Err(Error::Validation(format!(
                "unknown framework '{}', expected Mocha or Jest",
                s
            ))),
        }
    }
}

/// Outcome of one execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Pass,
    Fail,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pass => "PASS",
            TestStatus::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PASS" => Ok(TestStatus::Pass),
            "FAIL" => Ok(TestStatus::Fail),
            _ => Err(Error::Validation(format!("unknown status '{}'", s))),
        }
    }
}

/// A stored test script produced by the completion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedScript {
    pub id: String,
    pub name: String,
    pub description: String,
    pub language: Language,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedScript {
    pub fn new(name: String, description: String, language: Language, code: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            language,
            code,
            created_at: now_millis(),
        }
    }
}

/// A stored outcome of running a script through a runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub id: String,
    /// Id of the script this result belongs to
    #[serde(rename = "testScript")]
    pub script_id: String,
    pub status: TestStatus,
    pub test_type: TestKind,
    /// Milliseconds. Not measured; always 0.
    pub execution_time: f64,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn new(
        script_id: String,
        status: TestStatus,
        test_type: TestKind,
        output: String,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            script_id,
            status,
            test_type,
            execution_time: 0.0,
            output,
            error_message,
            created_at: now_millis(),
        }
    }
}

/// A result with its script reference resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResult {
    #[serde(flatten)]
    pub result: ExecutionResult,
    /// `None` when the referenced script no longer exists
    pub script: Option<GeneratedScript>,
}

/// Script and result produced by one generate-and-run call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub test_script: GeneratedScript,
    pub test_result: ExecutionResult,
}

/// Pass/fail counts for one slice of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: TestStatus, count: u64) {
        self.total += count;
        match status {
            TestStatus::Pass => self.passed += count,
            TestStatus::Fail => self.failed += count,
        }
    }
}

/// Dashboard aggregate over all stored results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStats {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub unit_tests: StatusCounts,
    pub regression_tests: StatusCounts,
    pub average_execution_time: f64,
}
