//! Result recorder

use testforge_common::{Database, ExecutionResult, Result, TestKind};
use tracing::info;

use crate::executor::ExecutionOutcome;

/// Appends one `ExecutionResult` per execution attempt
#[derive(Clone)]
pub struct ResultRecorder {
    db: Database,
}

impl ResultRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Persist `outcome` for `script_id`. Duration is not measured and is
    /// recorded as 0.
    pub fn record(
        &self,
        script_id: &str,
        outcome: &ExecutionOutcome,
        test_type: TestKind,
    ) -> Result<ExecutionResult> {
        let result = ExecutionResult::new(
            script_id.to_string(),
            outcome.status,
            test_type,
            outcome.output.clone(),
            outcome.error_message.clone(),
        );
        self.db.insert_result(&result)?;

        info!(
            "Recorded {} {} result {} for script {}",
            test_type, result.status, result.id, script_id
        );
        Ok(result)
    }
}
