//! Per-request orchestration of generation, execution and recording

use std::sync::Arc;
use testforge_common::{
    Database, Error, ExecutionResult, Framework, GeneratedScript, Language, Result, RunReport,
    TestKind,
};
use tracing::{info, instrument};

use crate::executor::Executor;
use crate::llm::{CompletionRequest, TestGenerator};
use crate::prompt::PromptRequest;
use crate::recorder::ResultRecorder;

/// Generate and store a script without running it
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub url: String,
    pub language: Language,
}

/// Generate, store, run and record in one call
#[derive(Debug, Clone)]
pub struct GenerateAndRunRequest {
    pub url: String,
    pub language: Language,
    pub test_type: TestKind,
    pub framework: Framework,
}

/// Run a stored script again
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub script_id: String,
    pub test_type: TestKind,
    pub framework: Framework,
}

/// The generation and execution pipeline
pub struct Pipeline {
    db: Database,
    generator: Arc<dyn TestGenerator>,
    executor: Executor,
    recorder: ResultRecorder,
}

impl Pipeline {
    pub fn new(db: Database, generator: Arc<dyn TestGenerator>, executor: Executor) -> Self {
        let recorder = ResultRecorder::new(db.clone());
        Self {
            db,
            generator,
            executor,
            recorder,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.provider_name()
    }

    async fn generate(&self, prompt: PromptRequest<'_>) -> Result<String> {
        let request = CompletionRequest {
            system: prompt.system_prompt().map(String::from),
            prompt: prompt.build(),
        };
        self.generator.complete(&request).await
    }

    /// Generate a comprehensive script for `url` and store it
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn generate_script(&self, request: &GenerateRequest) -> Result<GeneratedScript> {
        let code = self
            .generate(PromptRequest {
                url: &request.url,
                language: request.language,
                kind: None,
                framework: None,
            })
            .await?;

        let script = GeneratedScript::new(
            format!("Test for {}", request.url),
            format!("Automated test script for {}", request.url),
            request.language,
            code,
        );
        self.db.insert_script(&script)?;

        info!("Generated script {}", script.id);
        Ok(script)
    }

    /// Generate a script of the requested kind, store it, run it once and
    /// record the outcome
    #[instrument(skip_all, fields(url = %request.url, test_type = %request.test_type))]
    pub async fn generate_and_run(&self, request: &GenerateAndRunRequest) -> Result<RunReport> {
        let code = self
            .generate(PromptRequest {
                url: &request.url,
                language: request.language,
                kind: Some(request.test_type),
                framework: Some(request.framework),
            })
            .await?;

        let script = GeneratedScript::new(
            format!("{} Test for {}", request.test_type, request.url),
            format!(
                "Generated {} test for {}",
                request.test_type.as_str().to_lowercase(),
                request.url
            ),
            request.language,
            code,
        );
        self.db.insert_script(&script)?;
        info!("Generated script {}", script.id);

        let outcome = self
            .executor
            .execute(&script.code, script.language, request.framework)
            .await?;
        let result = self.recorder.record(&script.id, &outcome, request.test_type)?;

        Ok(RunReport {
            test_script: script,
            test_result: result,
        })
    }

    /// Run a stored script and record the outcome
    #[instrument(skip_all, fields(script_id = %request.script_id))]
    pub async fn run_existing(&self, request: &RunRequest) -> Result<ExecutionResult> {
        let script = self
            .db
            .get_script(&request.script_id)?
            .ok_or_else(|| Error::not_found("test script", &request.script_id))?;

        let outcome = self
            .executor
            .execute(&script.code, script.language, request.framework)
            .await?;
        self.recorder.record(&script.id, &outcome, request.test_type)
    }
}
