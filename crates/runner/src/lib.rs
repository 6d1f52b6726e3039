//! TestForge generation and execution pipeline
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────┐
//! │ PromptRequest│──▶│ TestGenerator  │──▶│ Database │ (GeneratedScript)
//! └──────────────┘   └────────────────┘   └──────────┘
//!                                               │
//!        ┌──────────────┐   ┌──────────┐        ▼
//!        │ResultRecorder│◀──│ Executor │◀── materialize()
//!        └──────────────┘   └──────────┘
//! ```
//!
//! - `prompt`: builds the instruction text sent to the completion service
//! - `llm`: completion service client
//! - `materialize`: writes script source to a scratch file
//! - `executor`: runs Mocha/Jest against the scratch file and parses the summary
//! - `recorder`: appends execution results
//! - `pipeline`: ties the above together per request

pub mod executor;
pub mod llm;
pub mod materialize;
pub mod pipeline;
pub mod prompt;
pub mod recorder;

pub use executor::{ExecutionOutcome, Executor, ExecutorConfig};
pub use llm::{CompletionConfig, CompletionRequest, OpenAiGenerator, TestGenerator};
pub use pipeline::{GenerateAndRunRequest, GenerateRequest, Pipeline, RunRequest};
pub use prompt::PromptRequest;
pub use recorder::ResultRecorder;
