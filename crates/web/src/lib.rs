//! TestForge HTTP API
//!
//! JSON routes under `/api` for generating, running and reviewing test scripts.

pub mod config;
pub mod error;
pub mod execution;
pub mod results;
pub mod scripts;
pub mod server;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{router, serve, AppState, SharedState};
