//! TestForge CLI
//!
//! Terminal client for the TestForge HTTP API.

pub mod client;
pub mod commands;
pub mod export;
pub mod output;
