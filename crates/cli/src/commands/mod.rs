//! CLI Commands

pub mod results;
pub mod run;
pub mod scripts;
pub mod stats;
