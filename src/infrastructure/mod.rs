//! Infrastructure layer module
//!
//! Process-level concerns shared by the CLI and embedding services:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;
