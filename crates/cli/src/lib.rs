//! Tally CLI - configuration, wiring and command orchestration
//!
//! This crate provides the `tally` binary.

pub mod commands;
pub mod config;
pub mod context;

pub use config::{AppConfig, KeySource};
pub use context::AppContext;
