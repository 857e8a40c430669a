//! Conformance harness for fdbuf streams.
//!
//! This crate provides:
//! - Scenario fixtures: JSON files describing op sequences against real streams
//! - Scenario runner: executes fixtures in a scratch directory and collects results
//! - Drive modes: every bulk transfer can be driven byte-at-a-time or in blocks,
//!   and a fixture must hold under both
//! - Structured logging: JSONL evidence records with artifact SHA-256 integrity

#![forbid(unsafe_code)]

pub mod config;
pub mod fixtures;
pub mod runner;
pub mod structured_log;

pub use config::DriveMode;
pub use fixtures::{ScenarioCase, ScenarioOp, ScenarioSet};
pub use runner::{CaseResult, ScenarioRunner};
