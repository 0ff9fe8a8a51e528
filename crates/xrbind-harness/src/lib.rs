//! Conformance harness for xrbind.
//!
//! This crate provides:
//! - An in-process simulated runtime exporting every command behind an
//!   `xrGetInstanceProcAddr`-compatible resolver ([`sim_runtime`]).
//! - A scenario runner that drives each projection through the dynamic
//!   loader and records one check per expectation ([`runner`]).
//! - Structured JSONL logs with schema validation ([`structured_log`]).

#![deny(unsafe_code)]

// Exports and calls C-ABI entry points.
#[allow(unsafe_code)]
pub mod runner;
#[allow(unsafe_code)]
pub mod sim_runtime;
pub mod structured_log;

pub use runner::{CheckResult, ConformanceRunner, HarnessError, RunSummary};
pub use structured_log::{LogEmitter, LogEntry, LogLevel, Outcome, Projection};
