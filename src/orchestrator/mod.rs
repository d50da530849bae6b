//! Application-level orchestration.
//!
//! This module owns the analyze/block workflow (selection, in-flight requests, last result)
//! and the reports produced from it. UI/CLI layers call into this module to keep
//! responsibilities separated.

mod controller;
mod report;

pub(crate) use controller::{run_controller, UiCommand, WorkflowController};
pub(crate) use report::{build_report, default_export_name, export_json};
