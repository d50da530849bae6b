//! Reports built from a finished analysis.
//!
//! Handles assembling the JSON report and writing it to disk.

use crate::model::{AnalysisReport, AnalysisResult, BlockOutcome, Notification};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}

/// Assemble a report for the given capture and result. `block` is the notice of a
/// blocklist request, if one was made.
pub(crate) fn build_report(
    base_url: &str,
    file_name: &str,
    file_bytes: u64,
    result: AnalysisResult,
    block: Option<&Notification>,
) -> AnalysisReport {
    AnalysisReport {
        timestamp_utc: now_rfc3339(),
        base_url: base_url.to_string(),
        file_name: file_name.to_string(),
        file_bytes,
        result,
        block: block.map(|n| BlockOutcome {
            ok: !n.is_failure(),
            message: n.message.clone(),
        }),
    }
}

/// Write a report as pretty JSON, creating parent directories as needed.
pub(crate) fn export_json(path: &Path, report: &AnalysisReport) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let body = serde_json::to_vec_pretty(report).context("serialize report")?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    Ok(path.to_path_buf())
}

/// Default file name for a report exported from the TUI.
pub(crate) fn default_export_name(report: &AnalysisReport) -> String {
    let stem = report
        .file_name
        .rsplit_once('.')
        .map(|(s, _)| s)
        .unwrap_or(&report.file_name);
    format!(
        "ddos-analysis-{}-{}.json",
        stem,
        report.timestamp_utc.replace(':', "-").replace('T', "_")
    )
}
