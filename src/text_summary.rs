//! Text summary builder for CLI output.
//!
//! Formats human-readable lines for text mode.

use crate::model::AnalysisReport;
use crate::view::BucketKind;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished report.
pub(crate) fn build_text_summary(report: &AnalysisReport) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!(
        "Capture: {} ({} bytes)",
        report.file_name, report.file_bytes
    ));
    lines.push(format!("Service: {}", report.base_url));

    let rows = [
        (BucketKind::Legitimate, report.result.legitimate),
        (BucketKind::LowRated, report.result.low_rated),
        (BucketKind::HighRated, report.result.high_rated),
    ];
    let width = rows.iter().map(|(k, _)| k.title().len()).max().unwrap_or(0);
    for (kind, count) in rows {
        let label = format!("{}:", kind.title());
        lines.push(format!("{label:<w$}  {count}", w = width + 1));
    }

    if let Some(block) = report.block.as_ref() {
        let status = if block.ok { "ok" } else { "FAILED" };
        lines.push(format!("Blocklist: {status} - {}", block.message));
    }

    TextSummary { lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisResult, BlockOutcome};

    fn report(block: Option<BlockOutcome>) -> AnalysisReport {
        AnalysisReport {
            timestamp_utc: "2024-01-01T12:00:00Z".into(),
            base_url: "http://127.0.0.1:5174".into(),
            file_name: "traffic.csv".into(),
            file_bytes: 2048,
            result: AnalysisResult {
                legitimate: 100,
                low_rated: 5,
                high_rated: 2,
            },
            block,
        }
    }

    #[test]
    fn lists_all_three_buckets() {
        let lines = build_text_summary(&report(None)).lines;
        assert_eq!(lines[0], "Capture: traffic.csv (2048 bytes)");
        assert!(lines[2].starts_with("Legitimate Users:"));
        assert!(lines[2].ends_with(" 100"));
        assert!(lines[3].starts_with("Low-Rated Attacks:"));
        assert!(lines[3].ends_with(" 5"));
        assert!(lines[4].starts_with("High-Rated Attacks:"));
        assert!(lines[4].ends_with(" 2"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn block_failure_is_marked() {
        let lines = build_text_summary(&report(Some(BlockOutcome {
            ok: false,
            message: "Failed to generate blocked IP list: server returned 500".into(),
        })))
        .lines;
        assert_eq!(
            lines.last().unwrap(),
            "Blocklist: FAILED - Failed to generate blocked IP list: server returned 500"
        );
    }
}
