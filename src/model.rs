use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

/// The two remote operations a capture can be submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Analyze,
    Block,
}

impl Operation {
    /// Endpoint path relative to the service base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Operation::Analyze => "predict",
            Operation::Block => "block",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Analyze => f.write_str("analyze"),
            Operation::Block => f.write_str("block"),
        }
    }
}

/// Aggregate verdict returned by `/predict`.
///
/// The counts are taken as-is; nothing checks that they add up to the number
/// of rows in the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "legitimate_count", alias = "legitimate")]
    pub legitimate: u64,
    #[serde(rename = "low_rated_count", alias = "low_rated")]
    pub low_rated: u64,
    #[serde(rename = "high_rated_count", alias = "high_rated")]
    pub high_rated: u64,
}

/// Confirmation that the service produced a blocklist on its side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReceipt {
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    Success,
    Failure,
    Info,
}

/// Transient user-facing message produced whenever an operation resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub operation: Option<Operation>,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notification {
    pub fn success(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation: Some(operation),
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(operation: Option<Operation>, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            operation: None,
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind == NoticeKind::Failure
    }
}

/// Read-only copy of the controller state handed to presentation layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub file_name: Option<String>,
    pub file_bytes: Option<u64>,
    pub analyze_in_flight: bool,
    pub block_in_flight: bool,
    pub result: Option<AnalysisResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    State(WorkflowSnapshot),
    Notice(Notification),
}

/// Outcome of a blocklist request as recorded in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOutcome {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub timestamp_utc: String,
    pub base_url: String,
    pub file_name: String,
    pub file_bytes: u64,
    pub result: AnalysisResult,
    #[serde(default)]
    pub block: Option<BlockOutcome>,
}
