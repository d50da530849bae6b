//! Submission of captures to the classification service.

mod http;

pub use http::RequestClient;

use crate::model::{AnalysisResult, BlockReceipt};
use crate::selection::Artifact;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// How a failed request is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    MalformedResponse,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}{}", detail_suffix(.detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("request task ended unexpectedly: {0}")]
    Task(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl RequestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RequestError::MalformedResponse(_) => FailureKind::MalformedResponse,
            RequestError::Transport(_) | RequestError::Status { .. } | RequestError::Task(_) => {
                FailureKind::Transport
            }
        }
    }
}

/// One-shot submissions of an artifact. Each call performs exactly one request.
#[async_trait]
pub trait ClassifierApi: Send + Sync {
    /// POST the artifact to `/predict` and parse the three counts.
    async fn submit_analysis(&self, artifact: &Artifact) -> Result<AnalysisResult, RequestError>;

    /// POST the artifact to `/block`. Any 2xx status is success.
    async fn submit_block(&self, artifact: &Artifact) -> Result<BlockReceipt, RequestError>;
}
