//! Render description of the dashboard, derived purely from a workflow snapshot.

use crate::model::WorkflowSnapshot;

pub const UPLOAD_PROMPT: &str = "Choose your CSV capture";
pub const NO_FILE_PLACEHOLDER: &str = "press 'o' to browse";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Legitimate,
    LowRated,
    HighRated,
}

impl BucketKind {
    pub fn title(self) -> &'static str {
        match self {
            BucketKind::Legitimate => "Legitimate Users",
            BucketKind::LowRated => "Low-Rated Attacks",
            BucketKind::HighRated => "High-Rated Attacks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub kind: BucketKind,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionView {
    pub label: &'static str,
    pub busy: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadView {
    pub prompt: &'static str,
    pub file_label: String,
    pub has_file: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub upload: UploadView,
    pub analyze: ActionView,
    /// Present only once an analysis result exists.
    pub buckets: Option<[Bucket; 3]>,
    /// Present only once an analysis result exists.
    pub block: Option<ActionView>,
}

pub fn render(snapshot: &WorkflowSnapshot) -> DashboardView {
    let has_file = snapshot.file_name.is_some();

    let upload = UploadView {
        prompt: UPLOAD_PROMPT,
        file_label: snapshot
            .file_name
            .clone()
            .unwrap_or_else(|| NO_FILE_PLACEHOLDER.to_string()),
        has_file,
    };

    let analyze = ActionView {
        label: if snapshot.analyze_in_flight {
            "Analyzing..."
        } else {
            "Analyze Traffic"
        },
        busy: snapshot.analyze_in_flight,
        enabled: has_file && !snapshot.analyze_in_flight,
    };

    let buckets = snapshot.result.map(|r| {
        [
            Bucket {
                kind: BucketKind::Legitimate,
                count: r.legitimate,
            },
            Bucket {
                kind: BucketKind::LowRated,
                count: r.low_rated,
            },
            Bucket {
                kind: BucketKind::HighRated,
                count: r.high_rated,
            },
        ]
    });

    let block = snapshot.result.map(|_| ActionView {
        label: if snapshot.block_in_flight {
            "Generating Blocked IP List..."
        } else {
            "Download Blocked IP Addresses"
        },
        busy: snapshot.block_in_flight,
        enabled: !snapshot.block_in_flight,
    });

    DashboardView {
        upload,
        analyze,
        buckets,
        block,
    }
}
