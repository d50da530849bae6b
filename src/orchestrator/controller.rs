//! Workflow controller.
//!
//! Owns the selected capture, the in-flight request of each operation and the last
//! analysis result. Presentation layers only ever see snapshots and notifications.

use crate::client::{ClassifierApi, RequestError};
use crate::model::{
    AnalysisResult, BlockReceipt, Notification, Operation, WorkflowEvent, WorkflowSnapshot,
};
use crate::selection::{Artifact, FileSelection};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Select(PathBuf),
    Analyze,
    Block,
    Quit,
}

type AnalyzeTask = JoinHandle<Result<AnalysisResult, RequestError>>;
type BlockTask = JoinHandle<Result<BlockReceipt, RequestError>>;

/// A finished request, not yet applied to the workflow state.
enum Completion {
    Analyze(Result<AnalysisResult, RequestError>),
    Block(Result<BlockReceipt, RequestError>),
}

fn join_error(e: tokio::task::JoinError) -> RequestError {
    RequestError::Task(e.to_string())
}

pub(crate) struct WorkflowController {
    client: Arc<dyn ClassifierApi>,
    selection: FileSelection,
    result: Option<AnalysisResult>,
    // An operation is in flight exactly while its handle is present.
    analyze_task: Option<AnalyzeTask>,
    block_task: Option<BlockTask>,
}

impl WorkflowController {
    pub fn new(client: Arc<dyn ClassifierApi>) -> Self {
        Self {
            client,
            selection: FileSelection::default(),
            result: None,
            analyze_task: None,
            block_task: None,
        }
    }

    pub fn select(&mut self, artifact: Artifact) {
        if artifact.is_empty() {
            warn!(file = artifact.name(), "selected capture is empty");
        }
        info!(file = artifact.name(), bytes = artifact.len(), "capture selected");
        self.selection.select(artifact);
    }

    /// Load a capture from disk and select it. A failed read keeps the previous selection.
    pub async fn select_path(&mut self, path: &std::path::Path) -> Notification {
        match Artifact::load(path).await {
            Ok(artifact) => {
                let msg = format!("Selected {} ({} bytes)", artifact.name(), artifact.len());
                self.select(artifact);
                Notification::info(msg)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "could not load capture");
                Notification::failure(None, format!("Could not open file: {e:#}"))
            }
        }
    }

    pub fn selected(&self) -> Option<&Artifact> {
        self.selection.current()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn is_in_flight(&self, op: Operation) -> bool {
        match op {
            Operation::Analyze => self.analyze_task.is_some(),
            Operation::Block => self.block_task.is_some(),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.analyze_task.is_some() || self.block_task.is_some()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let selected = self.selection.current();
        WorkflowSnapshot {
            file_name: selected.map(|a| a.name().to_string()),
            file_bytes: selected.map(|a| a.len()),
            analyze_in_flight: self.analyze_task.is_some(),
            block_in_flight: self.block_task.is_some(),
            result: self.result,
        }
    }

    /// Submit the selected capture for analysis.
    ///
    /// Returns `false` without doing anything when no capture is selected or an
    /// analysis is already running.
    pub fn trigger_analyze(&mut self) -> bool {
        if self.is_in_flight(Operation::Analyze) {
            debug!("analyze ignored: already in flight");
            return false;
        }
        let Some(artifact) = self.selection.current().cloned() else {
            debug!("analyze ignored: no capture selected");
            return false;
        };
        let client = self.client.clone();
        info!(file = artifact.name(), "analysis submitted");
        self.analyze_task = Some(tokio::spawn(async move {
            client.submit_analysis(&artifact).await
        }));
        true
    }

    /// Ask the service for a blocklist built from the selected capture.
    ///
    /// Same guard as [`Self::trigger_analyze`]. Whether an analysis has been shown
    /// first is left to the UI.
    pub fn trigger_block(&mut self) -> bool {
        if self.is_in_flight(Operation::Block) {
            debug!("block ignored: already in flight");
            return false;
        }
        let Some(artifact) = self.selection.current().cloned() else {
            debug!("block ignored: no capture selected");
            return false;
        };
        let client = self.client.clone();
        info!(file = artifact.name(), "blocklist submitted");
        self.block_task = Some(tokio::spawn(async move {
            client.submit_block(&artifact).await
        }));
        true
    }

    /// Wait for the next in-flight operation to finish, apply it and return its notification.
    ///
    /// Returns `None` right away when nothing is in flight.
    pub async fn resolve_next(&mut self) -> Option<Notification> {
        if !self.has_pending() {
            return None;
        }
        let Self {
            analyze_task,
            block_task,
            ..
        } = self;

        // Handles are only taken after their branch wins so the losing branch keeps its task.
        let completion = tokio::select! {
            res = async {
                match analyze_task.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                *analyze_task = None;
                Completion::Analyze(res.unwrap_or_else(|e| Err(join_error(e))))
            }
            res = async {
                match block_task.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                *block_task = None;
                Completion::Block(res.unwrap_or_else(|e| Err(join_error(e))))
            }
        };

        Some(self.apply(completion))
    }

    fn apply(&mut self, completion: Completion) -> Notification {
        match completion {
            Completion::Analyze(Ok(result)) => {
                self.result = Some(result);
                Notification::success(Operation::Analyze, "Analysis complete")
            }
            Completion::Analyze(Err(e)) => {
                warn!(error = %e, kind = ?e.kind(), "analysis failed");
                Notification::failure(
                    Some(Operation::Analyze),
                    format!("Failed to analyze file: {e}. Please try again."),
                )
            }
            Completion::Block(Ok(receipt)) => {
                let msg = match (receipt.message, receipt.filename) {
                    (Some(m), Some(f)) => format!("{m} ({f})"),
                    (Some(m), None) => m,
                    (None, Some(f)) => format!("Blocked IPs list saved: {f}"),
                    (None, None) => "Blocked IPs list saved successfully".to_string(),
                };
                Notification::success(Operation::Block, msg)
            }
            Completion::Block(Err(e)) => {
                warn!(error = %e, kind = ?e.kind(), "blocklist generation failed");
                Notification::failure(
                    Some(Operation::Block),
                    format!("Failed to generate blocked IP list: {e}"),
                )
            }
        }
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        // Dropping a JoinHandle does not cancel the task; abort so nothing outlives the workflow.
        if let Some(h) = self.analyze_task.take() {
            h.abort();
        }
        if let Some(h) = self.block_task.take() {
            h.abort();
        }
    }
}

/// Drive the controller from UI commands and emit state and notices back to presentation layers.
pub(crate) async fn run_controller(
    mut controller: WorkflowController,
    event_tx: UnboundedSender<WorkflowEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let _ = event_tx.send(WorkflowEvent::State(controller.snapshot()));

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Select(path)) => {
                        let notice = controller.select_path(&path).await;
                        let _ = event_tx.send(WorkflowEvent::Notice(notice));
                    }
                    Some(UiCommand::Analyze) => {
                        if controller.trigger_analyze() {
                            let _ = event_tx.send(WorkflowEvent::Notice(Notification::info(
                                "Analyzing…",
                            )));
                        }
                    }
                    Some(UiCommand::Block) => {
                        if controller.trigger_block() {
                            let _ = event_tx.send(WorkflowEvent::Notice(Notification::info(
                                "Generating blocked IP list…",
                            )));
                        }
                    }
                    Some(UiCommand::Quit) | None => break,
                }
            }
            notice = async {
                match controller.resolve_next().await {
                    Some(n) => n,
                    None => futures::future::pending().await,
                }
            } => {
                let _ = event_tx.send(WorkflowEvent::Notice(notice));
            }
        }
        let _ = event_tx.send(WorkflowEvent::State(controller.snapshot()));
    }

    Ok(())
}
