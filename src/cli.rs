use crate::client::RequestClient;
use crate::config::{load_settings, DEFAULT_BASE_URL};
use crate::model::{AnalysisReport, ClientConfig};
use crate::orchestrator::{build_report, export_json, WorkflowController};
use crate::selection::Artifact;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "ddos-predictor",
    version,
    about = "Submit network traffic captures to a DDoS classification service"
)]
pub struct Cli {
    /// Base URL of the classification service [default: http://127.0.0.1:5174]
    #[arg(long, env = "DDOS_PREDICTOR_URL")]
    pub base_url: Option<String>,

    /// Request timeout (e.g. 30s, 2m). Without one, requests wait as long as the transport does
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Settings file (JSON). Defaults to <config dir>/ddos-predictor/config.json when present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// CSV capture to select on launch (required with --json/--text)
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Analyze --file, print the JSON report and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Analyze --file, print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Also request a blocklist once the analysis succeeds (--json/--text only)
    #[arg(long)]
    pub block: bool,

    /// Export the report as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        !self.json && !self.text && !self.silent
    }
}

/// Check flag combinations before anything touches the network.
pub fn validate(args: &Cli) -> Result<()> {
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }
    if (args.json || args.text) && args.file.is_none() {
        return Err(anyhow::anyhow!("--json and --text need a capture: pass --file <CSV>"));
    }
    if args.block && !(args.json || args.text) {
        return Err(anyhow::anyhow!(
            "--block only applies to --json/--text; in the TUI press 'b' after analyzing"
        ));
    }
    Ok(())
}

pub async fn run(args: Cli) -> Result<()> {
    validate(&args)?;

    if args.silent {
        return run_once(args, OutputMode::Silent).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            return Err(anyhow::anyhow!(
                "built without TUI support: use --text or --json with --file"
            ));
        }
    }

    if args.json {
        return run_once(args, OutputMode::Json).await;
    }

    run_once(args, OutputMode::Text).await
}

/// Build a `ClientConfig` from CLI arguments, environment and the settings file.
///
/// Flags and environment win over the settings file, which wins over built-in defaults.
pub fn build_config(args: &Cli) -> Result<ClientConfig> {
    let settings = load_settings(args.config.as_deref())?;
    Ok(resolve_config(args, settings))
}

fn resolve_config(args: &Cli, settings: crate::config::Settings) -> ClientConfig {
    ClientConfig {
        base_url: args
            .base_url
            .clone()
            .or(settings.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        timeout: args.timeout.map(Into::into).or(settings.timeout),
        user_agent: format!("ddos-predictor/{}", env!("CARGO_PKG_VERSION")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Silent,
    Json,
    Text,
}

/// Select `--file`, analyze it, optionally request the blocklist, then print the report.
async fn run_once(args: Cli, mode: OutputMode) -> Result<()> {
    let cfg = build_config(&args)?;
    let path = args
        .file
        .as_deref()
        .context("--file is required for non-interactive runs")?;

    let (out_tx, out_handle) = if mode == OutputMode::Silent {
        (None, None)
    } else {
        let (tx, handle) = spawn_output_writer();
        (Some(tx), Some(handle))
    };
    let say = |msg: String| {
        if mode == OutputMode::Text {
            if let Some(tx) = out_tx.as_ref() {
                let _ = tx.send(OutputLine::Stderr(msg));
            }
        }
    };

    let client = RequestClient::new(&cfg)?;
    let mut controller = WorkflowController::new(Arc::new(client));
    controller.select(Artifact::load(path).await?);
    let (file_name, file_bytes) = controller
        .selected()
        .map(|a| (a.name().to_string(), a.len()))
        .context("capture was not selected")?;

    say(format!("Analyzing {file_name} via {}…", cfg.base_url));
    controller.trigger_analyze();
    let notice = controller
        .resolve_next()
        .await
        .context("analysis was not submitted")?;
    if notice.is_failure() {
        return Err(anyhow::anyhow!(notice.message));
    }
    let result = *controller
        .result()
        .context("analysis finished without a result")?;

    let block_notice = if args.block {
        say("Generating blocked IP list…".to_string());
        controller.trigger_block();
        controller.resolve_next().await
    } else {
        None
    };

    let report = build_report(
        &cfg.base_url,
        &file_name,
        file_bytes,
        result,
        block_notice.as_ref(),
    );

    handle_exports(&args, &report)?;

    if let Some(tx) = out_tx.as_ref() {
        match mode {
            OutputMode::Json => {
                let out = serde_json::to_string_pretty(&report)?;
                let _ = tx.send(OutputLine::Stdout(out));
            }
            OutputMode::Text => {
                for line in crate::text_summary::build_text_summary(&report).lines {
                    let _ = tx.send(OutputLine::Stdout(line));
                }
                if let Some(p) = args.export_json.as_deref() {
                    let _ = tx.send(OutputLine::Stderr(format!("Exported: {}", p.display())));
                }
            }
            OutputMode::Silent => {}
        }
    }

    drop(out_tx);
    if let Some(handle) = out_handle {
        let _ = handle.await;
    }

    match block_notice {
        Some(n) if n.is_failure() => Err(anyhow::anyhow!(n.message)),
        _ => Ok(()),
    }
}

/// Handle export operations for both text and JSON modes.
fn handle_exports(args: &Cli, report: &AnalysisReport) -> Result<()> {
    if let Some(p) = args.export_json.as_deref() {
        export_json(p, report)?;
    }
    Ok(())
}
