mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::client::RequestClient;
use crate::model::WorkflowEvent;
use crate::orchestrator::{self, UiCommand, WorkflowController};
use crate::view::{self, ActionView, BucketKind, DashboardView};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::{push_wrapped_status_kv, UiState};
use std::path::PathBuf;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let client = RequestClient::new(&cfg)?;
    let controller = WorkflowController::new(Arc::new(client));

    // Unbounded channels: the UI thread must never block on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    if let Some(path) = args.file.clone() {
        let _ = cmd_tx.send(UiCommand::Select(path));
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let base_url = cfg.base_url.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(base_url, event_rx, cmd_tx));

    let res = orchestrator::run_controller(controller, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    base_url: String,
    mut event_rx: UnboundedReceiver<WorkflowEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        base_url,
        ..Default::default()
    };
    state.set_info("Press 'o' to choose a CSV capture");

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            state.tick_spinner();
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if state.path_editing {
                    handle_path_input(&mut state, k.code, &cmd_tx);
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('o')) => {
                        state.tab = 0;
                        state.path_editing = true;
                        state.path_input.clear();
                        state.set_info("Type the path of a CSV capture, Enter to confirm");
                    }
                    (_, KeyCode::Char('a')) | (_, KeyCode::Enter) => {
                        let view = view::render(&state.snapshot);
                        if view.analyze.enabled {
                            let _ = cmd_tx.send(UiCommand::Analyze);
                        } else if !view.upload.has_file {
                            state.set_info("Choose a CSV capture first ('o')");
                        }
                    }
                    (_, KeyCode::Char('b')) => {
                        // Blocking is only offered once an analysis is on screen.
                        match view::render(&state.snapshot).block {
                            Some(block) if block.enabled => {
                                let _ = cmd_tx.send(UiCommand::Block);
                            }
                            Some(_) => {}
                            None => state.set_info("Analyze the capture before blocking"),
                        }
                    }
                    (_, KeyCode::Char('e')) => export_current(&mut state),
                    (_, KeyCode::Tab) => {
                        state.tab = (state.tab + 1) % 2;
                    }
                    (_, KeyCode::Char('?')) => {
                        state.tab = 1;
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_path_input(state: &mut UiState, code: KeyCode, cmd_tx: &UnboundedSender<UiCommand>) {
    match code {
        KeyCode::Enter => {
            state.path_editing = false;
            let raw = state.path_input.trim();
            if raw.is_empty() {
                state.set_info("No file chosen");
            } else {
                let _ = cmd_tx.send(UiCommand::Select(PathBuf::from(raw)));
            }
        }
        KeyCode::Esc => {
            state.path_editing = false;
            state.path_input.clear();
            state.set_info("Cancelled");
        }
        KeyCode::Backspace => {
            state.path_input.pop();
        }
        KeyCode::Char(c) => state.path_input.push(c),
        _ => {}
    }
}

/// Export the analysis on screen as JSON into the working directory.
fn export_current(state: &mut UiState) {
    let snap = state.snapshot.clone();
    let (Some(result), Some(file_name)) = (snap.result, snap.file_name) else {
        state.set_info("No analysis to export yet.");
        return;
    };
    let report = orchestrator::build_report(
        &state.base_url,
        &file_name,
        snap.file_bytes.unwrap_or(0),
        result,
        None,
    );
    let exported = std::env::current_dir()
        .context("get current directory")
        .and_then(|dir| {
            orchestrator::export_json(
                &dir.join(orchestrator::default_export_name(&report)),
                &report,
            )
        });
    match exported {
        Ok(p) => {
            state.last_exported_path = Some(p.to_string_lossy().to_string());
            state.set_info(format!("Exported JSON: {}", p.display()));
        }
        Err(e) => {
            state.info = format!("JSON export failed: {e:#}");
            state.info_kind = crate::model::NoticeKind::Failure;
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Dashboard"), Line::from("Help")])
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("DDoS Attack Predictor"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let view = view::render(&state.snapshot);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4), // File chooser
                Constraint::Length(3), // Analyze action
                Constraint::Length(5), // Result buckets
                Constraint::Length(3), // Block action
                Constraint::Min(0),    // Status
            ]
            .as_ref(),
        )
        .split(area);

    draw_upload(main[0], f, state, &view);
    draw_action(main[1], f, state, &view.analyze, "a", Color::Blue);
    draw_buckets(main[2], f, &view);
    match view.block.as_ref() {
        Some(block) => draw_action(main[3], f, state, block, "b", Color::Red),
        None => f.render_widget(Paragraph::new(""), main[3]),
    }
    draw_status(main[4], f, state);
}

fn draw_upload(area: Rect, f: &mut ratatui::Frame, state: &UiState, view: &DashboardView) {
    let (border, second) = if state.path_editing {
        (
            Color::Cyan,
            Line::from(vec![
                Span::styled("Path: ", Style::default().fg(Color::Gray)),
                Span::raw(state.path_input.clone()),
                Span::styled("_", Style::default().fg(Color::Cyan)),
            ]),
        )
    } else {
        let style = if view.upload.has_file {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let mut spans = vec![Span::styled(view.upload.file_label.clone(), style)];
        if let Some(bytes) = state.snapshot.file_bytes {
            spans.push(Span::styled(
                format!(" ({bytes} bytes)"),
                Style::default().fg(Color::Gray),
            ));
        }
        (Color::DarkGray, Line::from(spans))
    };

    let p = Paragraph::new(vec![Line::from(view.upload.prompt), second])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title("Capture"),
        );
    f.render_widget(p, area);
}

fn draw_action(
    area: Rect,
    f: &mut ratatui::Frame,
    state: &UiState,
    action: &ActionView,
    key: &str,
    color: Color,
) {
    let style = if action.enabled {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text = if action.busy {
        format!("{} {}", state.spinner(), action.label)
    } else {
        format!("[{key}] {}", action.label)
    };
    let p = Paragraph::new(Line::from(Span::styled(text, style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    f.render_widget(p, area);
}

fn bucket_color(kind: BucketKind) -> Color {
    match kind {
        BucketKind::Legitimate => Color::Green,
        BucketKind::LowRated => Color::Yellow,
        BucketKind::HighRated => Color::Red,
    }
}

fn draw_buckets(area: Rect, f: &mut ratatui::Frame, view: &DashboardView) {
    let Some(buckets) = view.buckets.as_ref() else {
        let p = Paragraph::new(Line::from(Span::styled(
            "No analysis yet",
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Results"));
        f.render_widget(p, area);
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(area);

    for (bucket, col) in buckets.iter().zip(cols.iter()) {
        let color = bucket_color(bucket.kind);
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                bucket.count.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(bucket.kind.title()),
        );
        f.render_widget(p, *col);
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line<'static>> = vec![Line::from(vec![
        Span::styled("Service: ", Style::default().fg(Color::Gray)),
        Span::raw(state.base_url.clone()),
    ])];
    push_wrapped_status_kv(
        &mut lines,
        "Info",
        &state.info,
        Style::default().fg(state.info_color()),
        area.width,
    );
    if let Some(p) = state.last_exported_path.as_deref() {
        push_wrapped_status_kv(&mut lines, "Exported", p, Style::default(), area.width);
    }
    lines.push(Line::from(""));
    lines.push(Line::from(
        "Keys: o open | a analyze | b block | e export json | tab switch | ? help | q quit",
    ));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}
