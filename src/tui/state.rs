use crate::model::{NoticeKind, WorkflowEvent, WorkflowSnapshot};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

pub struct UiState {
    pub tab: usize,
    pub base_url: String,
    pub info: String,
    pub info_kind: NoticeKind,

    // Latest controller state; the UI never mutates it directly.
    pub snapshot: WorkflowSnapshot,

    // File chooser input
    pub path_input: String,
    pub path_editing: bool,

    pub spinner_frame: usize,
    pub last_exported_path: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            base_url: String::new(),
            info: String::new(),
            info_kind: NoticeKind::Info,
            snapshot: WorkflowSnapshot::default(),
            path_input: String::new(),
            path_editing: false,
            spinner_frame: 0,
            last_exported_path: None,
        }
    }
}

impl UiState {
    pub fn apply_event(&mut self, ev: WorkflowEvent) {
        match ev {
            WorkflowEvent::State(snapshot) => self.snapshot = snapshot,
            WorkflowEvent::Notice(notice) => {
                self.info = notice.message;
                self.info_kind = notice.kind;
            }
        }
    }

    pub fn set_info(&mut self, msg: impl Into<String>) {
        self.info = msg.into();
        self.info_kind = NoticeKind::Info;
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
    }

    pub fn spinner(&self) -> char {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    pub fn info_color(&self) -> Color {
        match self.info_kind {
            NoticeKind::Success => Color::Green,
            NoticeKind::Failure => Color::Red,
            NoticeKind::Info => Color::White,
        }
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    value_style: Style,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::styled(line_text, value_style),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(line_text, value_style),
            ]));
        }

        remaining = rest;
    }
}
