use std::cmp::min;

use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::monitor::{self, MetricPoint};
use crate::model::{LogLevel, Task, TaskStatus};

pub const BG_BASE: Color = Color::Rgb(14, 17, 23);
pub const BG_PANEL: Color = Color::Rgb(22, 26, 34);
pub const BG_ACCENT: Color = Color::Rgb(32, 37, 47);
pub const FG_ACCENT: Color = Color::Rgb(120, 161, 255);

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = min(width, area.width);
    let h = min(height, area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

pub fn inset_rect(area: Rect, padding: u16) -> Rect {
    if area.width == 0 || area.height == 0 {
        return area;
    }
    let px = padding.min(area.width / 2);
    let py = padding.min(area.height / 2);
    Rect {
        x: area.x + px,
        y: area.y + py,
        width: area.width.saturating_sub(px * 2),
        height: area.height.saturating_sub(py * 2),
    }
}

/// First eight characters of a ULID are enough to tell session tasks apart.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

pub fn accent_title(text: &str) -> Line<'static> {
    Line::from(vec![Span::styled(
        text.to_owned(),
        Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD),
    )])
}

pub fn format_datetime(value: &DateTime<Utc>) -> String {
    let local: DateTime<Local> = (*value).into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

pub fn status_style(status: TaskStatus) -> Style {
    let color = match status {
        TaskStatus::Pending => Color::Gray,
        TaskStatus::Running => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Failed => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn log_level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Info => Style::default().fg(Color::Cyan),
        LogLevel::Warning => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

pub fn format_task_detail_entries(task: &Task, now: DateTime<Utc>) -> Vec<(String, String)> {
    vec![
        (String::from("Name"), task.name.clone()),
        (String::from("Status"), task.status.as_str().to_string()),
        (String::from("ID"), task.id.clone()),
        (String::from("Algorithm"), task.algorithm.clone()),
        (String::from("Environment"), task.environment.clone()),
        (String::from("Submitted by"), task.submitter.name.clone()),
        (String::from("Created"), format_datetime(&task.created_at)),
        (String::from("Updated"), format_datetime(&task.updated_at)),
        (
            String::from("Duration"),
            monitor::format_duration(monitor::task_duration(task, now)),
        ),
    ]
}

/// Scale a metric series into the integer bars a sparkline expects.
pub fn sparkline_data(series: &[MetricPoint], scale: f64) -> Vec<u64> {
    series
        .iter()
        .map(|point| (point.value * scale).max(0.0).round() as u64)
        .collect()
}

/// Step through `choices` from `current`. A value outside the list lands on the first choice.
pub fn cycle_choice(choices: &[&str], current: &str, forward: bool) -> String {
    if choices.is_empty() {
        return current.to_string();
    }
    let next = match choices.iter().position(|choice| *choice == current) {
        None => 0,
        Some(idx) if forward => (idx + 1) % choices.len(),
        Some(0) => choices.len() - 1,
        Some(idx) => idx - 1,
    };
    choices[next].to_string()
}

pub fn build_help_lines() -> Vec<(&'static str, &'static str)> {
    vec![
        ("j / k or ↓ / ↑", "Move selection in the task list"),
        ("Enter", "Open task details"),
        ("n / a", "Submit a new task"),
        ("r", "Refresh the task list"),
        ("h / ?", "Toggle this help overlay (F1 inside the form)"),
        ("q / Ctrl+C", "Quit"),
        ("Tab / ← →", "Details: switch between tabs"),
        ("1-4", "Details: jump to a tab"),
        ("f", "Details: switch the configuration between JSON and YAML"),
        ("Esc", "Details: back to the list"),
        ("Tab / Shift+Tab", "Form: move between fields"),
        ("← / →", "Form: cycle algorithm and environment choices"),
        ("Ctrl+T", "Form: switch simple/advanced mode"),
        ("Ctrl+F", "Form: switch the editor between JSON and YAML"),
        ("Ctrl+E", "Form: load the example configuration"),
        ("Ctrl+S", "Form: submit (Enter also submits outside the editor)"),
        ("Esc", "Form: discard the draft and return to the list"),
    ]
}
