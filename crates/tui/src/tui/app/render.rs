use std::cmp::min;

use chrono::Utc;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Sparkline, Table, Tabs, Wrap,
};
use ratatui::Frame;

use crate::form::{FormMode, SimpleField};
use crate::tui::constants::APP_VERSION;
use crate::tui::helpers::{
    accent_title, build_help_lines, centered_rect, format_datetime, format_task_detail_entries,
    inset_rect, log_level_style, short_id, sparkline_data, status_style, BG_ACCENT, BG_BASE,
    BG_PANEL, FG_ACCENT,
};

use super::{App, DetailState, DetailTab, FormFocus, Screen};

fn panel(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(accent_title(title))
        .border_style(Style::default().fg(Color::DarkGray))
        .style(Style::default().bg(BG_PANEL))
}

impl App {
    pub(crate) fn draw(&mut self, f: &mut Frame<'_>) {
        let size = f.size();
        f.render_widget(Clear, size);
        f.render_widget(Block::default().style(Style::default().bg(BG_BASE)), size);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(2),
            ])
            .split(size);

        self.draw_header(f, chunks[0]);
        match self.screen {
            Screen::List => self.draw_task_list(f, chunks[1]),
            Screen::Details => self.draw_details(f, chunks[1]),
            Screen::Submit => self.draw_submit(f, chunks[1]),
        }
        self.draw_footer(f, chunks[2]);

        if self.show_help {
            self.draw_help_overlay(f, size);
        }
    }

    fn draw_header(&self, f: &mut Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(area);

        let current = match self.screen {
            Screen::List => "Training tasks",
            Screen::Details => "Task details",
            Screen::Submit => "Submit training task",
        };
        let left_line = Line::from(vec![
            Span::styled(
                format!(" rlboard v{} ", APP_VERSION),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("| {}", current)),
            Span::raw("  "),
            Span::styled(
                format!("{} tasks", self.tasks.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        f.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG_BASE)),
            cols[0],
        );

        let submitter = &self.service.config().submitter().name;
        let right_line = Line::from(vec![Span::styled(
            format!("{} ", submitter),
            Style::default().fg(Color::DarkGray),
        )]);
        f.render_widget(
            Paragraph::new(right_line)
                .alignment(Alignment::Right)
                .style(Style::default().bg(BG_BASE)),
            cols[1],
        );
    }

    fn draw_task_list(&mut self, f: &mut Frame<'_>, area: Rect) {
        if self.tasks.is_empty() {
            let block = panel("Tasks");
            let inner = block.inner(area);
            f.render_widget(block, area);
            let lines = vec![
                Line::from(Span::styled(
                    "No training tasks yet",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from("Press 'n' to submit one."),
            ];
            let content = centered_rect(inner.width.min(60), 3, inner);
            f.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .style(Style::default().bg(BG_PANEL)),
                content,
            );
            return;
        }

        let header = Row::new(vec![
            Cell::from("ID"),
            Cell::from("Name"),
            Cell::from("Algorithm"),
            Cell::from("Environment"),
            Cell::from("Submitted by"),
            Cell::from("Created"),
            Cell::from("Status"),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .tasks
            .iter()
            .map(|task| {
                Row::new(vec![
                    Cell::from(short_id(&task.id)),
                    Cell::from(task.name.clone()),
                    Cell::from(task.algorithm.clone()),
                    Cell::from(task.environment.clone()),
                    Cell::from(task.submitter.name.clone()),
                    Cell::from(format_datetime(&task.created_at)),
                    Cell::from(task.status.as_str()).style(status_style(task.status)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(9),
            Constraint::Percentage(28),
            Constraint::Length(10),
            Constraint::Length(15),
            Constraint::Percentage(18),
            Constraint::Length(17),
            Constraint::Length(10),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(panel("Tasks"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .bg(BG_ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_details(&self, f: &mut Frame<'_>, area: Rect) {
        let Some(detail) = self.detail.as_ref() else {
            return;
        };

        let entries = format_task_detail_entries(&detail.task, Utc::now());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(entries.len() as u16 + 2),
                Constraint::Length(3),
                Constraint::Min(3),
            ])
            .split(area);

        let rows: Vec<Row> = entries
            .into_iter()
            .map(|(key, value)| {
                let value_cell = if key == "Status" {
                    Cell::from(value).style(status_style(detail.task.status))
                } else {
                    Cell::from(value)
                };
                Row::new(vec![
                    Cell::from(key)
                        .style(Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD)),
                    value_cell,
                ])
            })
            .collect();
        let summary = Table::new(rows, [Constraint::Length(14), Constraint::Min(20)])
            .block(panel(&detail.task.name))
            .column_spacing(2);
        f.render_widget(summary, chunks[0]);

        let titles: Vec<Line> = DetailTab::ALL
            .iter()
            .enumerate()
            .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .select(detail.tab.index())
            .block(panel("View"))
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .bg(BG_ACCENT)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, chunks[1]);

        match detail.tab {
            DetailTab::Parameters => self.draw_parameters(f, chunks[2], detail),
            DetailTab::Metrics => self.draw_metrics(f, chunks[2], detail),
            DetailTab::Logs => self.draw_logs(f, chunks[2], detail),
            DetailTab::Resources => self.draw_resources(f, chunks[2], detail),
        }
    }

    fn draw_parameters(&self, f: &mut Frame<'_>, area: Rect, detail: &DetailState) {
        let text = self.service.render_config(&detail.task, detail.format);
        let title = format!("Configuration ({}) • f to switch", detail.format.label());
        f.render_widget(
            Paragraph::new(text)
                .block(panel(&title))
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn draw_metrics(&self, f: &mut Frame<'_>, area: Rect, detail: &DetailState) {
        let reward = &detail.metrics.reward;
        let latest = reward.last().map(|p| p.value).unwrap_or_default();
        let data = sparkline_data(reward, 1.0);
        let title = format!(
            "Reward • latest {:.1} over {}s",
            latest,
            reward.last().map(|p| p.time).unwrap_or_default()
        );
        let sparkline = Sparkline::default()
            .block(panel(&title))
            .data(&data)
            .style(Style::default().fg(Color::Green));
        f.render_widget(sparkline, area);
    }

    fn draw_logs(&self, f: &mut Frame<'_>, area: Rect, detail: &DetailState) {
        let items: Vec<ListItem> = detail
            .logs
            .iter()
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format_datetime(&entry.timestamp),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format!("{:<7}", entry.level.as_str().to_uppercase()),
                        log_level_style(entry.level),
                    ),
                    Span::raw(" "),
                    Span::raw(entry.message.clone()),
                ]))
            })
            .collect();
        f.render_widget(List::new(items).block(panel("Logs")), area);
    }

    fn draw_resources(&self, f: &mut Frame<'_>, area: Rect, detail: &DetailState) {
        let metrics = &detail.metrics;
        let latest = metrics.latest_resources();
        let gpu_label = latest
            .gpu_usage
            .map(|gpu| format!("{:.1}%", gpu))
            .unwrap_or_else(|| String::from("n/a"));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        let series = [
            (
                format!("CPU {:.1}%", latest.cpu_usage),
                sparkline_data(&metrics.cpu, 1.0),
                Color::Cyan,
            ),
            (
                format!("Memory {:.2} GB", latest.memory_usage),
                sparkline_data(&metrics.memory, 100.0),
                Color::Magenta,
            ),
            (
                format!("GPU {}", gpu_label),
                sparkline_data(&metrics.gpu, 1.0),
                Color::Yellow,
            ),
        ];
        for (idx, (title, data, color)) in series.iter().enumerate() {
            let sparkline = Sparkline::default()
                .block(panel(title))
                .data(data)
                .style(Style::default().fg(*color));
            f.render_widget(sparkline, chunks[idx]);
        }
    }

    fn draw_submit(&self, f: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        let name_focused = self.focus == FormFocus::Name;
        let name_block = panel("Task Name").border_style(focus_border(name_focused));
        let name_inner = name_block.inner(chunks[0]);
        let name = if self.name_input.is_empty() && !name_focused {
            Line::from(Span::styled("required", Style::default().fg(Color::DarkGray)))
        } else {
            Line::from(self.name_input.text())
        };
        f.render_widget(Paragraph::new(name).block(name_block), chunks[0]);
        if name_focused {
            let (_, col) = self.name_input.cursor();
            f.set_cursor(name_inner.x + col as u16, name_inner.y);
        }

        let toggles = Line::from(vec![
            Span::raw(" Mode: "),
            Span::styled(
                self.form.mode().as_str(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" (Ctrl+T)", Style::default().fg(Color::DarkGray)),
            Span::raw("   Format: "),
            Span::styled(
                self.form.format().label(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" (Ctrl+F)", Style::default().fg(Color::DarkGray)),
            Span::styled("   Ctrl+E example", Style::default().fg(Color::DarkGray)),
        ]);
        f.render_widget(Paragraph::new(toggles), chunks[1]);

        match self.form.mode() {
            FormMode::Simple => self.draw_simple_fields(f, chunks[2]),
            FormMode::Advanced => self.draw_editor(f, chunks[2]),
        }

        let error_line = match self.form.parse_error() {
            Some(err) => Line::from(Span::styled(
                err.to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            None => Line::from(Span::styled(
                "Enter or Ctrl+S submits • Esc discards the draft",
                Style::default().fg(Color::DarkGray),
            )),
        };
        f.render_widget(
            Paragraph::new(error_line)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::TOP).border_style(
                    Style::default().fg(Color::DarkGray),
                )),
            chunks[3],
        );
    }

    fn draw_simple_fields(&self, f: &mut Frame<'_>, area: Rect) {
        let block = panel("Parameters");
        let inner = inset_rect(block.inner(area), 1);
        f.render_widget(block, area);

        let rows: Vec<Row> = SimpleField::ALL
            .iter()
            .map(|field| {
                let focused = self.focus == FormFocus::Field(*field);
                let value = if focused {
                    self.field_input.text()
                } else {
                    self.form.field_value(*field)
                };
                let hint = match field {
                    SimpleField::Algorithm | SimpleField::Environment if focused => "← → to choose",
                    _ => "",
                };
                let style = if focused {
                    Style::default().fg(Color::Yellow).bg(BG_ACCENT)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(field.label())
                        .style(Style::default().fg(FG_ACCENT).add_modifier(Modifier::BOLD)),
                    Cell::from(value).style(style),
                    Cell::from(hint).style(Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(14),
                Constraint::Length(24),
                Constraint::Min(10),
            ],
        )
        .column_spacing(2);
        f.render_widget(table, inner);

        if let FormFocus::Field(field) = self.focus {
            if let Some(row) = SimpleField::ALL.iter().position(|candidate| *candidate == field) {
                let (_, col) = self.field_input.cursor();
                f.set_cursor(inner.x + 16 + col as u16, inner.y + row as u16);
            }
        }
    }

    fn draw_editor(&self, f: &mut Frame<'_>, area: Rect) {
        let focused = self.focus == FormFocus::Editor;
        let title = format!("Configuration ({})", self.form.format().label());
        let block = panel(&title).border_style(focus_border(focused));
        let inner = block.inner(area);

        let (row, col) = self.editor.cursor();
        let scroll = (row as u16).saturating_sub(inner.height.saturating_sub(1));
        let lines: Vec<Line> = self
            .editor
            .lines()
            .iter()
            .map(|line| Line::from(line.clone()))
            .collect();
        f.render_widget(
            Paragraph::new(lines).block(block).scroll((scroll, 0)),
            area,
        );
        if focused {
            f.set_cursor(inner.x + col as u16, inner.y + row as u16 - scroll);
        }
    }

    fn draw_footer(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.style())])
        } else {
            Line::from(vec![Span::raw("Ready")])
        };
        f.render_widget(Paragraph::new(status_line), lines[0]);

        let help = if self.show_help {
            "Enter/Esc to close ❔"
        } else {
            match self.screen {
                Screen::List => "j/k move | enter details | n new task | r refresh | h help | q quit",
                Screen::Details => "tab/←→ switch tabs | 1-4 jump | f JSON/YAML | esc back | h help",
                Screen::Submit => {
                    "tab next field | ctrl+t mode | ctrl+f format | ctrl+e example | ctrl+s submit | esc cancel | F1 help"
                }
            }
        };
        let help_line = Line::from(vec![Span::styled(
            help,
            Style::default().fg(Color::DarkGray),
        )]);
        f.render_widget(Paragraph::new(help_line), lines[1]);
    }

    fn draw_help_overlay(&self, f: &mut Frame<'_>, area: Rect) {
        let lines = build_help_lines();
        let width = min(area.width.saturating_sub(10), 90);
        let height = min(lines.len() as u16 + 4, area.height.saturating_sub(2)).max(10);
        let popup_area = centered_rect(width, height, area);
        f.render_widget(Clear, popup_area);

        let block = panel("⌨️ Keyboard Reference");
        let inner = block.inner(popup_area);
        f.render_widget(block, popup_area);
        if inner.width < 3 || inner.height < 3 {
            return;
        }

        let help_lines: Vec<Line> = lines
            .into_iter()
            .map(|(combo, desc)| {
                Line::from(vec![
                    Span::styled(format!("{:<16}", combo), Style::default().fg(Color::Cyan)),
                    Span::raw(desc),
                ])
            })
            .collect();
        f.render_widget(
            Paragraph::new(help_lines)
                .wrap(Wrap { trim: true })
                .style(Style::default().bg(BG_PANEL)),
            inset_rect(inner, 1),
        );
    }
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}
