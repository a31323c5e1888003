use std::time::Instant;

use ratatui::style::{Color, Style};
use ratatui::widgets::TableState;

use super::buffer::TextBuffer;
use super::constants::*;
use super::helpers::cycle_choice;
use crate::core::monitor::{self, TaskMetrics};
use crate::form::{FormController, FormMode, FormatToggleError, SimpleField, SubmitError};
use crate::model::{ConfigFormat, LogEntry, Task, ALGORITHM_CHOICES, ENVIRONMENT_CHOICES};
use crate::services::TasksService;

mod input;
mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    List,
    Details,
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailTab {
    Parameters,
    Metrics,
    Logs,
    Resources,
}

impl DetailTab {
    const ALL: [DetailTab; 4] = [
        DetailTab::Parameters,
        DetailTab::Metrics,
        DetailTab::Logs,
        DetailTab::Resources,
    ];

    fn title(self) -> &'static str {
        match self {
            DetailTab::Parameters => "Parameters",
            DetailTab::Metrics => "Metrics",
            DetailTab::Logs => "Logs",
            DetailTab::Resources => "Resources",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

struct DetailState {
    task: Task,
    tab: DetailTab,
    format: ConfigFormat,
    metrics: TaskMetrics,
    logs: Vec<LogEntry>,
}

impl DetailState {
    fn new(task: Task, format: ConfigFormat) -> Self {
        let metrics = TaskMetrics::for_task(&task);
        Self {
            task,
            tab: DetailTab::Parameters,
            format,
            metrics,
            logs: monitor::sample_logs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormFocus {
    Name,
    Field(SimpleField),
    Editor,
}

#[derive(Debug, Clone)]
struct StatusMessage {
    text: String,
    kind: StatusKind,
    created_at: Instant,
}

impl StatusMessage {
    fn new<T: Into<String>>(text: T, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
            created_at: Instant::now(),
        }
    }

    fn style(&self) -> Style {
        match self.kind {
            StatusKind::Info => Style::default().fg(Color::Cyan),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Error,
}

pub(crate) struct App {
    service: TasksService,
    tasks: Vec<Task>,
    selected: usize,
    table_state: TableState,
    screen: Screen,
    show_help: bool,
    detail: Option<DetailState>,
    form: FormController,
    focus: FormFocus,
    name_input: TextBuffer,
    field_input: TextBuffer,
    editor: TextBuffer,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl App {
    pub(crate) fn new(service: TasksService) -> Self {
        let form = service.new_form();
        let mut app = Self {
            service,
            tasks: Vec::new(),
            selected: 0,
            table_state: TableState::default(),
            screen: Screen::List,
            show_help: false,
            detail: None,
            form,
            focus: FormFocus::Name,
            name_input: TextBuffer::new(),
            field_input: TextBuffer::new(),
            editor: TextBuffer::new(),
            status: None,
            should_quit: false,
        };
        app.refresh();
        app
    }

    pub(crate) fn refresh(&mut self) {
        self.tasks = self.service.list();
        if self.tasks.is_empty() {
            self.selected = 0;
            self.table_state.select(None);
        } else {
            if self.selected >= self.tasks.len() {
                self.selected = self.tasks.len() - 1;
            }
            self.table_state.select(Some(self.selected));
        }
    }

    pub(crate) fn on_tick(&mut self) {
        if let Some(status) = &self.status {
            if status.created_at.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    pub(crate) fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn select_next(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.tasks.len() - 1);
        self.table_state.select(Some(self.selected));
    }

    fn select_prev(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.selected = self.selected.saturating_sub(1);
        self.table_state.select(Some(self.selected));
    }

    fn select_task_by_id(&mut self, id: &str) {
        if let Some(idx) = self.tasks.iter().position(|task| task.id == id) {
            self.selected = idx;
            self.table_state.select(Some(idx));
        }
    }

    fn open_selected(&mut self) {
        match self.tasks.get(self.selected).map(|task| task.id.clone()) {
            Some(id) => self.open_details(&id),
            None => self.set_status_info(STATUS_NOTHING_SELECTED),
        }
    }

    /// Show a task's detail screen. Unknown ids land back on the list.
    fn open_details(&mut self, id: &str) {
        match self.service.fetch_task(id) {
            Ok(task) => {
                let format = self.service.config().default_format();
                self.select_task_by_id(&task.id);
                self.detail = Some(DetailState::new(task, format));
                self.screen = Screen::Details;
            }
            Err(not_found) => {
                tracing::debug!(error = %not_found, "detail lookup missed");
                self.detail = None;
                self.screen = Screen::List;
            }
        }
    }

    fn close_details(&mut self) {
        self.detail = None;
        self.screen = Screen::List;
    }

    fn toggle_detail_format(&mut self) {
        if let Some(detail) = self.detail.as_mut() {
            detail.format = detail.format.toggled();
        }
    }

    fn open_submit(&mut self) {
        self.screen = Screen::Submit;
        self.focus = FormFocus::Name;
        self.sync_inputs_from_form();
        self.set_status_info(STATUS_NEW_TASK);
    }

    fn cancel_submit(&mut self) {
        self.form.reset();
        self.focus = FormFocus::Name;
        self.sync_inputs_from_form();
        self.screen = Screen::List;
        self.set_status_info(STATUS_SUBMIT_CANCELLED);
    }

    fn sync_inputs_from_form(&mut self) {
        self.name_input.set(self.form.name());
        self.sync_field_input();
        self.sync_editor_from_form();
    }

    fn sync_field_input(&mut self) {
        if let FormFocus::Field(field) = self.focus {
            self.field_input.set(self.form.field_value(field));
        } else {
            self.field_input.clear();
        }
    }

    fn sync_editor_from_form(&mut self) {
        self.editor.set(self.form.raw_text());
    }

    fn focus_order(&self) -> Vec<FormFocus> {
        let mut order = vec![FormFocus::Name];
        match self.form.mode() {
            FormMode::Simple => order.extend(SimpleField::ALL.map(FormFocus::Field)),
            FormMode::Advanced => order.push(FormFocus::Editor),
        }
        order
    }

    fn move_focus(&mut self, forward: bool) {
        if !self.commit_focused_field() {
            return;
        }
        let order = self.focus_order();
        let current = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.focus = order[next];
        self.sync_field_input();
    }

    /// Push the focused simple field's text into the form. On bad input the field snaps
    /// back to its last good value.
    fn commit_focused_field(&mut self) -> bool {
        let FormFocus::Field(field) = self.focus else {
            return true;
        };
        match self.form.apply_field_input(field, &self.field_input.text()) {
            Ok(()) => true,
            Err(err) => {
                self.set_status_error(err.to_string());
                self.field_input.set(self.form.field_value(field));
                false
            }
        }
    }

    fn cycle_focused_choice(&mut self, forward: bool) -> bool {
        let FormFocus::Field(field) = self.focus else {
            return false;
        };
        match field {
            SimpleField::Algorithm => {
                let next = cycle_choice(&ALGORITHM_CHOICES, &self.form.simple().algorithm, forward);
                self.form.set_algorithm(next);
            }
            SimpleField::Environment => {
                let next =
                    cycle_choice(&ENVIRONMENT_CHOICES, &self.form.simple().environment, forward);
                self.form.set_environment(next);
            }
            _ => return false,
        }
        self.sync_field_input();
        true
    }

    fn toggle_form_mode(&mut self) {
        if !self.commit_focused_field() {
            return;
        }
        self.form.toggle_mode();
        self.sync_editor_from_form();
        match self.form.mode() {
            FormMode::Advanced => {
                if matches!(self.focus, FormFocus::Field(_)) {
                    self.focus = FormFocus::Editor;
                }
                self.set_status_info(STATUS_ADVANCED_MODE);
            }
            FormMode::Simple => {
                if self.focus == FormFocus::Editor {
                    self.focus = FormFocus::Field(SimpleField::Algorithm);
                }
                self.set_status_info(STATUS_SIMPLE_MODE);
            }
        }
        self.sync_field_input();
    }

    fn toggle_form_format(&mut self) {
        match self.form.toggle_format() {
            Ok(()) => {
                self.sync_editor_from_form();
                self.set_status_info(format!("Editing as {}", self.form.format().label()));
            }
            Err(FormatToggleError::SimpleMode) => self.set_status_info(STATUS_FORMAT_SIMPLE_ONLY),
            Err(err) => self.set_status_error(format!("Format not switched: {}", err)),
        }
    }

    fn load_example(&mut self) {
        if self.form.mode() == FormMode::Simple {
            self.form.toggle_mode();
        }
        self.form.load_example();
        self.sync_editor_from_form();
        self.focus = FormFocus::Editor;
        self.set_status_info(STATUS_EXAMPLE_LOADED);
    }

    fn edit_name<F: FnOnce(&mut TextBuffer)>(&mut self, edit: F) {
        edit(&mut self.name_input);
        self.form.set_name(self.name_input.text());
    }

    fn edit_editor<F: FnOnce(&mut TextBuffer)>(&mut self, edit: F) {
        edit(&mut self.editor);
        self.form.set_raw_text(self.editor.text());
    }

    fn submit_form(&mut self) {
        if !self.commit_focused_field() {
            return;
        }
        match self.service.submit(&mut self.form) {
            Ok(task) => {
                self.focus = FormFocus::Name;
                self.sync_inputs_from_form();
                self.refresh();
                self.open_details(&task.id);
                self.set_status_info(format!("Submitted '{}' [{}]", task.name, task.status));
            }
            Err(SubmitError::Validation(err)) => self.set_status_error(err.to_string()),
            Err(SubmitError::Parse(err)) => {
                self.set_status_error(format!("Configuration rejected: {}", err))
            }
            Err(err @ SubmitError::Backend(_)) => {
                tracing::error!(error = %err, "task submission failed");
                self.set_status_error(err.to_string());
            }
        }
    }

    pub(crate) fn set_status_info<T: Into<String>>(&mut self, message: T) {
        let mut text = String::from("ℹ️  ");
        text.push_str(&message.into());
        self.status = Some(StatusMessage::new(text, StatusKind::Info));
    }

    pub(crate) fn set_status_error<T: Into<String>>(&mut self, message: T) {
        let mut text = String::from("⚠️  ");
        text.push_str(&message.into());
        self.status = Some(StatusMessage::new(text, StatusKind::Error));
    }
}
