use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::constants::STATUS_REFRESHED;

use super::{App, DetailTab, FormFocus, Screen};

#[derive(Debug, Clone, Copy)]
enum ListAction {
    Quit,
    OpenDetails,
    NewTask,
    ShowHelp,
    Refresh,
    SelectNext,
    SelectPrev,
    SelectFirst,
    SelectLast,
}

impl ListAction {
    fn from_event(key: &KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Char('q') => Some(Self::Quit),
            KeyCode::Enter => Some(Self::OpenDetails),
            KeyCode::Char('n') | KeyCode::Char('a') => Some(Self::NewTask),
            KeyCode::Char('h') | KeyCode::Char('?') => Some(Self::ShowHelp),
            KeyCode::Char('r') => Some(Self::Refresh),
            KeyCode::Char('j') | KeyCode::Down => Some(Self::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Self::SelectPrev),
            KeyCode::Home => Some(Self::SelectFirst),
            KeyCode::End => Some(Self::SelectLast),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DetailAction {
    Back,
    NextTab,
    PrevTab,
    JumpTab(DetailTab),
    ToggleFormat,
    ShowHelp,
}

impl DetailAction {
    fn from_event(key: &KeyEvent) -> Option<Self> {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => Some(Self::Back),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => Some(Self::NextTab),
            KeyCode::BackTab | KeyCode::Left => Some(Self::PrevTab),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                Some(Self::JumpTab(DetailTab::ALL[idx]))
            }
            KeyCode::Char('f') => Some(Self::ToggleFormat),
            KeyCode::Char('h') | KeyCode::Char('?') => Some(Self::ShowHelp),
            _ => None,
        }
    }
}

impl App {
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }
        if self.show_help {
            self.handle_help_mode(key);
            return Ok(());
        }
        match self.screen {
            Screen::List => self.handle_list_mode(key),
            Screen::Details => self.handle_detail_mode(key),
            Screen::Submit => self.handle_submit_mode(key),
        }
        Ok(())
    }

    /// Bracketed paste lands in whichever submit buffer has focus.
    pub(crate) fn on_paste(&mut self, text: &str) {
        if self.show_help || self.screen != Screen::Submit {
            return;
        }
        match self.focus {
            FormFocus::Name => {
                let line = text.replace(['\r', '\n'], " ");
                self.edit_name(|buf| buf.insert_str(&line));
            }
            FormFocus::Field(_) => self.field_input.insert_str(text.trim()),
            FormFocus::Editor => self.edit_editor(|buf| buf.insert_str(text)),
        }
    }

    fn handle_help_mode(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::F(1) | KeyCode::Char('h') | KeyCode::Char('?')
        ) {
            self.show_help = false;
        }
    }

    fn handle_list_mode(&mut self, key: KeyEvent) {
        let Some(action) = ListAction::from_event(&key) else {
            return;
        };
        match action {
            ListAction::Quit => self.should_quit = true,
            ListAction::OpenDetails => self.open_selected(),
            ListAction::NewTask => self.open_submit(),
            ListAction::ShowHelp => self.show_help = true,
            ListAction::Refresh => {
                self.refresh();
                self.set_status_info(STATUS_REFRESHED);
            }
            ListAction::SelectNext => self.select_next(),
            ListAction::SelectPrev => self.select_prev(),
            ListAction::SelectFirst => {
                if !self.tasks.is_empty() {
                    self.selected = 0;
                    self.table_state.select(Some(self.selected));
                }
            }
            ListAction::SelectLast => {
                if !self.tasks.is_empty() {
                    self.selected = self.tasks.len() - 1;
                    self.table_state.select(Some(self.selected));
                }
            }
        }
    }

    fn handle_detail_mode(&mut self, key: KeyEvent) {
        let Some(action) = DetailAction::from_event(&key) else {
            return;
        };
        match action {
            DetailAction::Back => self.close_details(),
            DetailAction::ShowHelp => self.show_help = true,
            DetailAction::ToggleFormat => self.toggle_detail_format(),
            DetailAction::NextTab | DetailAction::PrevTab | DetailAction::JumpTab(_) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.tab = match action {
                        DetailAction::NextTab => detail.tab.next(),
                        DetailAction::PrevTab => detail.tab.prev(),
                        DetailAction::JumpTab(tab) => tab,
                        _ => detail.tab,
                    };
                }
            }
        }
    }

    fn handle_submit_mode(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.submit_form(),
                KeyCode::Char('t') => self.toggle_form_mode(),
                KeyCode::Char('f') => self.toggle_form_format(),
                KeyCode::Char('e') => self.load_example(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.cancel_submit(),
            KeyCode::F(1) => self.show_help = true,
            KeyCode::Tab => self.move_focus(true),
            KeyCode::BackTab => self.move_focus(false),
            _ => match self.focus {
                FormFocus::Name => self.handle_name_key(key),
                FormFocus::Field(_) => self.handle_field_key(key),
                FormFocus::Editor => self.handle_editor_key(key),
            },
        }
    }

    fn handle_name_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_form(),
            KeyCode::Char(c) => self.edit_name(|buf| buf.insert_char(c)),
            KeyCode::Backspace => self.edit_name(|buf| buf.backspace()),
            KeyCode::Delete => self.edit_name(|buf| buf.delete()),
            KeyCode::Left => self.name_input.move_left(),
            KeyCode::Right => self.name_input.move_right(),
            KeyCode::Home => self.name_input.move_home(),
            KeyCode::End => self.name_input.move_end(),
            KeyCode::Down => self.move_focus(true),
            _ => {}
        }
    }

    fn handle_field_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_form(),
            KeyCode::Up => self.move_focus(false),
            KeyCode::Down => self.move_focus(true),
            KeyCode::Left => {
                if !self.cycle_focused_choice(false) {
                    self.field_input.move_left();
                }
            }
            KeyCode::Right => {
                if !self.cycle_focused_choice(true) {
                    self.field_input.move_right();
                }
            }
            KeyCode::Char(c) => self.field_input.insert_char(c),
            KeyCode::Backspace => self.field_input.backspace(),
            KeyCode::Delete => self.field_input.delete(),
            KeyCode::Home => self.field_input.move_home(),
            KeyCode::End => self.field_input.move_end(),
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.edit_editor(|buf| buf.insert_newline()),
            KeyCode::Char(c) => self.edit_editor(|buf| buf.insert_char(c)),
            KeyCode::Backspace => self.edit_editor(|buf| buf.backspace()),
            KeyCode::Delete => self.edit_editor(|buf| buf.delete()),
            KeyCode::Left => self.editor.move_left(),
            KeyCode::Right => self.editor.move_right(),
            KeyCode::Up => self.editor.move_up(),
            KeyCode::Down => self.editor.move_down(),
            KeyCode::Home => self.editor.move_home(),
            KeyCode::End => self.editor.move_end(),
            _ => {}
        }
    }
}
