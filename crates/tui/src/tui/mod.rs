use std::io::{self, Stdout};
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::services::TasksService;

mod app;
mod buffer;
mod constants;
mod helpers;

use app::App;
use constants::TICK_RATE;

type Backend = CrosstermBackend<Stdout>;

/// Owns the raw-mode terminal and puts it back on drop, so an error or panic inside the
/// event loop never leaves the shell in the alternate screen.
struct Session {
    terminal: Terminal<Backend>,
}

impl Session {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .context("failed to enter alternate screen")?;
        let mut terminal =
            Terminal::new(CrosstermBackend::new(stdout)).context("failed to initialize terminal")?;
        terminal.hide_cursor().context("failed to hide cursor")?;
        Ok(Self { terminal })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableBracketedPaste,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let service = TasksService::in_memory(config);
    tracing::info!(
        tasks = service.list().len(),
        config = ?service.config().source(),
        "starting dashboard"
    );

    let mut session = Session::enter()?;
    let mut app = App::new(service);
    let result = event_loop(&mut session.terminal, &mut app);
    drop(session);

    if let Err(err) = &result {
        tracing::error!(error = %err, "dashboard stopped");
    }
    result
}

fn event_loop(terminal: &mut Terminal<Backend>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();
    while !app.should_quit() {
        terminal.draw(|f| app.draw(f))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            dispatch(app, event::read()?)?;
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn dispatch(app: &mut App, event: Event) -> Result<()> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key)?,
        Event::Paste(text) => app.on_paste(&text),
        _ => {}
    }
    Ok(())
}
