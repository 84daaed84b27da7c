use std::io;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tracing::info;

use crate::gateway::Gateway;

pub mod app;
pub mod modals;
pub mod navigation;
pub mod screen;
pub mod types;
pub mod views;

use app::App;
use types::ScreenId;

/// Settings for the interactive loop
#[derive(Debug, Clone)]
pub struct Config {
    /// How long to wait for a key before the timer tick fires.
    pub tick_rate: Duration,
    /// How long a status message stays on screen.
    pub status_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
            status_timeout: Duration::from_secs(5),
        }
    }
}

fn draw(frame: &mut Frame, app: &App) {
    views::list::draw(
        frame,
        app.current_screen(),
        &app.nav.trail(),
        app.status_message.as_deref(),
        app.last_refresh,
    );

    if let Some(modal) = &app.edit_modal {
        modals::property_edit::draw(frame, modal);
    }
}

pub async fn run(gateway: Box<dyn Gateway>, config: Config) -> io::Result<()> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = event_loop(&mut terminal, gateway, &config).await;

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    gateway: Box<dyn Gateway>,
    config: &Config,
) -> io::Result<()> {
    let mut app = App::new(gateway, ScreenId::Vm, config.status_timeout);
    info!("Starting VM browser");
    app.refresh().await;

    loop {
        terminal.draw(|frame| draw(frame, &app))?;

        if event::poll(config.tick_rate)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key).await;
        }
        app.on_tick();

        if app.should_quit {
            break;
        }
    }

    info!("Leaving VM browser");
    Ok(())
}
