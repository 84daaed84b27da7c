use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::KeyEvent;
use tracing::{info, warn};

use crate::error::Error;
use crate::gateway::Gateway;
use crate::tui::modals::property_edit::{EditOutcome, PropertyEditModal};
use crate::tui::navigation::NavigationStack;
use crate::tui::screen::{Screen, Screens};
use crate::tui::types::{Command, ScreenId};

pub struct App {
    gateway: Box<dyn Gateway>,

    // Navigation
    pub nav: NavigationStack,
    pub screens: Screens,

    // Popup
    pub edit_modal: Option<PropertyEditModal>,

    // Common state
    pub should_quit: bool,
    pub status_message: Option<String>,
    status_since: Option<Instant>,
    status_timeout: Duration,
    pub last_refresh: Option<chrono::DateTime<chrono::Local>>,
}

impl App {
    pub fn new(gateway: Box<dyn Gateway>, root: ScreenId, status_timeout: Duration) -> Self {
        Self {
            gateway,
            nav: NavigationStack::new(root),
            screens: Screens::new(),
            edit_modal: None,
            should_quit: false,
            status_message: None,
            status_since: None,
            status_timeout,
            last_refresh: None,
        }
    }

    pub fn current_screen(&self) -> &Screen {
        self.screens.get(self.nav.current().screen)
    }

    fn current_screen_mut(&mut self) -> &mut Screen {
        self.screens.get_mut(self.nav.current().screen)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_since = Some(Instant::now());
    }

    fn report(&mut self, error: Error) {
        warn!(error = %error, screen = %self.nav.current().screen, "Action failed");
        self.set_status(format!("Error: {}", error));
    }

    /// Clear the status line once it has been shown long enough.
    pub fn on_tick(&mut self) {
        if let Some(since) = self.status_since
            && since.elapsed() >= self.status_timeout
        {
            self.status_message = None;
            self.status_since = None;
        }
    }

    // === Navigation ===

    /// Re-populate the current screen from its frame.
    pub async fn refresh(&mut self) {
        let frame = self.nav.current().clone();
        let result = self
            .screens
            .get_mut(frame.screen)
            .update(self.gateway.as_ref(), &frame.args)
            .await;
        match result {
            Ok(()) => self.last_refresh = Some(Local::now()),
            Err(e) => self.report(e),
        }
    }

    pub async fn push(&mut self, screen: ScreenId, args: Vec<String>) {
        info!(screen = %screen, args = ?args, "Opening screen");
        self.nav.push(screen, args);
        self.refresh().await;
    }

    /// Go back one screen and reload it. Does nothing on the root screen.
    pub async fn pop(&mut self) {
        if self.nav.pop() {
            info!(screen = %self.nav.current().screen, "Back");
            self.refresh().await;
        }
    }

    // === Input ===

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if let Some(modal) = &mut self.edit_modal {
            match modal.handle_key(key.code) {
                Some(EditOutcome::Confirm(value)) => self.confirm_edit(value).await,
                Some(EditOutcome::Cancel) => self.edit_modal = None,
                None => {}
            }
            return;
        }

        if let Some(command) = Command::from_key(key.code) {
            self.handle_command(command).await;
        }
    }

    pub async fn handle_command(&mut self, command: Command) {
        let screen = self.nav.current().screen;
        match (command, screen) {
            (Command::Quit, _) => self.should_quit = true,
            (Command::FocusDown, _) => self.current_screen_mut().move_focus_down(),
            (Command::FocusUp, _) => self.current_screen_mut().move_focus_up(),
            (Command::Back, _) => self.pop().await,
            (Command::Refresh, _) => self.refresh().await,
            (Command::Drill, ScreenId::Vm) => self.drill_into(ScreenId::Props).await,
            (Command::DrillUsb, ScreenId::Vm) => self.drill_into(ScreenId::Usb).await,
            (Command::Drill | Command::OpenEdit, ScreenId::Props) => self.open_edit(),
            (Command::Drill | Command::ToggleAttachment, ScreenId::Usb) => {
                self.toggle_attachment().await
            }
            (Command::ToggleVerbose, ScreenId::Usb) => self.current_screen_mut().toggle_verbose(),
            _ => {}
        }
    }

    async fn drill_into(&mut self, target: ScreenId) {
        let Ok(vm) = self.current_screen().current_selection() else {
            return;
        };
        let vm = vm.to_string();
        self.push(target, vec![vm]).await;
    }

    // === Screen-local actions ===

    fn open_edit(&mut self) {
        match self.current_screen().begin_edit() {
            Ok(modal) => self.edit_modal = Some(modal),
            Err(Error::NoSelection) => {}
            Err(e) => self.report(e),
        }
    }

    async fn confirm_edit(&mut self, value: String) {
        let Some(modal) = self.edit_modal.take() else {
            return;
        };
        let result = self
            .screens
            .get_mut(ScreenId::Props)
            .apply_edit(self.gateway.as_ref(), &modal.label, &value)
            .await;
        match result {
            Ok(()) => {
                self.set_status(format!("{} of {} set to {}", modal.label, modal.vm, value));
                self.refresh().await;
            }
            Err(e) => self.report(e),
        }
    }

    async fn toggle_attachment(&mut self) {
        let screen = self.screens.get_mut(ScreenId::Usb);
        let uuid = match screen.current_selection() {
            Ok(uuid) => uuid.to_string(),
            Err(_) => return,
        };
        match screen.toggle_attachment(self.gateway.as_ref()).await {
            Ok(attached) => {
                let verb = if attached { "Attached" } else { "Detached" };
                self.set_status(format!("{} {}", verb, uuid));
                self.refresh().await;
            }
            Err(Error::NoSelection) => {}
            Err(e) => self.report(e),
        }
    }
}
