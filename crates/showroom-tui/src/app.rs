//! Application core — event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
    Frame,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use showroom_core::{Command, CommandResult, Identity, Showroom};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel};
use crate::component::{Component, ScreenContext};
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Top-level application state and event loop.
pub struct App {
    /// Current active screen.
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    /// Whether the app should keep running.
    running: bool,
    connection_status: ConnectionStatus,
    /// Latest identity from the data bridge (drives admin gating).
    identity: Identity,
    /// Action sender — components can dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
    showroom: Showroom,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmAction>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(showroom: Showroom) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens().into_iter().collect();

        Self {
            active_screen: ScreenId::Home,
            previous_screen: None,
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            identity: Identity::signed_out(),
            action_tx,
            action_rx,
            showroom,
            data_cancel: CancellationToken::new(),
            pending_confirm: None,
            notification: None,
        }
    }

    fn ctx(&self) -> ScreenContext {
        ScreenContext {
            showroom: self.showroom.clone(),
            action_tx: self.action_tx.clone(),
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        // Wire up every screen, then mount the initial one.
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        let ctx = self.ctx();
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.mount(&ctx)?;
            screen.set_focused(true);
        }

        // Background bridge: connect + stream data into the action channel.
        {
            let showroom = self.showroom.clone();
            let cancel = self.data_cancel.clone();
            let tx = self.action_tx.clone();
            tokio::spawn(async move {
                crate::data_bridge::spawn_data_bridge(showroom, tx, cancel).await;
            });
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            tokio::select! {
                Some(event) = events.next() => {
                    match event {
                        Event::Key(key) => self.handle_key(key)?,
                        Event::Tick => self.expire_notification(),
                        Event::Render => {
                            tui.draw(|frame| self.render(frame))?;
                        }
                        Event::Resize(_, _) => {}
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.process_action(action)?;
                }
            }
        }

        // Teardown in reverse: active screen first, then the bridge.
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.unmount();
        }
        self.data_cancel.cancel();
        tui.exit()?;
        Ok(())
    }

    // ── Input ────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Ctrl+C always quits.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return Ok(());
        }

        // A pending confirmation captures all input.
        if let Some(confirm) = self.pending_confirm.take() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.spawn_submit(confirm.command);
                }
                _ => {} // anything else cancels
            }
            return Ok(());
        }

        // The active screen gets the key first.
        let mut wants_text = false;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            wants_text = screen.wants_text_input();
            if let Some(action) = screen.handle_key_event(key)? {
                // Through the channel, so ordering with actions the screen
                // sent directly is preserved.
                let _ = self.action_tx.send(action);
                return Ok(());
            }
        }

        // Global navigation only while no form field is capturing input.
        if !wants_text {
            match key.code {
                KeyCode::Char('q') => {
                    let _ = self.action_tx.send(Action::Quit);
                }
                KeyCode::Char(c @ '1'..='7') => {
                    if let Some(id) = ScreenId::from_number(c as u8 - b'0') {
                        let _ = self.action_tx.send(Action::Navigate(id));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    // ── Actions ──────────────────────────────────────────────────────

    fn process_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }
            Action::Navigate(id) => {
                self.switch_screen(id)?;
            }
            Action::GoBack => {
                if let Some(previous) = self.previous_screen {
                    self.switch_screen(previous)?;
                }
            }
            Action::Confirm(confirm) => {
                self.pending_confirm = Some(confirm);
            }
            Action::Submit(command) => {
                self.spawn_submit(command);
            }
            Action::Logout => {
                self.spawn_logout();
            }
            Action::Notify(notification) => {
                self.notification = Some((notification, Instant::now()));
            }
            Action::Connected => {
                self.connection_status = ConnectionStatus::Connected;
            }
            Action::Reconnecting => {
                self.connection_status = ConnectionStatus::Connecting;
            }
            Action::Disconnected(ref reason) => {
                self.connection_status = ConnectionStatus::Disconnected;
                self.notification = Some((Notification::error(reason.clone()), Instant::now()));
            }
            ref data_action => {
                if let Action::IdentityChanged(ref identity) = *data_action {
                    self.identity = identity.clone();
                    // Admin access can be revoked mid-session.
                    if self.active_screen.requires_admin() && !self.identity.is_admin() {
                        let _ = self.action_tx.send(Action::Notify(Notification::warning(
                            "Admin access required",
                        )));
                        let _ = self.action_tx.send(Action::Navigate(ScreenId::Home));
                    }
                }
                self.broadcast(data_action)?;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Forward an action to every screen, dispatching any follow-ups.
    fn broadcast(&mut self, action: &Action) -> Result<()> {
        let mut follow_ups = Vec::new();
        for screen in self.screens.values_mut() {
            if let Some(next) = screen.update(action)? {
                follow_ups.push(next);
            }
        }
        for next in follow_ups {
            let _ = self.action_tx.send(next);
        }
        Ok(())
    }

    /// The identity action from the bridge can lag a just-completed
    /// sign-in, so admin gating also consults the live store state.
    fn is_admin_now(&self) -> bool {
        if self.identity.is_admin() {
            return true;
        }
        self.showroom
            .auth_user()
            .borrow()
            .as_ref()
            .and_then(|u| self.showroom.store().profile(&u.uid))
            .is_some_and(|p| p.is_admin())
    }

    fn is_signed_in_now(&self) -> bool {
        self.identity.is_signed_in() || self.showroom.is_signed_in()
    }

    /// Unmount the current screen, mount the target.
    ///
    /// Navigating to the current screen remounts it (fresh form state),
    /// which is also how auth screens reset after a failed attempt.
    fn switch_screen(&mut self, id: ScreenId) -> Result<()> {
        if id.requires_admin() && !self.is_admin_now() {
            let target = if self.is_signed_in_now() {
                self.notification = Some((
                    Notification::warning("Admin access required"),
                    Instant::now(),
                ));
                return Ok(());
            } else {
                ScreenId::Login
            };
            return self.switch_screen(target);
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.unmount();
            screen.set_focused(false);
        }

        if id != self.active_screen {
            self.previous_screen = Some(self.active_screen);
        }
        self.active_screen = id;

        let ctx = self.ctx();
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.mount(&ctx)?;
            screen.set_focused(true);
        }
        debug!(screen = %id, "switched screen");
        Ok(())
    }

    /// Run a write command in the background; notify on completion.
    fn spawn_submit(&self, command: Command) {
        let success = match &command {
            Command::SaveCar { .. } => "Car saved",
            Command::ApproveCar { .. } => "Car approved",
            Command::DeleteCar { .. } => "Car deleted",
            Command::SubmitReview(_) => "Review submitted",
            Command::DeleteReview { .. } => "Review deleted",
            Command::SaveProfile { .. } => "Profile saved",
            Command::DeleteUser { .. } => "User deleted",
            Command::UploadModel(_) => "Model uploaded",
        };

        let showroom = self.showroom.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match showroom.submit(command).await {
                Ok(CommandResult::ModelUploaded { path, .. }) => {
                    let _ = tx.send(Action::ModelPathReady { path });
                    let _ = tx.send(Action::Notify(Notification::success(success)));
                }
                Ok(_) => {
                    let _ = tx.send(Action::Notify(Notification::success(success)));
                }
                Err(e) => {
                    let _ = tx.send(Action::Notify(Notification::error(e.to_string())));
                }
            }
        });
    }

    fn spawn_logout(&self) {
        let showroom = self.showroom.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match showroom.logout().await {
                Ok(()) => {
                    let _ = tx.send(Action::Notify(Notification::info("Signed out")));
                }
                Err(e) => {
                    let _ = tx.send(Action::Notify(Notification::warning(e.to_string())));
                }
            }
            let _ = tx.send(Action::Navigate(ScreenId::Home));
        });
    }

    fn expire_notification(&mut self) {
        if let Some((_, shown_at)) = &self.notification {
            if shown_at.elapsed() > NOTIFICATION_TTL {
                self.notification = None;
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let [tab_area, body_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.render_tabs(frame, tab_area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, body_area);
        }

        self.render_status(frame, status_area);

        if let Some(confirm) = &self.pending_confirm {
            render_confirm(frame, frame.area(), confirm);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut ids: Vec<ScreenId> = ScreenId::PUBLIC.to_vec();
        if self.identity.is_admin() {
            ids.extend(ScreenId::ADMIN);
        }

        let titles: Vec<Line> = ids
            .iter()
            .map(|id| Line::from(format!(" {} {} ", id.number(), id.label())))
            .collect();
        let selected = ids.iter().position(|id| *id == self.active_screen);

        let tabs = Tabs::new(titles)
            .style(theme::hint_style())
            .highlight_style(theme::title_style())
            .select(selected.unwrap_or(0))
            .divider("·");
        frame.render_widget(tabs, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let connection = match self.connection_status {
            ConnectionStatus::Connected => Span::styled(
                "● online",
                ratatui::style::Style::default().fg(theme::SUCCESS_GREEN),
            ),
            ConnectionStatus::Connecting => Span::styled(
                "◌ connecting",
                ratatui::style::Style::default().fg(theme::AMBER),
            ),
            ConnectionStatus::Disconnected => Span::styled(
                "○ offline",
                ratatui::style::Style::default().fg(theme::RACING_RED),
            ),
        };

        let who = match self.identity.display_name() {
            Some(name) if self.identity.is_admin() => format!("  {name} (admin)"),
            Some(name) => format!("  {name}"),
            None => "  anonymous".to_owned(),
        };

        let mut spans = vec![connection, Span::styled(who, theme::hint_style())];

        if let Some((notification, _)) = &self.notification {
            let colour = match notification.level {
                NotificationLevel::Info => theme::CHROME_CYAN,
                NotificationLevel::Success => theme::SUCCESS_GREEN,
                NotificationLevel::Warning => theme::AMBER,
                NotificationLevel::Error => theme::RACING_RED,
            };
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                notification.message.clone(),
                ratatui::style::Style::default().fg(colour),
            ));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Centered y/n confirmation dialog.
fn render_confirm(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
    let width = (confirm.message.len() as u16 + 6).clamp(30, area.width.saturating_sub(4));
    let [overlay] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [overlay] = Layout::vertical([Constraint::Length(5)])
        .flex(Flex::Center)
        .areas(overlay);

    frame.render_widget(Clear, overlay);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(confirm.message.clone()),
            Line::default(),
            Line::from(Span::styled("y confirm   any other key cancels", theme::hint_style())),
        ])
        .block(
            Block::default()
                .title(Span::styled(" Confirm ", theme::title_style()))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_focused()),
        ),
        overlay,
    );
}
