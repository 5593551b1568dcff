//! Admin landing screen — greeting plus navigation into the management
//! screens.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

use showroom_core::Identity;

use crate::action::Action;
use crate::component::Component;
use crate::screen::ScreenId;
use crate::theme;

pub struct AdminHomeScreen {
    identity: Identity,
}

impl AdminHomeScreen {
    pub fn new() -> Self {
        Self {
            identity: Identity::signed_out(),
        }
    }
}

impl Component for AdminHomeScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('c') => Ok(Some(Action::Navigate(ScreenId::AdminCars))),
            KeyCode::Char('u') => Ok(Some(Action::Navigate(ScreenId::AdminUsers))),
            KeyCode::Char('m') => Ok(Some(Action::Navigate(ScreenId::AdminReviews))),
            KeyCode::Char('l') => Ok(Some(Action::Logout)),
            KeyCode::Esc => Ok(Some(Action::Navigate(ScreenId::Home))),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::IdentityChanged(identity) = action {
            self.identity = identity.clone();
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [panel] = Layout::horizontal([Constraint::Length(48)])
            .flex(Flex::Center)
            .areas(area);
        let [panel] = Layout::vertical([Constraint::Length(10)])
            .flex(Flex::Center)
            .areas(panel);

        let name = self.identity.display_name().unwrap_or("Admin").to_owned();

        let lines = vec![
            Line::from(Span::styled(
                format!("Welcome back, {name}"),
                theme::title_style(),
            )),
            Line::default(),
            Line::from(vec![
                Span::styled("c  ", theme::field_focused()),
                Span::styled("Manage cars", theme::label_style()),
            ]),
            Line::from(vec![
                Span::styled("u  ", theme::field_focused()),
                Span::styled("Manage users", theme::label_style()),
            ]),
            Line::from(vec![
                Span::styled("m  ", theme::field_focused()),
                Span::styled("Moderate reviews", theme::label_style()),
            ]),
            Line::default(),
            Line::from(Span::styled(
                "l sign out   esc catalogue",
                theme::hint_style(),
            )),
        ];

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(Span::styled(" Admin ", theme::title_style()))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_focused()),
            ),
            panel,
        );
    }

    fn id(&self) -> &str {
        "admin-home"
    }
}
