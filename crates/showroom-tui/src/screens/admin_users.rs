//! Admin users screen — profile table with role toggling and deletion.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use showroom_core::{Command, Role, SaveProfileRequest, UserProfile};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;

pub struct AdminUsersScreen {
    focused: bool,
    users: Vec<Arc<UserProfile>>,
    table: TableState,
}

impl AdminUsersScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            users: Vec::new(),
            table: TableState::default(),
        }
    }

    fn selected(&self) -> Option<&Arc<UserProfile>> {
        self.users.get(self.table.selected().unwrap_or(0))
    }

    fn move_selection(&mut self, delta: isize) {
        if self.users.is_empty() {
            return;
        }
        let len = self.users.len();
        let current = self.table.selected().unwrap_or(0);
        let next = current
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
        self.table.select(Some(next));
    }
}

impl Component for AdminUsersScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('r') => Ok(self.selected().map(|user| {
                let flipped = match user.role {
                    Role::Admin => Role::User,
                    Role::User => Role::Admin,
                };
                Action::Submit(Command::SaveProfile {
                    id: user.id.clone(),
                    request: SaveProfileRequest {
                        display_name: user.display_name.clone(),
                        email: user.email.clone(),
                        role: flipped,
                    },
                })
            })),
            KeyCode::Char('d') => Ok(self.selected().map(|user| {
                Action::Confirm(ConfirmAction {
                    message: format!(
                        "Delete user \"{}\"? This cannot be undone.",
                        user.display_name
                    ),
                    command: Command::DeleteUser {
                        id: user.id.clone(),
                    },
                })
            })),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::ProfilesUpdated(profiles) = action {
            let mut all: Vec<Arc<UserProfile>> = profiles.iter().cloned().collect();
            all.sort_by(|a, b| a.display_name.cmp(&b.display_name));
            self.users = all;
            if self.table.selected().unwrap_or(0) >= self.users.len() {
                self.table
                    .select(Some(self.users.len().saturating_sub(1)));
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [table_area, footer_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

        let header = Row::new(vec![
            Cell::from("Display name").style(theme::table_header()),
            Cell::from("Email").style(theme::table_header()),
            Cell::from("Role").style(theme::table_header()),
        ]);

        let rows: Vec<Row> = self
            .users
            .iter()
            .map(|user| {
                let role_style = if user.is_admin() {
                    ratatui::style::Style::default().fg(theme::RACING_RED)
                } else {
                    theme::table_row()
                };
                Row::new(vec![
                    Cell::from(user.display_name.clone()),
                    Cell::from(user.email.clone()),
                    Cell::from(user.role.to_string()).style(role_style),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Min(16),
            Constraint::Min(22),
            Constraint::Length(8),
        ];

        let border = if self.focused {
            theme::border_focused()
        } else {
            theme::border_default()
        };

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .block(
                Block::default()
                    .title(Span::styled(
                        format!(" Users ({}) ", self.users.len()),
                        theme::title_style(),
                    ))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border),
            );

        let mut state = self.table.clone();
        if state.selected().is_none() && !self.users.is_empty() {
            state.select(Some(0));
        }
        frame.render_stateful_widget(table, table_area, &mut state);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "r toggle role   d delete   ↑↓ select",
                theme::hint_style(),
            ))),
            footer_area,
        );
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "admin-users"
    }
}
