//! Sign-in screen. After a successful sign-in, navigation branches on the
//! profile role: admins land on the admin screen, everyone else on the
//! showcase.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use showroom_core::Showroom;

use crate::action::{Action, Notification};
use crate::component::{Component, ScreenContext};
use crate::screen::ScreenId;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
}

pub struct LoginScreen {
    ctx: Option<ScreenContext>,
    email: Input,
    password: Input,
    field: Field,
    submitting: bool,
    /// Cancels an in-flight sign-in when the screen unmounts.
    cancel: Option<CancellationToken>,
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            ctx: None,
            email: Input::default(),
            password: Input::default(),
            field: Field::Email,
            submitting: false,
            cancel: None,
        }
    }

    fn can_submit(&self) -> bool {
        !self.submitting
            && !self.email.value().trim().is_empty()
            && !self.password.value().is_empty()
    }

    fn submit(&mut self) {
        if !self.can_submit() {
            return;
        }
        let Some(ctx) = self.ctx.clone() else { return };
        let Some(token) = self.cancel.clone() else { return };

        self.submitting = true;
        let email = self.email.value().trim().to_owned();
        let password = SecretString::from(self.password.value().to_owned());
        self.password = Input::default();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = token.cancelled() => return,
                res = sign_in(&ctx.showroom, &email, password) => res,
            };

            match result {
                Ok(is_admin) => {
                    let _ = ctx
                        .action_tx
                        .send(Action::Notify(Notification::success("Signed in")));
                    let target = if is_admin {
                        ScreenId::AdminHome
                    } else {
                        ScreenId::Showcase
                    };
                    let _ = ctx.action_tx.send(Action::Navigate(target));
                }
                Err(message) => {
                    let _ = ctx.action_tx.send(Action::Notify(Notification::error(message)));
                    let _ = ctx.action_tx.send(Action::Navigate(ScreenId::Login));
                }
            }
        });
    }
}

/// Sign in and resolve the admin flag from the freshly-synced profile.
async fn sign_in(
    showroom: &Showroom,
    email: &str,
    password: SecretString,
) -> std::result::Result<bool, String> {
    let user = showroom
        .login(email, password)
        .await
        .map_err(|e| e.to_string())?;
    let is_admin = showroom
        .store()
        .profile(&user.uid)
        .is_some_and(|p| p.is_admin());
    Ok(is_admin)
}

impl Component for LoginScreen {
    fn mount(&mut self, ctx: &ScreenContext) -> Result<()> {
        self.ctx = Some(ctx.clone());
        self.cancel = Some(CancellationToken::new());
        self.submitting = false;
        self.field = Field::Email;
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.ctx = None;
        self.password = Input::default();
        self.submitting = false;
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::Navigate(ScreenId::Home))),
            KeyCode::Tab | KeyCode::BackTab => {
                self.field = match self.field {
                    Field::Email => Field::Password,
                    Field::Password => Field::Email,
                };
            }
            KeyCode::Enter => match self.field {
                Field::Email => self.field = Field::Password,
                Field::Password => self.submit(),
            },
            _ => {
                let event = crossterm::event::Event::Key(key);
                match self.field {
                    Field::Email => {
                        self.email.handle_event(&event);
                    }
                    Field::Password => {
                        self.password.handle_event(&event);
                    }
                }
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [panel] = Layout::horizontal([Constraint::Length(52)])
            .flex(Flex::Center)
            .areas(area);
        let [panel] = Layout::vertical([Constraint::Length(9)])
            .flex(Flex::Center)
            .areas(panel);

        let field_style = |field: Field| {
            if field == self.field {
                theme::field_focused()
            } else {
                theme::label_style()
            }
        };

        let masked = "•".repeat(self.password.value().chars().count());
        let status = if self.submitting {
            "Signing in…"
        } else {
            ""
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Email     ", theme::hint_style()),
                Span::styled(self.email.value().to_owned(), field_style(Field::Email)),
            ]),
            Line::from(vec![
                Span::styled("Password  ", theme::hint_style()),
                Span::styled(masked, field_style(Field::Password)),
            ]),
            Line::default(),
            Line::from(Span::styled(status, theme::hint_style())),
            Line::from(Span::styled(
                "tab next field   enter sign in   esc back",
                theme::hint_style(),
            )),
        ];

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(Span::styled(" Sign in ", theme::title_style()))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_focused()),
            ),
            panel,
        );
    }

    fn wants_text_input(&self) -> bool {
        true
    }

    fn id(&self) -> &str {
        "login"
    }
}
