//! Account creation screen. New accounts are seeded with the `user` role;
//! promotion to admin happens in the admin users screen.

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

use crate::action::{Action, Notification};
use crate::component::{Component, ScreenContext};
use crate::screen::ScreenId;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    DisplayName,
    Email,
    Password,
    Confirm,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Self::DisplayName => Self::Email,
            Self::Email => Self::Password,
            Self::Password => Self::Confirm,
            Self::Confirm => Self::DisplayName,
        }
    }
}

pub struct SignupScreen {
    ctx: Option<ScreenContext>,
    display_name: Input,
    email: Input,
    password: Input,
    confirm: Input,
    field: Field,
    submitting: bool,
    cancel: Option<CancellationToken>,
}

impl SignupScreen {
    pub fn new() -> Self {
        Self {
            ctx: None,
            display_name: Input::default(),
            email: Input::default(),
            password: Input::default(),
            confirm: Input::default(),
            field: Field::DisplayName,
            submitting: false,
            cancel: None,
        }
    }

    /// Local validation before anything leaves the process.
    fn validation_error(&self) -> Option<&'static str> {
        if self.display_name.value().trim().is_empty()
            || self.email.value().trim().is_empty()
            || self.password.value().is_empty()
            || self.confirm.value().is_empty()
        {
            return Some("Please fill all fields");
        }
        if self.password.value() != self.confirm.value() {
            return Some("Passwords do not match");
        }
        if self.password.value().len() < 6 {
            return Some("Password must be at least 6 characters");
        }
        None
    }

    fn submit(&mut self) -> Option<Action> {
        if self.submitting {
            return None;
        }
        if let Some(message) = self.validation_error() {
            return Some(Action::Notify(Notification::warning(message)));
        }
        let ctx = self.ctx.clone()?;
        let token = self.cancel.clone()?;

        self.submitting = true;
        let display_name = self.display_name.value().trim().to_owned();
        let email = self.email.value().trim().to_owned();
        let password = SecretString::from(self.password.value().to_owned());
        self.password = Input::default();
        self.confirm = Input::default();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = token.cancelled() => return,
                res = ctx.showroom.signup(&email, password, &display_name) => res,
            };

            match result {
                Ok(_) => {
                    let _ = ctx.action_tx.send(Action::Notify(Notification::success(
                        "Account created — sign in to continue",
                    )));
                    let _ = ctx.action_tx.send(Action::Navigate(ScreenId::Login));
                }
                Err(e) => {
                    let _ = ctx
                        .action_tx
                        .send(Action::Notify(Notification::error(e.to_string())));
                    let _ = ctx.action_tx.send(Action::Navigate(ScreenId::Signup));
                }
            }
        });
        None
    }
}

impl Component for SignupScreen {
    fn mount(&mut self, ctx: &ScreenContext) -> Result<()> {
        self.ctx = Some(ctx.clone());
        self.cancel = Some(CancellationToken::new());
        self.submitting = false;
        self.field = Field::DisplayName;
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.ctx = None;
        self.password = Input::default();
        self.confirm = Input::default();
        self.submitting = false;
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::Navigate(ScreenId::Login))),
            KeyCode::Tab => self.field = self.field.next(),
            KeyCode::Enter => {
                if self.field == Field::Confirm {
                    return Ok(self.submit());
                }
                self.field = self.field.next();
            }
            _ => {
                let event = crossterm::event::Event::Key(key);
                let input = match self.field {
                    Field::DisplayName => &mut self.display_name,
                    Field::Email => &mut self.email,
                    Field::Password => &mut self.password,
                    Field::Confirm => &mut self.confirm,
                };
                input.handle_event(&event);
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [panel] = Layout::horizontal([Constraint::Length(56)])
            .flex(Flex::Center)
            .areas(area);
        let [panel] = Layout::vertical([Constraint::Length(11)])
            .flex(Flex::Center)
            .areas(panel);

        let style = |field: Field| {
            if field == self.field {
                theme::field_focused()
            } else {
                theme::label_style()
            }
        };
        let mask = |input: &Input| "•".repeat(input.value().chars().count());

        let status = if self.submitting {
            "Creating account…"
        } else {
            ""
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Display name  ", theme::hint_style()),
                Span::styled(
                    self.display_name.value().to_owned(),
                    style(Field::DisplayName),
                ),
            ]),
            Line::from(vec![
                Span::styled("Email         ", theme::hint_style()),
                Span::styled(self.email.value().to_owned(), style(Field::Email)),
            ]),
            Line::from(vec![
                Span::styled("Password      ", theme::hint_style()),
                Span::styled(mask(&self.password), style(Field::Password)),
            ]),
            Line::from(vec![
                Span::styled("Confirm       ", theme::hint_style()),
                Span::styled(mask(&self.confirm), style(Field::Confirm)),
            ]),
            Line::default(),
            Line::from(Span::styled(status, theme::hint_style())),
            Line::from(Span::styled(
                "tab next field   enter create   esc sign in",
                theme::hint_style(),
            )),
        ];

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(Span::styled(" Create account ", theme::title_style()))
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
        "signup"
    }
}
