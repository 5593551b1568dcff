//! Reviews screen — one car's reviews (author-joined, newest first) plus
//! the submission form.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;
use tokio_util::sync::CancellationToken;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use showroom_core::{
    Car, Command, DocumentId, Identity, ReviewSort, ReviewWithAuthor, SubmitReviewRequest,
};

use crate::action::{Action, Notification};
use crate::component::{Component, ScreenContext};
use crate::screen::ScreenId;
use crate::screens::spawn_board_forward;
use crate::theme;
use crate::widgets::star_rating;

pub struct ReviewsScreen {
    focused: bool,
    cars: Vec<Arc<Car>>,
    selected: Option<DocumentId>,
    identity: Identity,
    rows: Arc<Vec<Arc<ReviewWithAuthor>>>,
    /// Set while mounted; cancelling tears the board down.
    board_cancel: Option<CancellationToken>,
    /// Form state.
    editing: bool,
    rating: u8,
    comment: Input,
}

impl ReviewsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            cars: Vec::new(),
            selected: None,
            identity: Identity::signed_out(),
            rows: Arc::new(Vec::new()),
            board_cancel: None,
            editing: false,
            rating: 5,
            comment: Input::default(),
        }
    }

    fn current_car(&self) -> Option<&Arc<Car>> {
        match &self.selected {
            Some(id) => self.cars.iter().find(|c| &c.id == id),
            None => self.cars.first(),
        }
    }

    fn submit(&mut self) -> Option<Action> {
        let car = self.current_car()?;
        let comment = self.comment.value().trim().to_owned();
        if comment.is_empty() {
            return Some(Action::Notify(Notification::warning(
                "Write a comment before submitting",
            )));
        }
        let request = SubmitReviewRequest {
            car_id: car.id.clone(),
            rating: self.rating,
            comment,
        };
        self.editing = false;
        self.comment = Input::default();
        self.rating = 5;
        Some(Action::Submit(Command::SubmitReview(request)))
    }
}

impl Component for ReviewsScreen {
    /// Acquire the review/author board for the selected car.
    fn mount(&mut self, ctx: &ScreenContext) -> Result<()> {
        let cancel = CancellationToken::new();
        self.board_cancel = Some(cancel.clone());
        let car = self.current_car().map(|c| c.id.clone()).or_else(|| self.selected.clone());
        spawn_board_forward(
            &ctx.showroom,
            car,
            ReviewSort::NewestFirst,
            ScreenId::Reviews,
            ctx.action_tx.clone(),
            cancel,
        );
        Ok(())
    }

    /// Release the board; nothing it owned may fire after this returns.
    fn unmount(&mut self) {
        if let Some(token) = self.board_cancel.take() {
            token.cancel();
        }
        self.editing = false;
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.editing {
            return match key.code {
                KeyCode::Esc => {
                    self.editing = false;
                    Ok(None)
                }
                KeyCode::Enter => Ok(self.submit()),
                KeyCode::Up => {
                    self.rating = (self.rating + 1).min(5);
                    Ok(None)
                }
                KeyCode::Down => {
                    self.rating = (self.rating.saturating_sub(1)).max(1);
                    Ok(None)
                }
                _ => {
                    self.comment
                        .handle_event(&crossterm::event::Event::Key(key));
                    Ok(None)
                }
            };
        }

        match key.code {
            KeyCode::Char('w') => {
                if self.identity.is_signed_in() {
                    self.editing = true;
                    Ok(None)
                } else {
                    Ok(Some(Action::Navigate(ScreenId::Login)))
                }
            }
            KeyCode::Esc => Ok(Some(Action::Navigate(ScreenId::Showcase))),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::CarsUpdated(cars) => {
                self.cars = cars.iter().cloned().collect();
            }
            Action::IdentityChanged(identity) => {
                self.identity = identity.clone();
            }
            Action::SelectCar(id) => {
                self.selected = Some(id.clone());
            }
            Action::BoardUpdated { owner, rows } if *owner == ScreenId::Reviews => {
                self.rows = Arc::clone(rows);
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let form_height = if self.editing { 5 } else { 0 };
        let [list_area, form_area, footer_area] = Layout::vertical([
            Constraint::Min(4),
            Constraint::Length(form_height),
            Constraint::Length(1),
        ])
        .areas(area);

        let border = if self.focused {
            theme::border_focused()
        } else {
            theme::border_default()
        };

        let title = match self.current_car() {
            Some(car) => format!(" Reviews — {} ({}) ", car.name, self.rows.len()),
            None => " Reviews ".to_owned(),
        };

        let lines: Vec<Line> = if self.rows.is_empty() {
            vec![Line::from(Span::styled(
                "No reviews yet — be the first (w)",
                theme::hint_style(),
            ))]
        } else {
            self.rows
                .iter()
                .map(|row| {
                    let when = row.review.created_at.format("%Y-%m-%d %H:%M");
                    Line::from(vec![
                        star_rating::span(row.review.rating),
                        Span::raw("  "),
                        Span::styled(row.display_name().to_owned(), theme::label_style()),
                        Span::styled(format!("  {when}  "), theme::hint_style()),
                        Span::raw(row.review.comment.clone()),
                    ])
                })
                .collect()
        };

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(Span::styled(title, theme::title_style()))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border),
            ),
            list_area,
        );

        if self.editing {
            let rating =
                showroom_core::Rating::new(self.rating).unwrap_or_else(|_| {
                    showroom_core::Rating::new(5).expect("5 is a valid rating")
                });
            let form_lines = vec![
                Line::from(vec![
                    Span::styled("Rating  ", theme::label_style()),
                    star_rating::span(rating),
                    Span::styled("  (↑/↓ to adjust)", theme::hint_style()),
                ]),
                Line::from(vec![
                    Span::styled("Comment ", theme::label_style()),
                    Span::styled(self.comment.value().to_owned(), theme::field_focused()),
                ]),
            ];
            frame.render_widget(
                Paragraph::new(form_lines).block(
                    Block::default()
                        .title(Span::styled(" New review ", theme::title_style()))
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(theme::border_focused()),
                ),
                form_area,
            );
        }

        let hint = if self.editing {
            "enter submit   esc cancel   ↑/↓ rating"
        } else if self.identity.is_signed_in() {
            "w write review   esc showcase"
        } else {
            "w sign in to review   esc showcase"
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hint, theme::hint_style()))),
            footer_area,
        );
    }

    fn wants_text_input(&self) -> bool {
        self.editing
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "reviews"
    }
}
