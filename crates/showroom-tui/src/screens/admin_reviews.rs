//! Admin reviews screen — every review joined with its author's live
//! profile, for moderation. An author whose profile lookup fails still
//! shows up, flagged as unknown, so moderation never loses a review.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;
use tokio_util::sync::CancellationToken;

use showroom_core::{Car, Command, DocSlot, ReviewSort, ReviewWithAuthor};

use crate::action::{Action, ConfirmAction};
use crate::component::{Component, ScreenContext};
use crate::screen::ScreenId;
use crate::screens::spawn_board_forward;
use crate::theme;
use crate::widgets::star_rating;

pub struct AdminReviewsScreen {
    focused: bool,
    rows: Arc<Vec<Arc<ReviewWithAuthor>>>,
    cars: Vec<Arc<Car>>,
    table: TableState,
    /// Set while mounted; cancelling tears the board down.
    board_cancel: Option<CancellationToken>,
}

impl AdminReviewsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            rows: Arc::new(Vec::new()),
            cars: Vec::new(),
            table: TableState::default(),
            board_cancel: None,
        }
    }

    fn selected(&self) -> Option<&Arc<ReviewWithAuthor>> {
        self.rows.get(self.table.selected().unwrap_or(0))
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let len = self.rows.len();
        let current = self.table.selected().unwrap_or(0);
        let next = current
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
        self.table.select(Some(next));
    }

    fn car_name(&self, row: &ReviewWithAuthor) -> String {
        self.cars
            .iter()
            .find(|c| c.id == row.review.car_id)
            .map_or_else(|| row.review.car_id.to_string(), |c| c.name.clone())
    }
}

impl Component for AdminReviewsScreen {
    /// Acquire the board over ALL reviews (no car filter).
    fn mount(&mut self, ctx: &ScreenContext) -> Result<()> {
        let cancel = CancellationToken::new();
        self.board_cancel = Some(cancel.clone());
        spawn_board_forward(
            &ctx.showroom,
            None,
            ReviewSort::NewestFirst,
            ScreenId::AdminReviews,
            ctx.action_tx.clone(),
            cancel,
        );
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(token) = self.board_cancel.take() {
            token.cancel();
        }
    }

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
            KeyCode::Char('d') => Ok(self.selected().map(|row| {
                Action::Confirm(ConfirmAction {
                    message: format!("Delete review by \"{}\"?", row.display_name()),
                    command: Command::DeleteReview {
                        id: row.review.id.clone(),
                    },
                })
            })),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::BoardUpdated { owner, rows } if *owner == ScreenId::AdminReviews => {
                self.rows = Arc::clone(rows);
                if self.table.selected().unwrap_or(0) >= self.rows.len() {
                    self.table
                        .select(Some(self.rows.len().saturating_sub(1)));
                }
            }
            Action::CarsUpdated(cars) => {
                self.cars = cars.iter().cloned().collect();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [table_area, footer_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

        let header = Row::new(vec![
            Cell::from("Author").style(theme::table_header()),
            Cell::from("Car").style(theme::table_header()),
            Cell::from("Rating").style(theme::table_header()),
            Cell::from("Comment").style(theme::table_header()),
            Cell::from("When").style(theme::table_header()),
        ]);

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|row| {
                let author_cell = match &row.author {
                    DocSlot::Present(profile) => {
                        Cell::from(profile.display_name.clone()).style(theme::table_row())
                    }
                    DocSlot::Missing => Cell::from(format!(
                        "{} (unknown author)",
                        row.review.author_name
                    ))
                    .style(theme::hint_style()),
                    DocSlot::Pending => Cell::from("…").style(theme::hint_style()),
                };
                Row::new(vec![
                    author_cell,
                    Cell::from(self.car_name(row)),
                    Cell::from(star_rating::stars(row.review.rating)),
                    Cell::from(row.review.comment.clone()),
                    Cell::from(
                        row.review
                            .created_at
                            .format("%Y-%m-%d %H:%M")
                            .to_string(),
                    ),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Min(16),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Min(20),
            Constraint::Length(17),
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
                        format!(" Review moderation ({}) ", self.rows.len()),
                        theme::title_style(),
                    ))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border),
            );

        let mut state = self.table.clone();
        if state.selected().is_none() && !self.rows.is_empty() {
            state.select(Some(0));
        }
        frame.render_stateful_widget(table, table_area, &mut state);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "d delete   ↑↓ select",
                theme::hint_style(),
            ))),
            footer_area,
        );
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "admin-reviews"
    }
}
