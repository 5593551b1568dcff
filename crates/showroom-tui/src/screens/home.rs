//! Catalogue screen — the approved-car table and entry point.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;
use tokio::sync::mpsc::UnboundedSender;

use showroom_core::{Car, CarFilter, CarSort, Identity};

use crate::action::Action;
use crate::component::Component;
use crate::screen::ScreenId;
use crate::theme;
use crate::widgets::swatch;

pub struct HomeScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    /// Approved cars only, name order.
    cars: Vec<Arc<Car>>,
    identity: Identity,
    table: TableState,
}

impl HomeScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            cars: Vec::new(),
            identity: Identity::signed_out(),
            table: TableState::default(),
        }
    }

    fn selected(&self) -> Option<&Arc<Car>> {
        self.cars.get(self.table.selected().unwrap_or(0))
    }

    fn move_selection(&mut self, delta: isize) {
        if self.cars.is_empty() {
            return;
        }
        let len = self.cars.len();
        let current = self.table.selected().unwrap_or(0);
        let next = current
            .saturating_add_signed(delta)
            .min(len.saturating_sub(1));
        self.table.select(Some(next));
    }
}

impl Component for HomeScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
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
            KeyCode::Enter => Ok(self.selected().map(|car| {
                if let Some(tx) = &self.action_tx {
                    let _ = tx.send(Action::SelectCar(car.id.clone()));
                }
                Action::Navigate(ScreenId::Showcase)
            })),
            KeyCode::Char('l') => {
                if self.identity.is_signed_in() {
                    Ok(Some(Action::Logout))
                } else {
                    Ok(Some(Action::Navigate(ScreenId::Login)))
                }
            }
            KeyCode::Char('s') if !self.identity.is_signed_in() => {
                Ok(Some(Action::Navigate(ScreenId::Signup)))
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::CarsUpdated(cars) => {
                let mut visible: Vec<Arc<Car>> = cars
                    .iter()
                    .filter(|c| CarFilter::Approved.matches(c))
                    .cloned()
                    .collect();
                visible.sort_by(|a, b| CarSort::NameAsc.compare(a, b));
                self.cars = visible;
                if self.table.selected().unwrap_or(0) >= self.cars.len() {
                    self.table
                        .select(Some(self.cars.len().saturating_sub(1)));
                }
            }
            Action::IdentityChanged(identity) => {
                self.identity = identity.clone();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [table_area, footer_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

        let header = Row::new(vec![
            Cell::from("Name").style(theme::table_header()),
            Cell::from("Manufacturer").style(theme::table_header()),
            Cell::from("Year").style(theme::table_header()),
            Cell::from("Colour").style(theme::table_header()),
            Cell::from("Model").style(theme::table_header()),
        ]);

        let rows: Vec<Row> = self
            .cars
            .iter()
            .map(|car| {
                Row::new(vec![
                    Cell::from(car.name.clone()),
                    Cell::from(car.manufacturer.clone()),
                    Cell::from(car.year.to_string()),
                    Cell::from(Line::from(swatch::span(&car.colour))),
                    Cell::from(if car.has_model() { "3D" } else { "—" }),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Min(18),
            Constraint::Min(14),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(5),
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
                        format!(" Catalogue ({}) ", self.cars.len()),
                        theme::title_style(),
                    ))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border),
            );

        let mut state = self.table.clone();
        if state.selected().is_none() && !self.cars.is_empty() {
            state.select(Some(0));
        }
        frame.render_stateful_widget(table, table_area, &mut state);

        let hint = if self.identity.is_signed_in() {
            "↑↓ select   enter showcase   l sign out"
        } else {
            "↑↓ select   enter showcase   l sign in   s sign up"
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(hint, theme::hint_style()))),
            footer_area,
        );
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "home"
    }
}
