//! Showcase screen — one car's details, its model-asset load state, and
//! its reviews ordered by rating.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use showroom_core::{Car, CarFilter, CarSort, CoreError, DocumentId, Identity, Review, Showroom};

use crate::action::Action;
use crate::component::{Component, ScreenContext};
use crate::screen::ScreenId;
use crate::theme;
use crate::widgets::{star_rating, swatch};

/// Load state of the selected car's 3D model asset.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ModelState {
    NoModel,
    Loading { loaded: u64, total: Option<u64> },
    Loaded { bytes: u64 },
    Failed { error: String },
}

pub struct ShowcaseScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    ctx: Option<ScreenContext>,
    cars: Vec<Arc<Car>>,
    reviews: Vec<Arc<Review>>,
    identity: Identity,
    selected: Option<DocumentId>,
    model: ModelState,
    /// Cancels the in-flight model fetch; replaced per fetch, cancelled
    /// on unmount.
    fetch_cancel: Option<CancellationToken>,
}

impl ShowcaseScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            ctx: None,
            cars: Vec::new(),
            reviews: Vec::new(),
            identity: Identity::signed_out(),
            selected: None,
            model: ModelState::NoModel,
            fetch_cancel: None,
        }
    }

    fn current_car(&self) -> Option<&Arc<Car>> {
        match &self.selected {
            Some(id) => self.cars.iter().find(|c| &c.id == id),
            None => self.cars.first(),
        }
    }

    fn current_reviews(&self) -> Vec<&Arc<Review>> {
        let Some(car) = self.current_car() else {
            return Vec::new();
        };
        let mut out: Vec<&Arc<Review>> = self
            .reviews
            .iter()
            .filter(|r| r.car_id == car.id)
            .collect();
        out.sort_by(|a, b| b.rating.cmp(&a.rating));
        out
    }

    fn cycle(&mut self, delta: isize) {
        if self.cars.is_empty() {
            return;
        }
        let len = self.cars.len();
        let current = self
            .current_car()
            .and_then(|car| self.cars.iter().position(|c| c.id == car.id))
            .unwrap_or(0);
        let next = (current as isize + delta).rem_euclid(len as isize) as usize;
        self.selected = Some(self.cars[next].id.clone());
        self.start_model_fetch();
    }

    /// Kick off (or skip) the model download for the current car.
    ///
    /// Any previous fetch is cancelled first, so progress from a stale
    /// car can never overwrite the current one.
    fn start_model_fetch(&mut self) {
        if let Some(token) = self.fetch_cancel.take() {
            token.cancel();
        }

        let Some(ctx) = self.ctx.clone() else {
            return;
        };
        let Some(car) = self.current_car().cloned() else {
            self.model = ModelState::NoModel;
            return;
        };
        if !car.has_model() {
            self.model = ModelState::NoModel;
            return;
        }

        self.model = ModelState::Loading {
            loaded: 0,
            total: None,
        };
        let token = CancellationToken::new();
        self.fetch_cancel = Some(token.clone());

        let showroom = ctx.showroom;
        let tx = ctx.action_tx;
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                // Dropping the fetch future aborts the request, so no
                // progress callback fires after cancellation.
                () = token.cancelled() => return,
                res = fetch_model(&showroom, &car, tx.clone()) => res,
            };

            match result {
                Ok(bytes) => {
                    let _ = tx.send(Action::ModelLoaded {
                        car_id: car.id.clone(),
                        bytes,
                    });
                }
                Err(e) => {
                    let _ = tx.send(Action::ModelFailed {
                        car_id: car.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        });
    }

    fn is_current(&self, car_id: &DocumentId) -> bool {
        self.current_car().is_some_and(|c| &c.id == car_id)
    }
}

async fn fetch_model(
    showroom: &Showroom,
    car: &Arc<Car>,
    tx: UnboundedSender<Action>,
) -> Result<u64, CoreError> {
    let Some(url) = showroom.model_url(car).await? else {
        return Ok(0);
    };
    let car_id = car.id.clone();
    let bytes = showroom
        .fetch_model(&url, move |loaded, total| {
            let _ = tx.send(Action::ModelProgress {
                car_id: car_id.clone(),
                loaded,
                total,
            });
        })
        .await?;
    Ok(bytes.len() as u64)
}

impl Component for ShowcaseScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn mount(&mut self, ctx: &ScreenContext) -> Result<()> {
        self.ctx = Some(ctx.clone());
        self.start_model_fetch();
        Ok(())
    }

    fn unmount(&mut self) {
        if let Some(token) = self.fetch_cancel.take() {
            token.cancel();
        }
        self.ctx = None;
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Right | KeyCode::Char('n') => {
                self.cycle(1);
                Ok(None)
            }
            KeyCode::Left | KeyCode::Char('p') => {
                self.cycle(-1);
                Ok(None)
            }
            KeyCode::Char('r') => Ok(self.current_car().map(|car| {
                if let Some(tx) = &self.action_tx {
                    let _ = tx.send(Action::SelectCar(car.id.clone()));
                }
                Action::Navigate(ScreenId::Reviews)
            })),
            KeyCode::Char('l') => {
                if self.identity.is_signed_in() {
                    Ok(Some(Action::Logout))
                } else {
                    Ok(Some(Action::Navigate(ScreenId::Login)))
                }
            }
            KeyCode::Esc => Ok(Some(Action::GoBack)),
            _ => Ok(None),
        }
    }

    #[allow(clippy::cognitive_complexity)]
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
                if self.ctx.is_some() && self.model == ModelState::NoModel {
                    self.start_model_fetch();
                }
            }
            Action::ReviewsUpdated(reviews) => {
                self.reviews = reviews.iter().cloned().collect();
            }
            Action::IdentityChanged(identity) => {
                self.identity = identity.clone();
            }
            Action::SelectCar(id) => {
                self.selected = Some(id.clone());
                if self.ctx.is_some() {
                    self.start_model_fetch();
                }
            }
            Action::ModelProgress {
                car_id,
                loaded,
                total,
            } if self.is_current(car_id) => {
                self.model = ModelState::Loading {
                    loaded: *loaded,
                    total: *total,
                };
            }
            Action::ModelLoaded { car_id, bytes } if self.is_current(car_id) => {
                self.model = ModelState::Loaded { bytes: *bytes };
            }
            Action::ModelFailed { car_id, error } if self.is_current(car_id) => {
                self.model = ModelState::Failed {
                    error: error.clone(),
                };
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [detail_area, reviews_area, footer_area] = Layout::vertical([
            Constraint::Length(8),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .areas(area);

        let border = if self.focused {
            theme::border_focused()
        } else {
            theme::border_default()
        };

        // ── Car details ──────────────────────────────────────────
        let detail_lines: Vec<Line> = match self.current_car() {
            Some(car) => vec![
                Line::from(vec![
                    Span::styled(car.name.clone(), theme::title_style()),
                    Span::raw("  "),
                    Span::styled(format!("{} · {}", car.manufacturer, car.year), theme::label_style()),
                ]),
                Line::from(vec![
                    Span::styled("Colour  ", theme::hint_style()),
                    swatch::span(&car.colour),
                ]),
                Line::from(vec![
                    Span::styled("Model   ", theme::hint_style()),
                    model_span(&self.model),
                ]),
            ],
            None => vec![Line::from(Span::styled(
                "No approved cars yet",
                theme::hint_style(),
            ))],
        };

        frame.render_widget(
            Paragraph::new(detail_lines).block(
                Block::default()
                    .title(Span::styled(" Showcase ", theme::title_style()))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border),
            ),
            detail_area,
        );

        // ── Reviews by rating ────────────────────────────────────
        let review_lines: Vec<Line> = self
            .current_reviews()
            .into_iter()
            .map(|r| {
                Line::from(vec![
                    star_rating::span(r.rating),
                    Span::raw("  "),
                    Span::styled(r.author_name.clone(), theme::label_style()),
                    Span::raw("  "),
                    Span::raw(r.comment.clone()),
                ])
            })
            .collect();

        let review_count = review_lines.len();
        frame.render_widget(
            Paragraph::new(review_lines).block(
                Block::default()
                    .title(Span::styled(
                        format!(" Top reviews ({review_count}) "),
                        theme::title_style(),
                    ))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_default()),
            ),
            reviews_area,
        );

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "←/→ switch car   r reviews   esc catalogue",
                theme::hint_style(),
            ))),
            footer_area,
        );
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "showcase"
    }
}

fn model_span(state: &ModelState) -> Span<'static> {
    match state {
        ModelState::NoModel => Span::styled("none", theme::hint_style()),
        ModelState::Loading { loaded, total } => {
            let text = match total {
                Some(total) if *total > 0 => {
                    format!("loading {}%", loaded * 100 / total)
                }
                _ => format!("loading {loaded} bytes"),
            };
            Span::styled(text, ratatui::style::Style::default().fg(theme::AMBER))
        }
        ModelState::Loaded { bytes } => Span::styled(
            format!("ready ({bytes} bytes)"),
            ratatui::style::Style::default().fg(theme::SUCCESS_GREEN),
        ),
        ModelState::Failed { error } => Span::styled(
            format!("failed: {error}"),
            ratatui::style::Style::default().fg(theme::RACING_RED),
        ),
    }
}
