//! Admin cars screen — full catalogue table with a create/edit overlay,
//! approval, deletion, and model-file upload.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState,
};
use ratatui::Frame;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use showroom_core::{Car, Command, DocumentId, SaveCarRequest, UploadModelRequest};

use crate::action::{Action, ConfirmAction, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::swatch;

// ── Edit form state ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Name,
    Manufacturer,
    Year,
    Colour,
    ModelFile,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            Self::Name => Self::Manufacturer,
            Self::Manufacturer => Self::Year,
            Self::Year => Self::Colour,
            Self::Colour => Self::ModelFile,
            Self::ModelFile => Self::Name,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Manufacturer => "Manufacturer",
            Self::Year => "Year",
            Self::Colour => "Colour",
            Self::ModelFile => "Model file",
        }
    }
}

/// Editable fields for a car. Initialized empty (create) or from the
/// selected car (edit).
struct CarForm {
    editing_id: Option<DocumentId>,
    name: Input,
    manufacturer: Input,
    year: Input,
    colour: Input,
    model_file: Input,
    approved: bool,
    field: FormField,
}

impl CarForm {
    fn blank() -> Self {
        Self {
            editing_id: None,
            name: Input::default(),
            manufacturer: Input::default(),
            year: Input::new("2025".into()),
            colour: Input::new("#ff0000".into()),
            model_file: Input::default(),
            approved: false,
            field: FormField::Name,
        }
    }

    fn from_car(car: &Car) -> Self {
        Self {
            editing_id: Some(car.id.clone()),
            name: Input::new(car.name.clone()),
            manufacturer: Input::new(car.manufacturer.clone()),
            year: Input::new(car.year.to_string()),
            colour: Input::new(car.colour.as_str().to_owned()),
            model_file: Input::new(car.model_file.clone().unwrap_or_default()),
            approved: car.approved,
            field: FormField::Name,
        }
    }

    fn active_input(&mut self) -> &mut Input {
        match self.field {
            FormField::Name => &mut self.name,
            FormField::Manufacturer => &mut self.manufacturer,
            FormField::Year => &mut self.year,
            FormField::Colour => &mut self.colour,
            FormField::ModelFile => &mut self.model_file,
        }
    }

    fn to_command(&self) -> std::result::Result<Command, String> {
        let year: u16 = self
            .year
            .value()
            .trim()
            .parse()
            .map_err(|_| format!("year {:?} is not a number", self.year.value()))?;
        let model_file = {
            let v = self.model_file.value().trim();
            if v.is_empty() {
                None
            } else {
                Some(v.to_owned())
            }
        };
        Ok(Command::SaveCar {
            id: self.editing_id.clone(),
            request: SaveCarRequest {
                name: self.name.value().to_owned(),
                manufacturer: self.manufacturer.value().to_owned(),
                year,
                colour: self.colour.value().trim().to_owned(),
                model_file,
                approved: self.approved,
            },
        })
    }
}

pub struct AdminCarsScreen {
    focused: bool,
    cars: Vec<Arc<Car>>,
    table: TableState,
    form: Option<CarForm>,
}

impl AdminCarsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            cars: Vec::new(),
            table: TableState::default(),
            form: None,
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

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        let form = self.form.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                None
            }
            KeyCode::Tab => {
                form.field = form.field.next();
                None
            }
            KeyCode::Char(' ') if form.field == FormField::ModelFile => {
                // Space toggles approval from the last field for quick entry.
                form.approved = !form.approved;
                None
            }
            KeyCode::Enter => match form.to_command() {
                Ok(command) => {
                    self.form = None;
                    Some(Action::Submit(command))
                }
                Err(message) => Some(Action::Notify(Notification::warning(message))),
            },
            _ => {
                form.active_input()
                    .handle_event(&crossterm::event::Event::Key(key));
                None
            }
        }
    }

    /// Read a local `.glb`/`.gltf` file named in the model-file field and
    /// upload it; the resulting blob path replaces the field's value.
    fn upload_model(&mut self) -> Option<Action> {
        let form = self.form.as_mut()?;
        let path = form.model_file.value().trim().to_owned();
        if path.is_empty() {
            return Some(Action::Notify(Notification::warning(
                "Enter a local .glb/.gltf path in the model-file field first",
            )));
        }
        let file_name = std::path::Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        match std::fs::read(&path) {
            Ok(bytes) => Some(Action::Submit(Command::UploadModel(UploadModelRequest {
                file_name,
                bytes,
            }))),
            Err(e) => Some(Action::Notify(Notification::error(format!(
                "Cannot read {path}: {e}"
            )))),
        }
    }
}

impl Component for AdminCarsScreen {
    fn unmount(&mut self) {
        self.form = None;
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.form.is_some() {
            if key.code == KeyCode::Char('u')
                && key
                    .modifiers
                    .contains(crossterm::event::KeyModifiers::CONTROL)
            {
                return Ok(self.upload_model());
            }
            return Ok(self.handle_form_key(key));
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('n') => {
                self.form = Some(CarForm::blank());
                Ok(None)
            }
            KeyCode::Char('e') => {
                if let Some(car) = self.selected() {
                    self.form = Some(CarForm::from_car(car));
                }
                Ok(None)
            }
            KeyCode::Char('a') => Ok(self.selected().map(|car| {
                Action::Submit(Command::ApproveCar { id: car.id.clone() })
            })),
            KeyCode::Char('d') => Ok(self.selected().map(|car| {
                Action::Confirm(ConfirmAction {
                    message: format!("Delete car \"{}\"?", car.name),
                    command: Command::DeleteCar { id: car.id.clone() },
                })
            })),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::CarsUpdated(cars) => {
                let mut all: Vec<Arc<Car>> = cars.iter().cloned().collect();
                all.sort_by(|a, b| a.name.cmp(&b.name));
                self.cars = all;
                if self.table.selected().unwrap_or(0) >= self.cars.len() {
                    self.table
                        .select(Some(self.cars.len().saturating_sub(1)));
                }
            }
            Action::ModelPathReady { path } => {
                if let Some(form) = self.form.as_mut() {
                    form.model_file = Input::new(path.clone());
                }
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
            Cell::from("Approved").style(theme::table_header()),
            Cell::from("Model").style(theme::table_header()),
        ]);

        let rows: Vec<Row> = self
            .cars
            .iter()
            .map(|car| {
                let approved = if car.approved { "✓" } else { "✗" };
                Row::new(vec![
                    Cell::from(car.name.clone()),
                    Cell::from(car.manufacturer.clone()),
                    Cell::from(car.year.to_string()),
                    Cell::from(Line::from(swatch::span(&car.colour))),
                    Cell::from(approved),
                    Cell::from(car.model_file.clone().unwrap_or_else(|| "—".into())),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Min(14),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Min(12),
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
                        format!(" Cars ({}) ", self.cars.len()),
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

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "n new   e edit   a approve   d delete   ↑↓ select",
                theme::hint_style(),
            ))),
            footer_area,
        );

        if let Some(form) = &self.form {
            self.render_form(frame, area, form);
        }
    }

    fn wants_text_input(&self) -> bool {
        self.form.is_some()
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "admin-cars"
    }
}

impl AdminCarsScreen {
    fn render_form(&self, frame: &mut Frame, area: Rect, form: &CarForm) {
        let [overlay] = Layout::horizontal([Constraint::Length(58)])
            .flex(Flex::Center)
            .areas(area);
        let [overlay] = Layout::vertical([Constraint::Length(12)])
            .flex(Flex::Center)
            .areas(overlay);

        frame.render_widget(Clear, overlay);

        let style = |field: FormField| {
            if field == form.field {
                theme::field_focused()
            } else {
                theme::label_style()
            }
        };
        let field_line = |field: FormField, value: String| {
            Line::from(vec![
                Span::styled(format!("{:<14}", field.label()), theme::hint_style()),
                Span::styled(value, style(field)),
            ])
        };

        let title = if form.editing_id.is_some() {
            " Edit car "
        } else {
            " New car "
        };

        let lines = vec![
            field_line(FormField::Name, form.name.value().to_owned()),
            field_line(FormField::Manufacturer, form.manufacturer.value().to_owned()),
            field_line(FormField::Year, form.year.value().to_owned()),
            field_line(FormField::Colour, form.colour.value().to_owned()),
            field_line(FormField::ModelFile, form.model_file.value().to_owned()),
            Line::from(vec![
                Span::styled("Approved      ", theme::hint_style()),
                Span::styled(
                    if form.approved { "yes" } else { "no" },
                    theme::label_style(),
                ),
            ]),
            Line::default(),
            Line::from(Span::styled(
                "tab field   enter save   ctrl-u upload model   esc cancel",
                theme::hint_style(),
            )),
        ];

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(Span::styled(title, theme::title_style()))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_focused()),
            ),
            overlay,
        );
    }
}
