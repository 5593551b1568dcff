//! Midnight garage palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const RACING_RED: Color = Color::Rgb(224, 49, 64); // #e03140
pub const CHROME_CYAN: Color = Color::Rgb(102, 217, 239); // #66d9ef
pub const AMBER: Color = Color::Rgb(255, 184, 108); // #ffb86c
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const STAR_GOLD: Color = Color::Rgb(241, 250, 140); // #f1fa8c

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(40, 42, 54); // #282a36

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default()
        .fg(CHROME_CYAN)
        .add_modifier(Modifier::BOLD)
}

/// Border for a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(RACING_RED)
}

/// Border for an unfocused panel.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Table header row.
pub fn table_header() -> Style {
    Style::default()
        .fg(CHROME_CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// An ordinary table row.
pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// The selected table row.
pub fn table_selected() -> Style {
    Style::default()
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Dimmed helper text (key hints, footers).
pub fn hint_style() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// A form label.
pub fn label_style() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// The focused form field.
pub fn field_focused() -> Style {
    Style::default().fg(AMBER).add_modifier(Modifier::BOLD)
}
