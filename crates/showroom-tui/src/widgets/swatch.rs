//! Colour chip rendering for car colours.

use ratatui::style::{Color, Style};
use ratatui::text::Span;

use showroom_core::Colour;

/// Translate a car colour into a terminal colour.
pub fn terminal_color(colour: &Colour) -> Color {
    let (r, g, b) = colour.rgb();
    Color::Rgb(r, g, b)
}

/// A small coloured chip followed by the hex code, e.g. `■ #ff0000`.
pub fn span(colour: &Colour) -> Span<'static> {
    Span::styled(
        format!("■ {colour}"),
        Style::default().fg(terminal_color(colour)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn maps_hex_to_rgb() {
        let colour = Colour::parse("#336699").unwrap();
        assert_eq!(terminal_color(&colour), Color::Rgb(0x33, 0x66, 0x99));
    }
}
