//! Star rendering for review ratings.

use ratatui::style::Style;
use ratatui::text::Span;

use showroom_core::Rating;

use crate::theme;

/// Render a rating as a five-star string, e.g. `★★★★☆`.
pub fn stars(rating: Rating) -> String {
    let filled = usize::from(rating.value());
    let mut out = String::with_capacity(5 * '★'.len_utf8());
    for i in 0..5 {
        out.push(if i < filled { '★' } else { '☆' });
    }
    out
}

/// Render a rating as a styled span (gold stars).
pub fn span(rating: Rating) -> Span<'static> {
    Span::styled(stars(rating), Style::default().fg(theme::STAR_GOLD))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn five_stars_is_all_filled() {
        assert_eq!(stars(Rating::new(5).unwrap()), "★★★★★");
    }

    #[test]
    fn partial_rating_pads_with_hollow_stars() {
        assert_eq!(stars(Rating::new(2).unwrap()), "★★☆☆☆");
        assert_eq!(stars(Rating::new(1).unwrap()), "★☆☆☆☆");
    }
}
