//! Terminal rendering of feed rows.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::reviews::DisplayItem;

/// Label of the affordance that expands a clipped review
pub const SHOW_MORE_LABEL: &str = "Show more...";

/// Turns display items and the summary row into styled lines.
pub trait ReviewRenderer {
    fn render_review(&self, item: &DisplayItem, width: u16) -> Vec<Line<'static>>;

    fn render_summary(&self, loaded: usize) -> Line<'static>;

    /// Height of a review row in lines
    fn review_height(&self, item: &DisplayItem, width: u16) -> usize {
        self.render_review(item, width).len()
    }
}

/// Renders an integer rating as a row of stars
#[derive(Debug, Clone)]
pub struct RatingRenderer {
    pub max_rating: usize,
    pub filled: char,
    pub empty: char,
}

impl Default for RatingRenderer {
    fn default() -> Self {
        Self {
            max_rating: 5,
            filled: '★',
            empty: '☆',
        }
    }
}

impl RatingRenderer {
    /// Ratings outside `0..=max_rating` are clamped
    pub fn render(&self, rating: i64) -> String {
        let filled = rating.clamp(0, self.max_rating as i64) as usize;
        let mut stars = String::with_capacity(self.max_rating * 3);
        stars.extend(std::iter::repeat(self.filled).take(filled));
        stars.extend(std::iter::repeat(self.empty).take(self.max_rating - filled));
        stars
    }
}

/// Styles for the parts of a review row
#[derive(Debug, Clone)]
pub struct ReviewStyles {
    pub name: Style,
    pub rating: Style,
    pub text: Style,
    pub show_more: Style,
    pub date: Style,
    pub summary: Style,
}

impl Default for ReviewStyles {
    fn default() -> Self {
        Self {
            name: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            rating: Style::default().fg(Color::Yellow),
            text: Style::default().fg(Color::White),
            show_more: Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            date: Style::default().fg(Color::DarkGray),
            summary: Style::default().fg(Color::Gray),
        }
    }
}

/// Default renderer for the terminal viewer
#[derive(Debug, Clone)]
pub struct TerminalRenderer {
    /// Text lines shown while an item is truncated; 0 never clips
    pub collapsed_lines: usize,
    pub rating: RatingRenderer,
    pub styles: ReviewStyles,
}

impl TerminalRenderer {
    pub fn new(collapsed_lines: usize) -> Self {
        Self {
            collapsed_lines,
            rating: RatingRenderer::default(),
            styles: ReviewStyles::default(),
        }
    }

    /// Wrapped text lines and whether some of them were clipped
    fn text_lines(&self, item: &DisplayItem, width: u16) -> (Vec<String>, bool) {
        let wrapped: Vec<String> = textwrap::wrap(&item.rendered_text, usize::from(width.max(1)))
            .into_iter()
            .map(|line| line.into_owned())
            .collect();

        if item.truncated && self.collapsed_lines > 0 && wrapped.len() > self.collapsed_lines {
            (wrapped.into_iter().take(self.collapsed_lines).collect(), true)
        } else {
            (wrapped, false)
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ReviewRenderer for TerminalRenderer {
    fn render_review(&self, item: &DisplayItem, width: u16) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(item.rendered_name.clone(), self.styles.name)),
            Line::from(Span::styled(self.rating.render(item.rating), self.styles.rating)),
        ];

        let (text, clipped) = self.text_lines(item, width);
        lines.extend(
            text.into_iter()
                .map(|line| Line::from(Span::styled(line, self.styles.text))),
        );
        if clipped {
            lines.push(Line::from(Span::styled(SHOW_MORE_LABEL, self.styles.show_more)));
        }

        lines.push(Line::from(Span::styled(
            item.rendered_date.clone(),
            self.styles.date,
        )));
        // separator
        lines.push(Line::default());

        lines
    }

    fn render_summary(&self, loaded: usize) -> Line<'static> {
        Line::from(Span::styled(reviews_count_label(loaded), self.styles.summary))
    }
}

/// Pick the Russian plural form for `count`.
///
/// `forms` holds the singular, paucal (2-4) and genitive plural forms.
pub fn counter_with_declension(count: usize, forms: [&str; 3]) -> String {
    let form = match (count % 100, count % 10) {
        (11..=14, _) => forms[2],
        (_, 1) => forms[0],
        (_, 2..=4) => forms[1],
        _ => forms[2],
    };
    format!("{} {}", count, form)
}

/// Summary label for the number of loaded reviews
pub fn reviews_count_label(count: usize) -> String {
    counter_with_declension(count, ["отзыв", "отзыва", "отзывов"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::{ItemFactory, ReviewRecord};

    fn item(text: &str) -> DisplayItem {
        ItemFactory::new().to_display_item(ReviewRecord {
            text: text.to_string(),
            created_at: "13 января".to_string(),
            first_name: "Пётр".to_string(),
            last_name: "Первый".to_string(),
            rating: 3,
        })
    }

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_declension() {
        let cases = [
            (0, "0 отзывов"),
            (1, "1 отзыв"),
            (2, "2 отзыва"),
            (4, "4 отзыва"),
            (5, "5 отзывов"),
            (11, "11 отзывов"),
            (14, "14 отзывов"),
            (21, "21 отзыв"),
            (22, "22 отзыва"),
            (111, "111 отзывов"),
            (112, "112 отзывов"),
            (1001, "1001 отзыв"),
        ];
        for (count, expected) in cases {
            assert_eq!(reviews_count_label(count), expected, "count {}", count);
        }
    }

    #[test]
    fn test_rating_stars() {
        let renderer = RatingRenderer::default();
        assert_eq!(renderer.render(3), "★★★☆☆");
        assert_eq!(renderer.render(0), "☆☆☆☆☆");
        assert_eq!(renderer.render(9), "★★★★★");
        assert_eq!(renderer.render(-2), "☆☆☆☆☆");
    }

    #[test]
    fn test_long_text_is_clipped_until_expanded() {
        let renderer = TerminalRenderer::new(2);
        let review = item("one two three four five six seven eight nine ten");

        let collapsed = renderer.render_review(&review, 10);
        let labels: Vec<String> = collapsed.iter().map(plain).collect();
        assert_eq!(labels[0], "Пётр Первый");
        assert_eq!(labels[1], "★★★☆☆");
        assert!(labels.contains(&SHOW_MORE_LABEL.to_string()));
        // name, rating, 2 text lines, show more, date, separator
        assert_eq!(collapsed.len(), 7);

        let expanded = renderer.render_review(&review.expanded(), 10);
        let labels: Vec<String> = expanded.iter().map(plain).collect();
        assert!(!labels.contains(&SHOW_MORE_LABEL.to_string()));
        assert_eq!(expanded.len(), 10);
        assert_eq!(labels[labels.len() - 2], "13 января");
    }

    #[test]
    fn test_short_text_has_no_affordance() {
        let renderer = TerminalRenderer::new(3);
        let lines = renderer.render_review(&item("Fine"), 40);
        assert_eq!(lines.len(), 5);
        assert_eq!(renderer.review_height(&item("Fine"), 40), 5);
    }

    #[test]
    fn test_summary_line() {
        let renderer = TerminalRenderer::default();
        assert_eq!(plain(&renderer.render_summary(45)), "45 отзывов");
    }
}
