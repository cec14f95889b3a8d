//! Scrollable list view over a feed data source.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::render::ReviewRenderer;
use super::Frame;
use crate::reviews::{FeedDataSource, FeedRow, ItemId, ScrollGeometry};

/// Height of the summary row in lines
const SUMMARY_HEIGHT: usize = 1;

/// Columns taken by the selection gutter
const GUTTER_WIDTH: u16 = 2;

/// Position of one row inside the content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowSpan {
    start: usize,
    height: usize,
}

/// Selection and scroll position of the feed list.
///
/// Measures rows in terminal lines and reports scroll geometry in the same unit.
#[derive(Debug)]
pub struct FeedView<R: ReviewRenderer> {
    renderer: R,
    selected: usize,
    scroll_y: usize,
    viewport: Rect,
}

impl<R: ReviewRenderer> FeedView<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            selected: 0,
            scroll_y: 0,
            viewport: Rect::default(),
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn scroll_y(&self) -> usize {
        self.scroll_y
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    fn text_width(&self) -> u16 {
        self.viewport.width.saturating_sub(GUTTER_WIDTH).max(1)
    }

    fn row_height<S: FeedDataSource>(&self, source: &S, index: usize) -> usize {
        match source.row(index) {
            Some(FeedRow::Review(item)) => self.renderer.review_height(item, self.text_width()),
            Some(FeedRow::Summary { .. }) => SUMMARY_HEIGHT,
            None => 0,
        }
    }

    fn layout<S: FeedDataSource>(&self, source: &S) -> Vec<RowSpan> {
        let mut start = 0;
        (0..source.item_count())
            .map(|index| {
                let height = self.row_height(source, index);
                let span = RowSpan { start, height };
                start += height;
                span
            })
            .collect()
    }

    fn content_height(layout: &[RowSpan]) -> usize {
        layout.last().map_or(0, |span| span.start + span.height)
    }

    /// Scroll geometry for the current position
    pub fn geometry<S: FeedDataSource>(&self, source: &S) -> ScrollGeometry {
        let layout = self.layout(source);
        ScrollGeometry::new(
            f64::from(self.viewport.height),
            Self::content_height(&layout) as f64,
            self.scroll_y as f64,
        )
    }

    /// Id of the selected review, `None` on the summary row
    pub fn selected_item_id<S: FeedDataSource>(&self, source: &S) -> Option<ItemId> {
        match source.row(self.selected) {
            Some(FeedRow::Review(item)) => Some(item.id),
            _ => None,
        }
    }

    /// Move the selection by `delta` rows and scroll it into view
    pub fn move_selection<S: FeedDataSource>(&mut self, source: &S, delta: isize) -> ScrollGeometry {
        let last = source.item_count().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
        self.ensure_selected_visible(source);
        self.geometry(source)
    }

    pub fn select_first<S: FeedDataSource>(&mut self, source: &S) -> ScrollGeometry {
        self.selected = 0;
        self.ensure_selected_visible(source);
        self.geometry(source)
    }

    pub fn select_last<S: FeedDataSource>(&mut self, source: &S) -> ScrollGeometry {
        self.selected = source.item_count().saturating_sub(1);
        self.ensure_selected_visible(source);
        self.geometry(source)
    }

    /// Scroll the content by `delta` lines without moving the selection
    pub fn scroll_by<S: FeedDataSource>(&mut self, source: &S, delta: isize) -> ScrollGeometry {
        let layout = self.layout(source);
        self.scroll_y = self.scroll_y.saturating_add_signed(delta).min(self.max_scroll(&layout));
        self.geometry(source)
    }

    /// Keep the position valid after the data changed
    pub fn clamp<S: FeedDataSource>(&mut self, source: &S) {
        let last = source.item_count().saturating_sub(1);
        self.selected = self.selected.min(last);
        let layout = self.layout(source);
        self.scroll_y = self.scroll_y.min(self.max_scroll(&layout));
    }

    /// Number of rows in one viewport, for page-wise movement
    pub fn page_rows<S: FeedDataSource>(&self, source: &S) -> usize {
        let layout = self.layout(source);
        let viewport = usize::from(self.viewport.height);
        layout
            .iter()
            .skip(self.selected)
            .scan(0usize, |used, span| {
                *used += span.height;
                (*used <= viewport).then_some(())
            })
            .count()
            .max(1)
    }

    fn max_scroll(&self, layout: &[RowSpan]) -> usize {
        Self::content_height(layout).saturating_sub(usize::from(self.viewport.height))
    }

    fn ensure_selected_visible<S: FeedDataSource>(&mut self, source: &S) {
        let layout = self.layout(source);
        let Some(span) = layout.get(self.selected) else {
            return;
        };
        let viewport = usize::from(self.viewport.height);

        if span.start < self.scroll_y {
            self.scroll_y = span.start;
        } else if span.start + span.height > self.scroll_y + viewport {
            self.scroll_y = (span.start + span.height).saturating_sub(viewport).min(span.start);
        }
        self.scroll_y = self.scroll_y.min(self.max_scroll(&layout));
    }

    pub fn render<S: FeedDataSource>(&mut self, frame: &mut Frame, area: Rect, source: &S) {
        self.set_viewport(area);
        self.clamp(source);

        let width = self.text_width();
        let gutter = Span::styled("▌ ", Style::default().fg(Color::Cyan));
        let blank = Span::raw("  ");

        let mut lines: Vec<Line<'static>> = Vec::new();
        for index in 0..source.item_count() {
            let row_lines = match source.row(index) {
                Some(FeedRow::Review(item)) => self.renderer.render_review(item, width),
                Some(FeedRow::Summary { loaded }) => vec![self.renderer.render_summary(loaded)],
                None => continue,
            };
            let marker = if index == self.selected { &gutter } else { &blank };
            lines.extend(row_lines.into_iter().map(|line| {
                let mut spans = vec![marker.clone()];
                spans.extend(line.spans);
                Line::from(spans)
            }));
        }

        let visible: Vec<Line<'static>> = lines
            .into_iter()
            .skip(self.scroll_y)
            .take(usize::from(area.height))
            .collect();

        frame.render_widget(Paragraph::new(visible), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::{DisplayItem, ItemFactory, ReviewRecord};
    use crate::tui::render::TerminalRenderer;

    struct StaticSource {
        items: Vec<DisplayItem>,
    }

    impl StaticSource {
        fn new(count: usize) -> Self {
            let factory = ItemFactory::new();
            Self {
                items: (0..count)
                    .map(|i| {
                        factory.to_display_item(ReviewRecord {
                            text: format!("short {}", i),
                            created_at: "today".to_string(),
                            first_name: "A".to_string(),
                            last_name: "B".to_string(),
                            rating: 4,
                        })
                    })
                    .collect(),
            }
        }
    }

    impl FeedDataSource for StaticSource {
        fn item_count(&self) -> usize {
            self.items.len() + 1
        }

        fn row(&self, index: usize) -> Option<FeedRow<'_>> {
            if index < self.items.len() {
                Some(FeedRow::Review(&self.items[index]))
            } else if index == self.items.len() {
                Some(FeedRow::Summary {
                    loaded: self.items.len(),
                })
            } else {
                None
            }
        }
    }

    fn view(height: u16) -> FeedView<TerminalRenderer> {
        let mut view = FeedView::new(TerminalRenderer::new(3));
        view.set_viewport(Rect::new(0, 0, 40, height));
        view
    }

    #[test]
    fn test_geometry_counts_rows_in_lines() {
        // each short review: name, rating, text, date, separator
        let source = StaticSource::new(4);
        let view = view(10);
        let geometry = view.geometry(&source);
        assert_eq!(geometry.content_height, 21.0);
        assert_eq!(geometry.viewport_height, 10.0);
        assert_eq!(geometry.target_scroll_y, 0.0);
    }

    #[test]
    fn test_moving_selection_scrolls_into_view() {
        let source = StaticSource::new(10);
        let mut view = view(10);

        let geometry = view.move_selection(&source, 3);
        assert_eq!(view.selected(), 3);
        assert_eq!(view.scroll_y(), 10);
        assert_eq!(geometry.target_scroll_y, 10.0);

        view.move_selection(&source, -3);
        assert_eq!(view.scroll_y(), 0);

        view.select_last(&source);
        assert_eq!(view.selected(), 10);
        assert_eq!(view.scroll_y(), 41);
        assert_eq!(view.selected_item_id(&source), None);

        view.select_first(&source);
        assert_eq!(view.selected_item_id(&source), Some(source.items[0].id));
    }

    #[test]
    fn test_selection_is_clamped() {
        let source = StaticSource::new(2);
        let mut view = view(10);
        view.move_selection(&source, 100);
        assert_eq!(view.selected(), 2);
        view.move_selection(&source, -100);
        assert_eq!(view.selected(), 0);
    }

    #[test]
    fn test_scroll_by_stays_within_content() {
        let source = StaticSource::new(10);
        let mut view = view(10);
        view.scroll_by(&source, 1000);
        assert_eq!(view.scroll_y(), 41);
        view.scroll_by(&source, -5);
        assert_eq!(view.scroll_y(), 36);
        view.scroll_by(&source, -1000);
        assert_eq!(view.scroll_y(), 0);
    }

    #[test]
    fn test_page_rows() {
        let source = StaticSource::new(10);
        let view = view(12);
        assert_eq!(view.page_rows(&source), 2);
    }
}
