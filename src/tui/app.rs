use crossterm::event::{MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tokio::sync::mpsc;
use tracing::debug;

use super::events::Event;
use super::feed::FeedView;
use super::keys::{KeyAction, KeyMap};
use super::render::{reviews_count_label, TerminalRenderer};
use super::Frame;
use crate::reviews::{FeedEventSink, FeedMessage, FeedPhase, ReviewsController, ScrollGeometry, StateSnapshot};

/// Lines moved per mouse wheel notch
const WHEEL_STEP: isize = 3;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// Main application state for the feed viewer
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// The feed controller; the app is its only owner
    pub controller: ReviewsController,

    /// List view over the controller
    pub view: FeedView<TerminalRenderer>,

    /// Key mappings for the application
    pub key_map: KeyMap,

    /// Status message to display
    pub status_message: Option<String>,

    /// Show help overlay
    pub show_help: bool,

    ticks: usize,
}

impl App {
    pub fn new(controller: ReviewsController, renderer: TerminalRenderer) -> Self {
        Self {
            should_quit: false,
            controller,
            view: FeedView::new(renderer),
            key_map: KeyMap::default(),
            status_message: None,
            show_help: false,
            ticks: 0,
        }
    }

    /// Forward feed state changes into the event loop
    pub fn attach(&mut self, sender: mpsc::UnboundedSender<Event>) {
        self.controller.subscribe(move |snapshot| {
            let _ = sender.send(Event::FeedChanged(snapshot.clone()));
        });
    }

    /// Load the first page
    pub fn start(&mut self) {
        self.controller.dispatch(FeedMessage::RequestNextPage);
    }

    /// Handle incoming events; returns true when the app should exit
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key_event) => {
                if let Some(action) = self.key_map.action(&key_event) {
                    self.handle_action(action);
                }
            }

            Event::Mouse(mouse_event) => self.handle_mouse(mouse_event),

            Event::Resize(width, height) => {
                self.view.set_viewport(Rect::new(0, 0, width, height.saturating_sub(1)));
                self.view.clamp(&self.controller);
            }

            Event::Tick => {
                self.ticks = self.ticks.wrapping_add(1);
            }

            Event::FeedChanged(snapshot) => self.handle_feed_changed(&snapshot),
        }

        self.should_quit
    }

    fn handle_action(&mut self, action: KeyAction) {
        let geometry = match action {
            KeyAction::Quit => {
                self.should_quit = true;
                return;
            }
            KeyAction::Help => {
                self.show_help = !self.show_help;
                return;
            }
            KeyAction::ShowMore => {
                if let Some(id) = self.view.selected_item_id(&self.controller) {
                    self.controller.on_show_more(id);
                }
                return;
            }
            KeyAction::Reload => {
                self.controller.dispatch(FeedMessage::Reset);
                self.view.select_first(&self.controller);
                self.controller.dispatch(FeedMessage::RequestNextPage);
                return;
            }
            KeyAction::Down => self.view.move_selection(&self.controller, 1),
            KeyAction::Up => self.view.move_selection(&self.controller, -1),
            KeyAction::PageDown => {
                let rows = self.view.page_rows(&self.controller) as isize;
                self.view.move_selection(&self.controller, rows)
            }
            KeyAction::PageUp => {
                let rows = self.view.page_rows(&self.controller) as isize;
                self.view.move_selection(&self.controller, -rows)
            }
            KeyAction::Top => self.view.select_first(&self.controller),
            KeyAction::Bottom => self.view.select_last(&self.controller),
        };

        self.scroll_settled(geometry);
    }

    fn handle_mouse(&mut self, mouse_event: MouseEvent) {
        let delta = match mouse_event.kind {
            MouseEventKind::ScrollDown => WHEEL_STEP,
            MouseEventKind::ScrollUp => -WHEEL_STEP,
            _ => return,
        };
        let geometry = self.view.scroll_by(&self.controller, delta);
        self.scroll_settled(geometry);
    }

    fn scroll_settled(&mut self, geometry: ScrollGeometry) {
        self.controller.on_scroll_will_end(geometry);
    }

    fn handle_feed_changed(&mut self, snapshot: &StateSnapshot) {
        self.view.clamp(&self.controller);

        match &snapshot.last_error {
            Some(error) => {
                self.status_message = Some(format!(
                    "Failed to load reviews: {} (scroll or press ↓ to retry)",
                    error
                ));
            }
            None => {
                self.status_message = None;
                // A page shorter than the screen cannot be scrolled, so check right away
                if snapshot.phase == FeedPhase::Idle {
                    let geometry = self.view.geometry(&self.controller);
                    debug!("Feed changed, remaining distance {}", geometry.remaining_distance());
                    self.scroll_settled(geometry);
                }
            }
        }
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Feed
                Constraint::Length(1), // Status bar
            ])
            .split(frame.size());

        self.view.render(frame, chunks[0], &self.controller);
        self.render_status_bar(frame, chunks[1]);

        if self.show_help {
            self.render_help_overlay(frame);
        }
    }

    fn status_text(&self) -> String {
        if let Some(ref message) = self.status_message {
            return message.clone();
        }

        let loaded = reviews_count_label(self.controller.state().items().len());
        match self.controller.phase() {
            FeedPhase::Fetching => format!(
                "{} {} | loading more...",
                SPINNER[self.ticks % SPINNER.len()],
                loaded
            ),
            FeedPhase::Idle => format!("{} | ? for help | q to quit", loaded),
            FeedPhase::Exhausted => format!("{} | end of feed | q to quit", loaded),
        }
    }

    /// Render the status bar
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let style = if self.status_message.is_some() {
            Style::default().fg(Color::White).bg(Color::Red)
        } else {
            Style::default().fg(Color::Black).bg(Color::Gray)
        };

        frame.render_widget(Paragraph::new(self.status_text()).style(style), area);
    }

    /// Render help overlay
    fn render_help_overlay(&self, frame: &mut Frame) {
        let help_area = centered_rect(60, 50, frame.size());

        let help_block = Block::default()
            .borders(Borders::ALL)
            .title("Help");

        let help_paragraph = Paragraph::new(self.key_map.help_text()).block(help_block);

        frame.render_widget(Clear, help_area);
        frame.render_widget(help_paragraph, help_area);
    }
}

/// Create a centered rectangle with given percentage of the screen
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::{ControllerOptions, FixtureReviewsProvider, Page, ReviewRecord};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;

    fn app(total: usize, page_size: usize) -> App {
        let page = Page {
            records: (0..total)
                .map(|i| ReviewRecord {
                    text: format!("review {}", i),
                    created_at: "вчера".to_string(),
                    first_name: "Имя".to_string(),
                    last_name: "Фамилия".to_string(),
                    rating: 4,
                })
                .collect(),
            total_count: total,
        };
        let provider = Arc::new(FixtureReviewsProvider::new(page, page_size));
        let controller = ReviewsController::new(
            provider,
            ControllerOptions {
                page_size,
                ..ControllerOptions::default()
            },
        );
        let mut app = App::new(controller, TerminalRenderer::new(3));
        app.handle_event(Event::Resize(60, 21));
        app
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_feed_change_prefetches_short_content() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut app = app(30, 2);
        app.attach(sender);

        app.start();
        app.controller.wait_for_fetch().await;
        let Some(Event::FeedChanged(snapshot)) = receiver.recv().await else {
            panic!("expected a feed change");
        };
        assert_eq!(snapshot.items.len(), 2);

        // two reviews fill 10 of 20 lines, so the next page is requested immediately
        app.handle_event(Event::FeedChanged(snapshot));
        assert_eq!(app.controller.phase(), FeedPhase::Fetching);
    }

    #[tokio::test]
    async fn test_show_more_expands_selected_review() {
        let mut app = app(3, 20);
        app.start();
        app.controller.wait_for_fetch().await;

        app.handle_event(key(KeyCode::Down));
        app.handle_event(key(KeyCode::Enter));

        let items = app.controller.snapshot().items;
        assert!(items[0].truncated);
        assert!(!items[1].truncated);
    }

    #[tokio::test]
    async fn test_reload_starts_over() {
        let mut app = app(3, 20);
        app.start();
        app.controller.wait_for_fetch().await;
        assert_eq!(app.controller.phase(), FeedPhase::Exhausted);

        app.handle_event(Event::Key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE)));
        assert_eq!(app.controller.phase(), FeedPhase::Fetching);
        assert_eq!(app.controller.state().items().len(), 0);

        app.controller.wait_for_fetch().await;
        assert_eq!(app.controller.state().items().len(), 3);
    }

    #[tokio::test]
    async fn test_failure_sets_status_message() {
        let mut app = app(3, 20);
        let mut snapshot = app.controller.snapshot();
        snapshot.last_error = Some("connection refused".to_string());

        app.handle_event(Event::FeedChanged(snapshot));
        assert!(app.status_text().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_quit_key() {
        let mut app = app(1, 20);
        assert!(!app.handle_event(Event::Tick));
        assert!(app.handle_event(key(KeyCode::Char('q'))));
    }
}
