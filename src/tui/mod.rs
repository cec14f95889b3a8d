//! Terminal viewer for the reviews feed, built on ratatui.

mod app;
mod events;
mod feed;
mod keys;
pub mod render;

pub use app::App;
pub use events::{Event, EventHandler};
pub use feed::FeedView;
pub use keys::{KeyAction, KeyMap};

use anyhow::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::reviews::{ControllerOptions, FetchCompletion, ReviewsController, ReviewsProvider};
use render::TerminalRenderer;

pub type Backend = CrosstermBackend<io::Stdout>;
pub type Frame<'a> = ratatui::Frame<'a>;

const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Main TUI entry point
pub async fn run(config: &Config, provider: Arc<dyn ReviewsProvider>) -> Result<()> {
    let controller = ReviewsController::new(provider, ControllerOptions::from(config));
    let mut app = App::new(controller, TerminalRenderer::new(config.collapsed_lines));

    let mut terminal = init_terminal()?;
    let mut event_handler = EventHandler::new(TICK_INTERVAL);
    app.attach(event_handler.sender());
    app.start();

    let result = run_app(&mut terminal, &mut app, &mut event_handler).await;

    restore_terminal(&mut terminal)?;
    result
}

/// What woke the main loop up
enum Step {
    Input(Option<Event>),
    Fetched(Option<FetchCompletion>),
}

/// Main application loop.
///
/// Input and fetch completions are both handled here, so every change to
/// the feed state happens on this task.
async fn run_app(
    terminal: &mut Terminal<Backend>,
    app: &mut App,
    event_handler: &mut EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        let step = tokio::select! {
            event = event_handler.next() => Step::Input(event),
            completion = app.controller.recv_completion() => Step::Fetched(completion),
        };

        match step {
            Step::Input(Some(event)) => {
                if app.handle_event(event) {
                    info!("Exit requested");
                    break;
                }
            }
            Step::Input(None) => break,
            Step::Fetched(Some(completion)) => {
                app.controller.apply_completion(completion);
            }
            Step::Fetched(None) => {}
        }
    }
    Ok(())
}
