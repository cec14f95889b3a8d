use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::reviews::StateSnapshot;

/// Application events
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Mouse input event
    Mouse(MouseEvent),

    /// Terminal resize event
    Resize(u16, u16),

    /// Periodic tick event
    Tick,

    /// The reviews feed published a new state
    FeedChanged(StateSnapshot),
}

/// Event handler merging terminal input, ticks and internal events
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<Event>,

    /// Event sender channel
    sender: mpsc::UnboundedSender<Event>,

    /// Terminal reader task
    reader: JoinHandle<()>,
}

impl EventHandler {
    /// Create a new event handler ticking every `tick_interval`
    pub fn new(tick_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let reader = tokio::spawn(Self::read_terminal(sender.clone(), tick_interval));

        Self {
            receiver,
            sender,
            reader,
        }
    }

    async fn read_terminal(sender: mpsc::UnboundedSender<Event>, tick_interval: Duration) {
        let mut stream = EventStream::new();
        let mut ticks = tokio::time::interval(tick_interval);

        loop {
            let event = tokio::select! {
                _ = ticks.tick() => Event::Tick,
                maybe_event = stream.next() => match maybe_event {
                    Some(Ok(event)) => match Self::convert_crossterm_event(event) {
                        Some(event) => event,
                        None => continue,
                    },
                    Some(Err(e)) => {
                        warn!("Terminal event error: {}", e);
                        continue;
                    }
                    None => break,
                },
            };

            if sender.send(event).is_err() {
                break;
            }
        }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Convert crossterm events to application events
    fn convert_crossterm_event(event: CrosstermEvent) -> Option<Event> {
        match event {
            CrosstermEvent::Key(key_event) if key_event.kind != KeyEventKind::Release => {
                Some(Event::Key(key_event))
            }
            CrosstermEvent::Mouse(mouse_event) => Some(Event::Mouse(mouse_event)),
            CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
            _ => None,
        }
    }

    /// Get a clone of the sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
