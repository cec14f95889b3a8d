//! The reviews feed controller.
//!
//! [`ReviewsController`] owns the pagination state and is the only thing that
//! mutates it. Fetches run on tokio tasks; their results come back over a
//! channel and are applied by whoever owns the controller, so every state
//! transition happens on one context and the fetching flag alone is enough to
//! keep a single fetch outstanding.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::decoder::{self, Page};
use super::errors::{FetchError, FetchResult};
use super::factory::{DisplayItem, ItemFactory, ItemId};
use super::provider::ReviewsProvider;
use super::scroll::{ScrollGeometry, DEFAULT_PREFETCH_SCREENS};
use super::state::{FeedPhase, PaginationState, StateSnapshot};
use crate::config::Config;

/// Tuning for a controller
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Reviews requested per fetch
    pub page_size: usize,

    /// Viewport heights from the end of the content at which scrolling prefetches
    pub prefetch_screens: f64,

    /// Upper bound on a single fetch; `None` waits forever
    pub fetch_timeout: Option<Duration>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: 20,
            prefetch_screens: DEFAULT_PREFETCH_SCREENS,
            fetch_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl From<&Config> for ControllerOptions {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.page_size,
            prefetch_screens: config.prefetch_screens,
            fetch_timeout: Some(config.fetch_timeout()),
        }
    }
}

/// UI events the controller reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    RequestNextPage,
    /// "Show more" was pressed on an item
    ExpandItem(ItemId),
    /// Scrolling is about to settle at the given geometry
    ScrollWillEnd(ScrollGeometry),
    Reset,
}

/// One row of the feed as the UI sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedRow<'a> {
    Review(&'a DisplayItem),
    /// Trailing footer with the number of loaded reviews
    Summary { loaded: usize },
}

/// Read side of the feed: what a list view needs to lay out its rows.
pub trait FeedDataSource {
    /// Number of rows, including the trailing summary row
    fn item_count(&self) -> usize;

    fn row(&self, index: usize) -> Option<FeedRow<'_>>;
}

/// Write side of the feed: the interactions a list view reports.
pub trait FeedEventSink {
    fn on_scroll_will_end(&mut self, geometry: ScrollGeometry);

    fn on_show_more(&mut self, id: ItemId);
}

/// Result of a fetch, on its way back to the owning context.
#[derive(Debug)]
pub struct FetchCompletion {
    generation: u64,
    offset: usize,
    result: FetchResult<Page>,
}

type StateCallback = Box<dyn Fn(&StateSnapshot) + Send + Sync>;

/// Pagination state machine for the reviews feed.
pub struct ReviewsController {
    state: PaginationState,
    provider: Arc<dyn ReviewsProvider>,
    factory: ItemFactory,
    options: ControllerOptions,
    subscribers: Vec<StateCallback>,
    completion_sender: mpsc::UnboundedSender<FetchCompletion>,
    completion_receiver: mpsc::UnboundedReceiver<FetchCompletion>,
    /// Bumped on reset so completions of orphaned fetches are recognized
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
}

impl ReviewsController {
    pub fn new(provider: Arc<dyn ReviewsProvider>, options: ControllerOptions) -> Self {
        let (completion_sender, completion_receiver) = mpsc::unbounded_channel();

        Self {
            state: PaginationState::new(options.page_size),
            provider,
            factory: ItemFactory::new(),
            options,
            subscribers: Vec::new(),
            completion_sender,
            completion_receiver,
            generation: 0,
            in_flight: None,
        }
    }

    /// Register an `onStateChange` handler. Handlers run synchronously and must not block.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&StateSnapshot) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn phase(&self) -> FeedPhase {
        self.state.phase()
    }

    /// Loaded items plus the summary slot
    pub fn item_count(&self) -> usize {
        self.state.item_count()
    }

    /// Start fetching the next page.
    ///
    /// Returns false without doing anything while a fetch is outstanding or
    /// once the feed is exhausted. Must be called within a tokio runtime.
    pub fn request_next_page(&mut self) -> bool {
        let Some(offset) = self.state.begin_fetch() else {
            debug!("Next page request ignored in phase {:?}", self.state.phase());
            return false;
        };

        info!(
            "Fetching reviews from {} at offset {}",
            self.provider.name(),
            offset
        );

        let provider = Arc::clone(&self.provider);
        let sender = self.completion_sender.clone();
        let generation = self.generation;
        let timeout = self.options.fetch_timeout;

        let handle = tokio::spawn(async move {
            let result = fetch_page(provider, offset, timeout).await;
            // The receiver lives as long as the controller
            let _ = sender.send(FetchCompletion {
                generation,
                offset,
                result,
            });
        });
        self.in_flight = Some(handle);

        true
    }

    /// Apply a finished fetch to the state and notify subscribers.
    ///
    /// Returns false if the completion belongs to a fetch orphaned by `reset`.
    pub fn apply_completion(&mut self, completion: FetchCompletion) -> bool {
        if completion.generation != self.generation {
            debug!(
                "Discarding stale page at offset {} from generation {}",
                completion.offset, completion.generation
            );
            return false;
        }
        self.in_flight = None;

        match completion.result {
            Ok(page) => {
                let received = page.records.len();
                let items = self.factory.to_display_items(page.records);
                self.state.apply_page(items, page.total_count);
                info!(
                    "Applied {} reviews at offset {} (loaded {}, total {}, more: {})",
                    received,
                    completion.offset,
                    self.state.items().len(),
                    page.total_count,
                    self.state.has_more()
                );
            }
            Err(e) => {
                warn!("Fetching reviews at offset {} failed: {}", completion.offset, e);
                self.state.fail_fetch(e.to_string());
            }
        }

        self.notify();
        true
    }

    /// Wait for the next completion from any fetch, stale ones included.
    pub async fn recv_completion(&mut self) -> Option<FetchCompletion> {
        self.completion_receiver.recv().await
    }

    /// Apply every completion that has already arrived without waiting.
    ///
    /// Returns the number of completions applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_receiver.try_recv() {
            if self.apply_completion(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until the outstanding fetch, if any, has been applied.
    ///
    /// Returns true if a completion was applied, false if nothing was in flight.
    pub async fn wait_for_fetch(&mut self) -> bool {
        while self.state.is_fetching() {
            match self.completion_receiver.recv().await {
                Some(completion) => {
                    if self.apply_completion(completion) {
                        return true;
                    }
                }
                None => return false,
            }
        }
        false
    }

    /// Show the full text of an item. Unknown ids are ignored.
    pub fn expand_item(&mut self, id: ItemId) -> bool {
        if !self.state.expand(id) {
            debug!("Expand requested for unknown item {}", id);
            return false;
        }
        self.notify();
        true
    }

    /// Drop every loaded item and start over from the first page.
    ///
    /// An outstanding fetch is aborted; if it still completes, its result is discarded.
    pub fn reset(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.generation += 1;
        self.state.reset();
        info!("Reviews feed reset");
        self.notify();
    }

    /// Route a UI message to the matching operation.
    pub fn dispatch(&mut self, message: FeedMessage) -> bool {
        match message {
            FeedMessage::RequestNextPage => self.request_next_page(),
            FeedMessage::ExpandItem(id) => self.expand_item(id),
            FeedMessage::ScrollWillEnd(geometry) => {
                if geometry.should_prefetch(self.options.prefetch_screens) {
                    self.request_next_page()
                } else {
                    false
                }
            }
            FeedMessage::Reset => {
                self.reset();
                true
            }
        }
    }

    fn notify(&self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.state.snapshot();
        for callback in &self.subscribers {
            callback(&snapshot);
        }
    }
}

impl Drop for ReviewsController {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl FeedDataSource for ReviewsController {
    fn item_count(&self) -> usize {
        self.state.item_count()
    }

    fn row(&self, index: usize) -> Option<FeedRow<'_>> {
        let items = self.state.items();
        match index.cmp(&items.len()) {
            std::cmp::Ordering::Less => items.at(index).map(FeedRow::Review),
            std::cmp::Ordering::Equal => Some(FeedRow::Summary {
                loaded: items.len(),
            }),
            std::cmp::Ordering::Greater => None,
        }
    }
}

impl FeedEventSink for ReviewsController {
    fn on_scroll_will_end(&mut self, geometry: ScrollGeometry) {
        self.dispatch(FeedMessage::ScrollWillEnd(geometry));
    }

    fn on_show_more(&mut self, id: ItemId) {
        self.dispatch(FeedMessage::ExpandItem(id));
    }
}

/// Aborts the provider task when the fetch that spawned it is dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Fetch and decode one page off the owning context.
async fn fetch_page(
    provider: Arc<dyn ReviewsProvider>,
    offset: usize,
    timeout: Option<Duration>,
) -> FetchResult<Page> {
    // A panicking provider surfaces as a JoinError instead of a lost completion
    let mut fetch = AbortOnDrop(tokio::spawn(async move { provider.fetch(offset).await }));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut fetch.0).await {
            Ok(joined) => joined,
            Err(_) => return Err(FetchError::Timeout(limit)),
        },
        None => (&mut fetch.0).await,
    };

    let raw = joined.map_err(|e| FetchError::TaskFailed(e.to_string()))??;
    Ok(decoder::decode(&raw)?)
}
