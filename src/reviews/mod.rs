//! Paginated reviews feed: decoding, display items, pagination state and the
//! controller that coordinates fetches.

pub mod controller;
pub mod decoder;
pub mod errors;
pub mod factory;
pub mod provider;
pub mod scroll;
pub mod state;

pub use controller::{
    ControllerOptions, FeedDataSource, FeedEventSink, FeedMessage, FeedRow, FetchCompletion,
    ReviewsController,
};
pub use decoder::{decode, Page, ReviewRecord};
pub use errors::{DecodeError, FetchError, FetchResult, TransportError, TransportResult};
pub use factory::{DisplayItem, ItemFactory, ItemId};
pub use provider::{FixtureReviewsProvider, HttpReviewsProvider, ProviderFactory, ReviewsProvider};
pub use scroll::{should_prefetch, ScrollGeometry, DEFAULT_PREFETCH_SCREENS};
pub use state::{FeedPhase, ItemArena, PaginationState, StateSnapshot};
