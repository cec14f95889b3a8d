//! Paginated reviews feed.
//!
//! The [`reviews`] module holds the toolkit-independent core: a controller
//! that fetches review pages through a [`reviews::ReviewsProvider`], decodes
//! them into display items and publishes state snapshots. [`tui`] is a
//! terminal front end for it, and [`cli`] wires both to configuration.

pub mod cli;
pub mod config;
pub mod reviews;
pub mod tui;
