use anyhow::{anyhow, Result};
use clap::Args;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::reviews::{ControllerOptions, FeedDataSource, FeedRow, ReviewsController, ReviewsProvider};
use crate::tui::render::{ReviewRenderer, TerminalRenderer};

/// Page through the whole feed and print it
#[derive(Args, Debug)]
pub struct DumpCommand {
    /// Stop after this many pages
    #[arg(long = "max-pages")]
    pub max_pages: Option<usize>,

    /// Consecutive failed fetches tolerated before giving up
    #[arg(long = "retries", default_value_t = 2)]
    pub retries: usize,

    /// Print full review texts instead of the collapsed form
    #[arg(short = 'e', long = "expand")]
    pub expand: bool,

    /// Wrap width for review text
    #[arg(short = 'w', long = "width", default_value_t = 80)]
    pub width: u16,
}

impl DumpCommand {
    pub async fn execute(&self, config: &Config, provider: Arc<dyn ReviewsProvider>) -> Result<()> {
        debug!("Executing dump command");

        let mut controller = ReviewsController::new(provider, ControllerOptions::from(config));
        controller.subscribe(|snapshot| {
            debug!(
                "Feed now holds {} reviews (more: {})",
                snapshot.items.len(),
                snapshot.has_more
            );
        });

        self.load(&mut controller).await?;

        let renderer = TerminalRenderer::new(config.collapsed_lines);
        let mut stdout = io::stdout().lock();
        self.print(&controller, &renderer, &mut stdout)?;

        Ok(())
    }

    async fn load(&self, controller: &mut ReviewsController) -> Result<()> {
        let mut pages = 0;
        let mut failures = 0;

        while controller.request_next_page() {
            controller.wait_for_fetch().await;

            if let Some(error) = controller.state().last_error() {
                failures += 1;
                if failures > self.retries {
                    return Err(anyhow!(
                        "Giving up at offset {} after {} failed attempts: {}",
                        controller.state().offset(),
                        failures,
                        error
                    ));
                }
                warn!("Retrying offset {} ({}/{})", controller.state().offset(), failures, self.retries);
                continue;
            }

            failures = 0;
            pages += 1;
            if self.max_pages.is_some_and(|max| pages >= max) {
                break;
            }
        }

        info!("Loaded {} reviews in {} pages", controller.state().items().len(), pages);
        Ok(())
    }

    fn print<S, R, W>(&self, source: &S, renderer: &R, out: &mut W) -> Result<()>
    where
        S: FeedDataSource,
        R: ReviewRenderer,
        W: Write,
    {
        for index in 0..source.item_count() {
            let lines = match source.row(index) {
                Some(FeedRow::Review(item)) if self.expand => {
                    renderer.render_review(&item.expanded(), self.width)
                }
                Some(FeedRow::Review(item)) => renderer.render_review(item, self.width),
                Some(FeedRow::Summary { loaded }) => vec![renderer.render_summary(loaded)],
                None => continue,
            };

            for line in lines {
                let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
                writeln!(out, "{}", text)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reviews::{FixtureReviewsProvider, Page, ReviewRecord, TransportError, TransportResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn command() -> DumpCommand {
        DumpCommand {
            max_pages: None,
            retries: 2,
            expand: false,
            width: 80,
        }
    }

    fn config(page_size: usize) -> Config {
        Config {
            page_size,
            ..Config::default()
        }
    }

    fn fixture(total: usize, page_size: usize) -> Arc<dyn ReviewsProvider> {
        let page = Page {
            records: (0..total)
                .map(|i| ReviewRecord {
                    text: format!("review {}", i),
                    created_at: "сегодня".to_string(),
                    first_name: "Имя".to_string(),
                    last_name: format!("{}", i),
                    rating: 5,
                })
                .collect(),
            total_count: total,
        };
        Arc::new(FixtureReviewsProvider::new(page, page_size))
    }

    struct FailingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReviewsProvider for FailingProvider {
        async fn fetch(&self, _offset: usize) -> TransportResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::ProviderError("unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_loads_every_page_and_prints_summary() {
        let config = config(20);
        let mut controller = ReviewsController::new(fixture(45, 20), ControllerOptions::from(&config));
        let cmd = command();
        cmd.load(&mut controller).await.unwrap();
        assert_eq!(controller.state().items().len(), 45);

        let mut out = Vec::new();
        cmd.print(&controller, &TerminalRenderer::new(3), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("review 44"));
        assert!(text.trim_end().ends_with("45 отзывов"));
    }

    #[tokio::test]
    async fn test_max_pages() {
        let config = config(10);
        let mut controller = ReviewsController::new(fixture(45, 10), ControllerOptions::from(&config));
        let cmd = DumpCommand {
            max_pages: Some(2),
            ..command()
        };
        cmd.load(&mut controller).await.unwrap();
        assert_eq!(controller.state().items().len(), 20);
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let provider = Arc::new(FailingProvider {
            calls: AtomicUsize::new(0),
        });
        let mut controller = ReviewsController::new(provider.clone(), ControllerOptions::from(&config(20)));

        let error = command().load(&mut controller).await.unwrap_err();
        assert!(error.to_string().contains("unavailable"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }
}
