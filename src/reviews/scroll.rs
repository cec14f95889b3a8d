//! Scroll-proximity prefetch trigger.

/// How many viewport heights from the end of the content a prefetch fires.
pub const DEFAULT_PREFETCH_SCREENS: f64 = 2.5;

/// Viewport and content geometry at the moment scrolling is about to settle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollGeometry {
    pub viewport_height: f64,
    pub content_height: f64,
    /// Where the scroll will come to rest
    pub target_scroll_y: f64,
}

impl ScrollGeometry {
    pub fn new(viewport_height: f64, content_height: f64, target_scroll_y: f64) -> Self {
        Self {
            viewport_height,
            content_height,
            target_scroll_y,
        }
    }

    /// Distance left between the bottom of the viewport and the end of the content
    pub fn remaining_distance(&self) -> f64 {
        self.content_height - self.viewport_height - self.target_scroll_y
    }

    pub fn should_prefetch(&self, threshold_screens: f64) -> bool {
        should_prefetch(
            self.viewport_height,
            self.content_height,
            self.target_scroll_y,
            threshold_screens,
        )
    }
}

/// Whether the next page should be requested for the given geometry.
pub fn should_prefetch(
    viewport_height: f64,
    content_height: f64,
    target_scroll_y: f64,
    threshold_screens: f64,
) -> bool {
    let trigger_distance = viewport_height * threshold_screens;
    let remaining_distance = content_height - viewport_height - target_scroll_y;
    remaining_distance <= trigger_distance
}
