//! Application state for the terminal UI.
//!
//! [`App`] wraps the [`FeedController`] with the bits of state that only the
//! terminal needs: which card is selected, how far the post list is
//! scrolled, the width bodies were last measured at, and the requests that
//! are waiting to be handed to the fetch worker.

use tracing::info;

use crate::feed::{FeedController, FeedEvent, FeedPhase};
use crate::fetch::{FetchOutcome, FetchRequest};
use crate::ui::wrap_text;

pub struct App {
    pub feed: FeedController,
    /// Selected card on the current page.
    pub selected: usize,
    /// First visible row of the post list.
    pub scroll: u16,
    /// Width available to post bodies in the last drawn frame.
    pub body_width: u16,
    /// Width the current page was measured at.
    measured_width: Option<u16>,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last fetch status message.
    pub status: String,
    outbox: Vec<FetchRequest>,
}

impl App {
    pub fn new(feed: FeedController) -> Self {
        Self {
            feed,
            selected: 0,
            scroll: 0,
            body_width: 0,
            measured_width: None,
            quit: false,
            status: "Starting…".into(),
            outbox: Vec::new(),
        }
    }

    /// Kick off the initial load.
    pub fn start(&mut self) {
        if let Some(request) = self.feed.start() {
            self.outbox.push(request);
        }
    }

    /// Forward an event to the feed and queue any resulting request.
    pub fn dispatch(&mut self, event: FeedEvent) {
        // Everything except a read-more toggle rebuilds or clears the page.
        let rebuilds_page = !matches!(event, FeedEvent::ReadMoreToggled(_));

        if let Some(request) = self.feed.handle(event) {
            self.outbox.push(request);
        }
        if rebuilds_page {
            self.reset_view();
        }
    }

    /// Requests waiting for the fetch worker.
    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn apply_outcome(&mut self, outcome: FetchOutcome) {
        if !self.feed.apply(outcome) {
            return;
        }
        self.status = match self.feed.phase() {
            FeedPhase::Loaded => format!("Fetched {} posts", self.feed.posts().len()),
            _ => "Fetch failed".to_string(),
        };
        info!(status = %self.status, "feed updated");
        self.reset_view();
    }

    /// Second render phase, run after a frame has been drawn: measure every
    /// body at the width it was drawn with.  Also re-runs when the terminal
    /// width changes.
    pub fn settle_layout(&mut self) {
        let width = self.body_width;
        if !self.feed.layout_pending() && self.measured_width == Some(width) {
            return;
        }
        let heights: Vec<u16> = self
            .feed
            .cards()
            .iter()
            .map(|card| {
                let rows = wrap_text(card.body(), usize::from(width)).len();
                u16::try_from(rows).unwrap_or(u16::MAX)
            })
            .collect();
        self.feed.settle_layout(&heights);
        self.measured_width = Some(width);
    }

    fn reset_view(&mut self) {
        self.selected = 0;
        self.scroll = 0;
        self.measured_width = None;
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        let count = self.feed.cards().len();
        if count > 0 {
            self.selected = (self.selected + 1).min(count - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.feed.cards().len().saturating_sub(1);
    }

    // -- selections ----------------------------------------------------------

    pub fn next_topic(&mut self) {
        self.cycle_topic(1);
    }

    pub fn previous_topic(&mut self) {
        self.cycle_topic(-1);
    }

    fn cycle_topic(&mut self, step: isize) {
        let topics = &self.feed.config().topics;
        let current = topics.iter().position(|t| t.key == self.feed.active_topic());
        let key = topics[cycle(current, topics.len(), step)].key.clone();
        self.dispatch(FeedEvent::TopicSelected(key));
    }

    pub fn next_theme(&mut self) {
        let themes = &self.feed.config().themes;
        let current = themes.iter().position(|t| t.key == self.feed.active_theme());
        let key = themes[cycle(current, themes.len(), 1)].key.clone();
        self.dispatch(FeedEvent::ThemeSelected(key));
    }

    pub fn next_sort(&mut self) {
        if self.feed.sort_enabled() {
            let value = self.feed.sort().next().to_string();
            self.dispatch(FeedEvent::SortChanged(value));
        }
    }

    pub fn next_page(&mut self) {
        if let Some(controls) = self.feed.controls().filter(|c| c.current < c.total_pages) {
            self.dispatch(FeedEvent::PageRequested(controls.current + 1));
        }
    }

    pub fn previous_page(&mut self) {
        if let Some(controls) = self.feed.controls().filter(|c| !c.prev_disabled) {
            self.dispatch(FeedEvent::PageRequested(controls.current - 1));
        }
    }

    pub fn toggle_selected(&mut self) {
        self.dispatch(FeedEvent::ReadMoreToggled(self.selected));
    }
}

/// Index `step` positions away from `current`, wrapping.  `len` is never
/// zero for validated configurations.
fn cycle(current: Option<usize>, len: usize, step: isize) -> usize {
    let len = len.max(1) as isize;
    let from = current.map_or(0, |i| i as isize);
    (from + step).rem_euclid(len) as usize
}
