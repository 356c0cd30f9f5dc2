//! The feed controller.
//!
//! [`FeedController`] owns everything the post list shows: the fetched
//! posts, the active theme/topic/sort, the current page, the rendered cards
//! and their read-more state.  It is driven by three inputs:
//!
//! * [`FeedEvent`]s from the user, via [`handle`](FeedController::handle),
//! * [`FetchOutcome`]s from the fetch worker, via
//!   [`apply`](FeedController::apply),
//! * body measurements after a frame is drawn, via
//!   [`settle_layout`](FeedController::settle_layout).
//!
//! It performs no I/O.  When it needs data it returns a [`FetchRequest`]
//! for the caller to submit.
//!
//! ```text
//!            start / topic / theme
//!   Idle ───────────────────────────► Loading ──ok──► Loaded
//!                                       │  │
//!                     no URL configured │  └─err──► Error
//!                                       ▼
//!                                     Empty
//! ```
//!
//! Every request carries a generation number.  Only the outcome matching
//! the latest generation is applied, so a slow response for a topic the
//! user has already left can never overwrite the current one.

use tracing::{debug, error, info, warn};

use crate::config::FeedConfig;
use crate::fetch::{FetchOutcome, FetchRequest};
use crate::paginate::{controls_for, page_slice, total_pages, PageControls};
use crate::read_more::{self, BodyState};
use crate::render::{render_post, PostCard};
use crate::sort::{sort_posts, SortCriterion};
use crate::source::{FetchError, Post};

pub const LOADING_MESSAGE: &str = "Cargando posts...";
pub const FORMAT_ERROR_MESSAGE: &str = "Error en el formato de los datos recibidos.";
pub const FETCH_FAILED_PREFIX: &str = "Fallo la carga de los Posts.";
pub const NO_POSTS_MESSAGE: &str = "No hay posts para mostrar para este tema.";

/// `"No hay posts disponibles para el tema: {label}."`
pub fn unavailable_topic_message(label: &str) -> String {
    format!("No hay posts disponibles para el tema: {label}.")
}

/// The user-facing message for a failed fetch.
pub fn fetch_error_message(err: &FetchError) -> String {
    match err {
        FetchError::Format => FORMAT_ERROR_MESSAGE.to_string(),
        other => format!("{FETCH_FAILED_PREFIX} {other}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    Loaded,
    /// The selected (theme, topic) pair has no data source.
    Empty,
    Error,
}

/// User selections the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    TopicSelected(String),
    ThemeSelected(String),
    /// Raw sort control value; unknown values are accepted.
    SortChanged(String),
    /// 1-based page number.
    PageRequested(usize),
    /// Index of the card on the current page.
    ReadMoreToggled(usize),
}

pub struct FeedController {
    config: FeedConfig,
    posts: Vec<Option<Post>>,
    current_page: usize,
    sort: SortCriterion,
    active_theme: String,
    active_topic: String,
    phase: FeedPhase,
    message: Option<String>,
    sort_enabled: bool,
    generation: u64,
    cards: Vec<PostCard>,
    bodies: Vec<BodyState>,
    layout_pending: bool,
}

impl FeedController {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            active_theme: config.default_theme.clone(),
            active_topic: config.default_topic.clone(),
            config,
            posts: Vec::new(),
            current_page: 1,
            sort: SortCriterion::default(),
            phase: FeedPhase::Idle,
            message: None,
            sort_enabled: true,
            generation: 0,
            cards: Vec::new(),
            bodies: Vec::new(),
            layout_pending: false,
        }
    }

    /// Initial load for the configured default theme and topic.
    pub fn start(&mut self) -> Option<FetchRequest> {
        self.load()
    }

    /// React to a user event.  Returns a request when new data is needed.
    pub fn handle(&mut self, event: FeedEvent) -> Option<FetchRequest> {
        debug!(?event, "feed event");
        match event {
            FeedEvent::TopicSelected(key) => self.select_topic(key),
            FeedEvent::ThemeSelected(key) => self.select_theme(key),
            FeedEvent::SortChanged(value) => {
                self.change_sort(&value);
                None
            }
            FeedEvent::PageRequested(page) => {
                self.request_page(page);
                None
            }
            FeedEvent::ReadMoreToggled(index) => {
                if !read_more::toggle(&mut self.bodies, index) {
                    debug!(index, "no read-more toggle on this card");
                }
                None
            }
        }
    }

    /// Apply a fetch outcome.  Returns `false` if it was stale and ignored.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        if outcome.generation != self.generation || self.phase != FeedPhase::Loading {
            debug!(
                generation = outcome.generation,
                current = self.generation,
                url = %outcome.url,
                "discarding stale fetch outcome"
            );
            return false;
        }

        match outcome.result {
            Ok(posts) => {
                info!(count = posts.len(), url = %outcome.url, "fetched posts");
                self.posts = posts;
                sort_posts(&mut self.posts, &self.sort);
                self.phase = FeedPhase::Loaded;
                self.sort_enabled = true;
                self.message = None;
                self.render_page(1);
            }
            Err(err) => {
                match &err {
                    FetchError::Format => error!(url = %outcome.url, "fetched data is not an array"),
                    other => error!(url = %outcome.url, error = %other, "could not fetch posts"),
                }
                self.fail(FeedPhase::Error, fetch_error_message(&err));
            }
        }
        true
    }

    /// Second render phase: `full_heights[i]` is the measured untruncated
    /// height of card `i`'s body.
    pub fn settle_layout(&mut self, full_heights: &[u16]) {
        read_more::recompute(&mut self.bodies, full_heights, self.config.collapsed_rows);
        self.layout_pending = false;
    }

    // -- accessors -----------------------------------------------------------

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn posts(&self) -> &[Option<Post>] {
        &self.posts
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn sort(&self) -> &SortCriterion {
        &self.sort
    }

    pub fn sort_enabled(&self) -> bool {
        self.sort_enabled
    }

    pub fn active_theme(&self) -> &str {
        &self.active_theme
    }

    pub fn active_topic(&self) -> &str {
        &self.active_topic
    }

    pub fn cards(&self) -> &[PostCard] {
        &self.cards
    }

    pub fn bodies(&self) -> &[BodyState] {
        &self.bodies
    }

    /// `true` between building a page and [`settle_layout`](Self::settle_layout).
    pub fn layout_pending(&self) -> bool {
        self.layout_pending
    }

    /// Pagination controls, when there is more than one page.
    pub fn controls(&self) -> Option<PageControls> {
        if self.phase != FeedPhase::Loaded {
            return None;
        }
        controls_for(self.posts.len(), self.config.page_size, self.current_page)
    }

    // -- transitions ---------------------------------------------------------

    fn select_topic(&mut self, key: String) -> Option<FetchRequest> {
        if key == self.active_topic && self.phase != FeedPhase::Idle {
            return None;
        }
        if self.config.topic(&key).is_none() {
            warn!(topic = %key, "ignoring unknown topic");
            return None;
        }
        self.active_topic = key;
        self.reset_selection();
        self.load()
    }

    fn select_theme(&mut self, key: String) -> Option<FetchRequest> {
        if key == self.active_theme && self.phase != FeedPhase::Idle {
            return None;
        }
        if self.config.theme(&key).is_none() {
            warn!(theme = %key, "ignoring unknown theme");
            return None;
        }
        self.active_theme = key;
        self.reset_selection();
        self.load()
    }

    fn reset_selection(&mut self) {
        self.sort = SortCriterion::default();
        self.current_page = 1;
    }

    fn load(&mut self) -> Option<FetchRequest> {
        // Bumped even when nothing is fetched so that any in-flight
        // response becomes stale.
        self.generation += 1;
        self.phase = FeedPhase::Loading;
        self.clear_page();

        let Some(url) = self
            .config
            .source_url(&self.active_theme, &self.active_topic)
            .map(String::from)
        else {
            info!(theme = %self.active_theme, topic = %self.active_topic, "no data source for selection");
            let label = self
                .config
                .topic(&self.active_topic)
                .map_or(self.active_topic.clone(), |t| t.label.clone());
            self.fail(FeedPhase::Empty, unavailable_topic_message(&label));
            return None;
        };

        self.message = Some(LOADING_MESSAGE.to_string());
        self.sort_enabled = true;
        Some(FetchRequest {
            generation: self.generation,
            url,
        })
    }

    fn fail(&mut self, phase: FeedPhase, message: String) {
        self.posts.clear();
        self.current_page = 1;
        self.sort_enabled = false;
        self.phase = phase;
        self.message = Some(message);
        self.clear_page();
    }

    fn change_sort(&mut self, value: &str) {
        if !self.sort_enabled {
            debug!(value, "sort control is disabled");
            return;
        }
        // `FromStr` for `SortCriterion` cannot fail.
        let criterion: SortCriterion = value.parse().unwrap_or_default();
        self.sort = criterion;
        if self.phase == FeedPhase::Loaded {
            sort_posts(&mut self.posts, &self.sort);
            self.render_page(1);
        }
    }

    fn request_page(&mut self, page: usize) {
        if self.phase != FeedPhase::Loaded {
            return;
        }
        let pages = total_pages(self.posts.len(), self.config.page_size);
        if page == 0 || page > pages {
            debug!(page, pages, "ignoring out-of-range page");
            return;
        }
        self.render_page(page);
    }

    fn clear_page(&mut self) {
        self.cards.clear();
        self.bodies.clear();
        self.layout_pending = false;
    }

    /// First render phase: build the cards for `page`.
    fn render_page(&mut self, page: usize) {
        self.current_page = page;
        self.clear_page();

        if self.posts.is_empty() {
            self.message = Some(NO_POSTS_MESSAGE.to_string());
            return;
        }

        let page_size = self.config.page_size;
        let start = (page - 1) * page_size;
        for (offset, slot) in page_slice(&self.posts, page, page_size).iter().enumerate() {
            let index = start + offset;
            let Some(post) = slot else {
                warn!(index, "skipping invalid post record");
                continue;
            };
            if let Some(card) = render_post(&self.config.template, post, index + 1) {
                self.cards.push(card);
            }
        }

        self.bodies = vec![BodyState::default(); self.cards.len()];
        self.layout_pending = !self.cards.is_empty();
    }
}
