//! Reactive driver that keeps the displayed feed in sync with its inputs.
//!
//! One worker task owns every filtering input and multiplexes four event
//! sources with `tokio::select!`:
//! - **Commands** from the [`FilterPipeline`] handle (search text, category,
//!   favorites-only toggle)
//! - **Article store** state changes (load, refresh, failure)
//! - **Preference** changes (interest categories, favorite ids)
//! - **Search debounce deadline**, armed by search-text commands
//!
//! Search text is debounced: each keystroke stores the latest text and resets
//! the deadline, and only the text present when the deadline expires is
//! committed. All other inputs recompute immediately. Because the worker
//! holds just the latest pending text, stale searches can never stack up.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::{recompute, FilterQuery};
use crate::content::{Article, ArticleId, ArticleStore, Category, StoreState};
use crate::preferences::{PreferenceSnapshot, PreferenceState};

/// Search text must be quiet this long before it is applied.
pub const MIN_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

const COMMAND_BUFFER: usize = 32;

// ============================================================================
// FeedView
// ============================================================================

/// One published result of the pipeline.
#[derive(Debug, Clone, Default)]
pub struct FeedView {
    /// Filtered articles, newest first.
    pub articles: Arc<Vec<Article>>,
    /// Inputs this view was computed from.
    pub query: FilterQuery,
    pub is_loading: bool,
    pub error_message: Option<String>,
    /// Incremented once per recomputation. 0 means nothing computed yet.
    pub generation: u64,
}

enum Command {
    SearchText(String),
    SubmitSearch(String),
    SelectCategory(Option<Category>),
    FavoritesOnly(bool),
    Settle(oneshot::Sender<FeedView>),
}

// ============================================================================
// FilterPipeline
// ============================================================================

/// Handle to a running filter worker. Dropping the handle stops the worker.
pub struct FilterPipeline {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<FeedView>,
    handle: JoinHandle<()>,
}

impl FilterPipeline {
    /// Start a pipeline wired to a store and preference state.
    pub fn attach(store: &ArticleStore, preferences: &PreferenceState, debounce: Duration) -> Self {
        Self::spawn(store.subscribe(), preferences.subscribe(), debounce)
    }

    /// Start a pipeline over raw state receivers.
    ///
    /// `debounce` is raised to [`MIN_SEARCH_DEBOUNCE`] if shorter. Must be
    /// called from within a tokio runtime.
    pub fn spawn(
        store: watch::Receiver<StoreState>,
        preferences: watch::Receiver<PreferenceSnapshot>,
        debounce: Duration,
    ) -> Self {
        let debounce = debounce.max(MIN_SEARCH_DEBOUNCE);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view_rx) = watch::channel(FeedView::default());

        let worker = Worker {
            store,
            preferences,
            commands: commands_rx,
            view: view_tx,
            debounce,
            query: FilterQuery::default(),
            favorites: BTreeSet::new(),
            pending_search: None,
            search_deadline: None,
            generation: 0,
        };

        tracing::debug!(debounce_ms = debounce.as_millis() as u64, "Spawning filter pipeline");
        let handle = tokio::spawn(worker.run());

        Self {
            commands: commands_tx,
            view: view_rx,
            handle,
        }
    }

    /// Record a keystroke. Applied once the text has been quiet for the
    /// debounce interval; a newer call supersedes a pending one.
    pub async fn set_search_text(&self, text: impl Into<String>) {
        self.send(Command::SearchText(text.into())).await;
    }

    /// Apply search text immediately, cancelling any pending debounced text.
    pub async fn submit_search(&self, text: impl Into<String>) {
        self.send(Command::SubmitSearch(text.into())).await;
    }

    /// Pick one category, or `None` to fall back to the preference set.
    pub async fn select_category(&self, category: Option<Category>) {
        self.send(Command::SelectCategory(category)).await;
    }

    pub async fn set_favorites_only(&self, enabled: bool) {
        self.send(Command::FavoritesOnly(enabled)).await;
    }

    /// Wait until every command sent before this call has been applied and
    /// return the view at that point. Pending debounced text is not forced.
    pub async fn settled_view(&self) -> FeedView {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Settle(tx)).await;
        match rx.await {
            Ok(view) => view,
            Err(_) => self.current(),
        }
    }

    /// Most recently published view.
    pub fn current(&self) -> FeedView {
        self.view.borrow().clone()
    }

    /// Receiver for published views. Starts with the current view marked seen.
    pub fn subscribe(&self) -> watch::Receiver<FeedView> {
        let mut rx = self.view.clone();
        rx.borrow_and_update();
        rx
    }

    async fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command).await {
            tracing::warn!(error = %e, "Filter pipeline stopped, dropping command");
        }
    }
}

impl Drop for FilterPipeline {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Worker
// ============================================================================

struct Worker {
    store: watch::Receiver<StoreState>,
    preferences: watch::Receiver<PreferenceSnapshot>,
    commands: mpsc::Receiver<Command>,
    view: watch::Sender<FeedView>,
    debounce: Duration,

    /// Committed inputs. `query.search_text` only changes when the debounce
    /// deadline fires or a search is submitted.
    query: FilterQuery,
    favorites: BTreeSet<ArticleId>,

    /// Latest keystroke text waiting for the deadline.
    pending_search: Option<String>,
    search_deadline: Option<Instant>,

    generation: u64,
}

impl Worker {
    async fn run(mut self) {
        self.sync_preferences();
        self.publish("initial");

        let mut store_open = true;
        let mut preferences_open = true;

        loop {
            let deadline = self.search_deadline;

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => {
                        tracing::debug!("Filter pipeline handle dropped, stopping worker");
                        break;
                    }
                },

                changed = self.store.changed(), if store_open => {
                    if changed.is_ok() {
                        self.publish("articles");
                    } else {
                        tracing::debug!("Article store closed, no further article updates");
                        store_open = false;
                    }
                }

                changed = self.preferences.changed(), if preferences_open => {
                    if changed.is_ok() {
                        if self.sync_preferences() {
                            self.publish("preferences");
                        }
                    } else {
                        tracing::debug!("Preference state closed, no further preference updates");
                        preferences_open = false;
                    }
                }

                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.search_deadline = None;
                    if let Some(text) = self.pending_search.take() {
                        self.commit_search(text, "search");
                    }
                }
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::SearchText(text) => {
                // Timer reset: the deadline always counts from the latest keystroke.
                self.pending_search = Some(text);
                self.search_deadline = Some(Instant::now() + self.debounce);
            }
            Command::SubmitSearch(text) => {
                self.pending_search = None;
                self.search_deadline = None;
                self.commit_search(text, "search_submit");
            }
            Command::SelectCategory(category) => {
                if self.query.selected_category != category {
                    self.query.selected_category = category;
                    self.publish("category");
                }
            }
            Command::FavoritesOnly(enabled) => {
                if self.query.favorites_only != enabled {
                    self.query.favorites_only = enabled;
                    self.publish("favorites_only");
                }
            }
            Command::Settle(reply) => {
                // Receiver may have given up waiting; nothing to do then.
                let _ = reply.send(self.view.borrow().clone());
            }
        }
    }

    fn commit_search(&mut self, text: String, trigger: &'static str) {
        if self.query.search_text != text {
            self.query.search_text = text;
            self.publish(trigger);
        }
    }

    /// Pull the latest preference snapshot. Returns true if anything the
    /// filter depends on changed.
    fn sync_preferences(&mut self) -> bool {
        let prefs = self.preferences.borrow_and_update();
        let changed = prefs.selected_categories != self.query.preference_categories
            || prefs.favorite_ids != self.favorites;
        if changed {
            self.query.preference_categories = prefs.selected_categories.clone();
            self.favorites = prefs.favorite_ids.clone();
        }
        changed
    }

    /// Recompute against one store snapshot and publish the result.
    fn publish(&mut self, trigger: &'static str) {
        let state = self.store.borrow_and_update().clone();
        let articles = recompute(&state.articles, &self.query, &self.favorites);
        self.generation += 1;

        tracing::debug!(
            generation = self.generation,
            trigger,
            total = state.articles.len(),
            results = articles.len(),
            "Recomputed feed"
        );

        self.view.send_replace(FeedView {
            articles: Arc::new(articles),
            query: self.query.clone(),
            is_loading: state.is_loading,
            error_message: state.error_message,
            generation: self.generation,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
