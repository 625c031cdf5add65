use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::sample::sample_articles;
use super::types::{Article, ArticleId, Category};
use super::ContentError;

// ============================================================================
// Article Sources
// ============================================================================

/// Where a load pulls its articles from.
pub trait ArticleSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Article>, ContentError>>;
}

/// Serves the built-in sample set after a simulated latency.
#[derive(Debug, Clone)]
pub struct SampleSource {
    latency: Duration,
}

impl SampleSource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl ArticleSource for SampleSource {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Article>, ContentError>> {
        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            Ok(sample_articles())
        }
        .boxed()
    }
}

// ============================================================================
// Store State
// ============================================================================

/// Observable store state. Published as a whole on every change, so a
/// subscriber never sees articles from one load mixed with another.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Current article set, in insertion order.
    pub articles: Arc<Vec<Article>>,
    pub is_loading: bool,
    /// Message from the most recent failed load, cleared when a load starts.
    pub error_message: Option<String>,
}

/// Result of a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The article set was replaced with this many articles.
    Loaded(usize),
    /// The source failed; the previous article set stays in place.
    Failed(String),
    /// Another load was in flight; this request was ignored.
    AlreadyInFlight,
}

/// Clears the in-flight flag even if the load future is dropped midway.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// ArticleStore
// ============================================================================

/// Holds the canonical article collection.
///
/// The collection is replaced wholesale on each successful load and is
/// read-only in between. Reads take an `Arc` snapshot of the current set.
pub struct ArticleStore {
    source: Arc<dyn ArticleSource>,
    state: watch::Sender<StoreState>,
    loading: AtomicBool,
}

impl ArticleStore {
    pub fn new(source: Arc<dyn ArticleSource>) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            source,
            state,
            loading: AtomicBool::new(false),
        }
    }

    /// Store backed by the sample set.
    pub fn with_sample(latency: Duration) -> Self {
        Self::new(Arc::new(SampleSource::new(latency)))
    }

    /// Load (or reload) the article set and return the resulting collection.
    ///
    /// A failed load returns an empty set and records the error in the
    /// observable state. If another load is already running, the current
    /// collection is returned unchanged.
    pub async fn load(&self) -> Arc<Vec<Article>> {
        match self.refresh().await {
            RefreshOutcome::Failed(_) => Arc::new(Vec::new()),
            RefreshOutcome::Loaded(_) | RefreshOutcome::AlreadyInFlight => self.all(),
        }
    }

    /// Single-flight refresh: a request arriving while a load is outstanding
    /// is ignored rather than queued.
    pub async fn refresh(&self) -> RefreshOutcome {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Refresh already in flight, ignoring request");
            return RefreshOutcome::AlreadyInFlight;
        }
        let _guard = InFlightGuard(&self.loading);

        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error_message = None;
        });

        match self.source.fetch().await {
            Ok(articles) => {
                let articles = dedupe_by_id(articles);
                let count = articles.len();
                let articles = Arc::new(articles);
                self.state.send_modify(|state| {
                    state.articles = articles;
                    state.is_loading = false;
                });
                tracing::info!(articles = count, "Article set loaded");
                RefreshOutcome::Loaded(count)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %e, "Article load failed");
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error_message = Some(message.clone());
                });
                RefreshOutcome::Failed(message)
            }
        }
    }

    /// Subscribe to state changes. The receiver starts with the current
    /// state marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error_message(&self) -> Option<String> {
        self.state.borrow().error_message.clone()
    }

    /// Snapshot of all articles in insertion order.
    pub fn all(&self) -> Arc<Vec<Article>> {
        Arc::clone(&self.state.borrow().articles)
    }

    pub fn get_by_id(&self, id: ArticleId) -> Option<Article> {
        self.all().iter().find(|a| a.id == id).cloned()
    }

    /// Articles in `category`, insertion order preserved.
    pub fn get_by_category(&self, category: Category) -> Vec<Article> {
        self.all()
            .iter()
            .filter(|a| a.category == category)
            .cloned()
            .collect()
    }

    /// Resolve favorite ids against the current set. Ids with no matching
    /// article are dropped without error.
    pub fn favorites(&self, ids: &BTreeSet<ArticleId>) -> Vec<Article> {
        resolve_favorites(&self.all(), ids)
    }
}

/// Store-order articles whose id is in `ids`.
pub fn resolve_favorites(articles: &[Article], ids: &BTreeSet<ArticleId>) -> Vec<Article> {
    articles
        .iter()
        .filter(|a| ids.contains(&a.id))
        .cloned()
        .collect()
}

/// Keep the first article for each id so an id always names one article.
fn dedupe_by_id(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::with_capacity(articles.len());
    let before = articles.len();
    let unique: Vec<Article> = articles.into_iter().filter(|a| seen.insert(a.id)).collect();
    if unique.len() != before {
        tracing::warn!(
            dropped = before - unique.len(),
            "Source returned duplicate article ids, keeping first occurrence"
        );
    }
    unique
}
