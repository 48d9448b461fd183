//! Lifecycle of one rendered widget: initial load, refresh, retry, unmount.
//!
//! A session moves `Loading → Ready | Error`. `Ready` and `Refreshing` loop
//! into each other on manual or timed refresh, and `Error` returns to
//! `Loading` only through [`WidgetSession::retry`]. Every fetch carries a
//! generation number; a result is applied only when it is still the newest
//! fetch issued and the session is still mounted.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use metrics::counter;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use crate::{
    application::{
        content::{ArticleQuery, ContentApi, ContentError},
        theme::{DocumentClasses, ThemeBinding},
    },
    domain::{article::Article, widget::WidgetConfig},
};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPhase {
    Loading,
    Ready,
    Refreshing,
    Error,
}

impl WidgetPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetPhase::Loading => "loading",
            WidgetPhase::Ready => "ready",
            WidgetPhase::Refreshing => "refreshing",
            WidgetPhase::Error => "error",
        }
    }
}

/// Published state of a session.
#[derive(Debug, Clone)]
pub struct WidgetSnapshot {
    pub phase: WidgetPhase,
    pub articles: Arc<[Article]>,
    /// Incremented on every published change.
    pub revision: u64,
}

impl WidgetSnapshot {
    fn loading() -> Self {
        Self {
            phase: WidgetPhase::Loading,
            articles: Arc::from(Vec::new()),
            revision: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchTrigger {
    Initial,
    Retry,
    Manual,
    Timer,
}

impl FetchTrigger {
    fn as_str(self) -> &'static str {
        match self {
            FetchTrigger::Initial => "initial",
            FetchTrigger::Retry => "retry",
            FetchTrigger::Manual => "manual",
            FetchTrigger::Timer => "timer",
        }
    }

    /// Phase entered when this trigger is accepted from `current`.
    fn entry_phase(self, current: WidgetPhase) -> Option<WidgetPhase> {
        match (self, current) {
            (FetchTrigger::Initial, WidgetPhase::Loading) => Some(WidgetPhase::Loading),
            (FetchTrigger::Retry, WidgetPhase::Error) => Some(WidgetPhase::Loading),
            (
                FetchTrigger::Manual | FetchTrigger::Timer,
                WidgetPhase::Ready | WidgetPhase::Refreshing,
            ) => Some(WidgetPhase::Refreshing),
            _ => None,
        }
    }
}

/// One mounted widget on the rendering side.
///
/// Dropping the session unmounts it.
pub struct WidgetSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: WidgetConfig,
    query: ArticleQuery,
    content: Arc<dyn ContentApi>,
    document: DocumentClasses,
    theme: Mutex<ThemeBinding>,
    state: watch::Sender<WidgetSnapshot>,
    issued: AtomicU64,
    mounted: AtomicBool,
    refresh_interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl WidgetSession {
    /// Mount a session in `Loading` and apply its theme to `document`.
    pub fn mount(
        config: WidgetConfig,
        content: Arc<dyn ContentApi>,
        document: DocumentClasses,
        refresh_interval: Duration,
    ) -> Self {
        let theme = ThemeBinding::apply(config.theme, &document);
        let (state, _) = watch::channel(WidgetSnapshot::loading());

        Self {
            inner: Arc::new(SessionInner {
                query: ArticleQuery::for_config(&config),
                config,
                content,
                document,
                theme: Mutex::new(theme),
                state,
                issued: AtomicU64::new(0),
                mounted: AtomicBool::new(true),
                refresh_interval,
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.inner.config
    }

    pub fn document(&self) -> &DocumentClasses {
        &self.inner.document
    }

    pub fn snapshot(&self) -> WidgetSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted()
    }

    pub fn is_timer_armed(&self) -> bool {
        lock(&self.inner.timer).is_some()
    }

    /// Initial fetch. Only meaningful while `Loading`.
    pub async fn load(&self) {
        self.inner.fetch(FetchTrigger::Initial).await;
    }

    /// Manual refresh. Keeps current articles on screen while in flight.
    pub async fn refresh(&self) {
        self.inner.fetch(FetchTrigger::Manual).await;
    }

    /// Leave `Error` and fetch again with the same configuration.
    pub async fn retry(&self) {
        self.inner.fetch(FetchTrigger::Retry).await;
    }

    /// Disarm the refresh timer, drop pending results and undo the theme.
    pub fn unmount(&self) {
        if !self.inner.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
        }
        lock(&self.inner.theme).release(&self.inner.document);
        // Wake subscribers so live streams notice the unmount.
        self.inner.state.send_modify(|_| {});

        debug!(
            target = "mukoko_embed::session",
            country = self.inner.config.country.code(),
            layout = self.inner.config.layout.as_str(),
            "widget session unmounted"
        );
    }
}

impl Drop for WidgetSession {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl SessionInner {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    async fn fetch(self: &Arc<Self>, trigger: FetchTrigger) {
        let Some(generation) = self.begin(trigger) else {
            return;
        };

        counter!("mukoko_embed_fetch_total", "trigger" => trigger.as_str()).increment(1);
        let result = self.content.get_articles(&self.query).await;

        let failure = result.as_ref().err().map(ToString::to_string);
        let applied = self.complete(generation, result);

        if !applied {
            counter!("mukoko_embed_fetch_discarded_total").increment(1);
            debug!(
                target = "mukoko_embed::session",
                generation,
                trigger = trigger.as_str(),
                "discarding superseded fetch result"
            );
            return;
        }

        match failure {
            Some(error) => {
                counter!("mukoko_embed_fetch_failed_total", "trigger" => trigger.as_str())
                    .increment(1);
                warn!(
                    target = "mukoko_embed::session",
                    generation,
                    trigger = trigger.as_str(),
                    country = self.config.country.code(),
                    error = %error,
                    "article fetch failed"
                );
            }
            None => self.arm_timer(),
        }
    }

    /// Enter the trigger's phase and claim a generation, or refuse.
    fn begin(&self, trigger: FetchTrigger) -> Option<u64> {
        if !self.is_mounted() {
            return None;
        }

        let mut generation = None;
        self.state.send_if_modified(|snapshot| {
            let Some(phase) = trigger.entry_phase(snapshot.phase) else {
                return false;
            };
            generation = Some(self.issued.fetch_add(1, Ordering::SeqCst) + 1);
            if snapshot.phase == phase {
                return false;
            }
            snapshot.phase = phase;
            snapshot.revision += 1;
            true
        });
        generation
    }

    /// Apply a fetch result if it is still current. Returns whether it was.
    fn complete(
        &self,
        generation: u64,
        result: Result<Vec<Article>, ContentError>,
    ) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|snapshot| {
            if !self.is_mounted() || self.issued.load(Ordering::SeqCst) != generation {
                return false;
            }
            applied = true;
            match result {
                Ok(articles) => {
                    snapshot.phase = WidgetPhase::Ready;
                    snapshot.articles = Arc::from(articles);
                }
                // A failed background refresh keeps the stale articles.
                Err(_) if snapshot.phase == WidgetPhase::Refreshing => {
                    snapshot.phase = WidgetPhase::Ready;
                }
                Err(_) => {
                    snapshot.phase = WidgetPhase::Error;
                }
            }
            snapshot.revision += 1;
            true
        });
        applied
    }

    fn arm_timer(self: &Arc<Self>) {
        let mut slot = lock(&self.timer);
        if slot.is_some() || !self.is_mounted() {
            return;
        }

        let session = Arc::downgrade(self);
        let period = self.refresh_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // Skip the first immediate tick
            loop {
                ticker.tick().await;
                let Some(inner) = session.upgrade() else {
                    break;
                };
                if !inner.is_mounted() {
                    break;
                }
                inner.fetch(FetchTrigger::Timer).await;
            }
        }));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
