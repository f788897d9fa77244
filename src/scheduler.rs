//! Periodic and on-demand refresh of the race board.
//!
//! [`RefreshScheduler`] is the only writer of [`RefreshState`]. Every state
//! change happens inside one `watch` update, so readers always see a whole
//! transition. Each refresh cycle takes an increasing id when it starts and
//! its result is applied only if no newer cycle has started since; late
//! answers from superseded cycles are dropped.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::{RaceSource, RaceSummary};
use crate::category::CategoryFilter;
use crate::selection;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Prefix of every message stored in [`RefreshState::last_error`].
pub const LOAD_ERROR_PREFIX: &str = "Failed to load race data: ";

/// Where the board is in its refresh loop.
///
/// `Success` and `Failed` are idle states that also record how the most
/// recent applied cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Loading,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Timer,
    Manual,
}

/// Everything the presentation layer needs to draw the board.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshState {
    pub phase: RefreshPhase,
    pub last_error: Option<String>,
    pub selected: CategoryFilter,
    pub races: Vec<RaceSummary>,
    /// Race summaries in the last successful response, before selection.
    pub fetched: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for RefreshState {
    fn default() -> Self {
        Self {
            phase: RefreshPhase::Idle,
            last_error: None,
            selected: CategoryFilter::all_known(),
            races: Vec::new(),
            fetched: 0,
            last_updated: None,
        }
    }
}

impl RefreshState {
    pub fn is_loading(&self) -> bool {
        self.phase == RefreshPhase::Loading
    }
}

struct Timer {
    token: CancellationToken,
}

struct Inner {
    source: Arc<dyn RaceSource>,
    interval: Duration,
    state: watch::Sender<RefreshState>,
    latest_cycle: AtomicU64,
    timer: Mutex<Option<Timer>>,
}

impl Inner {
    /// Apply `update` to the selected filter and start a cycle with the result.
    ///
    /// The filter change, the cycle id and the filter the cycle fetches with
    /// are all taken under the one state write.
    async fn run_cycle<F>(&self, trigger: Trigger, update: F)
    where
        F: FnOnce(&mut CategoryFilter),
    {
        let mut cycle = 0;
        let mut filter = CategoryFilter::default();
        self.state.send_modify(|state| {
            update(&mut state.selected);
            cycle = self.latest_cycle.fetch_add(1, Ordering::SeqCst) + 1;
            filter = state.selected.clone();
            state.phase = RefreshPhase::Loading;
        });
        debug!("Refresh cycle {} started ({:?})", cycle, trigger);

        let result = self.source.fetch_races().await;
        let now = Utc::now();

        self.state.send_if_modified(|state| {
            if self.latest_cycle.load(Ordering::SeqCst) != cycle {
                debug!("Discarding result of superseded refresh cycle {}", cycle);
                return false;
            }

            match result {
                Ok(response) => {
                    let summaries = response.data.race_summaries;
                    state.races = selection::select(&summaries, &filter, now.timestamp());
                    state.fetched = summaries.len();
                    state.last_updated = Some(now);
                    state.last_error = None;
                    state.phase = RefreshPhase::Success;
                    info!(
                        "Refresh cycle {} showing {} of {} races",
                        cycle,
                        state.races.len(),
                        state.fetched
                    );
                }
                Err(err) => {
                    warn!("Refresh cycle {} failed: {}", cycle, err);
                    state.last_error = Some(format!("{}{}", LOAD_ERROR_PREFIX, err));
                    state.phase = RefreshPhase::Failed;
                }
            }
            true
        });
    }

    fn stop_timer(&self) -> bool {
        let timer = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match timer {
            Some(timer) => {
                timer.token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = timer.take() {
            timer.token.cancel();
        }
    }
}

/// Owns the refresh timer and the published [`RefreshState`].
///
/// Cloning is cheap and every clone drives the same state.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<Inner>,
}

impl RefreshScheduler {
    pub fn new(source: Arc<dyn RaceSource>, interval: Duration) -> Self {
        Self::with_selected(source, interval, CategoryFilter::all_known())
    }

    pub fn with_selected(source: Arc<dyn RaceSource>, interval: Duration, selected: CategoryFilter) -> Self {
        let (state, _) = watch::channel(RefreshState {
            selected,
            ..RefreshState::default()
        });

        Self {
            inner: Arc::new(Inner {
                source,
                interval,
                state,
                latest_cycle: AtomicU64::new(0),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Receiver that is notified on every applied state change.
    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> RefreshState {
        self.inner.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start refreshing every interval, first tick one interval from now.
    ///
    /// Restarts the cadence if already running. Must be called from within a
    /// tokio runtime.
    pub fn start(&self) {
        let mut timer = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = timer.take() {
            previous.token.cancel();
        }

        let token = CancellationToken::new();
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(run_timer(weak, self.inner.interval, token.clone()));
        *timer = Some(Timer { token });

        info!("Refresh timer started ({:?} interval)", self.inner.interval);
    }

    /// Stop the periodic refresh. Cycles already in flight still complete.
    pub fn stop(&self) {
        if self.inner.stop_timer() {
            info!("Refresh timer stopped");
        }
    }

    /// Select `filter` and run one cycle right away.
    pub async fn refresh_now(&self, filter: CategoryFilter) {
        self.inner
            .run_cycle(Trigger::Manual, move |selected| *selected = filter)
            .await;
    }

    /// Run one cycle with the filter currently selected.
    pub async fn retry(&self) {
        self.inner.run_cycle(Trigger::Manual, |_| {}).await;
    }

    /// Flip `category_id` in the selected filter and refresh with the result.
    ///
    /// Deselecting the last selected category selects every known one.
    pub async fn toggle_category(&self, category_id: &str) {
        self.inner
            .run_cycle(Trigger::Manual, |selected| {
                selected.toggle(category_id);
                debug!("Category filter now {:?}", selected.ids().collect::<Vec<_>>());
            })
            .await;
    }

    /// Clear the last error without refreshing.
    pub fn dismiss_error(&self) {
        self.inner
            .state
            .send_if_modified(|state| state.last_error.take().is_some());
    }
}

async fn run_timer(inner: Weak<Inner>, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if token.is_cancelled() {
                    break;
                }
                let Some(strong) = inner.upgrade() else {
                    break;
                };
                // Cycles run detached so a slow fetch never shifts the cadence.
                tokio::spawn(async move {
                    strong.run_cycle(Trigger::Timer, |_| {}).await;
                });
            }
        }
    }
    debug!("Refresh timer task exiting");
}
