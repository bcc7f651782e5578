//! Background token refresh for the LMS admin client.
//!
//! Access tokens expire (one hour by default). Rather than letting every
//! hour start with a failed request and a refresh-and-retry, the client
//! refreshes proactively on a fixed interval that is shorter than the
//! token lifetime.
//!
//! This crate provides the timing half of that:
//!
//! - [`RefreshConfig`]: interval, token lifetime, first-refresh jitter
//! - [`RefreshTimer`]: waits for the next refresh, tracks outcomes
//! - [`spawn_refresh_loop`]: runs a timer on its own task and calls a
//!   refresh callback each interval, returning a [`RefreshHandle`]
//!
//! It knows nothing about HTTP or tokens. The callback does the actual
//! refresh and reports back a [`RefreshOutcome`].
//!
//! # Disabled mode
//!
//! When `interval` is zero the timer never fires and
//! [`RefreshTimer::wait_for_refresh`] pends forever. A loop spawned with a
//! disabled config idles until it is cancelled.
//!
//! # Integration
//!
//! ```ignore
//! let weak = Arc::downgrade(&inner);
//! let handle = spawn_refresh_loop(config, move || {
//!     let weak = weak.clone();
//!     async move {
//!         let Some(inner) = weak.upgrade() else { return RefreshOutcome::Stop };
//!         if inner.refresh().await { RefreshOutcome::Refreshed } else { RefreshOutcome::Failed }
//!     }
//! });
//! // later, on logout:
//! handle.cancel();
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for background refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Time between refreshes. Zero disables the timer.
    pub interval: Duration,
    /// How long the server's access tokens live. The interval must stay
    /// below this or the token expires between refreshes.
    pub token_lifetime: Duration,
    /// Random delay (0..max) added to the *first* refresh only, to spread
    /// out clients that all signed in at the same moment.
    pub initial_jitter: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(45 * 60),
            token_lifetime: Duration::from_secs(60 * 60),
            initial_jitter: Duration::ZERO,
        }
    }
}

impl RefreshConfig {
    /// Shortest interval accepted. Anything below this hammers the server.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    /// Create a config with a specific interval and default everything else.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// A config whose timer never fires.
    pub fn disabled() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`RefreshTimer::new`]. Rules:
    /// - A zero interval is left alone (disabled).
    /// - A non-zero interval is raised to at least [`Self::MIN_INTERVAL`].
    /// - An interval at or above `token_lifetime` is lowered to three
    ///   quarters of the lifetime.
    pub fn validated(mut self) -> Self {
        if self.interval.is_zero() {
            return self;
        }
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                "refresh interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        if !self.token_lifetime.is_zero() && self.interval >= self.token_lifetime {
            let clamped = (self.token_lifetime * 3 / 4).max(Self::MIN_INTERVAL);
            warn!(
                interval_secs = self.interval.as_secs(),
                lifetime_secs = self.token_lifetime.as_secs(),
                clamped_secs = clamped.as_secs(),
                "refresh interval not shorter than token lifetime, clamping"
            );
            self.interval = clamped;
        }
        self
    }

    /// `true` when the timer will never fire.
    pub fn is_disabled(&self) -> bool {
        self.interval.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Outcomes and metrics
// ---------------------------------------------------------------------------

/// What a refresh callback reports back to the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new access token was stored.
    Refreshed,
    /// The refresh didn't succeed. The loop keeps going; the next interval
    /// tries again.
    Failed,
    /// There's nothing left to refresh (signed out, client gone). The loop
    /// exits.
    Stop,
}

/// Runtime metrics for the refresh timer.
#[derive(Debug, Clone, Default)]
pub struct RefreshMetrics {
    /// Total refresh attempts (every outcome except `Stop`).
    pub total_attempts: u64,
    pub total_refreshed: u64,
    pub total_failed: u64,
    /// Failures since the last success. Resets to 0 on `Refreshed`.
    pub consecutive_failures: u64,
    /// When the last successful refresh was recorded.
    pub last_refreshed_at: Option<Instant>,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// Fixed-interval refresh timer.
///
/// One timer per client. Missed intervals (the process was suspended, the
/// previous refresh took longer than an interval) collapse into a single
/// refresh: the next deadline is always scheduled from "now".
pub struct RefreshTimer {
    config: RefreshConfig,
    count: u64,
    /// When the next refresh is due (`None` when disabled).
    next: Option<Instant>,
    paused: bool,
    metrics: RefreshMetrics,
}

impl RefreshTimer {
    /// Create a new timer from config.
    ///
    /// The first refresh is due one interval from now, plus jitter.
    pub fn new(config: RefreshConfig) -> Self {
        let config = config.validated();

        let next = (!config.is_disabled()).then(|| {
            let jitter = if config.initial_jitter.is_zero() {
                Duration::ZERO
            } else {
                let max_ms = config.initial_jitter.as_millis().max(1) as u64;
                Duration::from_millis(rand::rng().random_range(0..max_ms))
            };
            Instant::now() + config.interval + jitter
        });

        if config.is_disabled() {
            debug!("refresh timer created in disabled mode");
        } else {
            debug!(interval_secs = config.interval.as_secs(), "refresh timer created");
        }

        Self {
            config,
            count: 0,
            next,
            paused: false,
            metrics: RefreshMetrics::default(),
        }
    }

    /// Wait until the next refresh is due. Returns the refresh number
    /// (starting at 1).
    ///
    /// When disabled or paused this future pends forever, but
    /// `tokio::select!` will still process other branches.
    pub async fn wait_for_refresh(&mut self) -> u64 {
        let next = match self.next {
            Some(next) if !self.paused => next,
            _ => std::future::pending::<Instant>().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(next);
        if late_by >= self.config.interval {
            debug!(
                late_secs = late_by.as_secs(),
                "refresh deadline missed by more than one interval"
            );
        }

        self.count += 1;
        self.next = Some(now + self.config.interval);
        trace!(refresh = self.count, "refresh due");
        self.count
    }

    /// Record what the refresh callback reported.
    pub fn record_outcome(&mut self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Refreshed => {
                self.metrics.total_attempts += 1;
                self.metrics.total_refreshed += 1;
                self.metrics.consecutive_failures = 0;
                self.metrics.last_refreshed_at = Some(Instant::now());
                debug!(refresh = self.count, "scheduled refresh succeeded");
            }
            RefreshOutcome::Failed => {
                self.metrics.total_attempts += 1;
                self.metrics.total_failed += 1;
                self.metrics.consecutive_failures += 1;
                warn!(
                    refresh = self.count,
                    consecutive = self.metrics.consecutive_failures,
                    "scheduled refresh failed"
                );
            }
            RefreshOutcome::Stop => {
                debug!(refresh = self.count, "refresh callback asked to stop");
            }
        }
    }

    /// Pause the timer. `wait_for_refresh` will pend until
    /// [`resume`](Self::resume) is called.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(refresh = self.count, "refresh timer paused");
        }
    }

    /// Resume after a pause. The next refresh is due one full interval from
    /// now.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if !self.config.is_disabled() {
                self.next = Some(Instant::now() + self.config.interval);
            }
            debug!(refresh = self.count, "refresh timer resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled()
    }

    /// Number of refreshes that have come due so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Snapshot of current metrics.
    pub fn metrics(&self) -> &RefreshMetrics {
        &self.metrics
    }

    /// The (validated) interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}

// ---------------------------------------------------------------------------
// Background loop
// ---------------------------------------------------------------------------

/// Handle to a running refresh loop.
///
/// Dropping the handle aborts the loop. Call [`cancel`](Self::cancel) to
/// stop it gracefully, or [`join`](Self::join) to wait for it and collect
/// its metrics.
pub struct RefreshHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<RefreshMetrics>>,
}

impl RefreshHandle {
    /// Ask the loop to stop. A refresh already in flight finishes first.
    ///
    /// Safe to call multiple times.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            // The loop may already have exited on its own.
            let _ = tx.send(());
        }
    }

    /// `true` once the loop has exited (cancelled, stopped, or aborted).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// Returns the loop's final metrics, or `None` if the task panicked.
    pub async fn join(mut self) -> Option<RefreshMetrics> {
        self.cancel();
        let task = self.task.take()?;
        match task.await {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(error = %e, "refresh loop did not exit cleanly");
                None
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn a task that calls `refresh` once per interval until cancelled or
/// until the callback returns [`RefreshOutcome::Stop`].
///
/// Must be called from inside a Tokio runtime.
pub fn spawn_refresh_loop<F, Fut>(config: RefreshConfig, mut refresh: F) -> RefreshHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = RefreshOutcome> + Send + 'static,
{
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    let mut timer = RefreshTimer::new(config);

    info!(
        interval_secs = timer.interval().as_secs(),
        disabled = timer.is_disabled(),
        "background refresh scheduled"
    );

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    debug!("background refresh cancelled");
                    break;
                }
                _ = timer.wait_for_refresh() => {
                    let outcome = refresh().await;
                    timer.record_outcome(outcome);
                    if outcome == RefreshOutcome::Stop {
                        break;
                    }
                }
            }
        }

        let metrics = timer.metrics().clone();
        info!(
            refreshed = metrics.total_refreshed,
            failed = metrics.total_failed,
            "background refresh stopped"
        );
        metrics
    });

    RefreshHandle {
        cancel: Some(cancel_tx),
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_keeps_zero_interval_disabled() {
        let cfg = RefreshConfig::disabled().validated();
        assert!(cfg.is_disabled());
    }

    #[test]
    fn test_validated_raises_tiny_interval() {
        let cfg = RefreshConfig::with_interval(Duration::from_millis(10)).validated();
        assert_eq!(cfg.interval, RefreshConfig::MIN_INTERVAL);
    }

    #[test]
    fn test_validated_clamps_interval_below_lifetime() {
        let cfg = RefreshConfig {
            interval: Duration::from_secs(3600),
            token_lifetime: Duration::from_secs(3600),
            initial_jitter: Duration::ZERO,
        }
        .validated();
        assert_eq!(cfg.interval, Duration::from_secs(2700));
    }

    #[test]
    fn test_validated_zero_lifetime_means_unbounded() {
        let cfg = RefreshConfig {
            interval: Duration::from_secs(7200),
            token_lifetime: Duration::ZERO,
            initial_jitter: Duration::ZERO,
        }
        .validated();
        assert_eq!(cfg.interval, Duration::from_secs(7200));
    }

    #[test]
    fn test_record_outcome_stop_is_not_an_attempt() {
        let mut timer = RefreshTimer::new(RefreshConfig::disabled());
        timer.record_outcome(RefreshOutcome::Stop);
        assert_eq!(timer.metrics().total_attempts, 0);
    }

    #[test]
    fn test_record_outcome_success_resets_consecutive_failures() {
        let mut timer = RefreshTimer::new(RefreshConfig::disabled());
        timer.record_outcome(RefreshOutcome::Failed);
        timer.record_outcome(RefreshOutcome::Failed);
        assert_eq!(timer.metrics().consecutive_failures, 2);

        timer.record_outcome(RefreshOutcome::Refreshed);
        let m = timer.metrics();
        assert_eq!(m.consecutive_failures, 0);
        assert_eq!(m.total_attempts, 3);
        assert_eq!(m.total_failed, 2);
        assert_eq!(m.total_refreshed, 1);
        assert!(m.last_refreshed_at.is_some());
    }
}
