//! Fixed-period tick scheduler for cureroom.
//!
//! Each room actor owns two schedulers: a one-second cadence that drives
//! the drying countdown, and a slower cadence that samples the sensor
//! source. Both sit inside the actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* apply command */ }
//!         info = countdown.wait_for_tick() => {
//!             for _ in 0..=info.missed { supervisor.apply(Command::TimerTick); }
//!         }
//!         _ = sampling.wait_for_tick() => { /* poll sensors */ }
//!     }
//! }
//! ```
//!
//! A disabled or paused scheduler never resolves, so its `select!` branch
//! simply stays quiet. Pausing is how the countdown cadence follows
//! `timer.running`.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick fires late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Reschedule from now and report how many periods were missed in
    /// [`TickInfo::missed`]. Callers that must not lose time (the
    /// countdown) replay the missed periods themselves.
    #[default]
    Skip,
    /// Keep the original cadence; late ticks fire back to back until the
    /// schedule catches up.
    Drop,
}

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. `None` disables the scheduler entirely.
    pub period: Option<Duration>,
    pub policy: TickPolicy,
    /// Upper bound of the random delay added to the first tick so rooms
    /// opened together do not tick in lockstep.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: None,
            policy: TickPolicy::default(),
            initial_jitter: Duration::from_millis(50),
        }
    }
}

impl TickConfig {
    /// Shortest accepted period.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    /// A scheduler that ticks every `period`.
    pub fn every(period: Duration) -> Self {
        Self {
            period: Some(period),
            ..Default::default()
        }
    }

    /// A scheduler that never ticks.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Sets the first-tick jitter bound.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.initial_jitter = jitter;
        self
    }

    /// Sets the overrun policy.
    pub fn with_policy(mut self, policy: TickPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Raises a too-short period to [`Self::MIN_PERIOD`] and caps the
    /// jitter at one period. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if let Some(period) = self.period {
            if period < Self::MIN_PERIOD {
                warn!(
                    period_ms = period.as_secs_f64() * 1000.0,
                    "tick period below minimum, raising to 10 ms"
                );
                self.period = Some(Self::MIN_PERIOD);
            }
        }
        if let Some(period) = self.period {
            self.initial_jitter = self.initial_jitter.min(period);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info and stats
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Whole periods that elapsed without a tick (only under
    /// [`TickPolicy::Skip`]; always 0 under `Drop`).
    pub missed: u64,
    /// How late this tick fired relative to its deadline.
    pub late_by: Duration,
}

/// Running totals for a scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickStats {
    pub total_ticks: u64,
    pub total_missed: u64,
    pub max_late_by: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period tick source for one room.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    next_tick: Option<Instant>,
    paused: bool,
    stats: TickStats,
}

impl TickScheduler {
    /// Creates a scheduler; the first tick is one period (plus jitter)
    /// from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let next_tick = config.period.map(|period| {
            let jitter = if config.initial_jitter.is_zero() {
                Duration::ZERO
            } else {
                let bound = config.initial_jitter.as_micros() as u64;
                Duration::from_micros(rand::rng().random_range(0..bound))
            };
            Instant::now() + period + jitter
        });

        match config.period {
            Some(period) => debug!(
                period_ms = period.as_secs_f64() * 1000.0,
                policy = ?config.policy,
                "tick scheduler created"
            ),
            None => debug!("tick scheduler created disabled"),
        }

        Self {
            config,
            tick_count: 0,
            next_tick,
            paused: false,
            stats: TickStats::default(),
        }
    }

    /// Shorthand for `TickScheduler::new(TickConfig::every(period))`.
    pub fn every(period: Duration) -> Self {
        Self::new(TickConfig::every(period))
    }

    /// A scheduler that never ticks.
    pub fn disabled() -> Self {
        Self::new(TickConfig::disabled())
    }

    /// Waits for the next tick.
    ///
    /// Pends forever while disabled or paused.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (deadline, period) = match (self.next_tick, self.config.period) {
            (Some(deadline), Some(period)) if !self.paused => (deadline, period),
            _ => std::future::pending().await,
        };

        time::sleep_until(deadline).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(deadline);
        self.tick_count += 1;

        let missed = match self.config.policy {
            TickPolicy::Skip => {
                let missed = (late_by.as_nanos() / period.as_nanos()) as u64;
                if missed > 0 {
                    warn!(
                        tick = self.tick_count,
                        missed,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, rescheduling from now"
                    );
                }
                self.next_tick = Some(now + period);
                missed
            }
            TickPolicy::Drop => {
                self.next_tick = Some(deadline + period);
                0
            }
        };

        self.stats.total_ticks += 1;
        self.stats.total_missed += missed;
        self.stats.max_late_by = self.stats.max_late_by.max(late_by);
        trace!(tick = self.tick_count, missed, "tick fired");

        TickInfo {
            tick: self.tick_count,
            missed,
            late_by,
        }
    }

    /// Stops ticking until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Resumes ticking. The next tick is one full period from now, so a
    /// resumed countdown never fires early. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(period) = self.config.period {
                self.next_tick = Some(Instant::now() + period);
            }
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    /// Pauses or resumes so that the scheduler runs exactly when `running`
    /// is true.
    pub fn follow(&mut self, running: bool) {
        if running {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether this scheduler was created without a period.
    pub fn is_disabled(&self) -> bool {
        self.config.period.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn period(&self) -> Option<Duration> {
        self.config.period
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }
}
