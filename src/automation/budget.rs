//! Run budget: how long a run may last and how much of it is left.

use std::time::Duration;

use tokio::time::Instant;

/// Label in front of every countdown text.
const REMAINING_LABEL: &str = "Remaining";

/// Total wall-clock time a run is allowed to take.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeBudget {
    total: Duration,
}

impl TimeBudget {
    #[must_use]
    pub const fn new(total: Duration) -> Self {
        Self { total }
    }

    #[must_use]
    pub const fn from_minutes(minutes: u32) -> Self {
        Self::new(Duration::from_secs(minutes as u64 * 60))
    }

    #[must_use]
    pub const fn total(&self) -> Duration {
        self.total
    }

    /// Open a session that starts consuming the budget at `now`.
    #[must_use]
    pub fn begin(&self, now: Instant) -> RunSession {
        RunSession {
            started_at: now,
            total: self.total,
            remaining: self.total,
        }
    }

    /// Countdown text for an untouched budget, shown when no run is active.
    #[must_use]
    pub fn full_display(&self) -> String {
        format_remaining(self.total)
    }
}

/// Budget consumption of one run, from `start()` until stop or expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSession {
    started_at: Instant,
    total: Duration,
    remaining: Duration,
}

impl RunSession {
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Remaining time as of the last [`refresh`](Self::refresh).
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Recompute the remaining time as `max(0, total - elapsed)`.
    pub fn refresh(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.started_at);
        self.remaining = self.total.saturating_sub(elapsed);
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Countdown text for the current remaining time.
    #[must_use]
    pub fn display(&self) -> String {
        format_remaining(self.remaining)
    }
}

/// `Remaining: MM:SS`, rounding partial seconds up so a live countdown only reads
/// `00:00` once the budget is really gone.
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    let mut secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs += 1;
    }
    format!("{REMAINING_LABEL}: {:02}:{:02}", secs / 60, secs % 60)
}
