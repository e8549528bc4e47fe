//! One-shot timers that post an [`Event`] back onto the sequencer queue.
//!
//! A [`ScheduledAction`] is cancelled by dropping it. Cancellation alone cannot stop an
//! event that was already queued, so every event carries the generation of the action
//! that produced it and owners ignore generations they no longer hold.

use std::fmt;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::trace;

use super::controller::{Event, EventSender};

/// Stand-in deadline for delays too large to represent (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Monotonic generation counter, one per owner of scheduled work.
#[derive(Debug, Default)]
pub(crate) struct Generations {
    last: u64,
}

impl Generations {
    pub(crate) fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

/// An outstanding timer.
pub(crate) struct ScheduledAction {
    generation: u64,
    deadline: Instant,
    _guard: DropGuard,
}

impl ScheduledAction {
    /// Post `event` after `delay` unless the returned action is dropped first.
    pub(crate) fn spawn(
        events: &EventSender,
        generation: u64,
        delay: Duration,
        event: Event,
    ) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let events = events.clone();
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);

        tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {
                    trace!(target: "autoswipe::timer", generation, "Timer cancelled");
                }
                () = sleep_until(deadline) => {
                    // The receiver is gone once the automation shut down.
                    let _ = events.send(event);
                }
            }
        });

        Self {
            generation,
            deadline,
            _guard: token.drop_guard(),
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether an event tagged `generation` belongs to this action.
    pub(crate) fn is(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Time left until the action fires, as of `now`.
    pub(crate) fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }
}

impl fmt::Debug for ScheduledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledAction")
            .field("generation", &self.generation)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut generations = Generations::default();
        let generation = generations.next();
        let action =
            ScheduledAction::spawn(&tx, generation, Duration::from_secs(3), Event::Tick { generation });
        assert_eq!(action.remaining(Instant::now()), Duration::from_secs(3));

        let started = Instant::now();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::Tick { generation: 1 }));
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(action.is(1));
        assert_eq!(action.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let action = ScheduledAction::spawn(&tx, 1, Duration::from_secs(1), Event::Tick { generation: 1 });
        drop(action);
        assert!(timeout(Duration::from_secs(10), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_delay_is_clamped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let delay = Duration::from_secs(i64::MAX as u64);
        let action = ScheduledAction::spawn(&tx, 1, delay, Event::Tick { generation: 1 });
        assert_eq!(action.remaining(Instant::now()), FAR_FUTURE);
        assert!(timeout(Duration::from_secs(3_600), rx.recv()).await.is_err());
    }

    #[test]
    fn generations_increase() {
        let mut generations = Generations::default();
        assert_eq!(generations.next(), 1);
        assert_eq!(generations.next(), 2);
    }
}
