//! The "wait → swipe → reschedule" loop.
//!
//! At any instant the loop is in one of three shapes:
//! - idle: nothing outstanding
//! - waiting: exactly one gesture-wait [`ScheduledAction`] is pending
//! - swiping: exactly one gesture is in flight with the [`GesturePerformer`]
//!
//! The next wait is only armed from the completion of the previous gesture, so slow
//! gestures never overlap. Waits and in-flight gestures are generation-tagged; events
//! from anything cancelled or superseded are dropped on arrival.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, timeout};
use tracing::{debug, info, trace, warn};

use super::controller::{AutomationState, Event, EventSender};
use super::timer::{Generations, ScheduledAction};
use crate::config::{Bounds, ScreenConfig, TimingConfig};
use crate::gesture::{GestureOutcome, GesturePerformer, GestureSpec, Point};
use crate::random::RandomSource;

pub struct GestureScheduler {
    timing: TimingConfig,
    screen: ScreenConfig,
    random: Box<dyn RandomSource>,
    performer: Arc<dyn GesturePerformer>,
    events: EventSender,
    generations: Generations,
    pending: Option<ScheduledAction>,
    in_flight: Option<u64>,
    /// Unelapsed part of a wait interrupted by [`cancel_loop`](Self::cancel_loop).
    carried: Option<Duration>,
    /// Whether the target app engaged the loop during the current run.
    engaged: bool,
    performed: u64,
}

impl GestureScheduler {
    pub fn new(
        timing: TimingConfig,
        screen: ScreenConfig,
        random: Box<dyn RandomSource>,
        performer: Arc<dyn GesturePerformer>,
        events: EventSender,
    ) -> Self {
        Self {
            timing,
            screen,
            random,
            performer,
            events,
            generations: Generations::default(),
            pending: None,
            in_flight: None,
            carried: None,
            engaged: false,
            performed: 0,
        }
    }

    /// Engage the loop. No-op while a wait or a gesture is outstanding.
    ///
    /// The first wait of a run is the configured initial wait, later ones are drawn
    /// from the swipe interval. Returns whether a wait was armed.
    pub fn start_loop(&mut self) -> bool {
        self.engaged = true;
        if self.is_active() {
            trace!(target: "autoswipe::scheduler", "Loop already active");
            return false;
        }
        let delay = match self.carried.take() {
            Some(carried) => carried,
            None if self.performed == 0 => self.initial_wait(),
            None => self.draw_interval(),
        };
        self.schedule_wait(delay);
        true
    }

    /// Re-arm a loop halted by [`cancel_loop`](Self::cancel_loop) without waiting a
    /// fresh interval: an interrupted wait continues with what was left of it, and a
    /// loop halted between gestures swipes right away.
    ///
    /// Does nothing unless the loop was engaged during this run. Returns whether a
    /// wait was armed.
    pub fn resume_loop(&mut self) -> bool {
        if !self.engaged {
            debug!(target: "autoswipe::scheduler", "Loop never engaged; nothing to resume");
            return false;
        }
        if self.is_active() {
            trace!(target: "autoswipe::scheduler", "Loop already active");
            return false;
        }
        let delay = match self.carried.take() {
            Some(carried) => carried,
            None if self.performed == 0 => self.initial_wait(),
            None => Duration::ZERO,
        };
        self.schedule_wait(delay);
        true
    }

    /// Cancel the outstanding wait, remembering how much of it was left.
    ///
    /// An in-flight gesture is left alone; its completion will find the automation
    /// not running and end the loop there.
    pub fn cancel_loop(&mut self) {
        if let Some(pending) = self.pending.take() {
            let left = pending.remaining(Instant::now());
            debug!(
                target: "autoswipe::scheduler",
                generation = pending.generation(),
                left_ms = left.as_millis(),
                "Swipe wait cancelled"
            );
            self.carried = Some(left);
        }
    }

    /// Forget everything about the current run.
    ///
    /// Completions of gestures still in flight become stale and are ignored.
    pub fn reset(&mut self) {
        self.pending = None;
        self.in_flight = None;
        self.carried = None;
        self.engaged = false;
        self.performed = 0;
    }

    /// A gesture-wait fired.
    pub fn on_wait_elapsed(&mut self, generation: u64, state: AutomationState) {
        if !self.pending.as_ref().is_some_and(|p| p.is(generation)) {
            trace!(target: "autoswipe::scheduler", generation, "Stale swipe wait ignored");
            return;
        }
        self.pending = None;
        self.perform_action(state);
    }

    /// The performer reported the end of a gesture.
    ///
    /// Completed, cancelled and timed out gestures are all followed by the next wait.
    pub fn on_gesture_finished(
        &mut self,
        generation: u64,
        outcome: GestureOutcome,
        state: AutomationState,
    ) {
        if self.in_flight != Some(generation) {
            trace!(target: "autoswipe::scheduler", generation, %outcome, "Stale swipe result ignored");
            return;
        }
        self.in_flight = None;
        match outcome {
            GestureOutcome::Completed => debug!(target: "autoswipe::scheduler", generation, "Swipe completed"),
            GestureOutcome::Cancelled => debug!(target: "autoswipe::scheduler", generation, "Swipe cancelled"),
            GestureOutcome::TimedOut => warn!(
                target: "autoswipe::scheduler",
                generation,
                "Swipe never reported back; moving on"
            ),
        }
        self.schedule_next(state);
    }

    /// Draw a gesture and hand it to the performer.
    fn perform_action(&mut self, state: AutomationState) {
        if state != AutomationState::Running {
            debug!(target: "autoswipe::scheduler", %state, "Not running; swipe skipped");
            return;
        }

        let spec = self.next_gesture();
        let generation = self.generations.next();
        self.in_flight = Some(generation);
        self.performed += 1;
        info!(
            target: "autoswipe::scheduler",
            generation,
            start = %spec.start, end = %spec.end,
            duration_ms = spec.duration.as_millis(),
            "Swiping"
        );

        let performer = Arc::clone(&self.performer);
        let events = self.events.clone();
        let limit = spec.duration + Duration::from_millis(self.timing.gesture_watchdog_ms);
        tokio::spawn(async move {
            let outcome = timeout(limit, performer.perform(spec))
                .await
                .unwrap_or(GestureOutcome::TimedOut);
            let _ = events.send(Event::GestureFinished {
                generation,
                outcome,
            });
        });
    }

    /// Arm the wait before the next gesture, unless the run is no longer running.
    fn schedule_next(&mut self, state: AutomationState) {
        if state != AutomationState::Running {
            debug!(target: "autoswipe::scheduler", %state, "Not running; loop ends");
            return;
        }
        let delay = self.draw_interval();
        self.schedule_wait(delay);
    }

    fn schedule_wait(&mut self, delay: Duration) {
        let generation = self.generations.next();
        debug!(
            target: "autoswipe::scheduler",
            generation,
            delay_ms = delay.as_millis(),
            "Next swipe scheduled"
        );
        self.pending = Some(ScheduledAction::spawn(
            &self.events,
            generation,
            delay,
            Event::GestureWaitElapsed { generation },
        ));
    }

    fn next_gesture(&mut self) -> GestureSpec {
        let screen = &self.screen;
        let random = self.random.as_mut();

        let start = Point::new(draw(random, screen.start_x), draw(random, screen.start_y));
        let drift = random.uniform_int(-screen.end_x_jitter, screen.end_x_jitter);
        let end = Point::new(start.x.saturating_add(drift), draw(random, screen.end_y));
        let duration_ms = draw(random, self.timing.swipe_duration_ms);

        GestureSpec {
            start,
            end,
            duration: Duration::from_millis(u64::try_from(duration_ms).unwrap_or(0)),
        }
    }

    fn draw_interval(&mut self) -> Duration {
        let secs = draw(self.random.as_mut(), self.timing.swipe_interval_secs);
        Duration::from_secs(u64::try_from(secs).unwrap_or(0))
    }

    fn initial_wait(&self) -> Duration {
        Duration::from_secs(u64::from(self.timing.initial_wait_secs))
    }

    /// Whether a wait is pending or a gesture is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.pending.is_some() || self.in_flight.is_some()
    }

    #[must_use]
    pub fn has_pending_wait(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn gesture_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Gestures handed to the performer during the current run.
    #[must_use]
    pub fn performed(&self) -> u64 {
        self.performed
    }
}

fn draw(random: &mut dyn RandomSource, bounds: Bounds) -> i64 {
    random.uniform_int(bounds.min, bounds.max)
}
