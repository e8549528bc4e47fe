use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use super::budget::{RunSession, TimeBudget};
use super::observer::{AutomationObserver, Observers, Status, Subscription};
use super::scheduler::GestureScheduler;
use super::timer::{Generations, ScheduledAction};
use crate::config::{Config, ConfigError, validate_config};
use crate::gesture::{GestureOutcome, GesturePerformer};
use crate::launcher::{AppLauncher, LaunchError};
use crate::random::RandomSource;

/// Countdown refresh period.
const TICK: Duration = Duration::from_secs(1);

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Overall state of the automation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum AutomationState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

impl fmt::Display for AutomationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        })
    }
}

/// User commands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Toggles between running and paused.
    Pause,
    Stop,
    /// The platform revoked the automation service.
    Interrupt,
}

/// A foreground-application change reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundChange {
    pub package_name: String,
    pub class_name: Option<String>,
}

impl ForegroundChange {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            class_name: None,
        }
    }
}

/// Everything the controller reacts to, delivered through one queue.
#[derive(Debug)]
pub enum Event {
    Command(Command),
    Foreground(ForegroundChange),
    GestureWaitElapsed {
        generation: u64,
    },
    GestureFinished {
        generation: u64,
        outcome: GestureOutcome,
    },
    Tick {
        generation: u64,
    },
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

impl From<ForegroundChange> for Event {
    fn from(change: ForegroundChange) -> Self {
        Self::Foreground(change)
    }
}

/// Platform capabilities the controller drives.
pub struct Collaborators {
    pub random: Box<dyn RandomSource>,
    pub performer: Arc<dyn GesturePerformer>,
    pub launcher: Arc<dyn AppLauncher>,
}

/// The automation state machine.
///
/// Owns the run state, the run session and both kinds of scheduled work (the
/// gesture loop and the countdown tick). Every mutation happens through
/// [`handle`](Self::handle) or the command methods, called from a single sequencer.
pub struct AutomationController {
    target: String,
    budget: TimeBudget,
    state: AutomationState,
    state_tx: watch::Sender<AutomationState>,
    session: Option<RunSession>,
    /// Package most recently reported in the foreground, in any state.
    foreground: Option<String>,
    tick: Option<ScheduledAction>,
    tick_generations: Generations,
    scheduler: GestureScheduler,
    launcher: Arc<dyn AppLauncher>,
    observers: Observers,
    events: EventSender,
}

impl AutomationController {
    /// Build a controller and the queue it consumes.
    ///
    /// Refuses an invalid configuration.
    pub fn new(
        config: Config,
        collaborators: Collaborators,
    ) -> Result<(Self, EventReceiver), ConfigError> {
        validate_config(&config)?;

        let (events, receiver) = mpsc::unbounded_channel();
        let Config {
            target_package,
            timing,
            screen,
            ..
        } = config;
        let budget = TimeBudget::from_minutes(timing.run_duration_minutes);
        let scheduler = GestureScheduler::new(
            timing,
            screen,
            collaborators.random,
            collaborators.performer,
            events.clone(),
        );
        let (state_tx, _) = watch::channel(AutomationState::Idle);

        let controller = Self {
            target: target_package,
            budget,
            state: AutomationState::Idle,
            state_tx,
            session: None,
            foreground: None,
            tick: None,
            tick_generations: Generations::default(),
            scheduler,
            launcher: collaborators.launcher,
            observers: Observers::new(),
            events,
        };
        Ok((controller, receiver))
    }

    /// Register an observer until the returned subscription is dropped.
    #[must_use = "dropping the subscription unregisters the observer"]
    pub fn subscribe(&self, observer: Arc<dyn AutomationObserver>) -> Subscription {
        self.observers.subscribe(observer)
    }

    #[must_use]
    pub fn observers(&self) -> Observers {
        self.observers.clone()
    }

    #[must_use]
    pub fn state(&self) -> AutomationState {
        self.state
    }

    /// Follow state changes from outside the sequencer.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<AutomationState> {
        self.state_tx.subscribe()
    }

    /// A sender feeding this controller's queue.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        self.events.clone()
    }

    #[must_use]
    pub fn session(&self) -> Option<&RunSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn scheduler(&self) -> &GestureScheduler {
        &self.scheduler
    }

    /// Whether any gesture-wait, in-flight gesture or countdown tick is outstanding.
    #[must_use]
    pub fn has_outstanding_actions(&self) -> bool {
        self.tick.is_some() || self.scheduler.is_active()
    }

    /// Dispatch one queued event.
    pub fn handle(&mut self, event: Event) {
        trace!(target: "autoswipe::controller", ?event, state = %self.state, "Event");
        match event {
            Event::Command(Command::Start) => self.start(),
            Event::Command(Command::Pause) => self.pause(),
            Event::Command(Command::Stop) => self.stop(),
            Event::Command(Command::Interrupt) => self.interrupt(),
            Event::Foreground(change) => self.on_foreground_changed(&change),
            Event::GestureWaitElapsed { generation } => {
                self.scheduler.on_wait_elapsed(generation, self.state);
            }
            Event::GestureFinished {
                generation,
                outcome,
            } => self
                .scheduler
                .on_gesture_finished(generation, outcome, self.state),
            Event::Tick { generation } => self.on_tick(generation),
        }
    }

    /// Announce that the automation is ready for commands.
    pub fn announce_ready(&self) {
        self.observers.status(Status::Ready);
    }

    /// Begin a run: open a session, launch the target and start the countdown.
    ///
    /// Swiping only begins once the target app is reported in the foreground.
    pub fn start(&mut self) {
        if matches!(self.state, AutomationState::Running | AutomationState::Paused) {
            debug!(target: "autoswipe::controller", state = %self.state, "Already started");
            return;
        }

        self.set_state(AutomationState::Running);
        let session = self.budget.begin(Instant::now());
        let countdown = session.display();
        self.session = Some(session);
        info!(
            target: "autoswipe::controller",
            target_package = %self.target,
            budget_secs = self.budget.total().as_secs(),
            "Run started"
        );
        self.observers.status(Status::Starting);
        self.observers.time_remaining(&countdown);

        match self.launcher.launch(&self.target) {
            Ok(()) => self.observers.status(Status::LaunchingTarget),
            Err(e @ LaunchError::NotFound { .. }) => {
                warn!(target: "autoswipe::controller", error = %e, "Target app missing");
                self.observers.status(Status::TargetNotFound);
                self.stop();
                return;
            }
            Err(e) => {
                error!(target: "autoswipe::controller", error = %e, "Failed to launch target app");
                self.observers.status(Status::LaunchFailed);
                self.stop();
                return;
            }
        }

        self.schedule_tick();
    }

    /// Swipe once the target app is frontmost.
    pub fn on_foreground_changed(&mut self, change: &ForegroundChange) {
        debug!(
            target: "autoswipe::controller",
            package = %change.package_name,
            class = change.class_name.as_deref().unwrap_or(""),
            "Foreground changed"
        );
        self.foreground = Some(change.package_name.clone());
        if self.state != AutomationState::Running || change.package_name != self.target {
            return;
        }
        if self.scheduler.start_loop() {
            self.observers.status(Status::Running);
        }
    }

    /// Toggle between running and paused. Pausing halts swiping only; the run budget
    /// keeps draining.
    pub fn pause(&mut self) {
        match self.state {
            AutomationState::Running => {
                self.set_state(AutomationState::Paused);
                self.scheduler.cancel_loop();
                info!(target: "autoswipe::controller", "Paused");
                self.observers.status(Status::Paused);
            }
            AutomationState::Paused => {
                self.set_state(AutomationState::Running);
                info!(target: "autoswipe::controller", "Resumed");
                self.observers.status(Status::Running);
                // The target may have come to the front while paused.
                if !self.scheduler.resume_loop() && self.target_in_front() {
                    self.scheduler.start_loop();
                }
            }
            AutomationState::Idle | AutomationState::Stopped => {
                debug!(target: "autoswipe::controller", state = %self.state, "Nothing to pause");
            }
        }
    }

    /// End the run. Repeated calls are silent.
    pub fn stop(&mut self) {
        if self.state == AutomationState::Stopped {
            trace!(target: "autoswipe::controller", "Already stopped");
            return;
        }

        self.scheduler.cancel_loop();
        self.scheduler.reset();
        self.tick = None;
        self.session = None;
        self.set_state(AutomationState::Stopped);
        info!(target: "autoswipe::controller", "Run stopped");
        self.observers.status(Status::Stopped);
        self.observers.time_remaining(&self.budget.full_display());
    }

    /// The platform took the automation service away: stop and say so.
    pub fn interrupt(&mut self) {
        warn!(target: "autoswipe::controller", "Automation service interrupted");
        self.stop();
        self.observers.status(Status::Interrupted);
    }

    /// Stop and drop every observer (controller teardown).
    pub fn shutdown(&mut self) {
        self.stop();
        self.observers.clear();
    }

    fn on_tick(&mut self, generation: u64) {
        if !self.tick.as_ref().is_some_and(|t| t.is(generation)) {
            trace!(target: "autoswipe::controller", generation, "Stale tick ignored");
            return;
        }
        self.tick = None;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let remaining = session.refresh(Instant::now());
        if session.is_expired() {
            info!(target: "autoswipe::controller", "Run budget used up");
            self.stop();
            return;
        }

        if self.state == AutomationState::Running {
            trace!(target: "autoswipe::controller", remaining_secs = remaining.as_secs(), "Tick");
            let countdown = session.display();
            self.observers.time_remaining(&countdown);
        }
        self.schedule_tick();
    }

    fn target_in_front(&self) -> bool {
        self.foreground.as_deref() == Some(self.target.as_str())
    }

    fn schedule_tick(&mut self) {
        let generation = self.tick_generations.next();
        self.tick = Some(ScheduledAction::spawn(
            &self.events,
            generation,
            TICK,
            Event::Tick { generation },
        ));
    }

    fn set_state(&mut self, state: AutomationState) {
        self.state = state;
        self.state_tx.send_replace(state);
    }
}

impl fmt::Debug for AutomationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationController")
            .field("target", &self.target)
            .field("state", &self.state)
            .field("session", &self.session)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}
