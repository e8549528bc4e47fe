//! Fakes for the automation's collaborators, shared by the unit tests.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, timeout_at};

use super::controller::{AutomationController, Collaborators, EventReceiver};
use super::observer::{AutomationObserver, Status, Subscription};
use crate::config::{Bounds, Config};
use crate::gesture::{GestureOutcome, GesturePerformer, GestureSpec};
use crate::launcher::{AppLauncher, LaunchError};
use crate::random::RandomRangeProvider;

/// Deterministic timings: initial wait 10s, interval 20s, swipe 500ms, watchdog 2s.
pub(crate) fn fixed_config() -> Config {
    let mut cfg = Config::default();
    cfg.target_package = "com.example.target".into();
    cfg.timing.swipe_interval_secs = Bounds::new(20, 20);
    cfg.timing.initial_wait_secs = 10;
    cfg.timing.swipe_duration_ms = Bounds::new(500, 500);
    cfg.timing.gesture_watchdog_ms = 2_000;
    cfg
}

pub(crate) fn assert_near(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(5);
    assert!(
        actual >= expected && actual <= expected + slack,
        "expected ~{expected:?}, got {actual:?}"
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Note {
    Status(Status),
    Time(String),
}

pub(crate) fn statuses(notes: &[Note]) -> Vec<Status> {
    notes
        .iter()
        .filter_map(|n| match n {
            Note::Status(s) => Some(*s),
            Note::Time(_) => None,
        })
        .collect()
}

pub(crate) fn times(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .filter_map(|n| match n {
            Note::Time(t) => Some(t.clone()),
            Note::Status(_) => None,
        })
        .collect()
}

#[derive(Default)]
pub(crate) struct RecordingObserver {
    notes: Mutex<Vec<Note>>,
}

impl RecordingObserver {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }
}

impl AutomationObserver for RecordingObserver {
    fn on_status_changed(&self, status: Status) {
        self.notes.lock().unwrap().push(Note::Status(status));
    }

    fn on_time_remaining_changed(&self, text: &str) {
        self.notes.lock().unwrap().push(Note::Time(text.to_string()));
    }
}

/// Performer that answers every gesture with a fixed outcome after the gesture's
/// duration, or never answers at all.
pub(crate) struct ScriptedPerformer {
    outcome: Option<GestureOutcome>,
    calls: AtomicUsize,
    specs: Mutex<Vec<GestureSpec>>,
}

impl ScriptedPerformer {
    fn with_outcome(outcome: Option<GestureOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            specs: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn completing() -> Arc<Self> {
        Self::with_outcome(Some(GestureOutcome::Completed))
    }

    pub(crate) fn cancelling() -> Arc<Self> {
        Self::with_outcome(Some(GestureOutcome::Cancelled))
    }

    pub(crate) fn hanging() -> Arc<Self> {
        Self::with_outcome(None)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn specs(&self) -> Vec<GestureSpec> {
        self.specs.lock().unwrap().clone()
    }
}

#[async_trait]
impl GesturePerformer for ScriptedPerformer {
    async fn perform(&self, spec: GestureSpec) -> GestureOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.specs.lock().unwrap().push(spec);
        match self.outcome {
            Some(outcome) => {
                tokio::time::sleep(spec.duration).await;
                outcome
            }
            None => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum LaunchFailure {
    NotFound,
    Spawn,
}

#[derive(Default)]
pub(crate) struct FakeLauncher {
    launches: Mutex<Vec<String>>,
    failure: Mutex<Option<LaunchFailure>>,
}

impl FakeLauncher {
    pub(crate) fn launches(&self) -> Vec<String> {
        self.launches.lock().unwrap().clone()
    }

    pub(crate) fn fail_with_not_found(&self) {
        *self.failure.lock().unwrap() = Some(LaunchFailure::NotFound);
    }

    pub(crate) fn fail_with_spawn_error(&self) {
        *self.failure.lock().unwrap() = Some(LaunchFailure::Spawn);
    }
}

impl AppLauncher for FakeLauncher {
    fn launch(&self, target: &str) -> Result<(), LaunchError> {
        self.launches.lock().unwrap().push(target.to_string());
        match *self.failure.lock().unwrap() {
            None => Ok(()),
            Some(LaunchFailure::NotFound) => Err(LaunchError::NotFound {
                target: target.to_string(),
            }),
            Some(LaunchFailure::Spawn) => Err(LaunchError::Spawn {
                program: "fake-launcher".into(),
                source: io::Error::other("permission denied"),
            }),
        }
    }
}

/// A controller wired to fakes, driven by draining its queue under virtual time.
pub(crate) struct Harness {
    pub(crate) controller: AutomationController,
    pub(crate) events: EventReceiver,
    pub(crate) recorder: Arc<RecordingObserver>,
    pub(crate) performer: Arc<ScriptedPerformer>,
    pub(crate) launcher: Arc<FakeLauncher>,
    _subscription: Subscription,
}

impl Harness {
    pub(crate) fn new(config: Config) -> Self {
        Self::with_performer(config, ScriptedPerformer::completing())
    }

    pub(crate) fn with_performer(config: Config, performer: Arc<ScriptedPerformer>) -> Self {
        let launcher = Arc::new(FakeLauncher::default());
        let collaborators = Collaborators {
            random: Box::new(RandomRangeProvider::seeded(17)),
            performer: performer.clone(),
            launcher: launcher.clone(),
        };
        let (controller, events) = AutomationController::new(config, collaborators).unwrap();
        let recorder = RecordingObserver::new();
        let subscription = controller.subscribe(recorder.clone());
        Self {
            controller,
            events,
            recorder,
            performer,
            launcher,
            _subscription: subscription,
        }
    }

    /// Handle every event delivered during the next `span` of virtual time.
    pub(crate) async fn run_for(&mut self, span: Duration) {
        let deadline = Instant::now() + span;
        while let Ok(Some(event)) = timeout_at(deadline, self.events.recv()).await {
            self.controller.handle(event);
        }
    }
}
