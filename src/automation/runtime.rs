use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::controller::{
    AutomationController, AutomationState, Command, Event, EventReceiver, EventSender,
    ForegroundChange,
};
use super::observer::{AutomationObserver, Observers, Subscription};

/// Handle to an [`AutomationController`] running on its own task.
///
/// The task is the single sequencer: commands, foreground changes, timer expiries
/// and gesture completions all go through one queue and are handled one at a time.
/// Commands never fail; once the automation is shut down they are logged and dropped.
pub struct Automation {
    events: EventSender,
    observers: Observers,
    state: watch::Receiver<AutomationState>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Automation {
    /// Spawn the sequencer task for `controller`, draining `mailbox`.
    ///
    /// Observers subscribed on the controller beforehand see the initial "ready".
    pub fn spawn(controller: AutomationController, mailbox: EventReceiver) -> Self {
        let events = controller.sender();
        let observers = controller.observers();
        let state = controller.watch_state();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run(controller, mailbox, shutdown.clone()));
        Self {
            events,
            observers,
            state,
            shutdown,
            task: Some(task),
        }
    }

    pub fn start(&self) {
        self.send(Command::Start.into());
    }

    /// Toggle pause.
    pub fn pause(&self) {
        self.send(Command::Pause.into());
    }

    pub fn stop(&self) {
        self.send(Command::Stop.into());
    }

    pub fn interrupt(&self) {
        self.send(Command::Interrupt.into());
    }

    pub fn foreground_changed(&self, change: ForegroundChange) {
        self.send(change.into());
    }

    /// Queue any event for the controller.
    pub fn send(&self, event: Event) {
        if let Err(e) = self.events.send(event) {
            warn!(target: "autoswipe::controller", event = ?e.0, "Automation is shut down; dropping event");
        }
    }

    /// Register an observer until the returned subscription is dropped.
    #[must_use = "dropping the subscription unregisters the observer"]
    pub fn subscribe(&self, observer: Arc<dyn AutomationObserver>) -> Subscription {
        self.observers.subscribe(observer)
    }

    /// Latest state published by the controller.
    #[must_use]
    pub fn state(&self) -> AutomationState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<AutomationState> {
        self.state.clone()
    }

    /// Stop the run, unregister every observer and wait for the task to end.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(target: "autoswipe::controller", error = %e, "Automation task ended abnormally");
            }
        }
    }
}

impl Drop for Automation {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run(
    mut controller: AutomationController,
    mut mailbox: EventReceiver,
    shutdown: CancellationToken,
) {
    info!(target: "autoswipe::controller", "Automation task started");
    controller.announce_ready();

    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            event = mailbox.recv() => match event {
                Some(event) => controller.handle(event),
                None => break,
            },
        }
    }

    controller.shutdown();
    info!(target: "autoswipe::controller", "Automation task ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::observer::Status;
    use crate::automation::controller::Collaborators;
    use crate::automation::testing::{
        FakeLauncher, RecordingObserver, ScriptedPerformer, fixed_config, statuses,
    };
    use crate::random::RandomRangeProvider;
    use std::time::Duration;

    fn spawn() -> (Automation, Arc<RecordingObserver>, Subscription, Arc<ScriptedPerformer>) {
        let performer = ScriptedPerformer::completing();
        let collaborators = Collaborators {
            random: Box::new(RandomRangeProvider::seeded(3)),
            performer: performer.clone(),
            launcher: Arc::new(FakeLauncher::default()),
        };
        let (controller, mailbox) = AutomationController::new(fixed_config(), collaborators).unwrap();
        let recorder = RecordingObserver::new();
        let subscription = controller.subscribe(recorder.clone());
        (Automation::spawn(controller, mailbox), recorder, subscription, performer)
    }

    #[tokio::test(start_paused = true)]
    async fn commands_flow_through_the_task() {
        let (automation, recorder, _subscription, performer) = spawn();
        let mut state = automation.watch_state();

        automation.start();
        state.wait_for(|s| *s == AutomationState::Running).await.unwrap();
        automation.foreground_changed(ForegroundChange::new("com.example.target"));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(performer.calls(), 1);

        automation.pause();
        state.wait_for(|s| *s == AutomationState::Paused).await.unwrap();
        automation.stop();
        state.wait_for(|s| *s == AutomationState::Stopped).await.unwrap();
        assert_eq!(automation.state(), AutomationState::Stopped);

        let seen = statuses(&recorder.notes());
        assert_eq!(seen.first(), Some(&Status::Ready));
        assert_eq!(seen.last(), Some(&Status::Stopped));
        automation.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_and_unsubscribes() {
        let (automation, recorder, _subscription, _performer) = spawn();
        let observers = automation.observers.clone();
        let mut state = automation.watch_state();
        automation.start();
        state.wait_for(|s| *s == AutomationState::Running).await.unwrap();

        automation.shutdown().await;
        assert_eq!(*state.borrow(), AutomationState::Stopped);
        assert!(observers.is_empty());
        assert_eq!(statuses(&recorder.notes()).last(), Some(&Status::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_ends_the_task() {
        let (automation, _recorder, _subscription, _performer) = spawn();
        let observers = automation.observers.clone();
        let mut state = automation.watch_state();
        automation.start();
        state.wait_for(|s| *s == AutomationState::Running).await.unwrap();

        drop(automation);
        state.wait_for(|s| *s == AutomationState::Stopped).await.unwrap();
        tokio::task::yield_now().await;
        assert!(observers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn commands_after_shutdown_are_dropped() {
        let (automation, _recorder, _subscription, _performer) = spawn();
        let events = automation.events.clone();
        automation.shutdown().await;
        // The controller owned the receiver; sending now fails quietly.
        assert!(events.send(Command::Start.into()).is_err());
    }
}
