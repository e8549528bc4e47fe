#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Automation module for autoswipe.

This module wires together:
- `controller`: the Idle/Running/Paused/Stopped state machine and its event queue
- `scheduler`: the "wait → swipe → reschedule" gesture loop
- `budget`: the run budget and its `MM:SS` countdown
- `observer`: status and countdown notifications with scoped subscriptions
- `runtime`: the task that drains the queue, and the [`Automation`] handle
- `timer`: generation-tagged one-shot timers

Typical usage:
- Build an `AutomationController` from a `Config` and its `Collaborators`.
- Subscribe observers, then `Automation::spawn` it.
- Forward user commands and foreground changes through the handle.

Example:
```no_run
use std::sync::Arc;
use autoswipe::automation::{Automation, AutomationController, Collaborators, LogObserver};
use autoswipe::config::Config;
use autoswipe::gesture::GestureInjector;
use autoswipe::launcher::CommandLauncher;
use autoswipe::random::RandomRangeProvider;

# async fn demo() -> anyhow::Result<()> {
let collaborators = Collaborators {
    random: Box::new(RandomRangeProvider::from_entropy()),
    performer: Arc::new(GestureInjector::new(true)),
    launcher: Arc::new(CommandLauncher::new(None, true)),
};
let (controller, mailbox) = AutomationController::new(Config::default(), collaborators)?;
let _subscription = controller.subscribe(Arc::new(LogObserver));
let automation = Automation::spawn(controller, mailbox);
automation.start();
# Ok(())
# }
```
*/

pub mod budget;
pub mod controller;
pub mod observer;
pub mod runtime;
pub mod scheduler;
mod timer;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access from `autoswipe::automation::*`
pub use budget::{RunSession, TimeBudget, format_remaining};
pub use controller::{
    AutomationController, AutomationState, Collaborators, Command, Event, ForegroundChange,
};
pub use observer::{AutomationObserver, LogObserver, Observers, Status, Subscription};
pub use runtime::Automation;
pub use scheduler::GestureScheduler;
