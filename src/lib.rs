#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Autoswipe: a timed swipe automation for short-video apps, driven by Enigo.
//!
//! Once started, the automation launches the target app, waits for it to come to the
//! foreground, then keeps performing randomized upward swipes at randomized intervals
//! until the run budget elapses or the user stops it. Modules:
//! - `automation`: the controller state machine, gesture scheduler, run budget and observers.
//! - `config`: configuration models, loader, validation and schema helpers.
//! - `gesture`: gesture types and the Enigo-backed injector.
//! - `launcher`: starting the target app through a configured command.
//! - `random`: the injectable random range provider.
//! - `sources`: control message sources (file, stdin).
//!
//! Use `autoswipe::prelude::*` to bring commonly used items into scope quickly.

pub mod automation;
pub mod config;
pub mod gesture;
pub mod launcher;
pub mod random;
pub mod sources;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a simple level name (trace|debug|info|warn|error).
pub fn parse_level(raw: &str) -> Option<tracing::Level> {
    use tracing::Level;

    match raw.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging).
/// - An explicit `level` wins.
/// - Otherwise honors the `RUST_LOG` environment variable if it names a level.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::fmt;

    let level = level
        .and_then(parse_level)
        .or_else(|| std::env::var("RUST_LOG").ok().as_deref().and_then(parse_level))
        .unwrap_or(tracing::Level::INFO);

    // Ignore the error if the global subscriber was already set.
    let _ = fmt().with_max_level(level).try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use autoswipe::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Timing helpers
    pub use std::time::Duration;
    pub use tokio::time::sleep;

    // External crates (namespaced) if callers want direct access
    pub use crate as autoswipe;
    pub use enigo;
    pub use rand;

    // Frequently used items
    pub use crate::automation::{
        Automation, AutomationController, AutomationObserver, AutomationState, Collaborators,
        ForegroundChange, LogObserver, Status,
    };
    pub use crate::config::{Config, ConfigError};
    pub use crate::gesture::{GestureInjector, GestureOutcome, GesturePerformer, GestureSpec};
    pub use crate::launcher::{AppLauncher, CommandLauncher, LaunchError};
    pub use crate::random::{RandomRangeProvider, RandomSource};
    pub use crate::sources::ControlMessage;
    pub use crate::{automation, config, gesture, launcher, random, sources};
}
