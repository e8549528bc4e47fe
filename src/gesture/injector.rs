use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use enigo::Mouse as _;
use enigo::{Button, Coordinate, Direction, Enigo, Settings};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{info, trace, warn};

use super::{GestureOutcome, GesturePerformer, GestureSpec, Point};

/// Pause between two intermediate pointer moves of a drag (~60 Hz).
const STEP_INTERVAL: Duration = Duration::from_millis(16);

/// Injects drag gestures with Enigo, with optional dry-run mode.
/// In dry-run mode, gestures are only logged and no real input is simulated.
#[derive(Debug, Clone, Copy)]
pub struct GestureInjector {
    dry_run: bool,
}

impl GestureInjector {
    /// Create a new injector.
    /// - dry_run: when true, only logs instead of simulating real input.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Returns whether the injector is in dry-run mode.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl GesturePerformer for GestureInjector {
    async fn perform(&self, spec: GestureSpec) -> GestureOutcome {
        if self.dry_run {
            info!(
                target: "autoswipe::gesture",
                start = %spec.start, end = %spec.end,
                duration_ms = spec.duration.as_millis(),
                "DRY-RUN swipe"
            );
            tokio::time::sleep(spec.duration).await;
            return GestureOutcome::Completed;
        }

        // Enigo talks to the display server synchronously and sleeps between moves.
        // If this future is dropped (watchdog), the guard tells the drag to let go.
        let abort = AbortOnDrop::default();
        let flag = Arc::clone(&abort.0);
        match tokio::task::spawn_blocking(move || drag(&spec, &flag)).await {
            Ok(Ok(())) => GestureOutcome::Completed,
            Ok(Err(e)) => {
                warn!(target: "autoswipe::gesture", error = %format!("{e:#}"), "Swipe cancelled");
                GestureOutcome::Cancelled
            }
            Err(e) => {
                warn!(target: "autoswipe::gesture", error = %e, "Swipe task aborted");
                GestureOutcome::Cancelled
            }
        }
    }
}

/// Raises its flag when dropped.
#[derive(Default)]
struct AbortOnDrop(Arc<AtomicBool>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Press at `spec.start`, glide to `spec.end` over `spec.duration`, release.
fn drag(spec: &GestureSpec, abort: &AtomicBool) -> Result<()> {
    let start = to_screen(spec.start)?;
    let end = to_screen(spec.end)?;

    trace!(target: "autoswipe::gesture", "Initializing Enigo");
    let mut enigo = Enigo::new(&Settings::default()).context("Failed to initialize Enigo")?;

    enigo.move_mouse(start.0, start.1, Coordinate::Abs)?;
    enigo.button(Button::Left, Direction::Press)?;

    let glide = glide(start, end, spec.duration, abort, |x, y| {
        enigo.move_mouse(x, y, Coordinate::Abs).map_err(Into::into)
    });
    // Never leave the button held down, even if a move failed.
    let release = enigo.button(Button::Left, Direction::Release);
    glide?;
    release?;

    trace!(target: "autoswipe::gesture", ?start, ?end, "Swipe delivered");
    Ok(())
}

/// Step the pointer from `start` to `end`, giving up as soon as `abort` is raised.
fn glide(
    start: (i32, i32),
    end: (i32, i32),
    duration: Duration,
    abort: &AtomicBool,
    mut move_to: impl FnMut(i32, i32) -> Result<()>,
) -> Result<()> {
    let steps = step_count(duration);
    let pause = duration / steps;
    for step in 1..=steps {
        thread::sleep(pause);
        if abort.load(Ordering::Relaxed) {
            bail!("swipe abandoned after {} of {steps} steps", step - 1);
        }
        move_to(lerp(start.0, end.0, step, steps), lerp(start.1, end.1, step, steps))?;
    }
    Ok(())
}

fn to_screen(point: Point) -> Result<(i32, i32)> {
    let x = i32::try_from(point.x).with_context(|| format!("x of {point} is off-screen"))?;
    let y = i32::try_from(point.y).with_context(|| format!("y of {point} is off-screen"))?;
    Ok((x, y))
}

/// Number of intermediate moves for a drag of the given duration (at least one).
fn step_count(duration: Duration) -> u32 {
    let steps = duration.as_millis() / STEP_INTERVAL.as_millis();
    u32::try_from(steps).unwrap_or(u32::MAX).max(1)
}

/// Linear interpolation between `from` and `to` at `step / steps`.
fn lerp(from: i32, to: i32, step: u32, steps: u32) -> i32 {
    let from = i64::from(from);
    let delta = i64::from(to) - from;
    let value = from + delta * i64::from(step) / i64::from(steps);
    i32::try_from(value).unwrap_or(to)
}
