/*!
Gesture module for autoswipe.

A gesture is a single synthetic drag: press at a start point, move to an end point
over a duration, release. The automation core only knows the [`GesturePerformer`]
capability; [`GestureInjector`] is the concrete performer backed by Enigo (or a
dry-run that only logs).

Exactly one [`GestureOutcome`] is produced per invocation. Cancellation is a normal
outcome, never an error.
*/

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub mod injector;

pub use injector::GestureInjector;

/// A point in absolute screen pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Shape of one drag gesture. Generated fresh for every action.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GestureSpec {
    pub start: Point,
    pub end: Point,
    pub duration: Duration,
}

/// How a gesture invocation ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The drag was fully delivered.
    Completed,
    /// The platform (or the injector) gave up on the drag.
    Cancelled,
    /// No answer within the watchdog window.
    TimedOut,
}

impl fmt::Display for GestureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
        })
    }
}

/// Capability that injects a drag gesture and reports how it ended.
#[async_trait]
pub trait GesturePerformer: Send + Sync {
    async fn perform(&self, spec: GestureSpec) -> GestureOutcome;
}
