use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root configuration for autoswipe.
///
/// Deserialized from a JSON document. Every field has a default, so `{}` is a valid
/// configuration describing the stock behavior:
/// - swipe every 8–22 seconds for 30 minutes
/// - wait 10 seconds after the target app shows up before the first swipe
/// - each swipe lasts 500–1000 ms
///
/// The automation core only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Config {
    /// Event input sources (stdin, file).
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Identifier of the target application (package name on mobile platforms).
    #[serde(default = "default_target_package")]
    pub target_package: String,

    /// How to bring the target application to the foreground.
    /// When omitted the target is assumed to be launched externally.
    #[serde(default)]
    pub launch: Option<LaunchCommand>,

    /// Wait intervals, run budget and swipe durations.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Screen-coordinate bounds of the generated swipes.
    #[serde(default)]
    pub screen: ScreenConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            target_package: default_target_package(),
            launch: None,
            timing: TimingConfig::default(),
            screen: ScreenConfig::default(),
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![SourceConfig::Stdin]
}

fn default_target_package() -> String {
    "com.kuaishou.nebula".to_string()
}

/// Inclusive `[min, max]` range a value is drawn from.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether `min <= max`.
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// Timing knobs of a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds to wait between two swipes.
    pub swipe_interval_secs: Bounds,
    /// Total run budget in minutes. Zero stops the run at the first countdown tick.
    pub run_duration_minutes: u32,
    /// Seconds to wait before the first swipe of a run.
    pub initial_wait_secs: u32,
    /// Duration of a single swipe, in milliseconds.
    pub swipe_duration_ms: Bounds,
    /// Grace period past the swipe duration after which an unanswered gesture is
    /// considered lost and the loop moves on.
    pub gesture_watchdog_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            swipe_interval_secs: Bounds::new(8, 22),
            run_duration_minutes: 30,
            initial_wait_secs: 10,
            swipe_duration_ms: Bounds::new(500, 1000),
            gesture_watchdog_ms: 5_000,
        }
    }
}

/// Where swipes start and end, in absolute screen pixels.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct ScreenConfig {
    pub start_x: Bounds,
    pub start_y: Bounds,
    pub end_y: Bounds,
    /// Horizontal drift of the end point: `end_x = start_x ± end_x_jitter`.
    pub end_x_jitter: i64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            start_x: Bounds::new(300, 600),
            start_y: Bounds::new(800, 1000),
            end_y: Bounds::new(100, 300),
            end_x_jitter: 50,
        }
    }
}

/// Program spawned to bring the target application to the foreground.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Executable name or path.
    pub program: String,
    /// Arguments; `{target}` is replaced with the target package.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Event source configuration.
/// Use `type` to select a variant:
/// - "stdin": read newline-delimited JSON control messages from standard input
/// - "file": poll a single file for a JSON control message
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Read control messages from standard input (newline-delimited).
    Stdin,

    /// Poll a single file for control messages.
    File {
        /// Absolute or relative path to the file.
        path: String,
        /// Poll interval in milliseconds (default: 100).
        #[serde(default)]
        poll_ms: Option<u64>,
        /// Delete the file after a successful read/parse (default: false).
        #[serde(default)]
        delete_on_success: Option<bool>,
    },
}
