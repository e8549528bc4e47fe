/*!
Event sources module (orchestration layer).

This module defines the core `EventSource` trait, the `ControlMessage` wire shape and
orchestration helpers (`build_sources_from_config`, `spawn_all_sources`). Concrete
implementations live in their own files:

- `file.rs`         -> `FileSource`  (poll a single JSON file)
- `stdin_source.rs` -> `StdinSource` (newline-delimited JSON from standard input)

Each source implementation is responsible for:
- Reading raw newline-delimited JSON and handing it to [`forward_lines`]
- Respecting backpressure (`send().await`) on the `Sender<ControlMessage>`
- Logging errors and continuing (never panicking inside tasks)
- Being cancellation-safe (task ends cleanly when channel closes / loop breaks)

Recognized messages (one per line):
```text
{"type":"start"}  {"type":"pause"}  {"type":"stop"}  {"type":"interrupt"}
{"type":"foreground","package":"com.example.app","class":"MainActivity"}
```
*/

use serde::{Deserialize, Serialize};
use tokio::{
    sync::mpsc::{Sender, error::SendError},
    task::JoinHandle,
};
use tracing::{info, trace, warn};

use crate::automation::{Command, Event, ForegroundChange};
use crate::config::{Config, SourceConfig};

pub mod file;
pub mod stdin_source;

pub use file::FileSource;
pub use stdin_source::StdinSource;

/// Trait implemented by all event sources.
///
/// A source is expected to spawn an asynchronous task that produces control
/// messages and sends them into the provided channel. Tasks should never panic; log and
/// continue or exit gracefully on unrecoverable errors.
pub trait EventSource: Send + Sync {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Start the source in the background.
    fn start(&self, sender: Sender<ControlMessage>) -> JoinHandle<()>;
}

/// A control message as produced by event sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    Start,
    Pause,
    Stop,
    Interrupt,
    /// The platform reports a new foreground application.
    Foreground {
        #[serde(alias = "package_name")]
        package: String,
        #[serde(default, alias = "class_name")]
        class: Option<String>,
    },
}

impl ControlMessage {
    /// Parse one JSON document.
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Parse every non-blank line of `text` and send the recognized messages.
///
/// Malformed lines are logged and skipped. Returns how many messages were sent, or
/// the send error once the receiver is gone.
pub async fn forward_lines(
    source: &'static str,
    text: &str,
    sender: &Sender<ControlMessage>,
) -> Result<usize, SendError<ControlMessage>> {
    let mut sent = 0;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match ControlMessage::parse(line) {
            Ok(message) => {
                trace!(target: "autoswipe::sources", source, ?message, "Control message");
                sender.send(message).await?;
                sent += 1;
            }
            Err(e) => warn!(
                target: "autoswipe::sources",
                source, error = %e, line,
                "Ignoring unrecognized control message"
            ),
        }
    }
    Ok(sent)
}

impl From<ControlMessage> for Event {
    fn from(message: ControlMessage) -> Self {
        match message {
            ControlMessage::Start => Command::Start.into(),
            ControlMessage::Pause => Command::Pause.into(),
            ControlMessage::Stop => Command::Stop.into(),
            ControlMessage::Interrupt => Command::Interrupt.into(),
            ControlMessage::Foreground { package, class } => ForegroundChange {
                package_name: package,
                class_name: class,
            }
            .into(),
        }
    }
}

/// Construct all configured sources.
///
/// Order of sources in the returned vector is the same as in the config.
pub fn build_sources_from_config(cfg: &Config) -> Vec<Box<dyn EventSource>> {
    cfg.sources
        .iter()
        .map(|sc| -> Box<dyn EventSource> {
            match sc {
                SourceConfig::File {
                    path,
                    poll_ms,
                    delete_on_success,
                } => Box::new(FileSource::new(path.clone(), *poll_ms, *delete_on_success)),
                SourceConfig::Stdin => Box::new(StdinSource::new()),
            }
        })
        .collect()
}

/// Spawn every source, returning their `JoinHandle`s.
pub fn spawn_all_sources(
    sources: &[Box<dyn EventSource>],
    sender: Sender<ControlMessage>,
) -> Vec<JoinHandle<()>> {
    sources
        .iter()
        .map(|src| {
            info!(
                target: "autoswipe::sources",
                source = %src.name(),
                "Starting source task"
            );
            src.start(sender.clone())
        })
        .collect()
}
