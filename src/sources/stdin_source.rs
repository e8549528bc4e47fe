//! Stdin control source.
//!
//! Reads newline-delimited JSON control messages from standard input, one per line.
//! Malformed lines are logged and skipped. End of input or a closed channel ends the task.
//!
//! Example:
//!     printf '{"type":"start"}\n{"type":"foreground","package":"com.kuaishou.nebula"}\n' | autoswipe --dry-run

use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::mpsc::Sender,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::{ControlMessage, EventSource, forward_lines};

/// Source that reads control messages from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSource;

impl StdinSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for StdinSource {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn start(&self, sender: Sender<ControlMessage>) -> JoinHandle<()> {
        let name = self.name();
        tokio::spawn(async move {
            info!(target: "autoswipe::sources", "StdinSource task started");
            let mut lines = BufReader::new(io::stdin()).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if forward_lines(name, &line, &sender).await.is_err() {
                            debug!(target: "autoswipe::sources", "Receiver closed; StdinSource terminating");
                            break;
                        }
                    }
                    Ok(None) => {
                        info!(target: "autoswipe::sources", "EOF on stdin; StdinSource exiting");
                        break;
                    }
                    Err(e) => {
                        warn!(target: "autoswipe::sources", error = %e, "Error reading stdin; StdinSource exiting");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_stdin() {
        assert_eq!(StdinSource::new().name(), "stdin");
    }
}
