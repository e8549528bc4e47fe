//! File control source.
//!
//! Watches a single file for control messages by polling it. Handy when another process
//! (a launcher script, a UI) drives the automation by writing `{"type":"pause"}` and
//! friends into a well-known file.
//!
//! Behavior:
//! - The file holds one control message per line.
//! - With `delete_on_success = true` the file is consumed: its messages are forwarded and
//!   the file is removed, so the next command needs a fresh file.
//! - With `delete_on_success = false` the file is forwarded again only when its
//!   (length, mtime) signature changes.
//! - A missing file is silent until it appears. Blank files are ignored.
//! - The task ends once the receiving side of the channel is closed.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio::{
    fs,
    sync::mpsc::Sender,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, trace, warn};

use super::{ControlMessage, EventSource, forward_lines};

const DEFAULT_POLL_MS: u64 = 100;
const MIN_POLL_MS: u64 = 10;

/// Coarse change detector: (length, mtime).
type Signature = (u64, Option<SystemTime>);

/// Source that polls one file for control messages.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    poll: Duration,
    consume: bool,
}

impl FileSource {
    /// `poll_ms` defaults to 100ms and never goes below 10ms.
    pub fn new(path: impl Into<PathBuf>, poll_ms: Option<u64>, delete_on_success: Option<bool>) -> Self {
        Self {
            path: path.into(),
            poll: Duration::from_millis(poll_ms.unwrap_or(DEFAULT_POLL_MS).max(MIN_POLL_MS)),
            consume: delete_on_success.unwrap_or(false),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll
    }

    /// Read the file if it changed since `seen`. `None` when there is nothing new.
    async fn read_if_changed(&self, seen: Option<Signature>) -> Option<(String, Signature)> {
        let meta = match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => {
                warn!(target: "autoswipe::sources", path = %self.path.display(), "Not a regular file");
                return None;
            }
            Err(_) => return None,
        };

        let signature = (meta.len(), meta.modified().ok());
        if !self.consume && seen == Some(signature) {
            return None;
        }

        match fs::read_to_string(&self.path).await {
            Ok(text) => Some((text, signature)),
            Err(e) => {
                warn!(target: "autoswipe::sources", path = %self.path.display(), error = %e, "Failed to read control file");
                None
            }
        }
    }

    async fn run(self, sender: Sender<ControlMessage>) {
        info!(
            target: "autoswipe::sources",
            path = %self.path.display(),
            poll_ms = self.poll.as_millis(),
            consume = self.consume,
            "FileSource task started"
        );

        let mut ticker = interval(self.poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seen = None;

        loop {
            ticker.tick().await;
            let Some((text, signature)) = self.read_if_changed(seen).await else {
                continue;
            };
            seen = Some(signature);

            if text.trim().is_empty() {
                trace!(target: "autoswipe::sources", path = %self.path.display(), "Control file is blank");
                continue;
            }

            match forward_lines(self.name(), &text, &sender).await {
                Ok(sent) => debug!(target: "autoswipe::sources", path = %self.path.display(), sent, "Control file read"),
                Err(_) => {
                    debug!(target: "autoswipe::sources", "Receiver closed; FileSource terminating");
                    break;
                }
            }

            if self.consume {
                if let Err(e) = fs::remove_file(&self.path).await {
                    warn!(target: "autoswipe::sources", path = %self.path.display(), error = %e, "Failed to remove control file");
                }
            }
        }

        info!(target: "autoswipe::sources", path = %self.path.display(), "FileSource task ended");
    }
}

impl EventSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn start(&self, sender: Sender<ControlMessage>) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(sender))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, timeout};

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("autoswipe-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn poll_interval_has_a_floor() {
        assert_eq!(FileSource::new("x", Some(50), None).poll_interval(), Duration::from_millis(50));
        assert_eq!(FileSource::new("y", Some(1), None).poll_interval(), Duration::from_millis(10));
        assert_eq!(FileSource::new("z", None, None).poll_interval(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn consumes_the_file() {
        let path = scratch("consume");
        std::fs::write(&path, "{\"type\":\"start\"}\n{\"type\":\"pause\"}\n").unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let handle = FileSource::new(path.clone(), Some(10), Some(true)).start(tx);

        let wait = Duration::from_secs(5);
        assert_eq!(timeout(wait, rx.recv()).await.unwrap(), Some(ControlMessage::Start));
        assert_eq!(timeout(wait, rx.recv()).await.unwrap(), Some(ControlMessage::Pause));

        timeout(wait, async {
            while path.exists() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        handle.abort();
    }

    #[tokio::test]
    async fn unchanged_file_is_forwarded_once() {
        let path = scratch("keep");
        std::fs::write(&path, r#"{"type":"stop"}"#).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let handle = FileSource::new(path.clone(), Some(10), Some(false)).start(tx);

        let first = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(first, Some(ControlMessage::Stop));
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
        assert!(path.exists());

        handle.abort();
        let _ = std::fs::remove_file(&path);
    }
}
