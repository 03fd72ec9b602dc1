//! Controller input feed — newline-delimited JSON samples on stdin.
//!
//! Each line is one [`InputUpdate`], for example:
//!
//! ```json
//! {"input":{"controller_id":"pad","input_type":"axis","index":1},"value":0.5}
//! ```

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use hubdrive_domain::id::InputId;
use hubdrive_domain::input::InputSnapshot;
use hubdrive_domain::time::{self, Timestamp};

/// One sampled controller input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputUpdate {
    pub input: InputId,
    pub value: f64,
    /// Sample time in Unix milliseconds; arrival time when absent.
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
}

impl InputUpdate {
    /// Parse one line of the feed.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the line is not a valid update.
    pub fn parse_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Record the sample into `snapshot`, clamping the value to `[-1, 1]`.
    pub fn apply(self, snapshot: &mut InputSnapshot, now: Timestamp) {
        let timestamp = self
            .timestamp_ms
            .and_then(time::from_unix_millis)
            .unwrap_or(now);
        let value = if self.value.is_nan() {
            0.0
        } else {
            self.value.clamp(-1.0, 1.0)
        };
        snapshot.record(self.input, value, timestamp);
    }
}

/// Forward every valid line of `reader` to `sender` until EOF or until the
/// receiving side goes away. Returns the number of forwarded updates.
pub async fn read_updates<R>(reader: R, sender: mpsc::Sender<InputUpdate>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(%err, "failed to read input line");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match InputUpdate::parse_line(line) {
            Ok(update) => {
                if sender.send(update).await.is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(err) => tracing::warn!(%err, line, "ignoring malformed input line"),
        }
    }
    forwarded
}

/// Spawn a task reading updates from stdin.
pub fn spawn_stdin_reader(capacity: usize) -> mpsc::Receiver<InputUpdate> {
    let (sender, receiver) = mpsc::channel(capacity);
    tokio::spawn(async move {
        let forwarded = read_updates(BufReader::new(tokio::io::stdin()), sender).await;
        tracing::info!(forwarded, "input feed closed");
    });
    receiver
}
