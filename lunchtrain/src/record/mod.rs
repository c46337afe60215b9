/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Best-effort event record.
//!
//! Every user-visible action (start, join, withdraw, reminder, departure,
//! errors, help, …) produces one [`Event`].  [`Recorder::record`] hands the
//! event to a background writer over an unbounded channel and returns
//! immediately, so recording can never block or fail a state transition.
//!
//! ```text
//! Dispatcher / Scheduler ──record()──► mpsc ──► writer task ──► log.jsonl
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// ── Event ─────────────────────────────────────────────────────────────────────

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    StartError,
    Join,
    JoinError,
    Withdraw,
    WithdrawError,
    Reminder,
    Departure,
    Passengers,
    PassengersError,
    Active,
    ActiveError,
    Help,
    Malformed,
    InsufficientParams,
    /// A room message that was not a `/train` command.
    Mention,
    Error,
    DeliveryError,
}

/// One recorded action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Display name of the train concerned, empty if none.
    pub destination: String,
    /// Who triggered it; `"scheduler"` for timer-driven events.
    pub actor: String,
    /// The text that was (or would have been) announced.
    pub text: String,
    /// The raw chat message behind the event, empty for timer events.
    pub command: String,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        kind: EventKind,
        destination: impl Into<String>,
        actor: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            destination: destination.into(),
            actor: actor.into(),
            text: text.into(),
            command: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach the raw chat message that triggered the event.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }
}

// ── Recorder ──────────────────────────────────────────────────────────────────

/// Cheap, cloneable handle for appending [`Event`]s.
#[derive(Debug, Clone)]
pub struct Recorder {
    tx: Option<mpsc::UnboundedSender<Event>>,
}

impl Recorder {
    /// A recorder that only traces events and stores nothing.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// A recorder whose events are delivered to the returned receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A recorder that appends one JSON object per line to `path`.
    ///
    /// Spawns the writer task on the current tokio runtime.  The task ends
    /// once every clone of the returned `Recorder` has been dropped and the
    /// queue is drained.
    pub fn jsonl(path: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
        let path = path.into();
        let (recorder, rx) = Self::channel();
        let handle = tokio::spawn(write_jsonl(path, rx));
        (recorder, handle)
    }

    /// Queue `event` for recording.  Never blocks, never fails.
    pub fn record(&self, event: Event) {
        debug!(
            kind = ?event.kind,
            destination = %event.destination,
            actor = %event.actor,
            "Event"
        );
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                warn!("Event recorder has shut down, event dropped");
            }
        }
    }
}

async fn write_jsonl(path: PathBuf, mut rx: mpsc::UnboundedReceiver<Event>) {
    info!("Recording events to: {}", path.display());
    let mut written = 0usize;
    while let Some(event) = rx.recv().await {
        match append_line(&path, &event).await {
            Ok(()) => written += 1,
            Err(e) => warn!(error = %e, path = %path.display(), "Failed to record event"),
        }
    }
    debug!(written, "Event recorder stopped");
}

/// Open in append mode per event so an external rotation of the file is
/// picked up without restarting.
async fn append_line(path: &Path, event: &Event) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&line).await?;
    file.flush().await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_serialises_snake_case() {
        let v = serde_json::to_value(EventKind::InsufficientParams).unwrap();
        assert_eq!(v, "insufficient_params");
    }

    #[test]
    fn disabled_recorder_accepts_events() {
        Recorder::disabled().record(Event::new(EventKind::Help, "", "alice", "usage"));
    }

    #[tokio::test]
    async fn channel_recorder_delivers_in_order() {
        let (rec, mut rx) = Recorder::channel();
        rec.record(Event::new(EventKind::Start, "Tacos", "alice", "started"));
        rec.record(Event::new(EventKind::Join, "Tacos", "bob", "joined").with_command("/train join Tacos"));
        drop(rec);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::Start);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.actor, "bob");
        assert_eq!(second.command, "/train join Tacos");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_channel_does_not_panic() {
        let (rec, rx) = Recorder::channel();
        drop(rx);
        rec.record(Event::new(EventKind::Error, "", "alice", "boom"));
    }

    #[tokio::test]
    async fn jsonl_recorder_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        std::fs::write(&path, "").unwrap();

        let (rec, handle) = Recorder::jsonl(&path);
        rec.record(Event::new(EventKind::Start, "Tacos", "alice", "a"));
        rec.record(Event::new(EventKind::Departure, "Tacos", "scheduler", "b"));
        drop(rec);
        handle.await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<Event> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Start);
        assert_eq!(events[1].kind, EventKind::Departure);
        assert_eq!(events[1].actor, "scheduler");
    }

    #[tokio::test]
    async fn unwritable_path_is_logged_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for append.
        let (rec, handle) = Recorder::jsonl(dir.path());
        rec.record(Event::new(EventKind::Start, "Tacos", "alice", "a"));
        drop(rec);
        handle.await.unwrap();
    }
}
