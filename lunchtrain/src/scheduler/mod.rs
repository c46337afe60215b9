/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-train countdown.
//!
//! [`Scheduler::spawn`] starts one tokio task per [`Train`].  The task sleeps
//! until the next tick *or* the train's cancellation signal, whichever comes
//! first, and drives the train through its countdown:
//!
//! ```text
//!            ┌──────── tick: Continue ───────┐
//!            ▼                               │
//!        Running ──── tick: ReminderDue ─────┤ (announce reminder)
//!         │   │
//!         │   └────── tick: Expired ──► finalize_departure ──► Completed
//!         │                                  │ (already gone)
//!         └── cancel signal ──────────────────┴────────────────► Cancelled
//! ```
//!
//! # Races
//! Withdrawal of the last rider and expiry both end in the station's
//! remove-if-present step.  Whichever gets the station lock first wins; the
//! other sees the train gone and does nothing, so a scrapped train never
//! departs and a departed train is never announced twice.
//!
//! Reminders are weaker.  The task checks the cancel flag and the station
//! just before announcing, but the announcement itself runs outside the
//! station lock, so a last rider withdrawing in that window can still see one
//! reminder for a train that is already scrapped.
//!
//! Announcement failures are logged and recorded; the countdown and the
//! teardown carry on regardless.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, Instrument};

use crate::announce::{announce_best_effort, Announcer};
use crate::record::{Event, EventKind, Recorder};
use crate::station::Station;
use crate::train::{Tick, Train};

/// Actor name used for timer-driven events.
pub const SCHEDULER_ACTOR: &str = "scheduler";

/// Default countdown resolution: one tick per minute.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(60);

/// How a train's countdown task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerOutcome {
    /// Stopped by the station (train emptied or station reset); nothing was
    /// announced.
    Cancelled,
    /// The train departed and was announced.
    Completed,
}

pub fn reminder_text(destination: &str) -> String {
    format!("Reminder, the next train to {destination} leaves in one minute")
}

pub fn departure_text(destination: &str, riders: &str) -> String {
    format!("The train to {destination} has left the station with {riders} on it!")
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Spawns and drives countdown tasks.  Cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    station: Arc<Station>,
    announcer: Arc<dyn Announcer>,
    recorder: Recorder,
    period: Duration,
}

impl Scheduler {
    pub fn new(
        station: Arc<Station>,
        announcer: Arc<dyn Announcer>,
        recorder: Recorder,
        period: Duration,
    ) -> Self {
        Self {
            station,
            announcer,
            recorder,
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the countdown task for `train`.
    ///
    /// Must be called exactly once per train; the task is the only caller of
    /// [`Train::tick`].
    pub fn spawn(&self, train: Arc<Train>) -> JoinHandle<SchedulerOutcome> {
        let span = info_span!(
            "countdown",
            destination = %train.display_name(),
            train_id = train.id()
        );
        let this = self.clone();
        tokio::spawn(async move { this.run(train).await }.instrument(span))
    }

    async fn run(self, train: Arc<Train>) -> SchedulerOutcome {
        let mut cancelled = train.cancelled();
        let mut ticks = interval_at(Instant::now() + self.period, self.period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(remaining = train.remaining(), "Countdown started");

        loop {
            tokio::select! {
                biased;
                _ = wait_cancelled(&mut cancelled) => {
                    info!("Countdown cancelled");
                    return SchedulerOutcome::Cancelled;
                }
                _ = ticks.tick() => {}
            }

            match train.tick() {
                Tick::Continue => {
                    debug!(remaining = train.remaining(), "Tick");
                }
                Tick::ReminderDue => {
                    if train.is_cancelled() || !self.station.is_active(&train) {
                        info!("Train gone before reminder, stopping");
                        return SchedulerOutcome::Cancelled;
                    }
                    let text = reminder_text(train.display_name());
                    self.emit(EventKind::Reminder, train.display_name(), text)
                        .await;
                }
                Tick::Expired => {
                    return match self.station.finalize_departure(&train) {
                        Some(departure) => {
                            let text = departure_text(&departure.display_name, &departure.rendered);
                            self.emit(EventKind::Departure, &departure.display_name, text)
                                .await;
                            SchedulerOutcome::Completed
                        }
                        None => {
                            info!("Train gone before departure, stopping");
                            SchedulerOutcome::Cancelled
                        }
                    };
                }
            }
        }
    }

    async fn emit(&self, kind: EventKind, destination: &str, text: String) {
        let delivered = announce_best_effort(self.announcer.as_ref(), &text).await;
        self.recorder
            .record(Event::new(kind, destination, SCHEDULER_ACTOR, text.clone()));
        if !delivered {
            self.recorder.record(Event::new(
                EventKind::DeliveryError,
                destination,
                SCHEDULER_ACTOR,
                text,
            ));
        }
    }
}

/// Resolves once the flag is `true` or the sender is gone.
async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
