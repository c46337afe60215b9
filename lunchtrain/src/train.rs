/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! A single timed departure ("train").
//!
//! A [`Train`] is created by a conductor with a destination and a countdown in
//! minutes.  Other riders join until the countdown runs out, at which point the
//! owning [`Scheduler`](crate::scheduler::Scheduler) finalises it.
//!
//! ```text
//!  Station::start_train ──► Train (Forming) ──tick…tick──► Expired ──► Departed
//!                              │
//!                              └── last rider withdraws ──► cancelled (never departs)
//! ```
//!
//! # Locking
//! Members, countdown and state live behind one per-train mutex.  The
//! [`Station`](crate::station::Station) always takes its own lock *before* a
//! train's lock; the scheduler only takes the train lock on its own (for
//! [`Train::tick`]) or in station → train order (for finalisation).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::station::TrainError;

/// Process-wide sequence for [`Train::id`].
static NEXT_TRAIN_ID: AtomicU64 = AtomicU64::new(1);

// ── Destination names ─────────────────────────────────────────────────────────

/// Collapse runs of whitespace to single spaces and trim both ends.
fn tidy(destination: &str) -> String {
    destination.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Registry key for a destination: tidied and lower-cased, so
/// `"Shake  Shack"` and `"shake shack"` name the same train.
pub fn normalize(destination: &str) -> String {
    tidy(destination).to_lowercase()
}

// ── List rendering ────────────────────────────────────────────────────────────

/// Join items the way a sentence would list them.
///
/// * `["a"]` → `"a"`
/// * `["a", "b"]` → `"a and b"`
/// * `["a", "b", "c"]` → `"a, b, and c"`
pub fn render_list<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(|s| s.as_ref()).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}

// ── Countdown ─────────────────────────────────────────────────────────────────

/// Result of advancing a train's countdown by one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// More than one minute left.
    Continue,
    /// Exactly one minute left – time for the reminder.
    ReminderDue,
    /// The countdown hit zero.
    Expired,
}

/// Lifecycle state of a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainState {
    /// Countdown running, riders may join or withdraw.
    #[default]
    Forming,
    /// Finalised by the scheduler.  Terminal.
    Departed,
}

// ── Train ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct TrainInner {
    /// Insertion-ordered, unique.
    members: Vec<String>,
    remaining: u32,
    state: TrainState,
}

/// One timed departure to a destination.
///
/// Shared as `Arc<Train>` between the station and the train's scheduler task.
/// Identity is by allocation (`Arc::ptr_eq`): a new train to the same
/// destination is a different train, even if the key is reused.
#[derive(Debug)]
pub struct Train {
    id: u64,
    key: String,
    display_name: String,
    inner: Mutex<TrainInner>,
    cancel: watch::Sender<bool>,
}

impl Train {
    /// Create a train to `destination` leaving in `minutes`, with `conductor`
    /// as its only rider.
    ///
    /// # Errors
    /// * [`TrainError::InvalidDuration`] if `minutes <= 0` (or too large to
    ///   count down).
    /// * [`TrainError::InvalidDestination`] if the destination is blank.
    pub fn new(conductor: &str, minutes: i64, destination: &str) -> Result<Self, TrainError> {
        let remaining = u32::try_from(minutes)
            .ok()
            .filter(|m| *m > 0)
            .ok_or(TrainError::InvalidDuration { minutes })?;

        let display_name = tidy(destination);
        if display_name.is_empty() {
            return Err(TrainError::InvalidDestination);
        }

        let (cancel, _) = watch::channel(false);

        Ok(Self {
            id: NEXT_TRAIN_ID.fetch_add(1, Ordering::Relaxed),
            key: display_name.to_lowercase(),
            display_name,
            inner: Mutex::new(TrainInner {
                members: vec![conductor.to_string()],
                remaining,
                state: TrainState::Forming,
            }),
            cancel,
        })
    }

    fn inner(&self) -> MutexGuard<'_, TrainInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Process-unique id, used in log fields.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Normalised destination, the station key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Destination as the conductor typed it (whitespace tidied).
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    // ── Membership ────────────────────────────────────────────────────────────

    /// Add a rider.
    ///
    /// Re-adding an existing rider is an error rather than a silent no-op, so
    /// callers can tell a first join from a repeat.
    pub fn add_member(&self, id: &str) -> Result<(), TrainError> {
        let mut inner = self.inner();
        if inner.members.iter().any(|m| m == id) {
            return Err(TrainError::AlreadyMember {
                member: id.to_string(),
                destination: self.display_name.clone(),
            });
        }
        inner.members.push(id.to_string());
        Ok(())
    }

    /// Remove a rider.
    ///
    /// The train does not react to becoming empty; the station checks
    /// [`size`](Self::size) and tears it down.
    pub fn remove_member(&self, id: &str) -> Result<(), TrainError> {
        let mut inner = self.inner();
        let pos = inner
            .members
            .iter()
            .position(|m| m == id)
            .ok_or_else(|| TrainError::NotMember {
                member: id.to_string(),
            })?;
        inner.members.remove(pos);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.inner().members.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner().members.iter().any(|m| m == id)
    }

    /// Snapshot of the riders in join order.
    pub fn members(&self) -> Vec<String> {
        self.inner().members.clone()
    }

    /// Riders rendered as a sentence list, e.g. `"alice, bob, and carol"`.
    pub fn render_members(&self) -> String {
        render_list(&self.inner().members)
    }

    // ── Countdown ─────────────────────────────────────────────────────────────

    pub fn remaining(&self) -> u32 {
        self.inner().remaining
    }

    pub fn state(&self) -> TrainState {
        self.inner().state
    }

    /// Advance the countdown by one minute.
    ///
    /// Only the train's scheduler task calls this, so two ticks for the same
    /// train never overlap.
    pub fn tick(&self) -> Tick {
        let mut inner = self.inner();
        inner.remaining = inner.remaining.saturating_sub(1);
        match inner.remaining {
            0 => Tick::Expired,
            1 => Tick::ReminderDue,
            _ => Tick::Continue,
        }
    }

    pub(crate) fn mark_departed(&self) {
        self.inner().state = TrainState::Departed;
    }

    // ── Cancellation ──────────────────────────────────────────────────────────

    /// Tell the scheduler task to stop without departing.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Receiver that flips to `true` once [`cancel`](Self::cancel) is called.
    pub fn cancelled(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── render_list ───────────────────────────────────────────────────────────

    #[test]
    fn render_single_item_is_bare() {
        assert_eq!(render_list(&["a"]), "a");
    }

    #[test]
    fn render_two_items_uses_and() {
        assert_eq!(render_list(&["a", "b"]), "a and b");
    }

    #[test]
    fn render_three_items_uses_serial_comma() {
        assert_eq!(render_list(&["a", "b", "c"]), "a, b, and c");
        assert_eq!(render_list(&["a", "b", "c", "d"]), "a, b, c, and d");
    }

    #[test]
    fn render_empty_is_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(render_list(&empty), "");
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn new_train_has_conductor_aboard() {
        let t = Train::new("alice", 10, "Shake Shack").unwrap();
        assert_eq!(t.members(), vec!["alice"]);
        assert_eq!(t.remaining(), 10);
        assert_eq!(t.state(), TrainState::Forming);
        assert_eq!(t.display_name(), "Shake Shack");
        assert_eq!(t.key(), "shake shack");
        assert!(!t.is_cancelled());
    }

    #[test]
    fn zero_or_negative_minutes_rejected() {
        for minutes in [0, -1, -30] {
            let err = Train::new("alice", minutes, "Chipotle").unwrap_err();
            assert!(matches!(err, TrainError::InvalidDuration { minutes: m } if m == minutes));
        }
    }

    #[test]
    fn blank_destination_rejected() {
        let err = Train::new("alice", 5, "   ").unwrap_err();
        assert!(matches!(err, TrainError::InvalidDestination));
    }

    #[test]
    fn destination_whitespace_is_tidied() {
        let t = Train::new("alice", 5, "  Shake   Shack ").unwrap();
        assert_eq!(t.display_name(), "Shake Shack");
        assert_eq!(normalize("SHAKE \t shack"), t.key());
    }

    #[test]
    fn ids_are_unique() {
        let a = Train::new("alice", 5, "x").unwrap();
        let b = Train::new("alice", 5, "x").unwrap();
        assert_ne!(a.id(), b.id());
    }

    // ── Membership ────────────────────────────────────────────────────────────

    #[test]
    fn add_member_rejects_duplicates() {
        let t = Train::new("alice", 5, "Tacos").unwrap();
        t.add_member("bob").unwrap();
        let err = t.add_member("bob").unwrap_err();
        assert!(matches!(err, TrainError::AlreadyMember { .. }));
        let err = t.add_member("alice").unwrap_err();
        assert!(matches!(err, TrainError::AlreadyMember { .. }));
        assert_eq!(t.size(), 2);
    }

    #[test]
    fn members_keep_join_order() {
        let t = Train::new("carol", 5, "Tacos").unwrap();
        t.add_member("alice").unwrap();
        t.add_member("bob").unwrap();
        assert_eq!(t.members(), vec!["carol", "alice", "bob"]);
        assert_eq!(t.render_members(), "carol, alice, and bob");
    }

    #[test]
    fn remove_member_reports_unknown_rider() {
        let t = Train::new("alice", 5, "Tacos").unwrap();
        let err = t.remove_member("bob").unwrap_err();
        assert!(matches!(err, TrainError::NotMember { .. }));

        t.remove_member("alice").unwrap();
        assert_eq!(t.size(), 0);
        assert_eq!(t.render_members(), "");
    }

    // ── Countdown ─────────────────────────────────────────────────────────────

    #[test]
    fn one_minute_train_expires_on_first_tick() {
        let t = Train::new("alice", 1, "Tacos").unwrap();
        assert_eq!(t.tick(), Tick::Expired);
    }

    #[test]
    fn two_minute_train_reminds_then_expires() {
        let t = Train::new("alice", 2, "Tacos").unwrap();
        assert_eq!(t.tick(), Tick::ReminderDue);
        assert_eq!(t.tick(), Tick::Expired);
    }

    #[test]
    fn longer_train_continues_until_reminder() {
        let t = Train::new("alice", 4, "Tacos").unwrap();
        assert_eq!(t.tick(), Tick::Continue);
        assert_eq!(t.remaining(), 3);
        assert_eq!(t.tick(), Tick::Continue);
        assert_eq!(t.tick(), Tick::ReminderDue);
        assert_eq!(t.tick(), Tick::Expired);
        assert_eq!(t.remaining(), 0);
    }

    // ── Cancellation ──────────────────────────────────────────────────────────

    #[test]
    fn cancel_is_visible_to_existing_receivers() {
        let t = Train::new("alice", 5, "Tacos").unwrap();
        let rx = t.cancelled();
        assert!(!*rx.borrow());
        t.cancel();
        assert!(*rx.borrow());
        assert!(t.is_cancelled());
    }
}
