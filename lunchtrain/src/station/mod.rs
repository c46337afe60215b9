/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The station: every active [`Train`], keyed by destination, plus a reverse
//! index from rider to the train they are on.
//!
//! # Consistency
//! Both maps live behind a single mutex, so every operation here is
//! linearizable.  After each call:
//!
//! * `train_by_member[m]` is `t` **iff** `m` is aboard `t` and `t` is the train
//!   registered under `t.key()`;
//! * no registered train is empty.
//!
//! # Lock order
//! Station lock first, then a train's own lock.  [`Train::tick`] takes only the
//! train lock and never the station lock, so the scheduler cannot deadlock
//! against command handlers.
//!
//! # Teardown
//! A train leaves the station either because its last rider withdrew
//! ([`Station::withdraw`]) or because its countdown expired
//! ([`Station::finalize_departure`]).  Both paths remove by identity and only
//! if still present, so whichever runs second finds nothing and does nothing.

pub mod error;

pub use error::TrainError;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::train::{normalize, render_list, Train};

// ── Operation results ─────────────────────────────────────────────────────────

/// A rider left a train.
#[derive(Debug, Clone)]
pub struct Withdrawal {
    pub member: String,
    pub train: Arc<Train>,
    /// The train emptied and was removed from the station (its scheduler has
    /// been cancelled).
    pub scrapped: bool,
}

/// Result of [`Station::start_train`].
#[derive(Debug, Clone)]
pub struct Started {
    pub train: Arc<Train>,
    /// The conductor's previous membership, withdrawn first.
    pub ditched: Option<Withdrawal>,
}

/// Result of [`Station::join`].
#[derive(Debug, Clone)]
pub struct Joined {
    pub train: Arc<Train>,
    /// The rider's previous membership, withdrawn first.
    pub ditched: Option<Withdrawal>,
}

/// A train that has just been finalised by its countdown.
#[derive(Debug, Clone)]
pub struct Departure {
    pub display_name: String,
    pub members: Vec<String>,
    /// `members` rendered as a sentence list, captured at departure.
    pub rendered: String,
}

/// Point-in-time view of one active train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainSnapshot {
    pub display_name: String,
    pub remaining: u32,
    pub members: Vec<String>,
}

impl TrainSnapshot {
    fn of(train: &Train) -> Self {
        Self {
            display_name: train.display_name().to_string(),
            remaining: train.remaining(),
            members: train.members(),
        }
    }

    pub fn render_members(&self) -> String {
        render_list(&self.members)
    }
}

// ── Station ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Registry {
    /// `BTreeMap` so listings come out in a stable, alphabetical order.
    trains_by_key: BTreeMap<String, Arc<Train>>,
    train_by_member: HashMap<String, Arc<Train>>,
}

impl Registry {
    /// Is `train` (this exact instance) the one registered under its key?
    fn is_current(&self, train: &Arc<Train>) -> bool {
        self.trains_by_key
            .get(train.key())
            .is_some_and(|t| Arc::ptr_eq(t, train))
    }

    /// Remove `train` and every member entry that points at it.
    ///
    /// Returns `false` (and changes nothing) if `train` is no longer
    /// registered.
    fn remove_train(&mut self, train: &Arc<Train>) -> bool {
        if !self.is_current(train) {
            return false;
        }
        self.trains_by_key.remove(train.key());
        self.train_by_member.retain(|_, t| !Arc::ptr_eq(t, train));
        true
    }

    /// Take `member` off whatever train they are on.
    fn withdraw(&mut self, member: &str) -> Option<Withdrawal> {
        let train = self.train_by_member.remove(member)?;

        if let Err(e) = train.remove_member(member) {
            // The index said they were aboard; keep going so the index is
            // repaired either way.
            warn!(member, train_id = train.id(), error = %e, "member index out of sync");
        }

        let scrapped = train.size() == 0;
        if scrapped {
            if self.remove_train(&train) {
                info!(
                    destination = %train.display_name(),
                    train_id = train.id(),
                    "Train emptied, scrapping it"
                );
            }
            train.cancel();
        }

        debug!(member, destination = %train.display_name(), scrapped, "Withdrew rider");

        Some(Withdrawal {
            member: member.to_string(),
            train,
            scrapped,
        })
    }
}

/// Registry of active trains.
///
/// Construct one per process (or per test) and share it as `Arc<Station>`.
#[derive(Debug, Default)]
pub struct Station {
    registry: Mutex<Registry>,
}

impl Station {
    /// Creates an empty station.
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Start a new train to `destination` with `conductor` aboard.
    ///
    /// If the conductor is riding another train they are withdrawn from it
    /// first, in the same critical section, and the withdrawal is reported in
    /// [`Started::ditched`].
    ///
    /// # Errors
    /// * [`TrainError::InvalidDuration`] / [`TrainError::InvalidDestination`]
    ///   – nothing changes.
    /// * [`TrainError::AlreadyExists`] – the existing train and the conductor's
    ///   current membership are left untouched.
    pub fn start_train(
        &self,
        conductor: &str,
        minutes: i64,
        destination: &str,
    ) -> Result<Started, TrainError> {
        let train = Arc::new(Train::new(conductor, minutes, destination)?);

        let mut reg = self.registry();
        if let Some(existing) = reg.trains_by_key.get(train.key()) {
            return Err(TrainError::AlreadyExists {
                destination: existing.display_name().to_string(),
            });
        }

        let ditched = reg.withdraw(conductor);

        reg.trains_by_key
            .insert(train.key().to_string(), Arc::clone(&train));
        reg.train_by_member
            .insert(conductor.to_string(), Arc::clone(&train));

        info!(
            conductor,
            destination = %train.display_name(),
            minutes,
            train_id = train.id(),
            "Train started"
        );

        Ok(Started { train, ditched })
    }

    /// Put `member` on the train to `destination`.
    ///
    /// A rider on a different train is withdrawn from it first (reported in
    /// [`Joined::ditched`]).
    ///
    /// # Errors
    /// * [`TrainError::NotFound`] – no such train.
    /// * [`TrainError::AlreadyMember`] – already aboard this train; nothing
    ///   changes.
    pub fn join(&self, member: &str, destination: &str) -> Result<Joined, TrainError> {
        let key = normalize(destination);

        let mut reg = self.registry();
        let train = reg
            .trains_by_key
            .get(&key)
            .cloned()
            .ok_or_else(|| TrainError::NotFound {
                destination: destination.trim().to_string(),
            })?;

        if reg
            .train_by_member
            .get(member)
            .is_some_and(|t| Arc::ptr_eq(t, &train))
        {
            return Err(TrainError::AlreadyMember {
                member: member.to_string(),
                destination: train.display_name().to_string(),
            });
        }

        let ditched = reg.withdraw(member);

        train.add_member(member)?;
        reg.train_by_member
            .insert(member.to_string(), Arc::clone(&train));

        info!(
            member,
            destination = %train.display_name(),
            riders = train.size(),
            "Rider joined"
        );

        Ok(Joined { train, ditched })
    }

    /// Take `member` off the train they are on.
    ///
    /// Returns `None` if they are not on any train.  If the train empties it is
    /// removed from the station and its scheduler is cancelled; it will never
    /// depart.
    pub fn withdraw(&self, member: &str) -> Option<Withdrawal> {
        self.registry().withdraw(member)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Snapshot of every active train, ordered by destination key.
    pub fn list_active(&self) -> Vec<TrainSnapshot> {
        let reg = self.registry();
        reg.trains_by_key
            .values()
            .map(|t| TrainSnapshot::of(t))
            .collect()
    }

    /// The active train to `destination`.
    pub fn lookup(&self, destination: &str) -> Result<Arc<Train>, TrainError> {
        self.registry()
            .trains_by_key
            .get(&normalize(destination))
            .cloned()
            .ok_or_else(|| TrainError::NotFound {
                destination: destination.trim().to_string(),
            })
    }

    /// Snapshot of the train to `destination`, taken under the station lock.
    pub fn snapshot(&self, destination: &str) -> Result<TrainSnapshot, TrainError> {
        self.registry()
            .trains_by_key
            .get(&normalize(destination))
            .map(|t| TrainSnapshot::of(t))
            .ok_or_else(|| TrainError::NotFound {
                destination: destination.trim().to_string(),
            })
    }

    /// The train `member` is currently on, if any.
    pub fn train_of(&self, member: &str) -> Option<Arc<Train>> {
        self.registry().train_by_member.get(member).cloned()
    }

    /// Is this exact train still registered?
    pub fn is_active(&self, train: &Arc<Train>) -> bool {
        self.registry().is_current(train)
    }

    pub fn len(&self) -> usize {
        self.registry().trains_by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().trains_by_key.is_empty()
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    /// Finalise an expired train.
    ///
    /// Captures the rider list, removes the train and all of its member
    /// entries, and marks it departed – all under the station lock.  Returns
    /// `None` if the train was already torn down (e.g. its last rider withdrew
    /// concurrently), in which case nothing is changed.
    pub fn finalize_departure(&self, train: &Arc<Train>) -> Option<Departure> {
        let mut reg = self.registry();
        if !reg.is_current(train) {
            debug!(
                destination = %train.display_name(),
                train_id = train.id(),
                "Departure skipped, train already gone"
            );
            return None;
        }

        let members = train.members();
        reg.remove_train(train);
        train.mark_departed();

        info!(
            destination = %train.display_name(),
            train_id = train.id(),
            riders = members.len(),
            "Train departed"
        );

        Some(Departure {
            display_name: train.display_name().to_string(),
            rendered: render_list(&members),
            members,
        })
    }

    /// Cancel every train and empty the station.
    pub fn reset(&self) {
        let mut reg = self.registry();
        for train in reg.trains_by_key.values() {
            train.cancel();
        }
        let count = reg.trains_by_key.len();
        reg.trains_by_key.clear();
        reg.train_by_member.clear();
        if count > 0 {
            info!(count, "Station reset, cancelled active trains");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
