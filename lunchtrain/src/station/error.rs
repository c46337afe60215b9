/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for train and station operations.
//!
//! Every variant is a local, recoverable condition.  The dispatcher matches on
//! them to pick the chat reply and the event kind to record; nothing here is
//! ever fatal to the process.
//!
//! | Variant | Raised by |
//! |---|---|
//! | `InvalidDuration` | `Train::new`, `Station::start_train` |
//! | `InvalidDestination` | `Train::new`, `Station::start_train` |
//! | `AlreadyExists` | `Station::start_train` |
//! | `NotFound` | `Station::join`, `Station::lookup` |
//! | `AlreadyMember` | `Train::add_member`, `Station::join` |
//! | `NotMember` | `Train::remove_member`, `Dispatcher::withdraw` |
//!
//! Delivery failures live in [`DeliveryError`](crate::announce::DeliveryError)
//! because they never fail a state transition.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainError {
    /// A train must leave at least one minute from now.
    #[error("departure must be at least one minute away (got {minutes})")]
    InvalidDuration { minutes: i64 },

    /// The destination was empty after trimming whitespace.
    #[error("destination must not be blank")]
    InvalidDestination,

    /// `start_train` hit a destination that already has an active train.
    ///
    /// The existing train is left untouched.
    #[error("a train to '{destination}' already exists")]
    AlreadyExists { destination: String },

    /// No active train to this destination.
    #[error("no train to '{destination}'")]
    NotFound { destination: String },

    /// The rider is already aboard this train.
    #[error("'{member}' is already on the train to '{destination}'")]
    AlreadyMember { member: String, destination: String },

    /// The rider is not aboard (this train, or any train).
    #[error("'{member}' is not on the train")]
    NotMember { member: String },
}
