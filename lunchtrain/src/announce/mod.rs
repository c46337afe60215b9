/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Outbound announcements to the chat room.
//!
//! The core only needs "send this text somewhere people will see it".  That is
//! the [`Announcer`] trait; [`HipChatAnnouncer`] posts to a room over HTTP and
//! [`LogAnnouncer`] just logs, for running without a room.
//!
//! Delivery is best-effort.  State transitions are committed before anything
//! is announced, and [`announce_best_effort`] turns a [`DeliveryError`] into a
//! warning instead of an error.

pub mod hipchat;

pub use hipchat::HipChatAnnouncer;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

/// Why an announcement did not reach the room.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The HTTP request itself failed (connect, TLS, timeout, …).
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The room API answered with a non-success status.
    #[error("room API rejected notification with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The configured API base cannot carry a room notification path.
    #[error("invalid room API base '{api_base}': {reason}")]
    InvalidApiBase { api_base: String, reason: String },
}

/// Sends one-way text announcements to an external channel.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Announcer that only writes to the log.  Never fails.
#[derive(Debug, Clone, Default)]
pub struct LogAnnouncer;

#[async_trait]
impl Announcer for LogAnnouncer {
    async fn announce(&self, text: &str) -> Result<(), DeliveryError> {
        info!(target: "lunchtrain::room", "{text}");
        Ok(())
    }
}

/// Announce `text`, logging (not returning) any delivery failure.
///
/// Returns whether the announcement was delivered.
pub async fn announce_best_effort(announcer: &dyn Announcer, text: &str) -> bool {
    match announcer.announce(text).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, text, "Announcement not delivered");
            false
        }
    }
}

// ── Test support ──────────────────────────────────────────────────────────────
