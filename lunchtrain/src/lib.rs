/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Lunchtrain – chat-room lunch train coordinator
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── train         – one train: riders, countdown, cancel signal
//! ├── station/      – registry of trains and rider memberships
//! ├── scheduler/    – per-train countdown task (reminder, departure)
//! ├── announce/     – room notifications (HipChat, log)
//! ├── record/       – JSONL event record
//! ├── command/      – `/train …` message parsing
//! ├── dispatch/     – commands → station operations → announcements
//! ├── server/       – room webhook HTTP server
//! └── config/       – YAML settings file
//! ```

pub mod announce;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod record;
pub mod scheduler;
pub mod server;
pub mod station;
pub mod train;
