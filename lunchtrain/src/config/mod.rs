/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Settings loading.
//!
//! The expected YAML structure is (every section optional):
//! ```yaml
//! server:
//!   bind: "0.0.0.0:8080"
//! room:
//!   name: "lunch"
//!   auth_token: "…"
//!   api_base: "https://api.hipchat.com/v2"
//! schedule:
//!   tick_seconds: 60
//! record:
//!   path: "log.jsonl"
//! ```
//!
//! Command-line flags in `main.rs` are layered on top of whatever the file
//! provides.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

/// Environment variable consulted for the room token when the file has none.
pub const AUTH_TOKEN_ENV: &str = "LUNCHTRAIN_AUTH_TOKEN";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_BASE: &str = "https://api.hipchat.com/v2";
const DEFAULT_TICK_SECONDS: u64 = 60;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
///
/// Kept private – callers work with [`Settings`] instead.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    server: ServerSection,
    room: Option<RoomSection>,
    #[serde(default)]
    schedule: ScheduleSection,
    #[serde(default)]
    record: RecordSection,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    bind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoomSection {
    name: String,
    auth_token: Option<String>,
    api_base: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScheduleSection {
    tick_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecordSection {
    path: Option<PathBuf>,
}

// ── Public data structures ────────────────────────────────────────────────────

/// The chat room announcements are posted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSettings {
    pub name: String,
    pub auth_token: String,
    pub api_base: String,
}

impl RoomSettings {
    /// Room settings built from command-line values; `api_base` defaults to
    /// the public HipChat API.
    pub fn new(name: String, auth_token: String, api_base: Option<String>) -> Self {
        Self {
            name,
            auth_token,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }
}

/// Fully resolved process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Address the webhook server listens on.
    pub bind: SocketAddr,
    /// `None` → announcements only go to the log.
    pub room: Option<RoomSettings>,
    /// Length of one countdown "minute".  Only tests and demos shorten it.
    pub tick: Duration,
    /// `None` → events are traced but not written anywhere.
    pub record_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            room: None,
            tick: Duration::from_secs(DEFAULT_TICK_SECONDS),
            record_path: None,
        }
    }
}

impl Settings {
    /// Parse `path` into [`Settings`].
    ///
    /// A room without an `auth_token` falls back to the
    /// [`AUTH_TOKEN_ENV`] environment variable.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is malformed,
    /// `bind` is not a socket address, `tick_seconds` is zero, or a room has no
    /// token from either source.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading settings from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open settings file: {}", path.display()))?;

        Self::from_yaml(&content, std::env::var(AUTH_TOKEN_ENV).ok())
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    /// Parse settings from YAML text; `env_token` stands in for
    /// [`AUTH_TOKEN_ENV`].
    pub fn from_yaml(content: &str, env_token: Option<String>) -> Result<Self> {
        let file: SettingsFile = if content.trim().is_empty() {
            SettingsFile::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML")?
        };

        let defaults = Settings::default();

        let bind = match file.server.bind {
            Some(b) => b
                .parse()
                .with_context(|| format!("server.bind is not a socket address: {b}"))?,
            None => defaults.bind,
        };

        let tick_seconds = file.schedule.tick_seconds.unwrap_or(DEFAULT_TICK_SECONDS);
        if tick_seconds == 0 {
            bail!("schedule.tick_seconds must be greater than 0");
        }

        let room = match file.room {
            Some(room) => {
                let Some(auth_token) = room.auth_token.or(env_token) else {
                    bail!(
                        "room '{}' has no auth_token (set it in the file or {})",
                        room.name,
                        AUTH_TOKEN_ENV
                    );
                };
                Some(RoomSettings::new(room.name, auth_token, room.api_base))
            }
            None => None,
        };

        let settings = Settings {
            bind,
            room,
            tick: Duration::from_secs(tick_seconds),
            record_path: file.record.path,
        };

        debug!(
            bind = %settings.bind,
            room = ?settings.room.as_ref().map(|r| &r.name),
            tick_seconds,
            record = ?settings.record_path,
            "Settings resolved"
        );

        Ok(settings)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn default_settings_have_expected_values() {
        let s = Settings::default();
        assert_eq!(s.bind.to_string(), "0.0.0.0:8080");
        assert!(s.room.is_none());
        assert_eq!(s.tick, Duration::from_secs(60));
        assert!(s.record_path.is_none());
    }

    #[test]
    fn empty_file_gives_defaults() {
        let s = Settings::from_yaml("", None).unwrap();
        assert_eq!(s, Settings::default());
    }

    // ── Full file ─────────────────────────────────────────────────────────────

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
server:
  bind: "127.0.0.1:9090"
room:
  name: "lunch"
  auth_token: "abc123"
  api_base: "http://localhost:8000/v2"
schedule:
  tick_seconds: 5
record:
  path: "/tmp/trains.jsonl"
"#;
        let f = yaml_tempfile(yaml);
        let s = Settings::load_from_file(f.path()).unwrap();

        assert_eq!(s.bind.to_string(), "127.0.0.1:9090");
        let room = s.room.unwrap();
        assert_eq!(room.name, "lunch");
        assert_eq!(room.auth_token, "abc123");
        assert_eq!(room.api_base, "http://localhost:8000/v2");
        assert_eq!(s.tick, Duration::from_secs(5));
        assert_eq!(s.record_path, Some(PathBuf::from("/tmp/trains.jsonl")));
    }

    #[test]
    fn room_api_base_defaults_to_hipchat() {
        let yaml = "room:\n  name: lunch\n  auth_token: t\n";
        let s = Settings::from_yaml(yaml, None).unwrap();
        assert_eq!(s.room.unwrap().api_base, "https://api.hipchat.com/v2");
    }

    // ── Token resolution ──────────────────────────────────────────────────────

    #[test]
    fn room_token_falls_back_to_env_value() {
        let yaml = "room:\n  name: lunch\n";
        let s = Settings::from_yaml(yaml, Some("from-env".into())).unwrap();
        assert_eq!(s.room.unwrap().auth_token, "from-env");
    }

    #[test]
    fn file_token_wins_over_env_value() {
        let yaml = "room:\n  name: lunch\n  auth_token: from-file\n";
        let s = Settings::from_yaml(yaml, Some("from-env".into())).unwrap();
        assert_eq!(s.room.unwrap().auth_token, "from-file");
    }

    #[test]
    fn room_without_any_token_is_rejected() {
        let yaml = "room:\n  name: lunch\n";
        let err = Settings::from_yaml(yaml, None).unwrap_err();
        assert!(format!("{err:#}").contains("auth_token"));
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn zero_tick_is_rejected() {
        let err = Settings::from_yaml("schedule:\n  tick_seconds: 0\n", None).unwrap_err();
        assert!(format!("{err:#}").contains("tick_seconds"));
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        assert!(Settings::from_yaml("server:\n  bind: not-an-address\n", None).is_err());
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(Settings::from_yaml("trains: {}\n", None).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = Settings::load_from_file(Path::new("/nonexistent/path/lunchtrain.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(Settings::load_from_file(f.path()).is_err());
    }
}
