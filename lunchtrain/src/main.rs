/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use lunchtrain::announce::{Announcer, HipChatAnnouncer, LogAnnouncer};
use lunchtrain::config::{RoomSettings, Settings, AUTH_TOKEN_ENV};
use lunchtrain::dispatch::Dispatcher;
use lunchtrain::record::Recorder;
use lunchtrain::server;
use lunchtrain::station::Station;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Lunch train coordinator for a chat room.
///
/// Example:
///   lunchtrain --bind 0.0.0.0:8080 --room lunch --record trains.jsonl
#[derive(Debug, Parser)]
#[command(
    name = "lunchtrain",
    about = "Lunch train coordinator – room webhook server",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML settings file.  Flags below override its values.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Address the webhook server listens on.
    #[arg(short = 'b', long = "bind")]
    bind: Option<SocketAddr>,

    /// Room that announcements are posted to.
    #[arg(short = 'r', long = "room")]
    room: Option<String>,

    /// Room API token.
    #[arg(long = "auth-token", env = AUTH_TOKEN_ENV, hide_env_values = true)]
    auth_token: Option<String>,

    /// Room API base URL.
    #[arg(long = "api-base")]
    api_base: Option<String>,

    /// Append one JSON line per event to this file.
    #[arg(long = "record")]
    record: Option<PathBuf>,

    /// Seconds per countdown minute (shorten for demos).
    #[arg(long = "tick-seconds", value_parser = clap::value_parser!(u64).range(1..))]
    tick_seconds: Option<u64>,
}

impl Cli {
    /// Layer the command-line values over `settings`.
    fn apply(self, mut settings: Settings) -> anyhow::Result<Settings> {
        if let Some(bind) = self.bind {
            settings.bind = bind;
        }
        if let Some(secs) = self.tick_seconds {
            settings.tick = Duration::from_secs(secs);
        }
        if let Some(path) = self.record {
            settings.record_path = Some(path);
        }

        match (self.room, settings.room.take()) {
            (Some(name), file_room) => {
                let token = self
                    .auth_token
                    .or_else(|| file_room.as_ref().map(|r| r.auth_token.clone()))
                    .ok_or_else(|| {
                        anyhow::anyhow!("--room {name} needs --auth-token or {AUTH_TOKEN_ENV}")
                    })?;
                let api_base = self.api_base.or(file_room.map(|r| r.api_base));
                settings.room = Some(RoomSettings::new(name, token, api_base));
            }
            (None, Some(mut room)) => {
                if let Some(token) = self.auth_token {
                    room.auth_token = token;
                }
                if let Some(api_base) = self.api_base {
                    room.api_base = api_base;
                }
                settings.room = Some(room);
            }
            (None, None) => {}
        }
        Ok(settings)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Lunchtrain starting up...");

    let mut cli = Cli::parse();

    // ── Load settings ─────────────────────────────────────────────────────────
    let file_settings = match cli.config.take() {
        Some(path) => match Settings::load_from_file(&path) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to load settings: {:#}", e);
                process::exit(1);
            }
        },
        None => Settings::default(),
    };

    let settings = match cli.apply(file_settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid command line: {:#}", e);
            process::exit(1);
        }
    };

    info!(
        bind   = %settings.bind,
        room   = ?settings.room.as_ref().map(|r| &r.name),
        tick   = ?settings.tick,
        record = ?settings.record_path,
        "Configuration"
    );

    // ── Wire components ───────────────────────────────────────────────────────
    let announcer: Arc<dyn Announcer> = match &settings.room {
        Some(room) => match HipChatAnnouncer::new(room) {
            Ok(hipchat) => {
                info!("Announcing to {}", hipchat.url());
                Arc::new(hipchat)
            }
            Err(e) => {
                error!("Cannot set up room '{}': {}", room.name, e);
                process::exit(1);
            }
        },
        None => {
            warn!("No room configured, announcements only go to the log");
            Arc::new(LogAnnouncer)
        }
    };

    let (recorder, writer) = match &settings.record_path {
        Some(path) => {
            let (recorder, handle) = Recorder::jsonl(path);
            (recorder, Some(handle))
        }
        None => (Recorder::disabled(), None),
    };

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(Station::new()),
        announcer,
        recorder,
        settings.tick,
    ));

    // ── Serve ─────────────────────────────────────────────────────────────────
    if let Err(e) = server::serve(settings.bind, dispatcher).await {
        error!("Server failed on {}: {}", settings.bind, e);
        process::exit(1);
    }

    // All recorder clones lived in the dispatcher, which is gone now; let the
    // writer drain what is left.
    if let Some(handle) = writer {
        if let Err(e) = handle.await {
            warn!(error = %e, "Event recorder task failed");
        }
    }

    info!("Lunchtrain stopped");
}
