/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Room webhook server.
//!
//! | Route         | Behaviour                                                |
//! |---------------|----------------------------------------------------------|
//! | `GET /`       | health check, returns `"Everything is OK!"`              |
//! | `POST /train` | room message webhook → [`Dispatcher::handle`] → 204      |
//!
//! A `/train` body that does not decode as a room message is reported to the
//! room through [`Dispatcher::report_error`] and answered with 400.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;

/// Actor used for errors that cannot be attributed to a room member.
const WEBHOOK_ACTOR: &str = "webhook";

// ── Webhook payload ───────────────────────────────────────────────────────────

/// `{"item":{"message":{"from":{"mention_name":"…"},"message":"…"}}}`
#[derive(Debug, Deserialize)]
struct RoomMessageHook {
    item: HookItem,
}

#[derive(Debug, Deserialize)]
struct HookItem {
    message: HookMessage,
}

#[derive(Debug, Deserialize)]
struct HookMessage {
    from: HookSender,
    message: String,
}

#[derive(Debug, Deserialize)]
struct HookSender {
    mention_name: String,
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/train", post(train_hook))
        .with_state(dispatcher)
}

async fn health() -> Json<&'static str> {
    Json("Everything is OK!")
}

async fn train_hook(State(dispatcher): State<Arc<Dispatcher>>, body: Bytes) -> StatusCode {
    let hook: RoomMessageHook = match serde_json::from_slice(&body) {
        Ok(hook) => hook,
        Err(e) => {
            warn!(error = %e, "Undecodable webhook payload");
            dispatcher
                .report_error(WEBHOOK_ACTOR, &format!("I couldn't read that message: {e}"))
                .await;
            return StatusCode::BAD_REQUEST;
        }
    };

    let HookMessage { from, message } = hook.item.message;
    debug!(actor = %from.mention_name, %message, "Room message");
    dispatcher.handle(&from.mention_name, &message).await;
    StatusCode::NO_CONTENT
}

// ── Serving ───────────────────────────────────────────────────────────────────

/// Serve on `addr` until ctrl-c, then reset the station.
pub async fn serve(addr: SocketAddr, dispatcher: Arc<Dispatcher>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_shutdown(listener, dispatcher, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// Every running train is cancelled once the server has stopped, so no
/// countdown outlives it.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!("Listening for room webhooks on {}", listener.local_addr()?);

    axum::serve(listener, router(Arc::clone(&dispatcher)))
        .with_graceful_shutdown(shutdown)
        .await?;

    let running = dispatcher.station().len();
    dispatcher.station().reset();
    info!(cancelled_trains = running, "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("received SIGINT, shutting down"),
        Err(e) => {
            // Without a handler the process can only be killed; keep serving.
            warn!(error = %e, "Cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
