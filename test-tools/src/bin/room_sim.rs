/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Room simulator: plays chat lines against a running lunchtrain server.
//!
//! Each line has the form `actor: message`.  Blank lines and lines starting
//! with `#` are skipped in script files.  Every line is posted to the
//! server's `/train` endpoint as a room webhook payload.
//!
//! ```text
//! room-sim --say "alice: /train start Tacos 2" --say "bob: /train join Tacos"
//! room-sim --script lunch.txt --pause-ms 500
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "room-sim", about = "Post scripted room messages to lunchtrain")]
struct Cli {
    /// Webhook endpoint of the server under test.
    #[arg(long, default_value = "http://localhost:8080/train")]
    url: String,

    /// File with one `actor: message` line per message.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Inline `actor: message` line; may be repeated.  Sent after the script.
    #[arg(long = "say")]
    say: Vec<String>,

    /// Pause between messages.
    #[arg(long, default_value_t = 200)]
    pause_ms: u64,
}

// ── Webhook payload ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Hook<'a> {
    item: Item<'a>,
}

#[derive(Debug, Serialize)]
struct Item<'a> {
    message: Message<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    from: Sender<'a>,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct Sender<'a> {
    mention_name: &'a str,
}

fn hook<'a>(actor: &'a str, message: &'a str) -> Hook<'a> {
    Hook {
        item: Item {
            message: Message {
                from: Sender {
                    mention_name: actor,
                },
                message,
            },
        },
    }
}

/// Split `actor: message`.
fn split_line(line: &str) -> Option<(&str, &str)> {
    let (actor, message) = line.split_once(':')?;
    let actor = actor.trim();
    if actor.is_empty() {
        return None;
    }
    Some((actor, message.trim()))
}

fn collect_lines(cli: &Cli) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    if let Some(path) = &cli.script {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read script: {}", path.display()))?;
        lines.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from),
        );
    }
    lines.extend(cli.say.iter().cloned());
    if lines.is_empty() {
        bail!("nothing to send: pass --script and/or --say");
    }
    Ok(lines)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let lines = collect_lines(&cli)?;
    let client = reqwest::Client::new();
    let pause = Duration::from_millis(cli.pause_ms);

    info!(url = %cli.url, messages = lines.len(), "Playing script");

    for (n, line) in lines.iter().enumerate() {
        let Some((actor, message)) = split_line(line) else {
            warn!(line_no = n + 1, "Skipping line without `actor: message`: {line}");
            continue;
        };

        let resp = client
            .post(&cli.url)
            .json(&hook(actor, message))
            .send()
            .await
            .with_context(|| format!("POST {} failed", cli.url))?;

        info!(actor, text = message, status = resp.status().as_u16(), "Sent");
        tokio::time::sleep(pause).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_line_trims_both_sides() {
        assert_eq!(
            split_line(" alice :  /train start Tacos 5 "),
            Some(("alice", "/train start Tacos 5"))
        );
        assert_eq!(split_line("no separator"), None);
        assert_eq!(split_line(": orphan"), None);
    }

    #[test]
    fn hook_has_room_webhook_shape() {
        let v = serde_json::to_value(hook("bob", "/train join Tacos")).unwrap();
        assert_eq!(v["item"]["message"]["from"]["mention_name"], "bob");
        assert_eq!(v["item"]["message"]["message"], "/train join Tacos");
    }
}
