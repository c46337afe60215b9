/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! `/train …` chat command parsing.
//!
//! ```text
//! /train start <destination…> <minutes>
//! /train join <destination…>
//! /train passengers <destination…>
//! /train ditch            (aliases: withdraw, leave)
//! /train active
//! /train help
//! ```
//!
//! Destinations may contain spaces.  Parsing only checks shape; whether the
//! minutes are positive or the destination exists is the station's call.

use thiserror::Error;

/// The prefix every command starts with.
pub const PREFIX: &str = "/train";

/// Usage line shown by `/train help`.
pub const USAGE: &str = "Usage: /train start <destination> <#minutes> || /train join <destination> \
|| /train passengers <destination> || /train active || /train ditch";

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { destination: String, minutes: i64 },
    Join { destination: String },
    Passengers { destination: String },
    Withdraw,
    Active,
    Help,
}

/// Why a chat message is not a usable command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not addressed to the bot at all.
    #[error("message is not a /train command")]
    NotACommand,

    /// `/train` with nothing after it.
    #[error("missing sub-command")]
    InsufficientParams,

    /// `start` without a destination followed by a whole number of minutes.
    #[error("expected: start <destination> <minutes>")]
    StartSyntax,

    /// `join` / `passengers` without a destination.
    #[error("{command} needs a destination")]
    MissingDestination { command: &'static str },

    /// `active` followed by extra words.
    #[error("active takes no arguments")]
    ActiveTakesArgs,

    #[error("unknown sub-command '{0}'")]
    UnknownCommand(String),
}

/// Parse one chat message.
pub fn parse(message: &str) -> Result<Command, ParseError> {
    let mut words = message.split_whitespace();

    if words.next() != Some(PREFIX) {
        return Err(ParseError::NotACommand);
    }
    let sub = words
        .next()
        .ok_or(ParseError::InsufficientParams)?
        .to_lowercase();
    let rest: Vec<&str> = words.collect();

    match sub.as_str() {
        "start" => parse_start(&rest),
        "join" => Ok(Command::Join {
            destination: destination(&rest, "join")?,
        }),
        "passengers" => Ok(Command::Passengers {
            destination: destination(&rest, "passengers")?,
        }),
        "ditch" | "withdraw" | "leave" => Ok(Command::Withdraw),
        "active" if rest.is_empty() => Ok(Command::Active),
        "active" => Err(ParseError::ActiveTakesArgs),
        "help" => Ok(Command::Help),
        _ => Err(ParseError::UnknownCommand(sub)),
    }
}

/// `<destination words…> <minutes>`: the last word is the countdown and at
/// least one word must come before it.
fn parse_start(rest: &[&str]) -> Result<Command, ParseError> {
    let [dest @ .., last] = rest else {
        return Err(ParseError::StartSyntax);
    };
    if dest.is_empty() {
        return Err(ParseError::StartSyntax);
    }
    let minutes = last.parse::<i64>().map_err(|_| ParseError::StartSyntax)?;
    Ok(Command::Start {
        destination: dest.join(" "),
        minutes,
    })
}

fn destination(rest: &[&str], command: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::MissingDestination { command });
    }
    Ok(rest.join(" "))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
