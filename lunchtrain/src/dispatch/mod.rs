/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Command surface.
//!
//! [`Dispatcher`] is the one place that turns requests into station
//! operations, starts countdowns for new trains, and tells the room what
//! happened.  It offers two layers:
//!
//! * typed operations ([`start`](Dispatcher::start), [`join`](Dispatcher::join),
//!   [`withdraw`](Dispatcher::withdraw), [`list_active`](Dispatcher::list_active),
//!   [`list_members`](Dispatcher::list_members)) that return structured results;
//! * [`handle`](Dispatcher::handle), which parses a raw chat message, runs the
//!   typed operation, and announces + records the outcome.
//!
//! State changes are committed before anything is announced.  A failed
//! announcement is recorded as a `delivery_error` event and otherwise ignored.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::announce::{announce_best_effort, Announcer};
use crate::command::{self, Command, ParseError, USAGE};
use crate::record::{Event, EventKind, Recorder};
use crate::scheduler::Scheduler;
use crate::station::{Joined, Started, Station, TrainError, TrainSnapshot, Withdrawal};
use crate::train::render_list;

// ── Replies ───────────────────────────────────────────────────────────────────

/// One message the bot sends to the room in response to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: EventKind,
    pub destination: String,
    pub text: String,
}

impl Reply {
    fn new(kind: EventKind, destination: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            destination: destination.into(),
            text: text.into(),
        }
    }
}

fn plural_minutes(n: i64) -> &'static str {
    if n == 1 {
        "minute"
    } else {
        "minutes"
    }
}

fn start_text(conductor: &str, destination: &str, minutes: i64) -> String {
    format!(
        "{conductor} has started a train to {destination} that leaves in {minutes} {}!",
        plural_minutes(minutes)
    )
}

fn withdraw_text(w: &Withdrawal) -> String {
    let mut text = format!(
        "{} has decided to ditch their train to {}.",
        w.member,
        w.train.display_name()
    );
    if w.scrapped {
        text.push_str(" It crashed and burned. There were no fatalities.");
    }
    text
}

fn passengers_text(snapshot: &TrainSnapshot) -> String {
    let verb = if snapshot.members.len() == 1 { "is" } else { "are" };
    format!(
        "{} {verb} on the train to {}",
        snapshot.render_members(),
        snapshot.display_name
    )
}

fn active_text(trains: &[TrainSnapshot]) -> String {
    let describe = |t: &TrainSnapshot| {
        format!(
            "{} in {} mins (with {} on it)",
            t.display_name,
            t.remaining,
            t.render_members()
        )
    };
    match trains {
        [] => "There are currently no active trains".to_string(),
        [only] => format!("There is currently a train to {}", describe(only)),
        many => {
            let parts: Vec<String> = many.iter().map(describe).collect();
            format!("There are trains to: {}", render_list(&parts))
        }
    }
}

fn train_error_text(e: &TrainError) -> String {
    match e {
        TrainError::InvalidDuration { .. } => "Please specify a time greater than 0 mins".into(),
        TrainError::InvalidDestination => "Please tell me where the train is going".into(),
        TrainError::AlreadyExists { destination } => {
            format!("There's already a train to {destination}!")
        }
        TrainError::NotFound { .. } => "That train doesn't exist, please try again".into(),
        TrainError::AlreadyMember {
            member,
            destination,
        } => format!("{member} is already on the train to {destination}"),
        TrainError::NotMember { member } => format!("{member} isn't on any train right now"),
    }
}

fn parse_error_reply(actor: &str, e: &ParseError) -> Reply {
    match e {
        ParseError::InsufficientParams | ParseError::NotACommand => Reply::new(
            EventKind::InsufficientParams,
            "",
            format!("{actor} messed up and forgot to provide the sufficient number of params"),
        ),
        ParseError::StartSyntax => Reply::new(
            EventKind::StartError,
            "",
            "I couldn't parse your destination and/or time to departure",
        ),
        ParseError::MissingDestination { command } => {
            let kind = if *command == "join" {
                EventKind::JoinError
            } else {
                EventKind::PassengersError
            };
            Reply::new(kind, "", format!("/train {command} takes a destination"))
        }
        ParseError::ActiveTakesArgs => Reply::new(
            EventKind::ActiveError,
            "",
            "/train active takes no additional args",
        ),
        ParseError::UnknownCommand(_) => Reply::new(
            EventKind::Malformed,
            "",
            "Your command could not be found, please view the help message (/train help) for more details",
        ),
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Executes commands against a [`Station`] and reports the results.
pub struct Dispatcher {
    station: Arc<Station>,
    scheduler: Scheduler,
    announcer: Arc<dyn Announcer>,
    recorder: Recorder,
}

impl Dispatcher {
    /// `tick` is the length of one countdown minute.
    pub fn new(
        station: Arc<Station>,
        announcer: Arc<dyn Announcer>,
        recorder: Recorder,
        tick: Duration,
    ) -> Self {
        let scheduler = Scheduler::new(
            Arc::clone(&station),
            Arc::clone(&announcer),
            recorder.clone(),
            tick,
        );
        Self {
            station,
            scheduler,
            announcer,
            recorder,
        }
    }

    pub fn station(&self) -> &Arc<Station> {
        &self.station
    }

    // ── Typed operations ──────────────────────────────────────────────────────

    /// Start a train and its countdown.  Must run inside a tokio runtime.
    pub fn start(&self, actor: &str, destination: &str, minutes: i64) -> Result<Started, TrainError> {
        let started = self.station.start_train(actor, minutes, destination)?;
        self.scheduler.spawn(Arc::clone(&started.train));
        Ok(started)
    }

    pub fn join(&self, actor: &str, destination: &str) -> Result<Joined, TrainError> {
        self.station.join(actor, destination)
    }

    /// Withdraw `actor` from their train.
    ///
    /// # Errors
    /// [`TrainError::NotMember`] if they are not on any train.
    pub fn withdraw(&self, actor: &str) -> Result<Withdrawal, TrainError> {
        self.station
            .withdraw(actor)
            .ok_or_else(|| TrainError::NotMember {
                member: actor.to_string(),
            })
    }

    pub fn list_active(&self) -> Vec<TrainSnapshot> {
        self.station.list_active()
    }

    /// Riders on the train to `destination`, captured under the station lock.
    pub fn list_members(&self, destination: &str) -> Result<TrainSnapshot, TrainError> {
        self.station.snapshot(destination)
    }

    // ── Chat surface ──────────────────────────────────────────────────────────

    /// Handle one chat message from `actor`.
    ///
    /// Returns the replies that were announced (empty for messages that are
    /// not commands; those are only recorded as mentions).
    pub async fn handle(&self, actor: &str, message: &str) -> Vec<Reply> {
        let replies = match command::parse(message) {
            Ok(cmd) => {
                debug!(actor, command = ?cmd, "Command");
                self.execute(actor, cmd)
            }
            Err(ParseError::NotACommand) => {
                self.recorder
                    .record(Event::new(EventKind::Mention, "", actor, "").with_command(message));
                return Vec::new();
            }
            Err(e) => {
                info!(actor, error = %e, "Unusable command");
                vec![parse_error_reply(actor, &e)]
            }
        };

        for reply in &replies {
            self.publish(actor, message, reply).await;
        }
        replies
    }

    /// Announce and record an error that happened outside command handling
    /// (e.g. an undecodable webhook payload).
    pub async fn report_error(&self, actor: &str, text: &str) {
        self.publish(actor, "", &Reply::new(EventKind::Error, "", text))
            .await;
    }

    fn execute(&self, actor: &str, cmd: Command) -> Vec<Reply> {
        match cmd {
            Command::Start {
                destination,
                minutes,
            } => match self.start(actor, &destination, minutes) {
                Ok(Started { train, ditched }) => {
                    let mut out: Vec<Reply> = ditched.iter().map(ditch_reply).collect();
                    out.push(Reply::new(
                        EventKind::Start,
                        train.display_name(),
                        start_text(actor, train.display_name(), minutes),
                    ));
                    out
                }
                Err(e) => vec![Reply::new(
                    EventKind::StartError,
                    destination,
                    train_error_text(&e),
                )],
            },

            Command::Join { destination } => match self.join(actor, &destination) {
                Ok(Joined { train, ditched }) => {
                    let mut out: Vec<Reply> = ditched.iter().map(ditch_reply).collect();
                    out.push(Reply::new(
                        EventKind::Join,
                        train.display_name(),
                        format!("{actor} jumped on the train to {}", train.display_name()),
                    ));
                    out
                }
                Err(e) => vec![Reply::new(
                    EventKind::JoinError,
                    destination,
                    train_error_text(&e),
                )],
            },

            Command::Withdraw => match self.withdraw(actor) {
                Ok(w) => vec![ditch_reply(&w)],
                Err(e) => vec![Reply::new(
                    EventKind::WithdrawError,
                    "",
                    train_error_text(&e),
                )],
            },

            Command::Passengers { destination } => match self.list_members(&destination) {
                Ok(snapshot) => vec![Reply::new(
                    EventKind::Passengers,
                    snapshot.display_name.clone(),
                    passengers_text(&snapshot),
                )],
                Err(e) => vec![Reply::new(
                    EventKind::PassengersError,
                    destination,
                    train_error_text(&e),
                )],
            },

            Command::Active => {
                let trains = self.list_active();
                let destination = match trains.as_slice() {
                    [only] => only.display_name.clone(),
                    _ => String::new(),
                };
                vec![Reply::new(EventKind::Active, destination, active_text(&trains))]
            }

            Command::Help => vec![Reply::new(EventKind::Help, "", USAGE)],
        }
    }

    async fn publish(&self, actor: &str, message: &str, reply: &Reply) {
        let delivered = announce_best_effort(self.announcer.as_ref(), &reply.text).await;
        self.recorder.record(
            Event::new(reply.kind, reply.destination.as_str(), actor, reply.text.as_str())
                .with_command(message),
        );
        if !delivered {
            self.recorder.record(
                Event::new(
                    EventKind::DeliveryError,
                    reply.destination.as_str(),
                    actor,
                    reply.text.as_str(),
                )
                .with_command(message),
            );
        }
    }
}

fn ditch_reply(w: &Withdrawal) -> Reply {
    Reply::new(EventKind::Withdraw, w.train.display_name(), withdraw_text(w))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
