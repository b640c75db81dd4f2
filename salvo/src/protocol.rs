// Copyright 2020 Zachary Stewart
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Wire messages exchanged with clients.
//!
//! Every message is a JSON object with a kebab-case `"type"` discriminator and
//! camelCase fields, e.g. `{"type":"fire-shot","row":3,"col":4}`.
use serde::{Deserialize, Serialize};

use crate::{
    board::PlacedShip,
    game::{SeatLabel, SessionError, SessionId, SessionStatus},
    ships::ShipKind,
};

/// A message sent by a client.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Allocate a new session.
    CreateSession,
    /// Take a seat in an existing session.
    JoinSession {
        session_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    /// Replace the sender's fleet.
    SubmitPlacement { ships: Vec<PlacedShip> },
    /// Signal that the sender's fleet is final.
    SetReady,
    /// Fire at the opponent's board.
    FireShot { row: i32, col: i32 },
    /// Give up the current turn.
    SkipTurn,
}

/// Outcome of a shot, as told to one side of it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotReport {
    pub row: i32,
    pub col: i32,
    pub hit: bool,
    /// Ship this shot sank, if it completed one.
    pub sunk_ship: Option<ShipKind>,
    /// Whether the recipient moves next.
    pub your_turn: bool,
}

/// A message sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Reply to a `create-session` request.
    SessionCreated {
        session_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        join_url: Option<String>,
    },
    /// The recipient took a seat.
    JoinedSession {
        seat: SeatLabel,
        session_id: SessionId,
        seat_count: usize,
    },
    /// Another player took the other seat.
    SeatJoined { seat: SeatLabel, seat_count: usize },
    /// The recipient's fleet was stored.
    PlacementAccepted { ship_count: usize },
    /// The other seat is ready and waiting for the recipient.
    OpponentReady,
    /// Both seats are ready and play begins.
    GameStart { current_turn: SeatLabel },
    /// Outcome of the recipient's own shot.
    ShotResult(ShotReport),
    /// Outcome of a shot at the recipient's board.
    OpponentShot(ShotReport),
    /// The game has a winner.
    GameOver {
        winner: SeatLabel,
        winner_name: String,
    },
    /// The recipient's turn was skipped.
    TurnSkipped { your_turn: bool },
    /// The other seat's turn was skipped.
    OpponentSkipped { your_turn: bool },
    /// The other seat's connection went away.
    SeatDisconnected { seat: SeatLabel },
    /// The recipient's last request was refused.
    Error { code: ErrorCode, message: String },
}

impl ServerEvent {
    /// Build an error event.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code,
            message: message.into(),
        }
    }
}

impl From<&SessionError> for ServerEvent {
    fn from(err: &SessionError) -> Self {
        ServerEvent::error(err.code(), err.to_string())
    }
}

/// Stable error codes carried by [`ServerEvent::Error`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    SessionNotFound,
    SessionFull,
    InvalidSeat,
    AlreadySeated,
    NotPlaying,
    NotYourTurn,
    InvalidPlacement,
    /// The frame could not be parsed as a client message.
    MalformedMessage,
}

/// Answer to a pre-join session lookup.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub exists: bool,
    pub seat_count: usize,
    pub status: SessionStatus,
}
