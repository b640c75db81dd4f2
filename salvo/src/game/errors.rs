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
use thiserror::Error;

use crate::{board::PlaceError, protocol::ErrorCode};

/// Reason a client request was refused. The session is left unchanged whenever one of
/// these is returned.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum SessionError {
    /// No live session has the requested id.
    #[error("session {0} not found")]
    SessionNotFound(String),

    /// Both seats are taken.
    #[error("session is full")]
    SessionFull,

    /// The connection is not bound to a seat in the session.
    #[error("connection is not seated in this session")]
    InvalidSeat,

    /// The connection already holds a seat.
    #[error("connection is already seated in a session")]
    AlreadySeated,

    /// The action needs an active game.
    #[error("game is not in progress")]
    NotPlaying,

    /// The action is only allowed on the seat's own turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The submitted fleet breaks the placement rules.
    #[error("invalid placement: {0}")]
    InvalidPlacement(#[from] PlaceError),

    /// The fleet can no longer be changed.
    #[error("fleet is locked once play has started")]
    PlacementLocked,
}

impl SessionError {
    /// Stable code reported to clients.
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            SessionError::SessionFull => ErrorCode::SessionFull,
            SessionError::InvalidSeat => ErrorCode::InvalidSeat,
            SessionError::AlreadySeated => ErrorCode::AlreadySeated,
            SessionError::NotPlaying => ErrorCode::NotPlaying,
            SessionError::NotYourTurn => ErrorCode::NotYourTurn,
            SessionError::InvalidPlacement(_) | SessionError::PlacementLocked => {
                ErrorCode::InvalidPlacement
            }
        }
    }
}
