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
//! Game library for a two-player Battleship relay.
//!
//! The crate has no networking of its own. [`board`] and [`ships`] hold the board
//! geometry and ship catalogue, [`game`] the per-session turn protocol,
//! [`store`] the registry of live sessions and [`protocol`] the JSON messages
//! exchanged with clients. A transport drives sessions by calling their transition
//! methods and delivering the events they return.

pub use crate::{
    config::SessionConfig,
    game::{ConnectionId, SeatLabel, Session, SessionError, SessionId, SessionStatus, Transition},
    protocol::{ClientMessage, ErrorCode, ServerEvent},
    store::SessionStore,
};

pub mod board;
pub mod config;
pub mod game;
pub mod protocol;
pub mod ships;
pub mod store;
