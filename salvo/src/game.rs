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
//! The session state machine.
//!
//! A [`Session`] pairs two seats and runs the turn protocol between them: join, fleet
//! placement, the ready handshake, shot resolution, turn skips and disconnects. Each
//! operation is a synchronous transition that returns the events it produced as a
//! [`Transition`]; routing those events to connections is left to the transport.
//!
//! The turn timer is modelled as a value ([`TurnTimer`]) rather than a running task.
//! Transitions report a [`TimerCommand`] and the transport hands elapsed
//! [`TimerTicket`]s back through [`Session::expire_turn`].

pub use self::{
    errors::SessionError,
    seat::{ConnectionId, Seat, SeatLabel, Seats, Shot, ShotStats},
    session::{Delivery, Session, SessionId, SessionStatus, Transition},
    timer::{TimerCommand, TimerTicket, TurnTimer},
};

mod errors;
mod seat;
mod session;
mod timer;
