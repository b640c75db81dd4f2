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
//! The turn protocol of a single session.
use std::{borrow::Borrow, fmt, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    board::{validate_fleet, Coordinate, Fleet, PlacedShip},
    config::SessionConfig,
    game::{
        ConnectionId, Seat, SeatLabel, Seats, SessionError, Shot, TimerCommand, TimerTicket,
        TurnTimer,
    },
    protocol::{ServerEvent, ShotReport},
};

/// Shareable identifier of a session.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Lifecycle status of a session.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Fewer than two seats are taken.
    Waiting,
    /// Both seats are taken and fleets are being placed.
    Setup,
    /// Shots are being exchanged.
    Playing,
    /// One seat's fleet has been destroyed. Terminal.
    Finished,
}

/// An event addressed to one seat.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub seat: SeatLabel,
    pub event: ServerEvent,
}

/// Everything a transition produced: events to deliver, in order, and what to do with
/// the turn timer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub deliveries: Vec<Delivery>,
    pub timer: TimerCommand,
}

impl Transition {
    /// A transition that changed nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if there is nothing to deliver and the timer is left alone.
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty() && self.timer == TimerCommand::Keep
    }

    /// Events addressed to the given seat, in delivery order.
    pub fn events_for(&self, seat: SeatLabel) -> impl Iterator<Item = &ServerEvent> {
        self.deliveries
            .iter()
            .filter(move |delivery| delivery.seat == seat)
            .map(|delivery| &delivery.event)
    }

    fn send(&mut self, seat: SeatLabel, event: ServerEvent) {
        self.deliveries.push(Delivery { seat, event });
    }

    fn broadcast(&mut self, event: ServerEvent) {
        self.send(SeatLabel::A, event.clone());
        self.send(SeatLabel::B, event);
    }
}

/// State of one game between two seats.
///
/// Every method is a complete transition: it either refuses the request with a
/// [`SessionError`] and leaves the session untouched, or applies it and returns the
/// resulting [`Transition`].
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    seats: Seats,
    status: SessionStatus,
    current_turn: Option<SeatLabel>,
    winner: Option<SeatLabel>,
    created_at: Instant,
    timer: TurnTimer,
    config: SessionConfig,
}

impl Session {
    /// Create an empty session waiting for its first seat.
    pub fn new(id: SessionId, config: SessionConfig, created_at: Instant) -> Self {
        Self {
            id,
            seats: Seats::default(),
            status: SessionStatus::Waiting,
            current_turn: None,
            winner: None,
            created_at,
            timer: TurnTimer::new(config.turn_duration),
            config,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Seat that moves next. `None` until play starts.
    pub fn current_turn(&self) -> Option<SeatLabel> {
        self.current_turn
    }

    pub fn winner(&self) -> Option<SeatLabel> {
        self.winner
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }

    pub fn seats(&self) -> &Seats {
        &self.seats
    }

    pub fn seat(&self, label: SeatLabel) -> Option<&Seat> {
        self.seats.get(label)
    }

    pub fn seat_count(&self) -> usize {
        self.seats.count()
    }

    /// Get the seat bound to a connection.
    pub fn seat_of(&self, connection: ConnectionId) -> Result<SeatLabel, SessionError> {
        self.seats.find(connection).ok_or(SessionError::InvalidSeat)
    }

    /// Get the connection events for a seat should go to. `None` if the seat is empty or
    /// its connection is gone.
    pub fn connection_of(&self, label: SeatLabel) -> Option<ConnectionId> {
        self.seats
            .get(label)
            .filter(|seat| seat.is_connected())
            .map(Seat::connection)
    }

    /// Returns true if any seat still has a live connection.
    pub fn has_connected_seat(&self) -> bool {
        self.seats.iter().any(|(_, seat)| seat.is_connected())
    }

    fn seat_mut(&mut self, label: SeatLabel) -> Result<&mut Seat, SessionError> {
        self.seats.get_mut(label).ok_or(SessionError::InvalidSeat)
    }

    /// Bind a connection to the next free seat. An empty or missing display name is
    /// replaced with `Player N`.
    pub fn join(
        &mut self,
        connection: ConnectionId,
        display_name: Option<String>,
    ) -> Result<(SeatLabel, Transition), SessionError> {
        if self.seats.find(connection).is_some() {
            return Err(SessionError::AlreadySeated);
        }
        let seat = self.seats.next_free().ok_or(SessionError::SessionFull)?;
        let name = display_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("Player {}", seat.position()));
        self.seats.insert(seat, Seat::new(connection, name));
        let seat_count = self.seats.count();
        if self.seats.is_full() {
            self.status = SessionStatus::Setup;
        }
        info!(session = %self.id, %seat, %connection, seat_count, "seat joined");

        let mut transition = Transition::none();
        transition.send(
            seat,
            ServerEvent::JoinedSession {
                seat,
                session_id: self.id.clone(),
                seat_count,
            },
        );
        if self.seats.get(seat.opponent()).is_some() {
            transition.send(seat.opponent(), ServerEvent::SeatJoined { seat, seat_count });
        }
        Ok((seat, transition))
    }

    /// Replace the sender's fleet with the submitted ships.
    ///
    /// With placement validation on, the fleet must follow the placement rules, is
    /// stored with every cell unhit and cannot be replaced once play has started.
    /// Otherwise the ships are stored as sent.
    pub fn submit_placement(
        &mut self,
        connection: ConnectionId,
        ships: Vec<PlacedShip>,
    ) -> Result<Transition, SessionError> {
        let seat = self.seat_of(connection)?;
        let fleet = if self.config.validate_placements {
            if matches!(self.status, SessionStatus::Playing | SessionStatus::Finished) {
                return Err(SessionError::PlacementLocked);
            }
            validate_fleet(&Fleet::new(ships), &self.config.dimensions)?
        } else {
            Fleet::new(ships)
        };
        let ship_count = fleet.len();
        self.seat_mut(seat)?.set_fleet(fleet);
        debug!(session = %self.id, %seat, ship_count, "placement stored");

        let mut transition = Transition::none();
        transition.send(seat, ServerEvent::PlacementAccepted { ship_count });
        Ok(transition)
    }

    /// Mark the sender ready. Starts the game once both seats are ready. Ignored once
    /// play has started.
    pub fn set_ready(&mut self, connection: ConnectionId) -> Result<Transition, SessionError> {
        let seat = self.seat_of(connection)?;
        if matches!(self.status, SessionStatus::Playing | SessionStatus::Finished) {
            debug!(session = %self.id, %seat, status = ?self.status, "ready ignored");
            return Ok(Transition::none());
        }
        self.seat_mut(seat)?.set_ready();

        let mut transition = Transition::none();
        let all_ready = self.seats.is_full() && self.seats.iter().all(|(_, s)| s.is_ready());
        if all_ready {
            self.status = SessionStatus::Playing;
            self.current_turn = Some(SeatLabel::A);
            transition.broadcast(ServerEvent::GameStart {
                current_turn: SeatLabel::A,
            });
            transition.timer = TimerCommand::Start(self.timer.arm());
            info!(session = %self.id, current_turn = %SeatLabel::A, "game started");
        } else if self.seats.get(seat.opponent()).is_some() {
            transition.send(seat.opponent(), ServerEvent::OpponentReady);
        }
        Ok(transition)
    }

    /// Fire the sender's shot at the opponent's fleet.
    pub fn fire_shot(
        &mut self,
        connection: ConnectionId,
        target: Coordinate,
    ) -> Result<Transition, SessionError> {
        let firer = self.seat_of(connection)?;
        if self.status != SessionStatus::Playing {
            return Err(SessionError::NotPlaying);
        }
        if self.current_turn != Some(firer) {
            return Err(SessionError::NotYourTurn);
        }
        let defender = firer.opponent();

        let defending = self.seat_mut(defender)?;
        let outcome = defending.fleet_mut().shoot(target);
        let defeated = defending.fleet().defeated();
        let hit = outcome.is_hit();
        self.seat_mut(firer)?.record_shot(Shot {
            row: target.row,
            col: target.col,
            hit,
        });
        debug!(
            session = %self.id,
            seat = %firer,
            row = target.row,
            col = target.col,
            hit,
            sunk_ship = ?outcome.sunk_ship(),
            "shot fired"
        );

        let mut transition = Transition::none();
        if defeated {
            self.status = SessionStatus::Finished;
            self.winner = Some(firer);
            self.timer.cancel();
            transition.timer = TimerCommand::Cancel;
            let winner_name = self
                .seats
                .get(firer)
                .map(|seat| seat.name().to_owned())
                .unwrap_or_default();
            for (label, seat) in self.seats.iter() {
                let stats = seat.stats();
                info!(
                    session = %self.id,
                    seat = %label,
                    shots = stats.total_shots,
                    hits = stats.hits,
                    accuracy = stats.accuracy,
                    "final stats"
                );
            }
            info!(session = %self.id, winner = %firer, %winner_name, "game over");
            transition.broadcast(ServerEvent::GameOver {
                winner: firer,
                winner_name,
            });
        } else {
            self.current_turn = Some(defender);
            transition.timer = TimerCommand::Start(self.timer.arm());
            let report = ShotReport {
                row: target.row,
                col: target.col,
                hit,
                sunk_ship: outcome.sunk_ship(),
                your_turn: false,
            };
            transition.send(firer, ServerEvent::ShotResult(report));
            transition.send(
                defender,
                ServerEvent::OpponentShot(ShotReport {
                    your_turn: true,
                    ..report
                }),
            );
        }
        Ok(transition)
    }

    /// Give up the sender's turn. Does nothing unless the session is playing and it is
    /// the sender's turn.
    pub fn skip_turn(&mut self, connection: ConnectionId) -> Transition {
        match self.seats.find(connection) {
            Some(seat) => self.skip(seat),
            None => Transition::none(),
        }
    }

    /// Deliver an elapsed timer ticket. Skips the current turn if the ticket is still
    /// the outstanding one, otherwise does nothing.
    pub fn expire_turn(&mut self, ticket: TimerTicket) -> Transition {
        if !self.timer.fire(ticket) {
            debug!(session = %self.id, generation = ticket.generation(), "stale timer ticket");
            return Transition::none();
        }
        match self.current_turn {
            Some(seat) if self.status == SessionStatus::Playing => {
                info!(session = %self.id, %seat, "turn timer expired");
                self.skip(seat)
            }
            _ => Transition::none(),
        }
    }

    fn skip(&mut self, seat: SeatLabel) -> Transition {
        if self.status != SessionStatus::Playing || self.current_turn != Some(seat) {
            return Transition::none();
        }
        let next = seat.opponent();
        self.current_turn = Some(next);
        debug!(session = %self.id, %seat, "turn skipped");

        let mut transition = Transition::none();
        transition.timer = TimerCommand::Start(self.timer.arm());
        transition.send(seat, ServerEvent::TurnSkipped { your_turn: false });
        transition.send(next, ServerEvent::OpponentSkipped { your_turn: true });
        transition
    }

    /// Mark the connection's seat as gone and tell the other seat. The game is not
    /// forfeited; the turn timer keeps running until neither seat is connected.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Transition {
        let seat = match self.seats.find(connection) {
            Some(seat) => seat,
            None => return Transition::none(),
        };
        if let Some(gone) = self.seats.get_mut(seat) {
            gone.set_disconnected();
        }
        info!(session = %self.id, %seat, %connection, "seat disconnected");

        let mut transition = Transition::none();
        if self.seats.get(seat.opponent()).is_some() {
            transition.send(seat.opponent(), ServerEvent::SeatDisconnected { seat });
        }
        if !self.has_connected_seat() && self.timer.is_armed() {
            self.timer.cancel();
            transition.timer = TimerCommand::Cancel;
        }
        transition
    }
}
