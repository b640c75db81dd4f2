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
//! The two seats of a session and the player state bound to each.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Coordinate, Fleet};

/// Identifies one transport connection. Allocated by the transport, opaque to the game.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Seat label. A session has exactly two seats; `A` is always filled first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SeatLabel {
    #[serde(rename = "player1")]
    A,
    #[serde(rename = "player2")]
    B,
}

impl SeatLabel {
    /// Both seats, in join order.
    pub const ALL: [SeatLabel; 2] = [SeatLabel::A, SeatLabel::B];

    /// Get the opponent of this seat.
    pub fn opponent(self) -> Self {
        match self {
            SeatLabel::A => SeatLabel::B,
            SeatLabel::B => SeatLabel::A,
        }
    }

    /// Zero-based index of this seat.
    pub fn index(self) -> usize {
        match self {
            SeatLabel::A => 0,
            SeatLabel::B => 1,
        }
    }

    /// One-based position, as shown to players.
    pub fn position(self) -> usize {
        self.index() + 1
    }

    /// Wire name of this seat.
    pub fn as_str(self) -> &'static str {
        match self {
            SeatLabel::A => "player1",
            SeatLabel::B => "player2",
        }
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A shot fired by a seat.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub row: i32,
    pub col: i32,
    pub hit: bool,
}

impl Shot {
    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.row, self.col)
    }
}

/// Summary of the shots a seat has fired.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotStats {
    pub total_shots: usize,
    pub hits: usize,
    pub misses: usize,
    /// Hit percentage, rounded to the nearest whole number. Zero before the first shot.
    pub accuracy: u32,
}

impl ShotStats {
    /// Compute statistics over a shot history.
    pub fn from_shots(shots: &[Shot]) -> Self {
        let total_shots = shots.len();
        let hits = shots.iter().filter(|shot| shot.hit).count();
        let accuracy = if total_shots > 0 {
            (hits as f64 / total_shots as f64 * 100.0).round() as u32
        } else {
            0
        };
        Self {
            total_shots,
            hits,
            misses: total_shots - hits,
            accuracy,
        }
    }
}

/// A player occupying one seat.
#[derive(Debug, Clone)]
pub struct Seat {
    connection: ConnectionId,
    name: String,
    fleet: Fleet,
    shots: Vec<Shot>,
    ready: bool,
    connected: bool,
}

impl Seat {
    pub(super) fn new(connection: ConnectionId, name: String) -> Self {
        Self {
            connection,
            name,
            fleet: Fleet::default(),
            shots: Vec::new(),
            ready: false,
            connected: true,
        }
    }

    /// Connection bound to this seat.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Display name of the player.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The most recently submitted fleet. Empty until a placement is submitted.
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub(super) fn fleet_mut(&mut self) -> &mut Fleet {
        &mut self.fleet
    }

    pub(super) fn set_fleet(&mut self, fleet: Fleet) {
        self.fleet = fleet;
    }

    /// Shots fired by this seat, oldest first.
    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub(super) fn record_shot(&mut self, shot: Shot) {
        self.shots.push(shot);
    }

    /// Statistics over the shots this seat has fired.
    pub fn stats(&self) -> ShotStats {
        ShotStats::from_shots(&self.shots)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub(super) fn set_ready(&mut self) {
        self.ready = true;
    }

    /// False once the bound connection has gone away.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(super) fn set_disconnected(&mut self) {
        self.connected = false;
    }
}

/// Fixed pair of seat slots indexed by [`SeatLabel`].
#[derive(Debug, Clone, Default)]
pub struct Seats([Option<Seat>; 2]);

impl Seats {
    pub fn get(&self, label: SeatLabel) -> Option<&Seat> {
        self.0[label.index()].as_ref()
    }

    pub fn get_mut(&mut self, label: SeatLabel) -> Option<&mut Seat> {
        self.0[label.index()].as_mut()
    }

    /// Number of occupied seats.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|seat| seat.is_some()).count()
    }

    /// Returns true if both seats are occupied.
    pub fn is_full(&self) -> bool {
        self.count() == 2
    }

    /// The first unoccupied seat, if any.
    pub fn next_free(&self) -> Option<SeatLabel> {
        SeatLabel::ALL
            .iter()
            .copied()
            .find(|label| self.get(*label).is_none())
    }

    /// Find the seat bound to the given connection.
    pub fn find(&self, connection: ConnectionId) -> Option<SeatLabel> {
        self.iter()
            .find(|(_, seat)| seat.connection == connection)
            .map(|(label, _)| label)
    }

    /// Get an iterator over occupied seats and their labels.
    pub fn iter(&self) -> impl Iterator<Item = (SeatLabel, &Seat)> {
        SeatLabel::ALL
            .iter()
            .filter_map(move |&label| self.get(label).map(|seat| (label, seat)))
    }

    pub(super) fn insert(&mut self, label: SeatLabel, seat: Seat) {
        self.0[label.index()] = Some(seat);
    }
}
