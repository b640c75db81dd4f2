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
//! Types that make up a seat's side of the ocean.

use serde::{Deserialize, Serialize};

use crate::ships::{Orientation, ShipKind, ShipSet};

pub use self::{
    coordinate::Coordinate,
    dimensions::{BoardDimensions, DEFAULT_BOARD_SIZE},
    errors::{CannotPlaceReason, OutOfBounds, PlaceError},
    footprint::{footprint, overlaps},
    setup::{validate_fleet, FleetSetup},
};

mod coordinate;
mod dimensions;
mod errors;
mod footprint;
pub mod setup;

/// A single cell of a placed ship and whether it has been hit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShipCell {
    /// Vertical position of the cell.
    pub row: i32,
    /// Horizontal position of the cell.
    pub col: i32,
    /// Whether this cell has been hit.
    #[serde(default)]
    pub hit: bool,
}

impl ShipCell {
    /// The board coordinate of this cell.
    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.row, self.col)
    }
}

impl From<Coordinate> for ShipCell {
    fn from(coord: Coordinate) -> Self {
        Self {
            row: coord.row,
            col: coord.col,
            hit: false,
        }
    }
}

/// A ship placed on a seat's board.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlacedShip {
    /// Type of the ship.
    #[serde(rename = "type")]
    pub kind: ShipKind,

    /// How the ship was rotated when placed.
    #[serde(default)]
    pub orientation: Orientation,

    /// Cells covered by the ship, in footprint order.
    pub cells: Vec<ShipCell>,
}

impl PlacedShip {
    /// Create an unhit ship covering the given coordinates.
    pub fn new<C>(kind: ShipKind, orientation: Orientation, coords: C) -> Self
    where
        C: IntoIterator<Item = Coordinate>,
    {
        Self {
            kind,
            orientation,
            cells: coords.into_iter().map(ShipCell::from).collect(),
        }
    }

    /// Check if every cell of this ship has been hit.
    pub fn sunk(&self) -> bool {
        self.cells.iter().all(|cell| cell.hit)
    }

    /// Returns true if the ship covers the given coordinate.
    pub fn occupies(&self, coord: Coordinate) -> bool {
        self.coords().any(|c| c == coord)
    }

    /// Get an iterator over the coordinates of this ship.
    pub fn coords(&self) -> impl '_ + Iterator<Item = Coordinate> {
        self.cells.iter().map(ShipCell::coord)
    }

    /// Get an iterator over the coordinates of this ship and whether those coords have
    /// been hit.
    pub fn hits(&self) -> impl '_ + Iterator<Item = (Coordinate, bool)> {
        self.cells.iter().map(|cell| (cell.coord(), cell.hit))
    }
}

/// Result of a shot on a single seat's fleet.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShotOutcome {
    /// The shot did not hit anything.
    Miss,
    /// The shot hit the ship of the given type, which is still afloat (or was already
    /// sunk before this shot).
    Hit(ShipKind),
    /// The shot completed the given ship, but the fleet has other ships afloat.
    Sunk(ShipKind),
    /// The shot completed the given ship and every ship of the fleet is now sunk.
    Defeated(ShipKind),
}

impl ShotOutcome {
    /// Whether the shot struck a ship.
    pub fn is_hit(&self) -> bool {
        !matches!(self, ShotOutcome::Miss)
    }

    /// Get the type of the ship that was hit.
    pub fn ship(&self) -> Option<ShipKind> {
        match *self {
            ShotOutcome::Miss => None,
            ShotOutcome::Hit(kind) | ShotOutcome::Sunk(kind) | ShotOutcome::Defeated(kind) => {
                Some(kind)
            }
        }
    }

    /// Get the type of the ship this shot sank, if it sank one.
    pub fn sunk_ship(&self) -> Option<ShipKind> {
        match *self {
            ShotOutcome::Sunk(kind) | ShotOutcome::Defeated(kind) => Some(kind),
            ShotOutcome::Miss | ShotOutcome::Hit(_) => None,
        }
    }
}

/// A seat's ships, in the order they were submitted.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fleet {
    ships: Vec<PlacedShip>,
}

impl Fleet {
    /// Build a fleet from ships in placement order.
    pub fn new(ships: Vec<PlacedShip>) -> Self {
        Self { ships }
    }

    /// Number of ships in the fleet.
    pub fn len(&self) -> usize {
        self.ships.len()
    }

    /// Returns true if no ships have been submitted.
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Get an iterator over all ships in placement order.
    pub fn iter_ships(&self) -> impl Iterator<Item = &PlacedShip> {
        self.ships.iter()
    }

    /// Get the first ship of the given type, if any.
    pub fn get_ship(&self, kind: ShipKind) -> Option<&PlacedShip> {
        self.ships.iter().find(|ship| ship.kind == kind)
    }

    /// Set of ship types present in the fleet.
    pub fn kinds(&self) -> ShipSet {
        self.ships.iter().map(|ship| ship.kind).collect()
    }

    /// Set of ship types that have been sunk.
    pub fn sunk_kinds(&self) -> ShipSet {
        self.ships
            .iter()
            .filter(|ship| ship.sunk())
            .map(|ship| ship.kind)
            .collect()
    }

    /// Returns true if every cell of every ship has been hit. A fleet with no ships is
    /// never defeated.
    pub fn defeated(&self) -> bool {
        !self.ships.is_empty() && self.ships.iter().all(PlacedShip::sunk)
    }

    /// Fire at the given coordinate. The first ship in placement order that covers the
    /// coordinate takes the hit. Firing at an already-hit cell hits it again, harmlessly.
    pub fn shoot(&mut self, coord: Coordinate) -> ShotOutcome {
        let ship = match self.ships.iter_mut().find(|ship| ship.occupies(coord)) {
            Some(ship) => ship,
            None => return ShotOutcome::Miss,
        };
        let was_sunk = ship.sunk();
        if let Some(cell) = ship.cells.iter_mut().find(|cell| cell.coord() == coord) {
            cell.hit = true;
        }
        let kind = ship.kind;
        if was_sunk || !ship.sunk() {
            ShotOutcome::Hit(kind)
        } else if self.defeated() {
            ShotOutcome::Defeated(kind)
        } else {
            ShotOutcome::Sunk(kind)
        }
    }
}

impl From<Vec<PlacedShip>> for Fleet {
    fn from(ships: Vec<PlacedShip>) -> Self {
        Self::new(ships)
    }
}
