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
//! Implements the placement phase of a fleet.
//!
//! [`FleetSetup`] places ships one at a time under the acceptance rule: the footprint
//! must fit on the board and must not share a cell with a ship already placed.
//! [`validate_fleet`] applies the same rule to a fleet submitted wholesale by a client.
use rand::Rng;
use tracing::trace;

use crate::{
    board::{
        footprint, overlaps, BoardDimensions, CannotPlaceReason, Coordinate, Fleet, PlaceError,
        PlacedShip,
    },
    ships::{Orientation, ShipKind, ShipSet},
};

/// Attempts made per ship by [`FleetSetup::randomize`] before giving up on it.
pub const RANDOM_PLACEMENT_ATTEMPTS: usize = 100;

/// Placement phase for a single seat's fleet.
#[derive(Debug, Clone)]
pub struct FleetSetup {
    /// Dimensions of the board ships are placed on.
    dim: BoardDimensions,

    /// Ships placed so far, in placement order.
    ships: Vec<PlacedShip>,
}

impl FleetSetup {
    /// Begin setup on an empty board with the given dimensions.
    pub fn new(dim: BoardDimensions) -> Self {
        Self {
            dim,
            ships: Vec::new(),
        }
    }

    /// Get the [`BoardDimensions`] ships are being placed on.
    pub fn dimensions(&self) -> &BoardDimensions {
        &self.dim
    }

    /// Ships placed so far, in placement order.
    pub fn ships(&self) -> &[PlacedShip] {
        &self.ships
    }

    /// Ship types that still need to be placed.
    pub fn pending(&self) -> ShipSet {
        ShipSet::all() & !self.placed()
    }

    /// Ship types already placed.
    pub fn placed(&self) -> ShipSet {
        self.ships.iter().map(|ship| ship.kind).collect()
    }

    /// Returns true once one ship of every type has been placed.
    pub fn ready(&self) -> bool {
        self.pending().is_empty()
    }

    /// Check if the given placement would be accepted, without placing the ship.
    /// Returns the footprint it would occupy.
    pub fn check_placement(
        &self,
        kind: ShipKind,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<Vec<Coordinate>, PlaceError> {
        if self.placed().contains(kind) {
            return Err(PlaceError::new(CannotPlaceReason::AlreadyPlaced, kind, origin));
        }
        let cells = footprint(origin, kind, orientation, &self.dim)?;
        if overlaps(&cells, &self.ships) {
            return Err(PlaceError::new(
                CannotPlaceReason::AlreadyOccupied,
                kind,
                origin,
            ));
        }
        Ok(cells)
    }

    /// Try to place the specified ship at the specified origin, returning an error if
    /// placement is not possible.
    pub fn place(
        &mut self,
        kind: ShipKind,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<(), PlaceError> {
        let cells = self.check_placement(kind, origin, orientation)?;
        self.ships.push(PlacedShip::new(kind, orientation, cells));
        Ok(())
    }

    /// Clear the placement of the specified ship. Returns the previous placement if the
    /// ship was placed.
    pub fn unplace(&mut self, kind: ShipKind) -> Option<PlacedShip> {
        let index = self.ships.iter().position(|ship| ship.kind == kind)?;
        Some(self.ships.remove(index))
    }

    /// Clear every placement.
    pub fn clear(&mut self) {
        self.ships.clear();
    }

    /// Place every pending ship at a random origin and orientation. Each ship gets
    /// [`RANDOM_PLACEMENT_ATTEMPTS`] tries. Returns true if the fleet is complete
    /// afterwards.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let size = self.dim.size() as i32;
        for &kind in ShipKind::ALL {
            if !self.pending().contains(kind) {
                continue;
            }
            for attempt in 0..RANDOM_PLACEMENT_ATTEMPTS {
                let origin = Coordinate::new(rng.gen_range(0..size), rng.gen_range(0..size));
                if self.place(kind, origin, rng.gen()).is_ok() {
                    trace!(%kind, ?origin, attempt, "placed ship at random");
                    break;
                }
            }
        }
        self.ready()
    }

    /// Tries to finish setup. If every ship is placed, returns the [`Fleet`], otherwise
    /// returns self.
    pub fn into_fleet(self) -> Result<Fleet, Self> {
        if self.ready() {
            Ok(Fleet::new(self.ships))
        } else {
            Err(self)
        }
    }
}

/// Check a submitted fleet against the placement rules: every ship's cells must be
/// exactly the footprint generated from its first cell, each type may appear once,
/// and no two ships may share a cell. Does not require the fleet to be complete.
///
/// Returns the fleet rebuilt from the generated footprints, so every cell starts unhit
/// whatever the client sent.
pub fn validate_fleet(fleet: &Fleet, dim: &BoardDimensions) -> Result<Fleet, PlaceError> {
    let mut setup = FleetSetup::new(*dim);
    for ship in fleet.iter_ships() {
        let origin = match ship.cells.first() {
            Some(cell) => cell.coord(),
            None => {
                return Err(PlaceError::new(
                    CannotPlaceReason::InvalidProjection,
                    ship.kind,
                    Coordinate::new(0, 0),
                ))
            }
        };
        let expected = setup.check_placement(ship.kind, origin, ship.orientation)?;
        if !ship.coords().eq(expected.iter().copied()) {
            return Err(PlaceError::new(
                CannotPlaceReason::InvalidProjection,
                ship.kind,
                origin,
            ));
        }
        setup.ships.push(PlacedShip::new(ship.kind, ship.orientation, expected));
    }
    Ok(Fleet::new(setup.ships))
}
