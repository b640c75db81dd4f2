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
//! Errors used by ship placement and fleet validation.

use thiserror::Error;

use crate::{board::Coordinate, ships::ShipKind};

/// Reason why a ship could not be placed.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum CannotPlaceReason {
    /// One or more cells of the footprint fall off the board.
    #[error("the ship does not fit on the board at that position")]
    OutOfBounds,
    /// One or more of the cells is already occupied by another ship.
    #[error("the requested position was already occupied")]
    AlreadyOccupied,
    /// A ship of this type was already placed.
    #[error("ship was already placed")]
    AlreadyPlaced,
    /// The cells provided are not the footprint of the ship's type and orientation.
    #[error("the cells provided do not match the ship's footprint")]
    InvalidProjection,
}

/// Error caused when attempting to place a ship in an invalid position.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("could not place {kind} at {origin:?}: {reason}")]
pub struct PlaceError {
    #[source]
    reason: CannotPlaceReason,
    kind: ShipKind,
    origin: Coordinate,
}

impl PlaceError {
    /// Construct a placement error from a reason, ship type and origin.
    pub(super) fn new(reason: CannotPlaceReason, kind: ShipKind, origin: Coordinate) -> Self {
        Self {
            reason,
            kind,
            origin,
        }
    }

    /// Get the reason placement was aborted.
    pub fn reason(&self) -> CannotPlaceReason {
        self.reason
    }

    /// Get the type of the ship that could not be placed.
    pub fn kind(&self) -> ShipKind {
        self.kind
    }

    /// Get the origin where placement was attempted.
    pub fn origin(&self) -> Coordinate {
        self.origin
    }
}

/// Error returned when a footprint does not fit on the board.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
#[error("{kind} at {origin:?} does not fit on the board")]
pub struct OutOfBounds {
    /// Type of ship whose footprint was computed.
    pub kind: ShipKind,
    /// Origin of the attempted footprint.
    pub origin: Coordinate,
}

impl From<OutOfBounds> for PlaceError {
    fn from(err: OutOfBounds) -> Self {
        PlaceError::new(CannotPlaceReason::OutOfBounds, err.kind, err.origin)
    }
}
