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
//! The ship catalogue. Every fleet carries exactly one ship of each [`ShipKind`].
use std::fmt;

use enumflags2::{bitflags, BitFlags};
use rand::{
    distributions::{Distribution, Standard},
    Rng,
};
use serde::{Deserialize, Serialize};

/// Set of ship types, used to track which ships a fleet has placed or lost.
pub type ShipSet = BitFlags<ShipKind>;

/// Ship type. Serialized as the lowercase type name used on the wire.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipKind {
    /// Carrier: 5x2, 10 cells.
    Carrier = 0b00_0001,
    /// Cruiser: 3x2, 6 cells.
    Cruiser = 0b00_0010,
    /// Destroyer: 5x1, 5 cells.
    Destroyer = 0b00_0100,
    /// Frigate: 4x1, 4 cells.
    Frigate = 0b00_1000,
    /// Submarine: 2x2, 4 cells.
    Submarine = 0b01_0000,
    /// Corvette: 3x1, 3 cells.
    Corvette = 0b10_0000,
}

/// Static description of a ship type.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ShipSpec {
    /// Display name of the ship.
    pub name: &'static str,
    /// Total number of cells the ship occupies.
    pub size: usize,
    /// Footprint width (columns) when placed horizontally.
    pub width: usize,
    /// Footprint height (rows) when placed horizontally.
    pub height: usize,
}

const CARRIER: ShipSpec = ShipSpec {
    name: "Carrier",
    size: 10,
    width: 5,
    height: 2,
};
const CRUISER: ShipSpec = ShipSpec {
    name: "Cruiser",
    size: 6,
    width: 3,
    height: 2,
};
const DESTROYER: ShipSpec = ShipSpec {
    name: "Destroyer",
    size: 5,
    width: 5,
    height: 1,
};
const FRIGATE: ShipSpec = ShipSpec {
    name: "Frigate",
    size: 4,
    width: 4,
    height: 1,
};
const SUBMARINE: ShipSpec = ShipSpec {
    name: "Submarine",
    size: 4,
    width: 2,
    height: 2,
};
const CORVETTE: ShipSpec = ShipSpec {
    name: "Corvette",
    size: 3,
    width: 3,
    height: 1,
};

impl ShipKind {
    /// All ship types, in the order a fleet is normally placed.
    pub const ALL: &'static [ShipKind] = &[
        ShipKind::Carrier,
        ShipKind::Cruiser,
        ShipKind::Destroyer,
        ShipKind::Frigate,
        ShipKind::Submarine,
        ShipKind::Corvette,
    ];

    /// Get the static spec for this ship type.
    pub fn spec(self) -> &'static ShipSpec {
        match self {
            ShipKind::Carrier => &CARRIER,
            ShipKind::Cruiser => &CRUISER,
            ShipKind::Destroyer => &DESTROYER,
            ShipKind::Frigate => &FRIGATE,
            ShipKind::Submarine => &SUBMARINE,
            ShipKind::Corvette => &CORVETTE,
        }
    }

    /// Number of cells this ship type occupies.
    pub fn len(self) -> usize {
        self.spec().size
    }

    /// The wire name of this ship type.
    pub fn as_str(self) -> &'static str {
        match self {
            ShipKind::Carrier => "carrier",
            ShipKind::Cruiser => "cruiser",
            ShipKind::Destroyer => "destroyer",
            ShipKind::Frigate => "frigate",
            ShipKind::Submarine => "submarine",
            ShipKind::Corvette => "corvette",
        }
    }
}

impl fmt::Display for ShipKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.spec().name)
    }
}

/// Placement orientation of a ship.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Width runs along columns, height along rows.
    Horizontal,
    /// Width and height are swapped.
    Vertical,
}

impl Orientation {
    /// The other orientation.
    pub fn rotated(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// The `(rows, cols)` extent of the given ship spec in this orientation.
    pub fn extent(self, spec: &ShipSpec) -> (usize, usize) {
        match self {
            Orientation::Horizontal => (spec.height, spec.width),
            Orientation::Vertical => (spec.width, spec.height),
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Horizontal
    }
}

impl Distribution<Orientation> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Orientation {
        if rng.gen() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}
