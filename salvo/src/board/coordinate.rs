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
use serde::{Deserialize, Serialize};

/// The coordinates of a cell on a seat's board.
///
/// Coordinates are signed so that anything a client sends can be represented. Cells
/// outside `[0, size)` on either axis are simply out of bounds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Vertical position of the cell.
    pub row: i32,
    /// Horizontal position of the cell.
    pub col: i32,
}

impl Coordinate {
    /// Construct a [`Coordinate`] from the given `row` and `col`.
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Get the coordinate `rows` below and `cols` to the right of this one.
    pub fn offset(self, rows: i32, cols: i32) -> Self {
        Self::new(self.row.saturating_add(rows), self.col.saturating_add(cols))
    }
}

impl From<(i32, i32)> for Coordinate {
    /// Construct a [`Coordinate`] from the given `(row, col)` pair.
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

impl From<Coordinate> for (i32, i32) {
    /// Convert the [`Coordinate`] into a `(row, col)` pair.
    fn from(coord: Coordinate) -> Self {
        (coord.row, coord.col)
    }
}
