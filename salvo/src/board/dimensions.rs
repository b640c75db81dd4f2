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
//! Square board dimensions.
use crate::board::Coordinate;

/// Side length of the standard board.
pub const DEFAULT_BOARD_SIZE: usize = 10;

/// Dimensions of a square board. Rows and columns both run over `[0, size)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BoardDimensions {
    size: usize,
}

impl BoardDimensions {
    /// Create new [`BoardDimensions`] with the given side length.
    /// Panics if `size` is 0 or does not fit in an `i32` coordinate.
    pub fn new(size: usize) -> Self {
        match Self::try_new(size) {
            Some(dim) => dim,
            None => panic!("board size must be in 1..={}, got {}", i32::MAX, size),
        }
    }

    /// Create new [`BoardDimensions`] with the given side length. Returns `None` if
    /// `size` is 0 or does not fit in an `i32` coordinate.
    pub fn try_new(size: usize) -> Option<Self> {
        if size == 0 || i32::try_from(size).is_err() {
            None
        } else {
            Some(Self { size })
        }
    }

    /// Side length of the board.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells on the board.
    pub fn total_size(&self) -> usize {
        self.size * self.size
    }

    /// Returns true if the coordinate lies on the board.
    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.check_bounds(*coord).is_some()
    }

    /// Check if the given [`Coordinate`] is in bounds. If so, return it, otherwise
    /// return `None`.
    #[inline]
    pub fn check_bounds(&self, coord: Coordinate) -> Option<Coordinate> {
        // try_new guarantees size fits in an i32.
        let size = self.size as i32;
        if (0..size).contains(&coord.row) && (0..size).contains(&coord.col) {
            Some(coord)
        } else {
            None
        }
    }

    /// Get an iterator over rows of this board. Each row is an iterator over the
    /// coordinates of that row.
    pub fn iter_coordinates(&self) -> impl Iterator<Item = impl Iterator<Item = Coordinate>> {
        let size = self.size as i32;
        (0..size).map(move |row| (0..size).map(move |col| Coordinate { row, col }))
    }
}

impl Default for BoardDimensions {
    /// The standard 10x10 board.
    fn default() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
        }
    }
}
