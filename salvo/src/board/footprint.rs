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
//! Pure geometry: which cells a ship covers, and whether a candidate collides with a
//! seat's existing ships.
//!
//! The only placement rules are "fits on the board" and "shares no cell with another
//! ship of the same seat". Ships may touch; there is no spacing requirement.

use crate::{
    board::{BoardDimensions, Coordinate, OutOfBounds, PlacedShip},
    ships::{Orientation, ShipKind},
};

/// Compute the cells covered by a ship of the given type placed at `origin`.
///
/// The origin is the top-left cell. Cells are produced row by row. If any cell would
/// fall outside the board the whole placement is rejected; a partial footprint is never
/// returned.
pub fn footprint(
    origin: Coordinate,
    kind: ShipKind,
    orientation: Orientation,
    dim: &BoardDimensions,
) -> Result<Vec<Coordinate>, OutOfBounds> {
    let (rows, cols) = orientation.extent(kind.spec());
    let mut cells = Vec::with_capacity(rows * cols);
    for r in 0..rows as i32 {
        for c in 0..cols as i32 {
            match dim.check_bounds(origin.offset(r, c)) {
                Some(cell) => cells.push(cell),
                None => return Err(OutOfBounds { kind, origin }),
            }
        }
    }
    Ok(cells)
}

/// Returns true if any candidate cell is already covered by one of `existing`.
/// Equality is an exact `(row, col)` match.
pub fn overlaps<'a, I>(candidate: &[Coordinate], existing: I) -> bool
where
    I: IntoIterator<Item = &'a PlacedShip>,
{
    existing
        .into_iter()
        .flat_map(|ship| ship.coords())
        .any(|taken| candidate.contains(&taken))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_fills_extent_when_in_bounds() {
        let dim = BoardDimensions::default();
        for &kind in ShipKind::ALL {
            for &orientation in &[Orientation::Horizontal, Orientation::Vertical] {
                let (rows, cols) = orientation.extent(kind.spec());
                for origin in dim.iter_coordinates().flatten() {
                    let fits = origin.row as usize + rows <= dim.size()
                        && origin.col as usize + cols <= dim.size();
                    match footprint(origin, kind, orientation, &dim) {
                        Ok(cells) => {
                            assert!(fits, "{} {:?} at {:?}", kind, orientation, origin);
                            assert_eq!(cells.len(), kind.len());
                            assert!(cells.iter().all(|c| dim.contains(c)));
                        }
                        Err(err) => {
                            assert!(!fits, "{} {:?} at {:?}", kind, orientation, origin);
                            assert_eq!(err.kind, kind);
                            assert_eq!(err.origin, origin);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn vertical_carrier_swaps_axes() {
        let dim = BoardDimensions::default();
        let cells = footprint(
            Coordinate::new(0, 0),
            ShipKind::Carrier,
            Orientation::Vertical,
            &dim,
        )
        .unwrap();
        assert_eq!(cells.iter().map(|c| c.row).max(), Some(4));
        assert_eq!(cells.iter().map(|c| c.col).max(), Some(1));
        assert!(footprint(
            Coordinate::new(6, 0),
            ShipKind::Carrier,
            Orientation::Vertical,
            &dim
        )
        .is_err());
        assert!(footprint(
            Coordinate::new(6, 0),
            ShipKind::Carrier,
            Orientation::Horizontal,
            &dim
        )
        .is_ok());
    }

    #[test]
    fn negative_origin_is_out_of_bounds() {
        let dim = BoardDimensions::default();
        assert!(footprint(
            Coordinate::new(-1, 2),
            ShipKind::Corvette,
            Orientation::Horizontal,
            &dim
        )
        .is_err());
    }

    #[test]
    fn overlap_is_exact_match_in_either_order() {
        let dim = BoardDimensions::default();
        let place = |row, col, kind| {
            let cells = footprint(Coordinate::new(row, col), kind, Orientation::Horizontal, &dim)
                .unwrap();
            PlacedShip::new(kind, Orientation::Horizontal, cells)
        };
        let frigate = place(0, 0, ShipKind::Frigate);
        let corvette = place(0, 3, ShipKind::Corvette);
        let neighbor = place(1, 0, ShipKind::Corvette);

        let frigate_cells: Vec<Coordinate> = frigate.coords().collect();
        let corvette_cells: Vec<Coordinate> = corvette.coords().collect();
        let neighbor_cells: Vec<Coordinate> = neighbor.coords().collect();

        assert!(overlaps(&corvette_cells, [&frigate]));
        assert!(overlaps(&frigate_cells, [&corvette]));
        // Touching is allowed.
        assert!(!overlaps(&neighbor_cells, [&frigate]));
        assert!(!overlaps(&frigate_cells, [&neighbor]));
        assert!(!overlaps(&frigate_cells, std::iter::empty()));
    }
}
