//! Tap zones for paged reading.
//!
//! The viewport is divided into a 3×3 grid; every cell maps to an action.
//! Layouts are defined for left-to-right reading and adjusted for the
//! configured inversion and reading direction.

use crate::reader::{ReadingDirection, TapZoneInvert, TapZoneLayout};
use derive_more::Display;
use serde::Serialize;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TapAction {
    #[display("previous")]
    Previous,
    #[display("menu")]
    Menu,
    #[display("next")]
    Next,
}

use TapAction::{Menu as M, Next as N, Previous as P};

/// Rows top to bottom, columns left to right.
type Grid = [[TapAction; 3]; 3];

const L_SHAPED: Grid = [[P, P, N], [P, M, N], [P, N, N]];
const KINDLE: Grid = [[M, M, M], [P, N, N], [P, N, N]];
const EDGE: Grid = [[N, M, N], [N, M, N], [N, P, N]];
const RIGHT_LEFT: Grid = [[P, M, N], [P, M, N], [P, M, N]];
const DISABLED: Grid = [[M; 3]; 3];

impl TapZoneLayout {
    fn grid(&self) -> Grid {
        match self {
            Self::LShaped => L_SHAPED,
            Self::Kindle => KINDLE,
            Self::Edge => EDGE,
            Self::RightLeft => RIGHT_LEFT,
            Self::Disabled => DISABLED,
        }
    }
}

/// One grid cell, in fractions of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TapRegion {
    pub action: TapAction,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The effective tap zones of a reader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapZones {
    grid: Grid,
}

impl TapZones {
    pub fn new(layout: TapZoneLayout, invert: TapZoneInvert, direction: ReadingDirection) -> Self {
        let mut grid = layout.grid();
        if invert.horizontal {
            grid.iter_mut().for_each(|row| row.reverse());
        }
        if invert.vertical {
            grid.reverse();
        }
        if direction == ReadingDirection::Rtl {
            for action in grid.iter_mut().flatten() {
                *action = match *action {
                    P => N,
                    N => P,
                    M => M,
                };
            }
        }
        Self { grid }
    }

    /// Action for a tap at `(x, y)` in a `width × height` viewport, or `None`
    /// when the point lies outside it.
    pub fn action_at(&self, x: f64, y: f64, width: f64, height: f64) -> Option<TapAction> {
        if !(width > 0.0 && height > 0.0) || !(0.0..=width).contains(&x) || !(0.0..=height).contains(&y) {
            return None;
        }
        // Points on the far edges belong to the last cell.
        let cell = |position: f64, size: f64| ((position / size * 3.0) as usize).min(2);
        Some(self.grid[cell(y, height)][cell(x, width)])
    }

    /// All nine cells, row by row.
    pub fn regions(&self) -> Vec<TapRegion> {
        let third = 1.0 / 3.0;
        self.grid
            .iter()
            .enumerate()
            .flat_map(|(row, actions)| {
                actions.iter().enumerate().map(move |(column, &action)| TapRegion {
                    action,
                    x: column as f64 * third,
                    y: row as f64 * third,
                    width: third,
                    height: third,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const LTR: ReadingDirection = ReadingDirection::Ltr;
    const NONE: TapZoneInvert = TapZoneInvert { horizontal: false, vertical: false };

    #[rstest]
    #[case(TapZoneLayout::LShaped, 10.0, 10.0, P)]
    #[case(TapZoneLayout::LShaped, 150.0, 150.0, M)]
    #[case(TapZoneLayout::LShaped, 150.0, 290.0, N)]
    #[case(TapZoneLayout::Kindle, 150.0, 10.0, M)]
    #[case(TapZoneLayout::Kindle, 10.0, 290.0, P)]
    #[case(TapZoneLayout::Edge, 150.0, 290.0, P)]
    #[case(TapZoneLayout::Edge, 10.0, 10.0, N)]
    #[case(TapZoneLayout::RightLeft, 299.0, 150.0, N)]
    #[case(TapZoneLayout::Disabled, 10.0, 10.0, M)]
    fn test_layouts(#[case] layout: TapZoneLayout, #[case] x: f64, #[case] y: f64, #[case] expected: TapAction) {
        let zones = TapZones::new(layout, NONE, LTR);
        assert_eq!(zones.action_at(x, y, 300.0, 300.0), Some(expected));
    }

    #[test]
    fn test_right_to_left_swaps_previous_and_next() {
        let zones = TapZones::new(TapZoneLayout::RightLeft, NONE, ReadingDirection::Rtl);
        assert_eq!(zones.action_at(10.0, 10.0, 300.0, 300.0), Some(N));
        assert_eq!(zones.action_at(290.0, 10.0, 300.0, 300.0), Some(P));
        assert_eq!(zones.action_at(150.0, 10.0, 300.0, 300.0), Some(M));
    }

    #[test]
    fn test_inversion_mirrors_grid() {
        let horizontal = TapZones::new(TapZoneLayout::LShaped, TapZoneInvert { horizontal: true, vertical: false }, LTR);
        assert_eq!(horizontal.grid, [[N, P, P], [N, M, P], [N, N, P]]);
        let vertical = TapZones::new(TapZoneLayout::Kindle, TapZoneInvert { horizontal: false, vertical: true }, LTR);
        assert_eq!(vertical.grid, [[P, N, N], [P, N, N], [M, M, M]]);
    }

    #[rstest]
    #[case(-1.0, 10.0)]
    #[case(10.0, 301.0)]
    fn test_outside_viewport(#[case] x: f64, #[case] y: f64) {
        let zones = TapZones::new(TapZoneLayout::LShaped, NONE, LTR);
        assert_eq!(zones.action_at(x, y, 300.0, 300.0), None);
        assert_eq!(zones.action_at(10.0, 10.0, 0.0, 300.0), None);
    }

    #[test]
    fn test_far_edge_belongs_to_last_cell() {
        let zones = TapZones::new(TapZoneLayout::RightLeft, NONE, LTR);
        assert_eq!(zones.action_at(300.0, 300.0, 300.0, 300.0), Some(N));
    }

    #[test]
    fn test_regions_cover_viewport() {
        let regions = TapZones::new(TapZoneLayout::Kindle, NONE, LTR).regions();
        assert_eq!(regions.len(), 9);
        assert_eq!(regions[0].action, M);
        assert_eq!(regions[3].action, P);
        let area: f64 = regions.iter().map(|r| r.width * r.height).sum();
        assert!((area - 1.0).abs() < 1e-9);
    }
}
