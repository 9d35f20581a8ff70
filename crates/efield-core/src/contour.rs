//! Marching-squares isoline extraction over a [`PotentialGrid`].
//!
//! Each cell is examined independently. An edge is crossed when the level
//! lies strictly between its endpoint values; a corner that equals the level
//! exactly produces no crossing. Crossings are collected in edge order top,
//! bottom, left, right. The first two found form one segment and, in a saddle
//! cell with four crossings, the third and fourth form a second. Saddles are
//! not disambiguated, so the pairing is reproducible but may join the
//! "wrong" diagonal.

use crate::geom::{self, LineSegment, Vec2};
use crate::sampler::PotentialGrid;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Isolines for one requested level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourLine {
    pub level: f64,
    pub segments: Vec<LineSegment>,
}

/// Edges touching a non-finite corner (a zero-radius charge sitting on a
/// node) are never crossed.
#[inline]
fn crosses(level: f64, a: f64, b: f64) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (level > a && level < b) || (level < a && level > b)
}

/// Crossing point on edge `pa -> pb`. Only called when `crosses` holds, so
/// `va != vb` and both are finite.
#[inline]
fn interpolate(level: f64, pa: Vec2, pb: Vec2, va: f64, vb: f64) -> Vec2 {
    let t = ((level - va) / (vb - va)).clamp(0.0, 1.0);
    geom::lerp(pa, pb, t)
}

/// Segments of one cell. Corners go counter-clockwise from bottom-left:
/// `p[0]` BL, `p[1]` BR, `p[2]` TR, `p[3]` TL, with values `v` in the same order.
/// Returns the number of crossings found alongside the segments.
pub fn cell_segments(
    level: f64,
    p: [Vec2; 4],
    v: [f64; 4],
    out: &mut Vec<LineSegment>,
) -> usize {
    // (start corner, end corner): top, bottom, left, right.
    const EDGES: [(usize, usize); 4] = [(3, 2), (0, 1), (0, 3), (1, 2)];

    let mut points = [geom::ZERO; 4];
    let mut found = 0;
    for &(a, b) in &EDGES {
        if crosses(level, v[a], v[b]) {
            points[found] = interpolate(level, p[a], p[b], v[a], v[b]);
            found += 1;
        }
    }
    if found >= 2 {
        out.push(LineSegment::new(points[0], points[1]));
    }
    if found >= 4 {
        out.push(LineSegment::new(points[2], points[3]));
    }
    found
}

/// All isoline segments for `level`, cells visited column by column.
pub fn extract_level(grid: &PotentialGrid, level: f64) -> Vec<LineSegment> {
    let spec = grid.spec();
    let mut segments = Vec::new();
    let mut odd_cells = 0usize;
    for i in 0..spec.width() {
        for j in 0..spec.height() {
            let p = [
                spec.point(i, j),
                spec.point(i + 1, j),
                spec.point(i + 1, j + 1),
                spec.point(i, j + 1),
            ];
            let v = [
                grid.get(i, j),
                grid.get(i + 1, j),
                grid.get(i + 1, j + 1),
                grid.get(i, j + 1),
            ];
            let found = cell_segments(level, p, v, &mut segments);
            if found % 2 == 1 {
                log::trace!("cell ({i}, {j}) has {found} crossings at level {level}");
                odd_cells += 1;
            }
        }
    }
    if odd_cells > 0 {
        log::debug!("level {level}: {odd_cells} cells with an odd crossing count");
    }
    segments
}

/// One [`ContourLine`] per level, in the caller's order. Levels are
/// independent and extracted in parallel.
pub fn extract_levels(grid: &PotentialGrid, levels: &[f64]) -> Vec<ContourLine> {
    levels
        .par_iter()
        .map(|&level| ContourLine {
            level,
            segments: extract_level(grid, level),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::PointChargeSource;
    use crate::field::FieldEvaluator;
    use crate::grid::GridSpec;
    use crate::registry::ChargeSnapshot;

    const UNIT_CELL: [Vec2; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    fn on_grid_edge(p: Vec2, spec: &GridSpec) -> bool {
        let fx = (p[0] - spec.origin[0]) / spec.cell_size;
        let fy = (p[1] - spec.origin[1]) / spec.cell_size;
        (fx - fx.round()).abs() < 1e-9 || (fy - fy.round()).abs() < 1e-9
    }

    #[test]
    fn linear_ramp_contour_lies_on_level() {
        // Origin offset so no node sits exactly on x = 5.
        let spec = GridSpec::new([0.3, -2.0], 1.0, [10, 6]);
        let grid = PotentialGrid::from_fn(spec, |p| p[0]).unwrap();
        let segments = extract_level(&grid, 5.0);
        // One vertical crossing segment per row of cells.
        assert_eq!(segments.len(), 6);
        for s in &segments {
            for p in [s.start, s.end] {
                assert!((p[0] - 5.0).abs() < 1e-9, "endpoint {p:?} off level");
                assert!(on_grid_edge(p, &spec));
            }
        }
    }

    #[test]
    fn diagonal_ramp_endpoints_interpolate_level() {
        let spec = GridSpec::new([0.0, 0.0], 0.5, [8, 8]);
        let f = |p: Vec2| 2.0 * p[0] + p[1];
        let grid = PotentialGrid::from_fn(spec, f).unwrap();
        let segments = extract_level(&grid, 3.3);
        assert!(!segments.is_empty());
        for s in &segments {
            assert!((f(s.start) - 3.3).abs() < 1e-9);
            assert!((f(s.end) - 3.3).abs() < 1e-9);
            assert!(on_grid_edge(s.start, &spec) && on_grid_edge(s.end, &spec));
        }
    }

    #[test]
    fn exact_corner_match_is_not_a_crossing() {
        let mut out = Vec::new();
        // Level equals the two left corners: bottom and top edges touch it
        // only at an endpoint.
        let found = cell_segments(1.0, UNIT_CELL, [1.0, 2.0, 2.0, 1.0], &mut out);
        assert_eq!(found, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn single_corner_cell_connects_top_then_left() {
        let mut out = Vec::new();
        // Only the top-left corner is above the level.
        let found = cell_segments(0.5, UNIT_CELL, [0.0, 0.0, 0.0, 1.0], &mut out);
        assert_eq!(found, 2);
        assert_eq!(out, vec![LineSegment::new([0.5, 1.0], [0.0, 0.5])]);
    }

    #[test]
    fn saddle_pairs_crossings_in_edge_order() {
        let mut out = Vec::new();
        // BL and TR high, BR and TL low: all four edges crossed at midpoints.
        let found = cell_segments(0.5, UNIT_CELL, [1.0, 0.0, 1.0, 0.0], &mut out);
        assert_eq!(found, 4);
        assert_eq!(
            out,
            vec![
                // top with bottom, then left with right
                LineSegment::new([0.5, 1.0], [0.5, 0.0]),
                LineSegment::new([0.0, 0.5], [1.0, 0.5]),
            ]
        );
    }

    #[test]
    fn odd_crossing_count_emits_partial_connection() {
        let mut out = Vec::new();
        // TL equals the level exactly, so only the bottom edge is crossed.
        let found = cell_segments(0.5, UNIT_CELL, [0.0, 1.0, 1.0, 0.5], &mut out);
        assert_eq!(found, 1);
        assert!(out.is_empty());
        // Two exact matches on opposite corners still leave an even count.
        let found = cell_segments(0.5, UNIT_CELL, [0.5, 1.0, 0.5, 0.0], &mut out);
        assert_eq!(found, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn levels_keep_caller_order_and_out_of_range_levels_are_empty() {
        let spec = GridSpec::new([0.0, 0.0], 1.0, [4, 4]);
        let grid = PotentialGrid::from_fn(spec, |p| p[1]).unwrap();
        let lines = extract_levels(&grid, &[2.5, 100.0, 0.5, 2.5]);
        let levels: Vec<f64> = lines.iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![2.5, 100.0, 0.5, 2.5]);
        assert_eq!(lines[0].segments.len(), 4);
        assert!(lines[1].segments.is_empty());
        assert_eq!(lines[0], lines[3]);
    }

    #[test]
    fn closed_contour_around_single_peak() {
        let spec = GridSpec::new([-2.0, -2.0], 0.25, [16, 16]);
        let f = |p: Vec2| -(p[0] * p[0] + p[1] * p[1]);
        let grid = PotentialGrid::from_fn(spec, f).unwrap();
        let segments = extract_level(&grid, -1.1);
        let radius = 1.1f64.sqrt();
        assert!(segments.len() >= 12);
        for s in &segments {
            for p in [s.start, s.end] {
                // Linear interpolation of a quadratic: close to the circle.
                assert!((geom::length(p) - radius).abs() < 0.05);
            }
        }
    }

    #[test]
    fn infinite_corner_edges_are_skipped() {
        let mut out = Vec::new();
        let found = cell_segments(3.0, UNIT_CELL, [f64::INFINITY, 1.0, 1.0, 5.0], &mut out);
        // Only the top edge (TL 5 -> TR 1) is finite and crossed.
        assert_eq!(found, 1);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_radius_charge_on_node_gives_finite_contours() {
        let snapshot =
            ChargeSnapshot::from_sources(vec![PointChargeSource::new([0.0, 0.0], 1.0, 0.0)])
                .unwrap();
        let eval = FieldEvaluator::new(snapshot, 1.0);
        let spec = GridSpec::centered([0.0, 0.0], 0.5, [8, 8]);
        let grid = PotentialGrid::from_fn(spec, |p| eval.potential_at(p)).unwrap();
        assert_eq!(grid.get(4, 4), f64::INFINITY);

        // Level 3 lies wholly in cells touching the infinite node; level 1.2
        // reaches cells with finite corners.
        for level in [3.0, 1.2] {
            for s in &extract_level(&grid, level) {
                assert!(geom::is_finite(s.start) && geom::is_finite(s.end));
            }
        }
        assert!(!extract_level(&grid, 1.2).is_empty());
    }
}
