//! Proximity pair enumeration for the mesh pass.
//!
//! [`proximity_pairs`] returns every unordered node pair closer than the
//! connect distance.  Below [`GRID_MIN_NODES`] it is a plain O(N²) sweep; above
//! it, nodes are bucketed into a [`ProximityGrid`] and only neighbouring cells
//! are compared.
//!
//! ## Cell Size Choice
//!
//! The cell size equals the query distance, so any pair within range lies in
//! the same or an adjacent cell and a 3×3 block covers the whole query.  A
//! smaller cell would widen the block (a quarter-size cell needs 9×9 = 81
//! cells) and lose to brute force at the node counts this field uses.

use crate::constants::GRID_MIN_NODES;
use bevy::prelude::*;
use std::collections::HashMap;

/// Two node indices (`a < b`) and their distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityPair {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
}

/// Uniform grid of node indices.
#[derive(Debug, Clone, Default)]
pub struct ProximityGrid {
    cell_size: f32,
    /// Map from cell coordinates to node index list
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl ProximityGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
        }
    }

    /// Compute grid cell coordinates for a viewport position
    fn world_to_cell(&self, pos: Vec2) -> (i32, i32) {
        let x = (pos.x / self.cell_size).floor() as i32;
        let y = (pos.y / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Insert a node at a position. Call after clear() for bulk rebuild.
    pub fn insert(&mut self, index: usize, pos: Vec2) {
        let cell = self.world_to_cell(pos);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Clear all grid data (call before each rebuild)
    pub fn clear(&mut self) {
        // Retain allocations but clear contents to avoid re-allocating Vec capacity
        for v in self.cells.values_mut() {
            v.clear();
        }
        self.cells.retain(|_, v| !v.is_empty());
    }

    /// Rebuild from a full position list.
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        self.clear();
        for (index, &pos) in positions.iter().enumerate() {
            self.insert(index, pos);
        }
    }

    /// Every pair closer than `max_distance`, sorted by `(a, b)`.
    ///
    /// The grid is a conservative over-approximation; the exact distance check
    /// happens here.
    pub fn pairs_within(&self, positions: &[Vec2], max_distance: f32) -> Vec<ProximityPair> {
        let reach = self.radius_in_cells(max_distance);
        let mut pairs = Vec::new();

        for (&(cx, cy), members) in &self.cells {
            for &a in members {
                for dx in -reach..=reach {
                    for dy in -reach..=reach {
                        let Some(others) = self.cells.get(&(cx + dx, cy + dy)) else {
                            continue;
                        };
                        for &b in others {
                            if b <= a {
                                continue;
                            }
                            let distance = positions[a].distance(positions[b]);
                            if distance < max_distance {
                                pairs.push(ProximityPair { a, b, distance });
                            }
                        }
                    }
                }
            }
        }

        pairs.sort_unstable_by_key(|p| (p.a, p.b));
        pairs
    }

    /// Compute how many cells in each direction we need to check for a given max distance
    fn radius_in_cells(&self, max_distance: f32) -> i32 {
        ((max_distance / self.cell_size).ceil() as i32).max(1)
    }
}

/// O(N²) sweep; yields pairs in `(a, b)` order.
pub fn brute_force_pairs(positions: &[Vec2], max_distance: f32) -> Vec<ProximityPair> {
    let mut pairs = Vec::new();
    for a in 0..positions.len() {
        for b in (a + 1)..positions.len() {
            let distance = positions[a].distance(positions[b]);
            if distance < max_distance {
                pairs.push(ProximityPair { a, b, distance });
            }
        }
    }
    pairs
}

/// All pairs closer than `max_distance`, choosing the cheaper strategy for N.
pub fn proximity_pairs(positions: &[Vec2], max_distance: f32) -> Vec<ProximityPair> {
    if max_distance.is_nan() || max_distance <= 0.0 {
        return Vec::new();
    }
    if positions.len() < GRID_MIN_NODES {
        return brute_force_pairs(positions, max_distance);
    }
    let mut grid = ProximityGrid::new(max_distance);
    grid.rebuild(positions);
    grid.pairs_within(positions, max_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scatter(count: usize, seed: u64) -> Vec<Vec2> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| Vec2::new(rng.gen_range(-50.0..1200.0), rng.gen_range(-50.0..900.0)))
            .collect()
    }

    #[test]
    fn grid_matches_brute_force() {
        let positions = scatter(400, 9);
        let mut grid = ProximityGrid::new(150.0);
        grid.rebuild(&positions);
        let from_grid: Vec<(usize, usize)> = grid
            .pairs_within(&positions, 150.0)
            .iter()
            .map(|p| (p.a, p.b))
            .collect();
        let from_sweep: Vec<(usize, usize)> = brute_force_pairs(&positions, 150.0)
            .iter()
            .map(|p| (p.a, p.b))
            .collect();
        assert!(!from_sweep.is_empty());
        assert_eq!(from_grid, from_sweep);
    }

    #[test]
    fn pairs_are_strictly_below_threshold() {
        let positions = vec![Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(99.0, 0.0)];
        let pairs = brute_force_pairs(&positions, 100.0);
        assert_eq!(pairs.len(), 2, "exactly-at-threshold pair must be excluded: {pairs:?}");
        assert!(pairs.iter().all(|p| p.a < p.b));
    }

    #[test]
    fn clear_then_rebuild_drops_stale_entries() {
        let mut grid = ProximityGrid::new(10.0);
        grid.rebuild(&[Vec2::ZERO, Vec2::new(5.0, 5.0)]);
        let moved = [Vec2::ZERO, Vec2::new(500.0, 500.0)];
        grid.rebuild(&moved);
        assert!(grid.pairs_within(&moved, 10.0).is_empty());
    }

    #[test]
    fn non_positive_threshold_yields_nothing() {
        assert!(proximity_pairs(&[Vec2::ZERO, Vec2::ZERO], 0.0).is_empty());
    }
}
