//! Layout module - pile grid generation and per-layer jitter
//!
//! Piles are laid out on a centered grid. A round with `total` tiles over
//! `layer_count` layers needs `ceil(total / layer_count)` piles; the grid gets
//! at most `preferred_cols` columns and as many rows as needed, then the used
//! cells are shuffled so pile order carries no spatial pattern.

use crate::geometry::Point;
use crate::rng::SimpleRng;

/// Share of the maximum jitter kept by the front-most layer
const FRONT_LAYER_JITTER_SCALE: f32 = 0.35;

/// Centered grid of `rows * cols` positions, row-major, top row first
pub fn grid_positions(rows: usize, cols: usize, center: Point, spacing: f32) -> Vec<Point> {
    let start_x = center.x - (cols.saturating_sub(1)) as f32 * spacing / 2.0;
    let start_y = center.y + (rows.saturating_sub(1)) as f32 * spacing / 2.0;

    let mut positions = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            positions.push(Point::new(
                start_x + col as f32 * spacing,
                start_y - row as f32 * spacing,
            ));
        }
    }
    positions
}

/// Number of piles needed to hold `total` tiles across `layer_count` layers
pub fn pile_count(total: usize, layer_count: u8) -> usize {
    let layers = usize::from(layer_count.max(1));
    total.div_ceil(layers)
}

/// Shuffled pile positions for `count` piles
pub fn pile_positions(
    count: usize,
    preferred_cols: usize,
    center: Point,
    spacing: f32,
    rng: &mut SimpleRng,
) -> Vec<Point> {
    if count == 0 {
        return Vec::new();
    }
    let cols = preferred_cols.clamp(1, count);
    let rows = count.div_ceil(cols);

    let mut positions = grid_positions(rows, cols, center, spacing);
    positions.truncate(count);
    rng.shuffle(&mut positions);
    positions
}

/// Random offset for a tile on `layer`
///
/// Back layers scatter the most; the front layer keeps 35% of `max_jitter`.
pub fn layer_jitter(layer: u8, layer_count: u8, max_jitter: f32, rng: &mut SimpleRng) -> Point {
    let t = if layer_count > 1 {
        f32::from(layer) / f32::from(layer_count - 1)
    } else {
        0.0
    };
    let amplitude = max_jitter * (1.0 + (FRONT_LAYER_JITTER_SCALE - 1.0) * t);
    Point::new(rng.next_signed(amplitude), rng.next_signed(amplitude))
}
