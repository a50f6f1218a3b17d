//! 3x3 binary stencil helpers.

use cable_core::Mask;

/// 8-neighborhood offsets `(dx, dy)` in row-major order, center excluded.
pub const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Number of foreground pixels among the 8 neighbors of `(x, y)`.
pub fn count_neighbors(mask: &Mask, x: isize, y: isize) -> usize {
    NEIGHBORS_8
        .iter()
        .filter(|&&(dx, dy)| mask.is_set(x + dx, y + dy))
        .count()
}
