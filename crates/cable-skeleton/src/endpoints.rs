use cable_core::{ImageView, Mask, Point2f, pad_constant};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::stencil::count_neighbors;

/// Integer skeleton pixel in `(x, y)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub x: usize,
    pub y: usize,
}

impl Endpoint {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point2f {
        Point2f::from_pixel(self.x, self.y)
    }

    /// Chebyshev test: both axis differences are at most `gap`.
    pub fn is_within(self, other: Endpoint, gap: usize) -> bool {
        self.x.abs_diff(other.x) <= gap && self.y.abs_diff(other.y) <= gap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Endpoints closer than this on both axes collapse into the first one.
    pub max_px_gap: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { max_px_gap: 3 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointScan {
    pub endpoints: Vec<Endpoint>,
    pub branch_points: Vec<Endpoint>,
    /// Input skeleton with every branch point's 3x3 neighborhood cleared.
    pub skeleton: Mask,
}

pub fn find_ends(skeleton: &ImageView<'_, bool>, cfg: &EndpointConfig) -> EndpointScan {
    let padded = pad_constant(skeleton, 1, false);
    let work = &padded.image;

    let mut candidates = Vec::new();
    let mut branch_points = Vec::new();
    for y in 0..work.height() {
        for x in 0..work.width() {
            if !work.get(x, y).copied().unwrap_or(false) {
                continue;
            }

            let n = count_neighbors(work, x as isize, y as isize);
            // Foreground never lands on the border, so unpadding cannot underflow.
            let px = Endpoint::new(x - padded.pad, y - padded.pad);
            if n < 2 {
                candidates.push(px);
            } else if n > 2 {
                branch_points.push(px);
            }
        }
    }

    let mut endpoints = dedup_endpoints(&candidates, cfg.max_px_gap);

    let mut cleaned = skeleton.to_image();
    for b in &branch_points {
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                cleaned.set(b.x as isize + dx, b.y as isize + dy, false);
            }
        }
        endpoints.retain(|e| !e.is_within(*b, 1));
    }

    debug!(
        "find_ends: {} candidates, {} endpoints, {} branch points",
        candidates.len(),
        endpoints.len(),
        branch_points.len()
    );

    EndpointScan {
        endpoints,
        branch_points,
        skeleton: cleaned,
    }
}

/// Pairwise dedup: a candidate is dropped when any earlier candidate is
/// within `gap`, whether or not that earlier one survives itself.
fn dedup_endpoints(candidates: &[Endpoint], gap: usize) -> Vec<Endpoint> {
    candidates
        .iter()
        .enumerate()
        .filter(|&(j, c)| !candidates[..j].iter().any(|e| e.is_within(*c, gap)))
        .map(|(_, c)| *c)
        .collect()
}
