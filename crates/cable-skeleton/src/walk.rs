use cable_core::{ImageView, Point2f, pad_constant};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::endpoints::Endpoint;
use crate::path::Path;
use crate::stencil::NEIGHBORS_8;

/// Visited pixels are re-opened this many samples behind the head.
const REOPEN_LAG: usize = 4;
/// Heading is measured from at most this many samples back.
const HEADING_LOOKBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Step cap; `None` derives one from the skeleton's foreground count.
    pub max_steps: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalkStatus {
    /// The chain ran out of unvisited neighbors.
    Completed,
    /// The step cap tripped before the chain ended.
    StepLimit,
    /// The start point is not a skeleton pixel.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Walk {
    pub path: Path,
    pub status: WalkStatus,
}

/// Traces a 1-pixel skeleton from `start`.
///
/// The current pixel is cleared from a working copy so the walk never steps
/// straight back, and the pixel [`REOPEN_LAG`] samples behind is restored so
/// self-crossings stay passable. At forks the neighbor closest to
/// `current + heading` wins, `heading` being the unit vector from up to
/// [`HEADING_LOOKBACK`] samples back to the current pixel.
pub fn walk_skeleton(skeleton: &ImageView<'_, bool>, start: Endpoint, cfg: &WalkConfig) -> Walk {
    if skeleton.get(start.x, start.y) != Some(&true) {
        debug!("walk_skeleton: start {start:?} is not on the skeleton");
        return Walk {
            path: Path::default(),
            status: WalkStatus::Empty,
        };
    }

    let padded = pad_constant(skeleton, 1, false);
    let original = &padded.image;
    let mut work = original.clone();
    let max_steps = cfg
        .max_steps
        .unwrap_or_else(|| 2 * original.foreground_count() + 8);

    let (sx, sy) = padded.to_padded(start.x, start.y);
    let mut chain: Vec<(isize, isize)> = vec![(sx as isize, sy as isize)];
    let mut length = 0.0_f32;
    let mut status = WalkStatus::StepLimit;

    for _ in 0..max_steps {
        let (ax, ay) = chain[chain.len() - 1];
        work.set(ax, ay, false);
        if chain.len() >= REOPEN_LAG {
            let (rx, ry) = chain[chain.len() - REOPEN_LAG];
            if original.is_set(rx, ry) {
                work.set(rx, ry, true);
            }
        }

        let candidates: Vec<(isize, isize)> = NEIGHBORS_8
            .iter()
            .map(|&(dx, dy)| (ax + dx, ay + dy))
            .filter(|&(x, y)| work.is_set(x, y))
            .collect();

        let aim = match candidates.as_slice() {
            [] => {
                status = WalkStatus::Completed;
                break;
            }
            [only] => *only,
            many => straightest(&chain, many),
        };

        length += to_point(chain[chain.len() - 1]).distance(to_point(aim));
        chain.push(aim);
    }

    if status == WalkStatus::StepLimit {
        warn!(
            "walk_skeleton: step cap {max_steps} hit from {start:?} after {} samples",
            chain.len()
        );
    }

    let points = chain
        .into_iter()
        .map(|px| padded.point_from_padded(to_point(px)))
        .collect();

    Walk {
        path: Path::new(points, length),
        status,
    }
}

/// Picks the candidate nearest to the extrapolated next position.
///
/// With fewer than two prior samples, or a zero heading, the extrapolation
/// degenerates to the current pixel, which prefers 4-connected neighbors.
fn straightest(chain: &[(isize, isize)], candidates: &[(isize, isize)]) -> (isize, isize) {
    let act = to_point(chain[chain.len() - 1]);

    let mut target = act;
    if chain.len() >= 3 {
        let origin = to_point(chain[chain.len() - HEADING_LOOKBACK.min(chain.len())]);
        let v = act - origin;
        if v.norm() > 0.0 {
            target = act + v.normalize();
        }
    }

    let mut best = candidates[0];
    let mut best_d = f32::INFINITY;
    for &c in candidates {
        let d = to_point(c).distance(target);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn to_point((x, y): (isize, isize)) -> Point2f {
    Point2f::new(x as f32, y as f32)
}
