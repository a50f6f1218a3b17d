use core::f32::consts::PI;

use cable_core::Point2f;
use cable_skeleton::Path;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::merge::merged_parametrization;

/// Cost of a forbidden or consumed endpoint pairing.
const BLOCKED: f32 = f32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    /// Weight `m` of the Euclidean term; `1 - m` goes to angular continuity.
    pub spatial_weight: f32,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            spatial_weight: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("endpoint matching did not settle within {limit} iterations")]
    IterationLimit { limit: usize },
    #[error("no open chain end among {paths} paths ({connections} connections)")]
    NoChainStart { paths: usize, connections: usize },
}

/// Match between two extremities, indexed `[begins..., ends...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub a: usize,
    pub b: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StitchedSequence {
    /// Chain order; each path oriented so its end meets the next begin.
    pub paths: Vec<Path>,
    /// Input indices the chain never reached (empty paths, stray fragments).
    pub unreached: Vec<usize>,
}

impl StitchedSequence {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn num_points(&self) -> usize {
        self.paths.iter().map(Path::num_points).sum()
    }

    /// All samples of the chain in traversal order.
    pub fn points(&self) -> Vec<Point2f> {
        self.paths
            .iter()
            .flat_map(|p| p.points.iter().copied())
            .collect()
    }

    pub fn parametrization(&self) -> Option<Vec<f32>> {
        merged_parametrization(&self.paths)
    }
}

/// Row-major `2N x 2N` matrix of pairing costs between path extremities.
///
/// Continuations point back at the extremity they attach to, so the angular
/// term `|pi - |da||` vanishes for opposite outward headings.
pub fn connection_costs(paths: &[Path], cfg: &SortConfig) -> Vec<f32> {
    let n = paths.len();
    let m = 2 * n;

    let mut ends = Vec::with_capacity(m);
    let mut dirs = Vec::with_capacity(m);
    for p in paths {
        ends.push(p.begin().unwrap_or_default());
        dirs.push(p.begin_direction());
    }
    for p in paths {
        ends.push(p.end().unwrap_or_default());
        dirs.push(p.end_direction());
    }

    let w = cfg.spatial_weight;
    let mut costs = vec![BLOCKED; m * m];
    for i in 0..m {
        for j in 0..m {
            if i == j || j == (i + n) % m {
                continue;
            }
            let spatial = ends[i].distance(ends[j]);
            let angular = (PI - (dirs[i] - dirs[j]).abs()).abs();
            costs[i * m + j] = w * spatial + (1.0 - w) * angular;
        }
    }
    costs
}

/// Greedy global-minimum matching over a square cost matrix of side `m`.
///
/// Each pick blocks both rows and columns of its extremities. The pick that
/// leaves nothing open would join the last two free extremities and close
/// the chain into a ring, so it is discarded. The loop is bounded by `m`
/// iterations.
pub fn match_endpoints(mut costs: Vec<f32>, m: usize) -> Result<Vec<Connection>, TopologyError> {
    debug_assert_eq!(costs.len(), m * m);

    let mut connections = Vec::new();
    for _ in 0..m {
        let Some((idx, _)) = costs
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c < BLOCKED)
            .fold(None, |best: Option<(usize, f32)>, (i, &c)| match best {
                Some((_, bc)) if bc <= c => best,
                _ => Some((i, c)),
            })
        else {
            return Ok(connections);
        };

        let (a, b) = (idx / m, idx % m);
        for k in 0..m {
            costs[a * m + k] = BLOCKED;
            costs[k * m + a] = BLOCKED;
            costs[b * m + k] = BLOCKED;
            costs[k * m + b] = BLOCKED;
        }

        if costs.iter().all(|&c| c >= BLOCKED) {
            return Ok(connections);
        }
        connections.push(Connection { a, b });
    }

    warn!("match_endpoints: no convergence after {m} iterations");
    Err(TopologyError::IterationLimit { limit: m })
}

/// Orders `paths` into one chain.
///
/// Empty paths cannot be matched and are reported in `unreached`, as are
/// fragments the chain traversal never enters.
pub fn sort_paths(paths: Vec<Path>, cfg: &SortConfig) -> Result<StitchedSequence, TopologyError> {
    let mut unreached = Vec::new();
    let mut indexed = Vec::with_capacity(paths.len());
    for (i, p) in paths.into_iter().enumerate() {
        if p.is_empty() {
            unreached.push(i);
        } else {
            indexed.push((i, p));
        }
    }

    let n = indexed.len();
    if n == 0 {
        return Ok(StitchedSequence {
            paths: Vec::new(),
            unreached,
        });
    }

    let (ids, live): (Vec<usize>, Vec<Path>) = indexed.into_iter().unzip();

    let order = if n == 1 {
        vec![(0, false)]
    } else {
        let connections = match_endpoints(connection_costs(&live, cfg), 2 * n)?;
        debug!(
            "sort_paths: {} paths, {} connections",
            n,
            connections.len()
        );
        linearize(n, &connections)?
    };

    let mut slots: Vec<Option<Path>> = live.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(order.len());
    let mut visited = vec![false; n];
    for (k, flip) in order {
        visited[k] = true;
        if let Some(mut p) = slots[k].take() {
            if flip {
                p.flip();
            }
            ordered.push(p);
        }
    }

    unreached.extend((0..n).filter(|&k| !visited[k]).map(|k| ids[k]));
    unreached.sort_unstable();
    if !unreached.is_empty() {
        warn!(
            "sort_paths: {} paths left out of the chain: {:?}",
            unreached.len(),
            unreached
        );
    }

    Ok(StitchedSequence {
        paths: ordered,
        unreached,
    })
}

/// Walks the matches from the lowest-index path with exactly one connection.
///
/// Returns `(path index, flip)` in chain order. A path is flipped when it is
/// left through its begin copy (index `< n`).
fn linearize(n: usize, connections: &[Connection]) -> Result<Vec<(usize, bool)>, TopologyError> {
    let mut partner = vec![None; 2 * n];
    let mut degree = vec![0_usize; n];
    for c in connections {
        partner[c.a] = Some(c.b);
        partner[c.b] = Some(c.a);
        degree[c.a % n] += 1;
        degree[c.b % n] += 1;
    }

    let start = degree
        .iter()
        .position(|&d| d == 1)
        .ok_or(TopologyError::NoChainStart {
            paths: n,
            connections: connections.len(),
        })?;

    let mut exit = if partner[start].is_some() {
        start
    } else {
        start + n
    };
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    loop {
        let k = exit % n;
        visited[k] = true;
        order.push((k, exit < n));

        let Some(entry) = partner[exit] else {
            break;
        };
        if visited[entry % n] {
            break;
        }
        exit = if entry < n { entry + n } else { entry - n };
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use cable_core::Point2f;
    use cable_skeleton::Path;

    use super::{
        Connection, SortConfig, StitchedSequence, TopologyError, linearize, match_endpoints,
        sort_paths,
    };

    fn horizontal(x0: i32, x1: i32, y: f32) -> Path {
        let step = if x1 >= x0 { 1 } else { -1 };
        let mut xs = Vec::new();
        let mut x = x0;
        loop {
            xs.push(Point2f::new(x as f32, y));
            if x == x1 {
                break;
            }
            x += step;
        }
        Path::from_points(xs)
    }

    fn assert_continuous(seq: &StitchedSequence, max_gap: f32) {
        for w in seq.paths.windows(2) {
            let end = w[0].end().expect("non-empty");
            let begin = w[1].begin().expect("non-empty");
            assert!(
                end.distance(begin) <= max_gap,
                "gap {end:?} -> {begin:?} too large"
            );
        }
    }

    #[test]
    fn adjacent_pair_keeps_order_and_orientation() {
        let a = horizontal(0, 10, 0.0);
        let b = horizontal(12, 22, 0.0);

        let seq = sort_paths(vec![a.clone(), b.clone()], &SortConfig::default())
            .expect("open chain");

        assert_eq!(seq.paths, vec![a, b]);
        assert!(seq.unreached.is_empty());
    }

    #[test]
    fn reverse_adjacency_is_flipped_into_continuity() {
        let a = horizontal(12, 22, 0.0);
        let b = horizontal(0, 10, 0.0);

        let seq = sort_paths(vec![a, b], &SortConfig::default()).expect("open chain");

        assert_eq!(seq.paths.len(), 2);
        assert_continuous(&seq, 2.5);
        assert_eq!(seq.paths[0].begin(), Some(Point2f::new(22.0, 0.0)));
        assert_eq!(seq.paths[1].end(), Some(Point2f::new(0.0, 0.0)));
    }

    #[test]
    fn shuffled_fragments_form_one_chain() {
        let a = horizontal(0, 10, 0.0);
        let b = horizontal(12, 22, 0.0);
        let c = horizontal(24, 34, 0.0);

        let seq = sort_paths(vec![c, a, b], &SortConfig::default()).expect("open chain");

        assert_eq!(seq.paths.len(), 3);
        assert!(seq.unreached.is_empty());
        assert_continuous(&seq, 2.5);
        assert_eq!(seq.num_points(), 33);
    }

    #[test]
    fn heading_outweighs_distance() {
        // `b` starts right next to `a`'s end but runs back alongside it;
        // `c` is further away yet continues straight on.
        let a = horizontal(0, 10, 0.0);
        let b = horizontal(10, 2, 2.0);
        let c = horizontal(16, 26, 0.0);

        let seq = sort_paths(vec![a.clone(), b, c.clone()], &SortConfig::default())
            .expect("open chain");

        let pos_a = seq.paths.iter().position(|p| *p == a);
        let pos_c = seq.paths.iter().position(|p| *p == c);
        assert!(matches!((pos_a, pos_c), (Some(i), Some(j)) if j == i + 1));
    }

    #[test]
    fn single_and_empty_inputs() {
        let seq = sort_paths(Vec::new(), &SortConfig::default()).expect("empty is fine");
        assert!(seq.is_empty());

        let a = horizontal(0, 5, 1.0);
        let seq = sort_paths(vec![Path::default(), a.clone()], &SortConfig::default())
            .expect("single path");
        assert_eq!(seq.paths, vec![a]);
        assert_eq!(seq.unreached, vec![0]);
    }

    #[test]
    fn blocked_matrix_yields_no_connections() {
        let costs = vec![f32::MAX; 16];
        assert_eq!(match_endpoints(costs, 4), Ok(Vec::new()));
    }

    #[test]
    fn closing_pick_is_discarded() {
        // Two paths: 0,1 are begins, 2,3 ends; (2,1) cheapest, (0,3) closes the ring.
        let mut costs = vec![f32::MAX; 16];
        for (i, j, c) in [(1, 2, 0.1), (2, 1, 0.1), (0, 3, 1.0), (3, 0, 1.0)] {
            costs[i * 4 + j] = c;
        }
        let conns = match_endpoints(costs, 4).expect("settles");
        assert_eq!(conns, vec![Connection { a: 1, b: 2 }]);
    }

    #[test]
    fn ring_of_connections_has_no_start() {
        // Path 0 end -> path 1 begin, path 1 end -> path 0 begin.
        let conns = [Connection { a: 2, b: 1 }, Connection { a: 3, b: 0 }];
        assert_eq!(
            linearize(2, &conns),
            Err(TopologyError::NoChainStart {
                paths: 2,
                connections: 2
            })
        );
    }

    #[test]
    fn stray_loop_is_left_unreached() {
        // Paths 0 and 1 close on each other, 2 -> 3 is the open chain.
        let n = 4;
        let conns = [
            Connection { a: 4, b: 1 },
            Connection { a: 5, b: 0 },
            Connection { a: 6, b: 3 },
        ];
        let order = linearize(n, &conns).expect("open chain exists");
        assert_eq!(order, vec![(2, false), (3, false)]);
    }
}
