use cable_core::{Error, ImageView, Point2f};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::endpoints::{Endpoint, EndpointConfig, find_ends};
use crate::path::Path;
use crate::radial::{RadialStop, RadialWalkConfig, walk_radial};
use crate::walk::{WalkConfig, WalkStatus, walk_skeleton};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub endpoints: EndpointConfig,
    pub walk: WalkConfig,
    /// Radial walker settings, used only when a foreground mask is supplied.
    pub radial: Option<RadialWalkConfig>,
    /// Walks shorter than this many samples are discarded.
    pub min_path_points: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            walk: WalkConfig::default(),
            radial: None,
            min_path_points: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedPaths {
    pub paths: Vec<Path>,
    /// Endpoints reported by the detector, before any were claimed.
    pub endpoints: Vec<Endpoint>,
    pub branch_points: Vec<Endpoint>,
    /// Walks that stopped on their step cap.
    pub truncated_walks: usize,
}

impl ExtractedPaths {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A thin walk claims endpoints on or next to its chain.
const THIN_REACH: f32 = 1.5;

/// Drops endpoints closer than `max_px_gap` to `last` on both axes.
pub fn remove_close_points(last: Point2f, ends: &mut Vec<Endpoint>, max_px_gap: f32) {
    ends.retain(|e| {
        let p = e.to_point();
        !((p.x - last.x).abs() < max_px_gap && (p.y - last.y).abs() < max_px_gap)
    });
}

/// Drops endpoints closer than `reach` on both axes to any sample of `path`.
///
/// Only endpoints the walk actually passed are claimed; the start of a
/// neighboring fragment across a gap stays pending.
pub fn claim_reached(path: &Path, ends: &mut Vec<Endpoint>, reach: f32) {
    for &p in &path.points {
        if ends.is_empty() {
            break;
        }
        remove_close_points(p, ends, reach);
    }
}

/// Walks the skeleton once per unclaimed endpoint.
///
/// A thin walk claims the endpoints lying on its chain; a radial walk claims
/// those within `half_width` of one of its samples. Closed loops have no
/// endpoints and yield nothing. The only error is a foreground mask whose
/// size differs from the skeleton's.
pub fn extract_paths(
    skeleton: &ImageView<'_, bool>,
    foreground: Option<&ImageView<'_, bool>>,
    cfg: &ExtractConfig,
) -> Result<ExtractedPaths, Error> {
    if let Some(fg) = foreground
        && (fg.width() != skeleton.width() || fg.height() != skeleton.height())
    {
        return Err(Error::SizeMismatch {
            expected: skeleton.width() * skeleton.height(),
            actual: fg.width() * fg.height(),
        });
    }

    let scan = find_ends(skeleton, &cfg.endpoints);
    let cleaned = scan.skeleton.as_view();

    let mut pending = scan.endpoints.clone();
    let mut paths = Vec::new();
    let mut truncated_walks = 0;

    while !pending.is_empty() {
        let start = pending.remove(0);

        let (path, truncated, reach) = match (foreground, &cfg.radial) {
            (Some(fg), Some(radial)) => {
                let walk = walk_radial(fg, &cleaned, start, radial)?;
                let reach = radial.half_width as f32 + 1.0;
                (walk.path, walk.stop == RadialStop::StepLimit, reach)
            }
            _ => {
                let walk = walk_skeleton(&cleaned, start, &cfg.walk);
                (walk.path, walk.status == WalkStatus::StepLimit, THIN_REACH)
            }
        };

        claim_reached(&path, &mut pending, reach);
        if truncated {
            truncated_walks += 1;
        }
        if path.num_points() >= cfg.min_path_points {
            paths.push(path);
        }
    }

    debug!(
        "extract_paths: {} endpoints -> {} paths ({} truncated)",
        scan.endpoints.len(),
        paths.len(),
        truncated_walks
    );

    Ok(ExtractedPaths {
        paths,
        endpoints: scan.endpoints,
        branch_points: scan.branch_points,
        truncated_walks,
    })
}
