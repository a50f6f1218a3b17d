use cable_core::{Error, ImageView, Mask, Point2f, linspace, pad_constant, sample_nearest};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::endpoints::Endpoint;
use crate::path::Path;

/// Radial walker parameters.
///
/// `max_steps`, `min_coverage` and `coverage_samples` are empirically tuned;
/// they have no physical meaning beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialWalkConfig {
    /// Expected object half-width `r`; also the step radius.
    pub half_width: usize,
    /// Half-size `d` of the skeleton patch searched around the extrapolation.
    pub search_half_window: usize,
    /// Accepted skeleton pixels lie strictly within `r ± ring_tolerance`.
    pub ring_tolerance: f32,
    pub max_steps: usize,
    /// Minimum fraction of the step segment that must lie on the foreground.
    pub min_coverage: f32,
    pub coverage_samples: usize,
}

impl Default for RadialWalkConfig {
    fn default() -> Self {
        Self {
            half_width: 6,
            search_half_window: 4,
            ring_tolerance: 2.0,
            max_steps: 100,
            min_coverage: 0.8,
            coverage_samples: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadialStop {
    /// Neither the ring search nor the box-edge scan found skeleton ahead.
    NoAim,
    /// The next step would leave the foreground mask.
    LeftObject,
    StepLimit,
    /// The start point lies outside the masks.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadialWalk {
    pub path: Path,
    pub stop: RadialStop,
}

/// Follows a thick object by stepping `half_width` pixels at a time.
///
/// Each step aims at the centroid of skeleton pixels on a ring of radius
/// `half_width` around the current point, restricted to a window around the
/// linear extrapolation of the last step. When that fails (always on the
/// first step) the four edges of the `half_width` box are scanned instead,
/// ignoring hits near the previous point.
pub fn walk_radial(
    foreground: &ImageView<'_, bool>,
    skeleton: &ImageView<'_, bool>,
    start: Endpoint,
    cfg: &RadialWalkConfig,
) -> Result<RadialWalk, Error> {
    if foreground.width() != skeleton.width() || foreground.height() != skeleton.height() {
        return Err(Error::SizeMismatch {
            expected: foreground.width() * foreground.height(),
            actual: skeleton.width() * skeleton.height(),
        });
    }
    if skeleton.get(start.x, start.y).is_none() {
        debug!("walk_radial: start {start:?} outside the masks");
        return Ok(RadialWalk {
            path: Path::default(),
            stop: RadialStop::Empty,
        });
    }

    let r = cfg.half_width;
    let pad = (1.5 * r as f32) as usize;
    let img = pad_constant(foreground, pad, false);
    let skel = pad_constant(skeleton, pad, false);

    let mut points = vec![skel.point_to_padded(start.to_point())];
    let mut length = 0.0_f32;
    let mut stop = RadialStop::StepLimit;

    for i in 0..cfg.max_steps {
        let act = points[points.len() - 1];
        let prev = (points.len() > 1).then(|| points[points.len() - 2]);

        let ring_aim = if i > 0 {
            prev.and_then(|prev| ring_centroid(&skel.image, act, prev, cfg))
        } else {
            None
        };

        let Some(aim) = ring_aim.or_else(|| box_edge_centroid(&skel.image, act, prev, r)) else {
            stop = RadialStop::NoAim;
            break;
        };

        if coverage(&img.image, act, aim, cfg.coverage_samples) < cfg.min_coverage {
            stop = RadialStop::LeftObject;
            break;
        }

        length += act.distance(aim);
        points.push(aim);
    }

    if stop == RadialStop::StepLimit {
        warn!(
            "walk_radial: step cap {} hit from {start:?}",
            cfg.max_steps
        );
    }

    let points = points
        .into_iter()
        .map(|p| skel.point_from_padded(p))
        .collect();

    Ok(RadialWalk {
        path: Path::new(points, length),
        stop,
    })
}

/// Centroid of ring pixels inside the window around the extrapolated point.
///
/// Rejected when empty or when no skeleton pixel touches the rounded centroid.
fn ring_centroid(
    skel: &Mask,
    act: Point2f,
    prev: Point2f,
    cfg: &RadialWalkConfig,
) -> Option<Point2f> {
    let r = cfg.half_width as f32;
    let d = cfg.search_half_window as isize;
    let ahead = act + (act - prev);
    let (cx, cy) = (ahead.x.round() as isize, ahead.y.round() as isize);

    let (mut sx, mut sy, mut count) = (0.0_f32, 0.0_f32, 0_usize);
    for y in cy - d..=cy + d {
        for x in cx - d..=cx + d {
            if !skel.is_set(x, y) {
                continue;
            }
            let dist = Point2f::new(x as f32, y as f32).distance(act);
            if r - cfg.ring_tolerance < dist && dist < r + cfg.ring_tolerance {
                sx += x as f32;
                sy += y as f32;
                count += 1;
            }
        }
    }
    if count == 0 {
        return None;
    }

    let aim = Point2f::new(sx / count as f32, sy / count as f32);
    let (ax, ay) = (aim.x.round() as isize, aim.y.round() as isize);
    let touches = (-1..=1).any(|dy| (-1..=1).any(|dx| skel.is_set(ax + dx, ay + dy)));
    touches.then_some(aim)
}

fn box_edge_centroid(skel: &Mask, act: Point2f, prev: Option<Point2f>, r: usize) -> Option<Point2f> {
    let ri = r as isize;
    let (ax, ay) = (act.x.round() as isize, act.y.round() as isize);

    let mut hits = Vec::new();
    for k in -ri..=ri {
        for (x, y) in [
            (ax - ri, ay + k),
            (ax + k, ay + ri),
            (ax + ri, ay + k),
            (ax + k, ay - ri),
        ] {
            if skel.is_set(x, y) {
                hits.push(Point2f::new(x as f32, y as f32));
            }
        }
    }

    if let Some(prev) = prev {
        let min_manhattan = r as f32 - 1.0;
        hits.retain(|h| (h.x - prev.x).abs() + (h.y - prev.y).abs() >= min_manhattan);
    }
    if hits.is_empty() {
        return None;
    }

    let n = hits.len() as f32;
    let (sx, sy) = hits.iter().fold((0.0, 0.0), |(sx, sy), h| (sx + h.x, sy + h.y));
    Some(Point2f::new(sx / n, sy / n))
}

/// Fraction of `samples` evenly spaced points on `from -> to` lying on the mask.
fn coverage(img: &Mask, from: Point2f, to: Point2f, samples: usize) -> f32 {
    if samples == 0 {
        return 1.0;
    }
    let view = img.as_view();
    let xs = linspace(from.x, to.x, samples);
    let ys = linspace(from.y, to.y, samples);
    let inside = xs
        .iter()
        .zip(&ys)
        .filter(|&(&x, &y)| sample_nearest(&view, Point2f::new(x, y), false))
        .count();
    inside as f32 / samples as f32
}

#[cfg(test)]
mod tests {
    use cable_core::{Error, Mask, Point2f};

    use super::{RadialStop, RadialWalkConfig, walk_radial};
    use crate::endpoints::Endpoint;

    /// Horizontal band `y in 8..=14` over `x in 2..=fg_end`, skeleton on `y = 11`.
    fn band(fg_end: usize, skel_end: usize) -> (Mask, Mask) {
        let (w, h) = (72, 24);
        let mut fg = Mask::new_fill(w, h, false);
        let mut skel = Mask::new_fill(w, h, false);
        for x in 2..=fg_end {
            for y in 8..=14 {
                fg.set(x as isize, y, true);
            }
        }
        for x in 2..=skel_end {
            skel.set(x as isize, 11, true);
        }
        (fg, skel)
    }

    fn cfg() -> RadialWalkConfig {
        RadialWalkConfig {
            half_width: 4,
            search_half_window: 3,
            ..RadialWalkConfig::default()
        }
    }

    #[test]
    fn follows_band_in_fixed_steps() {
        let (fg, skel) = band(60, 60);
        let walk = walk_radial(&fg.as_view(), &skel.as_view(), Endpoint::new(2, 11), &cfg())
            .expect("matching sizes");

        assert_eq!(walk.stop, RadialStop::NoAim);
        assert_eq!(walk.path.num_points(), 15);
        assert_eq!(walk.path.end(), Some(Point2f::new(58.0, 11.0)));
        assert!((walk.path.length - 56.0).abs() < 1e-4);
        assert!(walk.path.points.iter().all(|p| (p.y - 11.0).abs() < 1e-6));
    }

    #[test]
    fn stops_before_leaving_foreground() {
        let (fg, skel) = band(30, 60);
        let walk = walk_radial(&fg.as_view(), &skel.as_view(), Endpoint::new(2, 11), &cfg())
            .expect("matching sizes");

        assert_eq!(walk.stop, RadialStop::LeftObject);
        assert_eq!(walk.path.end(), Some(Point2f::new(30.0, 11.0)));
    }

    #[test]
    fn step_cap_is_reported() {
        let (fg, skel) = band(60, 60);
        let c = RadialWalkConfig {
            max_steps: 3,
            ..cfg()
        };
        let walk = walk_radial(&fg.as_view(), &skel.as_view(), Endpoint::new(2, 11), &c)
            .expect("matching sizes");

        assert_eq!(walk.stop, RadialStop::StepLimit);
        assert_eq!(walk.path.num_points(), 4);
    }

    #[test]
    fn fallback_turns_a_corner_without_stepping_back() {
        // L-shaped band: skeleton along y = 11 up to x = 26, then down x = 26.
        let (w, h) = (48, 48);
        let mut fg = Mask::new_fill(w, h, false);
        let mut skel = Mask::new_fill(w, h, false);
        for x in 2..30 {
            for y in 8..15 {
                fg.set(x, y, true);
            }
        }
        for x in 23..30 {
            for y in 8..44 {
                fg.set(x, y, true);
            }
        }
        for x in 2..=26 {
            skel.set(x, 11, true);
        }
        for y in 12..=40 {
            skel.set(26, y, true);
        }

        let walk = walk_radial(&fg.as_view(), &skel.as_view(), Endpoint::new(2, 11), &cfg())
            .expect("matching sizes");

        // At the corner the ring search finds nothing ahead; the box scan
        // also hits the previous sample at (22, 11), which is ignored.
        let pts = &walk.path.points;
        assert_eq!(walk.stop, RadialStop::NoAim);
        assert_eq!(pts.len(), 14);
        assert_eq!(pts[5], Point2f::new(22.0, 11.0));
        assert_eq!(pts[7], Point2f::new(26.0, 16.0));
        assert!(pts[7..].iter().all(|p| p.x == 26.0));
        assert!(pts[6..].windows(2).all(|w| w[1].y > w[0].y));
        let end = walk.path.end().expect("non-empty");
        assert!((end.y - 39.5).abs() < 1e-4);
    }

    #[test]
    fn mismatched_masks_are_rejected() {
        let fg = Mask::new_fill(8, 8, true);
        let skel = Mask::new_fill(8, 9, false);
        let err = walk_radial(&fg.as_view(), &skel.as_view(), Endpoint::new(0, 0), &cfg())
            .expect_err("size mismatch");
        assert_eq!(
            err,
            Error::SizeMismatch {
                expected: 64,
                actual: 72
            }
        );
    }
}
