use cable_core::{Point2f, linspace};
use cable_stitch::StitchedSequence;
use serde::{Deserialize, Serialize};

use crate::params::SplineParams;
use crate::track::{CurveFitter, TrackError};

/// Piecewise-linear stand-in for a spline fit.
///
/// Control points are the chain samples nearest to `control_points` evenly
/// spaced parameter values. Residuals are the per-axis RMS distance of every
/// sample to the polyline through the control points at the same parameter;
/// derivatives are the per-segment slopes `d(axis)/dt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChordFitter {
    pub control_points: usize,
}

impl Default for ChordFitter {
    fn default() -> Self {
        Self { control_points: 8 }
    }
}

impl CurveFitter for ChordFitter {
    fn fit(&mut self, sequence: &StitchedSequence, t: &[f32]) -> Result<SplineParams, TrackError> {
        let pts = sequence.points();
        if pts.len() != t.len() {
            return Err(TrackError::Fit(format!(
                "{} samples but {} parameters",
                pts.len(),
                t.len()
            )));
        }
        if pts.len() < 2 {
            return Err(TrackError::Fit("fewer than two samples".into()));
        }

        let knots = linspace(0.0, 1.0, self.control_points.max(2));
        let ctrl: Vec<Point2f> = knots.iter().map(|&k| pts[nearest(t, k)]).collect();

        let length = ctrl.windows(2).map(|w| w[0].distance(w[1])).sum();

        let (mut sx, mut sy) = (0.0_f32, 0.0_f32);
        for (p, &tj) in pts.iter().zip(t) {
            let q = interpolate(&knots, &ctrl, tj);
            sx += (p.x - q.x).powi(2);
            sy += (p.y - q.y).powi(2);
        }
        let n = pts.len() as f32;

        let slope = |f: fn(&Point2f) -> f32| -> Vec<f32> {
            knots
                .windows(2)
                .zip(ctrl.windows(2))
                .map(|(k, c)| (f(&c[1]) - f(&c[0])) / (k[1] - k[0]))
                .collect()
        };

        Ok(SplineParams {
            coeffs: vec![
                ctrl.iter().map(|p| p.x).collect(),
                ctrl.iter().map(|p| p.y).collect(),
            ],
            length,
            residuals: vec![(sx / n).sqrt(), (sy / n).sqrt()],
            derivatives: vec![slope(|p| p.x), slope(|p| p.y)],
        })
    }
}

/// Index of the parameter closest to `target`; `t` is ascending.
fn nearest(t: &[f32], target: f32) -> usize {
    let i = t.partition_point(|&v| v < target);
    if i == 0 {
        0
    } else if i == t.len() || target - t[i - 1] <= t[i] - target {
        i - 1
    } else {
        i
    }
}

fn interpolate(knots: &[f32], ctrl: &[Point2f], t: f32) -> Point2f {
    let k = knots
        .partition_point(|&v| v <= t)
        .clamp(1, knots.len() - 1);
    let (t0, t1) = (knots[k - 1], knots[k]);
    let s = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
    ctrl[k - 1] + (ctrl[k] - ctrl[k - 1]) * s
}

#[cfg(test)]
mod tests {
    use cable_core::Point2f;
    use cable_skeleton::Path;
    use cable_stitch::StitchedSequence;

    use super::{ChordFitter, nearest};
    use crate::track::{CurveFitter, TrackError};

    fn straight_sequence() -> StitchedSequence {
        StitchedSequence {
            paths: vec![Path::from_points(
                (0..=20).map(|x| Point2f::new(x as f32, 3.0)).collect(),
            )],
            unreached: Vec::new(),
        }
    }

    #[test]
    fn straight_chain_fits_exactly() {
        let seq = straight_sequence();
        let t = seq.parametrization().expect("length 20");
        let mut fitter = ChordFitter { control_points: 5 };

        let p = fitter.fit(&seq, &t).expect("enough samples");

        assert_eq!(p.coeffs[0], vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert!(p.coeffs[1].iter().all(|&y| y == 3.0));
        assert!((p.length - 20.0).abs() < 1e-4);
        assert!(p.residuals.iter().all(|&r| r < 1e-4));
        assert!(p.derivatives[0].iter().all(|&d| (d - 20.0).abs() < 1e-3));
        assert!(p.derivatives[1].iter().all(|&d| d.abs() < 1e-6));
    }

    #[test]
    fn mismatched_parameters_fail() {
        let seq = straight_sequence();
        let mut fitter = ChordFitter::default();
        let err = fitter.fit(&seq, &[0.0, 1.0]).expect_err("21 samples");
        assert!(matches!(err, TrackError::Fit(_)));
    }

    #[test]
    fn nearest_picks_closest_sample() {
        let t = [0.0, 0.1, 0.5, 1.0];
        assert_eq!(nearest(&t, 0.0), 0);
        assert_eq!(nearest(&t, 0.26), 1);
        assert_eq!(nearest(&t, 0.31), 2);
        assert_eq!(nearest(&t, 1.0), 3);
    }
}
