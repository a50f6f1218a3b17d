use cable_core::Error;
use serde::{Deserialize, Serialize};

use crate::params::SplineParams;

/// Absolute differences between two consecutive fits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameErrors {
    pub length_error: f32,
    /// Largest control point change, per axis.
    pub coeffs_error_max: Vec<f32>,
    pub residuals_error: Vec<f32>,
    /// Largest first-derivative change, per axis.
    pub derivatives_error_max: Vec<f32>,
}

/// Upper bounds a caller accepts between consecutive frames.
///
/// Every bound defaults to infinity, which accepts any change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuityThresholds {
    pub max_length_error: f32,
    pub max_coeff_error: f32,
    pub max_derivative_error: f32,
}

impl Default for ContinuityThresholds {
    fn default() -> Self {
        Self {
            max_length_error: f32::INFINITY,
            max_coeff_error: f32::INFINITY,
            max_derivative_error: f32::INFINITY,
        }
    }
}

impl FrameErrors {
    /// Whether every metric stays at or below its bound. NaN never does.
    pub fn within(&self, t: &ContinuityThresholds) -> bool {
        self.length_error <= t.max_length_error
            && self.coeffs_error_max.iter().all(|&e| e <= t.max_coeff_error)
            && self
                .derivatives_error_max
                .iter()
                .all(|&e| e <= t.max_derivative_error)
    }
}

/// Compares `current` against `previous`.
///
/// Both fits must have the same number of axes and samples per axis; a fit
/// of a different shape is reported as [`Error::ShapeMismatch`].
pub fn frame_errors(current: &SplineParams, previous: &SplineParams) -> Result<FrameErrors, Error> {
    check_len("coeffs axes", previous.num_axes(), current.num_axes())?;
    check_len("residuals", previous.residuals.len(), current.residuals.len())?;
    check_len(
        "derivative axes",
        previous.derivatives.len(),
        current.derivatives.len(),
    )?;

    let coeffs_error_max = max_abs_diff_per_axis("coeffs", &current.coeffs, &previous.coeffs)?;
    let derivatives_error_max =
        max_abs_diff_per_axis("derivatives", &current.derivatives, &previous.derivatives)?;
    let residuals_error = current
        .residuals
        .iter()
        .zip(&previous.residuals)
        .map(|(a, b)| (a - b).abs())
        .collect();

    Ok(FrameErrors {
        length_error: (current.length - previous.length).abs(),
        coeffs_error_max,
        residuals_error,
        derivatives_error_max,
    })
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ShapeMismatch {
            what,
            expected,
            actual,
        })
    }
}

fn max_abs_diff_per_axis(
    what: &'static str,
    current: &[Vec<f32>],
    previous: &[Vec<f32>],
) -> Result<Vec<f32>, Error> {
    current
        .iter()
        .zip(previous)
        .map(|(c, p)| {
            check_len(what, p.len(), c.len())?;
            Ok(c.iter()
                .zip(p)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0_f32, f32::max))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use cable_core::Error;

    use super::{ContinuityThresholds, FrameErrors, frame_errors};
    use crate::params::SplineParams;

    fn params() -> SplineParams {
        SplineParams {
            coeffs: vec![vec![0.0, 10.0, 20.0, 30.0], vec![5.0, 6.0, 5.0, 4.0]],
            length: 31.5,
            residuals: vec![0.2, 0.4],
            derivatives: vec![vec![1.0, 1.0, 0.9], vec![0.1, -0.1, 0.0]],
        }
    }

    #[test]
    fn identical_fits_have_zero_errors() {
        let p = params();
        let e = frame_errors(&p, &p).expect("same shape");

        assert_eq!(e.length_error, 0.0);
        assert_eq!(e.coeffs_error_max, vec![0.0, 0.0]);
        assert_eq!(e.residuals_error, vec![0.0, 0.0]);
        assert_eq!(e.derivatives_error_max, vec![0.0, 0.0]);
    }

    #[test]
    fn length_change_only_touches_length_error() {
        let prev = params();
        let curr = SplineParams {
            length: prev.length + 2.5,
            ..prev.clone()
        };
        let e = frame_errors(&curr, &prev).expect("same shape");

        assert!((e.length_error - 2.5).abs() < 1e-6);
        assert!(e.coeffs_error_max.iter().all(|&v| v == 0.0));
        assert!(e.residuals_error.iter().all(|&v| v == 0.0));
        assert!(e.derivatives_error_max.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn maxima_are_taken_per_axis() {
        let prev = params();
        let mut curr = prev.clone();
        curr.coeffs[0][1] = 13.0;
        curr.coeffs[1][3] = 3.5;
        curr.derivatives[1][0] = -0.4;
        curr.residuals[0] = 0.1;

        let e = frame_errors(&curr, &prev).expect("same shape");
        assert_eq!(e.coeffs_error_max, vec![3.0, 0.5]);
        assert!(e.derivatives_error_max[0] == 0.0);
        assert!((e.derivatives_error_max[1] - 0.5).abs() < 1e-6);
        assert!((e.residuals_error[0] - 0.1).abs() < 1e-6);
        assert_eq!(e.residuals_error[1], 0.0);
    }

    #[test]
    fn differing_shapes_are_rejected() {
        let prev = params();
        let mut curr = prev.clone();
        curr.coeffs[1].push(3.0);

        assert_eq!(
            frame_errors(&curr, &prev),
            Err(Error::ShapeMismatch {
                what: "coeffs",
                expected: 4,
                actual: 5
            })
        );

        let three_axes = SplineParams {
            coeffs: vec![vec![0.0]; 3],
            ..prev.clone()
        };
        assert!(matches!(
            frame_errors(&three_axes, &prev),
            Err(Error::ShapeMismatch { what: "coeffs axes", .. })
        ));
    }

    #[test]
    fn thresholds_accept_everything_by_default() {
        let e = FrameErrors {
            length_error: 1e9,
            coeffs_error_max: vec![1e9],
            residuals_error: vec![1e9],
            derivatives_error_max: vec![1e9],
        };
        assert!(e.within(&ContinuityThresholds::default()));

        let tight = ContinuityThresholds {
            max_coeff_error: 1.0,
            ..ContinuityThresholds::default()
        };
        assert!(!e.within(&tight));
    }
}
