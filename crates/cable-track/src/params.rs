use serde::{Deserialize, Serialize};

/// Output of an external curve fit, one inner vector per spatial axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplineParams {
    /// Control points.
    pub coeffs: Vec<Vec<f32>>,
    /// Total arc length of the fitted curve.
    pub length: f32,
    /// Fit residual per axis.
    pub residuals: Vec<f32>,
    /// First-derivative samples.
    pub derivatives: Vec<Vec<f32>>,
}

impl SplineParams {
    pub fn num_axes(&self) -> usize {
        self.coeffs.len()
    }
}
