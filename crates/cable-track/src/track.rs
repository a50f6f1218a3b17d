use cable_core::ImageView;
use cable_skeleton::{ExtractConfig, extract_paths};
use cable_stitch::{SortConfig, StitchedSequence, TopologyError, sort_paths};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{ContinuityThresholds, FrameErrors, frame_errors};
use crate::params::SplineParams;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("invalid frame input: {0}")]
    Input(#[from] cable_core::Error),
    #[error("curve fit failed: {0}")]
    Fit(String),
}

/// Fits a parametric curve to an ordered cable.
///
/// `t` holds one parameter per sample of `sequence`, in chain order.
pub trait CurveFitter {
    fn fit(&mut self, sequence: &StitchedSequence, t: &[f32]) -> Result<SplineParams, TrackError>;
}

impl<F> CurveFitter for F
where
    F: FnMut(&StitchedSequence, &[f32]) -> Result<SplineParams, TrackError>,
{
    fn fit(&mut self, sequence: &StitchedSequence, t: &[f32]) -> Result<SplineParams, TrackError> {
        self(sequence, t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub extract: ExtractConfig,
    pub sort: SortConfig,
    pub thresholds: ContinuityThresholds,
    /// After this many consecutive discontinuous frames the latest fit
    /// replaces `previous`; `None` keeps the old fit until the caller
    /// calls [`FrameContext::accept`].
    pub reacquire_after: Option<u32>,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            extract: ExtractConfig::default(),
            sort: SortConfig::default(),
            thresholds: ContinuityThresholds::default(),
            reacquire_after: Some(3),
        }
    }
}

/// State carried from one frame to the next.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameContext {
    /// Fit the next frame is compared with.
    pub previous: Option<SplineParams>,
    /// Number of frames processed so far.
    pub frame_index: u64,
    /// Consecutive [`FrameOutcome::Discontinuous`] frames up to now.
    pub discontinuous_run: u32,
}

impl FrameContext {
    /// Makes `params` the reference for the next frame, e.g. the fit of a
    /// discontinuous frame the caller has judged to be a real move.
    pub fn accept(&mut self, params: SplineParams) {
        self.previous = Some(params);
        self.discontinuous_run = 0;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub skeleton: ImageView<'a, bool>,
    /// Segmentation mask; enables the radial walker when configured.
    pub foreground: Option<ImageView<'a, bool>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Nothing to fit in this frame.
    NoCable,
    Anomalous(TopologyError),
    Failed(TrackError),
    /// The fit moved further than the configured thresholds allow.
    Discontinuous {
        sequence: StitchedSequence,
        t: Vec<f32>,
        params: SplineParams,
        errors: FrameErrors,
    },
    Tracked {
        sequence: StitchedSequence,
        t: Vec<f32>,
        params: SplineParams,
        /// `None` on the first fit, or when its shape differs from the previous one.
        errors: Option<FrameErrors>,
    },
}

impl FrameOutcome {
    pub fn is_tracked(&self) -> bool {
        matches!(self, Self::Tracked { .. })
    }
}

/// Runs one frame and returns the context for the next one.
///
/// A [`FrameOutcome::Tracked`] frame replaces `previous`. A discontinuous
/// frame does so only once it completes a run of `reacquire_after`; every
/// other outcome leaves the last accepted fit in place.
pub fn track_frame<F: CurveFitter>(
    mut ctx: FrameContext,
    input: &FrameInput<'_>,
    fitter: &mut F,
    cfg: &TrackConfig,
) -> (FrameContext, FrameOutcome) {
    let outcome = process(ctx.previous.as_ref(), input, fitter, cfg);

    match &outcome {
        FrameOutcome::Tracked { params, .. } => ctx.accept(params.clone()),
        FrameOutcome::Discontinuous { params, .. } => {
            ctx.discontinuous_run += 1;
            if cfg.reacquire_after.is_some_and(|n| ctx.discontinuous_run >= n) {
                warn!(
                    "track_frame: re-acquiring after {} discontinuous frames",
                    ctx.discontinuous_run
                );
                ctx.accept(params.clone());
            }
        }
        _ => ctx.discontinuous_run = 0,
    }
    debug!(
        "track_frame: frame {} -> {}",
        ctx.frame_index,
        match &outcome {
            FrameOutcome::NoCable => "no cable",
            FrameOutcome::Anomalous(_) => "anomalous",
            FrameOutcome::Failed(_) => "failed",
            FrameOutcome::Discontinuous { .. } => "discontinuous",
            FrameOutcome::Tracked { .. } => "tracked",
        }
    );
    ctx.frame_index += 1;

    (ctx, outcome)
}

fn process<F: CurveFitter>(
    previous: Option<&SplineParams>,
    input: &FrameInput<'_>,
    fitter: &mut F,
    cfg: &TrackConfig,
) -> FrameOutcome {
    let extracted = match extract_paths(&input.skeleton, input.foreground.as_ref(), &cfg.extract) {
        Ok(e) => e,
        Err(e) => return FrameOutcome::Failed(e.into()),
    };
    if extracted.is_empty() {
        return FrameOutcome::NoCable;
    }

    let sequence = match sort_paths(extracted.paths, &cfg.sort) {
        Ok(s) => s,
        Err(e) => {
            warn!("track_frame: {e}");
            return FrameOutcome::Anomalous(e);
        }
    };
    let Some(t) = sequence.parametrization() else {
        return FrameOutcome::NoCable;
    };

    let params = match fitter.fit(&sequence, &t) {
        Ok(p) => p,
        Err(e) => {
            warn!("track_frame: {e}");
            return FrameOutcome::Failed(e);
        }
    };

    let errors = match previous.map(|prev| frame_errors(&params, prev)).transpose() {
        Ok(errors) => errors,
        Err(e) => {
            warn!("track_frame: fit not comparable with the previous one: {e}");
            None
        }
    };

    match errors {
        Some(errors) if !errors.within(&cfg.thresholds) => FrameOutcome::Discontinuous {
            sequence,
            t,
            params,
            errors,
        },
        errors => FrameOutcome::Tracked {
            sequence,
            t,
            params,
            errors,
        },
    }
}
