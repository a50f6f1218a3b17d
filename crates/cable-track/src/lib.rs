//! Temporal continuity of the fitted cable.
//!
//! Curve fitting itself lives outside this workspace behind [`CurveFitter`].
//! [`frame_errors`] compares two consecutive fits, and [`track_frame`] runs
//! one frame of the whole pipeline (extraction, stitching, parametrization,
//! fitting, comparison) against an explicit [`FrameContext`] that carries the
//! last accepted fit from one frame to the next. [`ChordFitter`] is a
//! piecewise-linear stand-in for demos and tests.

mod chord;
mod errors;
mod params;
mod track;

pub use chord::ChordFitter;
pub use errors::{ContinuityThresholds, FrameErrors, frame_errors};
pub use params::SplineParams;
pub use track::{
    CurveFitter, FrameContext, FrameInput, FrameOutcome, TrackConfig, TrackError, track_frame,
};
