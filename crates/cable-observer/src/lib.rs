//! Umbrella crate for the `cable-observer` workspace.
//!
//! Re-exports the pipeline stages in data-flow order: masks and geometry,
//! skeleton topology and path walking, stitching, then frame tracking.

pub use cable_core::*;
pub use cable_skeleton::*;
pub use cable_stitch::*;
pub use cable_track::*;
