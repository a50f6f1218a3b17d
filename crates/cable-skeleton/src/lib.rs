//! Skeleton topology and path tracing for a single flexible linear object.
//!
//! Stages, leaf first:
//! - [`find_ends`] classifies skeleton pixels by 8-neighbor count, removes
//!   branch points with their 3x3 neighborhood and deduplicates endpoints.
//! - [`walk_skeleton`] traces a 1-pixel skeleton from an endpoint, resolving
//!   forks by continuing in the straightest direction.
//! - [`walk_radial`] follows a thick foreground mask by stepping a fixed
//!   radius along the skeleton, for noisy skeletons of wide objects.
//! - [`extract_paths`] runs the above once per unclaimed endpoint.
//!
//! Every loop is capped; hitting a cap is reported in the returned status
//! rather than silently truncating.

mod endpoints;
mod extract;
mod path;
mod radial;
mod stencil;
mod walk;

pub use endpoints::{Endpoint, EndpointConfig, EndpointScan, find_ends};
pub use extract::{
    ExtractConfig, ExtractedPaths, claim_reached, extract_paths, remove_close_points,
};
pub use path::{DIRECTION_SPAN, Path};
pub use radial::{RadialStop, RadialWalk, RadialWalkConfig, walk_radial};
pub use stencil::{NEIGHBORS_8, count_neighbors};
pub use walk::{Walk, WalkConfig, WalkStatus, walk_skeleton};
