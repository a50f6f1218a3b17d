//! Stitching of independently walked paths into one ordered cable.
//!
//! - [`sort_paths`] matches path extremities greedily on a blended
//!   spatial/directional cost and linearizes the matches into one chain,
//!   flipping paths so that every path is traversed begin to end.
//! - [`merged_parametrization`] spreads `t in [0, 1]` over the chain in
//!   proportion to true arc length; gaps between paths consume their share
//!   of `t` but receive no samples.

mod merge;
mod sort;

pub use merge::{gap_lengths, merged_parametrization};
pub use sort::{
    Connection, SortConfig, StitchedSequence, TopologyError, connection_costs, match_endpoints,
    sort_paths,
};
