//! Foundational primitives for skeleton-based cable tracking.
//!
//! ## Images
//! Images are contiguous and row-major; an [`ImageView`] borrows one.
//! A [`Mask`] is an `Image<bool>` where `true` marks foreground.
//!
//! ## Coordinates
//! Pixel access is `(x, y)` with `x` the column and `y` the row. Geometry
//! uses pixel-center coordinates: integer coordinates refer to pixel centers
//! and nearest-neighbor sampling rounds to the closest integer index.
//!
//! ## Padding
//! Stencil operations pad their input with a constant border (see
//! [`pad_constant`]) so that neighbor lookups never leave the buffer.

mod border;
mod error;
mod geom;
mod image;
mod sample;

pub use border::{Padded, pad_constant};
pub use error::Error;
pub use geom::{Point2f, Vec2f, heading_angle, linspace};
pub use image::{Image, ImageView, Mask};
pub use sample::sample_nearest;
