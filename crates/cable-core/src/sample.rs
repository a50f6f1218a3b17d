use crate::geom::Point2f;
use crate::image::ImageView;

/// Nearest-neighbor lookup at a subpixel position; `fill` outside the image.
pub fn sample_nearest<T: Copy>(img: &ImageView<'_, T>, p: Point2f, fill: T) -> T {
    match p.round_to_pixel() {
        Some((x, y)) => img.get(x, y).copied().unwrap_or(fill),
        None => fill,
    }
}
