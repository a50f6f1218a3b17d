use cable_core::{Point2f, heading_angle};
use serde::{Deserialize, Serialize};

/// Number of samples inward from an extremity used to estimate its heading.
pub const DIRECTION_SPAN: usize = 5;

/// Ordered chain of points tracing one skeleton branch.
///
/// Directions are outward headings: `end_direction` points away from the
/// path past its last point, `begin_direction` away from it before its first
/// point. A continuation of this path therefore starts with a heading
/// roughly opposite to the extremity it attaches to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Path {
    pub points: Vec<Point2f>,
    /// Accumulated Euclidean step length along `points`.
    pub length: f32,
}

impl Path {
    pub fn new(points: Vec<Point2f>, length: f32) -> Self {
        Self { points, length }
    }

    /// Builds a path and measures its polyline length.
    pub fn from_points(points: Vec<Point2f>) -> Self {
        let length = points.windows(2).map(|w| w[0].distance(w[1])).sum();
        Self { points, length }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn begin(&self) -> Option<Point2f> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point2f> {
        self.points.last().copied()
    }

    pub fn begin_direction(&self) -> f32 {
        match self.points.as_slice() {
            [] | [_] => 0.0,
            pts => {
                let inner = pts[DIRECTION_SPAN.min(pts.len() - 1)];
                heading_angle(inner, pts[0])
            }
        }
    }

    pub fn end_direction(&self) -> f32 {
        match self.points.as_slice() {
            [] | [_] => 0.0,
            pts => {
                let last = pts.len() - 1;
                let inner = pts[last - DIRECTION_SPAN.min(last)];
                heading_angle(inner, pts[last])
            }
        }
    }

    /// Reverses traversal order; begin/end and their directions swap.
    pub fn flip(&mut self) {
        self.points.reverse();
    }
}

#[cfg(test)]
mod tests {
    use core::f32::consts::{FRAC_PI_2, PI};

    use cable_core::Point2f;

    use super::Path;

    fn horizontal(x0: usize, x1: usize, y: f32) -> Path {
        Path::from_points((x0..=x1).map(|x| Point2f::new(x as f32, y)).collect())
    }

    #[test]
    fn attributes_of_straight_path() {
        let p = horizontal(0, 10, 2.0);

        assert_eq!(p.num_points(), 11);
        assert!((p.length - 10.0).abs() < 1e-6);
        assert_eq!(p.begin(), Some(Point2f::new(0.0, 2.0)));
        assert_eq!(p.end(), Some(Point2f::new(10.0, 2.0)));
        assert!(p.end_direction().abs() < 1e-6);
        assert!((p.begin_direction().abs() - PI).abs() < 1e-6);
    }

    #[test]
    fn flip_swaps_extremities() {
        let mut p = Path::from_points(vec![
            Point2f::new(0.0, 0.0),
            Point2f::new(0.0, 1.0),
            Point2f::new(0.0, 2.0),
        ]);
        let (b, e) = (p.begin(), p.end());
        let (bd, ed) = (p.begin_direction(), p.end_direction());
        assert!((ed - FRAC_PI_2).abs() < 1e-6);

        p.flip();
        assert_eq!(p.begin(), e);
        assert_eq!(p.end(), b);
        assert_eq!(p.begin_direction(), ed);
        assert_eq!(p.end_direction(), bd);
        assert!((p.length - 2.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_paths_have_finite_directions() {
        assert_eq!(Path::default().begin(), None);
        assert_eq!(Path::default().end_direction(), 0.0);

        let single = Path::from_points(vec![Point2f::new(3.0, 4.0)]);
        assert_eq!(single.begin(), single.end());
        assert_eq!(single.begin_direction(), 0.0);
        assert_eq!(single.length, 0.0);
    }
}
