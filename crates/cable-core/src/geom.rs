use core::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_pixel(x: usize, y: usize) -> Self {
        Self {
            x: x as f32,
            y: y as f32,
        }
    }

    pub fn distance(self, other: Point2f) -> f32 {
        (self - other).norm()
    }

    /// Nearest integer pixel, or `None` when the point lies left/above the origin.
    pub fn round_to_pixel(self) -> Option<(usize, usize)> {
        let x = self.x.round();
        let y = self.y.round();
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        Some((x as usize, y as usize))
    }
}

impl Vec2f {
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn normalize(self) -> Self {
        let n = self.norm();
        if n == 0.0 {
            Self::default()
        } else {
            self * (1.0 / n)
        }
    }

    /// Angle of the vector in radians, `atan2(y, x)`; zero vector maps to `0.0`.
    pub fn angle(self) -> f32 {
        if self.x == 0.0 && self.y == 0.0 {
            0.0
        } else {
            self.y.atan2(self.x)
        }
    }
}

/// Heading of the direction `from -> to`, in radians.
pub fn heading_angle(from: Point2f, to: Point2f) -> f32 {
    (to - from).angle()
}

/// `n` evenly spaced values over the closed interval `[start, stop]`.
pub fn linspace(start: f32, stop: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f32;
            let mut out: Vec<f32> = (0..n).map(|i| start + step * i as f32).collect();
            out[n - 1] = stop;
            out
        }
    }
}

impl Add<Vec2f> for Point2f {
    type Output = Point2f;

    fn add(self, rhs: Vec2f) -> Self::Output {
        Point2f {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub<Point2f> for Point2f {
    type Output = Vec2f;

    fn sub(self, rhs: Point2f) -> Self::Output {
        Vec2f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Add for Vec2f {
    type Output = Vec2f;

    fn add(self, rhs: Vec2f) -> Self::Output {
        Vec2f {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Mul<f32> for Vec2f {
    type Output = Vec2f;

    fn mul(self, rhs: f32) -> Self::Output {
        Vec2f {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Point2f, Vec2f, heading_angle, linspace};

    #[test]
    fn vec_ops_and_normalize() {
        let a = Vec2f { x: 3.0, y: 4.0 };
        let b = Vec2f { x: 1.0, y: -2.0 };

        assert_eq!(a + b, Vec2f { x: 4.0, y: 2.0 });
        assert!((a.dot(b) + 5.0).abs() < 1e-6);
        assert!((a.norm() - 5.0).abs() < 1e-6);

        let n = a.normalize();
        assert!((n.norm() - 1.0).abs() < 1e-6);

        let z = Vec2f::default().normalize();
        assert_eq!(z, Vec2f::default());
        assert_eq!(Vec2f::default().angle(), 0.0);
    }

    #[test]
    fn point_distance_and_heading() {
        let p = Point2f::new(1.0, 1.0);
        let q = Point2f::new(4.0, 5.0);

        assert!((p.distance(q) - 5.0).abs() < 1e-6);
        assert!((heading_angle(p, Point2f::new(2.0, 1.0))).abs() < 1e-6);
        assert!(
            (heading_angle(p, Point2f::new(0.0, 1.0)) - core::f32::consts::PI).abs() < 1e-6
        );
        assert_eq!(Point2f::new(2.4, 0.6).round_to_pixel(), Some((2, 1)));
        assert_eq!(Point2f::new(-0.6, 3.0).round_to_pixel(), None);
    }

    #[test]
    fn linspace_endpoints_and_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.25, 1.0, 1), vec![0.25]);

        let v = linspace(0.0, 0.3, 4);
        assert_eq!(v.len(), 4);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[3], 0.3);
        assert!((v[1] - 0.1).abs() < 1e-6);
    }
}
