use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point (or displacement) in reconstruction space. Equality is exact;
/// compare computed points with a tolerance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Self) -> f64 {
        (other - self).norm()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Largest absolute coordinate.
    pub fn max_abs(self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl Add for Point3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Coordinate axis. The principal axis of a reconstruction is the one the
/// soma is considered to be aligned with (pia-to-white-matter direction).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

impl Axis {
    pub fn unit(self) -> Point3 {
        match self {
            Self::X => Point3::new(1.0, 0.0, 0.0),
            Self::Y => Point3::new(0.0, 1.0, 0.0),
            Self::Z => Point3::new(0.0, 0.0, 1.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

/// Surface area of a sphere of the given radius.
pub fn sphere_surface(radius: f64) -> f64 {
    4.0 * std::f64::consts::PI * radius * radius
}

/// Parametric position along `center -> point` where the segment leaves a
/// sphere of `radius` centered at `center`. Range: [0, 1].
///
/// A zero-length segment crosses at the center (0.0); a positive
/// `tolerance` widens that to every segment no longer than it. A point
/// inside the sphere never leaves it, so the fraction saturates at 1.0.
/// A segment whose length overflows also yields 0.0.
pub fn sphere_exit_fraction(center: Point3, radius: f64, point: Point3, tolerance: f64) -> f64 {
    let d = center.distance(point);
    if d <= tolerance || !d.is_finite() {
        return 0.0;
    }
    (radius / d).min(1.0)
}

/// Point at parameter `t` on the segment `from -> to`.
pub fn lerp(from: Point3, to: Point3, t: f64) -> Point3 {
    from + (to - from) * t
}

/// Magnitude of the component of `v` orthogonal to `axis`.
pub fn lateral_offset(v: Point3, axis: Axis) -> f64 {
    let u = axis.unit();
    let along = v.dot(u);
    (v - u * along).norm()
}
