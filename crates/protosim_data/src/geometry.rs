use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point or displacement in simulation space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// True only when every component is exactly zero. NaN components are not zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[must_use]
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    #[must_use]
    pub fn distance_squared(&self, other: &Vec3) -> f64 {
        (*self - *other).length_squared()
    }

    #[must_use]
    pub fn distance(&self, other: &Vec3) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Vec3::new(x, y, z)
    }
}

/// Axis-aligned box that devices are distributed in.
///
/// A volume with zero depth is treated as a flat 2D arena at `min.z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::new(100.0, 100.0, 100.0),
        }
    }
}

impl Volume {
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given extent centered on the origin, as the classic
    /// simulator arena. Pass `depth = 0.0` for a 2D arena.
    #[must_use]
    pub fn centered(width: f64, height: f64, depth: f64) -> Self {
        Self {
            min: Vec3::new(-width / 2.0, -height / 2.0, -depth / 2.0),
            max: Vec3::new(width / 2.0, height / 2.0, depth / 2.0),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn depth(&self) -> f64 {
        self.max.z - self.min.z
    }

    #[must_use]
    pub fn is_3d(&self) -> bool {
        self.depth() > 0.0
    }

    #[must_use]
    pub fn contains(&self, p: &Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    #[must_use]
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }
}
