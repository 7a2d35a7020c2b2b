//! Planar geometry helpers for pixel-space simulation.
//!
//! Positions live in pixel space with the origin at the top-left corner of
//! the map and the y axis pointing down. Angles are in degrees; 0° faces
//! +x and 90° faces +y.

use serde::{Deserialize, Serialize};

/// 2D vector in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Straight-line distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.distance(Self::ZERO)
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Rotate the vector about the origin by `degrees`.
    #[must_use]
    pub fn rotated(self, degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Heading from `self` toward `target`, in degrees within `(-180, 180]`.
    #[must_use]
    pub fn heading_to(self, target: Self) -> f32 {
        normalize_angle((target.y - self.y).atan2(target.x - self.x).to_degrees())
    }
}

/// Wrap an angle into `(-180, 180]`.
#[must_use]
pub fn normalize_angle(degrees: f32) -> f32 {
    let mut wrapped = degrees % 360.0;
    if wrapped <= -180.0 {
        wrapped += 360.0;
    } else if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Signed turn needed to go from `facing` to `heading`, within `(-180, 180]`.
#[must_use]
pub fn angle_delta(facing: f32, heading: f32) -> f32 {
    normalize_angle(heading - facing)
}

/// Clamp a signed turn to a per-tick limit. A limit of 0 means unlimited.
#[must_use]
pub fn clamp_turn(delta: f32, max_step: f32) -> f32 {
    if max_step <= 0.0 {
        delta
    } else {
        delta.clamp(-max_step, max_step)
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
