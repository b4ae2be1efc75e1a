//! Collision detection and response for box-shaped entities
//!
//! Everything in the arena is an axis-aligned square centred on its position.
//! Bullets are points (against agents) or small squares (against the player).

use glam::Vec2;
use rand::Rng;

use crate::random_direction;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square of side `size` centred on `center`
    pub fn from_center(center: Vec2, size: f32) -> Self {
        let half = Vec2::splat(size / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Strict interior test (points on the edge miss)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }

    /// True if the point lies outside the box (edges count as inside)
    pub fn excludes(&self, point: Vec2) -> bool {
        point.x < self.min.x || point.x > self.max.x || point.y < self.min.y || point.y > self.max.y
    }

    /// Strict overlap (touching edges do not collide)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Clamp a point so a square of side `size` centred on it stays inside
    pub fn clamp_center(&self, center: Vec2, size: f32) -> Vec2 {
        let half = Vec2::splat(size / 2.0);
        let lo = self.min + half;
        let hi = (self.max - half).max(lo);
        center.clamp(lo, hi)
    }
}

/// Response to two agents overlapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Repulsion {
    /// New heading for the first agent; the second gets the negation
    pub direction: Vec2,
    /// Offset applied to the first agent; the second moves by the negation
    pub separation: Vec2,
}

/// Check two agents for overlap and compute mutually repelling headings.
///
/// Agents collide when their centres are closer than `size`. Each is pushed
/// half the overlap apart. Coincident agents get a random axis.
pub fn agent_repulsion<R: Rng + ?Sized>(a: Vec2, b: Vec2, size: f32, rng: &mut R) -> Option<Repulsion> {
    let distance = a.distance(b);
    if distance >= size {
        return None;
    }

    let direction = if distance > 0.0 {
        (a - b) / distance
    } else {
        random_direction(rng)
    };

    Some(Repulsion {
        direction,
        separation: direction * (size - distance) / 2.0,
    })
}

/// Push `pos` away from `from` by `amount`. Coincident points are left alone.
pub fn push_away(from: Vec2, pos: Vec2, amount: f32) -> Vec2 {
    let direction = (pos - from).normalize_or_zero();
    pos + direction * amount
}
