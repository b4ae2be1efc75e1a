//! Streetfire - a top-down arcade shooter core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (level generation, agents, projectiles, scoring)
//! - `weapons`: Weapon catalog loaded from JSON, per-player weapon slots
//! - `audio`: Fire-and-forget sound service fed by simulation events
//! - `highscores`: Single-integer persisted high score
//! - `settings`: Data-driven session tuning

pub mod audio;
pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;
pub mod weapons;

pub use error::ConfigError;
pub use highscores::{FileHighScore, HighScoreStore, MemoryHighScore};
pub use settings::SessionConfig;
pub use weapons::{WeaponCatalog, WeaponDef, WeaponSlot};

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (one tick per rendered frame)
    pub const TICK_RATE: u32 = 60;

    /// Viewport (camera) dimensions in world units
    pub const VIEWPORT_WIDTH: f32 = 1024.0;
    pub const VIEWPORT_HEIGHT: f32 = 768.0;

    /// Level dimensions in world units
    pub const LEVEL_WIDTH: f32 = 2432.0;
    pub const LEVEL_HEIGHT: f32 = 1856.0;
    pub const TILE_SIZE: f32 = 64.0;

    /// Scoring
    pub const BASE_SCORE: u64 = 10;
    pub const MAX_MULTIPLIER: f32 = 5.0;

    /// Player defaults
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const PLAYER_MAX_ARMOR: f32 = 50.0;
    pub const ARMOR_EFFECTIVENESS: f32 = 0.5;
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const PLAYER_BULLET_SPEED: f32 = 10.0;
    pub const BULLET_SIZE: f32 = 5.0;

    /// Agent defaults
    pub const MAX_AGENTS: usize = 20;
    pub const AGENT_SIZE: f32 = 30.0;
    pub const AGENT_SPEED: f32 = 2.0;
    pub const AGENT_HEALTH: i32 = 5;
    pub const AGENT_BULLET_SPEED: f32 = 5.0;
    /// Ticks between spawn admission attempts
    pub const AGENT_SPAWN_INTERVAL: u32 = 60;
    /// Probability that a freshly spawned agent carries a weapon
    pub const AGENT_ARMED_CHANCE: f64 = 0.1;
    pub const ALERT_RADIUS: f32 = 200.0;
    pub const SHOOT_RANGE: f32 = 300.0;
    /// Distance at which agent accuracy reaches zero
    pub const ACCURACY_FALLOFF: f32 = 600.0;
    /// Angular jitter at zero accuracy (degrees)
    pub const MAX_AIM_JITTER_DEG: f32 = 20.0;
    pub const CRITICAL_CHANCE: f64 = 0.1;
    /// Distance outside the viewport at which agents appear
    pub const SPAWN_MARGIN: f32 = 200.0;

    /// Movement state timers (ticks, inclusive ranges)
    pub const WALK_TICKS_MIN: u32 = 60;
    pub const WALK_TICKS_MAX: u32 = 180;
    pub const IDLE_TICKS_MIN: u32 = 30;
    pub const IDLE_TICKS_MAX: u32 = 90;
    pub const IDLE_CHANCE: f64 = 0.3;
    pub const REACTION_TICKS_MIN: u32 = 30;
    pub const REACTION_TICKS_MAX: u32 = 90;

    /// Floating score lifetime (ticks)
    pub const FLOATING_SCORE_TICKS: u32 = 60;
}

/// Rotate a vector by an angle in degrees (positive = counter-clockwise in math coords)
#[inline]
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Uniformly distributed unit vector
#[inline]
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    Vec2::from_angle(angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_rotate_degrees_quarter_turn() {
        let v = rotate_degrees(Vec2::X, 90.0);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_random_direction_is_unit() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            let d = random_direction(&mut rng);
            assert!((d.length() - 1.0).abs() < 1e-4);
        }
    }
}
