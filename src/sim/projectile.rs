//! Bullets
//!
//! Player-fired and agent-fired bullets live in separate collections because
//! they collide with different targets.

use glam::Vec2;

use super::collision::Aabb;

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Player,
    Agent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: i32,
    pub owner: Faction,
}

impl Projectile {
    pub fn new(pos: Vec2, vel: Vec2, damage: i32, owner: Faction) -> Self {
        Self {
            pos,
            vel,
            damage,
            owner,
        }
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
    }
}

/// Region player bullets may occupy: one viewport beyond the camera on every side
pub fn player_bullet_envelope(camera: Vec2, viewport: Vec2) -> Aabb {
    Aabb::new(camera - viewport, camera + viewport * 2.0)
}

/// Move every bullet and drop those that left `envelope`
pub fn advance_all(bullets: &mut Vec<Projectile>, envelope: &Aabb) {
    for bullet in bullets.iter_mut() {
        bullet.advance();
    }
    bullets.retain(|b| !envelope.excludes(b.pos));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_moves_by_velocity() {
        let mut b = Projectile::new(Vec2::new(1.0, 2.0), Vec2::new(10.0, -5.0), 1, Faction::Player);
        b.advance();
        assert_eq!(b.pos, Vec2::new(11.0, -3.0));
    }

    #[test]
    fn test_envelope_culling() {
        let level = Aabb::new(Vec2::ZERO, Vec2::new(100.0, 100.0));
        let mut bullets = vec![
            Projectile::new(Vec2::new(50.0, 50.0), Vec2::new(5.0, 0.0), 1, Faction::Agent),
            Projectile::new(Vec2::new(98.0, 50.0), Vec2::new(5.0, 0.0), 1, Faction::Agent),
            Projectile::new(Vec2::new(2.0, 2.0), Vec2::new(-2.0, -2.0), 1, Faction::Agent),
        ];
        advance_all(&mut bullets, &level);
        assert_eq!(bullets.len(), 2);
        assert_eq!(bullets[0].pos, Vec2::new(55.0, 50.0));
        assert_eq!(bullets[1].pos, Vec2::ZERO);
    }

    #[test]
    fn test_player_envelope_extends_one_viewport() {
        let env = player_bullet_envelope(Vec2::new(100.0, 100.0), Vec2::new(1024.0, 768.0));
        assert_eq!(env.min, Vec2::new(-924.0, -668.0));
        assert_eq!(env.max, Vec2::new(2148.0, 1636.0));
    }
}
