//! Combat and scoring rules
//!
//! Armor soaks a fixed fraction of each hit until it runs out. Kills score
//! more the farther the player was from the agent.

use glam::Vec2;

use super::collision::Aabb;
use crate::settings::SessionConfig;
use crate::weapons::{WeaponCatalog, WeaponSlot};

/// How a hit on the player was split between armor and health
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmorOutcome {
    pub absorbed: f32,
    pub health_lost: f32,
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Box centre in world space
    pub pos: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub armor: f32,
    pub max_armor: f32,
    /// Fraction of each hit routed to armor (0.0 - 1.0)
    pub armor_effectiveness: f32,
    /// One slot per catalog entry, same order
    pub weapons: Vec<WeaponSlot>,
    pub current_weapon: usize,
}

impl PlayerState {
    /// Full health and armor, holding the catalog's default weapon
    pub fn new(pos: Vec2, config: &SessionConfig, catalog: &WeaponCatalog) -> Self {
        let weapons: Vec<WeaponSlot> = catalog.iter().cloned().map(WeaponSlot::new).collect();
        Self {
            pos,
            health: config.player_max_health,
            max_health: config.player_max_health,
            armor: config.player_max_armor,
            max_armor: config.player_max_armor,
            armor_effectiveness: config.armor_effectiveness.clamp(0.0, 1.0),
            weapons,
            current_weapon: catalog.default_index(),
        }
    }

    pub fn weapon(&self) -> Option<&WeaponSlot> {
        self.weapons.get(self.current_weapon)
    }

    pub fn weapon_mut(&mut self) -> Option<&mut WeaponSlot> {
        self.weapons.get_mut(self.current_weapon)
    }

    pub fn bounds(&self, size: f32) -> Aabb {
        Aabb::from_center(self.pos, size)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Apply a hit through the armor model. Health and armor never go negative.
    pub fn damage(&mut self, amount: f32) -> ArmorOutcome {
        let amount = amount.max(0.0);
        let absorbed = if self.armor > 0.0 {
            (amount * self.armor_effectiveness).min(self.armor)
        } else {
            0.0
        };
        let remainder = amount - absorbed;
        let health_before = self.health;

        self.armor = (self.armor - absorbed).max(0.0);
        self.health = (self.health - remainder).max(0.0);

        ArmorOutcome {
            absorbed,
            health_lost: health_before - self.health,
        }
    }
}

/// Distance-scaled kill score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRules {
    pub base_score: u64,
    pub max_multiplier: f32,
    /// Distance at which the multiplier reaches `max_multiplier`
    pub max_diagonal: f32,
    pub clamp: bool,
}

impl ScoreRules {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            base_score: config.base_score,
            max_multiplier: config.max_multiplier,
            max_diagonal: config.max_diagonal(),
            clamp: config.clamp_multiplier,
        }
    }

    /// `1 + (distance / max_diagonal) * (max_multiplier - 1)`
    pub fn multiplier(&self, distance: f32) -> f32 {
        if self.max_diagonal <= 0.0 {
            return 1.0;
        }
        let m = 1.0 + (distance.max(0.0) / self.max_diagonal) * (self.max_multiplier - 1.0);
        if self.clamp {
            m.clamp(1.0, self.max_multiplier.max(1.0))
        } else {
            m
        }
    }

    pub fn calculate_score(&self, distance: f32) -> u64 {
        (self.base_score as f64 * f64::from(self.multiplier(distance))).floor() as u64
    }
}

/// Score popup left behind by a kill
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingScore {
    pub value: u64,
    pub pos: Vec2,
    pub ticks_remaining: u32,
}

impl FloatingScore {
    /// Drift upward one unit and count down; returns false once expired
    pub fn advance(&mut self) -> bool {
        self.ticks_remaining = self.ticks_remaining.saturating_sub(1);
        self.pos.y -= 1.0;
        self.ticks_remaining > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapons::tests::test_catalog;
    use proptest::prelude::*;

    fn player() -> PlayerState {
        PlayerState::new(Vec2::ZERO, &SessionConfig::default(), &test_catalog())
    }

    #[test]
    fn test_player_starts_with_default_weapon() {
        let p = player();
        assert_eq!(p.weapon().unwrap().def.name, "Pistol");
        assert_eq!(p.weapons.len(), 2);
        assert_eq!(p.health, 100.0);
        assert_eq!(p.armor, 50.0);
    }

    #[test]
    fn test_armor_absorbs_half() {
        let mut p = player();
        let out = p.damage(10.0);
        assert_eq!(out.absorbed, 5.0);
        assert_eq!(p.armor, 45.0);
        assert_eq!(p.health, 95.0);
    }

    #[test]
    fn test_armor_absorption_capped_by_remaining_armor() {
        let mut p = player();
        p.armor = 2.0;
        let out = p.damage(10.0);
        assert_eq!(out.absorbed, 2.0);
        assert_eq!(p.armor, 0.0);
        assert_eq!(p.health, 92.0);
    }

    #[test]
    fn test_no_armor_takes_full_hit() {
        let mut p = player();
        p.armor = 0.0;
        p.damage(30.0);
        assert_eq!(p.health, 70.0);
    }

    #[test]
    fn test_health_floors_at_zero() {
        let mut p = player();
        p.armor = 0.0;
        let out = p.damage(500.0);
        assert_eq!(p.health, 0.0);
        assert_eq!(out.health_lost, 100.0);
        assert!(p.is_dead());
    }

    #[test]
    fn test_score_at_zero_distance_is_base() {
        let rules = ScoreRules::from_config(&SessionConfig::default());
        assert_eq!(rules.calculate_score(0.0), 10);
    }

    #[test]
    fn test_score_at_diagonal_is_max() {
        let rules = ScoreRules::from_config(&SessionConfig::default());
        assert_eq!(rules.calculate_score(rules.max_diagonal), 50);
        // Clamped beyond the diagonal
        assert_eq!(rules.calculate_score(rules.max_diagonal * 3.0), 50);
    }

    #[test]
    fn test_unclamped_multiplier_keeps_growing() {
        let rules = ScoreRules {
            clamp: false,
            ..ScoreRules::from_config(&SessionConfig::default())
        };
        assert_eq!(rules.calculate_score(rules.max_diagonal * 2.0), 90);
    }

    #[test]
    fn test_floating_score_expires() {
        let mut f = FloatingScore {
            value: 10,
            pos: Vec2::new(0.0, 100.0),
            ticks_remaining: 2,
        };
        assert!(f.advance());
        assert!(!f.advance());
        assert_eq!(f.pos.y, 98.0);
    }

    proptest! {
        #[test]
        fn prop_armor_invariant(
            damage in 0.0f32..500.0,
            armor in 0.0f32..50.0,
            health in 0.0f32..100.0,
            effectiveness in 0.0f32..=1.0,
        ) {
            let mut p = player();
            p.armor = armor;
            p.health = health;
            p.armor_effectiveness = effectiveness;
            let out = p.damage(damage);

            prop_assert!(p.armor >= 0.0);
            prop_assert!(p.health >= 0.0);
            let expected = if armor > 0.0 { (damage * effectiveness).min(armor) } else { 0.0 };
            prop_assert!((out.absorbed - expected).abs() < 1e-3);
            prop_assert!(((armor - p.armor) - expected).abs() < 1e-3);
        }

        #[test]
        fn prop_score_monotonic(d1 in 0.0f32..5000.0, d2 in 0.0f32..5000.0, clamp in any::<bool>()) {
            let rules = ScoreRules {
                clamp,
                ..ScoreRules::from_config(&SessionConfig::default())
            };
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            prop_assert!(rules.calculate_score(near) <= rules.calculate_score(far));
        }
    }
}
