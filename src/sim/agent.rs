//! Hostile agents
//!
//! Two independent state axes drive an agent: movement (walk/idle on a
//! countdown) and combat readiness (alerted after first damage, then able to
//! shoot once its reaction delay has elapsed).

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;

use super::collision::Aabb;
use super::projectile::{Faction, Projectile};
use crate::consts::*;
use crate::settings::SessionConfig;
use crate::weapons::WeaponDef;
use crate::{random_direction, rotate_degrees};

/// Ticks two agents ignore each other after bumping
pub const COLLISION_COOLDOWN_TICKS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementState {
    Walking,
    Idle,
}

/// Result of one damage application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub dealt: i32,
    pub critical: bool,
    pub killed: bool,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    /// Box centre in world space
    pub pos: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub movement: MovementState,
    /// Unit heading while walking
    pub direction: Vec2,
    /// Ticks left in the current movement state
    pub state_timer: u32,
    pub weapon: Option<Arc<WeaponDef>>,
    pub is_alerted: bool,
    /// Ticks until an alerted agent may fire
    pub alert_delay: u32,
    /// Fixed at spawn
    pub reaction_time: u32,
    pub shoot_cooldown: u32,
    pub collision_cooldown: u32,
}

impl Agent {
    /// Roll a fresh agent. Armed agents carry `weapon`.
    pub fn spawn<R: Rng + ?Sized>(
        id: u32,
        pos: Vec2,
        config: &SessionConfig,
        weapon: &Arc<WeaponDef>,
        rng: &mut R,
    ) -> Self {
        let armed = rng.random_bool(config.armed_chance.clamp(0.0, 1.0));
        let mut agent = Self::new(id, pos, config.agent_health, rng);
        if armed {
            agent.arm(weapon.clone());
        }
        agent
    }

    /// Unarmed agent with randomized heading, walk timer and reaction time
    pub fn new<R: Rng + ?Sized>(id: u32, pos: Vec2, health: i32, rng: &mut R) -> Self {
        Self {
            id,
            pos,
            health,
            max_health: health,
            movement: MovementState::Walking,
            direction: random_direction(rng),
            state_timer: rng.random_range(WALK_TICKS_MIN..=WALK_TICKS_MAX),
            weapon: None,
            is_alerted: false,
            alert_delay: 0,
            reaction_time: rng.random_range(REACTION_TICKS_MIN..=REACTION_TICKS_MAX),
            shoot_cooldown: 0,
            collision_cooldown: 0,
        }
    }

    pub fn arm(&mut self, weapon: Arc<WeaponDef>) {
        self.weapon = Some(weapon);
    }

    pub fn has_weapon(&self) -> bool {
        self.weapon.is_some()
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn bounds(&self, size: f32) -> Aabb {
        Aabb::from_center(self.pos, size)
    }

    /// Movement timer expired (or a collision forced a re-roll)
    pub fn change_state<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self.movement {
            MovementState::Walking if rng.random_bool(IDLE_CHANCE) => {
                self.movement = MovementState::Idle;
                self.state_timer = rng.random_range(IDLE_TICKS_MIN..=IDLE_TICKS_MAX);
            }
            MovementState::Walking | MovementState::Idle => {
                self.movement = MovementState::Walking;
                self.direction = random_direction(rng);
                self.state_timer = rng.random_range(WALK_TICKS_MIN..=WALK_TICKS_MAX);
            }
        }
    }

    /// Walk, stay inside the level, run the movement countdown
    pub fn update_movement<R: Rng + ?Sized>(
        &mut self,
        level: &Aabb,
        speed: f32,
        size: f32,
        rng: &mut R,
    ) {
        if self.movement == MovementState::Walking {
            self.pos += self.direction * speed;
        }
        self.pos = level.clamp_center(self.pos, size);

        self.collision_cooldown = self.collision_cooldown.saturating_sub(1);

        self.state_timer = self.state_timer.saturating_sub(1);
        if self.state_timer == 0 {
            self.change_state(rng);
        }
    }

    pub fn tick_cooldowns(&mut self) {
        self.shoot_cooldown = self.shoot_cooldown.saturating_sub(1);
        self.alert_delay = self.alert_delay.saturating_sub(1);
    }

    /// Alerted, armed, reaction delay elapsed and weapon cooled down
    pub fn can_shoot(&self) -> bool {
        self.is_alerted && self.has_weapon() && self.alert_delay == 0 && self.shoot_cooldown == 0
    }

    /// Fire at `target` if eligible and in range.
    ///
    /// Accuracy falls off linearly with distance; the shot is rotated by a
    /// random angle up to `max_aim_jitter_deg * (1 - accuracy)`.
    pub fn try_shoot<R: Rng + ?Sized>(
        &mut self,
        target: Vec2,
        config: &SessionConfig,
        rng: &mut R,
    ) -> Option<Projectile> {
        if !self.can_shoot() {
            return None;
        }
        let weapon = self.weapon.as_ref()?;

        let to_target = target - self.pos;
        let distance = to_target.length();
        if distance >= config.shoot_range || distance <= 0.0 {
            return None;
        }

        let aim = to_target / distance;
        let accuracy = (1.0 - distance / config.accuracy_falloff).clamp(0.0, 1.0);
        let jitter = config.max_aim_jitter_deg * (1.0 - accuracy);
        let angle = if jitter > 0.0 {
            rng.random_range(-jitter..=jitter)
        } else {
            0.0
        };
        let heading = rotate_degrees(aim, angle);

        self.shoot_cooldown = weapon.fire_rate;
        Some(Projectile::new(
            self.pos + aim * config.agent_size,
            heading * config.agent_bullet_speed,
            weapon.damage,
            Faction::Agent,
        ))
    }

    /// Apply damage with a chance of a critical +1. Health floors at 0.
    pub fn take_damage<R: Rng + ?Sized>(
        &mut self,
        amount: i32,
        critical_chance: f64,
        rng: &mut R,
    ) -> DamageOutcome {
        let critical = rng.random_bool(critical_chance.clamp(0.0, 1.0));
        let dealt = amount.max(0) + i32::from(critical);
        self.health = (self.health - dealt).max(0);
        DamageOutcome {
            dealt,
            critical,
            killed: self.is_dead(),
        }
    }

    /// Damage without the critical roll
    pub fn take_damage_plain(&mut self, amount: i32) -> DamageOutcome {
        let dealt = amount.max(0);
        self.health = (self.health - dealt).max(0);
        DamageOutcome {
            dealt,
            critical: false,
            killed: self.is_dead(),
        }
    }

    /// Become alerted. Returns false if already alerted (alerting is permanent).
    pub fn alert(&mut self) -> bool {
        if self.is_alerted {
            return false;
        }
        self.is_alerted = true;
        self.alert_delay = self.reaction_time;
        true
    }

    /// Far-distance culling: more than one viewport off screen in any direction
    pub fn is_far_offscreen(&self, camera: Vec2, viewport: Vec2) -> bool {
        let screen = self.pos - camera;
        screen.x < -viewport.x
            || screen.x > viewport.x * 2.0
            || screen.y < -viewport.y
            || screen.y > viewport.y * 2.0
    }
}

/// One-hop alert broadcast from `agents[source]`.
///
/// Every other armed, unalerted agent strictly within `radius` becomes
/// alerted with its own reaction delay. Newly alerted agents do not
/// re-broadcast. Returns how many agents were alerted.
pub fn broadcast_alert(agents: &mut [Agent], source: usize, radius: f32) -> usize {
    let Some(origin) = agents.get(source).map(|a| a.pos) else {
        return 0;
    };
    let mut alerted = 0;
    for (i, agent) in agents.iter_mut().enumerate() {
        if i == source || !agent.has_weapon() || agent.is_alerted {
            continue;
        }
        if agent.pos.distance(origin) < radius && agent.alert() {
            alerted += 1;
        }
    }
    alerted
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::weapons::tests::test_catalog;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    pub(crate) fn armed_agent(id: u32, pos: Vec2, rng: &mut Pcg32) -> Agent {
        let catalog = test_catalog();
        let mut agent = Agent::new(id, pos, AGENT_HEALTH, rng);
        agent.arm(catalog.default_weapon().clone());
        agent
    }

    #[test]
    fn test_new_agent_ranges() {
        let mut rng = Pcg32::seed_from_u64(5);
        for id in 0..50 {
            let a = Agent::new(id, Vec2::ZERO, 5, &mut rng);
            assert!((WALK_TICKS_MIN..=WALK_TICKS_MAX).contains(&a.state_timer));
            assert!((REACTION_TICKS_MIN..=REACTION_TICKS_MAX).contains(&a.reaction_time));
            assert_eq!(a.movement, MovementState::Walking);
            assert!(!a.has_weapon());
        }
    }

    #[test]
    fn test_cooldown_resets_to_weapon_fire_rate() {
        let mut rng = Pcg32::seed_from_u64(6);
        let config = SessionConfig::default();
        for id in 0..50 {
            let mut a = armed_agent(id, Vec2::ZERO, &mut rng);
            a.alert();
            a.alert_delay = 0;
            assert!(a.try_shoot(Vec2::new(100.0, 0.0), &config, &mut rng).is_some());
            // pistol fire_rate = 20
            assert_eq!(a.shoot_cooldown, 20);
        }
    }

    #[test]
    fn test_state_machine_timers() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut a = Agent::new(1, Vec2::ZERO, 5, &mut rng);
        let mut saw_idle = false;
        for _ in 0..200 {
            a.change_state(&mut rng);
            match a.movement {
                MovementState::Idle => {
                    saw_idle = true;
                    assert!((IDLE_TICKS_MIN..=IDLE_TICKS_MAX).contains(&a.state_timer));
                }
                MovementState::Walking => {
                    assert!((WALK_TICKS_MIN..=WALK_TICKS_MAX).contains(&a.state_timer));
                }
            }
        }
        assert!(saw_idle);
    }

    #[test]
    fn test_idle_always_returns_to_walking() {
        let mut rng = Pcg32::seed_from_u64(12);
        let mut a = Agent::new(1, Vec2::ZERO, 5, &mut rng);
        a.movement = MovementState::Idle;
        a.change_state(&mut rng);
        assert_eq!(a.movement, MovementState::Walking);
    }

    #[test]
    fn test_movement_clamps_to_level() {
        let mut rng = Pcg32::seed_from_u64(13);
        let level = Aabb::new(Vec2::ZERO, Vec2::new(200.0, 200.0));
        let mut a = Agent::new(1, Vec2::new(16.0, 100.0), 5, &mut rng);
        a.direction = Vec2::NEG_X;
        a.state_timer = 100;
        a.update_movement(&level, 2.0, 30.0, &mut rng);
        assert_eq!(a.pos, Vec2::new(15.0, 100.0));
        assert_eq!(a.state_timer, 99);
    }

    #[test]
    fn test_idle_agent_does_not_move() {
        let mut rng = Pcg32::seed_from_u64(14);
        let level = Aabb::new(Vec2::ZERO, Vec2::new(200.0, 200.0));
        let mut a = Agent::new(1, Vec2::new(100.0, 100.0), 5, &mut rng);
        a.movement = MovementState::Idle;
        a.state_timer = 10;
        a.update_movement(&level, 2.0, 30.0, &mut rng);
        assert_eq!(a.pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_plain_damage_kills_at_one_health() {
        let mut rng = Pcg32::seed_from_u64(15);
        let mut a = Agent::new(1, Vec2::ZERO, 1, &mut rng);
        let outcome = a.take_damage_plain(1);
        assert_eq!(a.health, 0);
        assert!(outcome.killed);
        assert!(!outcome.critical);
    }

    #[test]
    fn test_critical_adds_one_and_health_floors() {
        let mut rng = Pcg32::seed_from_u64(16);
        let mut a = Agent::new(1, Vec2::ZERO, 5, &mut rng);
        let outcome = a.take_damage(2, 1.0, &mut rng);
        assert!(outcome.critical);
        assert_eq!(outcome.dealt, 3);
        assert_eq!(a.health, 2);

        let outcome = a.take_damage(10, 0.0, &mut rng);
        assert!(!outcome.critical);
        assert_eq!(a.health, 0);
        assert!(outcome.killed);
    }

    #[test]
    fn test_alert_is_permanent_and_sets_delay() {
        let mut rng = Pcg32::seed_from_u64(17);
        let mut a = armed_agent(1, Vec2::ZERO, &mut rng);
        assert!(a.alert());
        assert_eq!(a.alert_delay, a.reaction_time);
        a.alert_delay = 0;
        assert!(!a.alert());
        assert_eq!(a.alert_delay, 0);
    }

    #[test]
    fn test_broadcast_radius_boundary() {
        let mut rng = Pcg32::seed_from_u64(18);
        let mut agents = vec![
            armed_agent(1, Vec2::new(0.0, 0.0), &mut rng),
            armed_agent(2, Vec2::new(199.0, 0.0), &mut rng),
            armed_agent(3, Vec2::new(0.0, 201.0), &mut rng),
        ];
        agents[0].alert();
        let alerted = broadcast_alert(&mut agents, 0, ALERT_RADIUS);
        assert_eq!(alerted, 1);
        assert!(agents[1].is_alerted);
        assert_eq!(agents[1].alert_delay, agents[1].reaction_time);
        assert!(!agents[2].is_alerted);
    }

    #[test]
    fn test_broadcast_skips_unarmed() {
        let mut rng = Pcg32::seed_from_u64(19);
        let mut agents = vec![
            armed_agent(1, Vec2::ZERO, &mut rng),
            Agent::new(2, Vec2::new(10.0, 0.0), 5, &mut rng),
        ];
        assert_eq!(broadcast_alert(&mut agents, 0, ALERT_RADIUS), 0);
        assert!(!agents[1].is_alerted);
    }

    #[test]
    fn test_broadcast_is_one_hop() {
        let mut rng = Pcg32::seed_from_u64(20);
        // 0 -> 1 is in range, 1 -> 2 is in range, 0 -> 2 is not
        let mut agents = vec![
            armed_agent(1, Vec2::new(0.0, 0.0), &mut rng),
            armed_agent(2, Vec2::new(150.0, 0.0), &mut rng),
            armed_agent(3, Vec2::new(300.0, 0.0), &mut rng),
        ];
        agents[0].alert();
        broadcast_alert(&mut agents, 0, ALERT_RADIUS);
        assert!(agents[1].is_alerted);
        assert!(!agents[2].is_alerted);
    }

    #[test]
    fn test_shooting_requires_alert_and_reaction() {
        let mut rng = Pcg32::seed_from_u64(21);
        let config = SessionConfig::default();
        let mut a = armed_agent(1, Vec2::ZERO, &mut rng);
        let player = Vec2::new(100.0, 0.0);

        assert!(a.try_shoot(player, &config, &mut rng).is_none());

        a.alert();
        assert!(a.try_shoot(player, &config, &mut rng).is_none());

        a.alert_delay = 0;
        let bullet = a.try_shoot(player, &config, &mut rng).unwrap();
        assert_eq!(bullet.owner, Faction::Agent);
        assert_eq!(bullet.damage, 2);
        assert!((bullet.vel.length() - config.agent_bullet_speed).abs() < 1e-4);
        assert_eq!(bullet.pos, Vec2::new(config.agent_size, 0.0));
        assert_eq!(a.shoot_cooldown, a.weapon.as_ref().unwrap().fire_rate);

        // Cooling down
        assert!(a.try_shoot(player, &config, &mut rng).is_none());
    }

    #[test]
    fn test_shooting_range_and_jitter_bound() {
        let mut rng = Pcg32::seed_from_u64(22);
        let config = SessionConfig::default();
        let mut a = armed_agent(1, Vec2::ZERO, &mut rng);
        a.alert();
        a.alert_delay = 0;

        assert!(a.try_shoot(Vec2::new(300.0, 0.0), &config, &mut rng).is_none());

        // At distance 240 accuracy is 0.6, so jitter is at most 8 degrees
        for _ in 0..50 {
            a.shoot_cooldown = 0;
            let bullet = a.try_shoot(Vec2::new(240.0, 0.0), &config, &mut rng).unwrap();
            let angle = bullet.vel.y.atan2(bullet.vel.x).to_degrees();
            assert!(angle.abs() <= 8.0 + 1e-3);
        }
    }

    #[test]
    fn test_far_offscreen() {
        let mut rng = Pcg32::seed_from_u64(23);
        let viewport = Vec2::new(1024.0, 768.0);
        let camera = Vec2::new(500.0, 500.0);
        let mut a = Agent::new(1, Vec2::new(600.0, 600.0), 5, &mut rng);
        assert!(!a.is_far_offscreen(camera, viewport));
        a.pos = Vec2::new(500.0 + 2048.0 + 1.0, 600.0);
        assert!(a.is_far_offscreen(camera, viewport));
        a.pos = Vec2::new(600.0, 500.0 - 768.0 - 1.0);
        assert!(a.is_far_offscreen(camera, viewport));
    }
}
