//! Fixed timestep simulation tick
//!
//! Each tick runs, in order:
//! 1. player input (weapon actions, firing, movement, camera)
//! 2. agent AI, movement, shooting and collisions
//! 3. projectile motion and hit resolution
//! 4. floating score and reload timers
//! 5. spawn admission
//!
//! Removals are deferred: dead agents are dropped with `retain` after the
//! pass that killed them, never while iterating.

use glam::Vec2;

use super::agent::{COLLISION_COOLDOWN_TICKS, broadcast_alert};
use super::collision::{Aabb, agent_repulsion, push_away};
use super::projectile::{advance_all, player_bullet_envelope};
use super::state::{GameEvent, GamePhase, GameState};
use crate::audio::SoundEffect;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction, each axis in -1..=1
    pub movement: Vec2,
    /// Fire toward this world position
    pub fire_at: Option<Vec2>,
    /// Cycle to the next weapon
    pub switch_weapon: bool,
    /// Pick a weapon by name (weapon wheel)
    pub select_weapon: Option<String>,
    pub reload: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused at tick {}", state.time_ticks);
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }

    state.events.clear();

    apply_player_input(state, input);
    update_agents(state);
    resolve_player_bullets(state);
    resolve_agent_bullets(state);
    update_timers(state);
    update_spawning(state);

    if state.player.is_dead() {
        let new_high_score = state.score > state.high_score;
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver {
            score: state.score,
            new_high_score,
        });
        log::info!(
            "Game over at tick {}: score {} (high score {})",
            state.time_ticks,
            state.score,
            state.high_score
        );
    }

    state.time_ticks += 1;
}

fn apply_player_input(state: &mut GameState, input: &TickInput) {
    if let Some(name) = &input.select_weapon {
        state.select_weapon(name);
    }
    if input.switch_weapon {
        state.switch_weapon();
    }
    if input.reload {
        state.reload();
    }
    if let Some(target) = input.fire_at {
        state.fire_player(target);
    }

    let movement = input.movement.clamp(Vec2::NEG_ONE, Vec2::ONE);
    if movement != Vec2::ZERO {
        state.move_player(movement);
    }
    state.update_camera();
}

fn update_agents(state: &mut GameState) {
    // Anything killed outside the bullet pass
    state.agents.retain(|a| !a.is_dead());

    let level = state.level_bounds();
    let viewport = state.viewport();
    let camera = state.camera;
    let player_pos = state.player.pos;
    let player_box = state.player.bounds(state.config.player_size);
    let agent_size = state.config.agent_size;
    let agent_speed = state.config.agent_speed;

    for agent in state.agents.iter_mut() {
        agent.update_movement(&level, agent_speed, agent_size, &mut state.rng);
        agent.tick_cooldowns();

        if let Some(bullet) = agent.try_shoot(player_pos, &state.config, &mut state.rng) {
            if let Some(weapon) = &agent.weapon {
                state
                    .events
                    .push(GameEvent::Sound(SoundEffect::Shot(weapon.sound_id())));
            }
            state.agent_bullets.push(bullet);
        }

        // Contact only shoves, it never damages
        if agent.bounds(agent_size).overlaps(&player_box) {
            agent.pos = level.clamp_center(push_away(player_pos, agent.pos, agent_speed), agent_size);
        }
    }

    let before = state.agents.len();
    state.agents.retain(|a| !a.is_far_offscreen(camera, viewport));
    if state.agents.len() < before {
        log::debug!("Culled {} far agents", before - state.agents.len());
    }

    resolve_agent_collisions(state);
}

fn resolve_agent_collisions(state: &mut GameState) {
    let level = state.level_bounds();
    let size = state.config.agent_size;
    let count = state.agents.len();

    for i in 0..count {
        for j in (i + 1)..count {
            let (left, right) = state.agents.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];
            if a.collision_cooldown > 0 || b.collision_cooldown > 0 {
                continue;
            }
            let Some(repulsion) = agent_repulsion(a.pos, b.pos, size, &mut state.rng) else {
                continue;
            };

            a.change_state(&mut state.rng);
            b.change_state(&mut state.rng);
            a.direction = repulsion.direction;
            b.direction = -repulsion.direction;
            a.pos = level.clamp_center(a.pos + repulsion.separation, size);
            b.pos = level.clamp_center(b.pos - repulsion.separation, size);
            a.collision_cooldown = COLLISION_COOLDOWN_TICKS;
            b.collision_cooldown = COLLISION_COOLDOWN_TICKS;
        }
    }
}

fn resolve_player_bullets(state: &mut GameState) {
    let envelope = player_bullet_envelope(state.camera, state.viewport());
    advance_all(&mut state.player_bullets, &envelope);

    let agent_size = state.config.agent_size;
    let bullets = std::mem::take(&mut state.player_bullets);
    let mut remaining = Vec::with_capacity(bullets.len());

    for bullet in bullets {
        // First live agent in spawn order wins
        let hit = state
            .agents
            .iter()
            .position(|a| !a.is_dead() && a.bounds(agent_size).contains_point(bullet.pos));
        match hit {
            Some(index) => hit_agent(state, index, bullet.damage),
            None => remaining.push(bullet),
        }
    }

    state.player_bullets = remaining;
    state.agents.retain(|a| !a.is_dead());
}

fn hit_agent(state: &mut GameState, index: usize, damage: i32) {
    let critical_chance = state.config.critical_chance;
    let agent = &mut state.agents[index];
    let outcome = agent.take_damage(damage, critical_chance, &mut state.rng);
    let (id, pos) = (agent.id, agent.pos);

    if agent.alert() {
        let alerted = broadcast_alert(&mut state.agents, index, state.config.alert_radius);
        if alerted > 0 {
            log::debug!("Agent {} alerted {} others", id, alerted);
        }
    }

    if !outcome.killed {
        state.events.push(GameEvent::Sound(SoundEffect::Pain));
        return;
    }

    // Distance is measured before the agent leaves the active set
    let score = state.calculate_score(state.player.pos.distance(pos));
    state.score += score;
    state.add_floating_score(score, pos);
    state.events.push(GameEvent::Sound(SoundEffect::Dead));
    state.events.push(GameEvent::AgentKilled { id, pos, score });
    log::debug!(
        "Agent {} killed (+{}{})",
        id,
        score,
        if outcome.critical { ", critical" } else { "" }
    );
}

fn resolve_agent_bullets(state: &mut GameState) {
    let level = state.level_bounds();
    advance_all(&mut state.agent_bullets, &level);

    let player_box = state.player.bounds(state.config.player_size);
    let bullet_size = state.config.bullet_size;
    let mut hits = Vec::new();
    state.agent_bullets.retain(|b| {
        if Aabb::from_center(b.pos, bullet_size).overlaps(&player_box) {
            hits.push(b.damage);
            false
        } else {
            true
        }
    });

    for damage in hits {
        state.damage_player(damage as f32);
        state.events.push(GameEvent::Sound(SoundEffect::Pain));
    }
}

fn update_timers(state: &mut GameState) {
    state.floating_scores.retain_mut(|f| f.advance());

    for slot in state.player.weapons.iter_mut() {
        if slot.advance() {
            state.events.push(GameEvent::Reloaded {
                name: slot.def.name.clone(),
            });
        }
    }
}

fn update_spawning(state: &mut GameState) {
    state.spawn_timer += 1;
    if state.spawn_timer >= state.config.spawn_interval_ticks {
        state.spawn_timer = 0;
        state.spawn_agent();
    }
}
