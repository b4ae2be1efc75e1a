//! Game state and session-level operations
//!
//! The tile grid is generated once here and never changes. Everything else is
//! mutated by [`super::tick::tick`].

use std::io;

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::agent::Agent;
use super::collision::Aabb;
use super::combat::{FloatingScore, PlayerState, ScoreRules};
use super::projectile::{Faction, Projectile};
use super::wfc::{GenerationStats, TileGrid, WaveFunctionCollapse};
use crate::audio::SoundEffect;
use crate::highscores::{HighScoreStore, record_if_better};
use crate::settings::SessionConfig;
use crate::weapons::WeaponCatalog;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Player health reached zero
    GameOver,
}

/// Something the frontend should react to (sound, effect, HUD)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundEffect),
    AgentSpawned { id: u32, pos: Vec2 },
    /// Death effect request plus the awarded score
    AgentKilled { id: u32, pos: Vec2, score: u64 },
    PlayerHit { damage: f32 },
    WeaponSwitched { name: String },
    Reloaded { name: String },
    GameOver { score: u64, new_high_score: bool },
}

/// Viewport edge an agent can enter from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnSide {
    Top,
    Bottom,
    Left,
    Right,
}

/// Complete session state
pub struct GameState {
    pub config: SessionConfig,
    catalog: WeaponCatalog,
    /// Session seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Level terrain (read-only after construction)
    pub grid: TileGrid,
    pub generation: GenerationStats,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: PlayerState,
    /// Top-left world coordinate of the viewport
    pub camera: Vec2,
    /// Active agents (spawn order)
    pub agents: Vec<Agent>,
    pub player_bullets: Vec<Projectile>,
    pub agent_bullets: Vec<Projectile>,
    pub floating_scores: Vec<FloatingScore>,
    pub score: u64,
    /// Best score loaded at session start
    pub high_score: u64,
    /// Ticks since the last spawn attempt
    pub spawn_timer: u32,
    /// Events emitted during the most recent tick
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Build a session: generate the level, place the player at its centre
    pub fn new(config: SessionConfig, catalog: WeaponCatalog, seed: u64, high_score: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);

        let wfc = WaveFunctionCollapse::with_default_rules();
        let (grid, generation) =
            wfc.generate_with_stats(config.grid_width(), config.grid_height(), &mut rng);
        log::info!(
            "Generated {}x{} level (seed {}, {} repairs)",
            grid.width(),
            grid.height(),
            seed,
            generation.repairs
        );

        let center = Vec2::new(config.level_width / 2.0, config.level_height / 2.0);
        let player = PlayerState::new(center, &config, &catalog);

        let mut state = Self {
            config,
            catalog,
            seed,
            rng,
            grid,
            generation,
            phase: GamePhase::Playing,
            time_ticks: 0,
            player,
            camera: Vec2::ZERO,
            agents: Vec::new(),
            player_bullets: Vec::new(),
            agent_bullets: Vec::new(),
            floating_scores: Vec::new(),
            score: 0,
            high_score,
            spawn_timer: 0,
            events: Vec::new(),
            next_id: 1,
        };
        state.update_camera();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn catalog(&self) -> &WeaponCatalog {
        &self.catalog
    }

    pub fn viewport(&self) -> Vec2 {
        Vec2::new(self.config.viewport_width, self.config.viewport_height)
    }

    pub fn level_bounds(&self) -> Aabb {
        Aabb::new(
            Vec2::ZERO,
            Vec2::new(self.config.level_width, self.config.level_height),
        )
    }

    pub fn score_rules(&self) -> ScoreRules {
        ScoreRules::from_config(&self.config)
    }

    /// Score for a kill at `distance` from the player
    pub fn calculate_score(&self, distance: f32) -> u64 {
        self.score_rules().calculate_score(distance)
    }

    /// Centre the camera on the player, clamped to the level
    pub fn update_camera(&mut self) {
        let viewport = self.viewport();
        let max = Vec2::new(
            self.config.level_width - viewport.x,
            self.config.level_height - viewport.y,
        )
        .max(Vec2::ZERO);
        self.camera = (self.player.pos - viewport / 2.0).clamp(Vec2::ZERO, max);
    }

    /// Viewport edges far enough from the level border to spawn behind
    pub fn available_spawn_sides(&self) -> Vec<SpawnSide> {
        let margin = self.config.spawn_margin;
        let viewport = self.viewport();
        let mut sides = Vec::with_capacity(4);
        if self.camera.y > margin {
            sides.push(SpawnSide::Top);
        }
        if self.camera.y + viewport.y < self.config.level_height - margin {
            sides.push(SpawnSide::Bottom);
        }
        if self.camera.x > margin {
            sides.push(SpawnSide::Left);
        }
        if self.camera.x + viewport.x < self.config.level_width - margin {
            sides.push(SpawnSide::Right);
        }
        sides
    }

    /// Admit one agent just outside a random viewport edge.
    ///
    /// No-op when the agent cap is reached or no edge qualifies.
    pub fn spawn_agent(&mut self) -> Option<u32> {
        if self.agents.len() >= self.config.max_agents {
            return None;
        }

        let sides = self.available_spawn_sides();
        let Some(&side) = sides.choose(&mut self.rng) else {
            log::debug!("Spawn skipped: camera covers the level");
            return None;
        };

        let margin = self.config.spawn_margin;
        let viewport = self.viewport();
        let cam = self.camera;
        let pos = match side {
            SpawnSide::Top => Vec2::new(
                self.rng.random_range(cam.x..=cam.x + viewport.x),
                cam.y - margin,
            ),
            SpawnSide::Bottom => Vec2::new(
                self.rng.random_range(cam.x..=cam.x + viewport.x),
                cam.y + viewport.y + margin,
            ),
            SpawnSide::Left => Vec2::new(
                cam.x - margin,
                self.rng.random_range(cam.y..=cam.y + viewport.y),
            ),
            SpawnSide::Right => Vec2::new(
                cam.x + viewport.x + margin,
                self.rng.random_range(cam.y..=cam.y + viewport.y),
            ),
        };

        self.spawn_agent_at(pos)
    }

    /// Admit one agent at `pos` (clamped into the level), subject to the cap
    pub fn spawn_agent_at(&mut self, pos: Vec2) -> Option<u32> {
        if self.agents.len() >= self.config.max_agents {
            return None;
        }
        let pos = self.level_bounds().clamp_center(pos, self.config.agent_size);
        let id = self.next_entity_id();
        let agent = Agent::spawn(
            id,
            pos,
            &self.config,
            self.catalog.default_weapon(),
            &mut self.rng,
        );
        log::debug!("Agent {} spawned at {:?} (armed: {})", id, pos, agent.has_weapon());
        self.agents.push(agent);
        self.events.push(GameEvent::AgentSpawned { id, pos });
        Some(id)
    }

    /// Move the player by `input` (each axis in -1..=1) times player speed.
    ///
    /// The move is rejected if it would overlap an agent.
    pub fn move_player(&mut self, input: Vec2) {
        let size = self.config.player_size;
        let target = self
            .level_bounds()
            .clamp_center(self.player.pos + input * self.config.player_speed, size);
        let proposed = Aabb::from_center(target, size);
        let agent_size = self.config.agent_size;
        let blocked = self
            .agents
            .iter()
            .any(|a| proposed.overlaps(&a.bounds(agent_size)));
        if !blocked {
            self.player.pos = target;
            self.update_camera();
        }
    }

    /// Fire the current weapon toward a world-space target
    pub fn fire_player(&mut self, target: Vec2) -> bool {
        let direction = (target - self.player.pos).normalize_or_zero();
        if direction == Vec2::ZERO {
            return false;
        }
        let now = self.time_ticks;
        let Some(slot) = self.player.weapon_mut() else {
            return false;
        };
        if !slot.fire(now) {
            return false;
        }
        let damage = slot.def.damage;
        let sound = slot.def.sound_id();

        let origin = self.player.pos + direction * (self.config.player_size / 2.0);
        self.player_bullets.push(Projectile::new(
            origin,
            direction * self.config.player_bullet_speed,
            damage,
            Faction::Player,
        ));
        self.events.push(GameEvent::Sound(SoundEffect::Shot(sound)));
        true
    }

    /// Cycle to the next weapon in catalog order
    pub fn switch_weapon(&mut self) {
        if self.player.weapons.is_empty() {
            return;
        }
        self.player.current_weapon = (self.player.current_weapon + 1) % self.player.weapons.len();
        self.announce_weapon();
    }

    /// Select a weapon by name (weapon wheel). Unknown names leave the
    /// current weapon in hand and return false.
    pub fn select_weapon(&mut self, name: &str) -> bool {
        let Some((index, _)) = self.catalog.by_name(name) else {
            log::debug!("No weapon named {:?}", name);
            return false;
        };
        self.player.current_weapon = index;
        self.announce_weapon();
        true
    }

    fn announce_weapon(&mut self) {
        if let Some(slot) = self.player.weapon() {
            let name = slot.def.name.clone();
            log::debug!("Switched to {}", name);
            self.events.push(GameEvent::Sound(SoundEffect::Switch));
            self.events.push(GameEvent::WeaponSwitched { name });
        }
    }

    pub fn reload(&mut self) -> bool {
        self.player.weapon_mut().is_some_and(|slot| slot.begin_reload())
    }

    /// Apply a hit to the player through the armor model
    pub fn damage_player(&mut self, amount: f32) {
        let outcome = self.player.damage(amount);
        self.events.push(GameEvent::PlayerHit {
            damage: outcome.health_lost,
        });
    }

    pub fn add_floating_score(&mut self, value: u64, pos: Vec2) {
        self.floating_scores.push(FloatingScore {
            value,
            pos,
            ticks_remaining: self.config.floating_score_ticks,
        });
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Persist the score if it beats the loaded high score. Returns true if saved.
    pub fn update_high_score<S: HighScoreStore + ?Sized>(&mut self, store: &mut S) -> io::Result<bool> {
        let previous = self.high_score;
        self.high_score = record_if_better(store, previous, self.score)?;
        Ok(self.high_score > previous)
    }

    /// World position to minimap pixels (minimap is 20% of the viewport)
    pub fn world_to_minimap(&self, world: Vec2) -> Vec2 {
        let minimap = self.viewport() * 0.2;
        let scale = minimap / Vec2::new(self.config.level_width, self.config.level_height);
        (world * scale).floor()
    }
}
