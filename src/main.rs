//! Streetfire headless launcher
//!
//! Loads the weapon catalog (and an optional session config), then runs a
//! session with the demo autopilot at the fixed tick rate until the player
//! dies or the tick budget runs out.
//!
//! Usage: `streetfire [weapons.json] [session.json]`

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;

use streetfire::audio::{AudioManager, LogAudio};
use streetfire::consts::TICK_RATE;
use streetfire::highscores::{DEFAULT_HIGH_SCORE_FILE, FileHighScore, HighScoreStore};
use streetfire::sim::{GameEvent, GameState, TickInput, tick};
use streetfire::{ConfigError, SessionConfig, WeaponCatalog};

const DEFAULT_CATALOG_FILE: &str = "weapons.json";

/// Five minutes of simulated play
const DEMO_TICKS: u64 = TICK_RATE as u64 * 300;

/// Game instance holding all state
struct Game {
    state: GameState,
    audio: AudioManager<LogAudio>,
    high_scores: FileHighScore,
    kills: u32,
}

impl Game {
    fn new(config: SessionConfig, catalog: WeaponCatalog, seed: u64) -> Self {
        let high_scores = FileHighScore::new(DEFAULT_HIGH_SCORE_FILE);
        let high_score = high_scores.load();
        Self {
            state: GameState::new(config, catalog, seed, high_score),
            audio: AudioManager::new(LogAudio),
            high_scores,
            kills: 0,
        }
    }

    fn update(&mut self) {
        let input = autopilot(&self.state);
        tick(&mut self.state, &input);
        self.audio.handle_events(&self.state.events);

        let events = &self.state.events;
        self.kills += events
            .iter()
            .filter(|e| matches!(e, GameEvent::AgentKilled { .. }))
            .count() as u32;
        if events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })) {
            self.save_high_score();
        }
    }

    fn save_high_score(&mut self) {
        match self.state.update_high_score(&mut self.high_scores) {
            Ok(true) => log::info!(
                "New high score {} written to {}",
                self.state.score,
                self.high_scores.path().display()
            ),
            Ok(false) => {}
            Err(e) => log::error!("Failed to save high score: {}", e),
        }
    }
}

/// Demo mode: strafe around the nearest agent and shoot at it
fn autopilot(state: &GameState) -> TickInput {
    let player = state.player.pos;
    let mut input = TickInput::default();

    let Some(slot) = state.player.weapon() else {
        return input;
    };
    if slot.current_ammo == 0 && !slot.is_reloading() {
        input.reload = true;
    }

    let nearest = state.agents.iter().min_by(|a, b| {
        a.pos
            .distance_squared(player)
            .partial_cmp(&b.pos.distance_squared(player))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    match nearest {
        Some(agent) => {
            let to_agent = agent.pos - player;
            let view = state.viewport();
            if to_agent.x.abs() < view.x / 2.0 && to_agent.y.abs() < view.y / 2.0 {
                input.fire_at = Some(agent.pos);
            }
            // Keep distance (more points), circle otherwise
            let away = -to_agent.normalize_or_zero();
            let strafe = away.perp();
            input.movement = if to_agent.length() < state.config.shoot_range {
                (away + strafe * 0.5).normalize_or_zero()
            } else {
                strafe
            };
        }
        None => {
            // Drift back toward the middle of the level
            let center = Vec2::new(state.config.level_width, state.config.level_height) / 2.0;
            let home = center - player;
            if home.length() > state.config.player_speed {
                input.movement = home.normalize_or_zero();
            }
        }
    }

    input
}

fn load_inputs() -> Result<(SessionConfig, WeaponCatalog), ConfigError> {
    let mut args = std::env::args().skip(1);
    let catalog_path = args.next().unwrap_or_else(|| DEFAULT_CATALOG_FILE.to_string());
    let config = match args.next() {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let catalog = WeaponCatalog::load(catalog_path)?;
    Ok((config, catalog))
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Streetfire (headless) starting...");

    let (config, catalog) = match load_inputs() {
        Ok(inputs) => inputs,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    log::info!("Game initialized with seed: {}", seed);

    let mut game = Game::new(config, catalog, seed);
    while game.state.time_ticks < DEMO_TICKS && !game.state.is_game_over() {
        game.update();
    }

    log::info!(
        "Session ended after {} ticks: score {}, {} kills, health {:.0}",
        game.state.time_ticks,
        game.state.score,
        game.kills,
        game.state.player.health
    );
    if !game.state.is_game_over() {
        game.save_high_score();
    }
    ExitCode::SUCCESS
}
