//! Session tuning
//!
//! Every balance value the simulation reads lives here. Defaults come from
//! [`crate::consts`]; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Tuning for one play session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    // === Geometry ===
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub level_width: f32,
    pub level_height: f32,
    pub tile_size: f32,

    // === Scoring ===
    pub base_score: u64,
    pub max_multiplier: f32,
    /// Clamp the distance multiplier to `[1, max_multiplier]`
    pub clamp_multiplier: bool,

    // === Player ===
    pub player_max_health: f32,
    pub player_max_armor: f32,
    /// Fraction of incoming damage routed to armor (0.0 - 1.0)
    pub armor_effectiveness: f32,
    pub player_size: f32,
    pub player_speed: f32,
    pub player_bullet_speed: f32,
    pub bullet_size: f32,

    // === Agents ===
    pub max_agents: usize,
    pub agent_size: f32,
    pub agent_speed: f32,
    pub agent_health: i32,
    pub agent_bullet_speed: f32,
    pub spawn_interval_ticks: u32,
    pub spawn_margin: f32,
    pub armed_chance: f64,
    pub alert_radius: f32,
    pub shoot_range: f32,
    pub accuracy_falloff: f32,
    pub max_aim_jitter_deg: f32,
    pub critical_chance: f64,

    // === Effects ===
    pub floating_score_ticks: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            level_width: LEVEL_WIDTH,
            level_height: LEVEL_HEIGHT,
            tile_size: TILE_SIZE,

            base_score: BASE_SCORE,
            max_multiplier: MAX_MULTIPLIER,
            clamp_multiplier: true,

            player_max_health: PLAYER_MAX_HEALTH,
            player_max_armor: PLAYER_MAX_ARMOR,
            armor_effectiveness: ARMOR_EFFECTIVENESS,
            player_size: PLAYER_SIZE,
            player_speed: PLAYER_SPEED,
            player_bullet_speed: PLAYER_BULLET_SPEED,
            bullet_size: BULLET_SIZE,

            max_agents: MAX_AGENTS,
            agent_size: AGENT_SIZE,
            agent_speed: AGENT_SPEED,
            agent_health: AGENT_HEALTH,
            agent_bullet_speed: AGENT_BULLET_SPEED,
            spawn_interval_ticks: AGENT_SPAWN_INTERVAL,
            spawn_margin: SPAWN_MARGIN,
            armed_chance: AGENT_ARMED_CHANCE,
            alert_radius: ALERT_RADIUS,
            shoot_range: SHOOT_RANGE,
            accuracy_falloff: ACCURACY_FALLOFF,
            max_aim_jitter_deg: MAX_AIM_JITTER_DEG,
            critical_chance: CRITICAL_CHANCE,

            floating_score_ticks: FLOATING_SCORE_TICKS,
        }
    }
}

impl SessionConfig {
    /// Load a config file, falling back to defaults for omitted fields
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::info!("Loaded session config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate an in-memory JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: "<memory>".into(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometry the level generator and collision code cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("tile_size", self.tile_size),
            ("viewport_width", self.viewport_width),
            ("viewport_height", self.viewport_height),
            ("level_width", self.level_width),
            ("level_height", self.level_height),
            ("agent_size", self.agent_size),
            ("player_size", self.player_size),
        ];
        for (field, value) in sizes {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be finite",
                });
            }
            if value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be positive",
                });
            }
        }
        if !self.spawn_margin.is_finite() || self.spawn_margin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "spawn_margin",
                reason: "must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Tile grid columns
    pub fn grid_width(&self) -> usize {
        ((self.level_width / self.tile_size) as usize).max(1)
    }

    /// Tile grid rows
    pub fn grid_height(&self) -> usize {
        ((self.level_height / self.tile_size) as usize).max(1)
    }

    /// Viewport diagonal, the distance at which the score multiplier peaks
    pub fn max_diagonal(&self) -> f32 {
        (self.viewport_width.powi(2) + self.viewport_height.powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_dimensions() {
        let config = SessionConfig::default();
        assert_eq!(config.grid_width(), 38);
        assert_eq!(config.grid_height(), 29);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SessionConfig::from_json(r#"{ "max_agents": 3, "base_score": 25 }"#).unwrap();
        assert_eq!(config.max_agents, 3);
        assert_eq!(config.base_score, 25);
        assert_eq!(config.agent_size, AGENT_SIZE);
        assert!(config.clamp_multiplier);
    }

    #[test]
    fn test_max_diagonal() {
        let config = SessionConfig {
            viewport_width: 3.0,
            viewport_height: 4.0,
            ..Default::default()
        };
        assert!((config.max_diagonal() - 5.0).abs() < 1e-6);
    }

    fn invalid_field(json: &str) -> &'static str {
        match SessionConfig::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        assert_eq!(invalid_field(r#"{ "tile_size": 0.0 }"#), "tile_size");
        assert_eq!(invalid_field(r#"{ "tile_size": -64.0 }"#), "tile_size");
    }

    #[test]
    fn test_non_positive_viewport_rejected() {
        assert_eq!(invalid_field(r#"{ "viewport_width": 0.0 }"#), "viewport_width");
        assert_eq!(invalid_field(r#"{ "viewport_height": -1.0 }"#), "viewport_height");
    }

    #[test]
    fn test_non_positive_level_rejected() {
        assert_eq!(invalid_field(r#"{ "level_width": 0.0 }"#), "level_width");
        assert_eq!(invalid_field(r#"{ "level_height": -10.0 }"#), "level_height");
    }

    #[test]
    fn test_non_positive_entity_sizes_rejected() {
        assert_eq!(invalid_field(r#"{ "agent_size": 0.0 }"#), "agent_size");
        assert_eq!(invalid_field(r#"{ "player_size": -40.0 }"#), "player_size");
    }

    #[test]
    fn test_negative_spawn_margin_rejected() {
        assert_eq!(invalid_field(r#"{ "spawn_margin": -1.0 }"#), "spawn_margin");
        assert!(SessionConfig::from_json(r#"{ "spawn_margin": 0.0 }"#).is_ok());
    }

    #[test]
    fn test_non_finite_size_rejected() {
        let config = SessionConfig {
            tile_size: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "tile_size",
                reason: "must be finite"
            })
        ));
        let config = SessionConfig {
            level_width: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "level_width", .. })
        ));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("streetfire_bad_config_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "tile_size": 0.0 }"#).unwrap();
        let err = SessionConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Invalid { field: "tile_size", .. }));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = SessionConfig::load("/nonexistent/streetfire/session.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
