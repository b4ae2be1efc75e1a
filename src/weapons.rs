//! Weapon catalog and per-player weapon state
//!
//! The catalog is loaded once from JSON and is read-only afterwards. Agents
//! and the player share definitions through `Arc`; mutable ammo/reload state
//! lives in [`WeaponSlot`].

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the designated default weapon
pub const DEFAULT_WEAPON: &str = "pistol";

/// Immutable weapon definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub name: String,
    pub damage: i32,
    /// Minimum ticks between shots
    pub fire_rate: u32,
    pub ammo_capacity: u32,
    /// Ticks needed to refill the magazine
    pub reload_time: u32,
    /// Asset path for the renderer
    #[serde(default)]
    pub image: String,
    /// Asset path for the audio service
    #[serde(default)]
    pub sound: String,
}

impl WeaponDef {
    /// Sound id the audio service registers this weapon's shot under
    pub fn sound_id(&self) -> String {
        format!("weapon_{}", self.name.to_lowercase().replace(' ', "_"))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    weapons: Vec<WeaponDef>,
}

/// Ordered, read-only weapon table
#[derive(Debug, Clone)]
pub struct WeaponCatalog {
    weapons: Vec<Arc<WeaponDef>>,
    default_index: usize,
}

impl WeaponCatalog {
    /// Build a catalog from definitions; fails if empty
    pub fn new(weapons: Vec<WeaponDef>) -> Result<Self, ConfigError> {
        if weapons.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let default_index = weapons
            .iter()
            .position(|w| w.name.eq_ignore_ascii_case(DEFAULT_WEAPON))
            .unwrap_or(0);
        Ok(Self {
            weapons: weapons.into_iter().map(Arc::new).collect(),
            default_index,
        })
    }

    /// Load `{"weapons": [...]}` from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::new(file.weapons)?;
        log::info!(
            "Loaded {} weapons from {} (default: {})",
            catalog.len(),
            path.display(),
            catalog.default_weapon().name
        );
        Ok(catalog)
    }

    /// Parse a catalog from an in-memory JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: "<memory>".into(),
            source,
        })?;
        Self::new(file.weapons)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<WeaponDef>> {
        self.weapons.get(index)
    }

    /// Case-insensitive lookup by name
    pub fn by_name(&self, name: &str) -> Option<(usize, &Arc<WeaponDef>)> {
        self.weapons
            .iter()
            .enumerate()
            .find(|(_, w)| w.name.eq_ignore_ascii_case(name))
    }

    /// "pistol" if present, otherwise the first entry
    pub fn default_weapon(&self) -> &Arc<WeaponDef> {
        &self.weapons[self.default_index]
    }

    pub fn default_index(&self) -> usize {
        self.default_index
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<WeaponDef>> {
        self.weapons.iter()
    }
}

/// A weapon in the player's hands: shared definition plus mutable state
#[derive(Debug, Clone)]
pub struct WeaponSlot {
    pub def: Arc<WeaponDef>,
    pub current_ammo: u32,
    /// Tick of the last successful shot (None = never fired)
    pub last_shot_tick: Option<u64>,
    /// Ticks until the magazine is refilled (0 = not reloading)
    pub reload_remaining: u32,
}

impl WeaponSlot {
    pub fn new(def: Arc<WeaponDef>) -> Self {
        let current_ammo = def.ammo_capacity;
        Self {
            def,
            current_ammo,
            last_shot_tick: None,
            reload_remaining: 0,
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_remaining > 0
    }

    /// Fire-rate gate: `now - last_shot >= fire_rate`
    pub fn can_fire(&self, now: u64) -> bool {
        match self.last_shot_tick {
            Some(last) => now.saturating_sub(last) >= u64::from(self.def.fire_rate),
            None => true,
        }
    }

    /// Consume one round if the gate, ammo and reload state allow it
    pub fn fire(&mut self, now: u64) -> bool {
        if self.current_ammo > 0 && !self.is_reloading() && self.can_fire(now) {
            self.current_ammo -= 1;
            self.last_shot_tick = Some(now);
            true
        } else {
            false
        }
    }

    /// Start a timed reload. No-op if full or already reloading.
    pub fn begin_reload(&mut self) -> bool {
        if self.is_reloading() || self.current_ammo >= self.def.ammo_capacity {
            return false;
        }
        if self.def.reload_time == 0 {
            self.current_ammo = self.def.ammo_capacity;
            return true;
        }
        self.reload_remaining = self.def.reload_time;
        true
    }

    /// Advance reload by one tick; returns true when the magazine was refilled
    pub fn advance(&mut self) -> bool {
        if self.reload_remaining == 0 {
            return false;
        }
        self.reload_remaining -= 1;
        if self.reload_remaining == 0 {
            self.current_ammo = self.def.ammo_capacity;
            return true;
        }
        false
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_CATALOG: &str = r#"{
        "weapons": [
            { "name": "Machine Gun", "damage": 1, "fire_rate": 5, "ammo_capacity": 30, "reload_time": 120,
              "image": "images/machinegun.png", "sound": "sounds/mg.wav" },
            { "name": "Pistol", "damage": 2, "fire_rate": 20, "ammo_capacity": 12, "reload_time": 60,
              "image": "images/pistol.png", "sound": "sounds/pistol.wav" }
        ]
    }"#;

    pub(crate) fn test_catalog() -> WeaponCatalog {
        WeaponCatalog::from_json(TEST_CATALOG).unwrap()
    }

    #[test]
    fn test_default_is_pistol_case_insensitive() {
        let catalog = test_catalog();
        assert_eq!(catalog.default_weapon().name, "Pistol");
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_default_falls_back_to_first() {
        let catalog = WeaponCatalog::from_json(
            r#"{ "weapons": [ { "name": "Shotgun", "damage": 4, "fire_rate": 40, "ammo_capacity": 6, "reload_time": 90 } ] }"#,
        )
        .unwrap();
        assert_eq!(catalog.default_weapon().name, "Shotgun");
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let err = WeaponCatalog::from_json(r#"{ "weapons": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCatalog));
    }

    #[test]
    fn test_malformed_catalog_rejected() {
        let err = WeaponCatalog::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_sound_id() {
        let catalog = test_catalog();
        let (_, mg) = catalog.by_name("machine gun").unwrap();
        assert_eq!(mg.sound_id(), "weapon_machine_gun");
    }

    #[test]
    fn test_fire_rate_gate_and_ammo() {
        let catalog = test_catalog();
        let mut slot = WeaponSlot::new(catalog.default_weapon().clone());
        assert!(slot.fire(0));
        assert!(!slot.fire(10)); // fire_rate 20
        assert!(slot.fire(20));
        assert_eq!(slot.current_ammo, 10);
    }

    #[test]
    fn test_empty_magazine_blocks_fire_until_reload() {
        let catalog = test_catalog();
        let mut slot = WeaponSlot::new(catalog.default_weapon().clone());
        slot.current_ammo = 0;
        assert!(!slot.fire(100));

        assert!(slot.begin_reload());
        assert!(!slot.begin_reload());
        for _ in 0..59 {
            assert!(!slot.advance());
            assert!(!slot.fire(1000));
        }
        assert!(slot.advance());
        assert_eq!(slot.current_ammo, 12);
        assert!(slot.fire(1000));
    }
}
