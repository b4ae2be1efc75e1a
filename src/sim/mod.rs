//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (one `Pcg32` per session)
//! - Stable iteration order (agents in spawn order)
//! - No rendering, audio or platform dependencies

pub mod agent;
pub mod collision;
pub mod combat;
pub mod projectile;
pub mod state;
pub mod tick;
pub mod wfc;

pub use agent::{Agent, DamageOutcome, MovementState, broadcast_alert};
pub use collision::{Aabb, Repulsion, agent_repulsion, push_away};
pub use combat::{ArmorOutcome, FloatingScore, PlayerState, ScoreRules};
pub use projectile::{Faction, Projectile};
pub use state::{GameEvent, GamePhase, GameState, SpawnSide};
pub use tick::{TickInput, tick};
pub use wfc::{
    AdjacencyRules, Direction, GenerationStats, TileGrid, TileSet, TileType, WaveFunctionCollapse,
};
