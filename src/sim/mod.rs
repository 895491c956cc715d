//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, drawn through the serializable wrapper
//! - Stable iteration order (ascending arena slot)
//! - No rendering or platform dependencies

pub mod arena;
pub mod collision;
pub mod effects;
pub mod state;
pub mod tick;

pub use arena::SlotArena;
pub use collision::circles_overlap;
pub use state::{
    Bullet, Cannon, Enemy, GameEvent, GameState, Particle, RngState, Rocket, WeaponKind,
};
pub use tick::{TickInput, tick};
