//! Game state and core simulation types
//!
//! Everything the simulation needs to advance one tick lives here, in one
//! serializable struct. Render-only data (particles, trails) is skipped
//! during serialization.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::SlotArena;
use crate::consts::*;
use crate::polar_to_cartesian;

/// Which weapon fired a shot or scored a kill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    Bullet,
    Rocket,
}

/// Something that happened during a tick and needs a platform reaction
/// (sound, stats update). Drained by the host once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// A shot left the muzzle
    ShotFired { weapon: WeaponKind },
    /// An enemy was destroyed (score already applied)
    EnemyDown { weapon: WeaponKind },
}

/// The player's cannon, anchored to the bottom center of the viewport
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cannon {
    pub pos: Vec2,
    /// Barrel angle in radians (atan2 convention, +y down)
    pub angle: f32,
}

impl Cannon {
    pub fn new(bounds: Vec2) -> Self {
        Self {
            pos: Vec2::new(bounds.x / 2.0, bounds.y),
            angle: -std::f32::consts::FRAC_PI_2,
        }
    }

    /// World position of the barrel tip; projectiles and muzzle flashes
    /// originate here.
    pub fn muzzle_pos(&self) -> Vec2 {
        self.pos + polar_to_cartesian(CANNON_BARREL_LENGTH, self.angle)
    }
}

/// A straight-flying projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    /// Fixed at launch; bullets never steer
    pub vel: Vec2,
    pub radius: f32,
    /// 1.0 at launch, expires at 0
    pub life: f32,
    /// Position history for rendering (newest first)
    #[serde(skip)]
    pub trail: Vec<Vec2>,
}

impl Bullet {
    pub fn new(pos: Vec2, angle: f32) -> Self {
        Self {
            pos,
            vel: polar_to_cartesian(BULLET_SPEED, angle),
            radius: BULLET_RADIUS,
            life: 1.0,
            trail: Vec::with_capacity(BULLET_TRAIL_LENGTH),
        }
    }

    /// Record current position to trail (call each tick)
    pub fn record_trail(&mut self) {
        self.trail.insert(0, self.pos);
        if self.trail.len() > BULLET_TRAIL_LENGTH {
            self.trail.pop();
        }
    }
}

/// A homing projectile that steers toward the pointer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rocket {
    pub pos: Vec2,
    /// Flight direction in radians; speed is conserved separately
    pub heading: f32,
    pub speed: f32,
    pub radius: f32,
    pub life: f32,
    /// Ticks since launch (drives thrust particle cadence)
    pub age: u32,
    /// Position history for rendering (newest first)
    #[serde(skip)]
    pub trail: Vec<Vec2>,
}

impl Rocket {
    pub fn new(pos: Vec2, angle: f32) -> Self {
        Self {
            pos,
            heading: angle,
            speed: ROCKET_SPEED,
            radius: ROCKET_RADIUS,
            life: 1.0,
            age: 0,
            trail: Vec::with_capacity(ROCKET_TRAIL_LENGTH),
        }
    }

    pub fn vel(&self) -> Vec2 {
        polar_to_cartesian(self.speed, self.heading)
    }

    /// Record current position to trail (call each tick)
    pub fn record_trail(&mut self) {
        self.trail.insert(0, self.pos);
        if self.trail.len() > ROCKET_TRAIL_LENGTH {
            self.trail.pop();
        }
    }
}

/// A falling target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    /// Pixels per tick, straight down
    pub fall_speed: f32,
    pub radius: f32,
    /// Visual rotation in radians
    pub rotation: f32,
    /// Radians per tick, may be negative
    pub spin: f32,
    /// Packed 0xRRGGBB
    pub color: u32,
}

/// A short-lived visual particle (not gameplay-affecting)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Packed 0xRRGGBB
    pub color: u32,
    /// 0-1, decreases by `decay` each tick
    pub life: f32,
    pub decay: f32,
    pub size: f32,
}

/// RNG state wrapper for serialization.
///
/// Each draw derives a fresh generator from the session seed and a draw
/// counter, so replaying the same inputs replays the same rolls without
/// serializing generator internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub draws: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, draws: 0 }
    }

    /// Advance the draw counter and return a generator for one decision.
    pub fn next(&mut self) -> Pcg32 {
        self.draws = self.draws.wrapping_add(1);
        Pcg32::seed_from_u64(
            self.seed
                .wrapping_add(self.draws.wrapping_mul(0x9e3779b97f4a7c15)),
        )
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    /// RNG state
    pub rng_state: RngState,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Score
    pub score: u64,
    /// Total bullets fired this session
    pub bullets_fired: u64,
    /// Total rockets fired this session
    pub rockets_fired: u64,
    /// Ticks until the primary weapon may fire again
    pub bullet_cooldown: u32,
    /// Ticks until the secondary weapon may fire again
    pub rocket_cooldown: u32,
    /// Ticks until the next enemy spawn
    pub spawn_timer: u32,
    /// Current ticks-between-spawns (shrinks toward the floor)
    pub spawn_interval: u32,
    /// Viewport size in CSS pixels
    pub bounds: Vec2,
    /// Player cannon
    pub cannon: Cannon,
    /// Falling targets
    pub enemies: SlotArena<Enemy>,
    /// Straight projectiles
    pub bullets: SlotArena<Bullet>,
    /// Homing projectiles
    pub rockets: SlotArena<Rocket>,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: SlotArena<Particle>,
    /// Events produced this tick, drained by the platform layer
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new session with the given seed and viewport size
    pub fn new(seed: u64, bounds: Vec2) -> Self {
        Self {
            seed,
            rng_state: RngState::new(seed),
            time_ticks: 0,
            score: 0,
            bullets_fired: 0,
            rockets_fired: 0,
            bullet_cooldown: 0,
            rocket_cooldown: 0,
            spawn_timer: SPAWN_INTERVAL_START,
            spawn_interval: SPAWN_INTERVAL_START,
            bounds,
            cannon: Cannon::new(bounds),
            enemies: SlotArena::new(),
            bullets: SlotArena::new(),
            rockets: SlotArena::new(),
            particles: SlotArena::new(),
            events: Vec::new(),
        }
    }

    /// Handle a viewport resize. Re-anchors the cannon; entities in flight
    /// keep their positions and fall to the new cull lines naturally.
    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
        self.cannon.pos = Vec2::new(bounds.x / 2.0, bounds.y);
    }
}
