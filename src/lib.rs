//! Cannonade - a falling-target cannon arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, projectiles, collisions, score)
//! - `renderer`: WebGPU rendering pipelines (game scene + water shader demo)
//! - `audio`: Procedural Web Audio sound effects (wasm only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod renderer;
pub mod sim;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Cannon barrel length in pixels (muzzle offset from the anchor)
    pub const CANNON_BARREL_LENGTH: f32 = 40.0;
    /// Cannon base disc radius
    pub const CANNON_BASE_RADIUS: f32 = 16.0;

    /// Bullet fire cooldown (ticks between shots)
    pub const BULLET_COOLDOWN_TICKS: u32 = 8;
    pub const BULLET_SPEED: f32 = 14.0;
    pub const BULLET_RADIUS: f32 = 4.0;
    /// Life lost per tick; bullets expire after ~83 ticks
    pub const BULLET_LIFE_DECAY: f32 = 0.012;
    /// Maximum bullet trail points to store
    pub const BULLET_TRAIL_LENGTH: usize = 10;
    /// Bullets are culled this far past the viewport edge
    pub const BULLET_CULL_MARGIN: f32 = 40.0;
    pub const BULLET_SCORE: u64 = 10;

    /// Rocket fire cooldown (ticks between shots)
    pub const ROCKET_COOLDOWN_TICKS: u32 = 28;
    pub const ROCKET_SPEED: f32 = 7.0;
    pub const ROCKET_RADIUS: f32 = 6.0;
    pub const ROCKET_LIFE_DECAY: f32 = 0.005;
    /// Maximum rocket trail points to store
    pub const ROCKET_TRAIL_LENGTH: usize = 15;
    /// Fraction of the pointer angle delta applied to heading per tick
    pub const ROCKET_TURN_RATE: f32 = 0.05;
    /// Thrust particle emitted every Nth tick
    pub const ROCKET_THRUST_INTERVAL: u32 = 2;
    /// Rockets get a wider cull margin so homing arcs can swing off-screen
    pub const ROCKET_CULL_MARGIN: f32 = 120.0;
    pub const ROCKET_SCORE: u64 = 25;

    /// Ticks between enemy spawns at session start
    pub const SPAWN_INTERVAL_START: u32 = 90;
    /// Interval shrink per spawn (difficulty ramp)
    pub const SPAWN_INTERVAL_STEP: u32 = 2;
    /// Interval never drops below this
    pub const SPAWN_INTERVAL_FLOOR: u32 = 20;
    pub const ENEMY_MIN_RADIUS: f32 = 14.0;
    pub const ENEMY_MAX_RADIUS: f32 = 26.0;
    /// Fall speed range in pixels per tick
    pub const ENEMY_MIN_FALL_SPEED: f32 = 1.5;
    pub const ENEMY_MAX_FALL_SPEED: f32 = 4.0;
    /// Spin range is +/- this, radians per tick
    pub const ENEMY_MAX_SPIN: f32 = 0.05;
    /// Enemies are culled this far below the bottom edge
    pub const ENEMY_CULL_MARGIN: f32 = 60.0;
    pub const ENEMY_PALETTE: [u32; 5] = [0x4fc3f7, 0x7e57c2, 0x66bb6a, 0xef5350, 0xffca28];

    /// Per-axis particle velocity decay per tick
    pub const PARTICLE_DRAG: f32 = 0.98;
    /// Muzzle flash emission spread around the fire direction (±30°)
    pub const MUZZLE_SPREAD: f32 = std::f32::consts::FRAC_PI_6;
    pub const BULLET_FLASH_COUNT: usize = 6;
    pub const ROCKET_FLASH_COUNT: usize = 10;
    pub const EXPLOSION_COUNT: usize = 18;
}

/// Normalize an angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
