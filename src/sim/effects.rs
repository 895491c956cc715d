//! Particle burst factory
//!
//! Pure functions that append short-lived particles to the state's pool.
//! Bursts draw randomness through the caller's generator so they replay
//! exactly under the same seed; the per-tick thrust puff hashes a salt
//! instead of drawing down the generator.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::arena::SlotArena;
use super::state::{Particle, WeaponKind};
use crate::consts::*;
use crate::polar_to_cartesian;

const BULLET_FLASH_COLORS: [u32; 3] = [0xffffff, 0xffe082, 0xffca28];
const ROCKET_FLASH_COLORS: [u32; 3] = [0xffd180, 0xff8a65, 0xff7043];
const EXPLOSION_COLORS: [u32; 4] = [0xfff59d, 0xffb74d, 0xff7043, 0xef5350];

/// Muzzle flash at the barrel tip, sprayed within ±30° of the fire direction.
/// Rockets get a bigger, hotter flash than bullets.
pub fn muzzle_flash(
    particles: &mut SlotArena<Particle>,
    rng: &mut Pcg32,
    pos: Vec2,
    angle: f32,
    weapon: WeaponKind,
) {
    let (count, colors): (usize, &[u32]) = match weapon {
        WeaponKind::Bullet => (BULLET_FLASH_COUNT, &BULLET_FLASH_COLORS),
        WeaponKind::Rocket => (ROCKET_FLASH_COUNT, &ROCKET_FLASH_COLORS),
    };

    for _ in 0..count {
        let theta = angle + rng.random_range(-MUZZLE_SPREAD..=MUZZLE_SPREAD);
        let speed = rng.random_range(2.0..6.0);
        particles.insert(Particle {
            pos,
            vel: polar_to_cartesian(speed, theta),
            color: colors[rng.random_range(0..colors.len())],
            life: 1.0,
            decay: rng.random_range(0.06..0.12),
            size: rng.random_range(2.0..4.0),
        });
    }
}

/// Omnidirectional explosion burst in warm colors, used when an enemy dies.
pub fn explosion(particles: &mut SlotArena<Particle>, rng: &mut Pcg32, pos: Vec2) {
    for _ in 0..EXPLOSION_COUNT {
        let theta = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = rng.random_range(1.0..7.0);
        particles.insert(Particle {
            pos,
            vel: polar_to_cartesian(speed, theta),
            color: EXPLOSION_COLORS[rng.random_range(0..EXPLOSION_COLORS.len())],
            life: 1.0,
            decay: rng.random_range(0.02..0.05),
            size: rng.random_range(3.0..7.0),
        });
    }
}

/// Single thrust puff behind a rocket, opposite its heading. Deterministic
/// "random" jitter from hashing the caller's salt.
pub fn rocket_thrust(particles: &mut SlotArena<Particle>, pos: Vec2, heading: f32, salt: u32) {
    let hash = salt.wrapping_mul(2654435761).wrapping_add(7919);
    let jitter = ((hash % 1000) as f32 / 1000.0 - 0.5) * 0.8;
    let speed = 0.5 + ((hash / 1000 % 1000) as f32 / 1000.0) * 1.5;
    let life = 0.5 + ((hash / 10_000 % 300) as f32 / 1000.0);
    let decay = 0.05 + ((hash / 100_000 % 100) as f32 / 2000.0);
    let size = 2.0 + ((hash / 1_000_000 % 100) as f32 / 50.0);

    let theta = heading + std::f32::consts::PI + jitter;
    particles.insert(Particle {
        pos,
        vel: polar_to_cartesian(speed, theta),
        color: ROCKET_FLASH_COLORS[(hash % 3) as usize],
        life,
        decay,
        size,
    });
}
