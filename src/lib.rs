//! Chirp Shot - slingshot projectile physics core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, collisions, shot state machine)
//! - `level`: Immutable level templates and validation
//! - `aim`: Drag and angle/power launch vectors
//! - `driver`: Frame scheduling with stale-frame cancellation
//! - `suggest`: Launch suggestion payloads and preview overlays
//! - `autopilot`: Seeded launch search for demos and tests
//! - `settings`: Data-driven physics tuning

pub mod aim;
pub mod autopilot;
pub mod driver;
pub mod level;
pub mod settings;
pub mod sim;
pub mod suggest;

pub use level::{Level, LevelError};
pub use settings::{Settings, SupportMode};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display frame)
    pub const TICK_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Playfield dimensions (screen space, y grows downward)
    pub const GAME_WIDTH: f32 = 1000.0;
    pub const GAME_HEIGHT: f32 = 500.0;
    pub const GROUND_HEIGHT: f32 = 50.0;

    /// Body sizes
    pub const BIRD_RADIUS: f32 = 16.0;
    pub const PIG_RADIUS: f32 = 20.0;

    /// Per-tick gravity (units/tick²)
    pub const GRAVITY: f32 = 0.2;

    /// Slingshot limits
    pub const MAX_DRAG_DISTANCE: f32 = 90.0;
    pub const MIN_DRAG_DISTANCE: f32 = 10.0;
    pub const POWER_MULTIPLIER: f32 = 0.2;

    /// Points per destroyed entity
    pub const BLOCK_SCORE: u64 = 10;
    pub const PIG_SCORE: u64 = 500;

    /// Rest required before a shot concludes (1.5 s at 60 Hz)
    pub const SETTLE_TICKS: u32 = 90;
    /// Speed below which a body counts as resting (either axis)
    pub const SETTLE_SPEED: f32 = 0.1;

    /// Trajectory preview sampling
    pub const PREVIEW_STEPS: usize = 50;
    pub const PREVIEW_STRIDE: usize = 3;
}

/// Convert an angle (degrees above the horizontal) and speed to a screen-space velocity
#[inline]
pub fn polar_to_velocity(angle_deg: f32, speed: f32) -> Vec2 {
    let theta = angle_deg.to_radians();
    // Screen y points down, so "up" is negative
    Vec2::new(speed * theta.cos(), -speed * theta.sin())
}

/// True when both components are finite
#[inline]
pub fn is_finite_vec(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
