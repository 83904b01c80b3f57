//! Physics tuning and engine rule selection
//!
//! Loaded from JSON when provided, otherwise the shipped defaults apply.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// How non-destroyed blocks and pigs behave before they are struck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SupportMode {
    /// Intact bodies fall under gravity and rest on the ground or on intact blocks
    #[default]
    Stacking,
    /// Intact bodies never move until struck
    Static,
}

impl SupportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportMode::Stacking => "Stacking",
            SupportMode::Static => "Static",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stacking" | "stack" => Some(SupportMode::Stacking),
            "static" => Some(SupportMode::Static),
            _ => None,
        }
    }

    /// Whether intact bodies are integrated at all
    pub fn intact_bodies_fall(&self) -> bool {
        matches!(self, SupportMode::Stacking)
    }
}

/// Playfield bounds in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
    /// Height of the ground strip at the bottom
    pub ground_height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: GAME_WIDTH,
            height: GAME_HEIGHT,
            ground_height: GROUND_HEIGHT,
        }
    }
}

impl Playfield {
    /// Y coordinate of the ground surface
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_height
    }

    /// Horizontal bounds check used for shot-over and settle filtering
    #[inline]
    pub fn contains_x(&self, x: f32) -> bool {
        x >= 0.0 && x <= self.width
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rule set for intact bodies
    pub support: SupportMode,
    pub playfield: Playfield,

    // === Kinematics ===
    /// Per-tick gravity
    pub gravity: f32,
    /// Gravity multiplier for destroyed blocks
    pub debris_gravity_scale: f32,
    /// Horizontal damping per tick for destroyed bodies
    pub air_friction: f32,
    /// Vertical restitution when debris hits the ground
    pub ground_bounce: f32,
    /// Horizontal damping when debris hits the ground
    pub ground_drag: f32,
    /// Horizontal damping for intact bodies resting on a support
    pub resting_friction: f32,

    // === Impacts ===
    /// Fraction of bird velocity handed to a struck block
    pub block_transfer: f32,
    /// Bird velocity scale after hitting a block (y is also reflected)
    pub block_rebound: f32,
    /// Bird velocity scale after hitting a pig (y is also reflected)
    pub pig_rebound: f32,

    // === Scoring ===
    pub block_score: u64,
    pub pig_score: u64,

    // === Settle detection ===
    pub settle_speed: f32,
    pub settle_ticks: u32,

    // === Aiming ===
    pub max_drag: f32,
    pub min_drag: f32,
    pub power_multiplier: f32,

    // === Trajectory preview ===
    pub preview_steps: usize,
    pub preview_stride: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            support: SupportMode::Stacking,
            playfield: Playfield::default(),

            gravity: GRAVITY,
            debris_gravity_scale: 0.8,
            air_friction: 0.99,
            ground_bounce: 0.3,
            ground_drag: 0.8,
            resting_friction: 0.95,

            block_transfer: 0.5,
            block_rebound: 0.4,
            pig_rebound: 0.2,

            block_score: BLOCK_SCORE,
            pig_score: PIG_SCORE,

            settle_speed: SETTLE_SPEED,
            settle_ticks: SETTLE_TICKS,

            max_drag: MAX_DRAG_DISTANCE,
            min_drag: MIN_DRAG_DISTANCE,
            power_multiplier: POWER_MULTIPLIER,

            preview_steps: PREVIEW_STEPS,
            preview_stride: PREVIEW_STRIDE,
        }
    }
}

impl Settings {
    /// Default settings with a specific support rule
    pub fn with_support(support: SupportMode) -> Self {
        Self {
            support,
            ..Self::default()
        }
    }

    /// Fastest launch the slingshot can produce
    pub fn max_launch_speed(&self) -> f32 {
        self.max_drag * self.power_multiplier
    }

    /// Parse settings JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => Some(settings.sanitized()),
            Err(e) => {
                log::warn!("Rejected settings JSON: {}", e);
                None
            }
        }
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
            }
            Err(e) => log::warn!("Could not read {}: {}", path.display(), e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Clamp values that would break stepping (zero strides, negative thresholds,
    /// missing gravity, damping factors outside 0..=1)
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            log::warn!("Gravity must be positive, using {}", defaults.gravity);
            self.gravity = defaults.gravity;
        }
        if !(self.debris_gravity_scale.is_finite() && self.debris_gravity_scale > 0.0) {
            self.debris_gravity_scale = defaults.debris_gravity_scale;
        }
        for (factor, fallback) in [
            (&mut self.air_friction, defaults.air_friction),
            (&mut self.ground_bounce, defaults.ground_bounce),
            (&mut self.ground_drag, defaults.ground_drag),
            (&mut self.resting_friction, defaults.resting_friction),
            (&mut self.block_transfer, defaults.block_transfer),
            (&mut self.block_rebound, defaults.block_rebound),
            (&mut self.pig_rebound, defaults.pig_rebound),
        ] {
            *factor = unit_factor(*factor, fallback);
        }

        self.settle_speed = finite_or(self.settle_speed.abs(), defaults.settle_speed);
        self.settle_ticks = self.settle_ticks.max(1);
        self.preview_stride = self.preview_stride.max(1);

        self.power_multiplier = finite_or(self.power_multiplier, defaults.power_multiplier);
        self.min_drag = finite_or(self.min_drag, defaults.min_drag).max(0.0);
        self.max_drag = finite_or(self.max_drag, defaults.max_drag).max(self.min_drag);
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Damping and restitution factors live in 0..=1
fn unit_factor(value: f32, fallback: f32) -> f32 {
    finite_or(value, fallback).clamp(0.0, 1.0)
}
