//! Turning slingshot input into launch vectors
//!
//! Input devices are handled elsewhere; these helpers take drag offsets and
//! angle/power values that have already been read from the UI.

use glam::Vec2;

use crate::polar_to_velocity;
use crate::settings::Settings;

/// Clamp a drag offset to the slingshot's reach
pub fn clamp_pull(offset: Vec2, max_drag: f32) -> Vec2 {
    let dist = offset.length();
    if dist > max_drag && dist > 0.0 {
        offset / dist * max_drag
    } else {
        offset
    }
}

/// Launch vector for a pull (opposite the drag, scaled by power).
///
/// Returns `None` for drags shorter than the minimum: no shot is fired.
pub fn pull_velocity(pull: Vec2, settings: &Settings) -> Option<Vec2> {
    let pull = clamp_pull(pull, settings.max_drag);
    if !pull.is_finite() || pull.length() < settings.min_drag {
        return None;
    }
    Some(-pull * settings.power_multiplier)
}

/// Whether a pointer press lands close enough to the bird to start a drag
pub fn can_grab(pointer: Vec2, bird_pos: Vec2, bird_radius: f32) -> bool {
    pointer.distance(bird_pos) < bird_radius * 2.0
}

/// Launch vector from an angle (degrees above horizontal) and power (0..=100).
///
/// Full power equals a full-length drag. Zero power fires nothing.
pub fn angle_power_velocity(angle_deg: f32, power_pct: f32, settings: &Settings) -> Option<Vec2> {
    if !angle_deg.is_finite() || !power_pct.is_finite() {
        return None;
    }
    let power = power_pct.clamp(0.0, 100.0) / 100.0;
    if power <= 0.0 {
        return None;
    }
    Some(polar_to_velocity(angle_deg, power * settings.max_launch_speed()))
}
