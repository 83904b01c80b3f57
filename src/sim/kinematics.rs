//! Per-tick integration for the bird and free bodies
//!
//! All functions are pure: `(pos, vel) -> (pos, vel)`.

use glam::Vec2;

/// Semi-implicit Euler step: velocity picks up gravity first, then moves the body
#[inline]
pub fn integrate(pos: Vec2, vel: Vec2, gravity: f32) -> (Vec2, Vec2) {
    let vel = Vec2::new(vel.x, vel.y + gravity);
    (pos + vel, vel)
}

/// Step a destroyed body: horizontal air damping, then gravity
#[inline]
pub fn integrate_debris(pos: Vec2, vel: Vec2, gravity: f32, air_friction: f32) -> (Vec2, Vec2) {
    let damped = Vec2::new(vel.x * air_friction, vel.y);
    integrate(pos, damped, gravity)
}

/// Ground response for a body whose predicted bottom crossed the ground line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroundResponse {
    /// Bounce with restitution and horizontal drag
    Bounce { restitution: f32, drag: f32 },
    /// Stop vertical motion and apply resting friction
    Rest { friction: f32 },
}

/// Snap a body's top-left `y` so its bottom sits on the ground and apply the response.
///
/// Returns the corrected `(y, vel)`.
#[inline]
pub fn land_on_ground(height: f32, ground_y: f32, vel: Vec2, response: GroundResponse) -> (f32, Vec2) {
    let y = ground_y - height;
    let vel = match response {
        GroundResponse::Bounce { restitution, drag } => Vec2::new(vel.x * drag, -vel.y * restitution),
        GroundResponse::Rest { friction } => Vec2::new(vel.x * friction, 0.0),
    };
    (y, vel)
}

/// True when a body moves faster than `threshold` on either axis
#[inline]
pub fn is_moving(vel: Vec2, threshold: f32) -> bool {
    vel.x.abs() > threshold || vel.y.abs() > threshold
}
