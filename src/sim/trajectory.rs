//! Ballistic arc prediction for aiming previews

use glam::Vec2;

use super::kinematics::integrate;
use crate::settings::Playfield;

/// Predict the arc of a launch without touching any live state.
///
/// Uses the same integrator as the flying bird (gravity only, no collisions,
/// no damping). Stops before the first point outside the playfield and keeps
/// every `stride`-th step.
pub fn predict(
    origin: Vec2,
    velocity: Vec2,
    max_steps: usize,
    stride: usize,
    gravity: f32,
    playfield: &Playfield,
) -> Vec<Vec2> {
    let stride = stride.max(1);
    let mut points = Vec::with_capacity(max_steps / stride + 1);
    let mut pos = origin;
    let mut vel = velocity;

    for step in 0..max_steps {
        (pos, vel) = integrate(pos, vel, gravity);
        if leaves_playfield(pos, playfield) {
            break;
        }
        if step % stride == 0 {
            points.push(pos);
        }
    }

    points
}

/// Outside the left/right edges or below the bottom of the screen
#[inline]
pub fn leaves_playfield(pos: Vec2, playfield: &Playfield) -> bool {
    pos.x < 0.0 || pos.x > playfield.width || pos.y > playfield.height
}

/// Closest approach of an arc to a target point
pub fn closest_approach(points: &[Vec2], target: Vec2) -> Option<f32> {
    points
        .iter()
        .map(|p| p.distance(target))
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}
