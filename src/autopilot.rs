//! Seeded launch search
//!
//! Plays the game for demos and soak tests: samples slingshot pulls, predicts
//! each arc and keeps the one passing closest to a standing pig.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::aim;
use crate::sim::trajectory::{closest_approach, predict};
use crate::sim::{ShotSession, ShotState};

/// How far ahead candidate arcs are simulated (ticks)
const SEARCH_HORIZON: usize = 400;

/// Launch angles considered, degrees above horizontal
const MIN_ANGLE_DEG: f32 = 5.0;
const MAX_ANGLE_DEG: f32 = 75.0;

/// A candidate pull and how close its arc gets to the nearest pig
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan {
    pub pull: Vec2,
    pub miss_distance: f32,
}

pub struct Autopilot {
    rng: Pcg32,
    candidates: usize,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self::with_candidates(seed, 64)
    }

    pub fn with_candidates(seed: u64, candidates: usize) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            candidates: candidates.max(1),
        }
    }

    /// Best pull for the current session, or `None` when there is nothing to do
    pub fn plan(&mut self, session: &ShotSession) -> Option<Plan> {
        if session.state != ShotState::Ready || session.birds_remaining == 0 {
            return None;
        }

        let targets: Vec<Vec2> = session
            .pigs
            .iter()
            .filter(|p| !p.destroyed)
            .map(|p| p.center())
            .collect();
        if targets.is_empty() {
            return None;
        }

        let settings = &session.settings;
        let mut best: Option<Plan> = None;
        for _ in 0..self.candidates {
            let angle = self.rng.random_range(MIN_ANGLE_DEG..MAX_ANGLE_DEG).to_radians();
            let shortest = (settings.min_drag + 1.0).min(settings.max_drag);
            let length = self.rng.random_range(shortest..=settings.max_drag);
            // Pull down and back; the bird flies the other way
            let pull = Vec2::new(-angle.cos(), angle.sin()) * length;
            let Some(velocity) = aim::pull_velocity(pull, settings) else {
                continue;
            };

            let arc = predict(
                session.anchor + pull,
                velocity,
                SEARCH_HORIZON,
                1,
                settings.gravity,
                &settings.playfield,
            );
            let miss = targets
                .iter()
                .filter_map(|t| closest_approach(&arc, *t))
                .fold(f32::INFINITY, f32::min);

            if best.is_none_or(|b| miss < b.miss_distance) {
                best = Some(Plan { pull, miss_distance: miss });
            }
        }

        if let Some(plan) = best {
            log::debug!(
                "Autopilot pull ({:.1}, {:.1}) misses nearest pig by {:.1}",
                plan.pull.x,
                plan.pull.y,
                plan.miss_distance
            );
        }
        best
    }

    /// Aim and release in one go. Returns whether a shot was fired.
    pub fn take_shot(&mut self, session: &mut ShotSession) -> bool {
        match self.plan(session) {
            Some(plan) => session.pull_bird(plan.pull) && session.release(),
            None => false,
        }
    }
}
