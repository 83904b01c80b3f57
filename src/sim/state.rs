//! Session state and entity types
//!
//! Everything the tick mutates lives in `ShotSession`. Renderers only ever see
//! `SessionSnapshot` values.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::aim;
use crate::consts::*;
use crate::level::{BlockSpec, Level, PigSpec};
use crate::settings::Settings;

/// Shot lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotState {
    /// Bird sits in the slingshot, waiting for a launch
    Ready,
    /// Bird is in the air
    Flying,
    /// Bird is done, debris is still moving
    Settling,
    /// Every pig destroyed (terminal)
    Success,
    /// Out of birds with pigs standing (terminal)
    Fail,
}

impl ShotState {
    /// States in which the frame driver keeps ticking
    pub fn is_active(&self) -> bool {
        matches!(self, ShotState::Flying | ShotState::Settling)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShotState::Success | ShotState::Fail)
    }
}

/// The bird in flight (or waiting in the slingshot)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Flight trail of the current shot (oldest first)
    #[serde(default)]
    pub path: Vec<Vec2>,
}

impl Bird {
    pub fn new(anchor: Vec2) -> Self {
        Self {
            pos: anchor,
            vel: Vec2::ZERO,
            radius: BIRD_RADIUS,
            path: Vec::new(),
        }
    }

    /// Put the bird back in the slingshot
    pub fn reset(&mut self, anchor: Vec2) {
        self.pos = anchor;
        self.vel = Vec2::ZERO;
        self.path.clear();
    }

    /// Square bounding box with side `2 * radius`
    pub fn aabb(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(self.radius))
    }

    pub fn record_path(&mut self) {
        self.path.push(self.pos);
    }
}

/// A destructible rectangular block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub vel: Vec2,
    pub destroyed: bool,
}

impl Block {
    pub fn from_spec(spec: &BlockSpec) -> Self {
        Self {
            id: spec.id,
            pos: Vec2::new(spec.x, spec.y),
            width: spec.width,
            height: spec.height,
            vel: Vec2::ZERO,
            destroyed: false,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_top_left(self.pos, self.size())
    }

    /// Rect at a different top-left position (predicted moves)
    pub fn rect_at(&self, pos: Vec2) -> Rect {
        Rect::from_top_left(pos, self.size())
    }
}

/// A pig: circular target that wins the level when all are gone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pig {
    pub id: u32,
    /// Top-left of the bounding square
    pub pos: Vec2,
    pub radius: f32,
    pub vel: Vec2,
    pub destroyed: bool,
}

impl Pig {
    pub fn from_spec(spec: &PigSpec) -> Self {
        Self {
            id: spec.id,
            pos: Vec2::new(spec.x, spec.y),
            radius: spec.radius,
            vel: Vec2::ZERO,
            destroyed: false,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.radius)
    }

    pub fn diameter(&self) -> f32 {
        self.radius * 2.0
    }

    pub fn rect_at(&self, pos: Vec2) -> Rect {
        Rect::from_top_left(pos, Vec2::splat(self.diameter()))
    }
}

/// Things that happened during a tick, for scoring, audio or UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotLaunched { velocity: Vec2 },
    BlockDestroyed { id: u32, points: u64 },
    PigDestroyed { id: u32, points: u64 },
    /// Bird left play; settling begins
    ShotEnded,
    /// Next bird loaded into the slingshot
    BirdReloaded { birds_remaining: u32 },
    LevelCleared { score: u64 },
    LevelFailed { score: u64 },
}

/// Read-only view handed to the renderer each frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub bird_pos: Vec2,
    pub bird_path: Vec<Vec2>,
    pub blocks: Vec<Block>,
    pub pigs: Vec<Pig>,
    pub state: ShotState,
    pub score: u64,
    pub birds_remaining: u32,
    pub tick: u64,
}

/// One play-through of a level (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotSession {
    pub level_id: u32,
    /// Where the bird sits between shots
    pub anchor: Vec2,
    pub bird: Bird,
    /// Blocks in level order
    pub blocks: Vec<Block>,
    /// Pigs in level order
    pub pigs: Vec<Pig>,
    pub birds_remaining: u32,
    pub score: u64,
    pub state: ShotState,
    /// Consecutive ticks with nothing moving while settling
    pub rest_ticks: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub settings: Settings,
    /// Events not yet drained by the caller
    #[serde(skip)]
    pub(crate) events: Vec<GameEvent>,
}

impl ShotSession {
    /// Instantiate mutable copies of a level's bodies
    pub fn start(level: &Level, settings: Settings) -> Self {
        log::info!(
            "Starting level {} ({} blocks, {} pigs, {} birds, {:?})",
            level.id,
            level.blocks.len(),
            level.pigs.len(),
            level.bird_count,
            settings.support
        );
        let anchor = level.anchor();
        Self {
            level_id: level.id,
            anchor,
            bird: Bird::new(anchor),
            blocks: level.blocks.iter().map(Block::from_spec).collect(),
            pigs: level.pigs.iter().map(Pig::from_spec).collect(),
            birds_remaining: level.bird_count,
            score: 0,
            state: ShotState::Ready,
            rest_ticks: 0,
            time_ticks: 0,
            settings,
            events: Vec::new(),
        }
    }

    /// Restart from the level template, keeping the current settings
    pub fn reset(&mut self, level: &Level) {
        let settings = self.settings.clone();
        *self = Self::start(level, settings);
    }

    /// Win condition; an empty pig list never wins
    pub fn all_pigs_destroyed(&self) -> bool {
        !self.pigs.is_empty() && self.pigs.iter().all(|p| p.destroyed)
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            bird_pos: self.bird.pos,
            bird_path: self.bird.path.clone(),
            blocks: self.blocks.clone(),
            pigs: self.pigs.clone(),
            state: self.state,
            score: self.score,
            birds_remaining: self.birds_remaining,
            tick: self.time_ticks,
        }
    }

    /// Advance one fixed step (no-op outside Flying/Settling)
    pub fn tick(&mut self) -> Option<SessionSnapshot> {
        super::tick::tick(self)
    }

    /// Launch the bird from where it sits (Ready only)
    pub fn launch(&mut self, velocity: Vec2) -> bool {
        super::tick::launch(self, velocity)
    }

    /// Launch at an angle (degrees) and power percentage (Ready only)
    pub fn launch_angle_power(&mut self, angle_deg: f32, power_pct: f32) -> bool {
        match aim::angle_power_velocity(angle_deg, power_pct, &self.settings) {
            Some(velocity) => self.launch(velocity),
            None => false,
        }
    }

    /// Preview arc for a candidate launch (Ready only, empty otherwise)
    pub fn preview_trajectory(&self, origin: Vec2, velocity: Vec2) -> Vec<Vec2> {
        if self.state != ShotState::Ready {
            return Vec::new();
        }
        super::trajectory::predict(
            origin,
            velocity,
            self.settings.preview_steps,
            self.settings.preview_stride,
            self.settings.gravity,
            &self.settings.playfield,
        )
    }

    /// Current drag offset of the bird from the anchor
    pub fn pull(&self) -> Vec2 {
        self.bird.pos - self.anchor
    }

    /// Drag the bird away from the anchor (clamped to the slingshot reach)
    pub fn pull_bird(&mut self, offset: Vec2) -> bool {
        if self.state != ShotState::Ready || self.birds_remaining == 0 {
            return false;
        }
        let pull = aim::clamp_pull(offset, self.settings.max_drag);
        self.bird.pos = self.anchor + pull;
        true
    }

    /// Preview arc for the current drag; empty for short drags
    pub fn aim_preview(&self) -> Vec<Vec2> {
        match aim::pull_velocity(self.pull(), &self.settings) {
            Some(velocity) => self.preview_trajectory(self.bird.pos, velocity),
            None => Vec::new(),
        }
    }

    /// Let go of the slingshot. Short drags snap back without firing.
    pub fn release(&mut self) -> bool {
        if self.state != ShotState::Ready {
            return false;
        }
        match aim::pull_velocity(self.pull(), &self.settings) {
            Some(velocity) => self.launch(velocity),
            None => {
                log::debug!("Drag too short, bird returns to the slingshot");
                self.bird.reset(self.anchor);
                false
            }
        }
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}
