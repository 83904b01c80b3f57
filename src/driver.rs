//! Frame scheduling for the simulation
//!
//! The host calls `schedule()` when it requests a display frame and hands the
//! ticket back when the frame fires. Resetting or switching levels bumps the
//! generation first, so a frame scheduled against the old session is dropped
//! instead of ticking the new one.

use crate::consts::{MAX_SUBSTEPS, TICK_DT};
use crate::level::{Level, builtin_level, next_level_id};
use crate::settings::Settings;
use crate::sim::{GameEvent, SessionSnapshot, ShotSession};

/// Proof that a frame was scheduled against a particular session generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
}

/// Owns the live session and serializes every tick through itself
pub struct FrameDriver {
    level: Level,
    session: ShotSession,
    generation: u64,
    accumulator: f32,
}

impl FrameDriver {
    pub fn new(level: Level, settings: Settings) -> Self {
        let session = ShotSession::start(&level, settings);
        Self {
            level,
            session,
            generation: 0,
            accumulator: 0.0,
        }
    }

    pub fn session(&self) -> &ShotSession {
        &self.session
    }

    /// Input (aiming, launching) goes through here between frames
    pub fn session_mut(&mut self) -> &mut ShotSession {
        &mut self.session
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request a frame. Nothing to schedule unless a shot is in progress.
    pub fn schedule(&self) -> Option<FrameTicket> {
        self.session.state.is_active().then_some(FrameTicket {
            generation: self.generation,
        })
    }

    fn is_current(&self, ticket: FrameTicket) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "Dropping stale frame (generation {} != {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        true
    }

    /// Run exactly one tick for a scheduled frame
    pub fn run_frame(&mut self, ticket: FrameTicket) -> Option<SessionSnapshot> {
        if !self.is_current(ticket) {
            return None;
        }
        self.session.tick()
    }

    /// Run as many fixed ticks as `elapsed` seconds cover, capped per call.
    ///
    /// Returns the snapshot after the last tick that ran.
    pub fn advance(&mut self, ticket: FrameTicket, elapsed: f32) -> Option<SessionSnapshot> {
        if !self.is_current(ticket) {
            return None;
        }

        // Non-finite frame times would poison the accumulator
        let elapsed = if elapsed.is_finite() { elapsed.clamp(0.0, 0.25) } else { 0.0 };
        self.accumulator += elapsed;
        let mut latest = None;
        let mut substeps = 0;
        while self.accumulator >= TICK_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= TICK_DT;
            substeps += 1;
            match self.session.tick() {
                Some(snapshot) => latest = Some(snapshot),
                None => {
                    // Shot ended mid-frame: drop the leftover time
                    self.accumulator = 0.0;
                    break;
                }
            }
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(TICK_DT);
        }
        latest
    }

    /// Invalidate every outstanding ticket
    fn cancel_frames(&mut self) {
        self.generation += 1;
        self.accumulator = 0.0;
    }

    /// Restart the current level
    pub fn reset(&mut self) {
        self.cancel_frames();
        self.session.reset(&self.level);
    }

    /// Replace the level; pending frames are cancelled before state is swapped
    pub fn switch_level(&mut self, level: Level) {
        self.cancel_frames();
        let settings = self.session.settings.clone();
        self.session = ShotSession::start(&level, settings);
        self.level = level;
    }

    /// Move on to the next shipped level (wrapping), with a fresh score
    pub fn next_level(&mut self) -> bool {
        match builtin_level(next_level_id(self.level.id)) {
            Some(level) => {
                self.switch_level(level);
                true
            }
            None => false,
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.session.drain_events()
    }
}
