//! Deterministic simulation module
//!
//! All gameplay physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick per frame)
//! - Stable iteration order (level order for blocks and pigs)
//! - No rendering or platform dependencies

pub mod collision;
pub mod kinematics;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use collision::{Rect, bird_hits_block, bird_hits_pig, ground_contact, resting_on_top};
pub use state::{Bird, Block, GameEvent, Pig, SessionSnapshot, ShotSession, ShotState};
pub use tick::{launch, tick};
pub use trajectory::predict;
