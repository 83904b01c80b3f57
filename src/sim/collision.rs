//! Collision detection for birds, blocks and pigs
//!
//! Every test here is pure. Resolution (destruction, scoring, velocity
//! transfer) happens in the tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Bird, Block, Pig};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_top_left(pos: Vec2, size: Vec2) -> Self {
        Self { min: pos, max: pos + size }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    /// Strict overlap on both axes; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.right() > other.left()
            && self.left() < other.right()
            && self.bottom() > other.top()
            && self.top() < other.bottom()
    }

    #[inline]
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.right() > other.left() && self.left() < other.right()
    }
}

/// Bird's square box against an intact block
pub fn bird_hits_block(bird: &Bird, block: &Block) -> bool {
    !block.destroyed && bird.aabb().overlaps(&block.rect())
}

/// Circle-circle test between the bird and an intact pig
pub fn bird_hits_pig(bird: &Bird, pig: &Pig) -> bool {
    if pig.destroyed {
        return false;
    }
    let reach = bird.radius + pig.radius;
    bird.pos.distance_squared(pig.center()) < reach * reach
}

/// Whether a body moving from `current` to `next` lands on `support`.
///
/// The body must overlap the support horizontally at its predicted position,
/// start at or above the support's top, and reach it this tick.
pub fn resting_on_top(current: &Rect, next: &Rect, support: &Rect) -> bool {
    next.overlaps_horizontally(support)
        && current.bottom() <= support.top()
        && next.bottom() >= support.top()
}

/// First support a falling body lands on, in iteration order
pub fn first_support<'a, I>(current: &Rect, next: &Rect, supports: I) -> Option<Rect>
where
    I: IntoIterator<Item = &'a Rect>,
{
    supports
        .into_iter()
        .find(|support| resting_on_top(current, next, support))
        .copied()
}

/// Predicted bottom edge at or below the ground line
#[inline]
pub fn ground_contact(next_bottom: f32, ground_y: f32) -> bool {
    next_bottom >= ground_y
}
