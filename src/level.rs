//! Level templates
//!
//! Levels are immutable inputs. A session copies their blocks and pigs into
//! mutable bodies; the template itself is never touched.

use std::collections::HashSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::PIG_RADIUS;

/// Slingshot anchor (where the bird waits)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub id: u32,
    /// Top-left corner
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PigSpec {
    pub id: u32,
    /// Top-left of the bounding square
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_pig_radius")]
    pub radius: f32,
}

fn default_pig_radius() -> f32 {
    PIG_RADIUS
}

/// An immutable level template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: u32,
    /// Plain-text description of the structure (fed to suggestion services)
    pub structure: String,
    pub blocks: Vec<BlockSpec>,
    pub pigs: Vec<PigSpec>,
    pub bird_count: u32,
    pub bird: Anchor,
}

/// Why a level template was rejected
#[derive(Debug)]
pub enum LevelError {
    Parse(serde_json::Error),
    NoPigs { level: u32 },
    NoBirds { level: u32 },
    BadBlock { level: u32, block: u32 },
    BadPig { level: u32, pig: u32 },
    DuplicateBlockId { level: u32, block: u32 },
    DuplicatePigId { level: u32, pig: u32 },
    BadAnchor { level: u32 },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Parse(e) => write!(f, "invalid level JSON: {}", e),
            LevelError::NoPigs { level } => write!(f, "level {} has no pigs", level),
            LevelError::NoBirds { level } => write!(f, "level {} has no birds", level),
            LevelError::BadBlock { level, block } => {
                write!(f, "level {} block {} has a non-positive or non-finite size", level, block)
            }
            LevelError::BadPig { level, pig } => {
                write!(f, "level {} pig {} has a non-positive or non-finite radius", level, pig)
            }
            LevelError::DuplicateBlockId { level, block } => {
                write!(f, "level {} repeats block id {}", level, block)
            }
            LevelError::DuplicatePigId { level, pig } => {
                write!(f, "level {} repeats pig id {}", level, pig)
            }
            LevelError::BadAnchor { level } => write!(f, "level {} has a non-finite slingshot anchor", level),
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(e: serde_json::Error) -> Self {
        LevelError::Parse(e)
    }
}

impl Level {
    /// Parse and validate a level from JSON
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Reject templates the engine cannot play sensibly
    pub fn validate(&self) -> Result<(), LevelError> {
        let level = self.id;
        if self.pigs.is_empty() {
            return Err(LevelError::NoPigs { level });
        }
        if self.bird_count == 0 {
            return Err(LevelError::NoBirds { level });
        }
        if !self.bird.x.is_finite() || !self.bird.y.is_finite() {
            return Err(LevelError::BadAnchor { level });
        }

        let mut block_ids = HashSet::new();
        for block in &self.blocks {
            let finite = [block.x, block.y, block.width, block.height].iter().all(|v| v.is_finite());
            if !finite || block.width <= 0.0 || block.height <= 0.0 {
                return Err(LevelError::BadBlock { level, block: block.id });
            }
            if !block_ids.insert(block.id) {
                return Err(LevelError::DuplicateBlockId { level, block: block.id });
            }
        }

        let mut pig_ids = HashSet::new();
        for pig in &self.pigs {
            let finite = [pig.x, pig.y, pig.radius].iter().all(|v| v.is_finite());
            if !finite || pig.radius <= 0.0 {
                return Err(LevelError::BadPig { level, pig: pig.id });
            }
            if !pig_ids.insert(pig.id) {
                return Err(LevelError::DuplicatePigId { level, pig: pig.id });
            }
        }

        Ok(())
    }

    pub fn anchor(&self) -> Vec2 {
        Vec2::new(self.bird.x, self.bird.y)
    }
}

fn block(id: u32, x: f32, y: f32, width: f32, height: f32) -> BlockSpec {
    BlockSpec { id, x, y, width, height }
}

fn pig(id: u32, x: f32, y: f32) -> PigSpec {
    PigSpec { id, x, y, radius: PIG_RADIUS }
}

/// The shipped levels, in play order
pub fn builtin_levels() -> Vec<Level> {
    let slingshot = Anchor { x: 100.0, y: 350.0 };
    vec![
        Level {
            id: 1,
            structure: "A single pig at (700, 410) is protected by a simple wall of three blocks \
                        in front of it at (640, 400), (640, 350), and (640, 300)."
                .to_string(),
            blocks: vec![
                block(1, 640.0, 400.0, 20.0, 50.0),
                block(2, 640.0, 350.0, 20.0, 50.0),
                block(3, 640.0, 300.0, 20.0, 50.0),
            ],
            pigs: vec![pig(1, 700.0, 410.0)],
            bird_count: 3,
            bird: slingshot,
        },
        Level {
            id: 2,
            structure: "Two pigs at (700, 410) and (820, 410) are in a structure. A tower of two \
                        blocks at (650, 400) and (650, 350) and a horizontal block on top at \
                        (675, 330). A second tower protects the other pig."
                .to_string(),
            blocks: vec![
                block(1, 650.0, 400.0, 20.0, 50.0),
                block(2, 650.0, 350.0, 20.0, 50.0),
                block(3, 780.0, 400.0, 20.0, 50.0),
                block(4, 780.0, 350.0, 20.0, 50.0),
                block(5, 670.0, 330.0, 130.0, 20.0),
            ],
            pigs: vec![pig(1, 700.0, 410.0), pig(2, 820.0, 410.0)],
            bird_count: 4,
            bird: slingshot,
        },
        Level {
            id: 3,
            structure: "Three pigs are inside a complex castle-like structure. Bottom pigs at \
                        (650, 410) and (850, 410). Top pig at (750, 240). The structure is made \
                        of vertical and horizontal blocks creating rooms."
                .to_string(),
            blocks: vec![
                // Left tower
                block(1, 620.0, 400.0, 20.0, 50.0),
                block(2, 620.0, 350.0, 20.0, 50.0),
                block(3, 620.0, 300.0, 20.0, 50.0),
                // Right tower
                block(4, 880.0, 400.0, 20.0, 50.0),
                block(5, 880.0, 350.0, 20.0, 50.0),
                block(6, 880.0, 300.0, 20.0, 50.0),
                // Middle tower
                block(7, 750.0, 400.0, 20.0, 50.0),
                block(8, 750.0, 350.0, 20.0, 50.0),
                // Roof
                block(9, 620.0, 280.0, 280.0, 20.0),
            ],
            pigs: vec![pig(1, 650.0, 410.0), pig(2, 850.0, 410.0), pig(3, 750.0, 240.0)],
            bird_count: 4,
            bird: slingshot,
        },
    ]
}

/// Look up a shipped level by id
pub fn builtin_level(id: u32) -> Option<Level> {
    builtin_levels().into_iter().find(|l| l.id == id)
}

/// Id of the level after `current`, wrapping to the first after the last
pub fn next_level_id(current: u32) -> u32 {
    let levels = builtin_levels();
    let idx = levels.iter().position(|l| l.id == current);
    match idx {
        Some(i) if i + 1 < levels.len() => levels[i + 1].id,
        _ => levels[0].id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_validate() {
        let levels = builtin_levels();
        assert_eq!(levels.len(), 3);
        for level in &levels {
            level.validate().unwrap();
        }
    }

    #[test]
    fn test_next_level_wraps() {
        assert_eq!(next_level_id(1), 2);
        assert_eq!(next_level_id(2), 3);
        assert_eq!(next_level_id(3), 1);
        assert_eq!(next_level_id(42), 1);
    }

    #[test]
    fn test_from_json_level_table_shape() {
        let json = r#"{
            "id": 7,
            "structure": "one pig",
            "pigs": [{ "id": 1, "x": 700, "y": 410 }],
            "blocks": [{ "id": 1, "x": 640, "y": 400, "width": 20, "height": 50 }],
            "birdCount": 2,
            "bird": { "x": 100, "y": 350 }
        }"#;
        let level = Level::from_json(json).unwrap();
        assert_eq!(level.bird_count, 2);
        assert_eq!(level.pigs[0].radius, PIG_RADIUS);
        assert_eq!(level.anchor(), Vec2::new(100.0, 350.0));
    }

    #[test]
    fn test_rejects_zero_pigs() {
        let mut level = builtin_level(1).unwrap();
        level.pigs.clear();
        assert!(matches!(level.validate(), Err(LevelError::NoPigs { level: 1 })));
    }

    #[test]
    fn test_rejects_negative_block() {
        let mut level = builtin_level(1).unwrap();
        level.blocks[1].height = -5.0;
        assert!(matches!(level.validate(), Err(LevelError::BadBlock { block: 2, .. })));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut level = builtin_level(2).unwrap();
        level.pigs[1].id = 1;
        assert!(matches!(level.validate(), Err(LevelError::DuplicatePigId { pig: 1, .. })));
    }

    #[test]
    fn test_parse_error_has_source() {
        use std::error::Error;
        let err = Level::from_json("{").unwrap_err();
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("invalid level JSON"));
    }
}
