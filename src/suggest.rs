//! Launch suggestion payloads
//!
//! The suggestion service lives outside the engine. These types mirror its
//! request/response shape, and `SuggestionOverlay` turns an answer into arcs
//! for the renderer. Nothing here feeds back into the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::aim;
use crate::level::Level;
use crate::settings::Settings;
use crate::sim::trajectory::predict;

/// What the service is asked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub level_structure: String,
    pub bird_type: String,
    pub power: f32,
}

impl SuggestionRequest {
    pub fn for_level(level: &Level, bird_type: &str, power: f32) -> Self {
        Self {
            level_structure: level.structure.clone(),
            bird_type: bird_type.to_string(),
            power,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestedPoint {
    pub x: f32,
    pub y: f32,
}

/// What the service answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub suggested_positions: Vec<SuggestedPoint>,
    pub rationale: String,
}

impl SuggestionResponse {
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(resp) => Some(resp),
            Err(e) => {
                log::warn!("Ignoring malformed suggestion: {}", e);
                None
            }
        }
    }
}

/// A suggested release point and the arc it would fly
#[derive(Debug, Clone, Serialize)]
pub struct SuggestedShot {
    pub release: Vec2,
    pub velocity: Vec2,
    pub arc: Vec<Vec2>,
}

/// Render-only annotation built from a suggestion
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuggestionOverlay {
    pub shots: Vec<SuggestedShot>,
    pub rationale: String,
}

impl SuggestionOverlay {
    /// Read each suggested point as a release position around the slingshot
    /// and predict its arc. Points too close to the anchor are dropped.
    pub fn from_response(resp: &SuggestionResponse, level: &Level, settings: &Settings) -> Self {
        let anchor = level.anchor();
        let shots = resp
            .suggested_positions
            .iter()
            .filter_map(|p| {
                let point = Vec2::new(p.x, p.y);
                let pull = aim::clamp_pull(point - anchor, settings.max_drag);
                let velocity = aim::pull_velocity(pull, settings)?;
                let release = anchor + pull;
                let arc = predict(
                    release,
                    velocity,
                    settings.preview_steps,
                    settings.preview_stride,
                    settings.gravity,
                    &settings.playfield,
                );
                Some(SuggestedShot { release, velocity, arc })
            })
            .collect();

        Self {
            shots,
            rationale: resp.rationale.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shots.is_empty()
    }
}
