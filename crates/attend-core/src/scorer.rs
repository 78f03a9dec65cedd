//! Per-frame focus scoring.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::locator::FaceCandidate;
use crate::motion::MotionSignal;
use crate::rotation::{is_looking_straight, Rotation};

/// Score assigned to a face whose rotation is outside the straight tolerances,
/// regardless of where it sits in the frame.
pub const ROTATED_SCORE: f32 = 0.1;
/// Bonus for motion concentrated in the focus box.
const CENTER_MOTION_BONUS: f32 = 0.3;

/// What the locator found in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    Face(FaceCandidate),
    Motion(MotionSignal),
    NoFace,
}

/// One frame's focus estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionSample {
    /// Focus score in `[0, 1]`.
    pub score: f32,
    pub is_looking_straight: bool,
    pub yaw: f32,
    pub pitch: f32,
}

impl AttentionSample {
    /// Sample used for frames with no usable detection.
    pub fn no_face() -> Self {
        Self {
            score: 0.0,
            is_looking_straight: false,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

/// Score a located face: rotation gates first, then distance from center
/// decays the score exponentially.
pub fn score_face(candidate: &FaceCandidate, config: &EngineConfig) -> AttentionSample {
    let rotation = candidate.rotation;
    let straight = is_looking_straight(rotation, config.yaw_tolerance, config.pitch_tolerance);

    let score = if straight {
        let dx = candidate.center_x - 0.5;
        let dy = candidate.center_y - 0.5;
        let distance = (dx * dx + dy * dy).sqrt();
        let half = config.focus_box_size / 2.0;
        let max_distance = (half * half * 2.0).sqrt();
        let normalized = (distance / max_distance).clamp(0.0, 1.0);
        (-config.distance_decay * normalized).exp()
    } else {
        ROTATED_SCORE
    };

    AttentionSample {
        score: score.clamp(0.0, 1.0),
        is_looking_straight: straight,
        yaw: rotation.yaw,
        pitch: rotation.pitch,
    }
}

/// Score a motion signal. Stillness reads as attention and central motion
/// earns a bonus. Motion carries no rotation, so the last known rotation is
/// reported and the sample counts as looking straight.
pub fn score_motion(signal: &MotionSignal, last_rotation: Rotation) -> AttentionSample {
    let stillness = (1.0 - signal.motion_level / 100.0).max(0.0);
    let bonus = if signal.is_in_center {
        CENTER_MOTION_BONUS
    } else {
        0.0
    };

    AttentionSample {
        score: (stillness + bonus).clamp(0.0, 1.0),
        is_looking_straight: true,
        yaw: last_rotation.yaw,
        pitch: last_rotation.pitch,
    }
}
