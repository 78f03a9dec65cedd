use serde::{Deserialize, Serialize};

use crate::scorer::AttentionSample;

/// Per-frame focus classification. Exactly one is recorded per processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameClass {
    Focused,
    Distracted,
    NoFace,
}

impl FrameClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Focused => "focused",
            Self::Distracted => "distracted",
            Self::NoFace => "no_face",
        }
    }
}

/// Focused only when the smoothed score clears the threshold and the head is
/// straight. Rotation alone vetoes an otherwise high score.
pub fn classify(smoothed: &AttentionSample, threshold: f32) -> FrameClass {
    if smoothed.score >= threshold && smoothed.is_looking_straight {
        FrameClass::Focused
    } else {
        FrameClass::Distracted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(score: f32, straight: bool) -> AttentionSample {
        AttentionSample {
            score,
            is_looking_straight: straight,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(classify(&sample(0.54, true), 0.54), FrameClass::Focused);
        assert_eq!(classify(&sample(0.53, true), 0.54), FrameClass::Distracted);
    }

    #[test]
    fn test_rotation_vetoes_high_score() {
        assert_eq!(classify(&sample(1.0, false), 0.54), FrameClass::Distracted);
    }
}
