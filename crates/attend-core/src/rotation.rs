//! Head rotation from brightness asymmetry.
//!
//! A face turned away from the camera lights one side of its bounding block
//! more than the other. Comparing the mean brightness of a block's opposite
//! border rows/columns gives a signed indicator in `[-1, 1]`, which is scaled
//! to degrees and clamped.
//!
//! This is an approximation, not geometric pose estimation. The estimate is
//! monotonic in the asymmetry but not metrically accurate: a 20° reading does
//! not mean the head is turned 20°. Scale factors are configurable for that
//! reason.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, RotationConfig};

/// Mean brightness of a block's four border lines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BorderProfile {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

/// Estimated head rotation in degrees. Positive yaw turns right, positive
/// pitch tilts down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub yaw: f32,
    pub pitch: f32,
}

/// Estimate yaw and pitch from a border profile.
pub fn estimate_rotation(profile: &BorderProfile, config: &RotationConfig) -> Rotation {
    let pitch_indicator =
        (profile.top - profile.bottom) / profile.top.max(profile.bottom).max(1.0);
    let yaw_indicator = (profile.right - profile.left) / profile.left.max(profile.right).max(1.0);

    Rotation {
        yaw: (yaw_indicator * config.yaw_scale).clamp(-config.max_yaw, config.max_yaw),
        pitch: (pitch_indicator * config.pitch_scale).clamp(-config.max_pitch, config.max_pitch),
    }
}

/// Whether a rotation is within the straight-ahead tolerances.
pub fn is_looking_straight(rotation: Rotation, yaw_tolerance: f32, pitch_tolerance: f32) -> bool {
    rotation.yaw.abs() <= yaw_tolerance && rotation.pitch.abs() <= pitch_tolerance
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Up,
    Down,
}

/// Human-facing description of where the head is pointing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStatus {
    Straight,
    /// Outside the straight tolerances but inside both distraction thresholds.
    SlightlyOffCenter,
    Turned {
        horizontal: Option<Horizontal>,
        vertical: Option<Vertical>,
    },
}

impl RotationStatus {
    pub fn describe(rotation: Rotation, config: &EngineConfig) -> Self {
        if is_looking_straight(rotation, config.yaw_tolerance, config.pitch_tolerance) {
            return Self::Straight;
        }

        let horizontal = (rotation.yaw.abs() > config.distraction_yaw).then(|| {
            if rotation.yaw > 0.0 {
                Horizontal::Right
            } else {
                Horizontal::Left
            }
        });
        let vertical = (rotation.pitch.abs() > config.distraction_pitch).then(|| {
            if rotation.pitch > 0.0 {
                Vertical::Down
            } else {
                Vertical::Up
            }
        });

        if horizontal.is_none() && vertical.is_none() {
            Self::SlightlyOffCenter
        } else {
            Self::Turned {
                horizontal,
                vertical,
            }
        }
    }
}

impl fmt::Display for RotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Straight => f.write_str("Looking Straight"),
            Self::SlightlyOffCenter => f.write_str("Slightly Off-Center"),
            Self::Turned {
                horizontal,
                vertical,
            } => {
                let h = horizontal.map(|h| match h {
                    Horizontal::Left => "Left",
                    Horizontal::Right => "Right",
                });
                let v = vertical.map(|v| match v {
                    Vertical::Up => "Up",
                    Vertical::Down => "Down",
                });
                match (h, v) {
                    (Some(h), Some(v)) => write!(f, "{h} {v}"),
                    (Some(s), None) | (None, Some(s)) => f.write_str(s),
                    (None, None) => f.write_str("Slightly Off-Center"),
                }
            }
        }
    }
}
