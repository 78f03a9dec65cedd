use serde::{Deserialize, Serialize};

use crate::error::AttendError;

/// Engine tunables. Every field has a default, so partial config files only
/// need to name the values they override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial smoothed-score threshold for a focused frame.
    pub focus_threshold: f32,
    /// Number of raw scores kept for exponential smoothing.
    pub smoothing_window: usize,
    /// Maximum |yaw| (degrees) still counted as looking straight ahead.
    pub yaw_tolerance: f32,
    /// Maximum |pitch| (degrees) still counted as looking straight ahead.
    pub pitch_tolerance: f32,
    /// |yaw| beyond which the rotation status names a left/right direction.
    pub distraction_yaw: f32,
    /// |pitch| beyond which the rotation status names an up/down direction.
    pub distraction_pitch: f32,
    /// Side of the centered focus box as a fraction of the frame.
    pub focus_box_size: f32,
    /// Decay constant applied to the normalized distance from center.
    pub distance_decay: f32,
    /// Block edge length (pixels) for the face locator grid.
    pub block_size: u32,
    /// Block confidence a face candidate must exceed.
    pub confidence_floor: f32,
    /// Analyze grid blocks on the rayon pool instead of the calling thread.
    pub parallel_scan: bool,
    /// Neighbour brightness difference that marks an edge pixel.
    pub edge_threshold: f32,
    /// Grayscale delta that marks a pixel as moving.
    pub motion_threshold: f32,
    /// Share of moving pixels that must fall in the focus box for centered motion.
    pub center_motion_ratio: f32,
    /// Rate at which the host is expected to submit frames.
    pub processing_fps: f32,
    /// Per-frame processing time (ms) above which a warning is logged.
    pub performance_warning_ms: f64,
    /// Number of processing durations kept for the average.
    pub max_processing_times: usize,
    pub rotation: RotationConfig,
    pub adaptive: AdaptiveConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            focus_threshold: 0.54,
            smoothing_window: 10,
            yaw_tolerance: 15.0,
            pitch_tolerance: 10.0,
            distraction_yaw: 20.0,
            distraction_pitch: 15.0,
            focus_box_size: 0.6,
            distance_decay: 1.5,
            block_size: 25,
            confidence_floor: 0.3,
            parallel_scan: true,
            edge_threshold: 25.0,
            motion_threshold: 30.0,
            center_motion_ratio: 0.3,
            processing_fps: 10.0,
            performance_warning_ms: 50.0,
            max_processing_times: 100,
            rotation: RotationConfig::default(),
            adaptive: AdaptiveConfig::default(),
        }
    }
}

/// Scaling and clamping for the brightness-asymmetry rotation heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Degrees per unit of top/bottom asymmetry.
    pub pitch_scale: f32,
    /// Degrees per unit of left/right asymmetry.
    pub yaw_scale: f32,
    pub max_pitch: f32,
    pub max_yaw: f32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            pitch_scale: 30.0,
            yaw_scale: 40.0,
            max_pitch: 30.0,
            max_yaw: 50.0,
        }
    }
}

/// Slow threshold tuning driven by the observed session focus ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub enabled: bool,
    /// Frames that must be recorded before any adjustment.
    pub min_frames: u64,
    /// Frames between adjustments once `min_frames` is reached.
    pub interval: u64,
    /// Focus ratio above which the threshold is raised.
    pub raise_above: f32,
    /// Focus ratio below which the threshold is lowered.
    pub lower_below: f32,
    pub step: f32,
    pub min_threshold: f32,
    pub max_threshold: f32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_frames: 100,
            interval: 100,
            raise_above: 0.9,
            lower_below: 0.1,
            step: 0.02,
            min_threshold: 0.4,
            max_threshold: 0.7,
        }
    }
}

impl EngineConfig {
    /// Check that every value is inside its legal domain. Non-finite floats are
    /// always rejected.
    pub fn validate(&self) -> Result<(), AttendError> {
        let invalid = |msg: String| -> Result<(), AttendError> { Err(AttendError::InvalidConfig(msg)) };

        let adaptive = &self.adaptive;
        let bounds = [
            ("adaptive.min_threshold", adaptive.min_threshold),
            ("adaptive.max_threshold", adaptive.max_threshold),
        ];
        for (name, value) in bounds {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must be in [0, 1], got {value}"));
            }
        }
        if adaptive.min_threshold > adaptive.max_threshold {
            return invalid(format!(
                "adaptive threshold bounds inverted: {} > {}",
                adaptive.min_threshold, adaptive.max_threshold
            ));
        }
        if !(adaptive.min_threshold..=adaptive.max_threshold).contains(&self.focus_threshold) {
            return invalid(format!(
                "focus_threshold must be in [{}, {}], got {}",
                adaptive.min_threshold, adaptive.max_threshold, self.focus_threshold
            ));
        }
        if adaptive.interval == 0 {
            return invalid("adaptive.interval must be > 0".into());
        }

        if self.smoothing_window == 0 {
            return invalid("smoothing_window must be > 0".into());
        }
        if self.block_size == 0 {
            return invalid("block_size must be > 0".into());
        }
        if !(self.focus_box_size > 0.0 && self.focus_box_size <= 1.0) {
            return invalid(format!(
                "focus_box_size must be in (0, 1], got {}",
                self.focus_box_size
            ));
        }
        if !(self.processing_fps > 0.0 && (1.0 / self.processing_fps).is_finite()) {
            return invalid(format!(
                "processing_fps must be a finite rate > 0, got {}",
                self.processing_fps
            ));
        }
        if self.max_processing_times == 0 {
            return invalid("max_processing_times must be > 0".into());
        }
        if !(self.performance_warning_ms.is_finite() && self.performance_warning_ms >= 0.0) {
            return invalid(format!(
                "performance_warning_ms must be >= 0, got {}",
                self.performance_warning_ms
            ));
        }

        let non_negative = [
            ("yaw_tolerance", self.yaw_tolerance),
            ("pitch_tolerance", self.pitch_tolerance),
            ("distraction_yaw", self.distraction_yaw),
            ("distraction_pitch", self.distraction_pitch),
            ("distance_decay", self.distance_decay),
            ("confidence_floor", self.confidence_floor),
            ("edge_threshold", self.edge_threshold),
            ("motion_threshold", self.motion_threshold),
            ("center_motion_ratio", self.center_motion_ratio),
            ("rotation.pitch_scale", self.rotation.pitch_scale),
            ("rotation.yaw_scale", self.rotation.yaw_scale),
            ("rotation.max_pitch", self.rotation.max_pitch),
            ("rotation.max_yaw", self.rotation.max_yaw),
            ("adaptive.raise_above", adaptive.raise_above),
            ("adaptive.lower_below", adaptive.lower_below),
            ("adaptive.step", adaptive.step),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!("{name} must be finite and >= 0, got {value}"));
            }
        }
        Ok(())
    }
}
