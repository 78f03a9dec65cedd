use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::{classify, FrameClass};
use crate::config::EngineConfig;
use crate::error::AttendError;
use crate::frame::{Frame, PixelFormat};
use crate::locator::locate_face;
use crate::metrics::{self, PerformanceMetrics, ProcessingTimes};
use crate::motion::MotionDetector;
use crate::report::SessionReport;
use crate::rotation::{Rotation, RotationStatus};
use crate::scorer::{score_face, score_motion, AttentionSample, Detection};
use crate::session::{FocusThreshold, SessionStats};
use crate::smoother::TemporalSmoother;

/// Detection and raw score for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredFrame {
    pub detection: Detection,
    pub sample: AttentionSample,
}

impl ScoredFrame {
    pub fn is_no_face(&self) -> bool {
        matches!(self.detection, Detection::NoFace)
    }
}

/// Result of running the full pipeline on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub detection: Detection,
    pub raw: AttentionSample,
    /// Equal to `raw` for no-face frames, which bypass the smoother.
    pub smoothed: AttentionSample,
    pub class: FrameClass,
}

/// Owns every piece of mutable detector state: the motion snapshot, the score
/// history, the adaptive threshold and the session counters. One instance per
/// session; frames are processed strictly one at a time through `&mut self`.
pub struct AttentionEngine {
    config: EngineConfig,
    motion: MotionDetector,
    smoother: TemporalSmoother,
    threshold: FocusThreshold,
    stats: SessionStats,
    processing: ProcessingTimes,
    rotation: Rotation,
}

impl AttentionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, AttendError> {
        config.validate()?;
        Ok(Self {
            motion: MotionDetector::new(
                config.motion_threshold,
                config.focus_box_size,
                config.center_motion_ratio,
            ),
            smoother: TemporalSmoother::new(config.smoothing_window),
            threshold: FocusThreshold::new(config.focus_threshold, config.adaptive.clone()),
            stats: SessionStats::new(),
            processing: ProcessingTimes::new(config.max_processing_times),
            rotation: Rotation::default(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Find a face, falling back to frame-difference motion. A motion signal
    /// without a previous frame to compare against is reported as no face.
    pub fn locate(&mut self, frame: &Frame<'_>) -> Detection {
        if let Some(candidate) = locate_face(frame, &self.config) {
            return Detection::Face(candidate);
        }
        let signal = self.motion.detect(frame);
        if signal.has_baseline {
            Detection::Motion(signal)
        } else {
            Detection::NoFace
        }
    }

    /// Locate and score one frame.
    pub fn locate_and_score(&mut self, frame: &Frame<'_>) -> ScoredFrame {
        let started = Instant::now();

        let detection = self.locate(frame);
        let sample = match &detection {
            Detection::Face(candidate) => {
                self.rotation = candidate.rotation;
                score_face(candidate, &self.config)
            }
            Detection::Motion(signal) => score_motion(signal, self.rotation),
            Detection::NoFace => AttentionSample::no_face(),
        };

        let elapsed = started.elapsed();
        self.processing.push(elapsed);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if elapsed_ms > self.config.performance_warning_ms {
            tracing::warn!(
                elapsed_ms,
                budget_ms = self.config.performance_warning_ms,
                width = frame.width(),
                height = frame.height(),
                "frame processing over budget"
            );
        }

        ScoredFrame { detection, sample }
    }

    pub fn smooth(&mut self, sample: AttentionSample) -> AttentionSample {
        self.smoother.smooth(sample)
    }

    pub fn classify(&self, smoothed: &AttentionSample) -> FrameClass {
        classify(smoothed, self.threshold.value())
    }

    /// Record a classified frame and let the threshold adapt.
    pub fn record(&mut self, class: FrameClass) -> &SessionStats {
        self.record_at(class, Utc::now())
    }

    pub fn record_at(&mut self, class: FrameClass, now: DateTime<Utc>) -> &SessionStats {
        self.stats.record_at(class, now);
        self.threshold.adapt(&self.stats);
        &self.stats
    }

    /// Run locate → score → smooth → classify → record on one frame.
    pub fn process_frame(&mut self, frame: &Frame<'_>) -> FrameOutcome {
        let scored = self.locate_and_score(frame);
        let (smoothed, class) = if scored.is_no_face() {
            (scored.sample, FrameClass::NoFace)
        } else {
            let smoothed = self.smooth(scored.sample);
            (smoothed, self.classify(&smoothed))
        };
        self.record(class);

        tracing::trace!(
            raw = scored.sample.score,
            smoothed = smoothed.score,
            class = class.as_str(),
            "frame processed"
        );

        FrameOutcome {
            detection: scored.detection,
            raw: scored.sample,
            smoothed,
            class,
        }
    }

    /// Validate a raw buffer and process it.
    pub fn process_raw(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<FrameOutcome, AttendError> {
        let frame = Frame::new(data, width, height, format)?;
        Ok(self.process_frame(&frame))
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        let history = self.smoother.history();
        let threshold = self.threshold.value();
        PerformanceMetrics {
            avg_processing_time_ms: self.processing.average_ms(),
            current_threshold: threshold,
            history_length: history.len(),
            focus_box_size: self.config.focus_box_size,
            max_focus_streak: metrics::max_focus_streak(history, threshold),
            detection_rate: metrics::detection_rate(history, threshold),
            session_quality_score: metrics::mean(history),
            tracking_confidence: metrics::tracking_confidence(history),
            current_yaw: self.rotation.yaw,
            current_pitch: self.rotation.pitch,
        }
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn threshold(&self) -> f32 {
        self.threshold.value()
    }

    /// Raw scores currently in the smoothing window, oldest first.
    pub fn history(&self) -> impl Iterator<Item = f32> + '_ {
        self.smoother.history().iter().copied()
    }

    pub fn rotation_status(&self) -> RotationStatus {
        RotationStatus::describe(self.rotation, &self.config)
    }

    pub fn report(&self) -> SessionReport {
        self.report_at(Utc::now())
    }

    pub fn report_at(&self, now: DateTime<Utc>) -> SessionReport {
        SessionReport::build(&self.stats, self.metrics(), now)
    }

    /// Clear score history, motion snapshot, processing times and rotation,
    /// and restore the configured threshold. Session counters are kept.
    pub fn reset(&mut self) {
        self.smoother.clear();
        self.motion.reset();
        self.threshold.reset();
        self.processing.clear();
        self.rotation = Rotation::default();
        tracing::debug!("detector state reset");
    }

    /// Reset detector state and start a fresh session.
    pub fn reset_session(&mut self) {
        self.reset();
        self.stats = SessionStats::new();
    }
}
