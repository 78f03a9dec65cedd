//! On-demand detector metrics.
//!
//! The history-derived figures deliberately cover only the smoothing window,
//! not the whole session: they describe the recent trend.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Snapshot of the engine's recent behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Mean `locate_and_score` time over the recent ring, in milliseconds.
    pub avg_processing_time_ms: f64,
    pub current_threshold: f32,
    /// Raw scores currently held by the smoother.
    pub history_length: usize,
    pub focus_box_size: f32,
    pub max_focus_streak: usize,
    /// Percentage of the window at or above the threshold.
    pub detection_rate: f32,
    /// Mean raw score of the window.
    pub session_quality_score: f32,
    /// `1 - variance` of the window, floored at 0.
    pub tracking_confidence: f32,
    pub current_yaw: f32,
    pub current_pitch: f32,
}

/// Longest run of consecutive scores at or above `threshold`.
pub fn max_focus_streak(history: &VecDeque<f32>, threshold: f32) -> usize {
    let mut best = 0;
    let mut run = 0;
    for &score in history {
        if score >= threshold {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

pub fn detection_rate(history: &VecDeque<f32>, threshold: f32) -> f32 {
    if history.is_empty() {
        return 0.0;
    }
    let above = history.iter().filter(|&&s| s >= threshold).count();
    above as f32 / history.len() as f32 * 100.0
}

pub fn mean(history: &VecDeque<f32>) -> f32 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().sum::<f32>() / history.len() as f32
}

/// Population variance.
pub fn variance(history: &VecDeque<f32>) -> f32 {
    if history.is_empty() {
        return 0.0;
    }
    let m = mean(history);
    history.iter().map(|s| (s - m).powi(2)).sum::<f32>() / history.len() as f32
}

pub fn tracking_confidence(history: &VecDeque<f32>) -> f32 {
    if history.is_empty() {
        return 0.0;
    }
    (1.0 - variance(history)).max(0.0)
}

/// Bounded ring of recent processing durations.
#[derive(Debug, Clone)]
pub struct ProcessingTimes {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl ProcessingTimes {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, elapsed: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed.as_secs_f64() * 1000.0);
    }

    /// Mean in milliseconds, 0 when empty.
    pub fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
