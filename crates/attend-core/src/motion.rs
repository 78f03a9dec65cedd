//! Frame-difference motion fallback.
//!
//! Used when no block looks like a face. The detector keeps one brightness
//! snapshot of the previous frame and compares the current frame against it
//! pixel by pixel. The snapshot is replaced on every call.

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// Amount and placement of motion between two consecutive frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSignal {
    /// Percentage (0–100) of pixels whose brightness changed beyond the threshold.
    pub motion_level: f32,
    /// Whether enough of the motion falls inside the centered focus box.
    pub is_in_center: bool,
    /// False when there was no comparable previous frame; the signal is then
    /// the zero-motion default and carries no information.
    pub has_baseline: bool,
}

impl MotionSignal {
    fn without_baseline() -> Self {
        Self {
            motion_level: 0.0,
            is_in_center: true,
            has_baseline: false,
        }
    }
}

struct Snapshot {
    width: u32,
    height: u32,
    brightness: Vec<f32>,
}

pub struct MotionDetector {
    previous: Option<Snapshot>,
    /// Brightness delta above which a pixel counts as moving.
    threshold: f32,
    /// Side of the centered region as a fraction of the frame.
    center_size: f32,
    /// Fraction of moving pixels that must be central.
    center_ratio: f32,
}

impl MotionDetector {
    pub fn new(threshold: f32, center_size: f32, center_ratio: f32) -> Self {
        Self {
            previous: None,
            threshold,
            center_size,
            center_ratio,
        }
    }

    pub fn has_snapshot(&self) -> bool {
        self.previous.is_some()
    }

    /// Drop the stored snapshot; the next call behaves like the first.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Compare `frame` with the stored snapshot, then store `frame`.
    ///
    /// The first call, and any call after the frame size changed, returns a
    /// zero-motion signal without a baseline.
    pub fn detect(&mut self, frame: &Frame<'_>) -> MotionSignal {
        let current = Snapshot {
            width: frame.width(),
            height: frame.height(),
            brightness: frame.brightness_plane(),
        };

        let signal = match self.previous.as_ref() {
            Some(prev) if prev.width == current.width && prev.height == current.height => {
                self.compare(prev, &current)
            }
            Some(prev) => {
                tracing::debug!(
                    old_width = prev.width,
                    old_height = prev.height,
                    width = current.width,
                    height = current.height,
                    "frame size changed; discarding motion snapshot"
                );
                MotionSignal::without_baseline()
            }
            None => MotionSignal::without_baseline(),
        };

        self.previous = Some(current);
        signal
    }

    fn compare(&self, prev: &Snapshot, current: &Snapshot) -> MotionSignal {
        let width = current.width as usize;
        let height = current.height as usize;
        let (cx, cw) = center_span(width, self.center_size);
        let (cy, ch) = center_span(height, self.center_size);

        let mut moving = 0usize;
        let mut center_moving = 0usize;

        for (i, (now, before)) in current.brightness.iter().zip(&prev.brightness).enumerate() {
            if (now - before).abs() <= self.threshold {
                continue;
            }
            moving += 1;
            let (x, y) = (i % width, i / width);
            if x >= cx && x < cx + cw && y >= cy && y < cy + ch {
                center_moving += 1;
            }
        }

        let total = width * height;
        MotionSignal {
            motion_level: (moving as f32 / total as f32 * 100.0).clamp(0.0, 100.0),
            is_in_center: center_moving as f32 > moving as f32 * self.center_ratio,
            has_baseline: true,
        }
    }
}

/// Offset and length of the centered span covering `fraction` of `len` pixels.
/// The small bias keeps e.g. `10 × 0.6` from flooring to 5 under f32 rounding.
/// The offset is `(len - span) / 2`, which centers the span itself. A margin
/// computed independently as `floor(len × (1 - fraction) / 2)` can land one
/// pixel earlier: at 13 px and 0.6 this gives offset 3, that gives 2.
fn center_span(len: usize, fraction: f32) -> (usize, usize) {
    let span = ((len as f64 * fraction as f64) + 1e-4).floor() as usize;
    let span = span.min(len);
    ((len - span) / 2, span)
}
