//! Exponentially weighted smoothing over a bounded score history.
//!
//! With `k` scores in the window, entry `i` (0 = oldest, `k - 1` = newest)
//! weighs `exp((i - k + 1) / k)`. The newest entry always weighs 1 and the
//! oldest `exp((1 - k) / k)`, so the decay sharpens as the window fills rather
//! than following a fixed time constant.

use std::collections::VecDeque;

use crate::scorer::AttentionSample;

pub struct TemporalSmoother {
    window: usize,
    history: VecDeque<f32>,
}

impl TemporalSmoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    /// Append a raw score and return the weighted average of the window.
    pub fn push(&mut self, score: f32) -> f32 {
        self.history.push_back(score.clamp(0.0, 1.0));
        while self.history.len() > self.window {
            self.history.pop_front();
        }
        weighted_average(&self.history)
    }

    /// Smooth a sample's score. Rotation fields pass through unsmoothed.
    pub fn smooth(&mut self, sample: AttentionSample) -> AttentionSample {
        AttentionSample {
            score: self.push(sample.score),
            ..sample
        }
    }

    /// Raw scores, oldest first.
    pub fn history(&self) -> &VecDeque<f32> {
        &self.history
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

fn weighted_average(history: &VecDeque<f32>) -> f32 {
    let k = history.len();
    if k == 0 {
        return 0.0;
    }
    let kf = k as f32;
    let (weighted, total) = history
        .iter()
        .enumerate()
        .fold((0.0f32, 0.0f32), |(weighted, total), (i, &score)| {
            let w = ((i as f32 - kf + 1.0) / kf).exp();
            (weighted + score * w, total + w)
        });
    (weighted / total).clamp(0.0, 1.0)
}
