//! Session-level aggregation of classified frames.
//!
//! [`SessionStats`] counts frames per class and cuts the session into
//! focus/distraction periods at every state transition. [`FocusThreshold`] is
//! the adaptive threshold tuned from the session's focus ratio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::FrameClass;
use crate::config::AdaptiveConfig;
use crate::report::Assessment;

/// Frames that must be recorded before a live assessment is given.
const LIVE_ASSESSMENT_MIN_FRAMES: u64 = 30;

/// A closed run of consecutive frames in one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub duration_secs: f64,
    /// When the run ended (the transition that closed it).
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_frames: u64,
    pub focused_frames: u64,
    pub distracted_frames: u64,
    pub no_face_frames: u64,
    pub session_start: Option<DateTime<Utc>>,
    pub focus_periods: Vec<Period>,
    pub distraction_periods: Vec<Period>,
    pub current_state: Option<FrameClass>,
    pub state_started_at: Option<DateTime<Utc>>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one classified frame at the current wall-clock time.
    pub fn record(&mut self, class: FrameClass) {
        self.record_at(class, Utc::now());
    }

    /// Record one classified frame observed at `now`.
    pub fn record_at(&mut self, class: FrameClass, now: DateTime<Utc>) {
        self.total_frames += 1;
        match class {
            FrameClass::Focused => self.focused_frames += 1,
            FrameClass::Distracted => self.distracted_frames += 1,
            FrameClass::NoFace => self.no_face_frames += 1,
        }

        if self.current_state != Some(class) {
            if let (Some(previous), Some(started)) = (self.current_state, self.state_started_at) {
                let period = Period {
                    duration_secs: (now - started).num_milliseconds() as f64 / 1000.0,
                    ended_at: now,
                };
                tracing::debug!(
                    from = previous.as_str(),
                    to = class.as_str(),
                    duration_secs = period.duration_secs,
                    "attention state changed"
                );
                match previous {
                    FrameClass::Focused => self.focus_periods.push(period),
                    FrameClass::Distracted => self.distraction_periods.push(period),
                    FrameClass::NoFace => {}
                }
            }
            self.current_state = Some(class);
            self.state_started_at = Some(now);
        }

        if self.session_start.is_none() {
            self.session_start = Some(now);
        }
    }

    /// Focused frames over all frames (no-face frames included), 0 when empty.
    pub fn focus_ratio(&self) -> f32 {
        ratio(self.focused_frames, self.total_frames)
    }

    pub fn focus_percent(&self) -> Option<f32> {
        percent(self.focused_frames, self.total_frames)
    }

    pub fn distracted_percent(&self) -> Option<f32> {
        percent(self.distracted_frames, self.total_frames)
    }

    pub fn no_face_percent(&self) -> Option<f32> {
        percent(self.no_face_frames, self.total_frames)
    }

    /// Running assessment; withheld until enough frames are in.
    pub fn live_assessment(&self) -> Option<Assessment> {
        if self.total_frames <= LIVE_ASSESSMENT_MIN_FRAMES {
            return None;
        }
        self.focus_percent().map(Assessment::from_focus_percent)
    }

    /// Minutes elapsed between session start and `now`, 0 before the first frame.
    pub fn duration_minutes(&self, now: DateTime<Utc>) -> f64 {
        self.session_start
            .map(|start| (now - start).num_milliseconds().max(0) as f64 / 60_000.0)
            .unwrap_or(0.0)
    }
}

fn ratio(part: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 / total as f32
    }
}

fn percent(part: u64, total: u64) -> Option<f32> {
    (total > 0).then(|| part as f32 * 100.0 / total as f32)
}

fn is_evaluation_frame(total_frames: u64, policy: &AdaptiveConfig) -> bool {
    total_frames >= policy.min_frames
        && (total_frames - policy.min_frames) % policy.interval.max(1) == 0
}

/// Focus threshold nudged by the session's focus ratio.
#[derive(Debug, Clone)]
pub struct FocusThreshold {
    value: f32,
    initial: f32,
    policy: AdaptiveConfig,
}

impl FocusThreshold {
    pub fn new(initial: f32, policy: AdaptiveConfig) -> Self {
        Self {
            value: initial,
            initial,
            policy,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = self.initial;
    }

    /// Raise the threshold one step when nearly every frame is focused, lower it
    /// when almost none are. The ratio is only evaluated once `min_frames`
    /// frames are in and then every `interval` frames, so the threshold moves
    /// at most one step per interval. Returns the new value if it changed.
    pub fn adapt(&mut self, stats: &SessionStats) -> Option<f32> {
        let policy = &self.policy;
        if !policy.enabled || !is_evaluation_frame(stats.total_frames, policy) {
            return None;
        }

        let focus_ratio = stats.focus_ratio();
        let next = if focus_ratio > policy.raise_above {
            (self.value + policy.step).min(policy.max_threshold)
        } else if focus_ratio < policy.lower_below {
            (self.value - policy.step).max(policy.min_threshold)
        } else {
            return None;
        };

        if next == self.value {
            return None;
        }
        tracing::info!(
            from = self.value,
            to = next,
            focus_ratio,
            frames = stats.total_frames,
            "focus threshold adjusted"
        );
        self.value = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    #[test]
    fn test_counts_and_totals() {
        let mut stats = SessionStats::new();
        for (i, class) in [
            FrameClass::Focused,
            FrameClass::Focused,
            FrameClass::Distracted,
            FrameClass::NoFace,
        ]
        .into_iter()
        .enumerate()
        {
            stats.record_at(class, t(i as i64 * 100));
        }
        assert_eq!(stats.total_frames, 4);
        assert_eq!(stats.focused_frames, 2);
        assert_eq!(stats.distracted_frames, 1);
        assert_eq!(stats.no_face_frames, 1);
        assert_eq!(stats.session_start, Some(t(0)));
    }

    #[test]
    fn test_periods_close_on_transition() {
        let mut stats = SessionStats::new();
        stats.record_at(FrameClass::Focused, t(0));
        stats.record_at(FrameClass::Focused, t(100));
        stats.record_at(FrameClass::Distracted, t(1500));
        stats.record_at(FrameClass::NoFace, t(2000));
        stats.record_at(FrameClass::Focused, t(3000));

        assert_eq!(stats.focus_periods.len(), 1);
        assert!((stats.focus_periods[0].duration_secs - 1.5).abs() < 1e-9);
        assert_eq!(stats.focus_periods[0].ended_at, t(1500));
        assert_eq!(stats.distraction_periods.len(), 1);
        assert!((stats.distraction_periods[0].duration_secs - 0.5).abs() < 1e-9);
        // No-face runs are counted, never recorded as periods.
        assert_eq!(stats.current_state, Some(FrameClass::Focused));
        assert_eq!(stats.state_started_at, Some(t(3000)));
    }

    #[test]
    fn test_first_frame_opens_no_period() {
        let mut stats = SessionStats::new();
        stats.record_at(FrameClass::Distracted, t(0));
        assert!(stats.focus_periods.is_empty());
        assert!(stats.distraction_periods.is_empty());
    }

    #[test]
    fn test_percentages_empty_and_filled() {
        let mut stats = SessionStats::new();
        assert_eq!(stats.focus_percent(), None);
        assert_eq!(stats.focus_ratio(), 0.0);
        stats.record_at(FrameClass::Focused, t(0));
        stats.record_at(FrameClass::NoFace, t(1));
        assert_eq!(stats.focus_percent(), Some(50.0));
        assert_eq!(stats.no_face_percent(), Some(50.0));
        assert_eq!(stats.distracted_percent(), Some(0.0));
    }

    #[test]
    fn test_live_assessment_waits_for_data() {
        let mut stats = SessionStats::new();
        for i in 0..30 {
            stats.record_at(FrameClass::Focused, t(i));
        }
        assert_eq!(stats.live_assessment(), None);
        stats.record_at(FrameClass::Focused, t(31));
        assert_eq!(stats.live_assessment(), Some(Assessment::Excellent));
    }

    #[test]
    fn test_duration_minutes() {
        let mut stats = SessionStats::new();
        assert_eq!(stats.duration_minutes(t(0)), 0.0);
        stats.record_at(FrameClass::Focused, t(0));
        let later = t(0) + Duration::seconds(90);
        assert!((stats.duration_minutes(later) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_waits_for_min_frames() {
        let mut threshold = FocusThreshold::new(0.54, AdaptiveConfig::default());
        let mut stats = SessionStats::new();
        for i in 0..99 {
            stats.record_at(FrameClass::Focused, t(i));
            assert_eq!(threshold.adapt(&stats), None);
        }
        assert_eq!(threshold.value(), 0.54);
    }

    #[test]
    fn test_threshold_raised_once_over_150_frames() {
        let mut threshold = FocusThreshold::new(0.54, AdaptiveConfig::default());
        let mut stats = SessionStats::new();

        // 140 of 150 focused, the 10 distracted frames spread evenly.
        for i in 0..150 {
            let class = if i % 15 == 14 {
                FrameClass::Distracted
            } else {
                FrameClass::Focused
            };
            stats.record_at(class, t(i));
            threshold.adapt(&stats);
        }
        assert_eq!(stats.focused_frames, 140);
        assert!((threshold.value() - 0.56).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_steps_once_per_interval_up_to_cap() {
        let mut threshold = FocusThreshold::new(0.54, AdaptiveConfig::default());
        let mut stats = SessionStats::new();
        let mut changes = Vec::new();
        for i in 0..1000 {
            stats.record_at(FrameClass::Focused, t(i));
            if threshold.adapt(&stats).is_some() {
                changes.push(stats.total_frames);
            }
        }
        assert_eq!(changes[0], 100);
        assert!(changes.windows(2).all(|w| w[1] - w[0] == 100));
        assert!(changes.len() >= 8);
        assert!((threshold.value() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_lowered_to_floor() {
        let mut threshold = FocusThreshold::new(0.54, AdaptiveConfig::default());
        let mut stats = SessionStats::new();
        for i in 0..200 {
            stats.record_at(FrameClass::Distracted, t(i));
            threshold.adapt(&stats);
        }
        // Evaluated at frames 100 and 200 only.
        assert!((threshold.value() - 0.50).abs() < 1e-6);

        for i in 200..1000 {
            stats.record_at(FrameClass::Distracted, t(i));
            threshold.adapt(&stats);
        }
        assert!((threshold.value() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_holds_in_middle_band() {
        let mut threshold = FocusThreshold::new(0.54, AdaptiveConfig::default());
        let mut stats = SessionStats::new();
        for i in 0..150 {
            let class = if i % 2 == 0 {
                FrameClass::Focused
            } else {
                FrameClass::Distracted
            };
            stats.record_at(class, t(i));
            threshold.adapt(&stats);
        }
        assert_eq!(threshold.value(), 0.54);
    }

    #[test]
    fn test_disabled_policy_never_adapts() {
        let policy = AdaptiveConfig {
            enabled: false,
            ..Default::default()
        };
        let mut threshold = FocusThreshold::new(0.54, policy);
        let mut stats = SessionStats::new();
        for i in 0..150 {
            stats.record_at(FrameClass::Focused, t(i));
            threshold.adapt(&stats);
        }
        assert_eq!(threshold.value(), 0.54);
        threshold.reset();
        assert_eq!(threshold.value(), 0.54);
    }
}
