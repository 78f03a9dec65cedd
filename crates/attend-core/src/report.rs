//! Session summary built from [`SessionStats`] and [`PerformanceMetrics`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;
use crate::session::{Period, SessionStats};

/// No-face share (of all frames) above which the report flags detection trouble.
const FACE_DETECTION_ISSUE_RATIO: f64 = 0.2;

/// Session grade from the focused-frame percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    /// ≥ 90% focused.
    Excellent,
    /// ≥ 80%.
    Good,
    /// ≥ 70%.
    Moderate,
    /// ≥ 60%.
    BelowAverage,
    Poor,
}

impl Assessment {
    pub fn from_focus_percent(percent: f32) -> Self {
        if percent >= 90.0 {
            Self::Excellent
        } else if percent >= 80.0 {
            Self::Good
        } else if percent >= 70.0 {
            Self::Moderate
        } else if percent >= 60.0 {
            Self::BelowAverage
        } else {
            Self::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent session",
            Self::Good => "Good session",
            Self::Moderate => "Moderate session",
            Self::BelowAverage => "Below average session",
            Self::Poor => "Poor session",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub count: usize,
    pub longest_secs: f64,
    pub mean_secs: f64,
}

impl PeriodSummary {
    pub fn from_periods(periods: &[Period]) -> Self {
        if periods.is_empty() {
            return Self::default();
        }
        let total: f64 = periods.iter().map(|p| p.duration_secs).sum();
        Self {
            count: periods.len(),
            longest_secs: periods
                .iter()
                .map(|p| p.duration_secs)
                .fold(0.0, f64::max),
            mean_secs: total / periods.len() as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub generated_at: DateTime<Utc>,
    pub duration_minutes: f64,
    pub total_frames: u64,
    pub focused_frames: u64,
    pub distracted_frames: u64,
    pub no_face_frames: u64,
    /// `None` when no frames were recorded.
    pub focus_percent: Option<f32>,
    pub distracted_percent: Option<f32>,
    pub no_face_percent: Option<f32>,
    pub assessment: Assessment,
    pub assessment_label: String,
    pub face_detection_issues: bool,
    pub focus_periods: PeriodSummary,
    pub distraction_periods: PeriodSummary,
    pub session_quality_percent: f32,
    pub metrics: PerformanceMetrics,
}

impl SessionReport {
    pub fn build(stats: &SessionStats, metrics: PerformanceMetrics, now: DateTime<Utc>) -> Self {
        let focus_percent = stats.focus_percent();
        let (assessment, assessment_label) = match focus_percent {
            Some(p) => {
                let a = Assessment::from_focus_percent(p);
                (a, a.label().to_string())
            }
            None => (Assessment::Moderate, "Session completed".to_string()),
        };

        Self {
            generated_at: now,
            duration_minutes: stats.duration_minutes(now),
            total_frames: stats.total_frames,
            focused_frames: stats.focused_frames,
            distracted_frames: stats.distracted_frames,
            no_face_frames: stats.no_face_frames,
            focus_percent,
            distracted_percent: stats.distracted_percent(),
            no_face_percent: stats.no_face_percent(),
            assessment,
            assessment_label,
            face_detection_issues: stats.no_face_frames as f64
                > stats.total_frames as f64 * FACE_DETECTION_ISSUE_RATIO,
            focus_periods: PeriodSummary::from_periods(&stats.focus_periods),
            distraction_periods: PeriodSummary::from_periods(&stats.distraction_periods),
            session_quality_percent: metrics.session_quality_score * 100.0,
            metrics,
        }
    }
}
