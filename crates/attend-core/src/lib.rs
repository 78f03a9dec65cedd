//! Heuristic attention scoring over raw camera frames.
//!
//! Each frame goes through the same pipeline: a skin/edge block scan looks for
//! a face, frame differencing stands in when none is found, the raw score is
//! smoothed over a short window and classified against an adaptive threshold,
//! and the result is folded into per-session statistics.
//!
//! [`AttentionEngine`] owns all of that state. The lower-level pieces are
//! public so callers can drive them individually.

pub mod block;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod locator;
pub mod metrics;
pub mod motion;
pub mod report;
pub mod rotation;
pub mod scorer;
pub mod session;
pub mod smoother;

pub use classify::FrameClass;
pub use config::{AdaptiveConfig, EngineConfig, RotationConfig};
pub use engine::{AttentionEngine, FrameOutcome, ScoredFrame};
pub use error::AttendError;
pub use frame::{Frame, PixelFormat};
pub use locator::FaceCandidate;
pub use metrics::PerformanceMetrics;
pub use motion::MotionSignal;
pub use report::{Assessment, SessionReport};
pub use rotation::{Rotation, RotationStatus};
pub use scorer::{AttentionSample, Detection};
pub use session::SessionStats;
