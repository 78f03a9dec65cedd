use attend_core::config::AdaptiveConfig;
use attend_core::session::FocusThreshold;
use attend_core::smoother::TemporalSmoother;
use attend_core::{
    AttentionEngine, Detection, EngineConfig, Frame, FrameClass, FrameOutcome, SessionStats,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

const BLOCK: u32 = 25;
const SKIN_TONES: [[u8; 3]; 3] = [[180, 120, 90], [200, 140, 110], [230, 220, 180]];

/// Small random RGBA frames: (width, height, pixels).
fn frame_strategy() -> impl Strategy<Value = (u32, u32, Vec<u8>)> {
    (20u32..80, 20u32..80).prop_flat_map(|(w, h)| {
        let len = (w * h * 4) as usize;
        (Just(w), Just(h), prop::collection::vec(any::<u8>(), len))
    })
}

/// Random noise with one skin-toned block painted at a random grid origin.
fn face_frame_strategy() -> impl Strategy<Value = (u32, u32, Vec<u8>)> {
    (60u32..120, 60u32..120).prop_flat_map(|(w, h)| {
        let cols = (w - BLOCK).div_ceil(BLOCK);
        let rows = (h - BLOCK).div_ceil(BLOCK);
        let len = (w * h * 4) as usize;
        (
            prop::collection::vec(any::<u8>(), len),
            0..cols,
            0..rows,
            prop::sample::select(SKIN_TONES.to_vec()),
        )
            .prop_map(move |(mut data, col, row, tone)| {
                let (x0, y0) = (col * BLOCK, row * BLOCK);
                for y in y0..y0 + BLOCK {
                    for x in x0..x0 + BLOCK {
                        let i = ((y * w + x) * 4) as usize;
                        data[i..i + 3].copy_from_slice(&tone);
                    }
                }
                (w, h, data)
            })
    })
}

fn check_outcome(outcome: &FrameOutcome, config: &EngineConfig) -> Result<(), TestCaseError> {
    prop_assert!((0.0..=1.0).contains(&outcome.raw.score));
    prop_assert!((0.0..=1.0).contains(&outcome.smoothed.score));
    prop_assert!(outcome.raw.yaw.abs() <= config.rotation.max_yaw);
    prop_assert!(outcome.raw.pitch.abs() <= config.rotation.max_pitch);
    if let Detection::Face(candidate) = outcome.detection {
        prop_assert!((0.0..=1.0).contains(&candidate.center_x));
        prop_assert!((0.0..=1.0).contains(&candidate.center_y));
        prop_assert!((0.0..=1.0).contains(&candidate.confidence));
    }
    if outcome.class == FrameClass::Focused {
        prop_assert!(outcome.smoothed.is_looking_straight);
    }
    Ok(())
}

fn class_strategy() -> impl Strategy<Value = FrameClass> {
    prop_oneof![
        Just(FrameClass::Focused),
        Just(FrameClass::Distracted),
        Just(FrameClass::NoFace),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_scores_and_rotation_stay_in_range(
        frames in prop::collection::vec(frame_strategy(), 1..4),
    ) {
        let config = EngineConfig::default();
        let mut engine = AttentionEngine::new(config.clone()).unwrap();

        for (w, h, data) in &frames {
            let frame = Frame::rgba(data, *w, *h).unwrap();
            let outcome = engine.process_frame(&frame);
            check_outcome(&outcome, &config)?;
        }

        let stats = engine.stats();
        prop_assert_eq!(stats.total_frames, frames.len() as u64);
        prop_assert_eq!(
            stats.total_frames,
            stats.focused_frames + stats.distracted_frames + stats.no_face_frames
        );
        prop_assert_eq!(engine.metrics(), engine.metrics());
    }

    #[test]
    fn test_painted_skin_block_is_located(
        frames in prop::collection::vec(face_frame_strategy(), 1..4),
    ) {
        let config = EngineConfig::default();
        let mut engine = AttentionEngine::new(config.clone()).unwrap();

        for (w, h, data) in &frames {
            let frame = Frame::rgba(data, *w, *h).unwrap();
            let outcome = engine.process_frame(&frame);
            prop_assert!(matches!(outcome.detection, Detection::Face(_)));
            prop_assert_ne!(outcome.class, FrameClass::NoFace);
            check_outcome(&outcome, &config)?;
        }
        prop_assert_eq!(engine.stats().no_face_frames, 0);
    }

    #[test]
    fn test_history_keeps_newest_window(
        window in 1usize..15,
        scores in prop::collection::vec(0.0f32..=1.0, 0..40),
    ) {
        let mut smoother = TemporalSmoother::new(window);
        for &score in &scores {
            let smoothed = smoother.push(score);
            prop_assert!((0.0..=1.0 + 1e-6).contains(&smoothed));
        }

        let kept: Vec<f32> = smoother.history().iter().copied().collect();
        let start = scores.len().saturating_sub(window);
        prop_assert_eq!(kept, scores[start..].to_vec());
    }

    #[test]
    fn test_threshold_stays_within_bounds(
        classes in prop::collection::vec(class_strategy(), 0..400),
    ) {
        let policy = AdaptiveConfig::default();
        let (low, high) = (policy.min_threshold, policy.max_threshold);
        let mut threshold = FocusThreshold::new(0.54, policy);
        let mut stats = SessionStats::new();

        for class in classes {
            stats.record(class);
            threshold.adapt(&stats);
            prop_assert!(threshold.value() >= low - 1e-6);
            prop_assert!(threshold.value() <= high + 1e-6);
        }
        prop_assert_eq!(
            stats.total_frames,
            stats.focused_frames + stats.distracted_frames + stats.no_face_frames
        );
    }
}
