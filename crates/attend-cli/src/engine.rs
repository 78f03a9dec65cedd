use attend_core::{
    AttendError, AttentionEngine, EngineConfig, Frame, FrameOutcome, PerformanceMetrics,
    SessionReport,
};
use image::RgbaImage;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Attend(#[from] AttendError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Messages sent from the frame loop to the engine thread.
enum EngineRequest {
    Process {
        frame: RgbaImage,
        reply: oneshot::Sender<Result<FrameOutcome, EngineError>>,
    },
    Metrics {
        reply: oneshot::Sender<PerformanceMetrics>,
    },
    Report {
        reply: oneshot::Sender<SessionReport>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Score one decoded frame. Frames are processed in submission order.
    pub async fn process(&self, frame: RgbaImage) -> Result<FrameOutcome, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineRequest::Process {
            frame,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    pub async fn metrics(&self) -> Result<PerformanceMetrics, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineRequest::Metrics { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    pub async fn report(&self) -> Result<SessionReport, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineRequest::Report { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Clear detector state. Session counters are kept.
    pub async fn reset(&self) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(EngineRequest::Reset { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    async fn send(&self, request: EngineRequest) -> Result<(), EngineError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The configuration is validated before the thread starts. The thread exits
/// once every handle has been dropped.
pub fn spawn_engine(config: EngineConfig) -> Result<EngineHandle, EngineError> {
    let mut engine = AttentionEngine::new(config)?;
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("attend-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Process { frame, reply } => {
                        let result = run_process(&mut engine, &frame);
                        let _ = reply.send(result);
                    }
                    EngineRequest::Metrics { reply } => {
                        let _ = reply.send(engine.metrics());
                    }
                    EngineRequest::Report { reply } => {
                        let _ = reply.send(engine.report());
                    }
                    EngineRequest::Reset { reply } => {
                        engine.reset();
                        let _ = reply.send(());
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })?;

    Ok(EngineHandle { tx })
}

fn run_process(
    engine: &mut AttentionEngine,
    image: &RgbaImage,
) -> Result<FrameOutcome, EngineError> {
    let frame = Frame::rgba(image.as_raw(), image.width(), image.height())?;
    let outcome = engine.process_frame(&frame);
    tracing::debug!(
        class = outcome.class.as_str(),
        score = outcome.smoothed.score,
        threshold = engine.threshold(),
        "frame scored"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attend_core::{Detection, FrameClass};
    use image::Rgba;

    fn face_image() -> RgbaImage {
        RgbaImage::from_fn(125, 125, |x, y| {
            if (50..75).contains(&x) && (50..75).contains(&y) {
                Rgba([180, 120, 90, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_invalid_config_fails_before_spawn() {
        let config = EngineConfig {
            smoothing_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            spawn_engine(config),
            Err(EngineError::Attend(AttendError::InvalidConfig(_)))
        ));
    }

    #[tokio::test]
    async fn test_process_and_report() {
        let handle = spawn_engine(EngineConfig::default()).unwrap();
        for _ in 0..3 {
            let outcome = handle.process(face_image()).await.unwrap();
            assert!(matches!(outcome.detection, Detection::Face(_)));
            assert_eq!(outcome.class, FrameClass::Focused);
        }

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.history_length, 3);

        let report = handle.report().await.unwrap();
        assert_eq!(report.total_frames, 3);
        assert_eq!(report.focused_frames, 3);
    }

    #[tokio::test]
    async fn test_empty_image_is_rejected() {
        let handle = spawn_engine(EngineConfig::default()).unwrap();
        let err = handle.process(RgbaImage::new(0, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Attend(AttendError::InvalidFrame { .. })
        ));
        // A rejected frame is never recorded.
        assert_eq!(handle.report().await.unwrap().total_frames, 0);
    }

    #[tokio::test]
    async fn test_reset_keeps_session_counters() {
        let handle = spawn_engine(EngineConfig::default()).unwrap();
        handle.process(face_image()).await.unwrap();
        handle.reset().await.unwrap();

        assert_eq!(handle.metrics().await.unwrap().history_length, 0);
        assert_eq!(handle.report().await.unwrap().total_frames, 1);
    }

    #[tokio::test]
    async fn test_cloned_handles_share_engine() {
        let handle = spawn_engine(EngineConfig::default()).unwrap();
        let other = handle.clone();
        handle.process(face_image()).await.unwrap();
        other.process(face_image()).await.unwrap();
        assert_eq!(other.report().await.unwrap().total_frames, 2);
    }
}
