//! JSON-lines landmark frame feed
//!
//! One `LandmarkFrame` per line, as produced by the detector process.
//! Frame timestamps are replaced with the runtime clock on submission.

use monitor::LandmarkFrame;
use monitor_runtime::{MonitorHandle, RuntimeError};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

/// What happened to the lines read from the feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub lines: u64,
    pub submitted: u64,
    pub dropped_busy: u64,
    pub malformed: u64,
}

/// Read frames until end of input and hand them to the runtime
pub async fn pump<R>(reader: R, handle: &MonitorHandle) -> Result<FeedStats, RuntimeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = FeedStats::default();
    let mut lines = reader.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Frame feed read failed: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let frame: LandmarkFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping malformed frame on line {}: {}", stats.lines, e);
                stats.malformed += 1;
                continue;
            }
        };

        match handle.submit_frame(frame) {
            Ok(()) => stats.submitted += 1,
            Err(RuntimeError::Busy) => stats.dropped_busy += 1,
            Err(e) => return Err(e),
        }

        // Let the pipeline take the frame before reading the next line
        tokio::task::yield_now().await;
    }

    debug!("Frame feed ended: {:?}", stats);
    info!(
        "Frame feed closed after {} lines ({} submitted, {} busy, {} malformed)",
        stats.lines, stats.submitted, stats.dropped_busy, stats.malformed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use landmarks::{FaceEvidence, LandmarkKind, PoseEvidence, PoseLandmark};
    use monitor::{MonitorConfig, MonitorEngine};
    use monitor_runtime::{MonitorRuntime, RuntimeConfig};
    use peripheral_link::PeripheralClient;

    fn frame_line() -> String {
        let frame = LandmarkFrame::empty(0)
            .with_face(FaceEvidence {
                left_eye_open: Some(0.8),
                right_eye_open: Some(0.9),
                tracking_id: Some(3),
                ..Default::default()
            })
            .with_pose(PoseEvidence::new(vec![PoseLandmark::new(
                LandmarkKind::Nose,
                0.5,
                0.4,
                0.95,
            )]));
        serde_json::to_string(&frame).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_counts_lines() {
        let (client, _peer) = PeripheralClient::mock();
        let handle = MonitorRuntime::spawn(
            MonitorEngine::new(MonitorConfig::default()),
            client,
            RuntimeConfig::default(),
        );
        handle.start().await.unwrap();

        let input = format!("{}\nnot a frame\n\n{}\n", frame_line(), frame_line());
        let stats = pump(input.as_bytes(), &handle).await.unwrap();

        assert_eq!(stats.lines, 3);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.submitted + stats.dropped_busy, 2);
        assert!(stats.submitted >= 1);

        handle.release().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pump_stops_after_release() {
        let (client, _peer) = PeripheralClient::mock();
        let handle = MonitorRuntime::spawn(
            MonitorEngine::new(MonitorConfig::default()),
            client,
            RuntimeConfig::default(),
        );
        handle.release().await.unwrap();

        let input = format!("{}\n", frame_line());
        assert_eq!(
            pump(input.as_bytes(), &handle).await,
            Err(RuntimeError::Released)
        );
    }
}
