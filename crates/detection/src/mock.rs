//! Mock frame sources and detectors
//!
//! Deterministic stand-ins for the camera and the vision model, used by
//! tests, demos, and mock-mode runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    DetectionResult, FrameSource, SignalError, TrafficFrame, VehicleDetector, VehicleObservation,
};
use tokio::time::sleep;
use tracing::debug;

/// Mock frame source configuration
#[derive(Debug, Clone)]
pub struct MockFrameSourceConfig {
    /// Source identifier (stands in for a device path).
    pub source_id: String,

    /// Frame rate (Hz).
    pub fps: f64,

    /// Fail every Nth read (None = never).
    pub fail_every: Option<u64>,

    /// Synthetic payload size in bytes.
    pub frame_bytes: usize,
}

impl Default for MockFrameSourceConfig {
    fn default() -> Self {
        Self {
            source_id: "mock_camera".to_string(),
            fps: 20.0,
            fail_every: None,
            frame_bytes: 64 * 64,
        }
    }
}

/// Paced synthetic frame source.
pub struct MockFrameSource {
    config: MockFrameSourceConfig,
    sequence: u64,
    started: Option<Instant>,
}

impl MockFrameSource {
    pub fn new(config: MockFrameSourceConfig) -> Self {
        Self {
            config,
            sequence: 0,
            started: None,
        }
    }

    /// Source with defaults and the given id.
    pub fn with_source_id(source_id: impl Into<String>) -> Self {
        Self::new(MockFrameSourceConfig {
            source_id: source_id.into(),
            ..Default::default()
        })
    }
}

impl FrameSource for MockFrameSource {
    fn source_id(&self) -> &str {
        &self.config.source_id
    }

    async fn next_frame(&mut self) -> Result<TrafficFrame, SignalError> {
        let interval = Duration::from_secs_f64(1.0 / self.config.fps);
        sleep(interval).await;

        self.sequence += 1;

        if let Some(n) = self.config.fail_every {
            if self.sequence.is_multiple_of(n) {
                debug!(source = %self.config.source_id, frame = self.sequence, "injected read failure");
                return Err(SignalError::frame_read(
                    &self.config.source_id,
                    "injected read failure",
                ));
            }
        }

        let started = *self.started.get_or_insert_with(Instant::now);
        Ok(TrafficFrame::new(
            self.sequence,
            started.elapsed().as_secs_f64(),
            Bytes::from(vec![128u8; self.config.frame_bytes]),
        ))
    }
}

/// Mock detector configuration
#[derive(Debug, Clone)]
pub struct MockDetectorConfig {
    /// Baseline vehicle counts per class.
    pub base_counts: HashMap<String, u32>,

    /// Extra cars added cyclically by frame sequence, simulating load swings.
    pub ripple: u32,

    /// Raise the emergency flag on every analyzed frame from this sequence
    /// on (the vehicle stays in view; de-duplication is the coordinator's
    /// job).
    pub emergency_from_frame: Option<u64>,

    /// Fail every Nth detect call (None = never).
    pub fail_every: Option<u64>,

    /// Simulated inference latency.
    pub latency: Duration,
}

impl Default for MockDetectorConfig {
    fn default() -> Self {
        Self {
            base_counts: HashMap::from([("car".to_string(), 5)]),
            ripple: 10,
            emergency_from_frame: None,
            fail_every: None,
            latency: Duration::from_millis(30),
        }
    }
}

/// Deterministic vision-model stand-in.
pub struct MockVehicleDetector {
    config: MockDetectorConfig,
    calls: AtomicU64,
}

impl MockVehicleDetector {
    pub fn new(config: MockDetectorConfig) -> Self {
        Self {
            config,
            calls: AtomicU64::new(0),
        }
    }

    /// Detector reporting a fixed car count, no ripple, no latency.
    pub fn steady(cars: u32) -> Self {
        Self::new(MockDetectorConfig {
            base_counts: HashMap::from([("car".to_string(), cars)]),
            ripple: 0,
            latency: Duration::ZERO,
            ..Default::default()
        })
    }

    /// Detector that flags an emergency from the given frame sequence on.
    pub fn with_emergency_from(frame: u64) -> Self {
        Self::new(MockDetectorConfig {
            emergency_from_frame: Some(frame),
            ..Default::default()
        })
    }
}

impl VehicleDetector for MockVehicleDetector {
    async fn detect(&self, frame: &TrafficFrame) -> Result<DetectionResult, SignalError> {
        if self.config.latency > Duration::ZERO {
            sleep(self.config.latency).await;
        }

        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(n) = self.config.fail_every {
            if call.is_multiple_of(n) {
                return Err(SignalError::detector("injected inference failure"));
            }
        }

        let mut type_counts = self.config.base_counts.clone();
        if self.config.ripple > 0 {
            let extra = (frame.sequence % (u64::from(self.config.ripple) + 1)) as u32;
            if extra > 0 {
                *type_counts.entry("car".to_string()).or_insert(0) += extra;
            }
        }

        let is_emergency = self
            .config
            .emergency_from_frame
            .is_some_and(|from| frame.sequence >= from);

        Ok(DetectionResult {
            observation: VehicleObservation::from_type_counts(type_counts),
            is_emergency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sequence: u64) -> TrafficFrame {
        TrafficFrame::new(sequence, 0.0, Bytes::from_static(&[0u8; 8]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_paces_and_numbers_frames() {
        let mut source = MockFrameSource::new(MockFrameSourceConfig {
            fps: 50.0,
            frame_bytes: 16,
            ..Default::default()
        });

        let first = source.next_frame().await.unwrap();
        let second = source.next_frame().await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(first.payload.len(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_failure_injection() {
        let mut source = MockFrameSource::new(MockFrameSourceConfig {
            fail_every: Some(3),
            ..Default::default()
        });

        assert!(source.next_frame().await.is_ok());
        assert!(source.next_frame().await.is_ok());
        assert!(source.next_frame().await.is_err());
        assert!(source.next_frame().await.is_ok());
    }

    #[tokio::test]
    async fn test_detector_is_deterministic_per_frame() {
        let detector = MockVehicleDetector::new(MockDetectorConfig {
            base_counts: HashMap::from([("car".to_string(), 5), ("bus".to_string(), 1)]),
            ripple: 4,
            latency: Duration::ZERO,
            ..Default::default()
        });

        let a = detector.detect(&frame(7)).await.unwrap();
        let b = detector.detect(&frame(7)).await.unwrap();
        assert_eq!(a.observation, b.observation);
        assert!(a.observation.is_consistent());
        // sequence 7, ripple 4: 7 % 5 = 2 extra cars
        assert_eq!(a.observation.type_counts["car"], 7);
        assert_eq!(a.observation.count, 8);
    }

    #[tokio::test]
    async fn test_detector_emergency_window() {
        let detector = MockVehicleDetector::with_emergency_from(10);
        assert!(!detector.detect(&frame(9)).await.unwrap().is_emergency);
        assert!(detector.detect(&frame(10)).await.unwrap().is_emergency);
        assert!(detector.detect(&frame(11)).await.unwrap().is_emergency);
    }

    #[tokio::test]
    async fn test_detector_failure_injection() {
        let detector = MockVehicleDetector::new(MockDetectorConfig {
            fail_every: Some(2),
            latency: Duration::ZERO,
            ..Default::default()
        });

        assert!(detector.detect(&frame(1)).await.is_ok());
        assert!(detector.detect(&frame(2)).await.is_err());
        assert!(detector.detect(&frame(3)).await.is_ok());
    }
}
