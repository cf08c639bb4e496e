//! Detection feed loop
//!
//! One feed per approach. The loop never crashes on a bad tick: a failed
//! frame read skips the tick and keeps the previous observation, a failed
//! detection records a zero-vehicle observation (fail toward minimum
//! green).

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    Direction, EmergencyNotifier, FrameSource, SharedTrafficState, SignalError, VehicleDetector,
    VehicleObservation,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

/// Feed behavior knobs.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Run detection on every Nth frame.
    pub frame_skip: u32,

    /// Pause after a failed frame read, so a dead camera does not busy-loop.
    pub failure_backoff: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            frame_skip: 5,
            failure_backoff: Duration::from_millis(250),
        }
    }
}

/// Statistics from one feed's run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedStats {
    /// Frames pulled from the source.
    pub frames_seen: u64,

    /// Detection ticks that produced an observation.
    pub detections: u64,

    /// Frame reads that failed (tick skipped).
    pub frame_failures: u64,

    /// Detector calls that failed (empty observation substituted).
    pub detector_failures: u64,

    /// Emergency flags raised.
    pub emergencies: u64,
}

/// Per-direction detection loop.
pub struct DetectionFeed<S, D> {
    direction: Direction,
    source: S,
    detector: Arc<D>,
    state: Arc<SharedTrafficState>,
    notifier: Arc<dyn EmergencyNotifier>,
    config: FeedConfig,
    shutdown: watch::Receiver<bool>,
}

impl<S, D> DetectionFeed<S, D>
where
    S: FrameSource + Send + Sync + 'static,
    D: VehicleDetector + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        direction: Direction,
        source: S,
        detector: Arc<D>,
        state: Arc<SharedTrafficState>,
        notifier: Arc<dyn EmergencyNotifier>,
        config: FeedConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            direction,
            source,
            detector,
            state,
            notifier,
            config,
            shutdown,
        }
    }

    /// Run until shutdown.
    pub async fn run(mut self) -> FeedStats {
        let mut stats = FeedStats::default();
        info!(
            direction = %self.direction,
            source = self.source.source_id(),
            frame_skip = self.config.frame_skip,
            "detection feed started"
        );

        loop {
            let mut shutdown = self.shutdown.clone();
            let frame = tokio::select! {
                _ = shutdown.wait_for(|stop| *stop) => break,
                frame = self.source.next_frame() => frame,
            };

            match frame {
                Ok(frame) => {
                    stats.frames_seen += 1;
                    if !stats.frames_seen.is_multiple_of(u64::from(self.config.frame_skip)) {
                        continue;
                    }
                    self.analyze_tick(&frame, &mut stats).await;
                }
                Err(error) => {
                    stats.frame_failures += 1;
                    debug!(
                        direction = %self.direction,
                        error = %error,
                        "frame read failed, skipping tick"
                    );
                    observability::record_frame_failure(self.direction.as_str());
                    sleep(self.config.failure_backoff).await;
                }
            }
        }

        info!(
            direction = %self.direction,
            frames = stats.frames_seen,
            detections = stats.detections,
            "detection feed stopped"
        );
        stats
    }

    /// Spawn the feed as a background task.
    pub fn spawn(self) -> JoinHandle<FeedStats> {
        tokio::spawn(self.run())
    }

    async fn analyze_tick(&self, frame: &contracts::TrafficFrame, stats: &mut FeedStats) {
        match self.detector.detect(frame).await {
            Ok(result) if !result.observation.is_consistent() => {
                let error = SignalError::InconsistentObservation {
                    direction: self.direction.to_string(),
                    count: result.observation.count,
                    type_sum: result.observation.type_counts.values().sum(),
                };
                stats.detector_failures += 1;
                warn!(
                    direction = %self.direction,
                    error = %error,
                    "detector output rejected, recording empty observation"
                );
                observability::record_detector_failure(self.direction.as_str());
                self.state
                    .record_observation(self.direction, VehicleObservation::empty());
            }
            Ok(result) => {
                stats.detections += 1;
                trace!(
                    direction = %self.direction,
                    frame = frame.sequence,
                    vehicles = result.observation.count,
                    "observation recorded"
                );
                observability::record_observation(
                    self.direction.as_str(),
                    result.observation.count,
                );
                self.state
                    .record_observation(self.direction, result.observation);

                if result.is_emergency {
                    stats.emergencies += 1;
                    info!(
                        direction = %self.direction,
                        frame = frame.sequence,
                        "emergency vehicle detected"
                    );
                    self.notifier.notify_emergency();
                }
            }
            Err(error) => {
                stats.detector_failures += 1;
                warn!(
                    direction = %self.direction,
                    error = %error,
                    "detector failed, recording empty observation"
                );
                observability::record_detector_failure(self.direction.as_str());
                self.state
                    .record_observation(self.direction, VehicleObservation::empty());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDetectorConfig, MockFrameSource, MockFrameSourceConfig,
        MockVehicleDetector};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingNotifier {
        notified: AtomicU64,
    }

    impl EmergencyNotifier for CountingNotifier {
        fn notify_emergency(&self) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn feed_config() -> FeedConfig {
        FeedConfig {
            frame_skip: 2,
            failure_backoff: Duration::from_millis(10),
        }
    }

    fn fast_source(fail_every: Option<u64>) -> MockFrameSource {
        MockFrameSource::new(MockFrameSourceConfig {
            source_id: "test_cam".to_string(),
            fps: 100.0,
            fail_every,
            frame_bytes: 64,
        })
    }

    async fn run_feed_for<S, D>(feed: DetectionFeed<S, D>, shutdown_tx: watch::Sender<bool>, millis: u64) -> FeedStats
    where
        S: FrameSource + Send + Sync + 'static,
        D: VehicleDetector + Send + Sync + 'static,
    {
        let handle = feed.spawn();
        sleep(Duration::from_millis(millis)).await;
        let _ = shutdown_tx.send(true);
        handle.await.expect("feed task")
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_writes_observations() {
        let state = Arc::new(SharedTrafficState::new());
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let detector = Arc::new(MockVehicleDetector::steady(7));
        let feed = DetectionFeed::new(
            Direction::North,
            fast_source(None),
            detector,
            Arc::clone(&state),
            notifier,
            feed_config(),
            shutdown_rx,
        );

        let stats = run_feed_for(feed, shutdown_tx, 500).await;

        assert!(stats.frames_seen >= 4, "got {} frames", stats.frames_seen);
        assert!(stats.detections >= 2);
        assert_eq!(stats.frame_failures, 0);
        let obs = state.observation(Direction::North).expect("observation");
        assert_eq!(obs.count, 7);
        assert!(obs.is_consistent());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_failure_keeps_prior_observation() {
        let state = Arc::new(SharedTrafficState::new());
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Seed a prior observation; every read fails afterwards.
        state.record_observation(
            Direction::East,
            VehicleObservation::from_type_counts(HashMap::from([("car".to_string(), 3)])),
        );

        let feed = DetectionFeed::new(
            Direction::East,
            fast_source(Some(1)),
            Arc::new(MockVehicleDetector::steady(9)),
            Arc::clone(&state),
            notifier,
            feed_config(),
            shutdown_rx,
        );

        let stats = run_feed_for(feed, shutdown_tx, 300).await;

        assert!(stats.frame_failures > 0);
        assert_eq!(stats.detections, 0);
        // The stale observation is untouched
        assert_eq!(state.observation(Direction::East).unwrap().count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detector_failure_records_empty_observation() {
        let state = Arc::new(SharedTrafficState::new());
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let detector = Arc::new(MockVehicleDetector::new(MockDetectorConfig {
            base_counts: HashMap::from([("car".to_string(), 9)]),
            ripple: 0,
            fail_every: Some(1),
            ..MockDetectorConfig::default()
        }));

        let feed = DetectionFeed::new(
            Direction::South,
            fast_source(None),
            detector,
            Arc::clone(&state),
            notifier,
            feed_config(),
            shutdown_rx,
        );

        let stats = run_feed_for(feed, shutdown_tx, 300).await;

        assert!(stats.detector_failures > 0);
        let obs = state.observation(Direction::South).expect("observation");
        assert!(obs.is_empty(), "failed tick must fail toward zero vehicles");
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_reaches_notifier() {
        let state = Arc::new(SharedTrafficState::new());
        let notifier = Arc::new(CountingNotifier::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let detector = Arc::new(MockVehicleDetector::new(MockDetectorConfig {
            base_counts: HashMap::from([("car".to_string(), 2)]),
            emergency_from_frame: Some(1),
            ..MockDetectorConfig::default()
        }));

        let feed = DetectionFeed::new(
            Direction::West,
            fast_source(None),
            detector,
            Arc::clone(&state),
            Arc::clone(&notifier) as Arc<dyn EmergencyNotifier>,
            feed_config(),
            shutdown_rx,
        );

        let stats = run_feed_for(feed, shutdown_tx, 300).await;

        assert!(stats.emergencies > 0);
        assert!(notifier.notified.load(Ordering::SeqCst) > 0);
    }
}
