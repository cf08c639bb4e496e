//! Controller orchestrator - wires state, feeds, and the scheduler.
//!
//! Runs in mock mode: frame sources and the detector are the deterministic
//! stand-ins from the detection crate, and the lights drive the in-memory
//! board. Real camera and driver capabilities plug in through the same
//! traits without touching this wiring.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actuation::MockLightBoard;
use anyhow::{Context, Result};
use contracts::{EmergencyNotifier, IntersectionBlueprint, SharedTrafficState};
use control::{emergency_channel, PhaseScheduler, SchedulerConfig};
use detection::{
    DetectionFeed, FeedConfig, MockDetectorConfig, MockFrameSource, MockVehicleDetector,
};
use observability::StatsSummary;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};

use super::ControllerStats;

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// The intersection blueprint
    pub blueprint: IntersectionBlueprint,

    /// Stop after this long (None = run until interrupted)
    pub run_duration: Option<Duration>,

    /// Stop after this many completed phases (None = unlimited)
    pub max_phases: Option<u64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main controller orchestrator
pub struct Controller {
    config: ControllerConfig,
}

impl Controller {
    /// Create a new controller with the given configuration
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    /// Run the controller to completion
    pub async fn run(self) -> Result<ControllerStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        info!(
            intersection = %blueprint.intersection.name,
            approaches = blueprint.approaches.len(),
            "Starting signal controller (mock capabilities)"
        );

        // Shared state and control plumbing
        let state = Arc::new(SharedTrafficState::new());
        let board = Arc::new(MockLightBoard::from_approaches(&blueprint.approaches));
        let (emergency_handle, coordinator) =
            emergency_channel(Arc::clone(&state), blueprint.timing.emergency_blink());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Detection feeds, one task per approach
        let notifier: Arc<dyn EmergencyNotifier> = Arc::new(emergency_handle);
        let mut feeds = Vec::new();
        for (index, approach) in blueprint.approaches.iter().enumerate() {
            let source = MockFrameSource::with_source_id(&approach.camera_source);
            // Stagger the baseline load so approaches get distinct greens
            let detector = Arc::new(MockVehicleDetector::new(MockDetectorConfig {
                base_counts: HashMap::from([("car".to_string(), 3 + 2 * index as u32)]),
                ..Default::default()
            }));
            let feed = DetectionFeed::new(
                approach.direction,
                source,
                detector,
                Arc::clone(&state),
                Arc::clone(&notifier),
                FeedConfig {
                    frame_skip: blueprint.detection.frame_skip,
                    ..Default::default()
                },
                shutdown_rx.clone(),
            );
            feeds.push(feed.spawn());
        }

        let active_feeds = feeds.len();
        info!(active_feeds, "Detection feeds started");

        // Phase scheduler (the control task)
        let scheduler = PhaseScheduler::new(
            Arc::clone(&board),
            Arc::clone(&state),
            SchedulerConfig {
                timing: blueprint.timing.clone(),
                cycle: blueprint.cycle_order(),
                max_phases: self.config.max_phases,
            },
            coordinator,
            shutdown_rx.clone(),
        );
        let scheduler_task = tokio::spawn(scheduler.run());

        // Stop conditions: signal or elapsed run duration
        let stopper = shutdown_tx.clone();
        let run_duration = self.config.run_duration;
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_signal() => {
                    warn!("Received shutdown signal, stopping controller...");
                }
                _ = sleep_opt(run_duration) => {
                    info!("Run duration elapsed, stopping controller...");
                }
            }
            let _ = stopper.send(true);
        });

        // The scheduler ends on shutdown or its phase limit; it forces the
        // lights to the safe state on its way out.
        let scheduler_stats = scheduler_task
            .await
            .context("Scheduler task panicked")?;

        // Stop feeds and collect their stats
        let _ = shutdown_tx.send(true);

        let mut stats = ControllerStats {
            phases_completed: scheduler_stats.phases_completed,
            preemptions: scheduler_stats.preemptions,
            green_secs: StatsSummary::from(&scheduler_stats.green_secs),
            active_feeds,
            ..Default::default()
        };

        for handle in feeds {
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(feed_stats)) => {
                    stats.frames_seen += feed_stats.frames_seen;
                    stats.detections += feed_stats.detections;
                    stats.frame_failures += feed_stats.frame_failures;
                    stats.detector_failures += feed_stats.detector_failures;
                    stats.emergencies_reported += feed_stats.emergencies;
                }
                Ok(Err(e)) => warn!(error = ?e, "Detection feed task panicked"),
                Err(_) => warn!("Detection feed shutdown timed out"),
            }
        }

        stats.duration = start_time.elapsed();

        info!(
            phases = stats.phases_completed,
            preemptions = stats.preemptions,
            duration_secs = stats.duration.as_secs_f64(),
            "Controller shutdown complete"
        );

        Ok(stats)
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Sleep for the given duration, or forever when none is set
async fn sleep_opt(duration: Option<Duration>) {
    match duration {
        Some(duration) => sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}
