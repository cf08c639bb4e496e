//! Mock Intersection Demo
//!
//! Runs the full signal controller against mock cameras, a mock detector,
//! and the in-memory light board. No hardware required.
//!
//! An emergency vehicle is scripted onto the north approach partway through
//! the run, so the all-red preemption blink can be watched in the logs.
//!
//! Run with: cargo run --bin mock_intersection [config.toml]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actuation::MockLightBoard;
use config_loader::ConfigLoader;
use contracts::{EmergencyNotifier, IntersectionBlueprint, SharedTrafficState};
use control::{emergency_channel, PhaseScheduler, SchedulerConfig};
use detection::{
    DetectionFeed, FeedConfig, MockDetectorConfig, MockFrameSource, MockVehicleDetector,
};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Intersection Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        create_demo_blueprint()?
    };

    tracing::info!(
        intersection = %blueprint.intersection.name,
        approaches = blueprint.approaches.len(),
        "Blueprint ready"
    );

    // ==== Stage 2: Shared state, board, and control plumbing ====
    let state = Arc::new(SharedTrafficState::new());
    let board = Arc::new(MockLightBoard::from_approaches(&blueprint.approaches));
    let (emergency_handle, coordinator) =
        emergency_channel(Arc::clone(&state), blueprint.timing.emergency_blink());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ==== Stage 3: Detection feeds (mock cameras + detector) ====
    let notifier: Arc<dyn EmergencyNotifier> = Arc::new(emergency_handle.clone());
    let mut feeds = Vec::new();
    for (index, approach) in blueprint.approaches.iter().enumerate() {
        let source = MockFrameSource::with_source_id(&approach.camera_source);
        let detector = Arc::new(MockVehicleDetector::new(MockDetectorConfig {
            base_counts: HashMap::from([("car".to_string(), 2 + 3 * index as u32)]),
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
    tracing::info!(feeds = feeds.len(), "Detection feeds running");

    // ==== Stage 4: Phase scheduler ====
    let scheduler = PhaseScheduler::new(
        Arc::clone(&board),
        Arc::clone(&state),
        SchedulerConfig {
            timing: blueprint.timing.clone(),
            cycle: blueprint.cycle_order(),
            max_phases: Some(8),
        },
        coordinator,
        shutdown_rx,
    );

    // ==== Stage 5: Script an emergency partway through the run ====
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(12)).await;
        tracing::info!("demo: emergency vehicle approaching from the north");
        emergency_handle.notify_emergency();
    });

    // ==== Stage 6: Run and report ====
    let stats = scheduler.run().await;
    let _ = shutdown_tx.send(true);
    for feed in feeds {
        let _ = feed.await;
    }

    tracing::info!(
        phases = stats.phases_completed,
        preemptions = stats.preemptions,
        green_mean_secs = format!("{:.1}", stats.green_secs.mean()),
        actuations = board.history().len(),
        "Demo complete"
    );

    Ok(())
}

/// Demo blueprint: four approaches, short greens so the cycle is visible.
fn create_demo_blueprint() -> Result<IntersectionBlueprint, Box<dyn std::error::Error>> {
    let toml = r#"
[intersection]
name = "demo-junction"

[timing]
min_green_secs = 4
max_green_secs = 10
yellow_secs = 2
all_red_secs = 1
emergency_blink_secs = 5
capacity_normalizer = 20.0

[timing.vehicle_weights]
car = 1.0
bus = 2.5
truck = 2.0

[[approaches]]
direction = "north"
camera_source = "demo://north"
[approaches.channels]
red = 17
yellow = 27
green = 22

[[approaches]]
direction = "east"
camera_source = "demo://east"
[approaches.channels]
red = 5
yellow = 6
green = 13

[[approaches]]
direction = "south"
camera_source = "demo://south"
[approaches.channels]
red = 26
yellow = 16
green = 20

[[approaches]]
direction = "west"
camera_source = "demo://west"
[approaches.channels]
red = 12
yellow = 25
green = 8
"#;
    Ok(ConfigLoader::load_from_str(
        toml,
        config_loader::ConfigFormat::Toml,
    )?)
}
