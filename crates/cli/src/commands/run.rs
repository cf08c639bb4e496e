//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::controller::{Controller, ControllerConfig};

/// Execute the `run` command
pub async fn run_controller(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration (fails fast before any light is driven)
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        intersection = %blueprint.intersection.name,
        approaches = blueprint.approaches.len(),
        min_green = blueprint.timing.min_green_secs,
        max_green = blueprint.timing.max_green_secs,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build controller configuration
    let controller_config = ControllerConfig {
        blueprint,
        run_duration: if args.duration == 0 {
            None
        } else {
            Some(Duration::from_secs(args.duration))
        },
        max_phases: if args.max_phases == 0 {
            None
        } else {
            Some(args.max_phases)
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run the controller; shutdown signals are handled inside so
    // the lights always reach the safe state before we return.
    let controller = Controller::new(controller_config);

    info!("Starting controller...");
    let stats = controller
        .run()
        .await
        .context("Controller execution failed")?;

    info!(
        phases = stats.phases_completed,
        preemptions = stats.preemptions,
        duration_secs = stats.duration.as_secs_f64(),
        "Controller completed successfully"
    );

    // Print detailed statistics
    stats.print_summary();

    info!("Crosslight finished");
    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::IntersectionBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Intersection: {}", blueprint.intersection.name);
    println!(
        "Cycle order: {}",
        blueprint
            .cycle_order()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    println!("\nTiming:");
    println!(
        "  Green: {}..{}s (capacity normalizer {})",
        blueprint.timing.min_green_secs,
        blueprint.timing.max_green_secs,
        blueprint.timing.capacity_normalizer
    );
    println!("  Yellow: {}s", blueprint.timing.yellow_secs);
    println!("  All-red: {}s", blueprint.timing.all_red_secs);
    println!(
        "  Emergency blink: {}s",
        blueprint.timing.emergency_blink_secs
    );

    println!("\nApproaches ({}):", blueprint.approaches.len());
    for approach in &blueprint.approaches {
        println!(
            "  - {} (camera: {}, channels r/y/g: {}/{}/{})",
            approach.direction,
            approach.camera_source,
            approach.channels.red,
            approach.channels.yellow,
            approach.channels.green
        );
    }

    println!(
        "\nDetection: every {}th frame, classes {:?}",
        blueprint.detection.frame_skip, blueprint.detection.emergency_classes
    );

    println!();
}
