//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    intersection: String,
    cycle_order: Vec<String>,
    timing: TimingInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    approaches: Vec<ApproachInfo>,
    detection: DetectionInfo,
}

#[derive(Serialize)]
struct TimingInfo {
    min_green_secs: u64,
    max_green_secs: u64,
    yellow_secs: u64,
    all_red_secs: u64,
    emergency_blink_secs: u64,
    capacity_normalizer: f64,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    vehicle_weights: std::collections::HashMap<String, f64>,
}

#[derive(Serialize)]
struct ApproachInfo {
    direction: String,
    camera_source: String,
    red_channel: u8,
    yellow_channel: u8,
    green_channel: u8,
}

#[derive(Serialize)]
struct DetectionInfo {
    frame_skip: u32,
    model_path: String,
    emergency_classes: Vec<String>,
    confidence_threshold: f32,
    image_size: u32,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::IntersectionBlueprint, args: &InfoArgs) -> ConfigInfo {
    let approaches = if args.approaches {
        blueprint
            .approaches
            .iter()
            .map(|a| ApproachInfo {
                direction: a.direction.to_string(),
                camera_source: a.camera_source.clone(),
                red_channel: a.channels.red,
                yellow_channel: a.channels.yellow,
                green_channel: a.channels.green,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        intersection: blueprint.intersection.name.clone(),
        cycle_order: blueprint
            .cycle_order()
            .iter()
            .map(|d| d.to_string())
            .collect(),
        timing: TimingInfo {
            min_green_secs: blueprint.timing.min_green_secs,
            max_green_secs: blueprint.timing.max_green_secs,
            yellow_secs: blueprint.timing.yellow_secs,
            all_red_secs: blueprint.timing.all_red_secs,
            emergency_blink_secs: blueprint.timing.emergency_blink_secs,
            capacity_normalizer: blueprint.timing.capacity_normalizer,
            vehicle_weights: blueprint.timing.vehicle_weights.clone(),
        },
        approaches,
        detection: DetectionInfo {
            frame_skip: blueprint.detection.frame_skip,
            model_path: blueprint.detection.model_path.clone(),
            emergency_classes: blueprint.detection.emergency_classes.clone(),
            confidence_threshold: blueprint.detection.confidence_threshold,
            image_size: blueprint.detection.image_size,
        },
    }
}

fn print_config_info(blueprint: &contracts::IntersectionBlueprint, args: &InfoArgs) {
    println!("\n=== Intersection Configuration ===\n");
    println!("Name: {}", blueprint.intersection.name);
    println!("Version: {:?}", blueprint.version);
    println!(
        "Cycle: {}",
        blueprint
            .cycle_order()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    println!("\nTiming:");
    println!(
        "  Green bounds: {}..{}s",
        blueprint.timing.min_green_secs, blueprint.timing.max_green_secs
    );
    println!("  Yellow: {}s", blueprint.timing.yellow_secs);
    println!("  All-red: {}s", blueprint.timing.all_red_secs);
    println!(
        "  Emergency blink: {}s",
        blueprint.timing.emergency_blink_secs
    );
    println!(
        "  Capacity normalizer: {}",
        blueprint.timing.capacity_normalizer
    );
    if !blueprint.timing.vehicle_weights.is_empty() {
        println!("  Vehicle weights:");
        for (vehicle_type, weight) in &blueprint.timing.vehicle_weights {
            println!("    {}: {}", vehicle_type, weight);
        }
    }

    if args.approaches {
        println!("\nApproaches ({}):", blueprint.approaches.len());
        for approach in &blueprint.approaches {
            println!(
                "  - {}: camera {}, channels r/y/g {}/{}/{}",
                approach.direction,
                approach.camera_source,
                approach.channels.red,
                approach.channels.yellow,
                approach.channels.green
            );
        }
    }

    println!("\nDetection:");
    println!("  Frame skip: every {}th frame", blueprint.detection.frame_skip);
    println!("  Model: {}", blueprint.detection.model_path);
    println!(
        "  Emergency classes: {:?}",
        blueprint.detection.emergency_classes
    );
    println!(
        "  Confidence threshold: {}",
        blueprint.detection.confidence_threshold
    );
    println!("  Image size: {}", blueprint.detection.image_size);

    println!();
}
