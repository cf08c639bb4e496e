//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    intersection: String,
    approach_count: usize,
    cycle_order: Vec<String>,
    min_green_secs: u64,
    max_green_secs: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    intersection: blueprint.intersection.name.clone(),
                    approach_count: blueprint.approaches.len(),
                    cycle_order: blueprint
                        .cycle_order()
                        .iter()
                        .map(|d| d.to_string())
                        .collect(),
                    min_green_secs: blueprint.timing.min_green_secs,
                    max_green_secs: blueprint.timing.max_green_secs,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::IntersectionBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.approaches.len() < 4 {
        warnings.push(format!(
            "Only {} approaches configured - remaining directions will never get right of way",
            blueprint.approaches.len()
        ));
    }

    if blueprint.timing.min_green_secs == blueprint.timing.max_green_secs {
        warnings.push(
            "min_green_secs equals max_green_secs - density-based timing is disabled".to_string(),
        );
    }

    if blueprint.timing.capacity_normalizer <= 0.0 {
        warnings.push(
            "capacity_normalizer <= 0 - every green phase will run at max_green".to_string(),
        );
    }

    if blueprint.timing.vehicle_weights.is_empty() {
        warnings.push("No vehicle weights configured - every class weighs 1.0".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Intersection: {}", summary.intersection);
            println!("  Approaches: {}", summary.approach_count);
            println!("  Cycle: {}", summary.cycle_order.join(" -> "));
            println!(
                "  Green bounds: {}..{}s",
                summary.min_green_secs, summary.max_green_secs
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
