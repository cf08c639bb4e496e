//! Config validation
//!
//! Validation rules:
//! - at least one approach, directions unique
//! - light channel ids unique across the whole board
//! - camera_source non-empty
//! - every duration > 0, min_green <= max_green
//! - vehicle weights finite and non-negative
//! - frame_skip >= 1, emergency class list non-empty
//! - confidence_threshold in (0, 1], image_size > 0
//!
//! A zero or negative capacity_normalizer is NOT rejected here: the timing
//! engine clamps it to the saturated ratio at runtime.

use std::collections::HashSet;

use contracts::{IntersectionBlueprint, SignalError};

/// Validate an IntersectionBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &IntersectionBlueprint) -> Result<(), SignalError> {
    validate_approaches(blueprint)?;
    validate_channels(blueprint)?;
    validate_timing(blueprint)?;
    validate_weights(blueprint)?;
    validate_detection(blueprint)?;
    Ok(())
}

/// Approach list and direction uniqueness
fn validate_approaches(blueprint: &IntersectionBlueprint) -> Result<(), SignalError> {
    if blueprint.approaches.is_empty() {
        return Err(SignalError::config_validation(
            "approaches",
            "at least one approach is required",
        ));
    }

    let mut seen = HashSet::new();
    for approach in &blueprint.approaches {
        if !seen.insert(approach.direction) {
            return Err(SignalError::config_validation(
                format!("approaches[direction={}]", approach.direction),
                "duplicate direction",
            ));
        }
        if approach.camera_source.is_empty() {
            return Err(SignalError::config_validation(
                format!("approaches[{}].camera_source", approach.direction),
                "camera_source cannot be empty",
            ));
        }
    }
    Ok(())
}

/// Channel id uniqueness across every signal head
fn validate_channels(blueprint: &IntersectionBlueprint) -> Result<(), SignalError> {
    let mut seen = HashSet::new();
    for approach in &blueprint.approaches {
        for channel in approach.channels.all() {
            if !seen.insert(channel) {
                return Err(SignalError::config_validation(
                    format!("approaches[{}].channels", approach.direction),
                    format!("channel {channel} assigned to more than one light"),
                ));
            }
        }
    }
    Ok(())
}

/// Duration sanity
fn validate_timing(blueprint: &IntersectionBlueprint) -> Result<(), SignalError> {
    let timing = &blueprint.timing;

    let durations = [
        ("timing.min_green_secs", timing.min_green_secs),
        ("timing.max_green_secs", timing.max_green_secs),
        ("timing.yellow_secs", timing.yellow_secs),
        ("timing.all_red_secs", timing.all_red_secs),
        ("timing.emergency_blink_secs", timing.emergency_blink_secs),
    ];
    for (field, value) in durations {
        if value == 0 {
            return Err(SignalError::config_validation(
                field,
                "duration must be > 0 seconds",
            ));
        }
    }

    if timing.min_green_secs > timing.max_green_secs {
        return Err(SignalError::config_validation(
            "timing.min_green_secs / timing.max_green_secs",
            format!(
                "min_green_secs ({}) must be <= max_green_secs ({})",
                timing.min_green_secs, timing.max_green_secs
            ),
        ));
    }

    if !timing.capacity_normalizer.is_finite() {
        return Err(SignalError::config_validation(
            "timing.capacity_normalizer",
            "capacity_normalizer must be finite",
        ));
    }

    Ok(())
}

/// Vehicle weight sanity
fn validate_weights(blueprint: &IntersectionBlueprint) -> Result<(), SignalError> {
    for (vehicle_type, weight) in &blueprint.timing.vehicle_weights {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(SignalError::config_validation(
                format!("timing.vehicle_weights[{vehicle_type}]"),
                format!("weight must be finite and >= 0, got {weight}"),
            ));
        }
    }
    Ok(())
}

/// Detection parameter sanity
fn validate_detection(blueprint: &IntersectionBlueprint) -> Result<(), SignalError> {
    let detection = &blueprint.detection;

    if detection.frame_skip == 0 {
        return Err(SignalError::config_validation(
            "detection.frame_skip",
            "frame_skip must be >= 1",
        ));
    }

    if detection.emergency_classes.is_empty() {
        return Err(SignalError::config_validation(
            "detection.emergency_classes",
            "at least one emergency class is required",
        ));
    }

    if !(detection.confidence_threshold > 0.0 && detection.confidence_threshold <= 1.0) {
        return Err(SignalError::config_validation(
            "detection.confidence_threshold",
            format!(
                "confidence_threshold must be in (0, 1], got {}",
                detection.confidence_threshold
            ),
        ));
    }

    if detection.image_size == 0 {
        return Err(SignalError::config_validation(
            "detection.image_size",
            "image_size must be > 0",
        ));
    }

    Ok(())
}
