//! Density-based green phase timing
//!
//! Pure mapping from an observation to a bounded green duration. No side
//! effects, never fails: degenerate inputs clamp instead of erroring.

use std::time::Duration;

use contracts::{TimingConfig, VehicleObservation};

/// Weighted vehicle mass of an observation.
///
/// Classes missing from the weight table count at 1.0. An observation with
/// no type breakdown falls back to its raw count, so the density proxy
/// never undercounts what was seen.
pub fn weighted_count(observation: &VehicleObservation, config: &TimingConfig) -> f64 {
    if observation.type_counts.is_empty() {
        return observation.count as f64;
    }
    observation
        .type_counts
        .iter()
        .map(|(vehicle_type, count)| config.weight(vehicle_type) * f64::from(*count))
        .sum()
}

/// Green duration for one approach given its latest observation.
///
/// The weighted mass is scaled against the capacity normalizer into a
/// [0, 1] saturation ratio, interpolated between min and max green, and
/// truncated to whole seconds. A missing observation counts as zero
/// traffic. A normalizer of zero or below would make the saturation scale
/// meaningless, so traffic is treated as saturated instead of dividing by
/// zero. The result always lies within [min_green, max_green].
pub fn compute_green_duration(
    observation: Option<&VehicleObservation>,
    config: &TimingConfig,
) -> Duration {
    let weighted = observation
        .map(|obs| weighted_count(obs, config))
        .unwrap_or(0.0);

    let ratio = if config.capacity_normalizer > 0.0 {
        (weighted / config.capacity_normalizer).min(1.0)
    } else {
        1.0
    };

    let min = config.min_green_secs as f64;
    let max = config.max_green_secs as f64;
    let secs = (min + ratio * (max - min)).floor().clamp(min, max);

    Duration::from_secs(secs as u64)
}
