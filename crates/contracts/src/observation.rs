//! VehicleObservation - Detection output
//!
//! Per-direction traffic density snapshot produced by the detector capability.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Vehicle observation for one approach, one detection tick.
///
/// `count` always equals the sum of `type_counts` values; build instances
/// through [`VehicleObservation::from_type_counts`] to keep that invariant.
/// Observations are overwritten (not accumulated) on each detection tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleObservation {
    /// Total vehicles in frame.
    pub count: u32,

    /// Vehicle count per detector class label (e.g. "car", "bus").
    #[serde(default)]
    pub type_counts: HashMap<String, u32>,
}

impl VehicleObservation {
    /// Zero-vehicle observation, used when a detection tick fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from per-type counts; the total is derived.
    pub fn from_type_counts(type_counts: HashMap<String, u32>) -> Self {
        let count = type_counts.values().sum();
        Self { count, type_counts }
    }

    /// Whether `count` matches the sum of `type_counts`.
    pub fn is_consistent(&self) -> bool {
        self.count == self.type_counts.values().sum::<u32>()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Detector capability output for one analyzed frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// What is on the approach right now.
    pub observation: VehicleObservation,

    /// An emergency vehicle was recognized in the frame.
    pub is_emergency: bool,
}
