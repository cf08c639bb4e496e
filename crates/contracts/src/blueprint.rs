//! IntersectionBlueprint - Config Loader output
//!
//! Describes the complete intersection setup: approaches and their light
//! channels, phase timing, and detection parameters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::{Direction, LightColor};

/// Configuration version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete intersection configuration blueprint.
///
/// Loaded once at startup and immutable afterwards. The order of
/// `approaches` is the right-of-way cycle order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionBlueprint {
    /// Configuration version.
    #[serde(default)]
    pub version: ConfigVersion,

    /// Intersection identity.
    pub intersection: IntersectionConfig,

    /// Phase timing parameters.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Approach definitions, in cycle order.
    pub approaches: Vec<ApproachConfig>,

    /// Detection parameters shared by every approach feed.
    #[serde(default)]
    pub detection: DetectionConfig,
}

impl IntersectionBlueprint {
    /// Right-of-way cycle order, as configured.
    pub fn cycle_order(&self) -> Vec<Direction> {
        self.approaches.iter().map(|a| a.direction).collect()
    }

    /// Approach config for one direction, if configured.
    pub fn approach(&self, direction: Direction) -> Option<&ApproachConfig> {
        self.approaches.iter().find(|a| a.direction == direction)
    }
}

/// Intersection identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionConfig {
    /// Human-readable name (e.g. "main-and-5th").
    pub name: String,
}

/// Phase timing parameters.
///
/// All durations are whole seconds. Defaults match the reference deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Shortest green phase.
    #[serde(default = "default_min_green")]
    pub min_green_secs: u64,

    /// Longest green phase at saturated traffic.
    #[serde(default = "default_max_green")]
    pub max_green_secs: u64,

    /// Fixed yellow interval.
    #[serde(default = "default_yellow")]
    pub yellow_secs: u64,

    /// Safety buffer with every approach red, between phases.
    #[serde(default = "default_all_red")]
    pub all_red_secs: u64,

    /// Length of the all-red blink pattern during an emergency preemption.
    #[serde(default = "default_emergency_blink")]
    pub emergency_blink_secs: u64,

    /// Density weight per vehicle class; unlisted classes weigh 1.0.
    #[serde(default)]
    pub vehicle_weights: HashMap<String, f64>,

    /// Weighted count considered fully saturated traffic.
    #[serde(default = "default_capacity_normalizer")]
    pub capacity_normalizer: f64,
}

impl TimingConfig {
    pub fn min_green(&self) -> Duration {
        Duration::from_secs(self.min_green_secs)
    }

    pub fn max_green(&self) -> Duration {
        Duration::from_secs(self.max_green_secs)
    }

    pub fn yellow(&self) -> Duration {
        Duration::from_secs(self.yellow_secs)
    }

    pub fn all_red(&self) -> Duration {
        Duration::from_secs(self.all_red_secs)
    }

    pub fn emergency_blink(&self) -> Duration {
        Duration::from_secs(self.emergency_blink_secs)
    }

    /// Weight for a vehicle class, 1.0 when unlisted.
    pub fn weight(&self, vehicle_type: &str) -> f64 {
        self.vehicle_weights
            .get(vehicle_type)
            .copied()
            .unwrap_or(1.0)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_green_secs: default_min_green(),
            max_green_secs: default_max_green(),
            yellow_secs: default_yellow(),
            all_red_secs: default_all_red(),
            emergency_blink_secs: default_emergency_blink(),
            vehicle_weights: HashMap::new(),
            capacity_normalizer: default_capacity_normalizer(),
        }
    }
}

fn default_min_green() -> u64 {
    15
}

fn default_max_green() -> u64 {
    120
}

fn default_yellow() -> u64 {
    3
}

fn default_all_red() -> u64 {
    2
}

fn default_emergency_blink() -> u64 {
    10
}

fn default_capacity_normalizer() -> f64 {
    50.0
}

/// One approach: its direction, signal head wiring, and camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproachConfig {
    /// Compass direction of the approach.
    pub direction: Direction,

    /// Actuation channel ids for the approach's signal head.
    pub channels: LightChannels,

    /// Video source identifier (device path, stream URL), opaque to the core.
    pub camera_source: String,
}

/// Actuation channel ids for one signal head.
///
/// Channel numbers are opaque to the core; only the actuator interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightChannels {
    pub red: u8,
    pub yellow: u8,
    pub green: u8,
}

impl LightChannels {
    /// Channel id for one sub-light.
    pub fn channel(&self, color: LightColor) -> u8 {
        match color {
            LightColor::Red => self.red,
            LightColor::Yellow => self.yellow,
            LightColor::Green => self.green,
        }
    }

    /// All three channel ids.
    pub fn all(&self) -> [u8; 3] {
        [self.red, self.yellow, self.green]
    }
}

/// Detection parameters shared by every approach feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Run detection on every Nth frame to bound compute cost.
    #[serde(default = "default_frame_skip")]
    pub frame_skip: u32,

    /// Detector model weights path, opaque to the core.
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Detector class labels that raise the emergency flag.
    #[serde(default = "default_emergency_classes")]
    pub emergency_classes: Vec<String>,

    /// Minimum detection confidence.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Inference input size (square), pixels.
    #[serde(default = "default_image_size")]
    pub image_size: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            frame_skip: default_frame_skip(),
            model_path: default_model_path(),
            emergency_classes: default_emergency_classes(),
            confidence_threshold: default_confidence_threshold(),
            image_size: default_image_size(),
        }
    }
}

fn default_frame_skip() -> u32 {
    5
}

fn default_model_path() -> String {
    "assets/yolov8n.pt".to_string()
}

fn default_emergency_classes() -> Vec<String> {
    vec![
        "ambulance".to_string(),
        "firetruck".to_string(),
        "police".to_string(),
    ]
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_image_size() -> u32 {
    320
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_defaults() {
        let timing = TimingConfig::default();
        assert_eq!(timing.min_green(), Duration::from_secs(15));
        assert_eq!(timing.max_green(), Duration::from_secs(120));
        assert_eq!(timing.yellow(), Duration::from_secs(3));
        assert_eq!(timing.all_red(), Duration::from_secs(2));
        assert_eq!(timing.emergency_blink(), Duration::from_secs(10));
        assert_eq!(timing.capacity_normalizer, 50.0);
    }

    #[test]
    fn test_weight_defaults_to_one() {
        let mut timing = TimingConfig::default();
        timing.vehicle_weights.insert("bus".to_string(), 2.5);
        assert_eq!(timing.weight("bus"), 2.5);
        assert_eq!(timing.weight("car"), 1.0);
    }

    #[test]
    fn test_channel_lookup_is_enum_indexed() {
        let channels = LightChannels {
            red: 17,
            yellow: 27,
            green: 22,
        };
        assert_eq!(channels.channel(LightColor::Red), 17);
        assert_eq!(channels.channel(LightColor::Yellow), 27);
        assert_eq!(channels.channel(LightColor::Green), 22);
        assert_eq!(channels.all(), [17, 27, 22]);
    }

    #[test]
    fn test_cycle_order_follows_approach_order() {
        let blueprint = IntersectionBlueprint {
            version: ConfigVersion::V1,
            intersection: IntersectionConfig {
                name: "test".to_string(),
            },
            timing: TimingConfig::default(),
            approaches: vec![
                ApproachConfig {
                    direction: Direction::North,
                    channels: LightChannels {
                        red: 17,
                        yellow: 27,
                        green: 22,
                    },
                    camera_source: "cam0".to_string(),
                },
                ApproachConfig {
                    direction: Direction::East,
                    channels: LightChannels {
                        red: 5,
                        yellow: 6,
                        green: 13,
                    },
                    camera_source: "cam1".to_string(),
                },
            ],
            detection: DetectionConfig::default(),
        };
        assert_eq!(
            blueprint.cycle_order(),
            vec![Direction::North, Direction::East]
        );
        assert!(blueprint.approach(Direction::East).is_some());
        assert!(blueprint.approach(Direction::West).is_none());
    }
}
