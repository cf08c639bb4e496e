//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Durations are configured in whole seconds and carried as `std::time::Duration`
//! - Frame timestamps are seconds since feed start (f64), used for diagnostics only

mod actuator;
mod blueprint;
mod detector;
mod error;
mod frame;
mod observation;
mod phase;
mod traffic_state;

pub use actuator::LightActuator;
pub use blueprint::*;
pub use detector::{
    EmergencyNotifier, FrameSource, LocalFrameSource, LocalVehicleDetector, VehicleDetector,
};
pub use error::*;
pub use frame::TrafficFrame;
pub use observation::{DetectionResult, VehicleObservation};
pub use phase::{Direction, LightColor, PhaseState};
pub use traffic_state::SharedTrafficState;
