//! # Control
//!
//! The signal-control core: the density-based timing engine, the phase
//! state machine, and the emergency preemption protocol.
//!
//! One long-lived control task runs [`PhaseScheduler`]; per-direction
//! detection tasks feed [`contracts::SharedTrafficState`] and report
//! emergencies through an [`EmergencyHandle`]. The preemption blink runs
//! synchronously inside the control task, so there is never more than one
//! writer of light state.

mod emergency;
mod scheduler;
mod timing;

pub use emergency::{
    emergency_channel, EmergencyCoordinator, EmergencyEvent, EmergencyHandle, BLINK_TOGGLE_PERIOD,
};
pub use scheduler::{PhaseScheduler, SchedulerConfig, SchedulerStats};
pub use timing::{compute_green_duration, weighted_count};
