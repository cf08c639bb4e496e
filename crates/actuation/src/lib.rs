//! # Actuation
//!
//! `LightActuator` implementations.
//!
//! The real signal head driver is an external collaborator; this crate
//! provides the stand-ins the controller runs against:
//! - [`MockLightBoard`]: in-memory channel-mapped board that records every
//!   actuation with its current lit-state, for tests, demos, and mock runs
//! - [`LogActuator`]: logs actuations through tracing, drives nothing

mod log_actuator;
mod mock_board;

pub use log_actuator::LogActuator;
pub use mock_board::{LightEvent, MockLightBoard};
