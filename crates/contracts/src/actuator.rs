//! LightActuator trait - light hardware abstraction
//!
//! Defines the interface the control task drives lights through, decoupling
//! phase logic from the concrete light driver (GPIO board, mock, log-only).

use crate::{Direction, LightColor, SignalError};

/// Light actuation capability consumed by the control task.
///
/// The hardware owns the truth of what is physically lit; callers treat a
/// failed write as recoverable (log and continue), keeping their own notion
/// of the intended state authoritative. The next phase transition rewrites
/// every light and resynchronizes.
///
/// Callers that replace a whole light configuration must reset first and set
/// after, so two greens are never lit at once during the swap.
pub trait LightActuator: Send + Sync {
    /// Switch a single sub-light of one approach on or off.
    fn set_light(&self, direction: Direction, color: LightColor, on: bool)
        -> Result<(), SignalError>;

    /// Switch the same-colored sub-light of every approach on or off.
    fn set_all(&self, color: LightColor, on: bool) -> Result<(), SignalError>;

    /// Turn every light off.
    fn reset_all(&self) -> Result<(), SignalError>;
}
