//! LogActuator - logs actuations via tracing

use contracts::{Direction, LightActuator, LightColor, SignalError};
use tracing::info;

/// Actuator that drives nothing and logs every command.
///
/// Useful as a sink for dry runs and as a second actuator in demos.
pub struct LogActuator {
    name: String,
}

impl LogActuator {
    /// Create a new LogActuator with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl LightActuator for LogActuator {
    fn set_light(
        &self,
        direction: Direction,
        color: LightColor,
        on: bool,
    ) -> Result<(), SignalError> {
        info!(actuator = %self.name, direction = %direction, color = %color, on, "set light");
        Ok(())
    }

    fn set_all(&self, color: LightColor, on: bool) -> Result<(), SignalError> {
        info!(actuator = %self.name, color = %color, on, "set all lights");
        Ok(())
    }

    fn reset_all(&self) -> Result<(), SignalError> {
        info!(actuator = %self.name, "reset all lights");
        Ok(())
    }
}
