//! Mock light board
//!
//! Implements `LightActuator` against an in-memory board. Every call is
//! recorded in order together with the resulting lit-state, so tests can
//! assert safety properties (never two greens, reset-before-set) from the
//! actuation history alone.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use contracts::{ApproachConfig, Direction, LightActuator, LightChannels, LightColor, SignalError};
use tracing::trace;

/// One recorded actuation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightEvent {
    /// Single sub-light switched.
    Set {
        direction: Direction,
        color: LightColor,
        on: bool,
    },
    /// Same-colored sub-light of every head switched.
    SetAll { color: LightColor, on: bool },
    /// Everything switched off.
    ResetAll,
}

/// In-memory signal board with recorded history.
///
/// Channel ids are mapped per head exactly like the hardware wiring table;
/// an actuation against a direction with no configured head fails, which is
/// what a disconnected driver would report.
pub struct MockLightBoard {
    channels: HashMap<Direction, LightChannels>,
    lit: Mutex<HashSet<(Direction, LightColor)>>,
    history: Mutex<Vec<LightEvent>>,
    failing: AtomicBool,
}

impl MockLightBoard {
    /// Create a board from a wiring table.
    pub fn new(channels: HashMap<Direction, LightChannels>) -> Self {
        Self {
            channels,
            lit: Mutex::new(HashSet::new()),
            history: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Create a board wired from approach configs.
    pub fn from_approaches(approaches: &[ApproachConfig]) -> Self {
        Self::new(
            approaches
                .iter()
                .map(|a| (a.direction, a.channels))
                .collect(),
        )
    }

    /// Four-way board with the reference wiring table.
    pub fn with_default_channels() -> Self {
        Self::new(HashMap::from([
            (
                Direction::North,
                LightChannels {
                    red: 17,
                    yellow: 27,
                    green: 22,
                },
            ),
            (
                Direction::East,
                LightChannels {
                    red: 5,
                    yellow: 6,
                    green: 13,
                },
            ),
            (
                Direction::South,
                LightChannels {
                    red: 26,
                    yellow: 16,
                    green: 20,
                },
            ),
            (
                Direction::West,
                LightChannels {
                    red: 12,
                    yellow: 25,
                    green: 8,
                },
            ),
        ]))
    }

    /// When true, every actuation call returns an error (failure injection).
    pub fn inject_failures(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Ordered copy of every recorded actuation.
    pub fn history(&self) -> Vec<LightEvent> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Snapshot of which sub-lights are currently on.
    pub fn lit(&self) -> HashSet<(Direction, LightColor)> {
        self.lit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether one sub-light is currently on.
    pub fn is_lit(&self, direction: Direction, color: LightColor) -> bool {
        self.lit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&(direction, color))
    }

    /// How many sub-lights of one color are currently on.
    pub fn lit_count(&self, color: LightColor) -> usize {
        self.lit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|(_, c)| *c == color)
            .count()
    }

    /// Replay the history and return the largest number of same-colored
    /// sub-lights ever lit at one instant.
    pub fn max_simultaneous(&self, color: LightColor) -> usize {
        let history = self.history();
        let directions: Vec<Direction> = self.channels.keys().copied().collect();
        let mut lit: HashSet<(Direction, LightColor)> = HashSet::new();
        let mut max = 0usize;

        for event in &history {
            match *event {
                LightEvent::Set {
                    direction,
                    color,
                    on,
                } => {
                    if on {
                        lit.insert((direction, color));
                    } else {
                        lit.remove(&(direction, color));
                    }
                }
                LightEvent::SetAll { color, on } => {
                    for direction in &directions {
                        if on {
                            lit.insert((*direction, color));
                        } else {
                            lit.remove(&(*direction, color));
                        }
                    }
                }
                LightEvent::ResetAll => lit.clear(),
            }
            let count = lit.iter().filter(|(_, c)| *c == color).count();
            max = max.max(count);
        }
        max
    }

    fn check_failure(&self, target: &str) -> Result<(), SignalError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SignalError::actuation(target, "injected failure"));
        }
        Ok(())
    }

    fn record(&self, event: LightEvent) {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl LightActuator for MockLightBoard {
    fn set_light(
        &self,
        direction: Direction,
        color: LightColor,
        on: bool,
    ) -> Result<(), SignalError> {
        self.check_failure(&format!("{direction}:{color}"))?;

        let channels = self.channels.get(&direction).ok_or_else(|| {
            SignalError::actuation(direction.as_str(), "no signal head configured")
        })?;

        {
            let mut lit = self
                .lit
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if on {
                lit.insert((direction, color));
            } else {
                lit.remove(&(direction, color));
            }
        }

        trace!(
            direction = %direction,
            color = %color,
            channel = channels.channel(color),
            on,
            "light set"
        );
        self.record(LightEvent::Set {
            direction,
            color,
            on,
        });
        Ok(())
    }

    fn set_all(&self, color: LightColor, on: bool) -> Result<(), SignalError> {
        self.check_failure(&format!("all:{color}"))?;

        {
            let mut lit = self
                .lit
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for direction in self.channels.keys() {
                if on {
                    lit.insert((*direction, color));
                } else {
                    lit.remove(&(*direction, color));
                }
            }
        }

        trace!(color = %color, on, "all lights set");
        self.record(LightEvent::SetAll { color, on });
        Ok(())
    }

    fn reset_all(&self) -> Result<(), SignalError> {
        self.check_failure("all")?;

        self.lit
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();

        trace!("all lights reset");
        self.record(LightEvent::ResetAll);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_reset() {
        let board = MockLightBoard::with_default_channels();

        board
            .set_light(Direction::North, LightColor::Green, true)
            .unwrap();
        board
            .set_light(Direction::East, LightColor::Red, true)
            .unwrap();
        assert!(board.is_lit(Direction::North, LightColor::Green));
        assert_eq!(board.lit_count(LightColor::Green), 1);

        board.reset_all().unwrap();
        assert!(board.lit().is_empty());
    }

    #[test]
    fn test_set_all_covers_every_head() {
        let board = MockLightBoard::with_default_channels();
        board.set_all(LightColor::Red, true).unwrap();
        assert_eq!(board.lit_count(LightColor::Red), 4);

        board.set_all(LightColor::Red, false).unwrap();
        assert_eq!(board.lit_count(LightColor::Red), 0);
    }

    #[test]
    fn test_unknown_head_fails() {
        let board = MockLightBoard::new(HashMap::from([(
            Direction::North,
            LightChannels {
                red: 1,
                yellow: 2,
                green: 3,
            },
        )]));
        let result = board.set_light(Direction::South, LightColor::Green, true);
        assert!(result.is_err());
    }

    #[test]
    fn test_failure_injection() {
        let board = MockLightBoard::with_default_channels();
        board.inject_failures(true);
        assert!(board.set_all(LightColor::Red, true).is_err());
        assert!(board.reset_all().is_err());

        board.inject_failures(false);
        assert!(board.set_all(LightColor::Red, true).is_ok());
    }

    #[test]
    fn test_max_simultaneous_replay() {
        let board = MockLightBoard::with_default_channels();
        board
            .set_light(Direction::North, LightColor::Green, true)
            .unwrap();
        board
            .set_light(Direction::North, LightColor::Green, false)
            .unwrap();
        board
            .set_light(Direction::East, LightColor::Green, true)
            .unwrap();
        // Never more than one green at a time
        assert_eq!(board.max_simultaneous(LightColor::Green), 1);

        board
            .set_light(Direction::South, LightColor::Green, true)
            .unwrap();
        assert_eq!(board.max_simultaneous(LightColor::Green), 2);
    }

    #[test]
    fn test_history_preserves_order() {
        let board = MockLightBoard::with_default_channels();
        board.reset_all().unwrap();
        board
            .set_light(Direction::North, LightColor::Green, true)
            .unwrap();

        let history = board.history();
        assert_eq!(history[0], LightEvent::ResetAll);
        assert_eq!(
            history[1],
            LightEvent::Set {
                direction: Direction::North,
                color: LightColor::Green,
                on: true
            }
        );
    }
}
