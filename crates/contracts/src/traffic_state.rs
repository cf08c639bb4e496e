//! SharedTrafficState - concurrency-safe observation store
//!
//! Written by the per-direction detection tasks, read by the control task.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::{Direction, VehicleObservation};

/// Shared traffic state for the whole intersection.
///
/// One mutex guards the observation map; observations are cloned out under
/// the lock, so a reader can never see a partially written entry. The
/// emergency flag is an atomic so a detection task's transition is visible
/// to the control task without taking the map lock. The lock is only ever
/// held for the insert or clone itself, never across a blocking call.
#[derive(Debug, Default)]
pub struct SharedTrafficState {
    observations: Mutex<HashMap<Direction, VehicleObservation>>,
    emergency_active: AtomicBool,
}

impl SharedTrafficState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the observation for one approach (last write wins).
    pub fn record_observation(&self, direction: Direction, observation: VehicleObservation) {
        let mut observations = self
            .observations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        observations.insert(direction, observation);
    }

    /// Current observation for one approach, if any tick has landed yet.
    pub fn observation(&self, direction: Direction) -> Option<VehicleObservation> {
        let observations = self
            .observations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        observations.get(&direction).cloned()
    }

    /// Copy of the whole observation map.
    pub fn snapshot(&self) -> HashMap<Direction, VehicleObservation> {
        let observations = self
            .observations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        observations.clone()
    }

    /// Whether an emergency preemption is currently in progress.
    pub fn emergency_active(&self) -> bool {
        self.emergency_active.load(Ordering::SeqCst)
    }

    pub fn set_emergency_active(&self, active: bool) {
        self.emergency_active.store(active, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_record_and_read_back() {
        let state = SharedTrafficState::new();
        assert!(state.observation(Direction::North).is_none());

        let obs = VehicleObservation::from_type_counts(Map::from([("car".to_string(), 4)]));
        state.record_observation(Direction::North, obs.clone());
        assert_eq!(state.observation(Direction::North), Some(obs));
        assert!(state.observation(Direction::South).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let state = SharedTrafficState::new();
        for n in 1..=5u32 {
            let obs = VehicleObservation::from_type_counts(Map::from([("car".to_string(), n)]));
            state.record_observation(Direction::East, obs);
        }
        assert_eq!(state.observation(Direction::East).unwrap().count, 5);
    }

    #[test]
    fn test_emergency_flag() {
        let state = SharedTrafficState::new();
        assert!(!state.emergency_active());
        state.set_emergency_active(true);
        assert!(state.emergency_active());
        state.set_emergency_active(false);
        assert!(!state.emergency_active());
    }

    #[test]
    fn test_concurrent_writers_never_tear() {
        let state = Arc::new(SharedTrafficState::new());
        let mut writers = Vec::new();

        for direction in Direction::CYCLE {
            let state = Arc::clone(&state);
            writers.push(thread::spawn(move || {
                for n in 0..500u32 {
                    let obs = VehicleObservation::from_type_counts(Map::from([
                        ("car".to_string(), n),
                        ("bus".to_string(), n / 3),
                    ]));
                    state.record_observation(direction, obs);
                }
            }));
        }

        let reader = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for _ in 0..2000 {
                    for direction in Direction::CYCLE {
                        if let Some(obs) = state.observation(direction) {
                            assert!(obs.is_consistent(), "torn observation read");
                        }
                    }
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();
    }
}
