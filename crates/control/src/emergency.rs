//! Emergency preemption protocol
//!
//! Detection feeds report emergency vehicles through an [`EmergencyHandle`];
//! the control task owns the [`EmergencyCoordinator`], runs the all-red
//! blink pattern, and then hands right of way back to the scheduler.
//!
//! At most one preemption is ever in flight. The request channel holds a
//! single slot and the shared emergency flag covers the blink window, so
//! overlapping notifications are absorbed instead of queueing extra blink
//! sequences or restarting the timer.

use std::sync::Arc;
use std::time::Duration;

use contracts::{EmergencyNotifier, LightActuator, LightColor, SharedTrafficState};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Toggle period of the all-red blink pattern.
pub const BLINK_TOGGLE_PERIOD: Duration = Duration::from_millis(500);

/// Marker message for "emergency vehicle seen".
#[derive(Debug, Clone, Copy)]
pub struct EmergencyEvent;

/// Build the notifier/coordinator pair around the shared state.
pub fn emergency_channel(
    state: Arc<SharedTrafficState>,
    blink_duration: Duration,
) -> (EmergencyHandle, EmergencyCoordinator) {
    let (tx, rx) = mpsc::channel(1);
    (
        EmergencyHandle {
            tx,
            state: Arc::clone(&state),
        },
        EmergencyCoordinator {
            rx,
            state,
            blink_duration,
        },
    )
}

/// Cheap-to-clone emergency entry point, one per detection feed.
#[derive(Clone)]
pub struct EmergencyHandle {
    tx: mpsc::Sender<EmergencyEvent>,
    state: Arc<SharedTrafficState>,
}

impl EmergencyNotifier for EmergencyHandle {
    fn notify_emergency(&self) {
        if self.state.emergency_active() {
            debug!("emergency notification absorbed: preemption in progress");
            return;
        }
        match self.tx.try_send(EmergencyEvent) {
            Ok(()) => info!("emergency preemption requested"),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("emergency notification absorbed: request already pending");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("emergency channel closed, controller not running");
            }
        }
    }
}

/// Receive side of the preemption protocol, owned by the control task.
pub struct EmergencyCoordinator {
    rx: mpsc::Receiver<EmergencyEvent>,
    state: Arc<SharedTrafficState>,
    blink_duration: Duration,
}

impl EmergencyCoordinator {
    /// Whether a blink sequence is currently running.
    pub fn is_emergency_active(&self) -> bool {
        self.state.emergency_active()
    }

    /// Resolves when a preemption request arrives.
    ///
    /// If every handle has been dropped no request can ever arrive, so the
    /// future stays pending rather than resolving spuriously.
    pub async fn wait_for_request(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Take a pending request without waiting.
    pub fn take_pending(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Run one full blink sequence, then return control to the caller.
    ///
    /// Toggles all-red on/off every 500 ms for the configured duration,
    /// restores the steady all-red-off state, and clears the emergency
    /// flag. Requests that raced in while the blink was running belong to
    /// the same incident and are dropped afterwards.
    pub async fn run_preemption<A: LightActuator>(&mut self, actuator: &A) {
        self.state.set_emergency_active(true);
        info!(
            blink_secs = self.blink_duration.as_secs(),
            "emergency preemption: blinking all-red"
        );
        observability::record_preemption();

        let toggles = (self.blink_duration.as_millis() / BLINK_TOGGLE_PERIOD.as_millis()) as u32;
        for toggle in 0..toggles {
            let on = toggle % 2 == 0;
            if let Err(error) = actuator.set_all(LightColor::Red, on) {
                warn!(error = %error, "actuation failed during blink, continuing");
                observability::record_actuation_failure("all:red");
            }
            sleep(BLINK_TOGGLE_PERIOD).await;
        }

        if let Err(error) = actuator.set_all(LightColor::Red, false) {
            warn!(error = %error, "actuation failed restoring steady state");
            observability::record_actuation_failure("all:red");
        }

        self.state.set_emergency_active(false);
        while self.rx.try_recv().is_ok() {}

        info!("emergency preemption complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actuation::{LightEvent, MockLightBoard};

    fn setup(blink_secs: u64) -> (EmergencyHandle, EmergencyCoordinator) {
        emergency_channel(
            Arc::new(SharedTrafficState::new()),
            Duration::from_secs(blink_secs),
        )
    }

    #[test]
    fn test_notify_queues_one_request() {
        let (handle, mut coordinator) = setup(10);

        handle.notify_emergency();
        handle.notify_emergency();
        handle.notify_emergency();

        assert!(coordinator.take_pending());
        assert!(!coordinator.take_pending(), "extra requests must be absorbed");
    }

    #[test]
    fn test_notify_absorbed_while_active() {
        let (handle, mut coordinator) = setup(10);

        coordinator.state.set_emergency_active(true);
        handle.notify_emergency();
        assert!(!coordinator.take_pending());

        coordinator.state.set_emergency_active(false);
        handle.notify_emergency();
        assert!(coordinator.take_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_toggle_count() {
        let (_handle, mut coordinator) = setup(10);
        let board = MockLightBoard::with_default_channels();

        coordinator.run_preemption(&board).await;

        let set_all: Vec<bool> = board
            .history()
            .iter()
            .filter_map(|event| match event {
                LightEvent::SetAll {
                    color: LightColor::Red,
                    on,
                } => Some(*on),
                _ => None,
            })
            .collect();

        // 10 s at a 0.5 s toggle period: 20 toggles (10 on, 10 off),
        // then the steady all-red-off restore.
        assert_eq!(set_all.len(), 21);
        assert_eq!(set_all.iter().filter(|on| **on).count(), 10);
        for (index, on) in set_all[..20].iter().enumerate() {
            assert_eq!(*on, index % 2 == 0, "toggle {index} out of phase");
        }
        assert!(!set_all[20], "must end all-red-off");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flag_set_during_blink_and_cleared_after() {
        let (handle, mut coordinator) = setup(2);
        let board = MockLightBoard::with_default_channels();

        assert!(!coordinator.is_emergency_active());
        coordinator.run_preemption(&board).await;
        assert!(!coordinator.is_emergency_active());

        // Requests raced in during the blink were drained
        handle.notify_emergency();
        assert!(coordinator.take_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_request_resolves_on_notify() {
        let (handle, mut coordinator) = setup(2);

        let waiter = tokio::spawn(async move {
            coordinator.wait_for_request().await;
            coordinator
        });

        handle.notify_emergency();
        let _coordinator = waiter.await.expect("waiter must complete");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_continues_through_actuation_failure() {
        let (_handle, mut coordinator) = setup(2);
        let board = MockLightBoard::with_default_channels();
        board.inject_failures(true);

        // Must not panic or abort early
        coordinator.run_preemption(&board).await;
        assert!(!coordinator.is_emergency_active());
    }
}
