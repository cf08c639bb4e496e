//! Phase state machine
//!
//! One approach holds Green at a time; each phase runs
//! Green → Yellow → AllRed, then right of way advances to the next
//! direction in the configured clockwise cycle. Green length comes from the
//! timing engine and the latest observation. An emergency preemption
//! interrupts the green hold; the cycle resumes at AllRed for the
//! interrupted direction, never mid-green with a stale duration.

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    Direction, LightActuator, LightColor, PhaseState, SharedTrafficState, SignalError, TimingConfig,
};
use observability::RunningStats;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::emergency::EmergencyCoordinator;
use crate::timing::compute_green_duration;

/// Scheduler construction parameters.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Phase timing parameters.
    pub timing: TimingConfig,

    /// Right-of-way cycle order.
    pub cycle: Vec<Direction>,

    /// Stop after this many completed phases (None = run until shutdown).
    pub max_phases: Option<u64>,
}

/// Statistics from a scheduler run
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Full Green→Yellow→AllRed phases completed.
    pub phases_completed: u64,

    /// Emergency preemptions served.
    pub preemptions: u64,

    /// Computed green durations (seconds).
    pub green_secs: RunningStats,
}

/// How a timed hold ended.
enum Hold {
    Completed,
    Preempted,
    Shutdown,
}

/// The intersection phase state machine.
///
/// Owns the actuator for the lifetime of the run; the emergency blink runs
/// inside this task, so light state has exactly one writer.
pub struct PhaseScheduler<A: LightActuator> {
    actuator: Arc<A>,
    state: Arc<SharedTrafficState>,
    config: SchedulerConfig,
    coordinator: EmergencyCoordinator,
    shutdown: watch::Receiver<bool>,
    phase_tx: watch::Sender<PhaseState>,
    stats: SchedulerStats,
}

impl<A: LightActuator> PhaseScheduler<A> {
    pub fn new(
        actuator: Arc<A>,
        state: Arc<SharedTrafficState>,
        config: SchedulerConfig,
        coordinator: EmergencyCoordinator,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let first = config.cycle.first().copied().unwrap_or(Direction::North);
        let (phase_tx, _) = watch::channel(PhaseState::new(first, LightColor::Red));
        Self {
            actuator,
            state,
            config,
            coordinator,
            shutdown,
            phase_tx,
            stats: SchedulerStats::default(),
        }
    }

    /// Watch phase transitions (tests, dashboards).
    pub fn phase_watch(&self) -> watch::Receiver<PhaseState> {
        self.phase_tx.subscribe()
    }

    /// Run the cycle until shutdown (or the configured phase limit).
    ///
    /// Always leaves the lights in the safe state (reset, then all-red) on
    /// the way out.
    pub async fn run(mut self) -> SchedulerStats {
        if self.config.cycle.is_empty() {
            warn!("empty cycle order, scheduler not starting");
            return self.stats;
        }

        info!(cycle = ?self.config.cycle, "phase scheduler started");
        let mut index = 0usize;

        loop {
            let direction = self.config.cycle[index];

            // ---- Green ----
            let observation = self.state.observation(direction);
            let green = compute_green_duration(observation.as_ref(), &self.config.timing);
            let vehicles = observation.as_ref().map(|o| o.count).unwrap_or(0);
            self.stats.green_secs.push(green.as_secs_f64());
            observability::record_green_duration(direction.as_str(), green.as_secs_f64());

            self.apply_green(direction);
            self.publish(direction, LightColor::Green);
            info!(
                direction = %direction,
                green_secs = green.as_secs(),
                vehicles,
                "green phase"
            );

            match self.hold_green(green).await {
                Hold::Completed => {
                    // ---- Yellow ----
                    if self.coordinator.take_pending() {
                        // Safe-state priority: a pending emergency skips
                        // yellow and goes straight to the blink.
                        self.preempt(direction).await;
                    } else {
                        self.apply_yellow(direction);
                        self.publish(direction, LightColor::Yellow);
                        debug!(direction = %direction, "yellow phase");
                        let yellow = self.config.timing.yellow();
                        if matches!(self.sleep_or_shutdown(yellow).await, Hold::Shutdown) {
                            break;
                        }
                    }
                }
                Hold::Preempted => self.preempt(direction).await,
                Hold::Shutdown => break,
            }

            // ---- AllRed ----
            self.apply_all_red();
            self.publish(direction, LightColor::Red);
            debug!(direction = %direction, "all-red interval");
            let all_red = self.config.timing.all_red();
            if matches!(self.sleep_or_shutdown(all_red).await, Hold::Shutdown) {
                break;
            }

            // ---- Advance ----
            index = (index + 1) % self.config.cycle.len();
            self.stats.phases_completed += 1;

            if let Some(max) = self.config.max_phases {
                if self.stats.phases_completed >= max {
                    info!(phases = self.stats.phases_completed, "phase limit reached");
                    break;
                }
            }
        }

        self.safe_state();
        info!(
            phases = self.stats.phases_completed,
            preemptions = self.stats.preemptions,
            "phase scheduler stopped"
        );
        self.stats
    }

    /// Hold green, watching for a preemption request and shutdown.
    async fn hold_green(&mut self, green: Duration) -> Hold {
        let coordinator = &mut self.coordinator;
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            _ = sleep(green) => Hold::Completed,
            _ = coordinator.wait_for_request() => Hold::Preempted,
            _ = shutdown.wait_for(|stop| *stop) => Hold::Shutdown,
        }
    }

    /// Hold a fixed, non-preemptible interval, still observing shutdown.
    async fn sleep_or_shutdown(&mut self, duration: Duration) -> Hold {
        let mut shutdown = self.shutdown.clone();
        tokio::select! {
            _ = sleep(duration) => Hold::Completed,
            _ = shutdown.wait_for(|stop| *stop) => Hold::Shutdown,
        }
    }

    async fn preempt(&mut self, direction: Direction) {
        debug!(direction = %direction, "green interrupted by emergency");
        self.coordinator.run_preemption(self.actuator.as_ref()).await;
        self.stats.preemptions += 1;
    }

    /// Active approach green, everyone else red. Reset first, set after:
    /// the swap must never show two greens.
    fn apply_green(&self, active: Direction) {
        self.actuate("reset", self.actuator.reset_all());
        for direction in &self.config.cycle {
            let color = if *direction == active {
                LightColor::Green
            } else {
                LightColor::Red
            };
            self.actuate(
                direction.as_str(),
                self.actuator.set_light(*direction, color, true),
            );
        }
        observability::record_phase_transition(active.as_str(), "green");
    }

    /// Green off, yellow on for the active approach; other reds stay lit.
    fn apply_yellow(&self, active: Direction) {
        self.actuate(
            active.as_str(),
            self.actuator.set_light(active, LightColor::Green, false),
        );
        self.actuate(
            active.as_str(),
            self.actuator.set_light(active, LightColor::Yellow, true),
        );
        observability::record_phase_transition(active.as_str(), "yellow");
    }

    fn apply_all_red(&self) {
        self.actuate("reset", self.actuator.reset_all());
        self.actuate("all:red", self.actuator.set_all(LightColor::Red, true));
        observability::record_phase_transition("all", "red");
    }

    /// Mandatory shutdown cleanup: the intersection is left steady all-red.
    fn safe_state(&self) {
        self.actuate("reset", self.actuator.reset_all());
        self.actuate("all:red", self.actuator.set_all(LightColor::Red, true));
        info!("lights forced to safe state");
    }

    fn publish(&self, direction: Direction, color: LightColor) {
        self.phase_tx.send_replace(PhaseState::new(direction, color));
    }

    /// A failed light write is logged and absorbed; the scheduler's own
    /// notion of the phase stays authoritative and the next transition
    /// rewrites every light.
    fn actuate(&self, target: &str, result: Result<(), SignalError>) {
        if let Err(error) = result {
            warn!(target, error = %error, "light actuation failed, continuing");
            observability::record_actuation_failure(target);
        }
    }
}
