//! Signal controller metric recording
//!
//! Phase, preemption, and detection metrics, exported through the `metrics`
//! facade (Prometheus when the exporter is installed).

use metrics::{counter, gauge, histogram};

/// Record a phase transition of the scheduler.
///
/// Called on every actuated state change (green, yellow, all-red).
pub fn record_phase_transition(direction: &str, color: &str) {
    counter!(
        "crosslight_phase_transitions_total",
        "direction" => direction.to_string(),
        "color" => color.to_string()
    )
    .increment(1);
}

/// Record the computed green duration for one phase.
pub fn record_green_duration(direction: &str, secs: f64) {
    gauge!(
        "crosslight_green_duration_seconds",
        "direction" => direction.to_string()
    )
    .set(secs);
    histogram!("crosslight_green_duration_seconds_hist").record(secs);
}

/// Record one emergency preemption (a full blink sequence).
pub fn record_preemption() {
    counter!("crosslight_preemptions_total").increment(1);
}

/// Record a detection tick that produced an observation.
pub fn record_observation(direction: &str, count: u32) {
    counter!(
        "crosslight_observations_total",
        "direction" => direction.to_string()
    )
    .increment(1);
    gauge!(
        "crosslight_observed_vehicles",
        "direction" => direction.to_string()
    )
    .set(count as f64);
    histogram!("crosslight_observed_vehicles_hist").record(count as f64);
}

/// Record a frame acquisition failure (tick skipped).
pub fn record_frame_failure(direction: &str) {
    counter!(
        "crosslight_frame_failures_total",
        "direction" => direction.to_string()
    )
    .increment(1);
}

/// Record a detector capability failure (zero observation substituted).
pub fn record_detector_failure(direction: &str) {
    counter!(
        "crosslight_detector_failures_total",
        "direction" => direction.to_string()
    )
    .increment(1);
}

/// Record a light write failure (logged and absorbed by the caller).
pub fn record_actuation_failure(target: &str) {
    counter!(
        "crosslight_actuation_failures_total",
        "target" => target.to_string()
    )
    .increment(1);
}

/// Summarized statistics
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics accumulator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean value
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum value
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum value
    pub fn max(&self) -> f64 {
        self.max
    }
}
