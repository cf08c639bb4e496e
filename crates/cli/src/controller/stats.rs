//! Controller run statistics.

use std::time::Duration;

use observability::StatsSummary;

/// Statistics from a controller run
#[derive(Debug, Clone, Default)]
pub struct ControllerStats {
    /// Full phases (Green→Yellow→AllRed) completed
    pub phases_completed: u64,

    /// Emergency preemptions served
    pub preemptions: u64,

    /// Computed green durations (seconds)
    pub green_secs: StatsSummary,

    /// Frames pulled across every detection feed
    pub frames_seen: u64,

    /// Detection ticks that produced an observation
    pub detections: u64,

    /// Frame reads that failed (ticks skipped)
    pub frame_failures: u64,

    /// Detector calls that failed (zero observation substituted)
    pub detector_failures: u64,

    /// Emergency flags raised by the feeds
    pub emergencies_reported: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of detection feeds that were active
    pub active_feeds: usize,
}

impl ControllerStats {
    /// Completed phases per minute of run time
    pub fn phases_per_minute(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.phases_completed as f64 / (self.duration.as_secs_f64() / 60.0)
        } else {
            0.0
        }
    }

    /// Share of detection ticks that failed, as a percentage
    #[allow(dead_code)]
    pub fn detector_failure_rate(&self) -> f64 {
        let total = self.detections + self.detector_failures;
        if total > 0 {
            (self.detector_failures as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Controller Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("🚦 Phases");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Phases completed: {}", self.phases_completed);
        println!("   ├─ Phases/minute: {:.2}", self.phases_per_minute());
        println!("   ├─ Green duration (s): {}", self.green_secs);
        println!("   └─ Emergency preemptions: {}", self.preemptions);

        println!("\n📷 Detection");
        println!("   ├─ Active feeds: {}", self.active_feeds);
        println!("   ├─ Frames seen: {}", self.frames_seen);
        println!("   ├─ Observations: {}", self.detections);
        println!("   ├─ Frame failures: {}", self.frame_failures);
        println!("   ├─ Detector failures: {}", self.detector_failures);
        println!("   └─ Emergency flags raised: {}", self.emergencies_reported);

        println!();
    }
}
