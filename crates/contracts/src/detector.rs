//! Detection-side capability traits
//!
//! Frame acquisition and vehicle detection are external collaborators; these
//! traits are the seams they plug into. Mock and real implementations share
//! the same interface.

use crate::{DetectionResult, SignalError, TrafficFrame};

/// Source of video frames for one approach camera.
///
/// `next_frame` may block (device read, file decode); each approach runs its
/// source in its own task so a slow read never stalls another approach.
#[trait_variant::make(FrameSource: Send)]
pub trait LocalFrameSource {
    /// Identifier of the underlying source (device path, stream URL).
    fn source_id(&self) -> &str;

    /// Acquire the next frame.
    ///
    /// # Errors
    /// Read failures and end-of-stream are reported to the caller, which
    /// skips the tick and keeps its previous observation.
    async fn next_frame(&mut self) -> Result<TrafficFrame, SignalError>;
}

/// Vision inference capability.
///
/// Inference time is non-trivial and variable; callers must not hold any
/// lock across a `detect` call.
#[trait_variant::make(VehicleDetector: Send)]
pub trait LocalVehicleDetector {
    /// Analyze one frame and report vehicle counts plus the emergency flag.
    async fn detect(&self, frame: &TrafficFrame) -> Result<DetectionResult, SignalError>;
}

/// Emergency event entry point handed to every detection feed.
///
/// Implementations absorb overlapping notifications: at most one preemption
/// is ever in flight, later calls during that window are no-ops.
pub trait EmergencyNotifier: Send + Sync {
    fn notify_emergency(&self);
}
