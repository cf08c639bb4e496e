//! # Detection
//!
//! Per-direction detection feeds: pull frames from a `FrameSource`, run the
//! `VehicleDetector` capability on every Nth frame, and write the resulting
//! observation into `SharedTrafficState`. Emergencies are reported through
//! the `EmergencyNotifier` seam.
//!
//! Mock frame sources and detectors live here too, so the whole system runs
//! without cameras or a vision model.

mod feed;
mod mock;

pub use feed::{DetectionFeed, FeedConfig, FeedStats};
pub use mock::{MockDetectorConfig, MockFrameSource, MockFrameSourceConfig, MockVehicleDetector};
