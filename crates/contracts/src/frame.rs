//! TrafficFrame - FrameSource output
//!
//! Opaque video frame handed from a frame source to the detector capability.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One captured frame from an approach camera.
///
/// The payload is opaque to the control core; only the detector capability
/// interprets it. `Bytes` keeps hand-off between tasks zero-copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficFrame {
    /// Monotonic per-source frame counter, starting at 1.
    pub sequence: u64,

    /// Seconds since the source started, for diagnostics.
    pub timestamp: f64,

    /// Raw frame data.
    pub payload: Bytes,
}

impl TrafficFrame {
    pub fn new(sequence: u64, timestamp: f64, payload: Bytes) -> Self {
        Self {
            sequence,
            timestamp,
            payload,
        }
    }
}
