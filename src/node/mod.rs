//! Dataflow node plumbing.
//!
//! Both nodes follow the same shape: own one resource (a capture device or a
//! static frame), pull events from a `NodeIo`, emit one flattened frame per
//! input event. Event delivery and transport live behind `NodeIo`.

use anyhow::Result;
use std::time::{Duration, Instant};

pub mod camera;
pub mod emulator;

pub use camera::{CameraNode, CameraSettings};
pub use emulator::{EmulatedCameraNode, EmulatorSettings};

/// Output channel both nodes emit on.
pub const DEFAULT_OUTPUT_ID: &str = "image";

/// Event delivered by the dataflow runtime.
///
/// `metadata` is opaque to the nodes and passed through unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeEvent<M> {
    Input { id: String, metadata: M },
    InputClosed { id: String },
    Stop,
    /// Any event kind the nodes do not act on.
    Unknown(String),
}

/// Connection to the dataflow runtime.
pub trait NodeIo {
    type Metadata;

    /// Next event, or `None` once the runtime closes the event stream.
    fn next_event(&mut self) -> Option<NodeEvent<Self::Metadata>>;

    /// Send `data` on output `output`, tagged with `metadata`.
    fn send_output(&mut self, output: &str, data: Vec<u8>, metadata: Self::Metadata)
        -> Result<()>;
}

/// Whether the event loop keeps going after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Counters kept by a node over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub events: u64,
    pub emitted: u64,
    /// Input events for which no frame could be read.
    pub dropped: u64,
    /// Events handled by a no-op arm.
    pub ignored: u64,
}

/// Logs `NodeStats` at most once per interval.
pub(crate) struct StatsReporter {
    node: &'static str,
    interval: Option<Duration>,
    last: Instant,
}

impl StatsReporter {
    pub(crate) fn new(node: &'static str, interval: Option<Duration>) -> Self {
        Self {
            node,
            interval,
            last: Instant::now(),
        }
    }

    pub(crate) fn tick(&mut self, stats: &NodeStats) {
        let Some(interval) = self.interval else {
            return;
        };
        if self.last.elapsed() >= interval {
            log_stats(self.node, stats);
            self.last = Instant::now();
        }
    }
}

pub(crate) fn log_stats(node: &str, stats: &NodeStats) {
    log::info!(
        "{}: events={} emitted={} dropped={} ignored={}",
        node,
        stats.events,
        stats.emitted,
        stats.dropped,
        stats.ignored
    );
}
