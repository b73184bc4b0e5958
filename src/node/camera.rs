//! Camera node.
//!
//! Reads one frame per input event, resizes it to the configured resolution
//! and forwards it flattened. A read that yields no frame skips the event:
//! nothing is emitted and the loop carries on. There is no retry.

use anyhow::{Context, Result};
use std::time::Duration;

use super::{log_stats, Flow, NodeEvent, NodeIo, NodeStats, StatsReporter, DEFAULT_OUTPUT_ID};
use crate::capture::CaptureDevice;

const NODE_NAME: &str = "camera";

/// Output configuration of a camera node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraSettings {
    pub output_id: String,
    pub width: u32,
    pub height: u32,
    pub stats_interval: Option<Duration>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            output_id: DEFAULT_OUTPUT_ID.to_string(),
            width: 320,
            height: 240,
            stats_interval: None,
        }
    }
}

pub struct CameraNode<D> {
    device: D,
    settings: CameraSettings,
    stats: NodeStats,
    reporter: StatsReporter,
}

impl<D: CaptureDevice> CameraNode<D> {
    /// Take ownership of `device` and request the output resolution from it.
    ///
    /// The request is best-effort: a device that refuses it keeps its own
    /// resolution and frames are resized on every read instead.
    pub fn new(mut device: D, settings: CameraSettings) -> Self {
        if let Err(err) = device.set_resolution(settings.width, settings.height) {
            log::warn!(
                "camera: {} refused {}x{}: {:#}",
                device.describe(),
                settings.width,
                settings.height,
                err
            );
        }
        log::info!(
            "camera: capturing from {} as {}x{} on output `{}`",
            device.describe(),
            settings.width,
            settings.height,
            settings.output_id
        );
        let reporter = StatsReporter::new(NODE_NAME, settings.stats_interval);
        Self {
            device,
            settings,
            stats: NodeStats::default(),
            reporter,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    /// Release the capture device.
    pub fn into_device(self) -> D {
        self.device
    }

    pub fn handle_event<I: NodeIo>(
        &mut self,
        event: NodeEvent<I::Metadata>,
        io: &mut I,
    ) -> Result<Flow> {
        self.stats.events += 1;
        match event {
            NodeEvent::Input { id, metadata } => {
                let frame = match self.device.read() {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        self.stats.dropped += 1;
                        log::debug!("camera: no frame available for input `{}`", id);
                        return Ok(Flow::Continue);
                    }
                    Err(err) => {
                        self.stats.dropped += 1;
                        log::debug!("camera: frame read failed for input `{}`: {:#}", id, err);
                        return Ok(Flow::Continue);
                    }
                };

                let frame = frame
                    .resized(self.settings.width, self.settings.height)
                    .context("resize captured frame")?;
                io.send_output(&self.settings.output_id, frame.into_flat(), metadata)
                    .with_context(|| format!("send output `{}`", self.settings.output_id))?;
                self.stats.emitted += 1;
            }
            NodeEvent::Stop => {
                // The loop ends when the runtime closes the event stream.
                self.stats.ignored += 1;
                log::debug!("camera: stop received");
            }
            NodeEvent::InputClosed { id } => {
                self.stats.ignored += 1;
                log::debug!("camera: input `{}` closed", id);
            }
            NodeEvent::Unknown(kind) => {
                self.stats.ignored += 1;
                log::debug!("camera: ignoring `{}` event", kind);
            }
        }
        self.reporter.tick(&self.stats);
        Ok(Flow::Continue)
    }

    /// Handle events until the event stream ends.
    pub fn run<I: NodeIo>(&mut self, io: &mut I) -> Result<NodeStats> {
        while let Some(event) = io.next_event() {
            if self.handle_event(event, io)? == Flow::Exit {
                break;
            }
        }
        log_stats(NODE_NAME, &self.stats);
        Ok(self.stats)
    }
}
