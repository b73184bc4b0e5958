//! Emulated camera node.
//!
//! Renders a labelled black frame once at startup and emits the same bytes
//! for every input event until a stop event arrives.

use anyhow::{Context, Result};
use std::time::Duration;

use super::{log_stats, Flow, NodeEvent, NodeIo, NodeStats, StatsReporter, DEFAULT_OUTPUT_ID};
use crate::frame::Frame;
use crate::text::{draw_text, TextStyle};

const NODE_NAME: &str = "emulate_camera";

pub const DEFAULT_LABEL: &str = "Emulated camera";

/// Frame geometry and label of an emulated camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmulatorSettings {
    pub output_id: String,
    pub width: u32,
    pub height: u32,
    pub label: String,
    pub style: TextStyle,
    pub stats_interval: Option<Duration>,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            output_id: DEFAULT_OUTPUT_ID.to_string(),
            width: 500,
            height: 350,
            label: DEFAULT_LABEL.to_string(),
            style: TextStyle {
                origin: (50, 50),
                scale: 1,
                color: [255, 255, 255],
                thickness: 2,
            },
            stats_interval: None,
        }
    }
}

pub struct EmulatedCameraNode {
    frame: Frame,
    output_id: String,
    stats: NodeStats,
    reporter: StatsReporter,
}

impl EmulatedCameraNode {
    pub fn new(settings: EmulatorSettings) -> Self {
        let mut frame = Frame::zeroed(settings.width, settings.height);
        draw_text(&mut frame, &settings.label, &settings.style);
        log::info!(
            "emulate_camera: serving {}x{} frame labelled {:?} on output `{}`",
            settings.width,
            settings.height,
            settings.label,
            settings.output_id
        );
        Self {
            frame,
            output_id: settings.output_id,
            stats: NodeStats::default(),
            reporter: StatsReporter::new(NODE_NAME, settings.stats_interval),
        }
    }

    /// The frame emitted for every input.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    pub fn handle_event<I: NodeIo>(
        &mut self,
        event: NodeEvent<I::Metadata>,
        io: &mut I,
    ) -> Result<Flow> {
        self.stats.events += 1;
        let flow = match event {
            NodeEvent::Input { metadata, .. } => {
                io.send_output(&self.output_id, self.frame.flatten(), metadata)
                    .with_context(|| format!("send output `{}`", self.output_id))?;
                self.stats.emitted += 1;
                Flow::Continue
            }
            NodeEvent::Stop => {
                log::info!("emulate_camera: stop received");
                Flow::Exit
            }
            NodeEvent::InputClosed { id } => {
                self.stats.ignored += 1;
                log::debug!("emulate_camera: input `{}` closed", id);
                Flow::Continue
            }
            NodeEvent::Unknown(kind) => {
                self.stats.ignored += 1;
                log::debug!("emulate_camera: ignoring `{}` event", kind);
                Flow::Continue
            }
        };
        self.reporter.tick(&self.stats);
        Ok(flow)
    }

    /// Handle events until a stop event or the end of the event stream.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::testing::{input, ScriptedIo};

    #[test]
    fn default_frame_is_labelled_black_image() {
        let node = EmulatedCameraNode::new(EmulatorSettings::default());
        let frame = node.frame();

        assert_eq!((frame.width(), frame.height()), (500, 350));
        let bytes = frame.as_bytes();
        assert!(bytes.iter().any(|&v| v == 255));
        assert!(bytes.iter().all(|&v| v == 0 || v == 255));
        // Nothing is drawn below the label.
        assert_eq!(frame.pixel(250, 300), Some([0, 0, 0]));
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0]));
    }

    #[test]
    fn stop_ends_the_loop() -> Result<()> {
        let mut node = EmulatedCameraNode::new(EmulatorSettings::default());
        let mut io = ScriptedIo::new(vec![input(7), NodeEvent::Stop, input(8)]);

        let stats = node.run(&mut io)?;

        assert_eq!(stats.emitted, 1);
        assert_eq!(io.sent.len(), 1);
        assert_eq!(io.sent[0].2, 7);
        // The input after the stop was never pulled.
        assert_eq!(io.events.len(), 1);
        Ok(())
    }
}
