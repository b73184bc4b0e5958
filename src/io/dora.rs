//! dora-rs node I/O (feature: dora).
//!
//! Metadata parameters of each input are forwarded unchanged; payloads are
//! sent as Arrow `UInt8Array`s.

use anyhow::{anyhow, Result};
use dora_node_api::dora_core::config::DataId;
use dora_node_api::{DoraNode, Event, EventStream, IntoArrow, MetadataParameters};

use crate::node::{NodeEvent, NodeIo};

pub struct DoraIo {
    node: DoraNode,
    events: EventStream,
}

impl DoraIo {
    /// Attach to the dataflow using the environment set up by the dora daemon.
    pub fn init_from_env() -> Result<Self> {
        let (node, events) = DoraNode::init_from_env()
            .map_err(|err| anyhow!("failed to initialize dora node: {:?}", err))?;
        Ok(Self { node, events })
    }
}

impl NodeIo for DoraIo {
    type Metadata = MetadataParameters;

    fn next_event(&mut self) -> Option<NodeEvent<MetadataParameters>> {
        let event = self.events.recv()?;
        Some(match event {
            Event::Input { id, metadata, .. } => NodeEvent::Input {
                id: id.as_str().to_string(),
                metadata: metadata.parameters,
            },
            Event::InputClosed { id } => NodeEvent::InputClosed {
                id: id.as_str().to_string(),
            },
            Event::Stop { .. } => NodeEvent::Stop,
            other => NodeEvent::Unknown(format!("{:?}", other)),
        })
    }

    fn send_output(
        &mut self,
        output: &str,
        data: Vec<u8>,
        metadata: MetadataParameters,
    ) -> Result<()> {
        self.node
            .send_output(DataId::from(output.to_owned()), metadata, data.into_arrow())
            .map_err(|err| anyhow!("failed to send output `{}`: {:?}", output, err))
    }
}
