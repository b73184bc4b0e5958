use anyhow::Result;
use serde_json::{json, Value};
use std::io::Cursor;

use rover_camera::{
    EmulatedCameraNode, EmulatorSettings, NodeEvent, NodeIo, OutputRecord, StdioNode,
};

struct RecordingIo {
    events: Vec<NodeEvent<Value>>,
    sent: Vec<(String, Vec<u8>, Value)>,
}

impl NodeIo for RecordingIo {
    type Metadata = Value;

    fn next_event(&mut self) -> Option<NodeEvent<Value>> {
        if self.events.is_empty() {
            None
        } else {
            Some(self.events.remove(0))
        }
    }

    fn send_output(&mut self, output: &str, data: Vec<u8>, metadata: Value) -> Result<()> {
        self.sent.push((output.to_string(), data, metadata));
        Ok(())
    }
}

fn input(seq: u64) -> NodeEvent<Value> {
    NodeEvent::Input {
        id: "tick".to_string(),
        metadata: json!({ "seq": seq }),
    }
}

#[test]
fn every_input_gets_the_same_frame() -> Result<()> {
    let mut node = EmulatedCameraNode::new(EmulatorSettings::default());
    let mut io = RecordingIo {
        events: (1..=4).map(input).collect(),
        sent: Vec::new(),
    };

    let stats = node.run(&mut io)?;

    assert_eq!(stats.emitted, 4);
    let first = &io.sent[0].1;
    assert_eq!(first.len(), 500 * 350 * 3);
    for (i, (output, data, metadata)) in io.sent.iter().enumerate() {
        assert_eq!(output, "image");
        assert_eq!(data, first);
        assert_eq!(*metadata, json!({ "seq": i as u64 + 1 }));
    }
    assert_eq!(first.as_slice(), node.frame().as_bytes());
    Ok(())
}

#[test]
fn stop_ends_emission() -> Result<()> {
    let mut node = EmulatedCameraNode::new(EmulatorSettings::default());
    let mut io = RecordingIo {
        events: vec![input(1), input(2), NodeEvent::Stop, input(3), input(4)],
        sent: Vec::new(),
    };

    let stats = node.run(&mut io)?;

    assert_eq!(stats.emitted, 2);
    assert_eq!(io.sent.len(), 2);
    assert_eq!(io.events.len(), 2);
    Ok(())
}

#[test]
fn unknown_events_are_skipped() -> Result<()> {
    let mut node = EmulatedCameraNode::new(EmulatorSettings::default());
    let mut io = RecordingIo {
        events: vec![
            NodeEvent::Unknown("ERROR".to_string()),
            NodeEvent::InputClosed {
                id: "tick".to_string(),
            },
            input(5),
        ],
        sent: Vec::new(),
    };

    let stats = node.run(&mut io)?;

    assert_eq!(stats.ignored, 2);
    assert_eq!(io.sent.len(), 1);
    assert_eq!(io.sent[0].2, json!({ "seq": 5 }));
    Ok(())
}

#[test]
fn rendering_is_deterministic() {
    let a = EmulatedCameraNode::new(EmulatorSettings::default());
    let b = EmulatedCameraNode::new(EmulatorSettings::default());
    assert_eq!(a.frame(), b.frame());

    let relabelled = EmulatedCameraNode::new(EmulatorSettings {
        label: "Rear camera".to_string(),
        ..EmulatorSettings::default()
    });
    assert_ne!(a.frame(), relabelled.frame());
}

#[test]
fn json_lines_digests_are_stable() -> Result<()> {
    let mut node = EmulatedCameraNode::new(EmulatorSettings::default());
    let events = concat!(
        "{\"type\":\"INPUT\",\"id\":\"tick\",\"metadata\":{\"seq\":1}}\n",
        "{\"type\":\"INPUT\",\"id\":\"tick\"}\n",
        "{\"type\":\"STOP\"}\n",
        "{\"type\":\"INPUT\",\"id\":\"tick\",\"metadata\":{\"seq\":3}}\n",
    );
    let mut io = StdioNode::new(Cursor::new(events), Vec::new());

    node.run(&mut io)?;

    let out = String::from_utf8(io.into_writer())?;
    let records: Vec<OutputRecord> = out
        .lines()
        .map(|line| serde_json::from_str::<OutputRecord>(line))
        .collect::<Result<_, _>>()?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sha256, records[1].sha256);
    assert_eq!(records[0].metadata, json!({"seq": 1}));
    assert_eq!(records[1].metadata, Value::Null);
    Ok(())
}
