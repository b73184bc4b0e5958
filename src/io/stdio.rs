//! JSON-lines node I/O.
//!
//! Events are read one per line:
//!
//! ```text
//! {"type": "INPUT", "id": "tick", "metadata": {"seq": 1}}
//! {"type": "STOP"}
//! ```
//!
//! Each emission is written as one JSON record carrying the output id, the
//! payload length, a SHA-256 digest of the payload and the metadata. Frame
//! bytes themselves are never written.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use crate::node::{NodeEvent, NodeIo};

#[derive(Debug, Deserialize)]
struct EventLine {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: Value,
}

/// One emitted output, as written to the sink.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OutputRecord {
    pub output: String,
    pub len: usize,
    pub sha256: String,
    pub metadata: Value,
}

/// How often a blocked `next_event` re-checks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

pub struct StdioNode<W> {
    lines: Receiver<io::Result<String>>,
    writer: W,
    shutdown: Option<Arc<AtomicBool>>,
    stopped: bool,
}

impl<W: Write> StdioNode<W> {
    /// Read events from `reader` on a background thread and write records to `writer`.
    pub fn new<R: BufRead + Send + 'static>(reader: R, writer: W) -> Self {
        let (tx, lines) = mpsc::channel();
        std::thread::spawn(move || {
            for line in reader.lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            lines,
            writer,
            shutdown: None,
            stopped: false,
        }
    }

    /// Deliver a stop event once `flag` is set, then end the event stream.
    ///
    /// The flag is honoured even while no event line is pending.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

impl<W: Write> NodeIo for StdioNode<W> {
    type Metadata = Value;

    fn next_event(&mut self) -> Option<NodeEvent<Value>> {
        if self.stopped {
            return None;
        }
        loop {
            if self.shutdown_requested() {
                self.stopped = true;
                return Some(NodeEvent::Stop);
            }

            let line = if self.shutdown.is_some() {
                match self.lines.recv_timeout(SHUTDOWN_POLL) {
                    Ok(line) => line,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => return None,
                }
            } else {
                self.lines.recv().ok()?
            };
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::warn!("stdio: failed to read event: {}", err);
                    return None;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Some(parse_event(trimmed));
        }
    }

    fn send_output(&mut self, output: &str, data: Vec<u8>, metadata: Value) -> Result<()> {
        let record = OutputRecord {
            output: output.to_string(),
            len: data.len(),
            sha256: hex::encode(Sha256::digest(&data)),
            metadata,
        };
        serde_json::to_writer(&mut self.writer, &record).context("encode output record")?;
        self.writer
            .write_all(b"\n")
            .and_then(|_| self.writer.flush())
            .context("write output record")?;
        Ok(())
    }
}

/// Parse one event line. Lines that are not valid events map to `Unknown`.
pub fn parse_event(line: &str) -> NodeEvent<Value> {
    let event: EventLine = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(err) => {
            log::warn!("stdio: ignoring malformed event: {}", err);
            return NodeEvent::Unknown("malformed".to_string());
        }
    };
    match event.kind.as_str() {
        "INPUT" => NodeEvent::Input {
            id: event.id.unwrap_or_default(),
            metadata: event.metadata,
        },
        "INPUT_CLOSED" => NodeEvent::InputClosed {
            id: event.id.unwrap_or_default(),
        },
        "STOP" => NodeEvent::Stop,
        _ => NodeEvent::Unknown(event.kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;
    use std::time::Instant;

    #[test]
    fn parses_event_kinds() {
        assert_eq!(
            parse_event(r#"{"type":"INPUT","id":"tick","metadata":{"seq":3}}"#),
            NodeEvent::Input {
                id: "tick".to_string(),
                metadata: json!({"seq": 3}),
            }
        );
        assert_eq!(parse_event(r#"{"type":"STOP"}"#), NodeEvent::Stop);
        assert_eq!(
            parse_event(r#"{"type":"INPUT_CLOSED","id":"tick"}"#),
            NodeEvent::InputClosed {
                id: "tick".to_string()
            }
        );
        assert_eq!(
            parse_event(r#"{"type":"RELOAD"}"#),
            NodeEvent::Unknown("RELOAD".to_string())
        );
    }

    #[test]
    fn malformed_lines_are_unknown() {
        assert_eq!(
            parse_event("not json"),
            NodeEvent::Unknown("malformed".to_string())
        );
        assert_eq!(
            parse_event(r#"{"id":"tick"}"#),
            NodeEvent::Unknown("malformed".to_string())
        );
    }

    #[test]
    fn skips_blank_lines_and_ends_at_eof() {
        let input = Cursor::new("\n  \n{\"type\":\"STOP\"}\n");
        let mut node = StdioNode::new(input, Vec::new());
        assert_eq!(node.next_event(), Some(NodeEvent::Stop));
        assert_eq!(node.next_event(), None);
    }

    #[test]
    fn writes_digest_records() -> Result<()> {
        let mut node = StdioNode::new(Cursor::new(""), Vec::new());
        node.send_output("image", vec![1, 2, 3], json!({"seq": 1}))?;

        let out = String::from_utf8(node.into_writer())?;
        let record: OutputRecord = serde_json::from_str(out.trim())?;
        assert_eq!(record.output, "image");
        assert_eq!(record.len, 3);
        assert_eq!(record.sha256, hex::encode(Sha256::digest([1u8, 2, 3])));
        assert_eq!(record.metadata, json!({"seq": 1}));
        Ok(())
    }

    /// Reader that blocks until its sender is dropped, like an idle stdin pipe.
    struct IdleReader(mpsc::Receiver<()>);

    impl io::Read for IdleReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn shutdown_interrupts_idle_reader() {
        let (_keep_open, rx) = mpsc::channel::<()>();
        let flag = Arc::new(AtomicBool::new(false));
        let mut node = StdioNode::new(io::BufReader::new(IdleReader(rx)), Vec::new())
            .with_shutdown(Arc::clone(&flag));

        let setter = Arc::clone(&flag);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            setter.store(true, Ordering::SeqCst);
        });

        let started = Instant::now();
        assert_eq!(node.next_event(), Some(NodeEvent::Stop));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(node.next_event(), None);
    }

    #[test]
    fn shutdown_flag_delivers_stop_once() {
        let flag = Arc::new(AtomicBool::new(true));
        let input = Cursor::new("{\"type\":\"INPUT\",\"id\":\"tick\"}\n");
        let mut node = StdioNode::new(input, Vec::new()).with_shutdown(flag);
        assert_eq!(node.next_event(), Some(NodeEvent::Stop));
        assert_eq!(node.next_event(), None);
    }
}
