//! Camera nodes for the rover dataflow.
//!
//! Two independent nodes share this crate:
//!
//! - **camera**: reads one frame from a capture device per input event,
//!   resizes it to a fixed resolution and emits it flattened.
//! - **emulate_camera**: renders a labelled synthetic frame once and emits the
//!   same bytes for every input event until stopped.
//!
//! Both emit on the `image` output and pass the input's metadata through
//! unchanged. Event delivery and transport belong to the dataflow runtime and
//! are reached through the `NodeIo` trait.
//!
//! # Module Structure
//!
//! - `frame`: In-memory BGR frames (flatten, resize)
//! - `text`: Bitmap text rendering for the emulated frame
//! - `capture`: Capture devices (synthetic, V4L2)
//! - `node`: Event model and the two node loops
//! - `io`: Runtime backends (JSON lines, dora)
//! - `config`: Layered file/env configuration
//!
//! # Features
//!
//! Neither feature is on by default, so a plain build only runs against
//! `stub://` devices over `--io stdio`.
//!
//! - `ingest-v4l2`: real cameras through V4L2 (needs the kernel headers for
//!   `v4l2-sys`). Without it, `open_device` rejects device indexes and paths.
//! - `dora`: attach to the dora dataflow runtime (`--io dora`).
//!
//! A rover deployment builds with `cargo build --release --features ingest-v4l2,dora`.

pub mod capture;
pub mod config;
pub mod frame;
pub mod io;
pub mod node;
pub mod text;

#[cfg(feature = "ingest-v4l2")]
pub use capture::V4l2Device;
pub use capture::{open_device, CaptureDevice, CaptureSettings, DeviceSpec, SyntheticDevice};
pub use config::NodeConfig;
pub use frame::Frame;
#[cfg(feature = "dora")]
pub use io::DoraIo;
pub use io::{IoMode, OutputRecord, StdioNode};
pub use node::{
    CameraNode, CameraSettings, EmulatedCameraNode, EmulatorSettings, Flow, NodeEvent, NodeIo,
    NodeStats,
};
pub use text::{draw_text, TextStyle};
