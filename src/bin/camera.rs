//! camera - Forward frames from a capture device into the dataflow.
//!
//! One frame is read per input event, resized to the configured resolution
//! (320x240 by default) and emitted on the `image` output with the input's
//! metadata. Reads that produce no frame are skipped.
//!
//! Real devices need a build with `--features ingest-v4l2`; without it only
//! `stub://` devices open.

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;

use rover_camera::io::install_shutdown_flag;
use rover_camera::{open_device, CameraNode, CaptureDevice, IoMode, NodeConfig, StdioNode};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Forward camera frames into the rover dataflow"
)]
struct Args {
    /// Path to a JSON config file.
    #[arg(long, env = "CAMERA_NODE_CONFIG")]
    config: Option<PathBuf>,

    /// Runtime to attach to (dora|stdio).
    #[arg(long, env = "CAMERA_NODE_IO", value_name = "MODE")]
    io: Option<IoMode>,

    /// Capture device: index, device path or stub://<name>.
    #[arg(long)]
    device: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = NodeConfig::load(args.config.as_deref())?;
    if let Some(device) = args.device {
        config.camera.device = device;
    }

    let device = open_device(&config.capture_settings())?;
    let mut node = CameraNode::new(device, config.camera_settings());

    match args.io.unwrap_or_else(IoMode::default_mode) {
        IoMode::Dora => run_dora(&mut node)?,
        IoMode::Stdio => {
            let shutdown = install_shutdown_flag()?;
            let mut node_io = StdioNode::new(io::BufReader::new(io::stdin()), io::stdout())
                .with_shutdown(shutdown);
            node.run(&mut node_io)?;
        }
    }

    log::info!("camera: event stream closed, releasing {}", node.into_device().describe());
    Ok(())
}

#[cfg(feature = "dora")]
fn run_dora<D: CaptureDevice>(node: &mut CameraNode<D>) -> Result<()> {
    let mut io = rover_camera::DoraIo::init_from_env()?;
    node.run(&mut io)?;
    Ok(())
}

#[cfg(not(feature = "dora"))]
fn run_dora<D: CaptureDevice>(_node: &mut CameraNode<D>) -> Result<()> {
    Err(anyhow::anyhow!(
        "dora runtime support requires the dora feature (use --io stdio)"
    ))
}
