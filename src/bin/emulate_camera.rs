//! emulate_camera - Stand-in for the camera node on hosts without a camera.
//!
//! Emits the same labelled 500x350 black frame for every input event and
//! exits on the dataflow's stop event.

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;

use rover_camera::io::install_shutdown_flag;
use rover_camera::{EmulatedCameraNode, IoMode, NodeConfig, StdioNode};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Emit a static synthetic camera frame into the rover dataflow"
)]
struct Args {
    /// Path to a JSON config file.
    #[arg(long, env = "CAMERA_NODE_CONFIG")]
    config: Option<PathBuf>,

    /// Runtime to attach to (dora|stdio).
    #[arg(long, env = "CAMERA_NODE_IO", value_name = "MODE")]
    io: Option<IoMode>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = NodeConfig::load(args.config.as_deref())?;
    let mut node = EmulatedCameraNode::new(config.emulator_settings());

    match args.io.unwrap_or_else(IoMode::default_mode) {
        IoMode::Dora => run_dora(&mut node)?,
        IoMode::Stdio => {
            let shutdown = install_shutdown_flag()?;
            let mut node_io = StdioNode::new(io::BufReader::new(io::stdin()), io::stdout())
                .with_shutdown(shutdown);
            node.run(&mut node_io)?;
        }
    }

    Ok(())
}

#[cfg(feature = "dora")]
fn run_dora(node: &mut EmulatedCameraNode) -> Result<()> {
    let mut io = rover_camera::DoraIo::init_from_env()?;
    node.run(&mut io)?;
    Ok(())
}

#[cfg(not(feature = "dora"))]
fn run_dora(_node: &mut EmulatedCameraNode) -> Result<()> {
    Err(anyhow::anyhow!(
        "dora runtime support requires the dora feature (use --io stdio)"
    ))
}
