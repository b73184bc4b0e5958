//! Node I/O backends.
//!
//! - `stdio`: JSON-lines events in, digest records out (always available)
//! - `dora`: the dora-rs dataflow runtime (feature: dora)

#[cfg(feature = "dora")]
pub mod dora;
pub mod stdio;

#[cfg(feature = "dora")]
pub use self::dora::DoraIo;
pub use stdio::{OutputRecord, StdioNode};

use anyhow::{anyhow, Context, Result};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Which runtime a node binary attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoMode {
    Dora,
    Stdio,
}

impl IoMode {
    /// `dora` when compiled in, `stdio` otherwise.
    pub fn default_mode() -> Self {
        if cfg!(feature = "dora") {
            Self::Dora
        } else {
            Self::Stdio
        }
    }
}

impl FromStr for IoMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "dora" => Ok(Self::Dora),
            "stdio" => Ok(Self::Stdio),
            other => Err(anyhow!("unknown io mode `{}` (expected dora or stdio)", other)),
        }
    }
}

/// Install a Ctrl-C handler and return the flag it sets.
pub fn install_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("error setting Ctrl-C handler")?;
    Ok(flag)
}
