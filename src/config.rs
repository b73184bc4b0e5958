use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::capture::{CaptureSettings, DeviceSpec, DEFAULT_DEVICE};
use crate::node::emulator::DEFAULT_LABEL;
use crate::node::{CameraSettings, EmulatorSettings, DEFAULT_OUTPUT_ID};

pub const CONFIG_ENV: &str = "CAMERA_NODE_CONFIG";

const DEFAULT_CAMERA_WIDTH: u32 = 320;
const DEFAULT_CAMERA_HEIGHT: u32 = 240;
const DEFAULT_EMULATOR_WIDTH: u32 = 500;
const DEFAULT_EMULATOR_HEIGHT: u32 = 350;
const DEFAULT_STATS_INTERVAL_SECS: u64 = 0;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct NodeConfigFile {
    output_id: Option<String>,
    stats_interval_secs: Option<u64>,
    camera: Option<CameraConfigFile>,
    emulator: Option<EmulatorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct EmulatorConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    label: Option<String>,
}

/// Startup configuration shared by both node binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub output_id: String,
    /// Interval between periodic stats log lines; `None` disables them.
    pub stats_interval: Option<Duration>,
    pub camera: CameraConfig,
    pub emulator: EmulatorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    pub width: u32,
    pub height: u32,
    pub label: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_file(NodeConfigFile::default())
    }
}

impl NodeConfig {
    /// Defaults, then the JSON file at `path` (or `$CAMERA_NODE_CONFIG`), then
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        let file_cfg = match (path, env_path.as_deref()) {
            (Some(path), _) => read_config_file(path)?,
            (None, Some(path)) => read_config_file(Path::new(path))?,
            (None, None) => NodeConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: NodeConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        let emulator = file.emulator.unwrap_or_default();
        let stats_secs = file
            .stats_interval_secs
            .unwrap_or(DEFAULT_STATS_INTERVAL_SECS);
        Self {
            output_id: file
                .output_id
                .unwrap_or_else(|| DEFAULT_OUTPUT_ID.to_string()),
            stats_interval: stats_interval(stats_secs),
            camera: CameraConfig {
                device: camera.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
                width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
            },
            emulator: EmulatorConfig {
                width: emulator.width.unwrap_or(DEFAULT_EMULATOR_WIDTH),
                height: emulator.height.unwrap_or(DEFAULT_EMULATOR_HEIGHT),
                label: emulator.label.unwrap_or_else(|| DEFAULT_LABEL.to_string()),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(device) = env_string("CAMERA_DEVICE") {
            self.camera.device = device;
        }
        if let Some(output_id) = env_string("CAMERA_OUTPUT_ID") {
            self.output_id = output_id;
        }
        if let Some(width) = env_parse::<u32>("CAMERA_WIDTH")? {
            self.camera.width = width;
        }
        if let Some(height) = env_parse::<u32>("CAMERA_HEIGHT")? {
            self.camera.height = height;
        }
        if let Some(secs) = env_parse::<u64>("CAMERA_STATS_INTERVAL_SECS")? {
            self.stats_interval = stats_interval(secs);
        }
        if let Some(width) = env_parse::<u32>("EMULATOR_WIDTH")? {
            self.emulator.width = width;
        }
        if let Some(height) = env_parse::<u32>("EMULATOR_HEIGHT")? {
            self.emulator.height = height;
        }
        if let Ok(label) = std::env::var("EMULATOR_LABEL") {
            self.emulator.label = label;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.output_id.trim().is_empty() {
            return Err(anyhow!("output_id must not be empty"));
        }
        DeviceSpec::parse(&self.camera.device)?;
        for (name, width, height) in [
            ("camera", self.camera.width, self.camera.height),
            ("emulator", self.emulator.width, self.emulator.height),
        ] {
            if width == 0 || height == 0 {
                return Err(anyhow!(
                    "{} resolution must be non-zero, got {}x{}",
                    name,
                    width,
                    height
                ));
            }
            crate::frame::byte_len(width, height)?;
        }
        Ok(())
    }

    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            device: self.camera.device.clone(),
            width: self.camera.width,
            height: self.camera.height,
        }
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            output_id: self.output_id.clone(),
            width: self.camera.width,
            height: self.camera.height,
            stats_interval: self.stats_interval,
        }
    }

    pub fn emulator_settings(&self) -> EmulatorSettings {
        EmulatorSettings {
            output_id: self.output_id.clone(),
            width: self.emulator.width,
            height: self.emulator.height,
            label: self.emulator.label.clone(),
            stats_interval: self.stats_interval,
            ..EmulatorSettings::default()
        }
    }
}

fn read_config_file(path: &Path) -> Result<NodeConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn stats_interval(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be an integer, got {:?}", key, value)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_node_geometry() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.output_id, "image");
        assert_eq!(cfg.stats_interval, None);
        assert_eq!(cfg.camera.device, "0");
        assert_eq!((cfg.camera.width, cfg.camera.height), (320, 240));
        assert_eq!((cfg.emulator.width, cfg.emulator.height), (500, 350));
        assert_eq!(cfg.emulator.label, "Emulated camera");
    }

    #[test]
    fn emulator_settings_keep_label_style() {
        let settings = NodeConfig::default().emulator_settings();
        assert_eq!(settings.style, EmulatorSettings::default().style);
    }

    #[test]
    fn validate_rejects_zero_resolution() {
        let mut cfg = NodeConfig::default();
        cfg.camera.width = 0;
        assert!(cfg.validate().is_err());
    }
}
