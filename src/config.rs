use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DEVICE: &str = "stub://bench";
const DEFAULT_INTERVAL_MS: u64 = 30;
const DEFAULT_SNAPSHOT_EVERY: u64 = 30;

/// The two supported hardware generations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generation {
    V1,
    V2,
}

impl Generation {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Generation::V1),
            "v2" | "2" => Ok(Generation::V2),
            other => Err(anyhow!("unknown generation '{}'; expected v1 or v2", other)),
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::V1 => write!(f, "v1"),
            Generation::V2 => write!(f, "v2"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    generation: Option<String>,
    device: Option<String>,
    poll_interval_ms: Option<u64>,
    snapshot: Option<SnapshotConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SnapshotConfigFile {
    dir: Option<PathBuf>,
    every: Option<u64>,
}

/// Capture loop configuration.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub generation: Generation,
    pub device: String,
    pub poll_interval: Duration,
    pub snapshot_dir: Option<PathBuf>,
    /// Write snapshots every Nth refreshed frame.
    pub snapshot_every: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            generation: Generation::V1,
            device: DEFAULT_DEVICE.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            snapshot_dir: None,
            snapshot_every: DEFAULT_SNAPSHOT_EVERY,
        }
    }
}

impl CaptureConfig {
    /// Load from the TOML file named by `DEPTHCAM_CONFIG` (when set), then
    /// apply env-var overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DEPTHCAM_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => read_config_file(Path::new(path))?,
            None => CaptureConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CaptureConfigFile) -> Result<Self> {
        let generation = file
            .generation
            .as_deref()
            .map(Generation::parse)
            .transpose()?
            .unwrap_or(Generation::V1);
        let device = file.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string());
        let poll_interval =
            Duration::from_millis(file.poll_interval_ms.unwrap_or(DEFAULT_INTERVAL_MS));
        let snapshot_dir = file.snapshot.as_ref().and_then(|s| s.dir.clone());
        let snapshot_every = file
            .snapshot
            .as_ref()
            .and_then(|s| s.every)
            .unwrap_or(DEFAULT_SNAPSHOT_EVERY);
        Ok(Self {
            generation,
            device,
            poll_interval,
            snapshot_dir,
            snapshot_every,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("DEPTHCAM_GENERATION") {
            self.generation = Generation::parse(&value)?;
        }
        if let Ok(value) = std::env::var("DEPTHCAM_DEVICE") {
            self.device = value;
        }
        if let Ok(value) = std::env::var("DEPTHCAM_INTERVAL_MS") {
            let ms: u64 = value
                .parse()
                .with_context(|| format!("parse DEPTHCAM_INTERVAL_MS '{}'", value))?;
            self.poll_interval = Duration::from_millis(ms);
        }
        Ok(())
    }

    /// Sanity checks; also used by the viewer after CLI overrides.
    pub fn validate(&self) -> Result<()> {
        if self.device.trim().is_empty() {
            return Err(anyhow!("device selector must not be empty"));
        }
        if self.poll_interval.is_zero() {
            return Err(anyhow!("poll interval must be nonzero"));
        }
        if self.snapshot_dir.is_some() && self.snapshot_every == 0 {
            return Err(anyhow!("snapshot.every must be nonzero when a snapshot dir is set"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CaptureConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))
}
