pub mod resolve;
pub mod template;

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::compare::render::parse_color;

pub use self::resolve::{CliOverrides, ResolvedRunConfig};
pub use self::template::{config_file_exists, write_gitignore, write_template};

pub(crate) const CONFIG_DIR: &str = ".visreg";
const CONFIG_FILE: &str = "config.toml";

pub fn validate_max_difference(v: f64) -> Result<f64, String> {
    if !(0.0..=100.0).contains(&v) {
        return Err(format!(
            "max_difference must be between 0.0 and 100.0 percent, got {v}"
        ));
    }
    Ok(v)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Directory the screenshot source reads pre-captured PNGs from.
    pub dir: String,
    /// Whether captures use page-absolute coordinates (`true`) or are
    /// relative to the viewport. Surfaced to the capture collaborator.
    pub full_screenshots: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            dir: "captures".to_string(),
            full_screenshots: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Maximum allowed composite difference in percent.
    pub max_difference: f64,
    /// Search for the best alignment offset before differencing.
    pub reposition_image: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            max_difference: 0.01,
            reposition_image: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Purge previous runs' fail artifacts when a check run starts.
    pub automatic_cleanup: bool,
    /// Overlay color for content difference regions, RRGGBBAA hex.
    pub color_content: String,
    /// Overlay color for size mismatch regions, RRGGBBAA hex.
    pub color_size: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            automatic_cleanup: true,
            color_content: "EE0000C7".to_string(),
            color_size: "88888866".to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureSettings,
    pub diff: DiffSettings,
    pub output: OutputSettings,
}

impl Config {
    /// Validate semantic constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        if self.capture.dir.is_empty() {
            bail!("capture.dir must not be empty");
        }
        validate_max_difference(self.diff.max_difference)
            .map_err(|e| anyhow::anyhow!("diff.{e}"))?;
        parse_color(&self.output.color_content)
            .map_err(|e| anyhow::anyhow!("output.color_content: {e}"))?;
        parse_color(&self.output.color_size)
            .map_err(|e| anyhow::anyhow!("output.color_size: {e}"))?;
        Ok(())
    }
}

fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    config.validate()?;
    Ok(config)
}

pub fn load() -> Result<Config> {
    let path = Path::new(CONFIG_DIR).join(CONFIG_FILE);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content).with_context(|| format!("Invalid {}", path.display()))
}
