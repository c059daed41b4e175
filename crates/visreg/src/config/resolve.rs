use std::path::PathBuf;

use anyhow::{Context, Result};

use super::{load, validate_max_difference};
use crate::compare::DiffOptions;
use crate::compare::render::{OverlayColors, parse_color};

/// Values extracted from the CLI that participate in the merge.
pub struct CliOverrides {
    pub captures: Option<PathBuf>,
    pub max_difference: Option<f64>,
    /// CLI flags can only switch repositioning on, never off.
    pub reposition: bool,
}

/// Fully resolved config after CLI > env > file > defaults merge.
pub struct ResolvedRunConfig {
    pub capture_dir: PathBuf,
    pub full_screenshots: bool,
    pub max_difference: f64,
    pub reposition: bool,
    pub automatic_cleanup: bool,
    pub colors: OverlayColors,
}

impl ResolvedRunConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        // 1. File layer
        let file_config = load().context("Run `visreg init` first")?;

        // 2. Env layer
        let env_dir = std::env::var("VISREG_CAPTURE_DIR").ok();
        let env_max: Option<f64> = std::env::var("VISREG_MAX_DIFFERENCE")
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("VISREG_MAX_DIFFERENCE must be a valid float")?;

        // 3. CLI > env > file (highest priority first)
        let capture_dir = cli
            .captures
            .or(env_dir.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(&file_config.capture.dir));

        let max_difference = cli
            .max_difference
            .or(env_max)
            .unwrap_or(file_config.diff.max_difference);
        validate_max_difference(max_difference).map_err(|e| anyhow::anyhow!("{e}"))?;

        let reposition = cli.reposition || file_config.diff.reposition_image;

        // Colors were validated with the file config; re-parse into pixels.
        let colors = OverlayColors {
            content: parse_color(&file_config.output.color_content)
                .map_err(|e| anyhow::anyhow!("{e}"))?,
            size: parse_color(&file_config.output.color_size)
                .map_err(|e| anyhow::anyhow!("{e}"))?,
        };

        Ok(Self {
            capture_dir,
            full_screenshots: file_config.capture.full_screenshots,
            max_difference,
            reposition,
            automatic_cleanup: file_config.output.automatic_cleanup,
            colors,
        })
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            max_difference: self.max_difference,
            reposition: self.reposition,
            colors: self.colors,
        }
    }
}
