use anyhow::{Result, bail};

use crate::config;

/// `visreg init` — create .visreg/config.toml.
pub fn init(captures: &str, force: bool) -> Result<()> {
    if !force && config::config_file_exists() {
        bail!(".visreg/config.toml already exists (use --force to overwrite)");
    }

    config::write_template(captures)?;
    config::write_gitignore(force)?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} .visreg/config.toml");
    println!("  capture.dir = {captures}");
    Ok(())
}
