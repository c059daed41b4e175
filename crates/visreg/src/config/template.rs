use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, CONFIG_FILE};

/// Hand-crafted config template with commented-out keys, so that users can
/// see the available knobs without uncommenting section headers.
const CONFIG_TEMPLATE: &str = r#"[capture]
dir = "{captures}"
# full_screenshots = true            # captures use page-absolute coordinates

# ─────────────────────────────────────────────────────────
# Comparison — all fields optional.
# ─────────────────────────────────────────────────────────
[diff]
# max_difference = 0.01              # failure threshold in percent
# reposition_image = false           # search for the best alignment offset

# ─────────────────────────────────────────────────────────
# Fail artifacts — all fields optional.
# ─────────────────────────────────────────────────────────
[output]
# automatic_cleanup = true           # purge old fail artifacts on each run
# color_content = "EE0000C7"         # overlay for changed pixels, RRGGBBAA
# color_size = "88888866"            # overlay for canvas size mismatch
"#;

pub(super) fn rendered_template(captures: &str) -> String {
    CONFIG_TEMPLATE.replace("{captures}", captures)
}

pub fn config_file_exists() -> bool {
    Path::new(CONFIG_DIR).join(CONFIG_FILE).exists()
}

pub fn write_gitignore(force: bool) -> Result<()> {
    let path = Path::new(CONFIG_DIR).join(".gitignore");
    if !force && path.exists() {
        return Ok(());
    }
    std::fs::write(&path, "fail/\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the hand-crafted config template (with commented-out sections).
pub fn write_template(captures: &str) -> Result<()> {
    let dir = Path::new(CONFIG_DIR);
    std::fs::create_dir_all(dir).context("Failed to create .visreg directory")?;
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, rendered_template(captures))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
