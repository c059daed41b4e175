use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

/// Viewport dimensions a capture was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One captured screenshot as the source hands it over: a snapshot id and
/// where its bytes live.
#[derive(Debug, Clone)]
pub struct Capture {
    pub id: String,
    pub path: PathBuf,
}

impl Capture {
    /// Viewport parsed from the `---WxH` id suffix, the same convention
    /// reference files are keyed by. Ids without the suffix have no
    /// declared viewport.
    pub fn viewport(&self) -> Option<Viewport> {
        let (_, size) = self.id.rsplit_once("---")?;
        let (w, h) = size.split_once('x')?;
        Some(Viewport {
            width: w.parse().ok()?,
            height: h.parse().ok()?,
        })
    }
}

/// Capability interface to whatever produces screenshots. The engine never
/// looks a driver up by name; an implementation is constructed explicitly
/// and injected.
pub trait ScreenshotSource {
    /// All available captures, in stable (sorted) order.
    fn list(&self) -> Result<Vec<Capture>>;

    /// The PNG bytes for one capture.
    fn read(&self, capture: &Capture) -> Result<Vec<u8>>;
}

/// Filesystem source: a directory of pre-captured `<id>.png` files.
/// Subdirectories become part of the snapshot id, so a tree like
/// `checkout/cart---1366x768.png` keys the same way nested suites always
/// have.
pub struct CaptureDir {
    dir: PathBuf,
    full_screenshots: bool,
}

impl CaptureDir {
    pub fn new(dir: impl Into<PathBuf>, full_screenshots: bool) -> Self {
        Self {
            dir: dir.into(),
            full_screenshots,
        }
    }
}

impl ScreenshotSource for CaptureDir {
    fn list(&self) -> Result<Vec<Capture>> {
        if !self.dir.is_dir() {
            anyhow::bail!(
                "Capture directory {} does not exist",
                self.dir.display()
            );
        }
        if !self.full_screenshots {
            debug!(
                dir = %self.dir.display(),
                "captures expected viewport-relative (full_screenshots = false)"
            );
        }

        let pattern = self.dir.join("**").join("*.png");
        let pattern = pattern
            .to_str()
            .with_context(|| format!("Capture directory {} is not UTF-8", self.dir.display()))?;

        let mut captures = Vec::new();
        for entry in glob::glob(pattern).context("Invalid capture glob pattern")? {
            let path = entry.context("Failed to read capture directory entry")?;
            if let Some(id) = capture_id(&self.dir, &path) {
                captures.push(Capture { id, path });
            }
        }
        captures.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(captures)
    }

    fn read(&self, capture: &Capture) -> Result<Vec<u8>> {
        std::fs::read(&capture.path)
            .with_context(|| format!("Failed to read {}", capture.path.display()))
    }
}

/// Relative path with the `.png` extension stripped, `/`-separated on
/// every platform.
fn capture_id(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let stem = rel.with_extension("");
    let parts: Vec<String> = stem
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
