use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

pub const BASE_DIR: &str = ".visreg";
const REFERENCE_DIR: &str = "reference";
const FAIL_DIR: &str = "fail";
const CURRENT_DIR: &str = "current";
const DIFFERENCE_DIR: &str = "difference";
const REPORT_FILE: &str = "report.json";

/// Identity of one process run. Created once at startup and passed to
/// whatever needs to namespace its output; nothing here is process-global.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
}

impl RunContext {
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            run_id: secs.to_string(),
        }
    }

    pub fn with_id(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip everything but `[A-Za-z0-9._-]` and turn spaces into underscores,
/// the same way reference filenames have always been written.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect()
}

/// Canonical form of an id: what the listing functions report after the
/// path components have been sanitized.
pub fn canonical_id(id: &str) -> String {
    id.split('/')
        .map(sanitize_component)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Sanitized relative path for an id, with `.png` appended to the final
/// component (not `with_extension`, which would eat anything after a dot
/// already in the id).
fn sanitized_rel_png(id: &str) -> PathBuf {
    let parts: Vec<String> = id
        .split('/')
        .map(sanitize_component)
        .filter(|p| !p.is_empty())
        .collect();
    let mut rel = PathBuf::new();
    for (i, part) in parts.iter().enumerate() {
        if i + 1 == parts.len() {
            rel.push(format!("{part}.png"));
        } else {
            rel.push(part);
        }
    }
    rel
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Reference store and artifact sink rooted at `.visreg/`.
///
/// References are shared across runs; fail artifacts (candidate copy, diff
/// image, JSON summary) live under `fail/<run_id>/` so a run never
/// clobbers another run's evidence.
pub struct Store {
    root: PathBuf,
    run_id: String,
}

impl Store {
    pub fn open(root: impl Into<PathBuf>, run: &RunContext) -> Self {
        Self {
            root: root.into(),
            run_id: run.run_id().to_owned(),
        }
    }

    /// Bind to the most recent existing run under `fail/`, if any.
    /// Run ids are epoch seconds, so lexicographic order is enough.
    pub fn latest_run(root: impl Into<PathBuf>) -> Option<Self> {
        let root = root.into();
        let fail_root = root.join(FAIL_DIR);
        let entries = std::fs::read_dir(&fail_root).ok()?;
        let run_id = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .max()?;
        Some(Self { root, run_id })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    fn reference_path(&self, id: &str) -> PathBuf {
        self.root
            .join(REFERENCE_DIR)
            .join(sanitized_rel_png(id))
    }

    fn run_dir(&self) -> PathBuf {
        self.root.join(FAIL_DIR).join(&self.run_id)
    }

    fn current_path(&self, id: &str) -> PathBuf {
        self.run_dir()
            .join(CURRENT_DIR)
            .join(sanitized_rel_png(id))
    }

    fn difference_path(&self, id: &str) -> PathBuf {
        self.run_dir()
            .join(DIFFERENCE_DIR)
            .join(sanitized_rel_png(id))
    }

    pub fn has_reference(&self, id: &str) -> bool {
        self.reference_path(id).exists()
    }

    pub fn read_reference(&self, id: &str) -> Option<Vec<u8>> {
        std::fs::read(self.reference_path(id)).ok()
    }

    pub fn write_reference(&self, id: &str, png: &[u8]) -> Result<()> {
        let path = self.reference_path(id);
        ensure_parent(&path)?;
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        // Stale fail artifacts for this id are no longer evidence.
        let _ = std::fs::remove_file(self.current_path(id));
        let _ = std::fs::remove_file(self.difference_path(id));
        Ok(())
    }

    pub fn write_current(&self, id: &str, png: &[u8]) -> Result<()> {
        let path = self.current_path(id);
        ensure_parent(&path)?;
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn write_difference(&self, id: &str, png: &[u8]) -> Result<()> {
        let path = self.difference_path(id);
        ensure_parent(&path)?;
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn write_report(&self, json: &[u8]) -> Result<PathBuf> {
        let path = self.run_dir().join(REPORT_FILE);
        ensure_parent(&path)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn read_current(&self, id: &str) -> Option<Vec<u8>> {
        std::fs::read(self.current_path(id)).ok()
    }

    pub fn has_difference(&self, id: &str) -> bool {
        self.difference_path(id).exists()
    }

    pub fn list_reference_ids(&self) -> BTreeSet<String> {
        let dir = self.root.join(REFERENCE_DIR);
        let mut ids = BTreeSet::new();
        collect_png_ids(&dir, &dir, &mut ids);
        ids
    }

    pub fn list_current_ids(&self) -> BTreeSet<String> {
        let dir = self.run_dir().join(CURRENT_DIR);
        let mut ids = BTreeSet::new();
        collect_png_ids(&dir, &dir, &mut ids);
        ids
    }

    /// Delete a reference PNG and any directories it leaves empty.
    pub fn remove_reference(&self, id: &str) {
        let path = self.reference_path(id);
        let _ = std::fs::remove_file(&path);
        let reference_root = self.root.join(REFERENCE_DIR);
        let mut dir = path.parent();
        while let Some(d) = dir {
            if d == reference_root {
                break;
            }
            if std::fs::read_dir(d).map_or(true, |mut e| e.next().is_none()) {
                let _ = std::fs::remove_dir(d);
                dir = d.parent();
            } else {
                break;
            }
        }
    }

    /// Drop every previous run's fail artifacts (automatic cleanup).
    pub fn clear_failed_runs(&self) -> Result<()> {
        let fail_root = self.root.join(FAIL_DIR);
        if fail_root.exists() {
            std::fs::remove_dir_all(&fail_root)
                .with_context(|| format!("Failed to clean {}", fail_root.display()))?;
        }
        Ok(())
    }
}

/// Recursively collect `.png` files as ids (relative path, extension
/// stripped).
fn collect_png_ids(base: &Path, dir: &Path, ids: &mut BTreeSet<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_png_ids(base, &path, ids);
        } else if path.extension().is_some_and(|e| e == "png")
            && let Ok(rel) = path.strip_prefix(base)
        {
            let id = rel.with_extension("");
            ids.insert(id.to_string_lossy().into_owned());
        }
    }
}
