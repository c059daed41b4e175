use std::collections::BTreeSet;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::compare::{self, CheckStatus, Verdict, raster};
use crate::config::ResolvedRunConfig;
use crate::report::{json, terminal};
use crate::source::{Capture, ScreenshotSource};
use crate::store::{self, Store};

use super::matches_filter;

/// `visreg check` — list captures, compare, report.
/// Returns exit code: 0 = all pass (new references included), 1 = any
/// fail or error.
pub fn check(
    config: &ResolvedRunConfig,
    source: &dyn ScreenshotSource,
    store: &Store,
    filter: Option<&str>,
) -> Result<i32> {
    let captures: Vec<Capture> = source
        .list()?
        .into_iter()
        .filter(|c| matches_filter(&c.id, filter))
        .collect();
    if captures.is_empty() {
        println!("No captures matched.");
        return Ok(0);
    }

    // Previous runs' fail artifacts are stale once a new run starts.
    if config.automatic_cleanup {
        store.clear_failed_runs()?;
    }

    let opts = config.diff_options();
    let run_start = Instant::now();
    let total = captures.len();

    let mut passed = 0usize;
    let mut failed = 0usize;
    let mut new = 0usize;
    let mut errored = 0usize;

    let mut failed_names: Vec<String> = Vec::new();
    let mut new_names: Vec<String> = Vec::new();
    let mut errored_names: Vec<String> = Vec::new();
    let mut entries: Vec<json::SnapshotEntry> = Vec::new();

    debug!(total, "comparing captures");
    for capture in &captures {
        let step_start = Instant::now();
        let status = check_one(capture, source, store, &opts)?;

        match &status {
            CheckStatus::Pass { .. } => passed += 1,
            CheckStatus::Fail { .. } => {
                failed += 1;
                failed_names.push(capture.id.clone());
            }
            CheckStatus::New => {
                new += 1;
                new_names.push(capture.id.clone());
            }
            CheckStatus::Error(_) => {
                errored += 1;
                errored_names.push(capture.id.clone());
            }
        }

        terminal::print_line(&capture.id, &status, step_start.elapsed());
        entries.push(json::SnapshotEntry::new(
            capture.id.clone(),
            &status,
            capture.viewport().map(|v| v.to_string()),
        ));
    }

    // References with no matching capture: surfaced on full runs only,
    // where the capture list is authoritative.
    let mut removed_names: Vec<String> = Vec::new();
    if filter.is_none() {
        let capture_ids: BTreeSet<String> = captures
            .iter()
            .map(|c| store::canonical_id(&c.id))
            .collect();
        for id in store.list_reference_ids().difference(&capture_ids) {
            terminal::print_removed_line(id);
            removed_names.push(id.clone());
        }
    }

    if failed > 0 || new > 0 || errored > 0 {
        let report = json::RunReport {
            run_id: store.run_id(),
            total,
            passed,
            failed,
            new,
            errored,
            snapshots: entries,
        };
        let path = store.write_report(&json::render(&report)?)?;
        debug!(path = %path.display(), "wrote run report");
    }

    terminal::print_actionable_summary(&failed_names, &new_names, &errored_names, &removed_names);
    terminal::print_summary(
        total,
        passed,
        failed,
        new,
        errored,
        removed_names.len(),
        run_start.elapsed(),
    );

    // New references are informational; removed ones never gate either.
    if failed > 0 || errored > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn check_one(
    capture: &Capture,
    source: &dyn ScreenshotSource,
    store: &Store,
    opts: &compare::DiffOptions,
) -> Result<CheckStatus> {
    let candidate = match source.read(capture) {
        Ok(bytes) => bytes,
        Err(e) => return Ok(CheckStatus::Error(format!("{e:#}"))),
    };

    let Some(reference) = store.read_reference(&capture.id) else {
        info!(id = %capture.id, "no reference yet, storing capture as one");
        store.write_reference(&capture.id, &candidate)?;
        return Ok(CheckStatus::New);
    };

    let result = match compare::compare(&reference, &candidate, opts) {
        Ok(result) => result,
        Err(e) => {
            store.write_current(&capture.id, &candidate)?;
            return Ok(CheckStatus::Error(format!("{e:#}")));
        }
    };

    if result.composite > 0.0 {
        info!(
            id = %capture.id,
            percentage = result.percentage(),
            "visual difference detected"
        );
    }

    match result.verdict {
        Verdict::Pass => Ok(CheckStatus::Pass {
            percentage: result.percentage(),
        }),
        Verdict::Fail => {
            debug!(
                id = %capture.id,
                dx = result.offset.dx,
                dy = result.offset.dy,
                regions = result.regions.len(),
                "writing fail artifacts"
            );
            store.write_current(&capture.id, &candidate)?;
            if let Some(diff_img) = &result.diff_image {
                let diff_png = raster::encode_png(diff_img).context("Failed to encode diff image")?;
                store.write_difference(&capture.id, &diff_png)?;
            }
            Ok(CheckStatus::Fail {
                percentage: result.percentage(),
                regions: result.regions.len(),
                dimension_mismatch: result.dimension_mismatch,
            })
        }
    }
}
