use anyhow::{Result, bail};

use crate::store::{BASE_DIR, Store};

use super::matches_filter;

/// `visreg approve` — promote the latest run's failing candidates to
/// references. New snapshots need no approval: their first capture already
/// seeded the reference.
pub fn approve(filter: Option<&str>) -> Result<()> {
    let Some(store) = Store::latest_run(BASE_DIR) else {
        println!("Nothing to approve — no fail artifacts found.");
        return Ok(());
    };

    let ids: Vec<String> = store
        .list_current_ids()
        .into_iter()
        .filter(|id| {
            // Strip a pasted .png suffix — names may come from the fail dir.
            let pattern = filter.map(|p| p.strip_suffix(".png").unwrap_or(p));
            matches_filter(id, pattern)
        })
        .collect();

    if ids.is_empty() {
        println!("No snapshots matched the given filter.");
        return Ok(());
    }

    let mut approved = 0usize;
    for id in &ids {
        match store.read_current(id) {
            Some(png) => {
                // Candidates without a diff image came from errored
                // comparisons; flag them so nobody approves one blindly.
                let label = if store.has_difference(id) {
                    "\x1b[31mFAIL\x1b[0m"
                } else {
                    "\x1b[31m ERR\x1b[0m"
                };
                store.write_reference(id, &png)?;
                println!("  Approved  {label}  {id}");
                approved += 1;
            }
            None => bail!("Could not read fail/{}/current/{id}.png", store.run_id()),
        }
    }

    println!();
    println!("{approved} snapshot(s) approved from run {}.", store.run_id());

    Ok(())
}
