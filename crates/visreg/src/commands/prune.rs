use std::collections::BTreeSet;
use std::io::Write;

use anyhow::Result;

use crate::source::ScreenshotSource;
use crate::store::{self, Store};

/// `visreg prune` — find and delete references with no matching capture.
pub fn prune(
    source: &dyn ScreenshotSource,
    store: &Store,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let capture_ids: BTreeSet<String> = source
        .list()?
        .into_iter()
        .map(|c| store::canonical_id(&c.id))
        .collect();
    let reference_ids = store.list_reference_ids();

    let orphans: Vec<&String> = reference_ids.difference(&capture_ids).collect();

    if orphans.is_empty() {
        println!("No orphaned references found.");
        return Ok(());
    }

    println!("Orphaned references ({}):", orphans.len());
    for id in &orphans {
        println!("  {id}");
    }
    println!();

    if dry_run {
        println!("Dry run — no files deleted.");
        return Ok(());
    }

    if !yes {
        print!("Delete {} reference(s)? [y/N] ", orphans.len());
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    for id in &orphans {
        store.remove_reference(id);
    }
    println!("Deleted {} orphaned reference(s).", orphans.len());

    Ok(())
}
