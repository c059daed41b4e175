use std::time::Instant;

use anyhow::Result;
use tracing::debug;

use crate::report::terminal;
use crate::source::ScreenshotSource;
use crate::store::Store;

use super::matches_filter;

/// `visreg update` — save captures as reference snapshots unconditionally.
pub fn update(source: &dyn ScreenshotSource, store: &Store, filter: Option<&str>) -> Result<()> {
    let captures: Vec<_> = source
        .list()?
        .into_iter()
        .filter(|c| matches_filter(&c.id, filter))
        .collect();
    if captures.is_empty() {
        println!("No captures matched.");
        return Ok(());
    }

    let run_start = Instant::now();
    let mut saved = 0usize;
    let mut errored = 0usize;

    debug!(total = captures.len(), "updating references");
    for capture in &captures {
        match source.read(capture) {
            Ok(png) => {
                let verb = if store.has_reference(&capture.id) {
                    "Updated"
                } else {
                    "Created"
                };
                store.write_reference(&capture.id, &png)?;
                println!("  {verb}  {}", capture.id);
                saved += 1;
            }
            Err(e) => {
                terminal::print_error_line(&capture.id, &format!("{e:#}"));
                errored += 1;
            }
        }
    }

    println!();
    println!("{saved} reference snapshot(s) saved.");
    if errored > 0 {
        println!("{errored} capture(s) could not be read.");
    }
    println!("Time: {}", terminal::format_duration(run_start.elapsed()));

    Ok(())
}
