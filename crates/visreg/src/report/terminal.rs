use std::time::Duration;

use crate::compare::CheckStatus;

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Print a single snapshot result line.
pub fn print_line(name: &str, status: &CheckStatus, elapsed: Duration) {
    let time_suffix = format!("  \x1b[2m{}\x1b[0m", format_duration(elapsed));

    match status {
        CheckStatus::Pass { percentage } => {
            if *percentage > 0.0 {
                println!("  \x1b[32mPASS\x1b[0m  {name}  ({percentage}%){time_suffix}");
            } else {
                println!("  \x1b[32mPASS\x1b[0m  {name}{time_suffix}");
            }
        }
        CheckStatus::Fail {
            percentage,
            regions,
            dimension_mismatch,
        } => {
            if let Some((rw, rh, cw, ch)) = dimension_mismatch {
                println!(
                    "  \x1b[31mFAIL\x1b[0m  {name}  ({percentage}%, dimensions {rw}x{rh} -> {cw}x{ch}){time_suffix}"
                );
            } else {
                println!(
                    "  \x1b[31mFAIL\x1b[0m  {name}  ({percentage}%, {regions} region(s)){time_suffix}"
                );
            }
        }
        CheckStatus::New => {
            println!("  \x1b[33m NEW\x1b[0m  {name}  (reference created){time_suffix}");
        }
        CheckStatus::Error(msg) => {
            println!("  \x1b[31m ERR\x1b[0m  {name}  ({msg}){time_suffix}");
        }
    }
}

/// Print an error line (no timing available).
pub fn print_error_line(name: &str, msg: &str) {
    println!("  \x1b[31m ERR\x1b[0m  {name}  ({msg})");
}

/// Print a line for a reference with no matching capture.
pub fn print_removed_line(name: &str) {
    println!("  \x1b[2mGONE\x1b[0m  \x1b[2m{name}  (no matching capture)\x1b[0m");
}

/// Print an actionable summary listing snapshot names grouped by status.
/// Only prints sections with at least one entry.
pub fn print_actionable_summary(
    failed: &[String],
    new: &[String],
    errored: &[String],
    removed: &[String],
) {
    if failed.is_empty() && new.is_empty() && errored.is_empty() && removed.is_empty() {
        return;
    }

    println!();
    println!("Actionable snapshots:");

    for (label, names) in [
        ("Failed", failed),
        ("New", new),
        ("Errored", errored),
        ("Removed", removed),
    ] {
        if !names.is_empty() {
            println!();
            println!("  {label} ({}):", names.len());
            for name in names {
                println!("    {name}");
            }
        }
    }
}

/// Print the final summary.
pub fn print_summary(
    total: usize,
    passed: usize,
    failed: usize,
    new: usize,
    errored: usize,
    removed: usize,
    elapsed: Duration,
) {
    println!();
    print!(
        "Snapshots:  {total} total, \x1b[32m{passed} passed\x1b[0m, \x1b[31m{failed} failed\x1b[0m, \x1b[33m{new} new\x1b[0m"
    );
    if errored > 0 {
        print!(", \x1b[31m{errored} errored\x1b[0m");
    }
    if removed > 0 {
        print!(", \x1b[2m{removed} removed\x1b[0m");
    }
    println!();
    println!("Time:       {}", format_duration(elapsed));

    if failed > 0 || new > 0 || errored > 0 || removed > 0 {
        println!();
        if failed > 0 {
            println!("{failed} snapshot(s) have visual differences.");
        }
        if new > 0 {
            println!("{new} snapshot(s) had no reference; the capture was stored as one.");
        }
        if errored > 0 {
            println!("{errored} snapshot(s) could not be compared.");
        }
        if removed > 0 {
            println!(
                "{removed} reference(s) no longer match any capture. Run `visreg prune` to delete."
            );
        }
        if failed > 0 {
            println!("Run `visreg approve` to accept, or fix and re-capture.");
        }
    }
}
