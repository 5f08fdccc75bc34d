//! Verify command implementation.

use std::path::Path;

use pairgate_journal::{verify_journal, ReadMode};

use crate::output;

pub fn run(
    journal: &Path,
    strict: bool,
    permissive: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if permissive {
        ReadMode::Permissive
    } else {
        ReadMode::Strict
    };
    let report = verify_journal(journal, mode)
        .map_err(|e| format!("Failed to verify journal {}: {}", journal.display(), e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.records)?);
    } else {
        output::print_verdict_header();
        for record in &report.records {
            println!("{}", output::format_verdict_row(record));
        }
    }

    if strict && !report.all_ok() {
        return Err(format!("{} record(s) failed verification", report.failures().count()).into());
    }
    Ok(())
}
