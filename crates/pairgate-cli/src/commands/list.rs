//! List command implementation.

use std::path::Path;

use pairgate_core::{CurveHandle, TokenHandle};
use pairgate_journal::{
    replay_pairs, AndFilter, CurveFilter, EventFilter, ReadMode, TokenFilter,
};

use crate::output;

pub fn run(
    journal: &Path,
    token: Option<u64>,
    curve: Option<u64>,
    permissive: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut filters: Vec<Box<dyn EventFilter>> = Vec::new();
    if let Some(index) = token {
        filters.push(Box::new(TokenFilter(TokenHandle::new(index))));
    }
    if let Some(index) = curve {
        filters.push(Box::new(CurveFilter(CurveHandle::new(index))));
    }

    let mode = if permissive {
        ReadMode::Permissive
    } else {
        ReadMode::Strict
    };
    let events = replay_pairs(journal, mode, AndFilter { filters })
        .map_err(|e| format!("Failed to read journal {}: {}", journal.display(), e))?;

    if json {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
    } else {
        output::print_event_header();
        for event in &events {
            println!("{}", output::format_event_row(event));
        }
    }
    Ok(())
}
