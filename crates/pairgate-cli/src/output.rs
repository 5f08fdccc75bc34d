//! Output formatting utilities.

use pairgate_core::PairProvisionedEvent;
use pairgate_journal::RecordReport;

/// Formats an event as a table row.
pub fn format_event_row(event: &PairProvisionedEvent) -> String {
    format!(
        "{:<44} {:<10} {:<10} {:<8} {:<20} {}",
        truncate(&event.event_id.b64, 44),
        event.token.to_string(),
        event.curve.to_string(),
        truncate(event.config.symbol(), 8),
        truncate(event.occurred_at.as_str(), 20),
        event.principal_id
    )
}

/// Prints the event table header.
#[allow(clippy::print_literal)]
pub fn print_event_header() {
    println!(
        "{:<44} {:<10} {:<10} {:<8} {:<20} {}",
        "EVENT_ID", "TOKEN", "CURVE", "SYMBOL", "OCCURRED_AT", "PRINCIPAL"
    );
    println!("{}", "-".repeat(110));
}

/// Formats a verification result as a table row.
pub fn format_verdict_row(record: &RecordReport) -> String {
    let event_id = record
        .event_id
        .as_ref()
        .map(|d| d.b64.as_str())
        .unwrap_or("?");
    let token = record
        .token
        .map(|t| t.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "{:<6} {:<44} {:<10} {}",
        record.index,
        truncate(event_id, 44),
        token,
        record.verdict
    )
}

/// Prints the verification table header.
#[allow(clippy::print_literal)]
pub fn print_verdict_header() {
    println!("{:<6} {:<44} {:<10} {}", "INDEX", "EVENT_ID", "TOKEN", "VERDICT");
    println!("{}", "-".repeat(80));
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
