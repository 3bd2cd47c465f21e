//! Plain-text rendering of aggregated views.

use std::fmt::Write as _;

use evms_core::{AggregatedView, CaseGroups, EvidenceRecord, SkippedEntry};

/// Line printed when a view has no records.
pub const EMPTY_MESSAGE: &str = "No evidence found.";

/// One block per record, in index order.
pub fn render_flat(view: &AggregatedView) -> String {
    if view.is_empty() {
        return format!("{EMPTY_MESSAGE}\n");
    }
    let mut out = String::new();
    for (i, item) in view.records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "Evidence ID: {}", item.record.evidence_id);
        let _ = writeln!(out, "Case Number: {}", item.record.case_number);
        write_details(&mut out, &item.record, "");
    }
    out
}

/// One section per case, in first-seen order; records indented below.
pub fn render_grouped(groups: &CaseGroups) -> String {
    if groups.is_empty() {
        return format!("{EMPTY_MESSAGE}\n");
    }
    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "Case Number: {}", group.case_number);
        for item in &group.records {
            let _ = writeln!(out, "  Evidence ID: {}", item.record.evidence_id);
            write_details(&mut out, &item.record, "    ");
        }
    }
    out
}

fn write_details(out: &mut String, record: &EvidenceRecord, indent: &str) {
    let _ = writeln!(out, "{indent}FIR Number: {}", record.fir_number);
    let _ = writeln!(out, "{indent}IPFS Hash: {}", record.content_hash_text());
    let _ = writeln!(out, "{indent}Date: {}", format_date(record));
    let _ = writeln!(
        out,
        "{indent}Location: {}, {}",
        record.latitude, record.longitude
    );
    let _ = writeln!(
        out,
        "{indent}Status: {}",
        if record.access_enabled {
            "Accessible"
        } else {
            "Restricted"
        }
    );
}

/// Submission time as UTC when it is an epoch-millisecond value, else the
/// raw text.
fn format_date(record: &EvidenceRecord) -> String {
    match record.submitted_at_utc() {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => record.submitted_at.clone(),
    }
}

/// Diagnostic line for excluded entries, if there are any.
pub fn render_skipped(skipped: &[SkippedEntry]) -> Option<String> {
    if skipped.is_empty() {
        return None;
    }
    let entries: Vec<String> = skipped
        .iter()
        .map(|s| format!("{} ({})", s.index, s.reason))
        .collect();
    Some(format!(
        "Skipped {} {}: {}",
        skipped.len(),
        if skipped.len() == 1 { "entry" } else { "entries" },
        entries.join(", ")
    ))
}
