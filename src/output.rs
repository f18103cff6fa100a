//! CLI output formatting for all pipeline stages.
//!
//! Each stage has a `format_*` function that returns display lines and a
//! `print_*` wrapper that writes them to stdout. Format functions are pure, so
//! tests assert on lines instead of capturing stdout.
//!
//! # Output Format
//!
//! ## Load
//!
//! ```text
//! Categories
//! 001 基础 (2 entries)
//!     001 什么是 GEO?
//!     002 GEO 和 SEO 有什么区别?
//! 002 进阶 (1 entry)
//!     001 如何让 AI 更容易引用我的内容?
//! ```
//!
//! ## Write
//!
//! ```text
//! index.html → docs/index.html (4210 bytes)
//! sitemap.xml → docs/sitemap.xml (251 bytes)
//! ```
//!
//! ## Publish / Notify
//!
//! ```text
//! Commit: committed
//! Pushed: origin
//! https://example.com/ → 200
//! https://example.com/faq.json → failed: HTTP 404 Not Found
//! ```

use crate::config::Grouping;
use crate::notify::{NotifyOutcome, NotifyReport};
use crate::publish::{CommitOutcome, PublishReport};
use crate::render::group_records;
use crate::types::Record;
use crate::write::WrittenFile;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn entries(n: usize) -> String {
    if n == 1 {
        "1 entry".to_string()
    } else {
        format!("{n} entries")
    }
}

// ============================================================================
// Load
// ============================================================================

/// Format the loaded content as a category inventory.
pub fn format_load_output(records: &[Record], grouping: Grouping) -> Vec<String> {
    let mut lines = vec!["Categories".to_string()];
    for (i, group) in group_records(records, grouping).iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            group.category,
            entries(group.records.len())
        ));
        for (j, record) in group.records.iter().enumerate() {
            lines.push(format!("    {} {}", format_index(j + 1), record.question));
        }
    }
    if records.is_empty() {
        lines.push("    (no entries)".to_string());
    }
    lines
}

pub fn print_load_output(records: &[Record], grouping: Grouping) {
    for line in format_load_output(records, grouping) {
        println!("{}", line);
    }
}

// ============================================================================
// Write
// ============================================================================

pub fn format_write_output(written: &[WrittenFile]) -> Vec<String> {
    written
        .iter()
        .map(|f| format!("{} → {} ({} bytes)", f.name, f.path.display(), f.bytes))
        .collect()
}

pub fn print_write_output(written: &[WrittenFile]) {
    for line in format_write_output(written) {
        println!("{}", line);
    }
}

// ============================================================================
// Publish
// ============================================================================

pub fn format_publish_output(report: &PublishReport) -> Vec<String> {
    let commit = match &report.commit {
        CommitOutcome::Committed => "committed".to_string(),
        CommitOutcome::NothingToCommit => "nothing to commit (skipped)".to_string(),
        CommitOutcome::Failed { command, .. } => format!("failed: {command}"),
    };
    vec![
        format!("Commit: {commit}"),
        format!("Pushed: {}", report.pushed_to),
    ]
}

pub fn print_publish_output(report: &PublishReport) {
    for line in format_publish_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Notify
// ============================================================================

pub fn format_notify_output(report: &NotifyReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .calls
        .iter()
        .map(|call| match &call.outcome {
            NotifyOutcome::Ok(status) => format!("{} → {}", call.target, status),
            NotifyOutcome::Failed(reason) => format!("{} → failed: {}", call.target, reason),
            NotifyOutcome::Skipped(reason) => format!("{} → skipped: {}", call.target, reason),
        })
        .collect();
    let failures = report.failures();
    if failures > 0 {
        lines.push(format!(
            "{failures} of {} notifications failed (ignored)",
            report.calls.len()
        ));
    }
    lines
}

pub fn print_notify_output(report: &NotifyReport) {
    for line in format_notify_output(report) {
        println!("{}", line);
    }
}
