//! Shared types passed between pipeline stages.
//!
//! The loader produces [`Record`]s, the renderer groups them into
//! [`CategoryGroup`]s, and the writer serializes records for the optional
//! `faq.json` export. Every stage borrows; nothing downstream mutates them.

use serde::{Deserialize, Serialize};

/// One knowledge-base entry, in source order.
///
/// Optional fields are `None` when the source cell is missing or blank, never
/// `Some("")`. Renderers rely on that to decide whether to emit an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Grouping key. Not unique.
    pub category: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Free text; embedded newlines separate paragraphs.
    pub answer: String,
    /// Comma or free-form keyword list, displayed verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Short machine-oriented summary, only surfaced in structured data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

impl Record {
    /// Answer paragraphs: one per line, trimmed, blank lines dropped.
    pub fn answer_paragraphs(&self) -> impl Iterator<Item = &str> {
        self.answer
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

/// Records sharing a category, rendered as one heading plus its blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub records: Vec<&'a Record>,
}
