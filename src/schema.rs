//! JSON-LD structured data.
//!
//! Builds a schema.org `FAQPage` from the loaded records so search engines
//! and AI crawlers can read the Q&A pairs without parsing the page layout:
//!
//! ```json
//! {
//!   "@context": "https://schema.org",
//!   "@type": "FAQPage",
//!   "mainEntity": [
//!     {
//!       "@type": "Question",
//!       "name": "什么是 GEO?",
//!       "acceptedAnswer": { "@type": "Answer", "text": "..." },
//!       "abstract": "..."
//!     }
//!   ]
//! }
//! ```
//!
//! `abstract` carries the record's `ai_summary` and is omitted when absent.

use crate::types::Record;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to serialize structured data: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct FaqPage<'a> {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    #[serde(rename = "mainEntity")]
    pub main_entity: Vec<Question<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Question<'a> {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: &'a str,
    #[serde(rename = "acceptedAnswer")]
    pub accepted_answer: Answer<'a>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct Answer<'a> {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub text: &'a str,
}

/// Map records to an `FAQPage`, one question per record in source order.
pub fn faq_page(records: &[Record]) -> FaqPage<'_> {
    FaqPage {
        context: "https://schema.org",
        kind: "FAQPage",
        main_entity: records
            .iter()
            .map(|r| Question {
                kind: "Question",
                name: &r.question,
                accepted_answer: Answer {
                    kind: "Answer",
                    text: &r.answer,
                },
                ai_summary: r.ai_summary.as_deref(),
            })
            .collect(),
    }
}

/// Serialize structured data for embedding inside a `<script>` element.
///
/// `<`, `>` and `&` are emitted as JSON unicode escapes, so the payload can
/// never close the script element or open a comment, and still parses to the
/// same strings.
pub fn to_script_json(page: &FaqPage<'_>) -> Result<String, RenderError> {
    let json = serde_json::to_string(page)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::record;
    use serde_json::{Value, json};

    #[test]
    fn faq_page_has_fixed_shape() {
        let records = vec![record("基础", "什么是 GEO?", "第一段\n第二段")];
        let value = serde_json::to_value(faq_page(&records)).unwrap();
        assert_eq!(
            value,
            json!({
                "@context": "https://schema.org",
                "@type": "FAQPage",
                "mainEntity": [{
                    "@type": "Question",
                    "name": "什么是 GEO?",
                    "acceptedAnswer": {"@type": "Answer", "text": "第一段\n第二段"}
                }]
            })
        );
    }

    #[test]
    fn ai_summary_included_when_present() {
        let mut r = record("c", "q", "a");
        r.ai_summary = Some("tl;dr".to_string());
        let value = serde_json::to_value(faq_page(&[r])).unwrap();
        assert_eq!(value["mainEntity"][0]["abstract"], "tl;dr");
    }

    #[test]
    fn one_question_per_record_in_order() {
        let records = vec![
            record("b", "q1", "a1"),
            record("a", "q2", "a2"),
            record("b", "q3", "a3"),
        ];
        let page = faq_page(&records);
        let names: Vec<&str> = page.main_entity.iter().map(|q| q.name).collect();
        assert_eq!(names, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn script_json_cannot_close_script_element() {
        let records = vec![record(
            "c",
            "</script><script>alert(1)</script>",
            "a & b <!-- x -->",
        )];
        let json = to_script_json(&faq_page(&records)).unwrap();
        assert!(!json.contains('<'));
        assert!(!json.contains('>'));
        assert!(!json.contains('&'));
        assert!(json.contains("\\u003c/script\\u003e"));
    }

    #[test]
    fn script_json_parses_back_to_original_text() {
        let records = vec![record("c", "<b>bold</b>?", "x & y")];
        let json = to_script_json(&faq_page(&records)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mainEntity"][0]["name"], "<b>bold</b>?");
        assert_eq!(value["mainEntity"][0]["acceptedAnswer"]["text"], "x & y");
    }

    #[test]
    fn empty_records_give_empty_main_entity() {
        let value = serde_json::to_value(faq_page(&[])).unwrap();
        assert_eq!(value["mainEntity"], json!([]));
    }
}
