//! HTML page rendering.
//!
//! Stage 2 of the pipeline. Turns the record list into a single `index.html`
//! document: one `<h2>` per category, one `.faq-block` per record.
//!
//! ## Page Structure
//!
//! ```text
//! <head>
//!   title, description, canonical, Open Graph tags
//!   inline stylesheet
//!   <script type="application/ld+json"> FAQPage </script>   (optional)
//! <body>
//!   <h1>site title</h1>
//!   <main>
//!     <h2>category</h2>
//!     <div class="faq-block">
//!       <h3>question</h3>
//!       <p class="summary">summary</p>       (only when present)
//!       <p>answer line</p> ...               (one per non-blank line)
//!       <div class="keywords">label keywords</div>  (only when present)
//!     </div>
//! ```
//!
//! ## Escaping
//!
//! Uses [maud](https://maud.lambda.xyz/), which escapes every interpolated
//! value. Record text is never wrapped in `PreEscaped`; the only raw payloads
//! are the bundled stylesheet and the structured-data JSON, which
//! [`schema::to_script_json`] has already made script-safe.
//!
//! Output contains no timestamps, so identical input renders identical bytes.

use crate::config::{Grouping, SiteConfig, SiteSettings};
use crate::schema::{self, RenderError};
use crate::types::{CategoryGroup, Record};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::BTreeMap;

const CSS: &str = include_str!("../static/style.css");

/// Render the complete page.
///
/// Structured data is embedded when `config.steps.structured_data` is set.
pub fn render_page(records: &[Record], config: &SiteConfig) -> Result<String, RenderError> {
    let structured_data = if config.steps.structured_data {
        Some(schema::to_script_json(&schema::faq_page(records))?)
    } else {
        None
    };
    let groups = group_records(records, config.site.grouping);
    let content = html! {
        h1 { (config.site.title) }
        main {
            @for group in &groups {
                (render_group(group, &config.site.keywords_label))
            }
        }
    };
    Ok(base_document(&config.site, structured_data.as_deref(), content).into_string())
}

/// Partition records by category.
///
/// Within a group records keep source order. Groups are ordered by first
/// appearance or lexicographically, per `grouping`.
pub fn group_records(records: &[Record], grouping: Grouping) -> Vec<CategoryGroup<'_>> {
    match grouping {
        Grouping::FirstAppearance => {
            let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
            for record in records {
                match groups.iter_mut().find(|g| g.category == record.category) {
                    Some(group) => group.records.push(record),
                    None => groups.push(CategoryGroup {
                        category: &record.category,
                        records: vec![record],
                    }),
                }
            }
            groups
        }
        Grouping::Alphabetical => {
            let mut by_category: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
            for record in records {
                by_category
                    .entry(record.category.as_str())
                    .or_default()
                    .push(record);
            }
            by_category
                .into_iter()
                .map(|(category, records)| CategoryGroup { category, records })
                .collect()
        }
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document with metadata tags
fn base_document(site: &SiteSettings, structured_data: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(site.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (site.title) }
                meta name="description" content=(site.description);
                link rel="canonical" href=(site.url);
                meta property="og:type" content="website";
                meta property="og:title" content=(site.title);
                meta property="og:description" content=(site.description);
                meta property="og:url" content=(site.url);
                style { (PreEscaped(CSS)) }
                @if let Some(json) = structured_data {
                    script type="application/ld+json" { (PreEscaped(json)) }
                }
            }
            body {
                (content)
            }
        }
    }
}

/// One category heading followed by its blocks
fn render_group(group: &CategoryGroup<'_>, keywords_label: &str) -> Markup {
    html! {
        section.faq-category {
            h2 { (group.category) }
            @for record in &group.records {
                (render_block(record, keywords_label))
            }
        }
    }
}

/// A single question/answer block
fn render_block(record: &Record, keywords_label: &str) -> Markup {
    html! {
        div.faq-block {
            h3 { (record.question) }
            @if let Some(summary) = &record.summary {
                p.summary { (summary) }
            }
            @for para in record.answer_paragraphs() {
                p { (para) }
            }
            @if let Some(keywords) = &record.keywords {
                div.keywords { (keywords_label) (keywords) }
            }
        }
    }
}
