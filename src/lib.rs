//! # kb-site
//!
//! Builds a static FAQ / knowledge-base page from a spreadsheet and publishes
//! it to a static hosting branch. The spreadsheet is the data source: one row
//! per question, grouped into sections by its `category` column.
//!
//! # Architecture: Linear Pipeline
//!
//! ```text
//! 1. Load      content.xlsx  →  Vec<Record>
//! 2. Render    records       →  index.html (+ JSON-LD FAQPage)
//! 3. Write     html          →  docs/ index.html, sitemap.xml, robots.txt
//! 4. Publish   docs/         →  git add / commit / push
//! 5. Notify    site URL      →  best-effort crawler pings
//! ```
//!
//! Each stage finishes before the next begins and nothing reads back a later
//! stage's output. Stages 1-4 stop the run on failure; stage 5 only logs.
//! Which post-render steps run is configured, not hard-coded: see
//! [`pipeline::Step`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `kb-site.toml` loading, default layering, validation |
//! | [`load`] | Stage 1: reads `.xlsx`/`.ods`/`.csv` rows into records |
//! | [`schema`] | JSON-LD `FAQPage` generation and script-safe serialization |
//! | [`render`] | Stage 2: category grouping and HTML rendering using Maud |
//! | [`write`] | Stage 3: writes the page, sitemap, robots file, data export |
//! | [`publish`] | Stage 4: git stage/commit/push behind a `CommandRunner` trait |
//! | [`notify`] | Stage 5: advisory crawl notifications over HTTP |
//! | [`pipeline`] | Stage ordering and step toggles |
//! | [`types`] | `Record` and `CategoryGroup` |
//! | [`output`] | CLI output formatting for each stage |
//!
//! # Design Decisions
//!
//! ## Escape Everything
//!
//! Every field from the spreadsheet is user text, including category,
//! question, summary and keywords. Maud escapes all interpolation, and record
//! text never goes through `PreEscaped`. Rich formatting in cells is not
//! supported; markup typed into a cell shows up literally on the page.
//!
//! ## Exit Status Over Output Text
//!
//! "Nothing to commit" is detected with `git diff --cached --quiet` before
//! committing, not by matching the commit command's message, which varies
//! across git versions and locales.
//!
//! ## Advisory Notifications
//!
//! Crawl pings are hints. A dead endpoint or bad API key logs a warning per
//! failed call and the run still exits 0.

pub mod config;
pub mod load;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod schema;
pub mod types;
pub mod write;

#[cfg(test)]
pub(crate) mod test_helpers;
