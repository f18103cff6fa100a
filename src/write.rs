//! Site artifact writing.
//!
//! Stage 3 of the pipeline. Writes the rendered page and its crawler-facing
//! companions into the output directory:
//!
//! ```text
//! docs/
//! ├── index.html     # Rendered page
//! ├── sitemap.xml    # One <url> for the canonical URL
//! ├── robots.txt     # Allow-all, points at sitemap.xml
//! └── faq.json       # Raw records (data_export only)
//! ```
//!
//! Files are overwritten on every run. The sitemap and robots generators are
//! pure and take the date explicitly; only [`write_site`] touches the disk.

use crate::config::SiteConfig;
use crate::types::Record;
use chrono::NaiveDate;
use maud::{PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const INDEX_FILE: &str = "index.html";
pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const ROBOTS_FILE: &str = "robots.txt";
pub const DATA_FILE: &str = "faq.json";

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Which optional artifacts to write alongside `index.html`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub sitemap: bool,
    pub robots: bool,
    pub data_export: bool,
}

impl Artifacts {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            sitemap: config.steps.sitemap,
            robots: config.steps.robots,
            data_export: config.steps.data_export,
        }
    }

    /// Whether `path` (relative to the site URL) is served after this build.
    ///
    /// Paths other than the optional artifacts are assumed to exist.
    pub fn publishes(&self, path: &str) -> bool {
        match path.trim_start_matches('/') {
            SITEMAP_FILE => self.sitemap,
            ROBOTS_FILE => self.robots,
            DATA_FILE => self.data_export,
            _ => true,
        }
    }
}

/// A file written by [`write_site`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub name: &'static str,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Write the page and the selected artifacts to `output_dir`.
///
/// The directory is created if missing. Returns the files written, in the
/// order they were written.
pub fn write_site(
    output_dir: &Path,
    html: &str,
    records: &[Record],
    config: &SiteConfig,
    artifacts: Artifacts,
    today: NaiveDate,
) -> Result<Vec<WrittenFile>, WriteError> {
    fs::create_dir_all(output_dir).map_err(|source| WriteError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = vec![write_file(output_dir, INDEX_FILE, html)?];

    if artifacts.sitemap {
        let sitemap = render_sitemap(&config.site.url, today);
        written.push(write_file(output_dir, SITEMAP_FILE, &sitemap)?);
    }
    if artifacts.robots {
        let robots = render_robots(&config.site.url_for(SITEMAP_FILE));
        written.push(write_file(output_dir, ROBOTS_FILE, &robots)?);
    }
    if artifacts.data_export {
        let json = serde_json::to_string_pretty(records).map_err(|source| WriteError::Json {
            path: output_dir.join(DATA_FILE),
            source,
        })?;
        written.push(write_file(output_dir, DATA_FILE, &json)?);
    }

    Ok(written)
}

fn write_file(dir: &Path, name: &'static str, contents: &str) -> Result<WrittenFile, WriteError> {
    let path = dir.join(name);
    fs::write(&path, contents).map_err(|source| WriteError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(WrittenFile {
        name,
        path,
        bytes: contents.len(),
    })
}

/// Sitemap with a single entry for the canonical URL.
pub fn render_sitemap(site_url: &str, lastmod: NaiveDate) -> String {
    let markup = html! {
        (PreEscaped("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"))
        urlset xmlns=(SITEMAP_NAMESPACE) {
            url {
                loc { (site_url) }
                lastmod { (lastmod.format("%Y-%m-%d").to_string()) }
                changefreq { "weekly" }
                priority { "1.0" }
            }
        }
    };
    let mut xml = markup.into_string();
    xml.push('\n');
    xml
}

/// Allow-all robots file pointing crawlers at the sitemap.
pub fn render_robots(sitemap_url: &str) -> String {
    format!("User-agent: *\nAllow: /\n\nSitemap: {sitemap_url}\n")
}
