//! Site configuration module.
//!
//! Handles loading, validating, and merging `kb-site.toml`. The file is
//! optional: stock defaults are the base layer and user values override them
//! key by key. The result is an immutable [`SiteConfig`] that every pipeline
//! stage borrows.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! path = "content.xlsx"        # .xlsx/.xlsm/.xls/.xlsb/.ods or .csv
//! # sheet = "FAQ"              # Workbook sheet; first sheet when omitted
//!
//! [output]
//! dir = "docs"
//!
//! [site]
//! title = "GEO 知识库"
//! url = "https://example.com/"  # Canonical URL (http or https)
//! description = "..."
//! lang = "zh-CN"
//! keywords_label = "关键词："
//! grouping = "first-appearance" # or "alphabetical"
//!
//! [steps]
//! structured_data = true
//! sitemap = true
//! robots = true
//! data_export = false           # faq.json
//! publish = true
//! notify = false
//!
//! [publish]
//! repo_dir = "."
//! remote = "origin"
//! # branch = "gh-pages"
//! commit_message = "update site"
//!
//! [notify]
//! mode = "ping"                 # or "search-api"
//! timeout_secs = 10
//! ping_paths = ["", "sitemap.xml", "robots.txt"]
//!
//! [notify.search_api]
//! endpoint = "https://google.serper.dev/search"
//! credential_env = "KB_SITE_SEARCH_API_KEY"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "kb-site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `kb-site.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub site: SiteSettings,
    pub steps: StepsConfig,
    pub publish: PublishConfig,
    pub notify: NotifyConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation("site.title must not be empty".into()));
        }
        match Url::parse(&self.site.url) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => {
                return Err(ConfigError::Validation(format!(
                    "site.url must be http or https, got scheme '{}'",
                    u.scheme()
                )));
            }
            Err(e) => {
                return Err(ConfigError::Validation(format!(
                    "site.url is not a valid URL ({}): {e}",
                    self.site.url
                )));
            }
        }
        if self.publish.remote.trim().is_empty() {
            return Err(ConfigError::Validation(
                "publish.remote must not be empty".into(),
            ));
        }
        if self.publish.commit_message.trim().is_empty() {
            return Err(ConfigError::Validation(
                "publish.commit_message must not be empty".into(),
            ));
        }
        if self.notify.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "notify.timeout_secs must be greater than 0".into(),
            ));
        }
        if let Err(e) = Url::parse(&self.notify.search_api.endpoint) {
            return Err(ConfigError::Validation(format!(
                "notify.search_api.endpoint is not a valid URL: {e}"
            )));
        }
        Ok(())
    }
}

/// Where the spreadsheet lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Workbook sheet name. `None` reads the first sheet; ignored for CSV.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("content.xlsx"),
            sheet: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("docs"),
        }
    }
}

/// How records are partitioned into category sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grouping {
    /// Categories in the order they first appear in the source.
    #[default]
    FirstAppearance,
    /// Categories sorted lexicographically.
    Alphabetical,
}

/// Page-level metadata and presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSettings {
    pub title: String,
    /// Canonical URL of the published page.
    pub url: String,
    pub description: String,
    /// Value of the `<html lang>` attribute.
    pub lang: String,
    /// Text printed before each keyword list.
    pub keywords_label: String,
    pub grouping: Grouping,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "GEO 知识库".to_string(),
            url: "https://example.com/".to_string(),
            description: "常见问题与解答".to_string(),
            lang: "zh-CN".to_string(),
            keywords_label: "关键词：".to_string(),
            grouping: Grouping::FirstAppearance,
        }
    }
}

impl SiteSettings {
    /// Absolute URL of a file published next to the page.
    ///
    /// An empty `path` returns the canonical URL unchanged. Otherwise the
    /// canonical URL is treated as a directory and its query and fragment are
    /// dropped.
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return self.url.clone();
        }
        match Url::parse(&self.url) {
            Ok(mut base) => {
                if !base.path().ends_with('/') {
                    let dir = format!("{}/", base.path());
                    base.set_path(&dir);
                }
                base.join(path)
                    .map_or_else(|_| base.to_string(), String::from)
            }
            Err(_) => format!("{}/{}", self.url.trim_end_matches('/'), path),
        }
    }
}

/// Post-render step toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepsConfig {
    /// Embed the JSON-LD FAQPage block in the page head.
    pub structured_data: bool,
    pub sitemap: bool,
    pub robots: bool,
    /// Write `faq.json` with the raw records.
    pub data_export: bool,
    pub publish: bool,
    pub notify: bool,
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            structured_data: true,
            sitemap: true,
            robots: true,
            data_export: false,
            publish: true,
            notify: false,
        }
    }
}

/// Version-control publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Working tree the git commands run in.
    pub repo_dir: PathBuf,
    pub remote: String,
    /// Branch to push. `None` pushes the current branch's upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub commit_message: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("."),
            remote: "origin".to_string(),
            branch: None,
            commit_message: "update site".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyMode {
    /// GET each published URL.
    #[default]
    Ping,
    /// One authenticated `site:` query against a search API.
    SearchApi,
}

/// Crawl notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    pub mode: NotifyMode,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Paths joined onto the site URL for ping mode; `""` is the page itself.
    pub ping_paths: Vec<String>,
    pub search_api: SearchApiConfig,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            mode: NotifyMode::Ping,
            timeout_secs: 10,
            ping_paths: vec![
                String::new(),
                "sitemap.xml".to_string(),
                "robots.txt".to_string(),
            ],
            search_api: SearchApiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchApiConfig {
    pub endpoint: String,
    /// Environment variable holding the API key.
    pub credential_env: String,
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://google.serper.dev/search".to_string(),
            credential_env: "KB_SITE_SEARCH_API_KEY".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Load config from a path the user named explicitly.
///
/// Unlike [`load_config`], a missing file is an error rather than defaults.
pub fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    load_config(path)
}

/// Returns a fully-commented stock `kb-site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# kb-site configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Input spreadsheet
# ---------------------------------------------------------------------------
[source]
# .xlsx, .xlsm, .xls, .xlsb, .ods or .csv. Required columns: category,
# question, answer. Optional: summary, keywords, ai_summary.
path = "content.xlsx"

# Workbook sheet to read. Omit to read the first sheet.
# sheet = "FAQ"

# ---------------------------------------------------------------------------
# Output directory (index.html, sitemap.xml, robots.txt)
# ---------------------------------------------------------------------------
[output]
dir = "docs"

# ---------------------------------------------------------------------------
# Page metadata
# ---------------------------------------------------------------------------
[site]
title = "GEO 知识库"

# Canonical URL of the published page. Used for <link rel="canonical">,
# Open Graph tags, the sitemap and robots.txt.
url = "https://example.com/"

description = "常见问题与解答"
lang = "zh-CN"

# Printed before each entry's keyword list.
keywords_label = "关键词："

# "first-appearance" keeps categories in source order,
# "alphabetical" sorts them.
grouping = "first-appearance"

# ---------------------------------------------------------------------------
# Pipeline steps
# ---------------------------------------------------------------------------
[steps]
# Embed JSON-LD FAQPage structured data in the page head.
structured_data = true
sitemap = true
robots = true

# Write faq.json with the raw records.
data_export = false

# Commit and push after writing (deploy command only).
publish = true

# Ask crawlers to revisit after publishing (deploy command only).
notify = false

# ---------------------------------------------------------------------------
# Publishing (git)
# ---------------------------------------------------------------------------
[publish]
repo_dir = "."
remote = "origin"

# Branch to push. Omit to push the current branch.
# branch = "gh-pages"

commit_message = "update site"

# ---------------------------------------------------------------------------
# Crawl notification (best effort, never fails the run)
# ---------------------------------------------------------------------------
[notify]
# "ping" GETs each published URL; "search-api" sends one site: query.
mode = "ping"
timeout_secs = 10
# Paths naming an artifact whose step is off (e.g. "faq.json" without
# steps.data_export) are skipped.
ping_paths = ["", "sitemap.xml", "robots.txt"]

[notify.search_api]
endpoint = "https://google.serper.dev/search"

# Environment variable holding the API key. Unset means skip.
credential_env = "KB_SITE_SEARCH_API_KEY"
"##
}
