//! Crawl notification.
//!
//! Stage 5 of the pipeline, strictly advisory. After publishing, nudges
//! crawlers to revisit the site in one of two ways:
//!
//! - **Ping**: `GET` the canonical URL and each configured companion path
//!   (sitemap, robots, data file). A fetch by the hosting CDN is often enough
//!   to refresh caches that crawlers read from.
//! - **Search API**: one authenticated `POST {"q": "site:<url>"}` to a search
//!   API. The key comes from an environment variable; without it the step is
//!   skipped.
//!
//! Nothing here returns an error. Every failed call (transport error, timeout,
//! non-2xx) logs one warning and is recorded in the [`NotifyReport`].

use crate::config::{NotifyConfig, NotifyMode, SiteSettings};
use crate::write::Artifacts;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

/// Result of one notification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The request completed with a 2xx status.
    Ok(u16),
    /// Transport error or non-2xx status.
    Failed(String),
    /// The call was not attempted.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub target: String,
    pub outcome: NotifyOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub calls: Vec<NotifyCall>,
}

impl NotifyReport {
    pub fn failures(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c.outcome, NotifyOutcome::Failed(_)))
            .count()
    }

    fn record(&mut self, target: impl Into<String>, outcome: NotifyOutcome) {
        let target = target.into();
        match &outcome {
            NotifyOutcome::Ok(status) => tracing::info!(%target, status, "crawl notification sent"),
            NotifyOutcome::Failed(reason) => {
                tracing::warn!(%target, %reason, "crawl notification failed")
            }
            NotifyOutcome::Skipped(reason) => {
                tracing::info!(%target, %reason, "crawl notification skipped")
            }
        }
        self.calls.push(NotifyCall { target, outcome });
    }
}

#[derive(Debug, Serialize)]
struct SearchQuery {
    q: String,
}

pub struct Notifier<'a> {
    site: &'a SiteSettings,
    config: &'a NotifyConfig,
    artifacts: Option<Artifacts>,
}

impl<'a> Notifier<'a> {
    pub fn new(site: &'a SiteSettings, config: &'a NotifyConfig) -> Self {
        Self {
            site,
            config,
            artifacts: None,
        }
    }

    /// Skip ping paths naming an artifact that was not written.
    pub fn with_artifacts(mut self, artifacts: Artifacts) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Read the search API key from the configured environment variable.
    ///
    /// Unset and empty are treated the same.
    pub fn credential_from_env(&self) -> Option<String> {
        std::env::var(&self.config.search_api.credential_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    /// Send notifications for the configured mode.
    ///
    /// `credential` is only consulted in search-API mode.
    pub fn notify(&self, credential: Option<&str>) -> NotifyReport {
        let mut report = NotifyReport::default();
        let client = match Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                report.record("http client", NotifyOutcome::Failed(e.to_string()));
                return report;
            }
        };

        match self.config.mode {
            NotifyMode::Ping => self.ping(&client, &mut report),
            NotifyMode::SearchApi => self.search_api(&client, credential, &mut report),
        }
        report
    }

    fn ping(&self, client: &Client, report: &mut NotifyReport) {
        for path in &self.config.ping_paths {
            let url = self.site.url_for(path);
            if self.artifacts.is_some_and(|a| !a.publishes(path)) {
                report.record(url, NotifyOutcome::Skipped(format!("{path} is not written")));
                continue;
            }
            tracing::debug!(%url, "GET");
            let outcome = match client.get(&url).send() {
                Ok(resp) => status_outcome(resp.status()),
                Err(e) => NotifyOutcome::Failed(e.to_string()),
            };
            report.record(url, outcome);
        }
    }

    fn search_api(&self, client: &Client, credential: Option<&str>, report: &mut NotifyReport) {
        let endpoint = &self.config.search_api.endpoint;
        let Some(key) = credential else {
            report.record(
                endpoint.as_str(),
                NotifyOutcome::Skipped(format!(
                    "{} is not set",
                    self.config.search_api.credential_env
                )),
            );
            return;
        };

        let query = SearchQuery {
            q: format!("site:{}", self.site.url),
        };
        tracing::debug!(%endpoint, q = %query.q, "POST");
        let outcome = match client
            .post(endpoint)
            .header("X-API-KEY", key)
            .json(&query)
            .send()
        {
            Ok(resp) => status_outcome(resp.status()),
            Err(e) => NotifyOutcome::Failed(e.to_string()),
        };
        report.record(endpoint.as_str(), outcome);
    }
}

fn status_outcome(status: reqwest::StatusCode) -> NotifyOutcome {
    if status.is_success() {
        NotifyOutcome::Ok(status.as_u16())
    } else {
        NotifyOutcome::Failed(format!("HTTP {status}"))
    }
}
