//! The build/deploy pipeline.
//!
//! Runs the stages strictly in order, each finishing before the next starts:
//!
//! ```text
//! Load → Render → [Sitemap] [Robots] [DataExport] → [Publish] → [Notify]
//! ```
//!
//! Load and render always run. The bracketed steps are toggled in `[steps]`;
//! the file steps are written together in one pass by
//! [`write::write_site`](crate::write::write_site). Load, render, write and
//! publish failures stop the run. Notification failures never do.

use crate::config::SiteConfig;
use crate::load::{self, LoadError};
use crate::notify::{NotifyReport, Notifier};
use crate::output;
use crate::publish::{CommandRunner, PublishError, PublishReport, Publisher};
use crate::render;
use crate::schema::RenderError;
use crate::types::Record;
use crate::write::{self, Artifacts, WriteError, WrittenFile};
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("load failed: {0}")]
    Load(#[from] LoadError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("write failed: {0}")]
    Write(#[from] WriteError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// A post-render step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sitemap,
    Robots,
    DataExport,
    Publish,
    Notify,
}

impl Step {
    /// Steps that only write into the output directory.
    pub fn is_file_step(self) -> bool {
        matches!(self, Step::Sitemap | Step::Robots | Step::DataExport)
    }
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub records: Vec<Record>,
    pub written: Vec<WrittenFile>,
    pub publish: Option<PublishReport>,
    pub notify: Option<NotifyReport>,
}

pub struct Pipeline<'a, R: CommandRunner> {
    config: &'a SiteConfig,
    runner: &'a R,
    source: PathBuf,
    output_dir: PathBuf,
    today: NaiveDate,
    credential: Option<String>,
}

impl<'a, R: CommandRunner> Pipeline<'a, R> {
    /// A pipeline reading `config.source.path` and writing `config.output.dir`,
    /// dated today (UTC).
    pub fn new(config: &'a SiteConfig, runner: &'a R) -> Self {
        Self {
            config,
            runner,
            source: config.source.path.clone(),
            output_dir: config.output.dir.clone(),
            today: chrono::Utc::now().date_naive(),
            credential: None,
        }
    }

    pub fn with_source(mut self, source: PathBuf) -> Self {
        self.source = source;
        self
    }

    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    /// Date stamped into the sitemap's `<lastmod>`.
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Search API key for the notify step.
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }

    /// Post-render steps enabled in the config, in execution order.
    pub fn enabled_steps(&self) -> Vec<Step> {
        let steps = &self.config.steps;
        [
            (steps.sitemap, Step::Sitemap),
            (steps.robots, Step::Robots),
            (steps.data_export, Step::DataExport),
            (steps.publish, Step::Publish),
            (steps.notify, Step::Notify),
        ]
        .into_iter()
        .filter_map(|(enabled, step)| enabled.then_some(step))
        .collect()
    }

    /// Load, render, write, then run whichever of `steps` are publish/notify.
    pub fn run(&self, steps: &[Step]) -> Result<PipelineReport, PipelineError> {
        println!("==> Loading {}", self.source.display());
        let records = load::load(&self.source, self.config.source.sheet.as_deref())?;
        output::print_load_output(&records, self.config.site.grouping);

        println!("==> Rendering {} entries", records.len());
        let html = render::render_page(&records, self.config)?;

        println!("==> Writing {}", self.output_dir.display());
        let artifacts = Artifacts {
            sitemap: steps.contains(&Step::Sitemap),
            robots: steps.contains(&Step::Robots),
            data_export: steps.contains(&Step::DataExport),
        };
        let written = write::write_site(
            &self.output_dir,
            &html,
            &records,
            self.config,
            artifacts,
            self.today,
        )?;
        output::print_write_output(&written);

        let mut report = PipelineReport {
            records,
            written,
            ..PipelineReport::default()
        };

        if steps.contains(&Step::Publish) {
            report.publish = Some(self.publish()?);
        }
        if steps.contains(&Step::Notify) {
            report.notify = Some(self.notify_with(artifacts));
        }

        Ok(report)
    }

    /// Publish only, without rebuilding.
    pub fn publish(&self) -> Result<PublishReport, PipelineError> {
        println!(
            "==> Publishing from {}",
            self.config.publish.repo_dir.display()
        );
        let report = Publisher::new(self.runner, &self.config.publish).publish()?;
        output::print_publish_output(&report);
        Ok(report)
    }

    /// Notify crawlers about the artifacts the config enables. Never fails.
    pub fn notify(&self) -> NotifyReport {
        self.notify_with(Artifacts::from_config(self.config))
    }

    fn notify_with(&self, artifacts: Artifacts) -> NotifyReport {
        println!("==> Notifying crawlers");
        let report = Notifier::new(&self.config.site, &self.config.notify)
            .with_artifacts(artifacts)
            .notify(self.credential.as_deref());
        output::print_notify_output(&report);
        report
    }
}
