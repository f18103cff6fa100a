//! Publishing via git.
//!
//! Stage 4 of the pipeline. Stages everything, commits, and pushes:
//!
//! ```text
//! git add --all
//! git diff --cached --quiet      exit 0 → nothing to commit (skip)
//!                                exit 1 → git commit -m <message>
//! git push <remote> [<branch>]
//! ```
//!
//! An empty index is a normal outcome, detected from the exit status of
//! `git diff --cached --quiet` rather than by reading commit output. Any other
//! failure stops the pipeline and reports the command with its captured
//! output. There is no rollback: a commit that fails to push stays committed.
//!
//! Commands run through the [`CommandRunner`] trait so tests can script git
//! without a repository.

use crate::config::PublishConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` failed ({output})")]
    CommandFailed {
        command: String,
        output: CommandOutput,
    },
}

/// Captured result of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}")?,
            None => write!(f, "terminated by signal")?,
        }
        for (label, text) in [("stdout", &self.stdout), ("stderr", &self.stderr)] {
            let text = text.trim();
            if !text.is_empty() {
                write!(f, "\n{label}:\n{text}")?;
            }
        }
        Ok(())
    }
}

/// Runs external programs and captures their output.
pub trait CommandRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> std::io::Result<CommandOutput>;
}

/// Production runner backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program).args(args).current_dir(dir).output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Result of the commit step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The index matched HEAD after staging.
    NothingToCommit,
    Failed { command: String, output: CommandOutput },
}

/// What a successful publish did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub repo_dir: PathBuf,
    pub commit: CommitOutcome,
    /// `remote` or `remote branch`, as pushed.
    pub pushed_to: String,
}

pub struct Publisher<'a, R: CommandRunner> {
    runner: &'a R,
    config: &'a PublishConfig,
}

impl<'a, R: CommandRunner> Publisher<'a, R> {
    pub fn new(runner: &'a R, config: &'a PublishConfig) -> Self {
        Self { runner, config }
    }

    /// Stage, commit, and push. Stops at the first failing step.
    pub fn publish(&self) -> Result<PublishReport, PublishError> {
        self.stage()?;

        let commit = self.commit()?;
        if let CommitOutcome::Failed { command, output } = commit {
            return Err(PublishError::CommandFailed { command, output });
        }

        let pushed_to = self.push()?;
        Ok(PublishReport {
            repo_dir: self.config.repo_dir.clone(),
            commit,
            pushed_to,
        })
    }

    /// `git add --all`.
    pub fn stage(&self) -> Result<(), PublishError> {
        self.git_checked(&["add", "--all"]).map(|_| ())
    }

    /// Commit staged changes, classifying an empty index as a skip.
    ///
    /// Only a failure to launch git is an `Err`; a git command that runs and
    /// fails comes back as [`CommitOutcome::Failed`].
    pub fn commit(&self) -> Result<CommitOutcome, PublishError> {
        let diff_args = ["diff", "--cached", "--quiet"];
        let diff = self.git(&diff_args)?;
        match diff.code {
            Some(0) => {
                tracing::info!("nothing to commit, working tree clean");
                return Ok(CommitOutcome::NothingToCommit);
            }
            Some(1) => {}
            _ => {
                return Ok(CommitOutcome::Failed {
                    command: command_line(&diff_args),
                    output: diff,
                });
            }
        }

        let commit_args = ["commit", "-m", self.config.commit_message.as_str()];
        let output = self.git(&commit_args)?;
        if output.success() {
            Ok(CommitOutcome::Committed)
        } else {
            Ok(CommitOutcome::Failed {
                command: command_line(&commit_args),
                output,
            })
        }
    }

    /// `git push <remote> [<branch>]`; returns the push target.
    pub fn push(&self) -> Result<String, PublishError> {
        let mut args = vec!["push", self.config.remote.as_str()];
        if let Some(branch) = &self.config.branch {
            args.push(branch.as_str());
        }
        self.git_checked(&args)?;
        Ok(args[1..].join(" "))
    }

    fn git(&self, args: &[&str]) -> Result<CommandOutput, PublishError> {
        tracing::debug!(dir = %self.config.repo_dir.display(), "{}", command_line(args));
        self.runner
            .run(&self.config.repo_dir, "git", args)
            .map_err(|source| PublishError::Spawn {
                command: command_line(args),
                source,
            })
    }

    fn git_checked(&self, args: &[&str]) -> Result<CommandOutput, PublishError> {
        let output = self.git(args)?;
        if output.success() {
            Ok(output)
        } else {
            Err(PublishError::CommandFailed {
                command: command_line(args),
                output,
            })
        }
    }
}

fn command_line(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}
