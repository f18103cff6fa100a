//! Shared test utilities for the kb-site test suite.
//!
//! Provides record builders, a CSV fixture writer, and [`ScriptedRunner`], a
//! [`CommandRunner`] that replays canned git results and records every command
//! it was asked to run.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let runner = ScriptedRunner::new(vec![exit(0), exit(0), exit(0)]);
//! let report = Publisher::new(&runner, &config).publish().unwrap();
//! assert_eq!(runner.commands()[0], "git add --all");
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::publish::{CommandOutput, CommandRunner};
use crate::types::Record;

// =========================================================================
// Records
// =========================================================================

/// A record with only the required fields set.
pub fn record(category: &str, question: &str, answer: &str) -> Record {
    Record {
        category: category.to_string(),
        question: question.to_string(),
        summary: None,
        answer: answer.to_string(),
        keywords: None,
        ai_summary: None,
    }
}

/// The three records described by [`FIXTURE_CSV`].
pub fn sample_records() -> Vec<Record> {
    let mut first = record("基础", "什么是 GEO?", "第一段\n第二段");
    first.keywords = Some("geo,ai".to_string());
    first.ai_summary = Some("GEO optimizes content for AI answers.".to_string());

    let mut second = record("基础", "GEO 和 SEO 有什么区别?", "SEO 面向排名。\n\nGEO 面向答案。");
    second.summary = Some("目标不同".to_string());

    let third = record("进阶", "如何让 AI 更容易引用我的内容?", "使用结构化数据。");

    vec![first, second, third]
}

/// CSV equivalent of [`sample_records`].
pub const FIXTURE_CSV: &str = "category,question,summary,answer,keywords,ai_summary\n\
基础,什么是 GEO?,,\"第一段\n第二段\",\"geo,ai\",GEO optimizes content for AI answers.\n\
基础,GEO 和 SEO 有什么区别?,目标不同,\"SEO 面向排名。\n\nGEO 面向答案。\",,\n\
进阶,如何让 AI 更容易引用我的内容?,,使用结构化数据。,,\n";

/// Write `content` to `dir/content.csv` and return the path.
pub fn write_csv(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("content.csv");
    std::fs::write(&path, content).unwrap();
    path
}

// =========================================================================
// Command runner
// =========================================================================

/// A finished command with the given exit code and no output.
pub fn exit(code: i32) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        ..CommandOutput::default()
    }
}

/// Replays queued outputs in order. Panics if more commands run than were
/// scripted, so tests notice unexpected git calls.
#[derive(Default)]
pub struct ScriptedRunner {
    outputs: RefCell<VecDeque<CommandOutput>>,
    commands: RefCell<Vec<String>>,
    spawn_fails: bool,
}

impl ScriptedRunner {
    pub fn new(outputs: Vec<CommandOutput>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            ..Self::default()
        }
    }

    /// Every `run` call fails as if the program were not installed.
    pub fn failing_spawn() -> Self {
        Self {
            spawn_fails: true,
            ..Self::default()
        }
    }

    /// Commands run so far, as `program arg arg ...`.
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, _dir: &Path, program: &str, args: &[&str]) -> std::io::Result<CommandOutput> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.commands.borrow_mut().push(line.clone());

        if self.spawn_fails {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{program}: not found"),
            ));
        }
        let output = self.outputs.borrow_mut().pop_front();
        Ok(output.unwrap_or_else(|| panic!("unscripted command: {line}")))
    }
}
