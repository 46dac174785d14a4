//! Markdown analyzer.
//!
//! Native rules over a line scan plus pulldown-cmark events for document
//! structure. Everything it emits is warning or info severity, so Markdown
//! never blocks a write.

use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use pulldown_cmark::Event;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::linter::Issue;
use crate::linter::LintResult;
use crate::linter::Linter;
use crate::linter::Severity;

const DEFAULT_LINE_LENGTH: usize = 120;

#[derive(Debug, Clone, Copy)]
struct MarkdownConfig {
    /// Maximum line length; zero disables the check.
    line_length: usize,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            line_length: DEFAULT_LINE_LENGTH,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct MarkdownConfigPatch {
    line_length: Option<usize>,
}

pub struct MarkdownLinter {
    config: RwLock<MarkdownConfig>,
}

impl MarkdownLinter {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(MarkdownConfig::default()),
        }
    }

    fn check(&self, path: &Path, content: &[u8]) -> LintResult {
        let config = *self
            .config
            .read()
            .expect("Failed to acquire markdown config lock");
        let file = path.to_string_lossy().into_owned();
        let text = String::from_utf8_lossy(content);
        let mut issues = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;

            if line.ends_with(' ') || line.ends_with('\t') {
                issues.push(issue(
                    &file,
                    line_no,
                    line.trim_end().len() + 1,
                    Severity::Warning,
                    "trailing whitespace",
                    "trailing-whitespace",
                ));
            }

            if let Some(tab) = line.find('\t') {
                issues.push(issue(
                    &file,
                    line_no,
                    tab + 1,
                    Severity::Info,
                    "hard tab",
                    "hard-tab",
                ));
            }

            let width = line.chars().count();
            if config.line_length > 0 && width > config.line_length {
                issues.push(issue(
                    &file,
                    line_no,
                    config.line_length + 1,
                    Severity::Info,
                    &format!("line exceeds {} characters ({width})", config.line_length),
                    "line-length",
                ));
            }
        }

        issues.extend(heading_increment_issues(&file, &text));

        if !content.is_empty() && !content.ends_with(b"\n") {
            issues.push(issue(
                &file,
                text.lines().count().max(1),
                1,
                Severity::Warning,
                "file does not end with a newline",
                "final-newline",
            ));
        }

        LintResult::from_issues(issues)
    }
}

impl Default for MarkdownLinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Heading levels must increase one step at a time.
fn heading_increment_issues(file: &str, text: &str) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut previous: Option<u32> = None;

    for (event, range) in Parser::new(text).into_offset_iter() {
        let Event::Start(Tag::Heading { level, .. }) = event else {
            continue;
        };
        let level = level as u32;

        if let Some(previous) = previous
            && level > previous + 1
        {
            let line = text[..range.start].matches('\n').count() + 1;
            issues.push(issue(
                file,
                line,
                1,
                Severity::Warning,
                &format!("heading level jumps from h{previous} to h{level}"),
                "heading-increment",
            ));
        }
        previous = Some(level);
    }

    issues
}

fn issue(
    file: &str,
    line: usize,
    column: usize,
    severity: Severity,
    message: &str,
    rule: &str,
) -> Issue {
    Issue {
        file: file.to_string(),
        line,
        column,
        severity,
        message: message.to_string(),
        rule: rule.to_string(),
    }
}

#[async_trait]
impl Linter for MarkdownLinter {
    fn name(&self) -> &str {
        "markdown"
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == "md" || ext == "markdown")
    }

    async fn lint(
        &self,
        _token: &CancellationToken,
        path: &Path,
        content: &[u8],
    ) -> anyhow::Result<LintResult> {
        Ok(self.check(path, content))
    }

    fn set_config(&self, config: &serde_json::Value) -> anyhow::Result<()> {
        let patch: MarkdownConfigPatch = serde_json::from_value(config.clone())?;
        if let Some(line_length) = patch.line_length {
            self.config
                .write()
                .expect("Failed to acquire markdown config lock")
                .line_length = line_length;
        }
        Ok(())
    }
}
