//! Go analyzer.
//!
//! Syntax and formatting run through `gofmt` over piped source, so they
//! work for content that is not on disk yet. `go vet` and `go test` are
//! opt-in and only run when the file exists inside a Go module.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use gismo_config::ConfigDuration;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::DEFAULT_TOOL_TIMEOUT;
use super::parse_line_col;
use super::run_tool;
use crate::linter::Issue;
use crate::linter::LintResult;
use crate::linter::Linter;
use crate::linter::Severity;

static GOFMT: Lazy<Option<PathBuf>> = Lazy::new(|| which::which("gofmt").ok());
static GO: Lazy<Option<PathBuf>> = Lazy::new(|| which::which("go").ok());

#[derive(Debug, Clone, Default)]
struct GoConfig {
    vet: bool,
    tests: bool,
    timeout: Option<ConfigDuration>,
}

/// Patch-style configuration blob; absent keys keep their current value.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GoConfigPatch {
    vet: Option<bool>,
    tests: Option<bool>,
    timeout: Option<ConfigDuration>,
}

pub struct GoLinter {
    config: RwLock<GoConfig>,
    /// Directory → nearest go.mod directory, memoized across lints.
    module_roots: RwLock<HashMap<PathBuf, Option<PathBuf>>>,
}

impl GoLinter {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(GoConfig::default()),
            module_roots: RwLock::new(HashMap::new()),
        }
    }

    fn snapshot(&self) -> GoConfig {
        self.config
            .read()
            .expect("Failed to acquire go config lock")
            .clone()
    }

    /// Nearest ancestor with a go.mod, memoized per directory.
    fn module_root(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(cached) = self
            .module_roots
            .read()
            .expect("Failed to acquire module root lock")
            .get(dir)
        {
            return cached.clone();
        }

        let mut current = Some(dir);
        let mut found = None;
        while let Some(candidate) = current {
            if candidate.join("go.mod").is_file() {
                found = Some(candidate.to_path_buf());
                break;
            }
            current = candidate.parent();
        }

        self.module_roots
            .write()
            .expect("Failed to acquire module root lock")
            .insert(dir.to_path_buf(), found.clone());
        found
    }

    async fn run_gofmt(
        &self,
        token: &CancellationToken,
        timeout: std::time::Duration,
        path: &Path,
        content: &[u8],
    ) -> anyhow::Result<LintResult> {
        let Some(gofmt) = GOFMT.as_ref() else {
            anyhow::bail!("gofmt not found in PATH");
        };

        let output = run_tool(token, timeout, Command::new(gofmt), Some(content)).await?;

        if !output.status.success() {
            // The source failed to parse. Report a single syntax finding at
            // the top of the file; positional detail rides in the message.
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .find_map(parse_line_col)
                .map(|(line, column, message)| format!("{message} (line {line}, column {column})"))
                .unwrap_or_else(|| stderr.trim().to_string());

            return Ok(LintResult::from_issues(vec![Issue {
                file: path.to_string_lossy().into_owned(),
                line: 1,
                column: 1,
                severity: Severity::Error,
                message: format!("syntax error: {detail}"),
                rule: "syntax".to_string(),
            }]));
        }

        if output.stdout != content {
            return Ok(LintResult::from_issues(vec![Issue {
                file: path.to_string_lossy().into_owned(),
                line: 1,
                column: 1,
                severity: Severity::Warning,
                message: "file is not gofmt formatted".to_string(),
                rule: "gofmt".to_string(),
            }])
            .with_formatted(output.stdout));
        }

        Ok(LintResult::clean())
    }

    async fn run_vet(
        &self,
        token: &CancellationToken,
        timeout: std::time::Duration,
        path: &Path,
    ) -> anyhow::Result<Vec<Issue>> {
        let Some(go) = GO.as_ref() else {
            anyhow::bail!("go not found in PATH");
        };
        let Some(dir) = path.parent() else {
            return Ok(Vec::new());
        };
        if self.module_root(dir).is_none() {
            tracing::debug!(path = %path.display(), "outside a Go module; skipping go vet");
            return Ok(Vec::new());
        }

        let mut command = Command::new(go);
        command.arg("vet").arg(".").current_dir(dir);
        let output = run_tool(token, timeout, command, None).await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let issues: Vec<Issue> = stderr
            .lines()
            .filter_map(|line| {
                let (line_no, column, message) = parse_line_col(line)?;
                Some(Issue {
                    file: path.to_string_lossy().into_owned(),
                    line: line_no,
                    column,
                    severity: Severity::Error,
                    message,
                    rule: "govet".to_string(),
                })
            })
            .collect();

        if issues.is_empty() && !output.status.success() {
            anyhow::bail!("go vet failed: {}", stderr.trim());
        }
        Ok(issues)
    }

    async fn run_tests(
        &self,
        token: &CancellationToken,
        timeout: std::time::Duration,
        path: &Path,
    ) -> anyhow::Result<(Vec<Issue>, Option<String>)> {
        let Some(go) = GO.as_ref() else {
            anyhow::bail!("go not found in PATH");
        };
        let Some(dir) = path.parent() else {
            return Ok((Vec::new(), None));
        };

        let mut command = Command::new(go);
        command.arg("test").arg(".").current_dir(dir);
        let output = run_tool(token, timeout, command, None).await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let test_output = (!combined.trim().is_empty()).then(|| combined.trim().to_string());

        let issues = if output.status.success() {
            Vec::new()
        } else {
            vec![Issue {
                file: path.to_string_lossy().into_owned(),
                line: 1,
                column: 1,
                severity: Severity::Error,
                message: "go test failed".to_string(),
                rule: "go-test".to_string(),
            }]
        };
        Ok((issues, test_output))
    }
}

impl Default for GoLinter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Linter for GoLinter {
    fn name(&self) -> &str {
        "golang"
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "go")
    }

    async fn lint(
        &self,
        token: &CancellationToken,
        path: &Path,
        content: &[u8],
    ) -> anyhow::Result<LintResult> {
        let config = self.snapshot();
        let timeout = config
            .timeout
            .map(|t| t.as_duration())
            .unwrap_or(DEFAULT_TOOL_TIMEOUT);

        let mut result = self.run_gofmt(token, timeout, path, content).await?;

        // vet and tests need the file on disk inside a module; for
        // pre-tool-use content that has not landed yet they simply skip.
        let on_disk = path.is_file();

        if config.vet && on_disk && result.success {
            let issues = self.run_vet(token, timeout, path).await?;
            result = merge_issues(result, issues);
        }

        if config.tests && on_disk && result.success && has_test_sibling(path) {
            let (issues, test_output) = self.run_tests(token, timeout, path).await?;
            result = merge_issues(result, issues);
            result.test_output = test_output;
        }

        Ok(result)
    }

    fn set_config(&self, config: &serde_json::Value) -> anyhow::Result<()> {
        let patch: GoConfigPatch = serde_json::from_value(config.clone())?;
        let mut current = self
            .config
            .write()
            .expect("Failed to acquire go config lock");
        if let Some(vet) = patch.vet {
            current.vet = vet;
        }
        if let Some(tests) = patch.tests {
            current.tests = tests;
        }
        if let Some(timeout) = patch.timeout {
            current.timeout = Some(timeout);
        }
        Ok(())
    }
}

fn merge_issues(mut result: LintResult, issues: Vec<Issue>) -> LintResult {
    if issues.iter().any(|i| i.severity == Severity::Error) {
        result.success = false;
    }
    result.issues.extend(issues);
    result
}

fn has_test_sibling(path: &Path) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    if stem.ends_with("_test") {
        return false;
    }
    path.with_file_name(format!("{stem}_test.go")).is_file()
}
