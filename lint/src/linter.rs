//! Analyzer contract and result types.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Issue severity. Only `Error` blocks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single finding emitted by an analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub message: String,
    pub rule: String,
}

/// Result of linting one file with one analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct LintResult {
    /// False iff at least one error-severity issue was emitted.
    pub success: bool,
    pub issues: Vec<Issue>,
    /// Formatted file content, produced as data and never written to disk.
    pub formatted: Option<Vec<u8>>,
    /// Output of any test run the analyzer performed.
    pub test_output: Option<String>,
}

impl LintResult {
    /// A result with no findings.
    pub fn clean() -> Self {
        Self {
            success: true,
            issues: Vec::new(),
            formatted: None,
            test_output: None,
        }
    }

    /// Build a result from findings, deriving `success` from the invariant
    /// that only error-severity issues flip it.
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let success = !issues.iter().any(|i| i.severity == Severity::Error);
        Self {
            success,
            issues,
            formatted: None,
            test_output: None,
        }
    }

    pub fn with_formatted(mut self, formatted: Vec<u8>) -> Self {
        self.formatted = Some(formatted);
        self
    }
}

impl Default for LintResult {
    fn default() -> Self {
        Self::clean()
    }
}

/// The unit of work handed to one worker.
#[derive(Clone)]
pub struct LintTask {
    pub linter: Arc<dyn Linter>,
    pub path: PathBuf,
    pub content: Bytes,
}

/// Outcome of one lint task. Exactly one of `result` / `error` is set,
/// except for cancellation results which carry only `error`.
#[derive(Debug)]
pub struct TaskResult {
    pub linter_name: String,
    pub result: Option<LintResult>,
    pub error: Option<anyhow::Error>,
}

impl TaskResult {
    pub fn ok(linter_name: impl Into<String>, result: LintResult) -> Self {
        Self {
            linter_name: linter_name.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn err(linter_name: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            linter_name: linter_name.into(),
            result: None,
            error: Some(error),
        }
    }
}

/// Analyzer contract.
///
/// `name`, `can_handle` and `lint` are required. `set_config` and the batch
/// capability are optional; dispatch queries them and never assumes either
/// exists. Implementations must treat their configuration as read-only once
/// a lint begins: the engine invokes `set_config` on the main task while no
/// workers are running.
#[async_trait]
pub trait Linter: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this analyzer wants to see `path` at all.
    fn can_handle(&self, path: &Path) -> bool;

    /// Lint one file. `content` is the bytes to analyze; the file may not
    /// exist on disk. Subprocess analyzers must observe `token` and kill
    /// their children on cancellation.
    async fn lint(
        &self,
        token: &CancellationToken,
        path: &Path,
        content: &[u8],
    ) -> anyhow::Result<LintResult>;

    /// Optional capability: accept an opaque configuration blob. The
    /// analyzer validates it; unknown analyzers ignore it.
    fn set_config(&self, _config: &serde_json::Value) -> anyhow::Result<()> {
        Ok(())
    }

    /// Optional capability: batch linting. Returns `Some` when the analyzer
    /// accepts multiple files at once.
    fn as_batch(&self) -> Option<&dyn BatchLinter> {
        None
    }
}

/// Capability for analyzers that lint a whole file set in one pass.
#[async_trait]
pub trait BatchLinter: Send + Sync {
    async fn lint_batch(
        &self,
        token: &CancellationToken,
        files: &BTreeMap<PathBuf, Bytes>,
    ) -> anyhow::Result<BTreeMap<PathBuf, LintResult>>;
}
