//! The linting rule engine.
//!
//! Production rule engine behind the hook binary. Pre-tool-use lints the
//! content a `Write` is about to put on disk and blocks on error-severity
//! findings; post-tool-use reads the written file back from disk and
//! reports, relying on the executor's forced exit-code-2 rule to surface
//! stderr. The other four events are silently approved.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use gismo_config::GismoConfig;
use gismo_config::rules_for;
use gismo_hooks::RuleEngine;
use gismo_protocol::HookResponse;
use gismo_protocol::NotificationMessage;
use gismo_protocol::PostToolUseMessage;
use gismo_protocol::PreCompactMessage;
use gismo_protocol::PreToolUseMessage;
use gismo_protocol::StopMessage;
use gismo_protocol::SubagentStopMessage;
use tokio_util::sync::CancellationToken;

use crate::format;
use crate::format::format_diagnostics;
use crate::linter::Issue;
use crate::linter::Linter;
use crate::linter::Severity;
use crate::linters::GoLinter;
use crate::linters::JsonLinter;
use crate::linters::MarkdownLinter;
use crate::linters::PythonLinter;
use crate::parallel::AggregateOutcome;
use crate::parallel::ParallelExecutor;
use crate::parallel::aggregate_results;

/// Tools whose input carries file content worth linting.
const LINT_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Rule engine that fans file content out over the analyzer set.
pub struct LintEngine {
    linters: Vec<Arc<dyn Linter>>,
    executor: ParallelExecutor,
    config: GismoConfig,
}

impl LintEngine {
    /// Engine with the default analyzer set (Go, JSON, Markdown, Python).
    pub fn new(config: GismoConfig) -> Self {
        let defaults: Vec<Arc<dyn Linter>> = vec![
            Arc::new(GoLinter::new()),
            Arc::new(JsonLinter::new()),
            Arc::new(MarkdownLinter::new()),
            Arc::new(PythonLinter::new()),
        ];
        Self::with_linters(config, defaults)
    }

    /// Engine with an explicit analyzer set.
    pub fn with_linters(config: GismoConfig, linters: Vec<Arc<dyn Linter>>) -> Self {
        let executor = ParallelExecutor::new(config.effective_max_workers());
        let mut engine = Self {
            linters: Vec::new(),
            executor,
            config,
        };
        for linter in linters {
            engine.add_linter(linter);
        }
        engine
    }

    /// Append an analyzer, honoring enablement and applying its base
    /// configuration blob.
    pub fn add_linter(&mut self, linter: Arc<dyn Linter>) {
        if !self.config.is_linter_enabled(linter.name()) {
            tracing::debug!(linter = linter.name(), "linter disabled by configuration");
            return;
        }
        if let Some(blob) = self.config.linter_config(linter.name())
            && let Err(err) = linter.set_config(blob)
        {
            tracing::warn!(linter = linter.name(), %err, "linter rejected its configuration");
        }
        self.linters.push(linter);
    }

    pub fn linters(&self) -> &[Arc<dyn Linter>] {
        &self.linters
    }

    pub fn config(&self) -> &GismoConfig {
        &self.config
    }

    /// Push matching rule overrides into every analyzer.
    ///
    /// Runs on the dispatching task while no workers exist; workers then
    /// read analyzer configuration without synchronization.
    fn apply_rule_overrides(&self, path: &Path) {
        for linter in &self.linters {
            if let Some(rules) = rules_for(&self.config, path, linter.name())
                && let Err(err) = linter.set_config(&rules)
            {
                tracing::warn!(linter = linter.name(), %err, "linter rejected a rule override");
            }
        }
    }

    async fn lint_file(&self, path: &Path, content: Bytes) -> AggregateOutcome {
        self.apply_rule_overrides(path);
        let token = CancellationToken::new();
        let results = self
            .executor
            .execute_for_file(&token, &self.linters, path, &content)
            .await;
        aggregate_results(results)
    }

    /// Post-tool-use reporting for one on-disk file.
    async fn report_file(&self, path: &Path, content: Bytes) {
        let outcome = self.lint_file(path, content).await;

        for error in &outcome.errors {
            emit_line(&format!(
                "{} ⚠️ lint execution failed: {error:#}",
                format::TAG
            ));
        }

        let (errors, warnings) = partition_issues(outcome.result.issues);
        if !errors.is_empty() {
            emit(&format_diagnostics(path, &errors, true));
        } else if !warnings.is_empty() {
            emit(&format_diagnostics(path, &warnings, false));
        } else if outcome.errors.is_empty() {
            emit_line(format::CLEAN_MESSAGE);
        }

        if let Some(test_output) = &outcome.result.test_output {
            emit_line(test_output);
        }
    }
}

#[async_trait]
impl RuleEngine for LintEngine {
    async fn pre_tool_use(&self, msg: &PreToolUseMessage) -> anyhow::Result<Option<HookResponse>> {
        if !LINT_TOOLS.contains(&msg.tool_name.as_str()) {
            return Ok(Some(HookResponse::approve("approved")));
        }

        // Edit and MultiEdit patch existing files; the resulting content
        // does not exist until after the operation.
        if msg.tool_name != "Write" {
            return Ok(Some(HookResponse::approve("approved")));
        }

        // Malformed hook input is the host's bug, never a reason to block.
        let Some((path, content)) = write_params(&msg.tool_input) else {
            return Ok(Some(HookResponse::approve("approved")));
        };

        let outcome = self.lint_file(&path, Bytes::from(content)).await;

        if let Some(error) = outcome.errors.first() {
            let reason = format!("lint execution failed: {error:#}");
            emit_line(&format!("{} ❌ {reason}", format::TAG));
            return Ok(Some(HookResponse::block(reason)));
        }

        let (errors, warnings) = partition_issues(outcome.result.issues);

        if !errors.is_empty() {
            emit(&format_diagnostics(&path, &errors, true));
            return Ok(Some(HookResponse::block(format!(
                "Found {} blocking issue(s) in {}",
                errors.len(),
                path.display()
            ))));
        }

        if !warnings.is_empty() {
            emit(&format_diagnostics(&path, &warnings, false));
            let mut response = HookResponse::approve("approved");
            response.message = Some(format!(
                "Found {} warning(s) in {}",
                warnings.len(),
                path.display()
            ));
            return Ok(Some(response));
        }

        emit_line(format::CLEAN_MESSAGE);
        Ok(Some(HookResponse::approve("approved")))
    }

    async fn post_tool_use(
        &self,
        msg: &PostToolUseMessage,
    ) -> anyhow::Result<Option<HookResponse>> {
        // Always an empty response: the executor exits 2 for PostToolUse
        // regardless, which is what surfaces the stderr written here.
        let empty = HookResponse::default();

        if !LINT_TOOLS.contains(&msg.tool_name.as_str()) {
            emit_line(format::SKIP_MESSAGE);
            return Ok(Some(empty));
        }

        if !msg.tool_error.is_empty() {
            emit_line(&format!(
                "{} ℹ️ Tool reported an error; nothing to lint.",
                format::TAG
            ));
            return Ok(Some(empty));
        }

        let Some(path) = msg.tool_input.get("file_path").and_then(|v| v.as_str()) else {
            emit_line(format::SKIP_MESSAGE);
            return Ok(Some(empty));
        };
        let path = PathBuf::from(path);

        // The payload does not carry the written content; the disk is
        // authoritative. A missing file means nothing to lint.
        let content = match tokio::fs::read(&path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                emit_line(format::SKIP_MESSAGE);
                return Ok(Some(empty));
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to read written file");
                emit_line(&format!(
                    "{} ⚠️ Could not read {}: {err}",
                    format::TAG,
                    path.display()
                ));
                return Ok(Some(empty));
            }
        };

        self.report_file(&path, content).await;

        // A non-test Go source drags its sibling test file into the report.
        if let Some(test_path) = go_test_sibling(&path)
            && let Ok(bytes) = tokio::fs::read(&test_path).await
        {
            self.report_file(&test_path, Bytes::from(bytes)).await;
        }

        Ok(Some(empty))
    }

    async fn notification(
        &self,
        _msg: &NotificationMessage,
    ) -> anyhow::Result<Option<HookResponse>> {
        Ok(None)
    }

    async fn stop(&self, _msg: &StopMessage) -> anyhow::Result<Option<HookResponse>> {
        Ok(None)
    }

    async fn subagent_stop(
        &self,
        _msg: &SubagentStopMessage,
    ) -> anyhow::Result<Option<HookResponse>> {
        Ok(None)
    }

    async fn pre_compact(&self, _msg: &PreCompactMessage) -> anyhow::Result<Option<HookResponse>> {
        Ok(None)
    }
}

/// Extract `file_path` and `content` from Write tool input.
fn write_params(input: &serde_json::Map<String, serde_json::Value>) -> Option<(PathBuf, String)> {
    let path = input.get("file_path")?.as_str()?;
    let content = input.get("content")?.as_str()?;
    Some((PathBuf::from(path), content.to_string()))
}

/// Split findings into the blocking and non-blocking buckets. Info-severity
/// findings ride with the warnings.
fn partition_issues(issues: Vec<Issue>) -> (Vec<Issue>, Vec<Issue>) {
    issues
        .into_iter()
        .partition(|issue| issue.severity == Severity::Error)
}

/// Sibling `<stem>_test.go` for a non-test Go source, when it exists.
fn go_test_sibling(path: &Path) -> Option<PathBuf> {
    if path.extension().is_none_or(|ext| ext != "go") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.ends_with("_test") {
        return None;
    }
    let sibling = path.with_file_name(format!("{stem}_test.go"));
    sibling.exists().then_some(sibling)
}

fn emit(text: &str) {
    eprint!("{text}");
}

fn emit_line(text: &str) {
    eprintln!("{text}");
}
