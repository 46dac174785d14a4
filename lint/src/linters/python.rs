//! Python analyzer.
//!
//! Prefers `ruff` (JSON output over stdin) and falls back to a plain
//! `python3` AST parse when ruff is not installed. Either way the source
//! is piped, so pre-tool-use content never has to touch the disk.

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
use super::run_tool;
use crate::linter::Issue;
use crate::linter::LintResult;
use crate::linter::Linter;
use crate::linter::Severity;

static RUFF: Lazy<Option<PathBuf>> = Lazy::new(|| which::which("ruff").ok());
static PYTHON: Lazy<Option<PathBuf>> = Lazy::new(|| which::which("python3").ok());

const AST_CHECK: &str =
    "import ast, sys; ast.parse(sys.stdin.buffer.read().decode('utf-8'), '<stdin>')";

#[derive(Debug, Clone, Default)]
struct PythonConfig {
    select: Vec<String>,
    ignore: Vec<String>,
    timeout: Option<ConfigDuration>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PythonConfigPatch {
    select: Option<Vec<String>>,
    ignore: Option<Vec<String>>,
    timeout: Option<ConfigDuration>,
}

/// One ruff finding in `--output-format json`.
#[derive(Debug, Deserialize)]
struct RuffDiagnostic {
    code: Option<String>,
    message: String,
    location: RuffLocation,
}

#[derive(Debug, Deserialize)]
struct RuffLocation {
    row: usize,
    column: usize,
}

pub struct PythonLinter {
    config: RwLock<PythonConfig>,
}

impl PythonLinter {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(PythonConfig::default()),
        }
    }

    async fn run_ruff(
        &self,
        token: &CancellationToken,
        ruff: &Path,
        path: &Path,
        content: &[u8],
    ) -> anyhow::Result<LintResult> {
        let config = self
            .config
            .read()
            .expect("Failed to acquire python config lock")
            .clone();
        let timeout = config
            .timeout
            .map(|t| t.as_duration())
            .unwrap_or(DEFAULT_TOOL_TIMEOUT);

        let mut command = Command::new(ruff);
        command
            .arg("check")
            .arg("--output-format")
            .arg("json")
            .arg("--stdin-filename")
            .arg(path);
        if !config.select.is_empty() {
            command.arg("--select").arg(config.select.join(","));
        }
        if !config.ignore.is_empty() {
            command.arg("--ignore").arg(config.ignore.join(","));
        }
        command.arg("-");

        let output = run_tool(token, timeout, command, Some(content)).await?;

        // Exit 0: clean. Exit 1: violations on stdout. Anything else is a
        // tool failure.
        let code = output.status.code().unwrap_or(-1);
        if code != 0 && code != 1 {
            anyhow::bail!(
                "ruff failed with exit code {code}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let diagnostics: Vec<RuffDiagnostic> =
            serde_json::from_slice(&output.stdout).unwrap_or_default();

        let file = path.to_string_lossy().into_owned();
        let issues = diagnostics
            .into_iter()
            .map(|diag| {
                // Syntax errors come back without a code; E9xx are the
                // pycodestyle runtime-error class. Both block.
                let severity = match &diag.code {
                    None => Severity::Error,
                    Some(code) if code.starts_with("E9") => Severity::Error,
                    Some(_) => Severity::Warning,
                };
                Issue {
                    file: file.clone(),
                    line: diag.location.row.max(1),
                    column: diag.location.column.max(1),
                    severity,
                    message: diag.message,
                    rule: diag.code.unwrap_or_else(|| "syntax".to_string()),
                }
            })
            .collect();

        Ok(LintResult::from_issues(issues))
    }

    async fn run_ast_check(
        &self,
        token: &CancellationToken,
        python: &Path,
        path: &Path,
        content: &[u8],
    ) -> anyhow::Result<LintResult> {
        let timeout = self
            .config
            .read()
            .expect("Failed to acquire python config lock")
            .timeout
            .map(|t| t.as_duration())
            .unwrap_or(DEFAULT_TOOL_TIMEOUT);

        let mut command = Command::new(python);
        command.arg("-c").arg(AST_CHECK);
        let output = run_tool(token, timeout, command, Some(content)).await?;

        if output.status.success() {
            return Ok(LintResult::clean());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let line = stderr
            .lines()
            .rev()
            .find_map(|l| {
                let rest = l.trim().strip_prefix("File \"<stdin>\", line ")?;
                rest.split(|c: char| !c.is_ascii_digit())
                    .next()?
                    .parse::<usize>()
                    .ok()
            })
            .unwrap_or(1);
        let message = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("syntax error")
            .trim()
            .to_string();

        Ok(LintResult::from_issues(vec![Issue {
            file: path.to_string_lossy().into_owned(),
            line,
            column: 1,
            severity: Severity::Error,
            message,
            rule: "syntax".to_string(),
        }]))
    }
}

impl Default for PythonLinter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Linter for PythonLinter {
    fn name(&self) -> &str {
        "python"
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "py")
    }

    async fn lint(
        &self,
        token: &CancellationToken,
        path: &Path,
        content: &[u8],
    ) -> anyhow::Result<LintResult> {
        if let Some(ruff) = RUFF.as_ref() {
            return self.run_ruff(token, ruff, path, content).await;
        }
        if let Some(python) = PYTHON.as_ref() {
            return self.run_ast_check(token, python, path, content).await;
        }
        anyhow::bail!("no python analyzer found in PATH (ruff or python3)")
    }

    fn set_config(&self, config: &serde_json::Value) -> anyhow::Result<()> {
        let patch: PythonConfigPatch = serde_json::from_value(config.clone())?;
        let mut current = self
            .config
            .write()
            .expect("Failed to acquire python config lock");
        if let Some(select) = patch.select {
            current.select = select;
        }
        if let Some(ignore) = patch.ignore {
            current.ignore = ignore;
        }
        if let Some(timeout) = patch.timeout {
            current.timeout = Some(timeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain_available() -> bool {
        RUFF.is_some() || PYTHON.is_some()
    }

    #[test]
    fn test_can_handle() {
        let linter = PythonLinter::new();
        assert!(linter.can_handle(Path::new("app.py")));
        assert!(!linter.can_handle(Path::new("app.pyc")));
        assert!(!linter.can_handle(Path::new("app.go")));
    }

    #[test]
    fn test_config_patch() {
        let linter = PythonLinter::new();
        linter
            .set_config(&serde_json::json!({"select": ["E", "F"], "timeout": "10s"}))
            .unwrap();
        linter.set_config(&serde_json::json!({"ignore": ["E501"]})).unwrap();

        let config = linter
            .config
            .read()
            .unwrap()
            .clone();
        assert_eq!(config.select, vec!["E", "F"]);
        assert_eq!(config.ignore, vec!["E501"]);
        assert!(config.timeout.is_some());
    }

    #[tokio::test]
    async fn test_clean_source() {
        if !toolchain_available() {
            return;
        }
        let linter = PythonLinter::new();
        let result = linter
            .lint(
                &CancellationToken::new(),
                Path::new("app.py"),
                b"def main():\n    return 1\n",
            )
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_syntax_error_blocks() {
        if !toolchain_available() {
            return;
        }
        let linter = PythonLinter::new();
        let result = linter
            .lint(
                &CancellationToken::new(),
                Path::new("app.py"),
                b"def main(:\n",
            )
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.issues[0].severity, Severity::Error);
    }
}
