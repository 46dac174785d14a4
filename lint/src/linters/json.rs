//! JSON analyzer.
//!
//! Native: `serde_json` supplies syntax positions, and canonical
//! formatting (opt-in) produces the formatted bytes as data. Implements
//! the batch capability since a whole file set is one cheap pass.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::linter::BatchLinter;
use crate::linter::Issue;
use crate::linter::LintResult;
use crate::linter::Linter;
use crate::linter::Severity;

#[derive(Debug, Clone, Copy, Default)]
struct JsonConfig {
    /// Emit a formatting warning (plus formatted bytes) when the document
    /// is not in canonical pretty form.
    format: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct JsonConfigPatch {
    format: Option<bool>,
}

pub struct JsonLinter {
    config: RwLock<JsonConfig>,
}

impl JsonLinter {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(JsonConfig::default()),
        }
    }

    fn check(&self, path: &Path, content: &[u8]) -> LintResult {
        let file = path.to_string_lossy().into_owned();

        let value: serde_json::Value = match serde_json::from_slice(content) {
            Ok(value) => value,
            Err(err) => {
                return LintResult::from_issues(vec![Issue {
                    file,
                    line: err.line().max(1),
                    column: err.column().max(1),
                    severity: Severity::Error,
                    message: format!("invalid JSON: {err}"),
                    rule: "json-syntax".to_string(),
                }]);
            }
        };

        let format = self
            .config
            .read()
            .expect("Failed to acquire json config lock")
            .format;
        if !format {
            return LintResult::clean();
        }

        let mut pretty = match serde_json::to_vec_pretty(&value) {
            Ok(pretty) => pretty,
            Err(err) => {
                tracing::warn!(%err, "failed to re-serialize JSON document");
                return LintResult::clean();
            }
        };
        pretty.push(b'\n');

        if trim_trailing(content) == trim_trailing(&pretty) {
            return LintResult::clean();
        }

        LintResult::from_issues(vec![Issue {
            file,
            line: 1,
            column: 1,
            severity: Severity::Warning,
            message: "file is not canonically formatted".to_string(),
            rule: "json-format".to_string(),
        }])
        .with_formatted(pretty)
    }
}

impl Default for JsonLinter {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_trailing(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    while end > 0 && data[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    &data[..end]
}

#[async_trait]
impl Linter for JsonLinter {
    fn name(&self) -> &str {
        "json"
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "json")
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
        let patch: JsonConfigPatch = serde_json::from_value(config.clone())?;
        if let Some(format) = patch.format {
            self.config
                .write()
                .expect("Failed to acquire json config lock")
                .format = format;
        }
        Ok(())
    }

    fn as_batch(&self) -> Option<&dyn BatchLinter> {
        Some(self)
    }
}

#[async_trait]
impl BatchLinter for JsonLinter {
    async fn lint_batch(
        &self,
        token: &CancellationToken,
        files: &BTreeMap<PathBuf, Bytes>,
    ) -> anyhow::Result<BTreeMap<PathBuf, LintResult>> {
        let mut results = BTreeMap::new();
        for (path, content) in files {
            if token.is_cancelled() {
                anyhow::bail!("lint canceled");
            }
            results.insert(path.clone(), self.check(path, content));
        }
        Ok(results)
    }
}
