//! Stderr diagnostic formatting.
//!
//! All user-visible text funnels through here so the host-facing contract
//! lives in one place: one `file:line:col: message (rule)` line per issue,
//! a severity-dependent footer, and the fixed clean/skip lines.

use std::path::Path;

use crate::linter::Issue;

/// Prefix on the fixed status lines.
pub const TAG: &str = "- [ccfeedback]:";

/// Emitted when every analyzer came back clean.
pub const CLEAN_MESSAGE: &str = "- [ccfeedback]: ✅ Style clean. Continue with your task.";

/// Emitted for tool calls that carry no lintable file.
pub const SKIP_MESSAGE: &str = "- [ccfeedback]: ℹ️ No file changes to lint.";

/// Render one diagnostic block for a file.
///
/// `blocking` selects the footer: a hard "fix all above" for
/// error-severity findings, a softer note for warnings.
pub fn format_diagnostics(file: &Path, issues: &[Issue], blocking: bool) -> String {
    let mut out = String::new();
    let display = display_path(file);

    for issue in issues {
        let file = if issue.file.is_empty() {
            display.as_str()
        } else {
            issue.file.as_str()
        };
        out.push_str(&format!(
            "{}:{}:{}: {} ({})\n",
            strip_cwd(file),
            issue.line,
            issue.column,
            issue.message,
            issue.rule
        ));
    }

    if blocking {
        out.push_str(&format!(
            "❌ Found {} blocking issue(s) — fix all above\n",
            issues.len()
        ));
    } else {
        out.push_str(&format!(
            "⚠️ Found {} warning(s) — consider fixing\n",
            issues.len()
        ));
    }

    out
}

/// File path as shown to the user: relative to the working directory when
/// it sits beneath it.
fn display_path(path: &Path) -> String {
    strip_cwd(&path.to_string_lossy())
}

fn strip_cwd(path: &str) -> String {
    if let Ok(cwd) = std::env::current_dir() {
        let prefix = format!("{}/", cwd.to_string_lossy());
        if let Some(stripped) = path.strip_prefix(&prefix) {
            return stripped.to_string();
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linter::Severity;

    fn issue(line: usize, message: &str, rule: &str) -> Issue {
        Issue {
            file: "x.go".to_string(),
            line,
            column: 1,
            severity: Severity::Error,
            message: message.to_string(),
            rule: rule.to_string(),
        }
    }

    #[test]
    fn test_blocking_block_format() {
        let issues = vec![
            issue(1, "syntax error", "syntax"),
            issue(4, "undefined: foo", "typecheck"),
        ];

        let block = format_diagnostics(Path::new("x.go"), &issues, true);
        assert!(block.contains("x.go:1:1: syntax error (syntax)\n"));
        assert!(block.contains("x.go:4:1: undefined: foo (typecheck)\n"));
        assert!(block.contains("❌ Found 2 blocking issue(s)"));
    }

    #[test]
    fn test_warning_footer() {
        let issues = vec![issue(2, "line too long", "line-length")];
        let block = format_diagnostics(Path::new("doc.md"), &issues, false);
        assert!(block.contains("⚠️ Found 1 warning(s)"));
        assert!(!block.contains("❌"));
    }

    #[test]
    fn test_issue_without_file_falls_back_to_path() {
        let mut orphan = issue(3, "oops", "r");
        orphan.file = String::new();

        let block = format_diagnostics(Path::new("lib.py"), &[orphan], true);
        assert!(block.contains("lib.py:3:1: oops (r)"));
    }

    #[test]
    fn test_cwd_prefix_stripped() {
        let cwd = std::env::current_dir().unwrap();
        let absolute = cwd.join("pkg").join("x.go");
        let mut abs_issue = issue(1, "m", "r");
        abs_issue.file = absolute.to_string_lossy().into_owned();

        let block = format_diagnostics(&absolute, &[abs_issue], true);
        assert!(block.starts_with("pkg/x.go:1:1:"));
    }
}
