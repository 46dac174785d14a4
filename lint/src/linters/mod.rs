//! Shipped analyzers.
//!
//! Go and Python wrap their language toolchains as subprocesses; JSON and
//! Markdown are native. Each analyzer keeps its configuration behind a
//! reader-writer lock and accepts patch-style blobs through `set_config`:
//! present keys override, absent keys keep their current value.

pub mod golang;
pub mod json;
pub mod markdown;
pub mod python;

pub use golang::GoLinter;
pub use json::JsonLinter;
pub use markdown::MarkdownLinter;
pub use python::PythonLinter;

use std::process::Stdio;
use std::time::Duration;

use anyhow::Context as _;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Default per-tool timeout when the analyzer config does not set one.
pub(crate) const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a toolchain subprocess bound to the cancellation token.
///
/// The child is spawned `kill_on_drop`, so both cancellation and timeout
/// tear it down when this future is dropped.
pub(crate) async fn run_tool(
    token: &CancellationToken,
    timeout: Duration,
    mut command: Command,
    stdin_data: Option<&[u8]>,
) -> anyhow::Result<std::process::Output> {
    let program = format!("{:?}", command.as_std().get_program());

    command
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    if let Some(data) = stdin_data
        && let Some(mut stdin) = child.stdin.take()
    {
        stdin
            .write_all(data)
            .await
            .with_context(|| format!("failed to write {program} stdin"))?;
        drop(stdin);
    }

    tokio::select! {
        _ = token.cancelled() => anyhow::bail!("lint canceled"),
        result = tokio::time::timeout(timeout, child.wait_with_output()) => match result {
            Err(_) => anyhow::bail!("{program} timed out after {timeout:?}"),
            Ok(output) => output.with_context(|| format!("failed to run {program}")),
        },
    }
}

/// Parse a `prefix:line:col: message` diagnostic line.
///
/// Returns `(line, column, message)`; the prefix (file name or
/// `<standard input>`) is discarded.
pub(crate) fn parse_line_col(diagnostic: &str) -> Option<(usize, usize, String)> {
    let mut parts = diagnostic.splitn(4, ':');
    let _prefix = parts.next()?;
    let line = parts.next()?.trim().parse::<usize>().ok()?;
    let column = parts.next()?.trim().parse::<usize>().ok()?;
    let message = parts.next()?.trim().to_string();
    if message.is_empty() {
        return None;
    }
    Some((line, column, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_col() {
        assert_eq!(
            parse_line_col("<standard input>:2:14: expected '}', found 'EOF'"),
            Some((2, 14, "expected '}', found 'EOF'".to_string()))
        );
        assert_eq!(
            parse_line_col("x.go:10:1: undefined: foo"),
            Some((10, 1, "undefined: foo".to_string()))
        );
        assert_eq!(parse_line_col("no positions here"), None);
        assert_eq!(parse_line_col("x.go:abc:1: msg"), None);
    }

    #[tokio::test]
    async fn test_run_tool_captures_output() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("cat; echo done");

        let output = run_tool(
            &CancellationToken::new(),
            Duration::from_secs(5),
            command,
            Some(b"hello "),
        )
        .await
        .unwrap();

        assert!(output.status.success());
        assert_eq!(output.stdout, b"hello done\n");
    }

    #[tokio::test]
    async fn test_run_tool_timeout() {
        let mut command = Command::new("sleep");
        command.arg("5");

        let err = run_tool(
            &CancellationToken::new(),
            Duration::from_millis(50),
            command,
            None,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_run_tool_cancellation() {
        let token = CancellationToken::new();
        token.cancel();

        let mut command = Command::new("sleep");
        command.arg("5");

        let err = run_tool(&token, Duration::from_secs(5), command, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("canceled"));
    }
}
