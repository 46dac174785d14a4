//! External hook runner.
//!
//! The parent side of the hook protocol: spawn a hook binary, pipe the
//! message JSON to its stdin, and interpret exit code plus streams the same
//! way the host interprets ours. Child exit 2 is a block carrying stderr,
//! not a failure.

use std::process::Stdio;
use std::time::Duration;

use gismo_protocol::HookMessage;
use gismo_protocol::HookResponse;
use gismo_protocol::codec;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Runner failures.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to spawn hook binary {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("hook binary I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode hook message: {0}")]
    Encode(#[from] gismo_protocol::CodecError),

    #[error("hook binary timed out after {0:?}")]
    Timeout(Duration),

    #[error("hook binary failed with exit code {code}: {stderr}")]
    Failed { code: i32, stderr: String },
}

/// Outcome of one external hook invocation.
#[derive(Debug)]
pub struct HookRunOutcome {
    pub exit_code: i32,
    /// Exit code 2 from the child.
    pub blocked: bool,
    /// Parsed stdout when the child emitted a response line.
    pub response: Option<HookResponse>,
    pub stdout: String,
    pub stderr: String,
}

/// Spawns external hook binaries over the stdin/stdout protocol.
#[derive(Debug, Clone)]
pub struct HookRunner {
    timeout: Duration,
}

impl Default for HookRunner {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

impl HookRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `program args...`, piping `message` to its stdin.
    ///
    /// The child is killed when the timeout elapses. Exit 0 yields an
    /// optional parsed response from stdout; exit 2 yields a block with the
    /// child's stderr; anything else is [`RunnerError::Failed`].
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        message: &HookMessage,
    ) -> Result<HookRunOutcome, RunnerError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let input = codec::encode_message(message)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&input).await?;
            drop(stdin);
        }

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RunnerError::Timeout(self.timeout))??;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        match exit_code {
            0 => {
                let trimmed = stdout.trim();
                let response = if trimmed.is_empty() {
                    None
                } else {
                    serde_json::from_str::<HookResponse>(trimmed).ok()
                };
                Ok(HookRunOutcome {
                    exit_code,
                    blocked: false,
                    response,
                    stdout,
                    stderr,
                })
            }
            2 => {
                tracing::debug!(program, "hook binary blocked");
                Ok(HookRunOutcome {
                    exit_code,
                    blocked: true,
                    response: None,
                    stdout,
                    stderr,
                })
            }
            code => Err(RunnerError::Failed {
                code,
                stderr: stderr.trim().to_string(),
            }),
        }
    }
}
