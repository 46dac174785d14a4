//! Hook executor.
//!
//! Bounds one handler run with a timeout and translates the outcome into
//! the exit-code contract. Two channels reach the host: the JSON response on
//! stdout (rich, optional) and the exit code (crude, always observed).

use std::sync::Arc;
use std::time::Duration;

use gismo_protocol::HookEventName;
use gismo_protocol::HookResponse;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;

use crate::handler::Handler;
use crate::handler::HandlerError;

/// Approve / silent success.
pub const EXIT_SUCCESS: i32 = 0;
/// Infrastructural failure.
pub const EXIT_FAILURE: i32 = 1;
/// Blocking; the host must surface stderr.
pub const EXIT_BLOCKING: i32 = 2;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Executor failures. Every variant maps to exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("hook processing timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Handler(#[from] HandlerError),
}

/// Runs a handler once and produces an exit code.
pub struct HookExecutor {
    handler: Arc<Handler>,
    timeout: Duration,
}

impl HookExecutor {
    pub fn new(handler: Arc<Handler>) -> Self {
        Self {
            handler,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    /// Read one message, dispatch it, and translate the outcome.
    ///
    /// PostToolUse always exits 2 when the handler succeeded, regardless of
    /// the engine's decision. Hosts suppress hook stderr unless the process
    /// signals blocking, and PostToolUse diagnostics must reach the user.
    pub async fn execute<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<i32, ExecutorError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let response = tokio::time::timeout(self.timeout, self.handler.process(reader, writer))
            .await
            .map_err(|_| ExecutorError::Timeout(self.timeout))??;

        if self.handler.last_event() == Some(HookEventName::PostToolUse) {
            return Ok(EXIT_BLOCKING);
        }

        if response.as_ref().is_some_and(HookResponse::is_blocking) {
            return Ok(EXIT_BLOCKING);
        }

        Ok(EXIT_SUCCESS)
    }
}

/// Failure of one executor in a chain, tagged with its position.
#[derive(Debug, thiserror::Error)]
#[error("hook executor {index} failed: {source}")]
pub struct ChainError {
    pub index: usize,
    #[source]
    pub source: ExecutorError,
}

/// Runs a sequence of executors in order over a shared stream pair.
///
/// Library surface for multi-hook hosts; the default binary runs a single
/// executor.
pub struct ChainExecutor {
    executors: Vec<HookExecutor>,
}

impl ChainExecutor {
    pub fn new(executors: Vec<HookExecutor>) -> Self {
        Self { executors }
    }

    /// Execute each stage in order, collecting exit codes.
    ///
    /// Stops at the first stage that fails and reports its index.
    pub async fn execute<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<Vec<i32>, ChainError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut codes = Vec::with_capacity(self.executors.len());
        for (index, executor) in self.executors.iter().enumerate() {
            match executor.execute(reader, writer).await {
                Ok(code) => codes.push(code),
                Err(source) => return Err(ChainError { index, source }),
            }
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BaseRuleEngine;
    use crate::engine::RuleEngine;
    use async_trait::async_trait;
    use gismo_protocol::NotificationMessage;
    use gismo_protocol::PostToolUseMessage;
    use gismo_protocol::PreCompactMessage;
    use gismo_protocol::PreToolUseMessage;
    use gismo_protocol::StopMessage;
    use gismo_protocol::SubagentStopMessage;

    struct SlowEngine;

    #[async_trait]
    impl RuleEngine for SlowEngine {
        async fn pre_tool_use(
            &self,
            _msg: &PreToolUseMessage,
        ) -> anyhow::Result<Option<HookResponse>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }

        async fn post_tool_use(
            &self,
            _msg: &PostToolUseMessage,
        ) -> anyhow::Result<Option<HookResponse>> {
            Ok(None)
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

        async fn pre_compact(
            &self,
            _msg: &PreCompactMessage,
        ) -> anyhow::Result<Option<HookResponse>> {
            Ok(None)
        }
    }

    fn executor() -> HookExecutor {
        HookExecutor::new(Arc::new(Handler::new(Arc::new(BaseRuleEngine))))
    }

    #[tokio::test]
    async fn test_pre_tool_use_approve_exits_zero() {
        let input =
            br#"{"hook_event_name":"PreToolUse","session_id":"s","tool_name":"Read","tool_input":{}}"#;
        let mut out = Vec::new();

        let code = executor().execute(&mut &input[..], &mut out).await.unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_post_tool_use_always_exits_blocking() {
        let input = br#"{"hook_event_name":"PostToolUse","session_id":"s","tool_name":"Bash","tool_input":{}}"#;
        let mut out = Vec::new();

        let code = executor().execute(&mut &input[..], &mut out).await.unwrap();
        assert_eq!(code, EXIT_BLOCKING);
        // No feedback from the base engine, so stdout stays empty.
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let mut out = Vec::new();
        let err = executor()
            .execute(&mut &b"{broken"[..], &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Handler(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let input =
            br#"{"hook_event_name":"PreToolUse","session_id":"s","tool_name":"Write","tool_input":{}}"#;
        let executor = HookExecutor::new(Arc::new(Handler::new(Arc::new(SlowEngine))))
            .with_timeout(Duration::from_millis(50));

        let mut out = Vec::new();
        let err = executor
            .execute(&mut &input[..], &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_chain_reports_failing_index() {
        let chain = ChainExecutor::new(vec![executor(), executor()]);

        // First message parses, second stage hits end-of-stream junk.
        let input = br#"{"hook_event_name":"Stop","session_id":"s"}"#.to_vec();
        let mut reader = &input[..];
        let mut out = Vec::new();

        let err = chain.execute(&mut reader, &mut out).await.unwrap_err();
        // The stream is exhausted after stage 0 consumed it, so stage 1
        // fails to parse an empty input.
        assert_eq!(err.index, 1);
    }
}
