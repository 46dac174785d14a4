//! Hook message handler.
//!
//! The handler owns the pluggable rule engine and the "last event kind"
//! marker the executor consults for its exit-code decision. Although the
//! process handles exactly one message per invocation, the handler is
//! exposed as a library and must stay safe under concurrent calls: the
//! engine can be swapped while messages are in flight, so both fields sit
//! behind reader-writer locks.

use std::sync::Arc;
use std::sync::RwLock;

use gismo_protocol::HookEventName;
use gismo_protocol::HookMessage;
use gismo_protocol::HookResponse;
use gismo_protocol::codec;
use gismo_protocol::codec::CodecError;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

use crate::engine::RuleEngine;
use crate::engine::evaluate;
use crate::registry::HookRegistry;

/// Handler failures.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("failed to parse hook message: {0}")]
    Parse(#[from] CodecError),

    /// Unreachable while the message union stays closed; kept because the
    /// dispatch contract names it.
    #[error("unknown message type")]
    UnknownMessage,

    #[error("rule evaluation failed: {0}")]
    Evaluation(#[source] anyhow::Error),

    #[error("no rule engine configured")]
    NoRuleEngine,

    #[error("hook I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Dispatches decoded messages to the configured rule engine.
pub struct Handler {
    engine: RwLock<Option<Arc<dyn RuleEngine>>>,
    registry: Arc<HookRegistry>,
    last_event: RwLock<Option<HookEventName>>,
}

impl Handler {
    pub fn new(engine: Arc<dyn RuleEngine>) -> Self {
        Self {
            engine: RwLock::new(Some(engine)),
            registry: Arc::new(HookRegistry::default()),
            last_event: RwLock::new(None),
        }
    }

    /// Handler with no engine; every dispatch fails until one is set.
    pub fn unconfigured() -> Self {
        Self {
            engine: RwLock::new(None),
            registry: Arc::new(HookRegistry::default()),
            last_event: RwLock::new(None),
        }
    }

    pub fn with_registry(mut self, registry: Arc<HookRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Swap the rule engine. Permitted concurrently with dispatch.
    pub fn set_rule_engine(&self, engine: Arc<dyn RuleEngine>) {
        *self
            .engine
            .write()
            .expect("Failed to acquire engine lock") = Some(engine);
    }

    /// The declarative hook inventory. Dispatch never consults it.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// Event kind of the most recently dispatched message.
    pub fn last_event(&self) -> Option<HookEventName> {
        *self
            .last_event
            .read()
            .expect("Failed to acquire last-event lock")
    }

    /// Dispatch one decoded message to the engine.
    ///
    /// The event kind is recorded before the engine runs so the executor
    /// observes it even when evaluation fails.
    pub async fn process_message(
        &self,
        message: &HookMessage,
    ) -> Result<Option<HookResponse>, HandlerError> {
        *self
            .last_event
            .write()
            .expect("Failed to acquire last-event lock") = Some(message.event_name());

        let engine = self
            .engine
            .read()
            .expect("Failed to acquire engine lock")
            .clone()
            .ok_or(HandlerError::NoRuleEngine)?;

        tracing::debug!(event = %message.event_name(), "dispatching hook message");

        evaluate(engine.as_ref(), message)
            .await
            .map_err(HandlerError::Evaluation)
    }

    /// Read one message from `reader`, dispatch it, and write any response
    /// carrying feedback to `writer` as a newline-terminated JSON line.
    pub async fn process<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<Option<HookResponse>, HandlerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut input = Vec::new();
        reader.read_to_end(&mut input).await?;

        let message = codec::decode_message(&input)?;
        let response = self.process_message(&message).await?;

        if let Some(response) = &response
            && response.has_feedback()
        {
            let line = codec::encode_response(response)?;
            writer.write_all(&line).await?;
            writer.flush().await?;
        }

        Ok(response)
    }
}
