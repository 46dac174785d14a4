//! Rule engine contract.
//!
//! A rule engine exposes one evaluator per event kind. Each evaluator
//! returns `Ok(None)` for "no opinion", `Ok(Some(response))` for feedback,
//! or an error the caller cannot interpret as a decision.

use async_trait::async_trait;
use gismo_protocol::HookMessage;
use gismo_protocol::HookResponse;
use gismo_protocol::NotificationMessage;
use gismo_protocol::PostToolUseMessage;
use gismo_protocol::PreCompactMessage;
use gismo_protocol::PreToolUseMessage;
use gismo_protocol::StopMessage;
use gismo_protocol::SubagentStopMessage;
use std::sync::Arc;

/// Strategy object evaluated by the handler, one method per event kind.
#[async_trait]
pub trait RuleEngine: Send + Sync {
    async fn pre_tool_use(&self, msg: &PreToolUseMessage) -> anyhow::Result<Option<HookResponse>>;

    async fn post_tool_use(&self, msg: &PostToolUseMessage)
    -> anyhow::Result<Option<HookResponse>>;

    async fn notification(&self, msg: &NotificationMessage)
    -> anyhow::Result<Option<HookResponse>>;

    async fn stop(&self, msg: &StopMessage) -> anyhow::Result<Option<HookResponse>>;

    async fn subagent_stop(
        &self,
        msg: &SubagentStopMessage,
    ) -> anyhow::Result<Option<HookResponse>>;

    async fn pre_compact(&self, msg: &PreCompactMessage) -> anyhow::Result<Option<HookResponse>>;
}

/// Dispatch a decoded message to the matching engine method.
///
/// The match is exhaustive over the closed message union, so adding an event
/// kind is a compile error here rather than a silent fall-through.
pub async fn evaluate(
    engine: &dyn RuleEngine,
    message: &HookMessage,
) -> anyhow::Result<Option<HookResponse>> {
    match message {
        HookMessage::PreToolUse(msg) => engine.pre_tool_use(msg).await,
        HookMessage::PostToolUse(msg) => engine.post_tool_use(msg).await,
        HookMessage::Notification(msg) => engine.notification(msg).await,
        HookMessage::Stop(msg) => engine.stop(msg).await,
        HookMessage::SubagentStop(msg) => engine.subagent_stop(msg).await,
        HookMessage::PreCompact(msg) => engine.pre_compact(msg).await,
    }
}

/// Engine that approves every pre-tool-use and stays silent otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseRuleEngine;

#[async_trait]
impl RuleEngine for BaseRuleEngine {
    async fn pre_tool_use(&self, _msg: &PreToolUseMessage) -> anyhow::Result<Option<HookResponse>> {
        Ok(Some(HookResponse::approve("approved")))
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

    async fn pre_compact(&self, _msg: &PreCompactMessage) -> anyhow::Result<Option<HookResponse>> {
        Ok(None)
    }
}

/// Engine that chains an ordered sequence of inner engines.
///
/// Pre-tool-use returns the first blocking response; when nothing blocks it
/// synthesizes an approve. The other five methods return the first response
/// carrying feedback. Any inner error short-circuits and propagates.
pub struct CompositeRuleEngine {
    engines: Vec<Arc<dyn RuleEngine>>,
}

impl CompositeRuleEngine {
    pub fn new(engines: Vec<Arc<dyn RuleEngine>>) -> Self {
        Self { engines }
    }

    pub fn push(&mut self, engine: Arc<dyn RuleEngine>) {
        self.engines.push(engine);
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

#[async_trait]
impl RuleEngine for CompositeRuleEngine {
    async fn pre_tool_use(&self, msg: &PreToolUseMessage) -> anyhow::Result<Option<HookResponse>> {
        for engine in &self.engines {
            if let Some(response) = engine.pre_tool_use(msg).await?
                && response.is_blocking()
            {
                return Ok(Some(response));
            }
        }
        Ok(Some(HookResponse::approve("approved")))
    }

    async fn post_tool_use(
        &self,
        msg: &PostToolUseMessage,
    ) -> anyhow::Result<Option<HookResponse>> {
        for engine in &self.engines {
            if let Some(response) = engine.post_tool_use(msg).await?
                && response.has_feedback()
            {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    async fn notification(
        &self,
        msg: &NotificationMessage,
    ) -> anyhow::Result<Option<HookResponse>> {
        for engine in &self.engines {
            if let Some(response) = engine.notification(msg).await?
                && response.has_feedback()
            {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    async fn stop(&self, msg: &StopMessage) -> anyhow::Result<Option<HookResponse>> {
        for engine in &self.engines {
            if let Some(response) = engine.stop(msg).await?
                && response.has_feedback()
            {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    async fn subagent_stop(
        &self,
        msg: &SubagentStopMessage,
    ) -> anyhow::Result<Option<HookResponse>> {
        for engine in &self.engines {
            if let Some(response) = engine.subagent_stop(msg).await?
                && response.has_feedback()
            {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    async fn pre_compact(&self, msg: &PreCompactMessage) -> anyhow::Result<Option<HookResponse>> {
        for engine in &self.engines {
            if let Some(response) = engine.pre_compact(msg).await?
                && response.has_feedback()
            {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}
