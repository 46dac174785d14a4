//! Typed hook messages.
//!
//! Messages are a closed union over six event kinds. The wire format is a
//! JSON object whose `hook_event_name` field selects the variant; the
//! remaining keys are variant-specific. Unknown keys are ignored on both
//! levels so hosts can extend the format without breaking older hook
//! binaries.

use serde::Deserialize;
use serde::Serialize;

/// Hook event kinds (fully compatible with Claude Code).
///
/// These represent the points in the tool execution lifecycle where the
/// assistant invokes the hook process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HookEventName {
    /// Before tool execution
    PreToolUse,
    /// After tool execution
    PostToolUse,
    /// For system notifications
    Notification,
    /// When the main agent finishes responding
    Stop,
    /// When a subagent completes a task
    SubagentStop,
    /// Before context window compaction
    PreCompact,
}

impl HookEventName {
    /// The wire tag carried in `hook_event_name`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEventName::PreToolUse => "PreToolUse",
            HookEventName::PostToolUse => "PostToolUse",
            HookEventName::Notification => "Notification",
            HookEventName::Stop => "Stop",
            HookEventName::SubagentStop => "SubagentStop",
            HookEventName::PreCompact => "PreCompact",
        }
    }
}

impl std::fmt::Display for HookEventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded hook message.
///
/// Serialization is internally tagged by `hook_event_name`, matching the
/// wire format. Decoding goes through [`crate::codec::decode_message`], which
/// extracts the tag first so that an unknown event kind is reported as such
/// rather than as a generic JSON error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "hook_event_name")]
pub enum HookMessage {
    PreToolUse(PreToolUseMessage),
    PostToolUse(PostToolUseMessage),
    Notification(NotificationMessage),
    Stop(StopMessage),
    SubagentStop(SubagentStopMessage),
    PreCompact(PreCompactMessage),
}

impl HookMessage {
    /// The event kind of this message.
    pub fn event_name(&self) -> HookEventName {
        match self {
            HookMessage::PreToolUse(_) => HookEventName::PreToolUse,
            HookMessage::PostToolUse(_) => HookEventName::PostToolUse,
            HookMessage::Notification(_) => HookEventName::Notification,
            HookMessage::Stop(_) => HookEventName::Stop,
            HookMessage::SubagentStop(_) => HookEventName::SubagentStop,
            HookMessage::PreCompact(_) => HookEventName::PreCompact,
        }
    }

    /// Session identifier, common to every variant.
    pub fn session_id(&self) -> &str {
        match self {
            HookMessage::PreToolUse(m) => &m.session_id,
            HookMessage::PostToolUse(m) => &m.session_id,
            HookMessage::Notification(m) => &m.session_id,
            HookMessage::Stop(m) => &m.session_id,
            HookMessage::SubagentStop(m) => &m.session_id,
            HookMessage::PreCompact(m) => &m.session_id,
        }
    }

    /// Transcript path, common to every variant.
    pub fn transcript_path(&self) -> Option<&str> {
        match self {
            HookMessage::PreToolUse(m) => m.transcript_path.as_deref(),
            HookMessage::PostToolUse(m) => m.transcript_path.as_deref(),
            HookMessage::Notification(m) => m.transcript_path.as_deref(),
            HookMessage::Stop(m) => m.transcript_path.as_deref(),
            HookMessage::SubagentStop(m) => m.transcript_path.as_deref(),
            HookMessage::PreCompact(m) => m.transcript_path.as_deref(),
        }
    }
}

/// Payload for `PreToolUse`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PreToolUseMessage {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,

    #[serde(default)]
    pub tool_name: String,

    /// Raw tool parameters, keyed by parameter name.
    #[serde(default)]
    pub tool_input: serde_json::Map<String, serde_json::Value>,
}

/// Payload for `PostToolUse`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PostToolUseMessage {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,

    #[serde(default)]
    pub tool_name: String,

    #[serde(default)]
    pub tool_input: serde_json::Map<String, serde_json::Value>,

    /// Raw tool output; absent when the host does not capture it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<serde_json::Value>,

    /// Empty string means the tool succeeded.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_error: String,
}

/// Payload for `Notification`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NotificationMessage {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,

    #[serde(default)]
    pub notification_type: String,

    #[serde(default)]
    pub message: String,
}

/// Payload for `Stop`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StopMessage {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,

    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub final_message: String,
}

/// Payload for `SubagentStop`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SubagentStopMessage {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,

    #[serde(default)]
    pub subagent_id: String,

    #[serde(default)]
    pub subagent_name: String,

    #[serde(default)]
    pub result: String,
}

/// Payload for `PreCompact`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PreCompactMessage {
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,

    #[serde(default)]
    pub current_tokens: u64,

    #[serde(default)]
    pub target_tokens: u64,
}
