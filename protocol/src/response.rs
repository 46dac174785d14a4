//! Hook responses.

use serde::Deserialize;
use serde::Serialize;

/// Decision carried in a hook response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HookDecision {
    /// Approve the pending operation.
    Approve,
    /// Block the pending operation.
    Block,
}

/// Hook response (Claude Code format).
///
/// Every field is optional so that "unset" is distinguishable from an
/// explicit `false`. Hosts ignore fields they do not understand.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HookResponse {
    /// Whether the host should continue at all (tri-state).
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continue_execution: Option<bool>,

    #[serde(rename = "stopReason", default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    #[serde(
        rename = "suppressOutput",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub suppress_output: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<HookDecision>,

    /// Human-readable reason for the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Informational message for the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HookResponse {
    /// Response approving the pending operation.
    pub fn approve(reason: impl Into<String>) -> Self {
        Self {
            decision: Some(HookDecision::Approve),
            reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Response blocking the pending operation.
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            decision: Some(HookDecision::Block),
            reason: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Whether the pending operation is blocked.
    pub fn is_blocking(&self) -> bool {
        self.decision == Some(HookDecision::Block)
    }

    /// True iff any field is set.
    ///
    /// A response without feedback is treated as "no response" by composite
    /// engines and by the handler's stdout contract.
    pub fn has_feedback(&self) -> bool {
        self.continue_execution.is_some()
            || self.stop_reason.is_some()
            || self.suppress_output.is_some()
            || self.decision.is_some()
            || self.reason.is_some()
            || self.message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_has_no_feedback() {
        let resp = HookResponse::default();
        assert!(!resp.has_feedback());
        assert!(!resp.is_blocking());
    }

    #[test]
    fn test_block_builder() {
        let resp = HookResponse::block("bad file");
        assert!(resp.is_blocking());
        assert!(resp.has_feedback());
        assert_eq!(resp.reason.as_deref(), Some("bad file"));
    }

    #[test]
    fn test_wire_field_names() {
        let resp = HookResponse {
            continue_execution: Some(false),
            stop_reason: Some("halt".to_string()),
            suppress_output: Some(true),
            ..Default::default()
        };

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"continue\":false"));
        assert!(json.contains("\"stopReason\":\"halt\""));
        assert!(json.contains("\"suppressOutput\":true"));
    }

    #[test]
    fn test_unset_fields_not_serialized() {
        let json = serde_json::to_string(&HookResponse::approve("ok")).unwrap();
        assert!(!json.contains("continue"));
        assert!(!json.contains("suppressOutput"));
        assert_eq!(json, "{\"decision\":\"approve\",\"reason\":\"ok\"}");
    }
}
