//! Message codec.
//!
//! Decoding extracts the `hook_event_name` tag first and then dispatches to
//! the matching variant parser, so a missing or unrecognized tag surfaces as
//! [`CodecError::UnknownEventKind`] / [`CodecError::MissingEventKind`] rather
//! than a generic JSON error. Unknown fields are ignored.

use std::io::Read;

use crate::message::HookMessage;
use crate::response::HookResponse;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid hook message JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hook message has no event kind")]
    MissingEventKind,

    #[error("unknown hook event kind: {0}")]
    UnknownEventKind(String),
}

/// Decode a single hook message from bytes.
pub fn decode_message(data: &[u8]) -> Result<HookMessage, CodecError> {
    let value: serde_json::Value = serde_json::from_slice(data)?;
    decode_message_value(value)
}

/// Decode a single hook message from an already-parsed JSON value.
pub fn decode_message_value(value: serde_json::Value) -> Result<HookMessage, CodecError> {
    let tag = match value.get("hook_event_name") {
        Some(serde_json::Value::String(tag)) => tag.clone(),
        _ => return Err(CodecError::MissingEventKind),
    };

    let message = match tag.as_str() {
        "PreToolUse" => HookMessage::PreToolUse(serde_json::from_value(value)?),
        "PostToolUse" => HookMessage::PostToolUse(serde_json::from_value(value)?),
        "Notification" => HookMessage::Notification(serde_json::from_value(value)?),
        "Stop" => HookMessage::Stop(serde_json::from_value(value)?),
        "SubagentStop" => HookMessage::SubagentStop(serde_json::from_value(value)?),
        "PreCompact" => HookMessage::PreCompact(serde_json::from_value(value)?),
        other => return Err(CodecError::UnknownEventKind(other.to_string())),
    };

    Ok(message)
}

/// Encode a hook message (no trailing newline).
pub fn encode_message(message: &HookMessage) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(message)?)
}

/// Encode a hook response as one JSON line.
///
/// The trailing newline is part of the contract: line-oriented hosts read
/// stdout one line at a time.
pub fn encode_response(response: &HookResponse) -> Result<Vec<u8>, CodecError> {
    let mut out = serde_json::to_vec(response)?;
    out.push(b'\n');
    Ok(out)
}

/// Streaming reader over whitespace-separated JSON documents.
///
/// Each iteration yields the next fully parsed hook message, or an error for
/// a malformed document. A partial document at end of stream is a parse
/// error, not silent end-of-stream.
pub struct MessageStream<R: Read> {
    inner: serde_json::StreamDeserializer<'static, serde_json::de::IoRead<R>, serde_json::Value>,
}

impl<R: Read> MessageStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: serde_json::Deserializer::from_reader(reader).into_iter(),
        }
    }
}

impl<R: Read> Iterator for MessageStream<R> {
    type Item = Result<HookMessage, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        let value = match self.inner.next()? {
            Ok(value) => value,
            Err(err) => return Some(Err(CodecError::Json(err))),
        };
        Some(decode_message_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::HookEventName;
    use crate::message::PreCompactMessage;
    use crate::response::HookDecision;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_pre_tool_use() {
        let data = br#"{
            "hook_event_name": "PreToolUse",
            "session_id": "s",
            "tool_name": "Write",
            "tool_input": {"file_path": "x.go", "content": "package main"}
        }"#;

        let msg = decode_message(data).unwrap();
        let HookMessage::PreToolUse(pre) = msg else {
            panic!("expected PreToolUse, got {msg:?}");
        };
        assert_eq!(pre.session_id, "s");
        assert_eq!(pre.tool_name, "Write");
        assert_eq!(
            pre.tool_input.get("file_path").and_then(|v| v.as_str()),
            Some("x.go")
        );
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let data = br#"{
            "hook_event_name": "Notification",
            "session_id": "s",
            "notification_type": "info",
            "message": "hi",
            "some_future_field": [1, 2, 3]
        }"#;

        let msg = decode_message(data).unwrap();
        assert_eq!(msg.event_name(), HookEventName::Notification);
    }

    #[test]
    fn test_decode_unknown_event_kind() {
        let data = br#"{"hook_event_name": "SessionStart", "session_id": "s"}"#;
        let err = decode_message(data).unwrap_err();
        assert!(matches!(err, CodecError::UnknownEventKind(kind) if kind == "SessionStart"));
    }

    #[test]
    fn test_decode_missing_event_kind() {
        let err = decode_message(br#"{"session_id": "s"}"#).unwrap_err();
        assert!(matches!(err, CodecError::MissingEventKind));
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = decode_message(b"{broken").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }

    #[test]
    fn test_message_round_trip() {
        let original = HookMessage::PreCompact(PreCompactMessage {
            session_id: "s".to_string(),
            transcript_path: None,
            current_tokens: 180_000,
            target_tokens: 40_000,
        });

        let encoded = encode_message(&original).unwrap();
        let decoded = decode_message(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_response_round_trip_with_newline() {
        let original = HookResponse::block("syntax errors");

        let encoded = encode_response(&original).unwrap();
        assert_eq!(encoded.last(), Some(&b'\n'));

        let decoded: HookResponse = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded.decision, Some(HookDecision::Block));
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_stream_yields_each_document() {
        let input = concat!(
            r#"{"hook_event_name":"Stop","session_id":"a","reason":"done"}"#,
            "\n",
            r#"{"hook_event_name":"Stop","session_id":"b","reason":"done"}"#,
            "  ",
        );

        let messages: Vec<_> = MessageStream::new(input.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].session_id(), "a");
        assert_eq!(messages[1].session_id(), "b");
    }

    #[test]
    fn test_stream_partial_document_is_error() {
        let input = r#"{"hook_event_name":"Stop","session_id":"a"} {"hook_ev"#;

        let results: Vec<_> = MessageStream::new(input.as_bytes()).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_stream_empty_input() {
        assert_eq!(MessageStream::new(&b""[..]).count(), 0);
    }
}
