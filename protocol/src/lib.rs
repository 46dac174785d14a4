//! Hook wire protocol for gismo.
//!
//! This crate defines the JSON protocol spoken between the coding assistant
//! and the hook process. It follows Claude Code's hook format exactly:
//! a single JSON message arrives on stdin, tagged by `hook_event_name`, and
//! at most one JSON response line leaves on stdout.
//!
//! The protocol layer is deliberately free of policy. Decoding, encoding and
//! the streaming reader live in [`codec`]; the typed message and response
//! shapes live in [`message`] and [`response`].

pub mod codec;
pub mod message;
pub mod response;

pub use codec::CodecError;
pub use codec::MessageStream;
pub use codec::decode_message;
pub use codec::decode_message_value;
pub use codec::encode_message;
pub use codec::encode_response;
pub use message::HookEventName;
pub use message::HookMessage;
pub use message::NotificationMessage;
pub use message::PostToolUseMessage;
pub use message::PreCompactMessage;
pub use message::PreToolUseMessage;
pub use message::StopMessage;
pub use message::SubagentStopMessage;
pub use response::HookDecision;
pub use response::HookResponse;
