//! # Gismo hook dispatch engine
//!
//! This crate turns a decoded hook message into an exit code the host
//! understands. It is the middle of the pipeline: the codec
//! (`gismo-protocol`) hands a typed message to the [`Handler`], the handler
//! dispatches it to a pluggable [`RuleEngine`], and the [`HookExecutor`]
//! translates the outcome into the `{0, 1, 2}` exit-code contract.
//!
//! ## Architecture
//!
//! - **Rule engines**: six-method strategy objects, one method per event
//!   kind. [`BaseRuleEngine`] approves everything; [`CompositeRuleEngine`]
//!   chains engines with first-block semantics.
//! - **Handler**: decodes stdin, records the event kind, drives the engine,
//!   writes the response line to stdout. Safe for concurrent library use.
//! - **Executor**: bounds the handler with a timeout and owns the exit-code
//!   translation, including the deliberate PostToolUse always-blocks rule.
//! - **Runner**: the parent side of the same protocol, for spawning external
//!   hook binaries.
//! - **Registry**: a declarative inventory of hook configurations for
//!   host-side tooling. Dispatch never consults it.
//!
//! ## Exit codes
//!
//! - `0`: approve / silent success
//! - `2`: blocking; the host must surface stderr
//! - `1`: infrastructural failure

pub mod engine;
pub mod executor;
pub mod handler;
pub mod registry;
pub mod runner;

pub use engine::BaseRuleEngine;
pub use engine::CompositeRuleEngine;
pub use engine::RuleEngine;
pub use engine::evaluate;
pub use executor::ChainError;
pub use executor::ChainExecutor;
pub use executor::EXIT_BLOCKING;
pub use executor::EXIT_FAILURE;
pub use executor::EXIT_SUCCESS;
pub use executor::ExecutorError;
pub use executor::HookExecutor;
pub use handler::Handler;
pub use handler::HandlerError;
pub use registry::HookConfig;
pub use registry::HookRegistry;
pub use runner::HookRunOutcome;
pub use runner::HookRunner;
pub use runner::RunnerError;
