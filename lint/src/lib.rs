//! # Gismo linting engine
//!
//! The production rule engine behind the hook binary. It owns an ordered
//! set of language analyzers and a parallel executor, applies per-file rule
//! overrides from the merged configuration, and turns analyzer findings
//! into the block/approve decisions and stderr diagnostics the host
//! surfaces to the user.
//!
//! ## Pieces
//!
//! - [`Linter`]: the analyzer contract — `name`, `can_handle`, `lint`, with
//!   `set_config` and the batch capability as optional extensions.
//! - [`ParallelExecutor`]: per-file and per-task fan-out over a bounded
//!   worker pool with cooperative cancellation.
//! - [`batch`]: one-shot dispatch for analyzers that accept a whole file
//!   set at once.
//! - [`LintEngine`]: the glue implementing the six-method rule-engine
//!   contract; only the tool-use methods are non-trivial.
//! - [`linters`]: the shipped analyzers (Go, Python, JSON, Markdown).

pub mod batch;
pub mod engine;
pub mod format;
pub mod linter;
pub mod linters;
pub mod parallel;

pub use batch::execute_batch;
pub use engine::LintEngine;
pub use format::format_diagnostics;
pub use linter::BatchLinter;
pub use linter::Issue;
pub use linter::LintResult;
pub use linter::LintTask;
pub use linter::Linter;
pub use linter::Severity;
pub use linter::TaskResult;
pub use parallel::AggregateOutcome;
pub use parallel::ParallelExecutor;
pub use parallel::aggregate_results;
