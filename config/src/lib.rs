//! Layered configuration for gismo.
//!
//! Configuration is merged from three fixed locations in increasing
//! precedence: user-global `~/.claude/gismo.json`, project
//! `.claude/gismo.json`, and project-local `.claude/gismo.local.json`.
//! Every field is optional so a later layer can override exactly the fields
//! it sets and nothing else.
//!
//! On top of the merged document sits the rule-override mechanism: ordered
//! `{pattern, linter, rules}` entries whose glob patterns select files and
//! whose rules blobs are merged (later keys win) before being handed to the
//! matching analyzer's configuration setter.

pub mod loader;
pub mod model;
pub mod overrides;

pub use loader::ConfigError;
pub use loader::config_paths;
pub use loader::find_git_root;
pub use loader::load;
pub use loader::load_file;
pub use loader::load_layered;
pub use model::ConfigDuration;
pub use model::GismoConfig;
pub use model::LinterSettings;
pub use model::ParallelConfig;
pub use model::RuleOverride;
pub use overrides::rules_for;
