//! Typed configuration document.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;

/// A duration that accepts either a humantime literal (`"30s"`, `"5m"`) or
/// a numeric nanosecond count on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDuration(pub Duration);

impl ConfigDuration {
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for ConfigDuration {
    fn from(d: Duration) -> Self {
        Self(d)
    }
}

impl Serialize for ConfigDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(self.0).to_string())
    }
}

impl<'de> Deserialize<'de> for ConfigDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Nanos(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => humantime::parse_duration(&text)
                .map(ConfigDuration)
                .map_err(|err| D::Error::custom(format!("invalid duration {text:?}: {err}"))),
            Raw::Nanos(nanos) => Ok(ConfigDuration(Duration::from_nanos(nanos))),
        }
    }
}

/// Parallelism knobs. Both fields optional so layering can tell "unset"
/// from an explicit value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParallelConfig {
    #[serde(
        rename = "maxWorkers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_workers: Option<usize>,

    #[serde(
        rename = "disableParallel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disable_parallel: Option<bool>,
}

impl ParallelConfig {
    fn is_unset(&self) -> bool {
        self.max_workers.is_none() && self.disable_parallel.is_none()
    }
}

/// Per-linter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinterSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Opaque configuration blob; the linter validates it in its setter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

/// One conditional configuration patch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleOverride {
    /// Glob matched against the full path, then the basename.
    pub pattern: String,

    /// Linter name, or `"*"` for every linter.
    #[serde(default = "RuleOverride::any_linter")]
    pub linter: String,

    /// Opaque rules blob merged into the selected linter's configuration.
    #[serde(default)]
    pub rules: serde_json::Value,
}

impl RuleOverride {
    fn any_linter() -> String {
        "*".to_string()
    }

    pub fn applies_to_linter(&self, linter: &str) -> bool {
        self.linter == "*" || self.linter == linter
    }
}

/// The merged configuration document. All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GismoConfig {
    #[serde(default, skip_serializing_if = "ParallelConfig::is_unset")]
    pub parallel: ParallelConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<ConfigDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linters: Option<BTreeMap<String, LinterSettings>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleOverride>,
}

impl GismoConfig {
    /// Overlay `later` on top of `self`, field by field.
    ///
    /// Scalars: present wins. Linter map: keys unioned; for a shared key a
    /// present `enabled` or `config` replaces the earlier one in full.
    /// Rule overrides: concatenated in order, later file last.
    pub fn merged(mut self, later: GismoConfig) -> GismoConfig {
        if later.parallel.max_workers.is_some() {
            self.parallel.max_workers = later.parallel.max_workers;
        }
        if later.parallel.disable_parallel.is_some() {
            self.parallel.disable_parallel = later.parallel.disable_parallel;
        }
        if later.timeout.is_some() {
            self.timeout = later.timeout;
        }

        if let Some(later_linters) = later.linters {
            let linters = self.linters.get_or_insert_with(BTreeMap::new);
            for (name, settings) in later_linters {
                let entry = linters.entry(name).or_default();
                if settings.enabled.is_some() {
                    entry.enabled = settings.enabled;
                }
                if settings.config.is_some() {
                    entry.config = settings.config;
                }
            }
        }

        self.rules.extend(later.rules);
        self
    }

    /// A linter is enabled unless its entry says `enabled: false`.
    pub fn is_linter_enabled(&self, name: &str) -> bool {
        self.linters
            .as_ref()
            .and_then(|linters| linters.get(name))
            .and_then(|settings| settings.enabled)
            .unwrap_or(true)
    }

    /// The base configuration blob for a linter, if any.
    pub fn linter_config(&self, name: &str) -> Option<&serde_json::Value> {
        self.linters
            .as_ref()
            .and_then(|linters| linters.get(name))
            .and_then(|settings| settings.config.as_ref())
    }

    /// Worker cap for the parallel executor.
    ///
    /// `disableParallel` pins it to 1; an absent or non-positive
    /// `maxWorkers` falls back to the hardware thread count.
    pub fn effective_max_workers(&self) -> usize {
        if self.parallel.disable_parallel.unwrap_or(false) {
            return 1;
        }
        match self.parallel.max_workers {
            Some(n) if n > 0 => n,
            _ => default_workers(),
        }
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(|t| t.0)
    }
}

pub(crate) fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> GismoConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_duration_accepts_string_and_nanos() {
        let config = parse(r#"{"timeout": "5m"}"#);
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(300)));

        let config = parse(r#"{"timeout": 30000000000}"#);
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_duration_round_trip() {
        let config = parse(r#"{"timeout": "30s"}"#);
        let json = serde_json::to_string(&config).unwrap();
        let back: GismoConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let err = serde_json::from_str::<GismoConfig>(r#"{"timeout": "fast"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
    }

    #[test]
    fn test_merge_scalars_last_wins() {
        let base = parse(r#"{"parallel": {"maxWorkers": 2}, "timeout": "10s"}"#);
        let later = parse(r#"{"parallel": {"disableParallel": true}, "timeout": "1m"}"#);

        let merged = base.merged(later);
        assert_eq!(merged.parallel.max_workers, Some(2));
        assert_eq!(merged.parallel.disable_parallel, Some(true));
        assert_eq!(merged.timeout_duration(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_merge_linters_union_and_override() {
        let base = parse(
            r#"{"linters": {
                "golang": {"enabled": true, "config": {"vet": true}},
                "json": {"enabled": false}
            }}"#,
        );
        let later = parse(
            r#"{"linters": {
                "golang": {"config": {"vet": false}},
                "markdown": {"enabled": false}
            }}"#,
        );

        let merged = base.merged(later);
        let linters = merged.linters.as_ref().unwrap();

        // Later blob replaces the earlier one in full; enabled survives.
        assert_eq!(linters["golang"].enabled, Some(true));
        assert_eq!(
            linters["golang"].config,
            Some(serde_json::json!({"vet": false}))
        );
        assert_eq!(linters["json"].enabled, Some(false));
        assert_eq!(linters["markdown"].enabled, Some(false));
    }

    #[test]
    fn test_merge_rules_concatenate() {
        let base = parse(r#"{"rules": [{"pattern": "*.go", "linter": "golang", "rules": {}}]}"#);
        let later = parse(r#"{"rules": [{"pattern": "*.md", "linter": "*", "rules": {}}]}"#);

        let merged = base.merged(later);
        assert_eq!(merged.rules.len(), 2);
        assert_eq!(merged.rules[0].pattern, "*.go");
        assert_eq!(merged.rules[1].pattern, "*.md");
    }

    #[test]
    fn test_enablement_defaults() {
        let config = GismoConfig::default();
        assert!(config.is_linter_enabled("golang"));

        let config = parse(r#"{"linters": {"python": {"enabled": false}, "json": {}}}"#);
        assert!(!config.is_linter_enabled("python"));
        assert!(config.is_linter_enabled("json"));
        assert!(config.is_linter_enabled("markdown"));
    }

    #[test]
    fn test_effective_max_workers() {
        let config = parse(r#"{"parallel": {"disableParallel": true, "maxWorkers": 8}}"#);
        assert_eq!(config.effective_max_workers(), 1);

        let config = parse(r#"{"parallel": {"maxWorkers": 3}}"#);
        assert_eq!(config.effective_max_workers(), 3);

        let config = parse(r#"{"parallel": {"maxWorkers": 0}}"#);
        assert_eq!(config.effective_max_workers(), default_workers());

        assert_eq!(
            GismoConfig::default().effective_max_workers(),
            default_workers()
        );
    }
}
