//! Rule-override resolution.
//!
//! Overrides apply in document order. An override matches when its linter
//! field names the target linter (or `"*"`) and its glob matches the full
//! path or, failing that, the basename. Matching rules blobs are merged at
//! the outer key level, later overrides winning; nested-structure semantics
//! belong to the analyzer that receives the blob.

use std::path::Path;

use globset::GlobBuilder;

use crate::model::GismoConfig;

/// Resolve the merged rules blob for one (file, linter) pair.
///
/// Returns `None` when no override matched.
pub fn rules_for(config: &GismoConfig, path: &Path, linter: &str) -> Option<serde_json::Value> {
    let mut accumulator: Option<serde_json::Map<String, serde_json::Value>> = None;

    for override_ in &config.rules {
        if !override_.applies_to_linter(linter) {
            continue;
        }
        if !pattern_matches(&override_.pattern, path) {
            continue;
        }

        let Some(rules) = override_.rules.as_object() else {
            tracing::warn!(
                pattern = %override_.pattern,
                linter = %override_.linter,
                "rule override blob is not a JSON object; skipping"
            );
            continue;
        };

        let accumulator = accumulator.get_or_insert_with(serde_json::Map::new);
        for (key, value) in rules {
            accumulator.insert(key.clone(), value.clone());
        }
    }

    accumulator.map(serde_json::Value::Object)
}

/// Glob match against the full path first, then the basename.
fn pattern_matches(pattern: &str, path: &Path) -> bool {
    let Ok(glob) = GlobBuilder::new(pattern).literal_separator(true).build() else {
        tracing::warn!(pattern, "invalid rule-override glob; skipping");
        return false;
    };
    let matcher = glob.compile_matcher();

    if matcher.is_match(path) {
        return true;
    }
    path.file_name().is_some_and(|name| matcher.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RuleOverride;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config_with(rules: Vec<RuleOverride>) -> GismoConfig {
        GismoConfig {
            rules,
            ..Default::default()
        }
    }

    fn override_(pattern: &str, linter: &str, rules: serde_json::Value) -> RuleOverride {
        RuleOverride {
            pattern: pattern.to_string(),
            linter: linter.to_string(),
            rules,
        }
    }

    #[test]
    fn test_no_overrides() {
        let config = config_with(vec![]);
        assert_eq!(rules_for(&config, Path::new("x.go"), "golang"), None);
    }

    #[test]
    fn test_linter_and_wildcard_selection() {
        let config = config_with(vec![
            override_("*.go", "golang", json!({"vet": true})),
            override_("*.go", "python", json!({"select": ["E"]})),
            override_("*.go", "*", json!({"timeout": "10s"})),
        ]);

        let merged = rules_for(&config, Path::new("main.go"), "golang").unwrap();
        assert_eq!(merged, json!({"vet": true, "timeout": "10s"}));
    }

    #[test]
    fn test_later_override_wins_on_shared_key() {
        let config = config_with(vec![
            override_("*.go", "golang", json!({"vet": true, "tests": false})),
            override_("main.go", "golang", json!({"vet": false})),
        ]);

        let merged = rules_for(&config, Path::new("main.go"), "golang").unwrap();
        assert_eq!(merged, json!({"vet": false, "tests": false}));
    }

    #[test]
    fn test_basename_matching() {
        // The pattern names only the basename; the path carries directories.
        let config = config_with(vec![override_("main.go", "golang", json!({"vet": true}))]);

        let merged = rules_for(&config, Path::new("cmd/server/main.go"), "golang");
        assert_eq!(merged, Some(json!({"vet": true})));
    }

    #[test]
    fn test_full_path_matching() {
        let config = config_with(vec![override_(
            "cmd/**/*.go",
            "golang",
            json!({"vet": true}),
        )]);

        assert!(rules_for(&config, Path::new("cmd/server/main.go"), "golang").is_some());
        assert!(rules_for(&config, Path::new("pkg/lib.go"), "golang").is_none());
    }

    #[test]
    fn test_non_object_blob_skipped() {
        let config = config_with(vec![
            override_("*.go", "golang", json!("not an object")),
            override_("*.go", "golang", json!({"vet": true})),
        ]);

        let merged = rules_for(&config, Path::new("x.go"), "golang").unwrap();
        assert_eq!(merged, json!({"vet": true}));
    }

    #[test]
    fn test_invalid_glob_skipped() {
        let config = config_with(vec![
            override_("[", "golang", json!({"broken": true})),
            override_("*.go", "golang", json!({"vet": true})),
        ]);

        let merged = rules_for(&config, Path::new("x.go"), "golang").unwrap();
        assert_eq!(merged, json!({"vet": true}));
    }
}
