//! Layered configuration file search.

use std::path::Path;
use std::path::PathBuf;

use crate::model::GismoConfig;

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The three layered locations, in increasing precedence.
pub fn config_paths(project_root: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Some(home) = home {
        paths.push(home.join(".claude").join("gismo.json"));
    }
    paths.push(project_root.join(".claude").join("gismo.json"));
    paths.push(project_root.join(".claude").join("gismo.local.json"));
    paths
}

/// Load one configuration file.
///
/// A missing file is `Ok(None)`; malformed JSON is a hard error naming the
/// file.
pub fn load_file(path: &Path) -> Result<Option<GismoConfig>, ConfigError> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config = serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "loaded config layer");
    Ok(Some(config))
}

/// Merge the configuration layers for a project root and home directory.
pub fn load_layered(project_root: &Path, home: Option<&Path>) -> Result<GismoConfig, ConfigError> {
    let mut merged = GismoConfig::default();
    for path in config_paths(project_root, home) {
        if let Some(layer) = load_file(&path)? {
            merged = merged.merged(layer);
        }
    }
    Ok(merged)
}

/// Load configuration for the current working directory.
pub fn load() -> Result<GismoConfig, ConfigError> {
    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let home = dirs::home_dir();
    load_layered(&project_root, home.as_deref())
}

/// Nearest ancestor of `start` (inclusive) containing a `.git` entry.
///
/// For tooling that wants the repository root; config search itself is
/// anchored at the working directory.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn write_config(dir: &Path, name: &str, contents: &str) {
        let claude = dir.join(".claude");
        std::fs::create_dir_all(&claude).unwrap();
        std::fs::write(claude.join(name), contents).unwrap();
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let project = tempfile::tempdir().unwrap();
        let config = load_layered(project.path(), None).unwrap();
        assert_eq!(config, GismoConfig::default());
    }

    #[test]
    fn test_layer_precedence() {
        let home = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();

        write_config(
            home.path(),
            "gismo.json",
            r#"{"timeout": "10s", "parallel": {"maxWorkers": 2}}"#,
        );
        write_config(project.path(), "gismo.json", r#"{"timeout": "20s"}"#);
        write_config(project.path(), "gismo.local.json", r#"{"timeout": "30s"}"#);

        let config = load_layered(project.path(), Some(home.path())).unwrap();
        // Local layer wins the scalar; untouched fields survive from home.
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(30)));
        assert_eq!(config.parallel.max_workers, Some(2));
    }

    #[test]
    fn test_malformed_layer_names_the_file() {
        let project = tempfile::tempdir().unwrap();
        write_config(project.path(), "gismo.json", "{not json");

        let err = load_layered(project.path(), None).unwrap_err();
        let ConfigError::Parse { path, .. } = &err else {
            panic!("expected parse error, got {err}");
        };
        assert!(path.ends_with(".claude/gismo.json"));
        assert!(err.to_string().contains("gismo.json"));
    }

    #[test]
    fn test_find_git_root() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir(root.path().join(".git")).unwrap();

        assert_eq!(find_git_root(&nested), Some(root.path().to_path_buf()));
        assert_eq!(find_git_root(root.path()), Some(root.path().to_path_buf()));
    }

    #[test]
    fn test_find_git_root_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_git_root(dir.path()), None);
    }
}
